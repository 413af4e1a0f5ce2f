//! Built-in type resolvers.
//!
//! Each resolver accepts or rejects one token. Rejections carry a reason
//! string; the walker in `resolve.rs` turns them into structured errors
//! annotated with the spec's display name and a rendered usage string.

use crate::spec::{ArgType, UsageSpec};
use async_trait::async_trait;
use chat_platform::{Channel, Directory, Member, Role};
use std::collections::HashMap;

/// A resolved, typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    List(Vec<String>),
    /// All candidates when resolved by name; exactly one when mentioned.
    Members(Vec<Member>),
    Roles(Vec<Role>),
    Channels(Vec<Channel>),
    /// Primary name of the referenced command.
    Command(String),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ArgValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_members(&self) -> Option<&[Member]> {
        match self {
            ArgValue::Members(m) => Some(m),
            _ => None,
        }
    }
}

/// Result map of a successful resolution.
pub type ResolvedArgs = HashMap<String, ArgValue>;

/// Minimal view of the command registry needed by the `command` type.
#[async_trait]
pub trait CommandIndex: Send + Sync {
    async fn command_meta(&self, trigger: &str) -> Option<CommandMeta>;
}

#[derive(Debug, Clone)]
pub struct CommandMeta {
    pub name: String,
    pub admin_only: bool,
}

/// An index with no commands in it.
pub struct NoCommands;

#[async_trait]
impl CommandIndex for NoCommands {
    async fn command_meta(&self, _trigger: &str) -> Option<CommandMeta> {
        None
    }
}

/// Everything a resolution pass needs from its surroundings.
pub struct ResolveContext<'a> {
    /// Prefix the command was invoked with, for usage rendering.
    pub prefix: &'a str,
    /// Command label, possibly composite (`"credits claim"`).
    pub label: &'a str,
    /// Scope for member/role/channel lookups. `None` in private contexts.
    pub guild_id: Option<&'a str>,
    pub directory: &'a dyn Directory,
    pub commands: &'a dyn CommandIndex,
    pub invoker_is_admin: bool,
}

/// Why a single type resolver rejected a token.
#[derive(Debug, Clone)]
pub(crate) enum ResolveFailure {
    Invalid(String),
    NotFound(String),
}

pub(crate) async fn resolve_type(
    ty: ArgType,
    token: &str,
    spec: &UsageSpec,
    ctx: &ResolveContext<'_>,
) -> Result<ArgValue, ResolveFailure> {
    match ty {
        ArgType::Str => resolve_string(token, spec),
        ArgType::Int => resolve_int(token, spec),
        ArgType::List => resolve_list(token, spec),
        ArgType::Member => resolve_member(token, ctx).await,
        ArgType::Role => resolve_role(token, ctx).await,
        ArgType::Channel => resolve_channel(token, ctx).await,
        ArgType::Command => resolve_command(token, ctx).await,
    }
}

fn resolve_string(token: &str, spec: &UsageSpec) -> Result<ArgValue, ResolveFailure> {
    if let Some(choices) = &spec.choices {
        if !choices.iter().any(|c| c == token) {
            return Err(ResolveFailure::Invalid(format!(
                "must be one of: {}",
                choices.join(", ")
            )));
        }
        return Ok(ArgValue::Str(token.to_string()));
    }

    if let Some(categories) = &spec.categories {
        for (key, tokens) in categories {
            if tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                return Ok(ArgValue::Str(key.clone()));
            }
        }
        return Err(ResolveFailure::Invalid(format!(
            "\"{token}\" does not fall into a known category"
        )));
    }

    let len = token.chars().count() as i64;
    if let Some(min) = spec.min {
        if len < min {
            return Err(ResolveFailure::Invalid(format!(
                "must be at least {min} character(s) long"
            )));
        }
    }
    if let Some(max) = spec.max {
        if len > max {
            return Err(ResolveFailure::Invalid(format!(
                "must be at most {max} character(s) long"
            )));
        }
    }
    Ok(ArgValue::Str(token.to_string()))
}

fn resolve_int(token: &str, spec: &UsageSpec) -> Result<ArgValue, ResolveFailure> {
    let value: i64 = token
        .parse()
        .map_err(|_| ResolveFailure::Invalid(format!("\"{token}\" is not a whole number")))?;

    let min = spec.min.unwrap_or(0);
    if value < min {
        return Err(ResolveFailure::Invalid(format!("must be at least {min}")));
    }
    if let Some(max) = spec.max {
        if value > max {
            return Err(ResolveFailure::Invalid(format!("must be at most {max}")));
        }
    }
    Ok(ArgValue::Int(value))
}

fn resolve_list(token: &str, spec: &UsageSpec) -> Result<ArgValue, ResolveFailure> {
    let separator = spec.separator.as_deref().unwrap_or(", ");
    let items: Vec<String> = token.split(separator).map(|s| s.to_string()).collect();

    let count = items.len() as i64;
    if let Some(min) = spec.min {
        if count < min {
            return Err(ResolveFailure::Invalid(format!(
                "needs at least {min} item(s)"
            )));
        }
    }
    if let Some(max) = spec.max {
        if count > max {
            return Err(ResolveFailure::Invalid(format!(
                "takes at most {max} item(s)"
            )));
        }
    }

    for item in &items {
        let len = item.chars().count();
        if let Some(min) = spec.item_min {
            if len < min {
                return Err(ResolveFailure::Invalid(format!(
                    "item \"{item}\" is shorter than {min} character(s)"
                )));
            }
        }
        if let Some(max) = spec.item_max {
            if len > max {
                return Err(ResolveFailure::Invalid(format!(
                    "item \"{item}\" is longer than {max} character(s)"
                )));
            }
        }
    }

    if spec.unique {
        let mut seen = std::collections::HashSet::new();
        for item in &items {
            if !seen.insert(item.to_lowercase()) {
                return Err(ResolveFailure::Invalid(format!(
                    "duplicate item \"{item}\""
                )));
            }
        }
    }

    Ok(ArgValue::List(items))
}

/// Strip `<@id>` / `<@!id>` mention syntax.
fn member_mention(token: &str) -> Option<&str> {
    token
        .strip_prefix("<@")
        .and_then(|t| t.strip_suffix('>'))
        .map(|t| t.strip_prefix('!').unwrap_or(t))
        .filter(|t| !t.starts_with('&'))
}

fn role_mention(token: &str) -> Option<&str> {
    token.strip_prefix("<@&").and_then(|t| t.strip_suffix('>'))
}

fn channel_mention(token: &str) -> Option<&str> {
    token.strip_prefix("<#").and_then(|t| t.strip_suffix('>'))
}

/// Exact name matches win; otherwise substring matches, case-insensitive.
fn name_matches<'a, T>(pool: &'a [T], query: &str, name: impl Fn(&T) -> Vec<&str>) -> Vec<&'a T> {
    let query = query.to_lowercase();
    let exact: Vec<&T> = pool
        .iter()
        .filter(|item| name(item).iter().any(|n| n.to_lowercase() == query))
        .collect();
    if !exact.is_empty() {
        return exact;
    }
    pool.iter()
        .filter(|item| {
            name(item)
                .iter()
                .any(|n| n.to_lowercase().contains(&query))
        })
        .collect()
}

async fn resolve_member(
    token: &str,
    ctx: &ResolveContext<'_>,
) -> Result<ArgValue, ResolveFailure> {
    let Some(guild) = ctx.guild_id else {
        return Err(ResolveFailure::Invalid(
            "member arguments are only available inside a server".into(),
        ));
    };
    let pool = ctx.directory.members(guild).await;

    if let Some(id) = member_mention(token) {
        return match pool.iter().find(|m| m.id == id) {
            Some(member) => Ok(ArgValue::Members(vec![member.clone()])),
            None => Err(ResolveFailure::NotFound(token.to_string())),
        };
    }

    let found = name_matches(&pool, token, |m| {
        let mut names = vec![m.name.as_str()];
        if let Some(nick) = &m.nickname {
            names.push(nick.as_str());
        }
        names
    });
    if found.is_empty() {
        return Err(ResolveFailure::NotFound(token.to_string()));
    }
    Ok(ArgValue::Members(found.into_iter().cloned().collect()))
}

async fn resolve_role(token: &str, ctx: &ResolveContext<'_>) -> Result<ArgValue, ResolveFailure> {
    let Some(guild) = ctx.guild_id else {
        return Err(ResolveFailure::Invalid(
            "role arguments are only available inside a server".into(),
        ));
    };
    let pool = ctx.directory.roles(guild).await;

    if let Some(id) = role_mention(token) {
        return match pool.iter().find(|r| r.id == id) {
            Some(role) => Ok(ArgValue::Roles(vec![role.clone()])),
            None => Err(ResolveFailure::NotFound(token.to_string())),
        };
    }

    let found = name_matches(&pool, token, |r| vec![r.name.as_str()]);
    if found.is_empty() {
        return Err(ResolveFailure::NotFound(token.to_string()));
    }
    Ok(ArgValue::Roles(found.into_iter().cloned().collect()))
}

async fn resolve_channel(
    token: &str,
    ctx: &ResolveContext<'_>,
) -> Result<ArgValue, ResolveFailure> {
    let Some(guild) = ctx.guild_id else {
        return Err(ResolveFailure::Invalid(
            "channel arguments are only available inside a server".into(),
        ));
    };
    let pool = ctx.directory.channels(guild).await;

    if let Some(id) = channel_mention(token) {
        return match pool.iter().find(|c| c.id == id) {
            Some(channel) => Ok(ArgValue::Channels(vec![channel.clone()])),
            None => Err(ResolveFailure::NotFound(token.to_string())),
        };
    }

    let found = name_matches(&pool, token, |c| vec![c.name.as_str()]);
    if found.is_empty() {
        return Err(ResolveFailure::NotFound(token.to_string()));
    }
    Ok(ArgValue::Channels(found.into_iter().cloned().collect()))
}

async fn resolve_command(
    token: &str,
    ctx: &ResolveContext<'_>,
) -> Result<ArgValue, ResolveFailure> {
    let meta = ctx
        .commands
        .command_meta(&token.to_lowercase())
        .await
        .ok_or_else(|| ResolveFailure::NotFound(token.to_string()))?;

    if meta.admin_only && !ctx.invoker_is_admin {
        return Err(ResolveFailure::Invalid(format!(
            "the {} command is restricted to administrators",
            meta.name
        )));
    }
    Ok(ArgValue::Command(meta.name))
}
