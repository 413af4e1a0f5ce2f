//! Declarative argument schemas.
//!
//! A command's usage is an ordered list of [`UsageSpec`] entries. Specs are
//! plain data so a plugin source can ship them alongside command metadata.

use serde::Deserialize;
use std::collections::HashMap;

/// Built-in argument types. A spec may name several; resolution succeeds if
/// any one of them accepts the token (declaration order breaks ties).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ArgType {
    #[serde(rename = "string")]
    Str,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "member")]
    Member,
    #[serde(rename = "role")]
    Role,
    #[serde(rename = "channel")]
    Channel,
    #[serde(rename = "command")]
    Command,
}

/// One positional argument in a usage schema.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageSpec {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Empty means `string`.
    #[serde(default)]
    pub types: Vec<ArgType>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub default: Option<String>,
    /// Consume all remaining tokens, joined by a single space.
    #[serde(default)]
    pub last: bool,
    /// `string`: minimum length. `int`: minimum value (defaults to 0).
    /// `list`: minimum item count.
    #[serde(default)]
    pub min: Option<i64>,
    /// Upper bound, same interpretation as `min`. Unbounded when absent.
    #[serde(default)]
    pub max: Option<i64>,
    /// `string`: accepted literal values.
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    /// `string`: category key → member tokens; resolves to the key.
    #[serde(default)]
    pub categories: Option<HashMap<String, Vec<String>>>,
    /// `list`: item separator, `", "` by default.
    #[serde(default)]
    pub separator: Option<String>,
    /// `list`: reject duplicate items.
    #[serde(default)]
    pub unique: bool,
    /// `list`: per-item length bounds.
    #[serde(default)]
    pub item_min: Option<usize>,
    #[serde(default)]
    pub item_max: Option<usize>,
}

impl UsageSpec {
    pub fn new(name: impl Into<String>, ty: ArgType) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            types: vec![ty],
            optional: false,
            default: None,
            last: false,
            min: None,
            max: None,
            choices: None,
            categories: None,
            separator: None,
            unique: false,
            item_min: None,
            item_max: None,
        }
    }

    /// A required string argument.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ArgType::Str)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ArgType::Int)
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn last(mut self) -> Self {
        self.last = true;
        self
    }

    pub fn types(mut self, types: &[ArgType]) -> Self {
        self.types = types.to_vec();
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn bounds(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn choices(mut self, choices: &[&str]) -> Self {
        self.choices = Some(choices.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Name shown in error messages and usage strings.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn effective_types(&self) -> &[ArgType] {
        if self.types.is_empty() {
            &[ArgType::Str]
        } else {
            &self.types
        }
    }
}

/// Render `prefix + label + <required> [optional]` for error messages.
pub fn render_usage(prefix: &str, label: &str, specs: &[UsageSpec]) -> String {
    let mut usage = format!("{prefix}{label}");
    for spec in specs {
        if spec.optional {
            usage.push_str(&format!(" [{}]", spec.display()));
        } else {
            usage.push_str(&format!(" <{}>", spec.display()));
        }
    }
    usage
}
