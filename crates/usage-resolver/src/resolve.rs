//! The resolution walk: raw tokens in, typed argument map out.

use crate::error::UsageError;
use crate::spec::{render_usage, UsageSpec};
use crate::types::{resolve_type, ArgValue, ResolveContext, ResolveFailure, ResolvedArgs};
use futures::future;
use tracing::debug;

/// Split message content into raw argument tokens.
pub fn tokenize(content: &str) -> Vec<String> {
    content.split_whitespace().map(String::from).collect()
}

/// Validate and coerce `raw` against `specs`.
///
/// Fails with the first structured error encountered; the result map is
/// never partially applied. Optional specs without a granted token and
/// without a default are absent from the map.
pub async fn resolve(
    raw: &[String],
    specs: &[UsageSpec],
    ctx: &ResolveContext<'_>,
) -> Result<ResolvedArgs, UsageError> {
    for (index, spec) in specs.iter().enumerate() {
        if spec.name.is_empty() {
            return Err(UsageError::UnnamedSpec { index });
        }
    }

    let usage = render_usage(ctx.prefix, ctx.label, specs);
    let required = specs.iter().filter(|s| !s.optional).count();
    if raw.len() < required {
        return Err(UsageError::InsufficientArguments {
            required,
            provided: raw.len(),
            usage,
        });
    }

    // Tokens beyond the required minimum are granted to optional specs in
    // declaration order.
    let mut spare = raw.len() - required;
    let mut cursor = 0usize;
    let mut out = ResolvedArgs::new();

    for spec in specs {
        if spec.last {
            if cursor >= raw.len() {
                if !spec.optional {
                    return Err(UsageError::InsufficientArguments {
                        required,
                        provided: raw.len(),
                        usage,
                    });
                }
                if let Some(default) = &spec.default {
                    let value = resolve_one(default, spec, ctx, &usage).await?;
                    out.insert(spec.name.clone(), value);
                }
            } else {
                let token = raw[cursor..].join(" ");
                let value = resolve_one(&token, spec, ctx, &usage).await?;
                out.insert(spec.name.clone(), value);
            }
            // Specs after a `last` entry are unreachable by construction.
            break;
        }

        if spec.optional {
            if spare == 0 {
                if let Some(default) = &spec.default {
                    let value = resolve_one(default, spec, ctx, &usage).await?;
                    out.insert(spec.name.clone(), value);
                } else {
                    debug!("optional arg {} not provided, omitted", spec.name);
                }
                continue;
            }
            spare -= 1;
        }

        // Quote merging can consume more than one token per spec, so a
        // later required spec may still run dry.
        if cursor >= raw.len() {
            return Err(UsageError::InsufficientArguments {
                required,
                provided: raw.len(),
                usage,
            });
        }

        let token = next_token(raw, &mut cursor)?;
        let value = resolve_one(&token, spec, ctx, &usage).await?;
        out.insert(spec.name.clone(), value);
    }

    Ok(out)
}

/// Take the token at the cursor, merging a `"..."` span into one token with
/// the quote characters stripped.
fn next_token(raw: &[String], cursor: &mut usize) -> Result<String, UsageError> {
    let first = &raw[*cursor];
    if !first.starts_with('"') {
        *cursor += 1;
        return Ok(first.clone());
    }

    let mut close = None;
    for (index, token) in raw.iter().enumerate().skip(*cursor) {
        let is_opener_alone = index == *cursor && token.len() == 1;
        if token.ends_with('"') && !is_opener_alone {
            close = Some(index);
            break;
        }
    }
    let Some(close) = close else {
        return Err(UsageError::UnterminatedQuote);
    };

    let joined = raw[*cursor..=close].join(" ");
    *cursor = close + 1;
    Ok(joined[1..joined.len() - 1].to_string())
}

/// Race every type resolver for the spec; the first success in declaration
/// order wins, otherwise the first type's rejection is reported.
async fn resolve_one(
    token: &str,
    spec: &UsageSpec,
    ctx: &ResolveContext<'_>,
    usage: &str,
) -> Result<ArgValue, UsageError> {
    let types = spec.effective_types();
    let attempts = future::join_all(
        types
            .iter()
            .map(|ty| resolve_type(*ty, token, spec, ctx)),
    )
    .await;

    let mut first_failure = None;
    for attempt in attempts {
        match attempt {
            Ok(value) => return Ok(value),
            Err(failure) => {
                if first_failure.is_none() {
                    first_failure = Some(failure);
                }
            }
        }
    }

    Err(match first_failure.expect("at least one type per spec") {
        ResolveFailure::Invalid(reason) => UsageError::Invalid {
            argument: spec.display().to_string(),
            reason,
            usage: usage.to_string(),
        },
        ResolveFailure::NotFound(query) => UsageError::NotFound {
            argument: spec.display().to_string(),
            query,
            usage: usage.to_string(),
        },
    })
}
