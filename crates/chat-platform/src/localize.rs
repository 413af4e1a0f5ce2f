//! Catalog-based localization.
//!
//! Catalogs are plain `lang → key → template` maps so a deployment can load
//! them from files or a database. Templates interpolate `{tag}` markers.

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

/// Renders user-facing text from a message key and a tag map.
pub struct Localizer {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl Localizer {
    /// Empty localizer. Renders every key as itself.
    pub fn new() -> Self {
        Self {
            catalogs: HashMap::new(),
        }
    }

    /// Localizer preloaded with the English strings the engine emits.
    pub fn with_defaults() -> Self {
        let mut this = Self::new();
        this.insert_catalog(DEFAULT_LANG, default_catalog());
        this
    }

    pub fn insert_catalog(
        &mut self,
        lang: impl Into<String>,
        catalog: HashMap<String, String>,
    ) {
        self.catalogs.insert(lang.into(), catalog);
    }

    /// Merge a single template into a language catalog.
    pub fn insert(&mut self, lang: &str, key: impl Into<String>, template: impl Into<String>) {
        self.catalogs
            .entry(lang.to_string())
            .or_default()
            .insert(key.into(), template.into());
    }

    /// Look up `key` in `lang`, falling back to the default language, then to
    /// the key itself, and substitute `{tag}` markers.
    pub fn render(&self, lang: &str, key: &str, tags: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .map(String::as_str)
            .unwrap_or(key);

        let mut text = template.to_string();
        for (tag, value) in tags {
            text = text.replace(&format!("{{{tag}}}"), value);
        }
        text
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_catalog() -> HashMap<String, String> {
    [
        (
            "gate.guild_only",
            "The {command} command can only be used inside a server.",
        ),
        (
            "gate.admin_only",
            "The {command} command is restricted to bot administrators.",
        ),
        (
            "gate.missing_permissions",
            "You are missing the following permissions for {command}: {permissions}",
        ),
        (
            "gate.cooldown",
            "You can use {command} again in {remaining} second(s).",
        ),
        ("dialog.cancelled", "Okay, you have exited."),
        ("dialog.timeout", "Closed due to inactivity."),
        ("dialog.exhausted", "Too many attempts, giving up."),
        ("dialog.retry", "{error}\nPlease try again, or type \"{cancel}\" to exit."),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_tags() {
        let l10n = Localizer::with_defaults();
        let text = l10n.render(
            "en",
            "gate.cooldown",
            &[("command", "ping".into()), ("remaining", "3".into())],
        );
        assert_eq!(text, "You can use ping again in 3 second(s).");
    }

    #[test]
    fn test_fallback_to_default_lang() {
        let l10n = Localizer::with_defaults();
        let text = l10n.render("de", "dialog.cancelled", &[]);
        assert_eq!(text, "Okay, you have exited.");
    }

    #[test]
    fn test_translated_catalog_wins() {
        let mut l10n = Localizer::with_defaults();
        l10n.insert("de", "dialog.cancelled", "Okay, beendet.");
        assert_eq!(l10n.render("de", "dialog.cancelled", &[]), "Okay, beendet.");
    }

    #[test]
    fn test_unknown_key_renders_key() {
        let l10n = Localizer::with_defaults();
        assert_eq!(l10n.render("en", "no.such.key", &[]), "no.such.key");
    }
}
