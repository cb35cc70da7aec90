//! Message catalogs for localized response strings.
//!
//! Built once at startup and shared read-only between requests. The active
//! locale is never stored here; callers pass it on every lookup.

use std::collections::HashMap;

const ENGLISH: &str = "en";

const BUILTIN_EN: &[(&str, &str)] = &[
    ("required", "required"),
    ("must_be_string", "must be a string"),
    ("unknown_field", "is not a known field"),
    ("not_found", "not found"),
    ("not_acceptable", "not acceptable"),
    ("method_not_allowed", "method not allowed"),
    ("malformed_body", "malformed request body"),
    ("unsupported_media_type", "request body must be JSON"),
    ("unprocessable", "validation failed"),
];

/// Per-locale key → text catalogs.
#[derive(Clone, Debug)]
pub struct Translations {
    default_locale: String,
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl Translations {
    /// English built-ins, with `default_locale` as the first fallback.
    pub fn new(default_locale: impl Into<String>) -> Self {
        let english = BUILTIN_EN
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Self {
            default_locale: default_locale.into(),
            catalogs: HashMap::from([(ENGLISH.to_owned(), english)]),
        }
    }

    /// Adds or replaces one message.
    pub fn insert(&mut self, locale: &str, key: &str, text: impl Into<String>) {
        self.catalogs
            .entry(locale.to_owned())
            .or_default()
            .insert(key.to_owned(), text.into());
    }

    /// Adds a whole catalog, overriding existing keys.
    pub fn extend<I, K, V>(&mut self, locale: &str, messages: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.catalogs
            .entry(locale.to_owned())
            .or_default()
            .extend(messages.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Looks `key` up in `locale`, then the default locale, then English.
    /// Unknown keys come back as themselves.
    pub fn lookup<'a>(&'a self, locale: &str, key: &'a str) -> &'a str {
        [locale, self.default_locale.as_str(), ENGLISH]
            .into_iter()
            .find_map(|l| self.catalogs.get(l)?.get(key))
            .map_or(key, String::as_str)
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::new(ENGLISH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_through_default_then_english() {
        let mut t = Translations::new("pt-BR");
        t.insert("pt-BR", "required", "obrigatório");
        t.insert("es", "not_found", "no encontrado");

        assert_eq!(t.lookup("es", "not_found"), "no encontrado");
        assert_eq!(t.lookup("es", "required"), "obrigatório");
        assert_eq!(t.lookup("de", "must_be_string"), "must be a string");
        assert_eq!(t.lookup("de", "no_such_key"), "no_such_key");
    }

    #[test]
    fn extend_overrides_builtins() {
        let mut t = Translations::default();
        t.extend("en", [("required", "can't be blank")]);
        assert_eq!(t.lookup("en", "required"), "can't be blank");
    }
}
