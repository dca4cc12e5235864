//! Provider secrets read from the process environment
//!
//! The keys are read once, on first use, and cached for the lifetime of the
//! process. Call `dotenvy::dotenv()` before the first access to pick up a
//! local `.env` file.

use std::sync::LazyLock;

use crate::VacaigentError;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const SERPER_API_KEY: &str = "SERPER_API_KEY";
pub const BROWSERLESS_API_KEY: &str = "BROWSERLESS_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

static GLOBAL_SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::from_env);

/// API keys for the model providers and research services
#[derive(Clone, Default)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    pub browserless_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Settings")
            .field("gemini_api_key", &mask(&self.gemini_api_key))
            .field("serper_api_key", &mask(&self.serper_api_key))
            .field("browserless_api_key", &mask(&self.browserless_api_key))
            .field("openai_api_key", &mask(&self.openai_api_key))
            .finish()
    }
}

impl Settings {
    /// The process-wide settings, read from the environment on first access
    pub fn global() -> &'static Settings {
        &GLOBAL_SETTINGS
    }

    /// Read the keys from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            gemini_api_key: read(GEMINI_API_KEY),
            serper_api_key: read(SERPER_API_KEY),
            browserless_api_key: read(BROWSERLESS_API_KEY),
            openai_api_key: read(OPENAI_API_KEY),
        }
    }

    /// Names of the required keys that are not set, in a fixed order
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            (GEMINI_API_KEY, &self.gemini_api_key),
            (SERPER_API_KEY, &self.serper_api_key),
            (BROWSERLESS_API_KEY, &self.browserless_api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Fail with [`VacaigentError::MissingKeys`] unless every required key is set
    pub fn require_keys(&self) -> Result<&Self, VacaigentError> {
        let keys = self.missing_required();
        if keys.is_empty() {
            Ok(self)
        } else {
            Err(VacaigentError::MissingKeys { keys })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with(pairs: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn test_all_required_present() {
        let settings = settings_with(&[
            (GEMINI_API_KEY, "g"),
            (SERPER_API_KEY, "s"),
            (BROWSERLESS_API_KEY, "b"),
        ]);
        assert!(settings.missing_required().is_empty());
        assert!(settings.require_keys().is_ok());
        assert!(settings.openai_api_key.is_none());
    }

    #[test]
    fn test_missing_keys_named_exactly() {
        let settings = settings_with(&[(SERPER_API_KEY, "s")]);
        assert_eq!(
            settings.missing_required(),
            vec![GEMINI_API_KEY, BROWSERLESS_API_KEY]
        );

        let err = settings.require_keys().unwrap_err();
        assert!(matches!(err, VacaigentError::MissingKeys { ref keys } if keys.len() == 2));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let settings = settings_with(&[
            (GEMINI_API_KEY, ""),
            (SERPER_API_KEY, "s"),
            (BROWSERLESS_API_KEY, "   "),
        ]);
        assert_eq!(
            settings.missing_required(),
            vec![GEMINI_API_KEY, BROWSERLESS_API_KEY]
        );
    }

    #[test]
    fn test_debug_masks_secrets() {
        let settings = settings_with(&[(GEMINI_API_KEY, "super-secret")]);
        let debug = format!("{settings:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<set>"));
    }
}
