//! Localization of the bot's user-facing strings
//!
//! Message catalogs are Fluent files embedded at compile time, so the binary
//! carries its own translations.

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

/// Language used when the user's language is missing or unsupported
pub const DEFAULT_LANGUAGE: &str = "en";

const CATALOGS: [(&str, &str); 2] = [
    ("en", include_str!("../locales/en/main.ftl")),
    ("ru", include_str!("../locales/ru/main.ftl")),
];

/// Localization manager for the vote bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl std::fmt::Debug for LocalizationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationManager")
            .field("languages", &self.bundles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LocalizationManager {
    /// Create a new localization manager with every embedded catalog
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (locale_str, source) in CATALOGS {
            let locale: LanguageIdentifier = locale_str.parse()?;
            bundles.insert(locale_str.to_string(), Self::create_bundle(locale, source)?);
        }

        Ok(Self { bundles })
    }

    fn create_bundle(locale: LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Plain text output; Telegram shows isolation marks literally
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow::anyhow!("Invalid catalog for {}: {:?}", locale, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Duplicate messages in {}: {:?}", locale, errors))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&FluentArgs>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match bundle.get_message(key).and_then(|msg| msg.value()) {
            Some(pattern) => pattern,
            None => return format!("Missing translation: {}", key),
        };

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            tracing::warn!(key = %key, language = %language, errors = ?errors, "Message formatting reported errors");
        }
        value.into_owned()
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    /// Map a Telegram language code ("ru", "en-US", ...) to a supported language
    pub fn detect_language(&self, language_code: Option<&str>) -> String {
        language_code
            .and_then(|code| code.split(['-', '_']).next())
            .map(str::to_lowercase)
            .filter(|lang| self.is_language_supported(lang))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    /// Message in the user's language
    pub fn t(&self, key: &str, language_code: Option<&str>) -> String {
        let language = self.detect_language(language_code);
        self.get_message_in_language(key, &language, None)
    }

    /// Message with arguments in the user's language
    pub fn t_args(&self, key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
        let language = self.detect_language(language_code);
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, FluentValue::from(*value));
        }
        self.get_message_in_language(key, &language, Some(&fluent_args))
    }
}

/// Create the shared localization manager
pub fn create_localization_manager() -> Result<Arc<LocalizationManager>> {
    Ok(Arc::new(LocalizationManager::new()?))
}
