//! Console configuration
//!
//! Every field has a default matching the admin console's stock behavior, so an
//! empty TOML document is a valid configuration.

use std::path::Path;

use cpm_core::Locale;
use serde::{Deserialize, Serialize};

use crate::errors::{ConsoleError, Result};

/// Environment variable that overrides the configured locale.
pub const LOCALE_ENV_VAR: &str = "CPM_LANG";

/// Default for [`ConsoleConfig::guard_attribute`].
pub const DEFAULT_GUARD_ATTRIBUTE: &str = "hx-confirm";
/// Default for [`ConsoleConfig::suppression_grace_ms`].
pub const DEFAULT_SUPPRESSION_GRACE_MS: u64 = 100;
/// Default for [`ConsoleConfig::debounce_quiet_ms`].
pub const DEFAULT_DEBOUNCE_QUIET_MS: u64 = 300;
/// Default for [`ConsoleConfig::search_input_id`].
pub const DEFAULT_SEARCH_INPUT_ID: &str = "search-input";
/// Default for [`ConsoleConfig::search_trigger`].
pub const DEFAULT_SEARCH_TRIGGER: &str = "search";
/// Default for [`ConsoleConfig::toast_display_ms`].
pub const DEFAULT_TOAST_DISPLAY_MS: u64 = 5_000;
/// Default for [`ConsoleConfig::toast_fade_ms`].
pub const DEFAULT_TOAST_FADE_MS: u64 = 300;
/// Default for [`ConsoleConfig::copy_feedback_ms`].
pub const DEFAULT_COPY_FEEDBACK_MS: u64 = 2_000;
/// Default for [`ConsoleConfig::flash_display_ms`].
pub const DEFAULT_FLASH_DISPLAY_MS: u64 = 5_000;
/// Default for [`ConsoleConfig::flash_fade_ms`].
pub const DEFAULT_FLASH_FADE_MS: u64 = 300;
/// Bootstrap `danger` red.
pub const DEFAULT_CONFIRM_BUTTON_COLOR: &str = "#dc3545";
/// Bootstrap `secondary` gray.
pub const DEFAULT_CANCEL_BUTTON_COLOR: &str = "#6c757d";

/// Tunables for the interaction layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Active UI language for dialog texts
    pub locale: Locale,
    /// Attribute marking an element as guarded; its value is the prompt text
    pub guard_attribute: String,
    /// How long the guard stays removed after consent
    pub suppression_grace_ms: u64,
    /// Quiet period before a debounced trigger fires
    pub debounce_quiet_ms: u64,
    /// DOM id of the search box bound at start
    pub search_input_id: String,
    /// Synthetic event dispatched on the search box
    pub search_trigger: String,
    /// How long a toast stays fully visible
    pub toast_display_ms: u64,
    /// Fade-out duration before a toast is removed
    pub toast_fade_ms: u64,
    /// How long a copy button shows its confirmation label
    pub copy_feedback_ms: u64,
    /// How long server flash messages stay before fading
    pub flash_display_ms: u64,
    /// Fade-out duration before a flash message is removed
    pub flash_fade_ms: u64,
    /// Proceed button color in confirmation dialogs
    pub confirm_button_color: String,
    /// Cancel button color in confirmation dialogs
    pub cancel_button_color: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            guard_attribute: DEFAULT_GUARD_ATTRIBUTE.to_string(),
            suppression_grace_ms: DEFAULT_SUPPRESSION_GRACE_MS,
            debounce_quiet_ms: DEFAULT_DEBOUNCE_QUIET_MS,
            search_input_id: DEFAULT_SEARCH_INPUT_ID.to_string(),
            search_trigger: DEFAULT_SEARCH_TRIGGER.to_string(),
            toast_display_ms: DEFAULT_TOAST_DISPLAY_MS,
            toast_fade_ms: DEFAULT_TOAST_FADE_MS,
            copy_feedback_ms: DEFAULT_COPY_FEEDBACK_MS,
            flash_display_ms: DEFAULT_FLASH_DISPLAY_MS,
            flash_fade_ms: DEFAULT_FLASH_FADE_MS,
            confirm_button_color: DEFAULT_CONFIRM_BUTTON_COLOR.to_string(),
            cancel_button_color: DEFAULT_CANCEL_BUTTON_COLOR.to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load, validate and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConsoleError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values the components cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.guard_attribute.trim().is_empty() {
            return Err(ConsoleError::invalid_config("guard_attribute must not be empty"));
        }
        if self.search_trigger.trim().is_empty() {
            return Err(ConsoleError::invalid_config("search_trigger must not be empty"));
        }
        if self.suppression_grace_ms == 0 {
            return Err(ConsoleError::invalid_config(
                "suppression_grace_ms must be positive so the re-issued click is dispatched first",
            ));
        }
        if self.debounce_quiet_ms == 0 {
            return Err(ConsoleError::invalid_config("debounce_quiet_ms must be positive"));
        }
        Ok(())
    }

    /// Apply `CPM_LANG` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (environment, CLI flags).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(code) = lookup(LOCALE_ENV_VAR) {
            self.locale = Locale::from_code(&code);
        }
    }
}
