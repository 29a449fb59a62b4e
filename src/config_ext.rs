//! App-specific configuration extensions.
//!
//! This module provides hotkey support on top of the core Config.

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use tracing::warn;

use crate::Config;

/// Default hotkey: Meta+Shift+Semicolon
pub fn default_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::META | Modifiers::SHIFT), Code::Semicolon)
}

/// Extension trait for Config to handle hotkeys.
pub trait ConfigExt {
    /// The configured hotkey, falling back to the default when the config
    /// string is absent or does not parse.
    fn hotkey(&self) -> HotKey;
}

impl ConfigExt for Config {
    fn hotkey(&self) -> HotKey {
        let Some(spec) = self.hotkey.as_deref() else {
            return default_hotkey();
        };
        match spec.parse() {
            Ok(hotkey) => hotkey,
            Err(e) => {
                warn!("Invalid hotkey {spec:?} in config, using default: {e}");
                default_hotkey()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_hotkey_uses_default() {
        let config = Config::default();
        assert_eq!(config.hotkey(), default_hotkey());
    }

    #[test]
    fn hotkey_parses_from_config_string() {
        let config = Config {
            hotkey: Some("meta+shift+semicolon".to_owned()),
            ..Default::default()
        };
        assert_eq!(config.hotkey(), default_hotkey());

        let config = Config {
            hotkey: Some("alt+shift+KeyR".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            config.hotkey(),
            HotKey::new(Some(Modifiers::ALT | Modifiers::SHIFT), Code::KeyR)
        );
    }

    #[test]
    fn unparsable_hotkey_falls_back_to_default() {
        let config = Config {
            hotkey: Some("ctrl+banana".to_owned()),
            ..Default::default()
        };
        assert_eq!(config.hotkey(), default_hotkey());
    }
}
