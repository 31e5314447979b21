//! Optional `uaedbg.toml` defaults, overridden by CLI flags (matching the
//! teacher's `name_core` `serde` + `toml` configuration pattern).

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub fsuae_bin: Option<String>,
    pub config_path: Option<String>,
    pub breakpoint_retries: Option<u32>,
}

impl Config {
    /// Looks for `uaedbg.toml` in the current directory; an absent or
    /// unreadable file is not an error, just an empty config.
    pub fn load() -> Config {
        match std::fs::read_to_string("uaedbg.toml") {
            Ok(text) => toml::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!("ignoring malformed uaedbg.toml: {e}");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    pub fn fsuae_bin(&self) -> &str {
        self.fsuae_bin.as_deref().unwrap_or("fs-uae")
    }

    pub fn breakpoint_retries(&self) -> u32 {
        self.breakpoint_retries.unwrap_or(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_fallbacks() {
        let cfg = Config::default();
        assert_eq!(cfg.fsuae_bin(), "fs-uae");
        assert_eq!(cfg.breakpoint_retries(), 3);
    }
}
