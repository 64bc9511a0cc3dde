use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// FilterConfig holds the settings of a single filter run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Charset the stylesheet was decoded with, if known
    pub charset: Option<String>,
    /// The stylesheet comes from a `<style>` element or attribute
    pub inline: bool,
    /// Only look for a `@charset` rule and stop, without producing output
    pub stop_at_detected_charset: bool,
    /// Media assumed outside of any `@media` block
    pub default_media: Vec<String>,
    /// Maximum number of characters consumed from the input
    pub max_input_len: Option<usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            charset: None,
            inline: false,
            stop_at_detected_charset: false,
            default_media: vec!["screen".to_string()],
            max_input_len: None,
        }
    }
}

impl FilterConfig {
    /// Reads a configuration from a json file. Fields left out keep their default.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_charset(mut self, charset: &str) -> Self {
        self.charset = Some(charset.to_string());
        self
    }
}
