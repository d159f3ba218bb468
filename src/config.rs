use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Template syntax settings
///
/// Passed explicitly to every parse and generator call; there is no global
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Literal text opening a directive
    #[serde(default = "default_begin_mark")]
    pub begin_mark: String,

    /// Literal text closing a directive
    #[serde(default = "default_end_mark")]
    pub end_mark: String,

    /// Drop one newline directly after a command directive
    #[serde(default = "default_trim_directive_newline")]
    pub trim_directive_newline: bool,
}

fn default_begin_mark() -> String {
    "[".to_string()
}

fn default_end_mark() -> String {
    "]".to_string()
}

fn default_trim_directive_newline() -> bool {
    true
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            begin_mark: default_begin_mark(),
            end_mark: default_end_mark(),
            trim_directive_newline: default_trim_directive_newline(),
        }
    }
}

/// Wrapper so a config file may keep the settings under `[template]`
#[derive(Deserialize)]
struct ConfigFile {
    template: TemplateConfig,
}

impl TemplateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers(mut self, begin: impl Into<String>, end: impl Into<String>) -> Self {
        self.begin_mark = begin.into();
        self.end_mark = end.into();
        self
    }

    pub fn with_trim_directive_newline(mut self, trim: bool) -> Self {
        self.trim_directive_newline = trim;
        self
    }

    /// Load settings from TOML, either as a bare table or under `[template]`
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;

        let config = if table.contains_key("template") {
            let file: ConfigFile = toml::from_str(content)?;
            file.template
        } else {
            toml::from_str(content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject marker pairs the lexer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.begin_mark.is_empty() {
            return Err(Error::config("begin_mark must not be empty"));
        }
        if self.end_mark.is_empty() {
            return Err(Error::config("end_mark must not be empty"));
        }
        if self.begin_mark == self.end_mark {
            return Err(Error::config(format!(
                "begin_mark and end_mark must differ (both are \"{}\")",
                self.begin_mark
            )));
        }
        if self.end_mark.starts_with('#') {
            return Err(Error::config(
                "end_mark must not start with '#', it would collide with comments",
            ));
        }
        Ok(())
    }
}
