//! YAT - Yet Another Template engine for build-time code generators
//!
//! YAT renders plain-text templates with bracketed directives against a tree
//! of data (usually loaded from YAML or JSON, or built from an IDL tree):
//! - Key lookup with dot notation: `[op.return.type]`
//! - Loops over sequences: `[for a in op.args]...[endfor]`, `[for-inv ...]`, `[last]`
//! - Conditionals: `[if k is v]`, `[if-index a is last]`, `[if-any k]`
//! - Literal begin markers `[[]` and comments `[# ...]`
//! - Configurable markers, e.g. `{% ` / ` %}`
//!
//! ```
//! use serde_json::json;
//!
//! let template = yat::parse("[for item in L][item.name]-[endfor]").unwrap();
//! let data = yat::Value::from(json!({"L": [{"name": "a"}, {"name": "b"}]}));
//! assert_eq!(yat::generate(&template, &data).unwrap(), "a-b-");
//! ```

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod config;
pub mod error;
pub mod generator;
pub mod template;
pub mod value;

// Re-export main types for public API
pub use config::TemplateConfig;
pub use error::{Error, GenerationError, ParseError, Result};
pub use generator::{GeneratedFile, Generator};
pub use template::{Engine, Template};
pub use value::{Mapping, Value};

/// Parse `text` with the default `[` `]` markers
pub fn parse(text: &str) -> Result<Template> {
    Template::parse(text)
}

/// Parse `text` with explicit syntax settings
pub fn parse_with(text: &str, config: &TemplateConfig) -> Result<Template> {
    Template::with_config(text, config)
}

/// Render a parsed template against `data`
pub fn generate(template: &Template, data: &Value) -> Result<String> {
    template.generate(data)
}
