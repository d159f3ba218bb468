/// YAT template engine
///
/// Templates are plain text with bracketed directives:
/// - Key lookup with dot notation: `[op.name]`
/// - Loops: `[for a in op.args]...[endfor]`, `[for-inv ...]`, `[last]`
/// - Conditionals: `[if k is v]`, `[if-index a is last]`, `[if-any k]`
///   with matching `elif*`, `[else]` and `[endif]`
/// - Escapes `[[]` and comments `[# ...]`
///
/// Parsing and rendering are separate steps; a parsed `Template` is immutable
/// and can be rendered against any number of data trees.
pub mod ast;
pub mod engine;
pub mod lexer;
pub mod parser;
pub mod renderer;

pub use ast::{Branch, IndexPredicate, Node, Template, Test};
pub use engine::Engine;
pub use lexer::{Token, TokenKind};
pub use parser::Parser;
pub use renderer::Renderer;

use crate::config::TemplateConfig;
use crate::error::Result;
use crate::value::Value;

impl Template {
    /// Parse `text` with the default `[` `]` markers
    pub fn parse(text: &str) -> Result<Self> {
        Self::with_config(text, &TemplateConfig::default())
    }

    pub fn with_config(text: &str, config: &TemplateConfig) -> Result<Self> {
        Parser::new(text, config)?.parse()
    }

    /// Parse `text` using custom begin/end markers, e.g. `"{% "` and `" %}"`
    pub fn with_markers(text: &str, begin: &str, end: &str) -> Result<Self> {
        Self::with_config(text, &TemplateConfig::default().with_markers(begin, end))
    }

    /// Render the template against `data`
    ///
    /// Either the whole output is returned or the first error; nothing partial.
    pub fn generate(&self, data: &Value) -> Result<String> {
        Ok(Renderer::new(data).render(self)?)
    }
}
