use thiserror::Error;

pub mod context;

pub type Result<T> = std::result::Result<T, Error>;

pub use context::ErrorContext;

/// Main error type for the YAT engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // Error with context chain
    #[error("{message}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn template_not_found(name: impl Into<String>) -> Self {
        Self::TemplateNotFound(name.into())
    }

    // Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Template line the error points at, if it came from parsing or generation
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Parse(e) => Some(e.line),
            Error::Generation(e) => Some(e.line),
            Error::WithContext { source, .. } => source.line(),
            _ => None,
        }
    }

    /// Get a stable error code for tooling output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Parse(e) => match e.kind {
                ParseErrorKind::InvalidDirective(_) => "E_INVALID_DIRECTIVE",
                ParseErrorKind::UnmatchedBlock(_) => "E_UNMATCHED_BLOCK",
                ParseErrorKind::UnclosedBlock(_) => "E_UNCLOSED_BLOCK",
            },
            Error::Generation(e) => match e.kind {
                GenerationErrorKind::NotFound(_) => "E_NOT_FOUND",
                GenerationErrorKind::UnexpectedData(_) => "E_UNEXPECTED_DATA",
            },
            Error::TemplateNotFound(_) => "E_TEMPLATE_NOT_FOUND",
            Error::Config(_) => "E_CONFIG",
            Error::Json(_) => "E_JSON",
            Error::Yaml(_) => "E_YAML",
            Error::Toml(_) => "E_TOML",
            Error::WithContext { source, .. } => source.error_code(),
        }
    }
}

/// Malformed template text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line of the offending directive
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unknown keyword or wrong argument shape; carries the raw directive text
    #[error("invalid directive \"{0}\"")]
    InvalidDirective(String),

    /// A block terminator or branch that does not fit the innermost open block
    #[error("unmatched block \"{0}\"")]
    UnmatchedBlock(String),

    /// A block still open at the end of the template
    #[error("block \"{0}\" is never closed")]
    UnclosedBlock(String),
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    pub fn invalid_directive(line: usize, directive: impl Into<String>) -> Self {
        Self::new(line, ParseErrorKind::InvalidDirective(directive.into()))
    }

    pub fn unmatched_block(line: usize, directive: impl Into<String>) -> Self {
        Self::new(line, ParseErrorKind::UnmatchedBlock(directive.into()))
    }

    pub fn unclosed_block(line: usize, directive: impl Into<String>) -> Self {
        Self::new(line, ParseErrorKind::UnclosedBlock(directive.into()))
    }
}

/// Failure while replaying a parsed template against data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct GenerationError {
    /// 1-based line of the directive being evaluated
    pub line: usize,
    pub kind: GenerationErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// No scope resolves the full dotted path
    #[error("value not found for \"{0}\"")]
    NotFound(String),

    /// The value has the wrong shape for the directive
    #[error("{0}")]
    UnexpectedData(String),
}

impl GenerationError {
    pub fn not_found(line: usize, key: impl Into<String>) -> Self {
        Self {
            line,
            kind: GenerationErrorKind::NotFound(key.into()),
        }
    }

    pub fn unexpected_data(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            kind: GenerationErrorKind::UnexpectedData(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = Error::from(ParseError::unmatched_block(3, "endfor"));
        assert_eq!(
            err.to_string(),
            "Parse error: line 3: unmatched block \"endfor\""
        );
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.error_code(), "E_UNMATCHED_BLOCK");
    }

    #[test]
    fn test_kind_messages() {
        assert_eq!(
            ParseError::unclosed_block(2, "[for x in L]").to_string(),
            "line 2: block \"[for x in L]\" is never closed"
        );
        assert_eq!(
            ParseError::invalid_directive(1, "[a b c]").to_string(),
            "line 1: invalid directive \"[a b c]\""
        );
        assert_eq!(
            GenerationError::unexpected_data(4, "\"m\" should have list value").to_string(),
            "line 4: \"m\" should have list value"
        );
    }

    #[test]
    fn test_generation_error_display() {
        let err = Error::from(GenerationError::not_found(7, "a.b"));
        assert_eq!(
            err.to_string(),
            "Generation error: line 7: value not found for \"a.b\""
        );
        assert_eq!(err.error_code(), "E_NOT_FOUND");
    }

    #[test]
    fn test_context_keeps_line_and_code() {
        let err = Error::from(GenerationError::unexpected_data(2, "bad"))
            .with_context("rendering Foo.h");
        assert_eq!(err.to_string(), "rendering Foo.h");
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.error_code(), "E_UNEXPECTED_DATA");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("begin marker is empty");
        assert_eq!(err.line(), None);
        assert_eq!(err.error_code(), "E_CONFIG");
    }
}
