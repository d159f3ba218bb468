//! Error context for multi-output runs
//!
//! Code generators render many templates in one run; wrapping an error with
//! the name of the output being produced tells the user which template broke
//! without losing the line number carried by the root cause.

use super::Error;

/// Attach a lazily built context message to a failing `Result`
pub trait ErrorContext<T> {
    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ErrorContext<T> for Result<T, Error> {
    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, ParseError};

    #[test]
    fn test_nested_context_keeps_root_cause() {
        let result: Result<(), Error> = Err(ParseError::invalid_directive(4, "[for x]").into());
        let err = result
            .with_context(|| "parsing output name")
            .with_context(|| format!("output #{}", 2))
            .unwrap_err();

        assert_eq!(err.to_string(), "output #2");
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.error_code(), "E_INVALID_DIRECTIVE");

        match err {
            Error::WithContext { source, .. } => match *source {
                Error::WithContext { message, source } => {
                    assert_eq!(message, "parsing output name");
                    assert!(matches!(*source, Error::Parse(_)));
                }
                other => panic!("Expected nested WithContext error, got {:?}", other),
            },
            other => panic!("Expected WithContext error, got {:?}", other),
        }
    }

    #[test]
    fn test_context_not_built_on_success() {
        let result: Result<u32, Error> = Ok(7);
        let value = result
            .with_context(|| -> String { panic!("context built for Ok") })
            .unwrap();
        assert_eq!(value, 7);

        let failed: Result<u32, Error> = Err(GenerationError::not_found(1, "k").into());
        assert_eq!(failed.with_context(|| "rendering").unwrap_err().error_code(), "E_NOT_FOUND");
    }
}
