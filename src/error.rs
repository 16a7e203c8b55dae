use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a run before any output is written.
#[derive(Error, Debug)]
pub enum IsuprofError {
    /// Lexer or parser diagnostic, already formatted with its location.
    #[error("{0}")]
    Parse(String),

    /// One or more type errors, already formatted with their locations.
    #[error("{0}")]
    TypeCheck(String),

    #[error("error: too many hash collisions for signature {signature} ({probes} probes)")]
    HashCollisionExhausted { signature: String, probes: u32 },

    #[error("error: failed to write {}: {source}", path.display())]
    Emit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error: invalid configuration: {0}")]
    Config(String),

    #[error("error: {0}")]
    Load(String),
}

/// Result type for fatal errors.
pub type Result<T> = std::result::Result<T, IsuprofError>;

/// Reasons a wrapper cannot be generated for a signature. The call site is
/// left as written and the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("type {0} is declared inside a function and cannot be named at package scope")]
    LocalType(String),

    #[error("type {0} is not exported by its package")]
    UnexportedType(String),

    #[error("type {0} has no source spelling")]
    Unrepresentable(String),

    #[error("builtin {0} is shadowed by a package-level declaration")]
    ShadowedBuiltin(String),

    #[error("the only argument is a call returning multiple values")]
    MultiValueArgument,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_messages() {
        let err = IsuprofError::HashCollisionExhausted {
            signature: "func(int) int".to_string(),
            probes: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "error: too many hash collisions for signature func(int) int (10000 probes)"
        );

        let err = IsuprofError::Emit {
            path: PathBuf::from("build/main.go"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "error: failed to write build/main.go: denied");
    }

    #[test]
    fn test_generation_messages() {
        assert_eq!(
            GenerationError::UnexportedType("net/http.conn".to_string()).to_string(),
            "type net/http.conn is not exported by its package"
        );
    }
}
