//! Error types for sqlsheet.

use thiserror::Error;

/// The main error type for sqlsheet operations.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Malformed definition text.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// A definition parsed but describes something unusable.
    #[error("Invalid definition '{query}': {source}")]
    Definition {
        query: String,
        #[source]
        source: DefinitionError,
    },

    /// A callable was invoked without a keyword argument that has no default.
    #[error("Missing required argument: '{0}'")]
    MissingRequiredArgument(String),

    /// A whitelisted variable was bound to a value outside its whitelist.
    #[error("Invalid whitelist value: '{value}' is not one of [{}]", .whitelist.join(", "))]
    InvalidWhitelistValue {
        value: String,
        whitelist: Vec<String>,
    },

    /// Wrong number of positional arguments.
    #[error("Expected {expected} positional argument(s), got {found}")]
    Arity { expected: usize, found: usize },

    /// A keyword argument the query does not declare.
    #[error("Unexpected argument: '{0}'")]
    UnexpectedArgument(String),

    /// Rendering was attempted before every whitelisted parameter was substituted.
    #[error("Statement still contains whitelisted parameter '{0}'")]
    Unexpanded(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Problems detected while constructing a query, independent of any call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("setter queries need at least 2 positional arguments, found {found}")]
    SetterArity { found: usize },

    #[error("variable '{variable}' is declared more than once ({})", .names.join(", "))]
    DuplicateVariable { variable: String, names: Vec<String> },

    #[error("whitelist for '{variable}' is empty")]
    EmptyWhitelist { variable: String },

    #[error("whitelist for '{variable}' contains a blank entry")]
    BlankWhitelistEntry { variable: String },

    #[error("whitelist for '{variable}' lists '{entry}' more than once")]
    DuplicateWhitelistEntry { variable: String, entry: String },

    #[error("whitelist entry '{entry}' for '{variable}' is not a plain SQL token")]
    UnsafeWhitelistEntry { variable: String, entry: String },

    #[error("'{variable}' is declared with different whitelists")]
    ConflictingWhitelist { variable: String },

    #[error("'{name}' does not normalize to an identifier")]
    InvalidName { name: String },

    #[error("identifier '{id}' is already used by '{first}'")]
    DuplicateId { id: String, first: String },
}

impl SheetError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Attach a definition error to the query it was found in.
    pub fn definition(query: impl Into<String>, source: DefinitionError) -> Self {
        Self::Definition {
            query: query.into(),
            source,
        }
    }

    /// Create a whitelist mismatch error. Used by generated code.
    pub fn invalid_whitelist(value: &str, whitelist: &[&str]) -> Self {
        Self::InvalidWhitelistValue {
            value: value.to_string(),
            whitelist: whitelist.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Result type alias for sqlsheet operations.
pub type SheetResult<T> = Result<T, SheetError>;
