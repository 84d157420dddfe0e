use std::result;
use thiserror::Error;

/// Errors raised while generating a binding or calling through one.
///
/// `Configuration` is generation-time and aborts binding construction.
/// `SymbolNotFound` is raised at activation for eager bindings and on first
/// use for lazy ones. The remaining variants are call-time errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("configuration error in `{member}`: {message}")]
    Configuration { member: String, message: String },
    #[error("native symbol `{symbol}` for member `{member}` not found: {reason}")]
    SymbolNotFound {
        symbol: String,
        member: String,
        reason: String,
    },
    #[error("`{interface}::{member}` called after the binding was disposed")]
    DisposedAccess { interface: String, member: String },
    #[error("marshalling failure in `{member}`: {message}")]
    Marshalling { member: String, message: String },
    #[error("argument mismatch calling `{member}`: {message}")]
    ArgumentMismatch { member: String, message: String },
    #[error("interface `{interface}` has no member `{member}`")]
    UnknownMember { interface: String, member: String },
    #[error("{0}")]
    Generic(String),
}

impl Error {
    pub fn configuration(member: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            member: member.into(),
            message: message.into(),
        }
    }

    pub fn marshalling(member: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Marshalling {
            member: member.into(),
            message: message.into(),
        }
    }

    pub fn argument_mismatch(member: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ArgumentMismatch {
            member: member.into(),
            message: message.into(),
        }
    }

    /// True for errors that can only be produced while generating a binding type.
    pub fn is_generation_time(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
}

pub type Result<T> = result::Result<T, Error>;

impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(format!("{err:#}"))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Generic(s.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
