//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or bootstrap failure.
    Config(String),
    /// Submitted appointment data violated a boundary rule.
    Validation(String),
    /// Requested appointment does not exist.
    NotFound(String),
    /// Persistence failure in the record store.
    Db(String),
    /// Confirmation email could not be delivered; worth retrying.
    Mail(String),
    /// Confirmation email can never be sent as composed, e.g. a recipient
    /// address the mailer rejects.
    Undeliverable(String),
    /// A page or email template failed to render.
    Template(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Mail(msg) => write!(f, "mail: {msg}"),
            Self::Undeliverable(msg) => write!(f, "undeliverable: {msg}"),
            Self::Template(msg) => write!(f, "template: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Db(format!("json: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Undeliverable(format!("failed to build message: {err}"))
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::Undeliverable(format!("invalid address: {err}"))
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Mail(format!("smtp: {err}"))
    }
}
