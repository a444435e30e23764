//! The module contains the error the engine can throw.
//!
//! Every variant carries the message shown to API clients, except
//! [`Database`] and [`Password`] whose details are logged and never exposed.
//!
//!  [`Database`]: EngineError::Database
//!  [`Password`]: EngineError::Password
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A field is missing or malformed.
    #[error("{0}")]
    InvalidField(String),
    /// A partial update carried no assignable field.
    #[error("Tidak ada data yang diupdate")]
    NothingToUpdate,
    #[error("{0}")]
    KeyNotFound(String),
    /// Student lookups echo the searched identifier back to the caller.
    #[error("Siswa tidak ditemukan")]
    StudentNotFound { searched: String },
    #[error("{0}")]
    ExistingKey(String),
    /// A referenced student / payment type does not exist.
    #[error("{0}")]
    MissingReference(String),
    /// The row is still referenced and cannot be removed.
    #[error("{0}")]
    InUse(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("password hashing failed: {0}")]
    Password(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl From<bcrypt::BcryptError> for EngineError {
    fn from(value: bcrypt::BcryptError) -> Self {
        Self::Password(value.to_string())
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidField(a), Self::InvalidField(b)) => a == b,
            (Self::NothingToUpdate, Self::NothingToUpdate) => true,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::StudentNotFound { searched: a }, Self::StudentNotFound { searched: b }) => {
                a == b
            }
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::MissingReference(a), Self::MissingReference(b)) => a == b,
            (Self::InUse(a), Self::InUse(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Password(a), Self::Password(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
