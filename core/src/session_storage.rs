//! Client-local session storage contract.
//!
//! Two keyed entries survive between runs of a client: the active user and
//! the last-seen roster. Values are opaque strings at this layer; the session
//! resolver owns their (validated) JSON encoding.

use thiserror::Error;

/// The keys the session resolver persists under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Serialized active `User`
    Active,
    /// Serialized `Vec<User>` roster
    Users,
}

impl SessionKey {
    /// Storage key name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Users => "users",
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the storage backend itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Reading an entry failed
    #[error("failed to read session entry `{key}`: {message}")]
    Read {
        /// Entry being read
        key: SessionKey,
        /// Backend message
        message: String,
    },

    /// Writing an entry failed
    #[error("failed to write session entry `{key}`: {message}")]
    Write {
        /// Entry being written
        key: SessionKey,
        /// Backend message
        message: String,
    },
}

/// Keyed string storage scoped to one client.
///
/// Writes replace the previous value wholesale; there is no expiry.
pub trait SessionStorage: Send + Sync {
    /// Read an entry, `None` if it was never written
    ///
    /// # Errors
    ///
    /// [`StorageError::Read`] if the backend fails.
    fn read(&self, key: SessionKey) -> Result<Option<String>, StorageError>;

    /// Overwrite an entry
    ///
    /// # Errors
    ///
    /// [`StorageError::Write`] if the backend fails.
    fn write(&self, key: SessionKey, value: &str) -> Result<(), StorageError>;
}
