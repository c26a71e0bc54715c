//! Participant addresses
//!
//! A participant is addressed as `user@server`, where `user` is the
//! account's phone number in international format without the leading
//! `+`. Callers usually only know the number, so [`ParticipantAddress::parse`]
//! fills in a default server when none is given.

use std::fmt;

use thiserror::Error;

/// Longest phone number allowed by E.164
pub const MAX_USER_DIGITS: usize = 15;

/// Reasons a recipient string is not a participant address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("'{0}' is not a phone number (digits only)")]
    NotNumeric(String),

    #[error("phone number has {0} digits, at most {MAX_USER_DIGITS} allowed")]
    TooLong(usize),

    #[error("invalid server part '{0}'")]
    InvalidServer(String),
}

/// A well-formed participant address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantAddress {
    user: String,
    server: String,
}

impl ParticipantAddress {
    /// Parse `text` into an address, using `default_server` for bare numbers.
    pub fn parse(text: &str, default_server: &str) -> Result<Self, AddressError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AddressError::Empty);
        }

        let (user, server) = match text.split_once('@') {
            Some((user, server)) => (user, server),
            None => (text, default_server),
        };

        let user = user.strip_prefix('+').unwrap_or(user);
        if user.is_empty() {
            return Err(AddressError::Empty);
        }
        if !user.chars().all(|c| c.is_ascii_digit()) {
            return Err(AddressError::NotNumeric(user.to_string()));
        }
        if user.len() > MAX_USER_DIGITS {
            return Err(AddressError::TooLong(user.len()));
        }

        if server.is_empty() || server.contains('@') || server.contains(char::is_whitespace) {
            return Err(AddressError::InvalidServer(server.to_string()));
        }

        Ok(Self {
            user: user.to_string(),
            server: server.to_string(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn server(&self) -> &str {
        &self.server
    }
}

impl fmt::Display for ParticipantAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}
