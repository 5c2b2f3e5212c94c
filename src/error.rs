// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors raised by the hashing and equality collaborators of a map.
//!
//! Keys and values which implement [`Hash`][std::hash::Hash] and
//! [`PartialEq`][std::cmp::PartialEq] never produce these. They exist for
//! key types with host-style dynamic hashing, which can refuse to hash or
//! compare a particular value.

use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A key refused to be hashed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashError {
    reason: Cow<'static, str>,
}

impl HashError {
    /// Construct a hash error with a human readable reason.
    pub fn new<R>(reason: R) -> Self
    where
        R: Into<Cow<'static, str>>,
    {
        HashError {
            reason: reason.into(),
        }
    }

    /// Why hashing failed.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Display for HashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unhashable key: {}", self.reason)
    }
}

impl Error for HashError {}

/// Two keys or two values couldn't be compared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EqError {
    reason: Cow<'static, str>,
}

impl EqError {
    /// Construct an equality error with a human readable reason.
    pub fn new<R>(reason: R) -> Self
    where
        R: Into<Cow<'static, str>>,
    {
        EqError {
            reason: reason.into(),
        }
    }

    /// Why the comparison failed.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Display for EqError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "comparison failed: {}", self.reason)
    }
}

impl Error for EqError {}

/// The error returned by fallible map operations.
///
/// Whatever the variant, the map the operation was called on is left
/// untouched: new nodes are only ever published once they're complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HamtError {
    /// Hashing the key failed.
    Hash(HashError),
    /// Comparing two keys failed.
    KeyEq(EqError),
    /// Comparing two values failed.
    ValueEq(EqError),
}

impl Display for HamtError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HamtError::Hash(err) => Display::fmt(err, f),
            HamtError::KeyEq(err) => write!(f, "key {}", err),
            HamtError::ValueEq(err) => write!(f, "value {}", err),
        }
    }
}

impl Error for HamtError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HamtError::Hash(err) => Some(err),
            HamtError::KeyEq(err) | HamtError::ValueEq(err) => Some(err),
        }
    }
}

impl From<HashError> for HamtError {
    fn from(err: HashError) -> Self {
        HamtError::Hash(err)
    }
}
