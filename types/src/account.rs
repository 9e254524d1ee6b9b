//! Member account type with `gvl_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An account on the governance ledger, always prefixed with `gvl_`.
///
/// An account identifies one member of the organization: a shareholder, an
/// officer, or a contracting party. The ledger below this protocol owns key
/// management; here the address is an opaque, validated identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Account(String);

impl Account {
    /// The standard prefix for all gavel accounts.
    pub const PREFIX: &'static str = "gvl_";

    /// Create a new account from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `gvl_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "account must start with gvl_");
        Self(s)
    }

    /// Return the raw account string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this account is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Account {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
