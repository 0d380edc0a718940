//! Domain primitive types used across the tenantbox workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_IDENTITY_LEN;
use crate::error::{Result, TenantboxError};

/// Identity of a user, mapped one-to-one onto a container name.
///
/// The only way to build one is [`UserIdentity::parse`], so every value that
/// reaches a runtime adapter is a safe argument: non-empty, at most
/// [`MAX_IDENTITY_LEN`] bytes, restricted to `[A-Za-z0-9_.-]`, and never
/// starting with `-` or `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserIdentity(String);

impl UserIdentity {
    /// Validates and wraps a raw identity string.
    ///
    /// # Errors
    ///
    /// Returns [`TenantboxError::InvalidIdentity`] if the input is empty, too
    /// long, starts with `-` or `.`, or contains a character outside the
    /// allowed set.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let reason = if raw.is_empty() {
            Some("identity is empty")
        } else if raw.len() > MAX_IDENTITY_LEN {
            Some("identity is longer than 64 bytes")
        } else if raw.starts_with('-') || raw.starts_with('.') {
            Some("identity must not start with '-' or '.'")
        } else if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            Some("identity may only contain ASCII letters, digits, '_', '.' and '-'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(TenantboxError::InvalidIdentity {
                identity: raw,
                reason,
            }),
            None => Ok(Self(raw)),
        }
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserIdentity {
    type Error = TenantboxError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<UserIdentity> for String {
    fn from(value: UserIdentity) -> Self {
        value.0
    }
}

impl AsRef<str> for UserIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a user container.
///
/// `Transitioning` is only held by a coordinator record while a mutating
/// operation owns the identity's exclusive section. Observations of the
/// runtime always yield one of the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// The runtime knows no container for the identity.
    Absent,
    /// The container exists but is not running.
    Stopped,
    /// The container is running.
    Running,
    /// A lifecycle operation is in flight.
    Transitioning,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Stopped => write!(f, "stopped"),
            Self::Running => write!(f, "running"),
            Self::Transitioning => write!(f, "transitioning"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_usernames() {
        for raw in ["alice", "bob2", "carol_smith", "dave.jones", "x-1", "A9"] {
            assert!(UserIdentity::parse(raw).is_ok(), "{raw} should be valid");
        }
    }

    #[test]
    fn rejects_empty_identity() {
        let err = UserIdentity::parse("").unwrap_err();
        assert!(matches!(err, TenantboxError::InvalidIdentity { .. }));
    }

    #[test]
    fn rejects_flag_like_identity() {
        assert!(UserIdentity::parse("--rm").is_err());
        assert!(UserIdentity::parse(".hidden").is_err());
    }

    #[test]
    fn rejects_shell_metacharacters_and_whitespace() {
        for raw in ["bob;rm", "a b", "x$(id)", "név", "a/b", "a'b"] {
            assert!(UserIdentity::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn rejects_overlong_identity() {
        let raw = "a".repeat(MAX_IDENTITY_LEN + 1);
        assert!(UserIdentity::parse(raw).is_err());
        assert!(UserIdentity::parse("a".repeat(MAX_IDENTITY_LEN)).is_ok());
    }

    #[test]
    fn deserialization_validates() {
        let ok: UserIdentity = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(ok.as_str(), "alice");
        assert!(serde_json::from_str::<UserIdentity>("\"a b\"").is_err());
    }

    #[test]
    fn state_serializes_with_variant_names() {
        let json = serde_json::to_string(&LifecycleState::Running).unwrap();
        assert_eq!(json, "\"Running\"");
        assert_eq!(LifecycleState::Absent.to_string(), "absent");
    }
}
