//! Identifier newtypes for users, connections and sessions.
//!
//! ## UserId vs ConnectionId
//!
//! A `UserId` is the persistent identity of a player and never changes
//! for the lifetime of a session. A `ConnectionId` names the transport
//! connection the user is currently reachable on and is replaced every
//! time the user reconnects.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Persistent user identity, stable across reconnects.
    UserId
);

string_id!(
    /// Ephemeral transport connection, replaced on reconnect.
    ConnectionId
);

string_id!(
    /// Identifier of one match session.
    SessionId
);
