use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Token stamped on every outgoing signal so a party can recognise its own
/// messages when the relay reflects them. Not a credential.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct SenderId(pub Uuid);

impl SenderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SenderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the screen share this party is on.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owns the media source and sends it.
    Host,
    /// Receives only.
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Viewer => f.write_str("viewer"),
        }
    }
}
