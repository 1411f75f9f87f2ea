use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// A ledger account holder. Users are never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "UID")]
    pub uid: UserId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
        }
    }
}
