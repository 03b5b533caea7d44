use serde::{Deserialize, Serialize};

use super::Id;

/// Public projection advertised in event payloads and presence grants.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Id,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Profile {
    pub fn new(id: Id, name: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image,
        }
    }
}
