use serde::{Deserialize, Serialize};

use crate::user::{self, model::Profile};

/// Payload the broker advertises to other members of a presence channel once
/// the grant succeeds.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceData {
    pub user_id: user::Id,
    pub user_info: Profile,
}

impl PresenceData {
    pub fn new(profile: Profile) -> Self {
        Self {
            user_id: profile.id,
            user_info: profile,
        }
    }
}

/// Signed subscribe grant returned by the authorization endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub auth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<PresenceData>,
}
