use serde::{Deserialize, Serialize};

use crate::feed::PositionId;

/// The signed-in (or impersonated) user the feed is generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub office_id: Option<u32>,
    #[serde(default)]
    pub province_id: Option<u32>,
    pub position_id: PositionId,
    #[serde(default)]
    pub position_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_impersonating: bool,
}

impl UserContext {
    pub fn for_position(position_id: PositionId) -> Self {
        Self {
            position_id,
            position_name: position_id.label().to_string(),
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Resolves the current user at the start of every request.
pub trait UserContextProvider: Send + Sync {
    fn current_user(&self) -> UserContext;
}

impl UserContextProvider for UserContext {
    fn current_user(&self) -> UserContext {
        self.clone()
    }
}
