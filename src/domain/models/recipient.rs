use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    Member,
    Group,
}

impl RecipientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientKind::Member => "member",
            RecipientKind::Group => "group",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "member" => Some(RecipientKind::Member),
            "group" => Some(RecipientKind::Group),
            _ => None,
        }
    }
}

/// A stored pointer to one member or one group, attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientSpec {
    pub id: Uuid,
    pub message_id: Uuid,
    pub kind: RecipientKind,
    pub target_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewRecipientSpec {
    pub kind: RecipientKind,
    pub target_id: Uuid,
}
