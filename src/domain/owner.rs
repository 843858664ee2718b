use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type GroupId = Uuid;

/// The owner of an account, budget, or goal: exactly one user XOR one group.
/// Modeling this as a sum type makes "exactly one branch populated" a
/// construction-time invariant instead of a runtime check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "id")]
pub enum OwnerRef {
    User(UserId),
    Group(GroupId),
}

impl OwnerRef {
    pub fn kind(&self) -> &'static str {
        match self {
            OwnerRef::User(_) => "user",
            OwnerRef::Group(_) => "group",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            OwnerRef::User(id) => *id,
            OwnerRef::Group(id) => *id,
        }
    }

    /// Reassemble an owner reference from its persisted (kind, id) pair.
    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "user" => Some(OwnerRef::User(id)),
            "group" => Some(OwnerRef::Group(id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        }
    }
}

/// Membership of a user in a group, with the join timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn new(group_id: GroupId, user_id: UserId) -> Self {
        Self {
            group_id,
            user_id,
            joined_at: Utc::now(),
        }
    }
}
