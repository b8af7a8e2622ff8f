use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use coursedesk_core::GroupId;

/// Display name of a permission group (e.g. "admin", "salesperson").
///
/// Names are opaque at this layer; identity is carried by [`GroupId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(Cow<'static, str>);

impl GroupName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for GroupName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named authorization class. Every user carries at most one.
///
/// An inactive group grants nothing, the same as an unknown group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub id: GroupId,
    pub name: GroupName,
    pub active: bool,
}

impl PermissionGroup {
    pub fn new(id: GroupId, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            name: GroupName::new(name),
            active: true,
        }
    }
}
