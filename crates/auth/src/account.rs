//! User accounts as seen by the access-control engine.
//!
//! An account carries two historical representations of "active": an explicit
//! status field and a legacy boolean. They collapse into one derived boolean
//! here, in [`account_is_active`], and nowhere else.

use serde::{Deserialize, Serialize};

use coursedesk_core::{GroupId, UserId};

/// Explicit account status field.
///
/// Stored as free text by older rows, so anything that is not recognised is
/// kept verbatim in `Other` and never counts as active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountStatus {
    Active,
    Inactive,
    Other(String),
}

impl AccountStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for AccountStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => AccountStatus::Active,
            "inactive" => AccountStatus::Inactive,
            _ => AccountStatus::Other(value.to_string()),
        }
    }
}

impl From<String> for AccountStatus {
    fn from(value: String) -> Self {
        AccountStatus::from(value.as_str())
    }
}

impl From<AccountStatus> for String {
    fn from(value: AccountStatus) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Union rule: either signal being "active" is enough.
pub fn account_is_active(status: &AccountStatus, legacy_active: bool) -> bool {
    matches!(status, AccountStatus::Active) || legacy_active
}

/// Acting user, as loaded fresh from the user store on every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub display_name: String,
    /// `None` only before the account has been assigned a group.
    pub permission_group_id: Option<GroupId>,
    pub status: AccountStatus,
    pub legacy_active: bool,
}

impl UserAccount {
    pub fn new(id: UserId, display_name: impl Into<String>, group: Option<GroupId>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            permission_group_id: group,
            status: AccountStatus::Active,
            legacy_active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        account_is_active(&self.status, self.legacy_active)
    }

    /// Both signals off, which is what deactivation writes.
    pub fn deactivated(mut self) -> Self {
        self.status = AccountStatus::Inactive;
        self.legacy_active = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn either_signal_is_enough() {
        assert!(account_is_active(&AccountStatus::Active, false));
        assert!(account_is_active(&AccountStatus::Inactive, true));
        assert!(account_is_active(&AccountStatus::Active, true));
        assert!(!account_is_active(&AccountStatus::Inactive, false));
    }

    #[test]
    fn unrecognised_status_is_not_active() {
        let status = AccountStatus::from("pending");
        assert_eq!(status, AccountStatus::Other("pending".to_string()));
        assert!(!account_is_active(&status, false));
    }

    #[test]
    fn status_parsing_ignores_case_and_padding() {
        assert_eq!(AccountStatus::from(" Active "), AccountStatus::Active);
        assert_eq!(AccountStatus::from("INACTIVE"), AccountStatus::Inactive);
    }

    #[test]
    fn status_serializes_as_plain_string() {
        let json = serde_json::to_string(&AccountStatus::Inactive).unwrap();
        assert_eq!(json, "\"inactive\"");
        let back: AccountStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(back, AccountStatus::Active);
    }

    #[test]
    fn deactivated_clears_both_signals() {
        let user = UserAccount::new(UserId::new(), "Ana", None).deactivated();
        assert!(!user.is_active());
        assert!(!user.legacy_active);
    }
}
