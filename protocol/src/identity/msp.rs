//! Organization and caller identities as asserted by the membership service.

use serde::{Deserialize, Serialize};

use crate::config::private_collection_name;

/// An organization's MSP identifier, e.g. `Org1MSP`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the private collection scoped to this organization.
    pub fn collection_name(&self) -> String {
        private_collection_name(&self.0)
    }
}

impl std::fmt::Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrgId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The authenticated submitter of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Organization that vouches for the caller.
    pub org: OrgId,
    /// User within that organization.
    pub user: String,
}

impl CallerIdentity {
    pub fn new(org: impl Into<OrgId>, user: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            user: user.into(),
        }
    }

    /// Stable client identifier, `user@org`. Used as the owner label on
    /// public records and as the creator field in history.
    pub fn client_id(&self) -> String {
        format!("{}@{}", self.user, self.org)
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.user, self.org)
    }
}
