/// Permission sets
///
/// One record per role name, holding the ordered permission strings that
/// role grants. Read-only from this service's perspective; administration
/// happens elsewhere.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionSet {
    /// Role name this set belongs to
    pub name: String,
    pub permissions: Vec<String>,
}

impl PermissionSet {
    pub fn new(name: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            permissions,
        }
    }

    /// Check whether this set satisfies a required permission.
    ///
    /// The empty string means "any authenticated caller" and is satisfied by
    /// every set, including an empty one.
    pub fn has_permission(&self, required: &str) -> bool {
        if required.is_empty() {
            return true;
        }
        self.permissions.iter().any(|p| p == required)
    }
}
