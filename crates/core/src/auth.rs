use serde::{Deserialize, Serialize};

use crate::OrganizationId;

/// One permission pattern held by a role.
///
/// Stored permission keys come in three shapes: the full wildcard `"*"`,
/// a namespace wildcard such as `"company-lists:*"`, and an exact key such
/// as `"company-lists:read-own"`. The shape is resolved once at parse time
/// so evaluation stays a plain tagged match instead of string scanning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionGrant {
    /// Matches every permission key.
    Full,
    /// Matches every key starting with the stored prefix (trailing `*` stripped).
    Namespace(String),
    /// Matches one key exactly.
    Exact(String),
}

impl PermissionGrant {
    /// Parses the stored string form of a permission key.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        if key == "*" {
            return Self::Full;
        }

        if let Some(prefix) = key.strip_suffix('*') {
            if prefix.ends_with(':') {
                return Self::Namespace(prefix.to_owned());
            }
        }

        Self::Exact(key.to_owned())
    }

    /// Returns whether this grant satisfies the required key.
    #[must_use]
    pub fn allows(&self, key: &str) -> bool {
        match self {
            Self::Full => true,
            Self::Namespace(prefix) => key.starts_with(prefix.as_str()),
            Self::Exact(exact) => key == exact,
        }
    }

    /// Returns the stored string form of the grant.
    #[must_use]
    pub fn as_key(&self) -> String {
        match self {
            Self::Full => "*".to_owned(),
            Self::Namespace(prefix) => format!("{prefix}*"),
            Self::Exact(exact) => exact.clone(),
        }
    }
}

/// A named role holding zero or more permission grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    name: String,
    grants: Vec<PermissionGrant>,
}

impl Role {
    /// Creates a role from its name and stored permission keys.
    #[must_use]
    pub fn new(name: impl Into<String>, keys: &[&str]) -> Self {
        Self {
            name: name.into(),
            grants: keys.iter().map(|key| PermissionGrant::parse(key)).collect(),
        }
    }

    /// Creates a role from already-parsed grants.
    #[must_use]
    pub fn from_grants(name: impl Into<String>, grants: Vec<PermissionGrant>) -> Self {
        Self {
            name: name.into(),
            grants,
        }
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the permission grants held by this role.
    #[must_use]
    pub fn grants(&self) -> &[PermissionGrant] {
        &self.grants
    }
}

/// Resolved caller identity persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    subject: String,
    organization_id: OrganizationId,
    roles: Vec<Role>,
}

impl Principal {
    /// Creates a principal from identity and tenancy data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        organization_id: OrganizationId,
        roles: Vec<Role>,
    ) -> Self {
        Self {
            subject: subject.into(),
            organization_id,
            roles,
        }
    }

    /// Returns the stable subject identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the organization the principal belongs to.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the roles held by the principal.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Returns whether any role grant satisfies the required permission key.
    ///
    /// Every grant of every role is scanned; the result does not depend on
    /// role or grant order. A principal with no roles holds no permissions.
    #[must_use]
    pub fn has_permission(&self, key: &str) -> bool {
        self.roles
            .iter()
            .flat_map(|role| role.grants().iter())
            .any(|grant| grant.allows(key))
    }
}

#[cfg(test)]
mod tests {
    use crate::OrganizationId;

    use super::{PermissionGrant, Principal, Role};

    fn principal_with_keys(keys: &[&str]) -> Principal {
        Principal::new(
            "alice",
            OrganizationId::new(),
            vec![Role::new("analyst", keys)],
        )
    }

    #[test]
    fn full_wildcard_allows_every_key() {
        let principal = principal_with_keys(&["*"]);
        assert!(principal.has_permission("company-lists:read-own"));
        assert!(principal.has_permission("anything:at-all"));
    }

    #[test]
    fn namespace_wildcard_allows_namespace_keys_only() {
        let principal = principal_with_keys(&["company-lists:*"]);
        assert!(principal.has_permission("company-lists:read-own"));
        assert!(principal.has_permission("company-lists:update-any"));
        assert!(!principal.has_permission("companies:read"));
    }

    #[test]
    fn exact_key_matches_itself_only() {
        let principal = principal_with_keys(&["company-lists:read-own"]);
        assert!(principal.has_permission("company-lists:read-own"));
        assert!(!principal.has_permission("company-lists:read-org"));
    }

    #[test]
    fn no_roles_denies_every_key() {
        let principal = Principal::new("alice", OrganizationId::new(), Vec::new());
        assert!(!principal.has_permission("*"));
        assert!(!principal.has_permission("company-lists:read-own"));
    }

    #[test]
    fn match_spans_all_roles() {
        let principal = Principal::new(
            "alice",
            OrganizationId::new(),
            vec![
                Role::new("viewer", &["companies:read"]),
                Role::new("list-admin", &["company-lists:*"]),
            ],
        );
        assert!(principal.has_permission("company-lists:delete-any"));
    }

    #[test]
    fn bare_asterisk_suffix_is_not_a_namespace() {
        // "company-lists*" lacks the ':' separator and is kept as an exact key.
        let grant = PermissionGrant::parse("company-lists*");
        assert_eq!(grant, PermissionGrant::Exact("company-lists*".to_owned()));
        assert!(!grant.allows("company-lists:read-own"));
    }

    #[test]
    fn grant_round_trips_through_key_form() {
        for key in ["*", "company-lists:*", "company-lists:read-own"] {
            let grant = PermissionGrant::parse(key);
            assert_eq!(grant.as_key(), key);
        }
    }
}
