use prospectra_core::Principal;

use crate::company_list::{CompanyList, ListVisibility};

/// Permission keys understood by the company-list access guard.
pub mod keys {
    /// Full wildcard key.
    pub const FULL_WILDCARD: &str = "*";
    /// Namespace wildcard covering every company-list action.
    pub const LIST_NAMESPACE: &str = "company-lists:*";
    /// Allows creating lists owned by the caller.
    pub const CREATE: &str = "company-lists:create";
    /// Allows reading public lists from any organization.
    pub const READ_PUBLIC: &str = "company-lists:read-public";
    /// Allows reading organization-visible lists within the caller's organization.
    pub const READ_ORG: &str = "company-lists:read-org";
    /// Allows updating any list regardless of ownership.
    pub const UPDATE_ANY: &str = "company-lists:update-any";
    /// Allows deleting any list regardless of ownership.
    pub const DELETE_ANY: &str = "company-lists:delete-any";
}

/// An action a caller can request against a company list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListAction {
    /// Read the list and its contents.
    Read,
    /// Mutate the list or its membership.
    Update,
    /// Delete the list.
    Delete,
}

impl ListAction {
    /// Returns a stable name for log and error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Decides whether a principal may perform an action on a list.
///
/// Evaluation order: list ownership grants everything; the full or
/// namespace wildcard grants everything; reads fall back to
/// visibility-scoped grants; updates and deletes fall back to the
/// corresponding `-any` grant. Every authorization decision for company
/// lists routes through this single function.
///
/// A `false` result is translated by callers into `Forbidden` for
/// mutations and `NotFound` for reads, so unauthorized callers cannot
/// probe for list existence.
#[must_use]
pub fn can_access_list(principal: &Principal, list: &CompanyList, action: ListAction) -> bool {
    if list.owner_subject() == principal.subject() {
        return true;
    }

    if principal.has_permission(keys::FULL_WILDCARD)
        || principal.has_permission(keys::LIST_NAMESPACE)
    {
        return true;
    }

    match action {
        ListAction::Read => {
            if list.visibility() == ListVisibility::Public
                && principal.has_permission(keys::READ_PUBLIC)
            {
                return true;
            }

            list.visibility() == ListVisibility::Organization
                && principal.has_permission(keys::READ_ORG)
                && principal.organization_id() == list.organization_id()
        }
        ListAction::Update => principal.has_permission(keys::UPDATE_ANY),
        ListAction::Delete => principal.has_permission(keys::DELETE_ANY),
    }
}

#[cfg(test)]
mod tests {
    use prospectra_core::{OrganizationId, Principal, Role};

    use super::{ListAction, can_access_list, keys};
    use crate::company_list::{CompanyList, ListVisibility};

    fn list_in(
        organization_id: OrganizationId,
        owner: &str,
        visibility: ListVisibility,
    ) -> CompanyList {
        CompanyList::new(
            organization_id,
            "Northern suppliers",
            owner,
            visibility,
            false,
            None,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    fn principal_with_keys(
        subject: &str,
        organization_id: OrganizationId,
        permission_keys: &[&str],
    ) -> Principal {
        Principal::new(
            subject,
            organization_id,
            vec![Role::new("granted", permission_keys)],
        )
    }

    #[test]
    fn owner_is_allowed_every_action_without_permissions() {
        let organization_id = OrganizationId::new();
        let list = list_in(organization_id, "alice", ListVisibility::Private);
        let owner = Principal::new("alice", organization_id, Vec::new());

        for action in [ListAction::Read, ListAction::Update, ListAction::Delete] {
            assert!(can_access_list(&owner, &list, action));
        }
    }

    #[test]
    fn namespace_wildcard_grants_every_action_on_foreign_list() {
        let organization_id = OrganizationId::new();
        let list = list_in(organization_id, "alice", ListVisibility::Private);
        let admin = principal_with_keys("bob", organization_id, &[keys::LIST_NAMESPACE]);

        for action in [ListAction::Read, ListAction::Update, ListAction::Delete] {
            assert!(can_access_list(&admin, &list, action));
        }
    }

    #[test]
    fn public_read_requires_read_public_grant() {
        let list = list_in(OrganizationId::new(), "alice", ListVisibility::Public);

        let reader = principal_with_keys("bob", OrganizationId::new(), &[keys::READ_PUBLIC]);
        assert!(can_access_list(&reader, &list, ListAction::Read));
        assert!(!can_access_list(&reader, &list, ListAction::Update));

        let stranger = Principal::new("carol", OrganizationId::new(), Vec::new());
        assert!(!can_access_list(&stranger, &list, ListAction::Read));
    }

    #[test]
    fn organization_read_is_bound_to_the_same_organization() {
        let organization_id = OrganizationId::new();
        let list = list_in(organization_id, "alice", ListVisibility::Organization);

        let colleague = principal_with_keys("bob", organization_id, &[keys::READ_ORG]);
        assert!(can_access_list(&colleague, &list, ListAction::Read));

        let outsider = principal_with_keys("bob", OrganizationId::new(), &[keys::READ_ORG]);
        assert!(!can_access_list(&outsider, &list, ListAction::Read));
    }

    #[test]
    fn private_list_is_hidden_from_visibility_grants() {
        let organization_id = OrganizationId::new();
        let list = list_in(organization_id, "alice", ListVisibility::Private);
        let colleague = principal_with_keys(
            "bob",
            organization_id,
            &[keys::READ_ORG, keys::READ_PUBLIC],
        );

        assert!(!can_access_list(&colleague, &list, ListAction::Read));
    }

    #[test]
    fn update_and_delete_require_the_matching_any_grant() {
        let organization_id = OrganizationId::new();
        let list = list_in(organization_id, "alice", ListVisibility::Organization);

        let updater = principal_with_keys("bob", organization_id, &[keys::UPDATE_ANY]);
        assert!(can_access_list(&updater, &list, ListAction::Update));
        assert!(!can_access_list(&updater, &list, ListAction::Delete));

        let deleter = principal_with_keys("bob", organization_id, &[keys::DELETE_ANY]);
        assert!(can_access_list(&deleter, &list, ListAction::Delete));
        assert!(!can_access_list(&deleter, &list, ListAction::Update));
    }
}
