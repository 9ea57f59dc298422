use std::sync::Arc;

use prospectra_core::{AppError, AppResult, Principal};
use prospectra_domain::{
    CompanyList, ListAction, ListId, ListVisibility, ScoreCriteria, can_access_list, keys,
};

use crate::list_ports::{CompanyListRepository, ListPage, ListScopeFilter};

/// Inputs for creating a company list.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateListInput {
    /// List name; must be non-blank.
    pub name: String,
    /// Who may see the list.
    pub visibility: ListVisibility,
    /// Whether the list is shared with the owner's team.
    pub is_shared: bool,
    /// Criteria that make the list a smart list.
    pub smart_criteria: Option<ScoreCriteria>,
}

/// Whose lists a listing query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Lists the caller owns.
    Mine,
    /// Lists shared with the caller by other owners in the organization.
    Shared,
    /// Organization-visible and public lists in the organization.
    Org,
}

impl ListScope {
    /// Parses a transport value into a scope.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "mine" => Ok(Self::Mine),
            "shared" => Ok(Self::Shared),
            "org" => Ok(Self::Org),
            _ => Err(AppError::Validation(format!("unknown list scope '{value}'"))),
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mine => "mine",
            Self::Shared => "shared",
            Self::Org => "org",
        }
    }
}

/// Paged listing query for company lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListScopeQuery {
    /// Whose lists to return.
    pub scope: ListScope,
    /// 1-based page number.
    pub page: usize,
    /// Maximum rows returned.
    pub limit: usize,
    /// Optional free-text filter on the list name.
    pub search: Option<String>,
}

/// Application service for company-list lifecycle operations.
#[derive(Clone)]
pub struct CompanyListService {
    repository: Arc<dyn CompanyListRepository>,
}

impl CompanyListService {
    /// Creates a new list service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn CompanyListRepository>) -> Self {
        Self { repository }
    }

    /// Creates a company list owned by the caller.
    pub async fn create_list(
        &self,
        actor: &Principal,
        input: CreateListInput,
    ) -> AppResult<CompanyList> {
        if !actor.has_permission(keys::CREATE) {
            return Err(AppError::Forbidden(format!(
                "subject '{}' may not create company lists",
                actor.subject()
            )));
        }

        let list = CompanyList::new(
            actor.organization_id(),
            &input.name,
            actor.subject(),
            input.visibility,
            input.is_shared,
            input.smart_criteria,
        )?;
        self.repository.insert_list(list.clone()).await?;
        Ok(list)
    }

    /// Fetches a list the caller may read.
    ///
    /// Denied reads and missing lists produce the same error so callers
    /// cannot probe for lists they may not see.
    pub async fn get_list(&self, actor: &Principal, list_id: ListId) -> AppResult<CompanyList> {
        let list = self
            .repository
            .find_list(actor.organization_id(), list_id)
            .await?
            .ok_or_else(|| list_not_found(actor, list_id))?;

        if !can_access_list(actor, &list, ListAction::Read) {
            return Err(list_not_found(actor, list_id));
        }

        Ok(list)
    }

    /// Deletes a list and all of its membership rows.
    pub async fn delete_list(&self, actor: &Principal, list_id: ListId) -> AppResult<()> {
        let list = self
            .repository
            .find_list(actor.organization_id(), list_id)
            .await?
            .ok_or_else(|| list_not_found(actor, list_id))?;

        if !can_access_list(actor, &list, ListAction::Delete) {
            return Err(AppError::Forbidden(format!(
                "subject '{}' may not delete company list '{list_id}'",
                actor.subject()
            )));
        }

        self.repository
            .delete_list(actor.organization_id(), list_id)
            .await
    }

    /// Lists company lists visible to the caller in the requested scope.
    pub async fn list_lists(
        &self,
        actor: &Principal,
        query: ListScopeQuery,
    ) -> AppResult<Vec<CompanyList>> {
        if query.page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_owned()));
        }
        if !(1..=200).contains(&query.limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and 200, got {}",
                query.limit
            )));
        }

        let filter = match query.scope {
            ListScope::Mine => ListScopeFilter::Mine {
                owner_subject: actor.subject().to_owned(),
            },
            ListScope::Shared => ListScopeFilter::SharedWith {
                subject: actor.subject().to_owned(),
            },
            ListScope::Org => ListScopeFilter::Organization,
        };

        self.repository
            .list_lists(
                actor.organization_id(),
                &filter,
                ListPage {
                    page: query.page,
                    limit: query.limit,
                    search: query.search,
                },
            )
            .await
    }
}

fn list_not_found(actor: &Principal, list_id: ListId) -> AppError {
    AppError::NotFound(format!(
        "company list '{list_id}' does not exist for organization '{}'",
        actor.organization_id()
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use prospectra_core::{AppError, AppResult, OrganizationId, Principal, Role};
    use prospectra_domain::{
        CompanyId, CompanyList, CompanyListItem, CompanySummary, ListId, ListVisibility,
    };
    use tokio::sync::Mutex;

    use crate::list_ports::{
        CompanyListRepository, ItemPageQuery, ListItemRecord, ListPage, ListScopeFilter,
        MemberInsertOutcome,
    };

    use super::{CompanyListService, CreateListInput, ListScope, ListScopeQuery};

    #[derive(Default)]
    struct FakeRepository {
        lists: Mutex<Vec<CompanyList>>,
        last_filter: Mutex<Option<ListScopeFilter>>,
    }

    #[async_trait]
    impl CompanyListRepository for FakeRepository {
        async fn insert_list(&self, list: CompanyList) -> AppResult<()> {
            self.lists.lock().await.push(list);
            Ok(())
        }

        async fn find_list(
            &self,
            organization_id: OrganizationId,
            list_id: ListId,
        ) -> AppResult<Option<CompanyList>> {
            Ok(self
                .lists
                .lock()
                .await
                .iter()
                .find(|list| list.id() == list_id && list.organization_id() == organization_id)
                .cloned())
        }

        async fn delete_list(
            &self,
            _organization_id: OrganizationId,
            list_id: ListId,
        ) -> AppResult<()> {
            self.lists.lock().await.retain(|list| list.id() != list_id);
            Ok(())
        }

        async fn list_lists(
            &self,
            organization_id: OrganizationId,
            filter: &ListScopeFilter,
            _page: ListPage,
        ) -> AppResult<Vec<CompanyList>> {
            *self.last_filter.lock().await = Some(filter.clone());
            Ok(self
                .lists
                .lock()
                .await
                .iter()
                .filter(|list| list.organization_id() == organization_id)
                .cloned()
                .collect())
        }

        async fn existing_company_ids(
            &self,
            _organization_id: OrganizationId,
            _company_ids: &[CompanyId],
        ) -> AppResult<BTreeSet<CompanyId>> {
            Ok(BTreeSet::new())
        }

        async fn member_company_ids(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
            _company_ids: &[CompanyId],
        ) -> AppResult<BTreeSet<CompanyId>> {
            Ok(BTreeSet::new())
        }

        async fn max_member_position(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
        ) -> AppResult<i64> {
            Ok(0)
        }

        async fn insert_members(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
            _items: Vec<CompanyListItem>,
        ) -> AppResult<MemberInsertOutcome> {
            Ok(MemberInsertOutcome::default())
        }

        async fn delete_members(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
            _company_ids: &[CompanyId],
        ) -> AppResult<Vec<CompanyId>> {
            Ok(Vec::new())
        }

        async fn list_items(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
            _query: ItemPageQuery,
        ) -> AppResult<Vec<ListItemRecord>> {
            Ok(Vec::new())
        }

        async fn member_companies(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
        ) -> AppResult<Vec<CompanySummary>> {
            Ok(Vec::new())
        }
    }

    fn creator(organization_id: OrganizationId) -> Principal {
        Principal::new(
            "alice",
            organization_id,
            vec![Role::new("editor", &["company-lists:create"])],
        )
    }

    fn create_input(name: &str) -> CreateListInput {
        CreateListInput {
            name: name.to_owned(),
            visibility: ListVisibility::Private,
            is_shared: false,
            smart_criteria: None,
        }
    }

    #[tokio::test]
    async fn create_persists_a_caller_owned_list() {
        let repository = Arc::new(FakeRepository::default());
        let service = CompanyListService::new(repository.clone());
        let actor = creator(OrganizationId::new());

        let list = service
            .create_list(&actor, create_input("Northern prospects"))
            .await;
        assert!(list.is_ok());
        let list = list.unwrap_or_else(|_| unreachable!());

        assert_eq!(list.owner_subject(), "alice");
        assert_eq!(list.organization_id(), actor.organization_id());
        assert_eq!(list.total_companies(), 0);
        assert!(!list.is_smart_list());
        assert_eq!(repository.lists.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn create_requires_the_create_permission() {
        let repository = Arc::new(FakeRepository::default());
        let service = CompanyListService::new(repository.clone());
        let actor = Principal::new("bob", OrganizationId::new(), Vec::new());

        let outcome = service.create_list(&actor, create_input("Denied")).await;
        assert!(matches!(outcome, Err(AppError::Forbidden(_))));
        assert!(repository.lists.lock().await.is_empty());
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_storage() {
        let repository = Arc::new(FakeRepository::default());
        let service = CompanyListService::new(repository.clone());
        let actor = creator(OrganizationId::new());

        let outcome = service.create_list(&actor, create_input("   ")).await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
        assert!(repository.lists.lock().await.is_empty());
    }

    #[tokio::test]
    async fn owner_round_trips_their_own_list() {
        let repository = Arc::new(FakeRepository::default());
        let service = CompanyListService::new(repository);
        let actor = creator(OrganizationId::new());

        let created = service
            .create_list(&actor, create_input("Round trip"))
            .await;
        assert!(created.is_ok());
        let created = created.unwrap_or_else(|_| unreachable!());

        let fetched = service.get_list(&actor, created.id()).await;
        assert_eq!(fetched.ok().map(|list| list.id()), Some(created.id()));
    }

    #[tokio::test]
    async fn private_list_is_masked_from_other_subjects() {
        let repository = Arc::new(FakeRepository::default());
        let service = CompanyListService::new(repository);
        let organization_id = OrganizationId::new();
        let owner = creator(organization_id);

        let created = service
            .create_list(&owner, create_input("Owner only"))
            .await;
        assert!(created.is_ok());
        let created = created.unwrap_or_else(|_| unreachable!());

        let stranger = Principal::new("mallory", organization_id, Vec::new());
        let outcome = service.get_list(&stranger, created.id()).await;
        assert!(matches!(outcome, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn cross_organization_lookup_is_not_found() {
        let repository = Arc::new(FakeRepository::default());
        let service = CompanyListService::new(repository);
        let owner = creator(OrganizationId::new());

        let created = service
            .create_list(&owner, create_input("Org A list"))
            .await;
        assert!(created.is_ok());
        let created = created.unwrap_or_else(|_| unreachable!());

        let other_org_admin = Principal::new(
            "root",
            OrganizationId::new(),
            vec![Role::new("admin", &["*"])],
        );
        let outcome = service.get_list(&other_org_admin, created.id()).await;
        assert!(matches!(outcome, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_requires_ownership_or_delete_any() {
        let repository = Arc::new(FakeRepository::default());
        let service = CompanyListService::new(repository.clone());
        let organization_id = OrganizationId::new();
        let owner = creator(organization_id);

        let created = service
            .create_list(&owner, create_input("Short lived"))
            .await;
        assert!(created.is_ok());
        let created = created.unwrap_or_else(|_| unreachable!());

        let reader = Principal::new(
            "carol",
            organization_id,
            vec![Role::new("viewer", &["company-lists:read-org"])],
        );
        let denied = service.delete_list(&reader, created.id()).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));
        assert_eq!(repository.lists.lock().await.len(), 1);

        let deleted = service.delete_list(&owner, created.id()).await;
        assert!(deleted.is_ok());
        assert!(repository.lists.lock().await.is_empty());
    }

    #[tokio::test]
    async fn list_lists_translates_scope_into_a_filter() {
        let repository = Arc::new(FakeRepository::default());
        let service = CompanyListService::new(repository.clone());
        let actor = creator(OrganizationId::new());

        let outcome = service
            .list_lists(
                &actor,
                ListScopeQuery {
                    scope: ListScope::Mine,
                    page: 1,
                    limit: 20,
                    search: None,
                },
            )
            .await;
        assert!(outcome.is_ok());

        let filter = repository.last_filter.lock().await.clone();
        assert_eq!(
            filter,
            Some(ListScopeFilter::Mine {
                owner_subject: "alice".to_owned(),
            })
        );
    }

    #[tokio::test]
    async fn zero_page_or_limit_is_rejected() {
        let repository = Arc::new(FakeRepository::default());
        let service = CompanyListService::new(repository);
        let actor = creator(OrganizationId::new());

        for (page, limit) in [(0, 20), (1, 0), (1, 201)] {
            let outcome = service
                .list_lists(
                    &actor,
                    ListScopeQuery {
                        scope: ListScope::Org,
                        page,
                        limit,
                        search: None,
                    },
                )
                .await;
            assert!(matches!(outcome, Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn scope_transport_values_round_trip() {
        for scope in [ListScope::Mine, ListScope::Shared, ListScope::Org] {
            assert_eq!(ListScope::parse_transport(scope.as_str()).ok(), Some(scope));
        }
        assert!(ListScope::parse_transport("everything").is_err());
    }
}
