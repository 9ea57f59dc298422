use std::collections::BTreeSet;
use std::sync::Arc;

use prospectra_core::{AppError, AppResult, Principal};
use prospectra_domain::{
    CompanyId, CompanyList, CompanyListItem, ListAction, ListId, SkipReason, can_access_list,
};

use crate::list_ports::CompanyListRepository;

/// Inputs for a bulk add operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCompaniesInput {
    /// Companies to add; must not be empty.
    pub company_ids: Vec<CompanyId>,
    /// Optional note stored on every created membership row.
    pub note: Option<String>,
}

/// One company id that a bulk add did not apply, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCompany {
    /// The requested company id.
    pub company_id: CompanyId,
    /// Why the id was skipped.
    pub reason: SkipReason,
}

/// Result of a bulk add: every distinct input id appears exactly once,
/// either in `added` or in `skipped`, preserving input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCompaniesOutcome {
    /// The target list.
    pub list_id: ListId,
    /// Ids for which a membership row was created.
    pub added: Vec<CompanyId>,
    /// Ids that were not applied, with reasons.
    pub skipped: Vec<SkippedCompany>,
}

/// Result of a bulk remove: every distinct input id appears exactly once,
/// either in `removed` or in `missing`, preserving input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveCompaniesOutcome {
    /// The target list.
    pub list_id: ListId,
    /// Ids whose membership row was deleted.
    pub removed: Vec<CompanyId>,
    /// Ids that had no live membership row.
    pub missing: Vec<CompanyId>,
}

/// Application service for bulk list-membership mutations.
#[derive(Clone)]
pub struct ListMembershipService {
    repository: Arc<dyn CompanyListRepository>,
}

impl ListMembershipService {
    /// Creates a new membership service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn CompanyListRepository>) -> Self {
        Self { repository }
    }

    /// Adds companies to a list, classifying every input id exactly once.
    ///
    /// Validation, the list lookup, and the access check all happen before
    /// any mutation; a denied or invalid request leaves storage untouched.
    pub async fn add_companies(
        &self,
        actor: &Principal,
        list_id: ListId,
        input: AddCompaniesInput,
    ) -> AppResult<AddCompaniesOutcome> {
        let ordered = require_distinct_ids(input.company_ids)?;
        let list = self.require_list(actor, list_id).await?;
        require_update_access(actor, &list)?;

        let organization_id = actor.organization_id();
        let existing = self
            .repository
            .existing_company_ids(organization_id, &ordered)
            .await?;
        let members = self
            .repository
            .member_company_ids(organization_id, list_id, &ordered)
            .await?;

        let candidates: Vec<CompanyId> = ordered
            .iter()
            .filter(|id| existing.contains(*id) && !members.contains(*id))
            .cloned()
            .collect();

        let inserted: BTreeSet<CompanyId> = if candidates.is_empty() {
            BTreeSet::new()
        } else {
            let base_position = self
                .repository
                .max_member_position(organization_id, list_id)
                .await?;
            let items: Vec<CompanyListItem> = candidates
                .iter()
                .enumerate()
                .map(|(offset, company_id)| {
                    CompanyListItem::added_now(
                        list_id,
                        company_id.clone(),
                        input.note.clone(),
                        base_position + 1 + offset as i64,
                        actor.subject(),
                    )
                })
                .collect();

            // Ids that lost a concurrent duplicate race come back as
            // conflicted and fall through to the duplicate branch below.
            let outcome = self
                .repository
                .insert_members(organization_id, list_id, items)
                .await?;
            outcome.inserted.into_iter().collect()
        };

        let mut added = Vec::new();
        let mut skipped = Vec::new();
        for company_id in ordered {
            if inserted.contains(&company_id) {
                added.push(company_id);
            } else if !existing.contains(&company_id) {
                skipped.push(SkippedCompany {
                    company_id,
                    reason: SkipReason::NotFound,
                });
            } else {
                skipped.push(SkippedCompany {
                    company_id,
                    reason: SkipReason::Duplicate,
                });
            }
        }

        Ok(AddCompaniesOutcome {
            list_id,
            added,
            skipped,
        })
    }

    /// Removes companies from a list, classifying every input id exactly once.
    pub async fn remove_companies(
        &self,
        actor: &Principal,
        list_id: ListId,
        company_ids: Vec<CompanyId>,
    ) -> AppResult<RemoveCompaniesOutcome> {
        let ordered = require_distinct_ids(company_ids)?;
        let list = self.require_list(actor, list_id).await?;
        require_update_access(actor, &list)?;

        let removed_set: BTreeSet<CompanyId> = self
            .repository
            .delete_members(actor.organization_id(), list_id, &ordered)
            .await?
            .into_iter()
            .collect();

        let mut removed = Vec::new();
        let mut missing = Vec::new();
        for company_id in ordered {
            if removed_set.contains(&company_id) {
                removed.push(company_id);
            } else {
                missing.push(company_id);
            }
        }

        Ok(RemoveCompaniesOutcome {
            list_id,
            removed,
            missing,
        })
    }

    async fn require_list(&self, actor: &Principal, list_id: ListId) -> AppResult<CompanyList> {
        self.repository
            .find_list(actor.organization_id(), list_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "company list '{list_id}' does not exist for organization '{}'",
                    actor.organization_id()
                ))
            })
    }
}

fn require_distinct_ids(company_ids: Vec<CompanyId>) -> AppResult<Vec<CompanyId>> {
    if company_ids.is_empty() {
        return Err(AppError::Validation(
            "company_ids must not be empty".to_owned(),
        ));
    }

    let mut seen = BTreeSet::new();
    Ok(company_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect())
}

fn require_update_access(actor: &Principal, list: &CompanyList) -> AppResult<()> {
    if can_access_list(actor, list, ListAction::Update) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "subject '{}' may not update company list '{}'",
        actor.subject(),
        list.id()
    )))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};
    use std::sync::Arc;

    use async_trait::async_trait;
    use prospectra_core::{AppResult, OrganizationId, Principal, Role};
    use prospectra_domain::{
        CompanyId, CompanyList, CompanyListItem, CompanySummary, ListId, ListVisibility,
        SkipReason,
    };
    use tokio::sync::Mutex;

    use crate::list_ports::{
        CompanyListRepository, ItemPageQuery, ListItemRecord, ListPage, ListScopeFilter,
        MemberInsertOutcome,
    };

    use super::{AddCompaniesInput, ListMembershipService};

    struct FakeListRepository {
        list: CompanyList,
        registry: HashSet<CompanyId>,
        members: Mutex<Vec<CompanyListItem>>,
        counter: Mutex<i64>,
        mutation_calls: Mutex<usize>,
        race_conflicts: BTreeSet<CompanyId>,
    }

    impl FakeListRepository {
        fn new(list: CompanyList, registry: &[&str]) -> Self {
            Self {
                list,
                registry: registry
                    .iter()
                    .map(|id| CompanyId::new(*id).unwrap_or_else(|_| unreachable!()))
                    .collect(),
                members: Mutex::new(Vec::new()),
                counter: Mutex::new(0),
                mutation_calls: Mutex::new(0),
                race_conflicts: BTreeSet::new(),
            }
        }

        fn with_race_conflicts(mut self, conflicts: &[&str]) -> Self {
            self.race_conflicts = conflicts
                .iter()
                .map(|id| CompanyId::new(*id).unwrap_or_else(|_| unreachable!()))
                .collect();
            self
        }
    }

    #[async_trait]
    impl CompanyListRepository for FakeListRepository {
        async fn insert_list(&self, _list: CompanyList) -> AppResult<()> {
            Ok(())
        }

        async fn find_list(
            &self,
            _organization_id: OrganizationId,
            list_id: ListId,
        ) -> AppResult<Option<CompanyList>> {
            Ok((self.list.id() == list_id).then(|| self.list.clone()))
        }

        async fn delete_list(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn list_lists(
            &self,
            _organization_id: OrganizationId,
            _filter: &ListScopeFilter,
            _page: ListPage,
        ) -> AppResult<Vec<CompanyList>> {
            Ok(Vec::new())
        }

        async fn existing_company_ids(
            &self,
            _organization_id: OrganizationId,
            company_ids: &[CompanyId],
        ) -> AppResult<BTreeSet<CompanyId>> {
            Ok(company_ids
                .iter()
                .filter(|id| self.registry.contains(*id))
                .cloned()
                .collect())
        }

        async fn member_company_ids(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
            company_ids: &[CompanyId],
        ) -> AppResult<BTreeSet<CompanyId>> {
            let members = self.members.lock().await;
            let live: HashSet<&CompanyId> = members.iter().map(|item| item.company_id()).collect();
            Ok(company_ids
                .iter()
                .filter(|id| live.contains(*id))
                .cloned()
                .collect())
        }

        async fn max_member_position(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
        ) -> AppResult<i64> {
            let members = self.members.lock().await;
            Ok(members.iter().map(CompanyListItem::position).max().unwrap_or(0))
        }

        async fn insert_members(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
            items: Vec<CompanyListItem>,
        ) -> AppResult<MemberInsertOutcome> {
            *self.mutation_calls.lock().await += 1;

            let mut outcome = MemberInsertOutcome::default();
            let mut members = self.members.lock().await;
            for item in items {
                if self.race_conflicts.contains(item.company_id()) {
                    outcome.conflicted.push(item.company_id().clone());
                    continue;
                }
                outcome.inserted.push(item.company_id().clone());
                members.push(item);
            }

            *self.counter.lock().await += outcome.inserted.len() as i64;
            Ok(outcome)
        }

        async fn delete_members(
            &self,
            _organization_id: OrganizationId,
            _list_id: ListId,
            company_ids: &[CompanyId],
        ) -> AppResult<Vec<CompanyId>> {
            *self.mutation_calls.lock().await += 1;

            let requested: HashSet<&CompanyId> = company_ids.iter().collect();
            let mut members = self.members.lock().await;
            let mut removed = Vec::new();
            members.retain(|item| {
                if requested.contains(item.company_id()) {
                    removed.push(item.company_id().clone());
                    false
                } else {
                    true
                }
            });

            *self.counter.lock().await -= removed.len() as i64;
            Ok(removed)
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

    fn owner_and_list() -> (Principal, CompanyList) {
        let organization_id = OrganizationId::new();
        let list = CompanyList::new(
            organization_id,
            "Bangkok manufacturers",
            "alice",
            ListVisibility::Private,
            false,
            None,
        )
        .unwrap_or_else(|_| unreachable!());
        (Principal::new("alice", organization_id, Vec::new()), list)
    }

    fn ids(values: &[&str]) -> Vec<CompanyId> {
        values
            .iter()
            .map(|value| CompanyId::new(*value).unwrap_or_else(|_| unreachable!()))
            .collect()
    }

    fn id_strings(values: &[CompanyId]) -> Vec<&str> {
        values.iter().map(CompanyId::as_str).collect()
    }

    #[tokio::test]
    async fn add_classifies_unknown_companies_as_not_found() {
        let (owner, list) = owner_and_list();
        let list_id = list.id();
        let repository = Arc::new(FakeListRepository::new(list, &["c1"]));
        let service = ListMembershipService::new(repository.clone());

        let outcome = service
            .add_companies(
                &owner,
                list_id,
                AddCompaniesInput {
                    company_ids: ids(&["c1", "c2"]),
                    note: None,
                },
            )
            .await;
        assert!(outcome.is_ok());
        let outcome = outcome.unwrap_or_else(|_| unreachable!());

        assert_eq!(id_strings(&outcome.added), vec!["c1"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].company_id.as_str(), "c2");
        assert_eq!(outcome.skipped[0].reason, SkipReason::NotFound);
        assert_eq!(*repository.counter.lock().await, 1);
    }

    #[tokio::test]
    async fn repeated_add_marks_every_id_duplicate() {
        let (owner, list) = owner_and_list();
        let list_id = list.id();
        let repository = Arc::new(FakeListRepository::new(list, &["c1"]));
        let service = ListMembershipService::new(repository.clone());

        let first = service
            .add_companies(
                &owner,
                list_id,
                AddCompaniesInput {
                    company_ids: ids(&["c1"]),
                    note: None,
                },
            )
            .await;
        assert!(first.is_ok());

        let second = service
            .add_companies(
                &owner,
                list_id,
                AddCompaniesInput {
                    company_ids: ids(&["c1"]),
                    note: None,
                },
            )
            .await;
        assert!(second.is_ok());
        let second = second.unwrap_or_else(|_| unreachable!());

        assert!(second.added.is_empty());
        assert_eq!(second.skipped.len(), 1);
        assert_eq!(second.skipped[0].reason, SkipReason::Duplicate);
        assert_eq!(*repository.counter.lock().await, 1);
    }

    #[tokio::test]
    async fn add_partitions_every_input_id_exactly_once() {
        let (owner, list) = owner_and_list();
        let list_id = list.id();
        let repository = Arc::new(FakeListRepository::new(list, &["c1", "c2", "c4"]));
        let service = ListMembershipService::new(repository);

        // c1 repeated in the input, c3 unknown.
        let outcome = service
            .add_companies(
                &owner,
                list_id,
                AddCompaniesInput {
                    company_ids: ids(&["c1", "c2", "c1", "c3", "c4"]),
                    note: Some("q3 push".to_owned()),
                },
            )
            .await;
        assert!(outcome.is_ok());
        let outcome = outcome.unwrap_or_else(|_| unreachable!());

        assert_eq!(id_strings(&outcome.added), vec!["c1", "c2", "c4"]);
        let skipped: Vec<&str> = outcome
            .skipped
            .iter()
            .map(|skip| skip.company_id.as_str())
            .collect();
        assert_eq!(skipped, vec!["c3"]);

        let mut classified: Vec<&str> = outcome
            .added
            .iter()
            .map(CompanyId::as_str)
            .chain(outcome.skipped.iter().map(|skip| skip.company_id.as_str()))
            .collect();
        classified.sort_unstable();
        assert_eq!(classified, vec!["c1", "c2", "c3", "c4"]);
    }

    #[tokio::test]
    async fn concurrent_duplicate_race_is_reported_as_duplicate() {
        let (owner, list) = owner_and_list();
        let list_id = list.id();
        let repository =
            Arc::new(FakeListRepository::new(list, &["c1", "c2"]).with_race_conflicts(&["c2"]));
        let service = ListMembershipService::new(repository);

        let outcome = service
            .add_companies(
                &owner,
                list_id,
                AddCompaniesInput {
                    company_ids: ids(&["c1", "c2"]),
                    note: None,
                },
            )
            .await;
        assert!(outcome.is_ok());
        let outcome = outcome.unwrap_or_else(|_| unreachable!());

        assert_eq!(id_strings(&outcome.added), vec!["c1"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].company_id.as_str(), "c2");
        assert_eq!(outcome.skipped[0].reason, SkipReason::Duplicate);
    }

    #[tokio::test]
    async fn remove_partitions_into_removed_and_missing() {
        let (owner, list) = owner_and_list();
        let list_id = list.id();
        let repository = Arc::new(FakeListRepository::new(list, &["c1", "c2"]));
        let service = ListMembershipService::new(repository.clone());

        let added = service
            .add_companies(
                &owner,
                list_id,
                AddCompaniesInput {
                    company_ids: ids(&["c1", "c2"]),
                    note: None,
                },
            )
            .await;
        assert!(added.is_ok());

        let outcome = service
            .remove_companies(&owner, list_id, ids(&["c1", "c9"]))
            .await;
        assert!(outcome.is_ok());
        let outcome = outcome.unwrap_or_else(|_| unreachable!());

        assert_eq!(id_strings(&outcome.removed), vec!["c1"]);
        assert_eq!(id_strings(&outcome.missing), vec!["c9"]);
        assert_eq!(*repository.counter.lock().await, 1);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_storage_mutation() {
        let (owner, list) = owner_and_list();
        let list_id = list.id();
        let repository = Arc::new(FakeListRepository::new(list, &["c1"]));
        let service = ListMembershipService::new(repository.clone());

        let outcome = service
            .add_companies(
                &owner,
                list_id,
                AddCompaniesInput {
                    company_ids: Vec::new(),
                    note: None,
                },
            )
            .await;
        assert!(outcome.is_err());
        assert_eq!(*repository.mutation_calls.lock().await, 0);
    }

    #[tokio::test]
    async fn foreign_caller_is_denied_before_any_storage_mutation() {
        let (_, list) = owner_and_list();
        let list_id = list.id();
        let organization_id = list.organization_id();
        let repository = Arc::new(FakeListRepository::new(list, &["c1"]));
        let service = ListMembershipService::new(repository.clone());

        let stranger = Principal::new(
            "mallory",
            organization_id,
            vec![Role::new("viewer", &["company-lists:read-org"])],
        );
        let outcome = service
            .add_companies(
                &stranger,
                list_id,
                AddCompaniesInput {
                    company_ids: ids(&["c1"]),
                    note: None,
                },
            )
            .await;
        assert!(outcome.is_err());
        assert_eq!(*repository.mutation_calls.lock().await, 0);
        assert_eq!(*repository.counter.lock().await, 0);
    }

    #[tokio::test]
    async fn unknown_list_yields_not_found() {
        let (owner, list) = owner_and_list();
        let repository = Arc::new(FakeListRepository::new(list, &["c1"]));
        let service = ListMembershipService::new(repository);

        let outcome = service
            .add_companies(
                &owner,
                ListId::new(),
                AddCompaniesInput {
                    company_ids: ids(&["c1"]),
                    note: None,
                },
            )
            .await;
        assert!(outcome.is_err());
    }
}
