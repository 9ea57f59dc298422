use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use prospectra_application::{
    CompanyListRepository, ItemCursorPosition, ItemPageQuery, ItemSortField, ItemSortValue,
    ListItemRecord, ListPage, ListScopeFilter, MemberInsertOutcome, SortDirection,
};
use prospectra_core::{AppError, AppResult, OrganizationId};
use prospectra_domain::{
    CompanyId, CompanyList, CompanyListItem, CompanySummary, ListId, ListVisibility,
};
use tokio::sync::RwLock;


#[derive(Default)]
struct StoreState {
    lists: HashMap<(OrganizationId, ListId), CompanyList>,
    companies: HashMap<(OrganizationId, CompanyId), CompanySummary>,
    items: HashMap<(OrganizationId, ListId), Vec<CompanyListItem>>,
}

/// In-memory company-list repository for tests and local development.
///
/// Every mutating membership method takes the write lock once and applies
/// the row change together with the `total_companies` adjustment, so the
/// counter invariant holds under concurrent callers just as it does in
/// the transactional adapter.
#[derive(Clone, Default)]
pub struct InMemoryCompanyListRepository {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryCompanyListRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the company registry with one company.
    pub async fn insert_company(&self, organization_id: OrganizationId, company: CompanySummary) {
        let mut state = self.state.write().await;
        state
            .companies
            .insert((organization_id, company.company_id.clone()), company);
    }
}

#[async_trait]
impl CompanyListRepository for InMemoryCompanyListRepository {
    async fn insert_list(&self, list: CompanyList) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .lists
            .insert((list.organization_id(), list.id()), list);
        Ok(())
    }

    async fn find_list(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<Option<CompanyList>> {
        let state = self.state.read().await;
        Ok(state.lists.get(&(organization_id, list_id)).cloned())
    }

    async fn delete_list(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.lists.remove(&(organization_id, list_id));
        state.items.remove(&(organization_id, list_id));
        Ok(())
    }

    async fn list_lists(
        &self,
        organization_id: OrganizationId,
        filter: &ListScopeFilter,
        page: ListPage,
    ) -> AppResult<Vec<CompanyList>> {
        let state = self.state.read().await;
        let needle = page.search.as_deref().map(str::to_lowercase);

        let mut matches: Vec<CompanyList> = state
            .lists
            .values()
            .filter(|list| list.organization_id() == organization_id)
            .filter(|list| matches_scope(list, filter))
            .filter(|list| match &needle {
                Some(needle) => list.name().as_str().to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();

        matches.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));

        Ok(matches
            .into_iter()
            .skip((page.page - 1) * page.limit)
            .take(page.limit)
            .collect())
    }

    async fn existing_company_ids(
        &self,
        organization_id: OrganizationId,
        company_ids: &[CompanyId],
    ) -> AppResult<BTreeSet<CompanyId>> {
        let state = self.state.read().await;
        Ok(company_ids
            .iter()
            .filter(|id| {
                state
                    .companies
                    .contains_key(&(organization_id, (*id).clone()))
            })
            .cloned()
            .collect())
    }

    async fn member_company_ids(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        company_ids: &[CompanyId],
    ) -> AppResult<BTreeSet<CompanyId>> {
        let state = self.state.read().await;
        let members: BTreeSet<&CompanyId> = state
            .items
            .get(&(organization_id, list_id))
            .map(|items| items.iter().map(CompanyListItem::company_id).collect())
            .unwrap_or_default();

        Ok(company_ids
            .iter()
            .filter(|id| members.contains(*id))
            .cloned()
            .collect())
    }

    async fn max_member_position(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .items
            .get(&(organization_id, list_id))
            .and_then(|items| items.iter().map(CompanyListItem::position).max())
            .unwrap_or(0))
    }

    async fn insert_members(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        items: Vec<CompanyListItem>,
    ) -> AppResult<MemberInsertOutcome> {
        let mut state = self.state.write().await;

        let mut outcome = MemberInsertOutcome::default();
        {
            let rows = state.items.entry((organization_id, list_id)).or_default();
            for item in items {
                let duplicate = rows
                    .iter()
                    .any(|existing| existing.company_id() == item.company_id());
                if duplicate {
                    outcome.conflicted.push(item.company_id().clone());
                } else {
                    outcome.inserted.push(item.company_id().clone());
                    rows.push(item);
                }
            }
        }

        adjust_total(&mut state, organization_id, list_id, outcome.inserted.len() as i64)?;
        Ok(outcome)
    }

    async fn delete_members(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        company_ids: &[CompanyId],
    ) -> AppResult<Vec<CompanyId>> {
        let mut state = self.state.write().await;

        let mut removed = Vec::new();
        if let Some(rows) = state.items.get_mut(&(organization_id, list_id)) {
            let requested: BTreeSet<&CompanyId> = company_ids.iter().collect();
            rows.retain(|item| {
                if requested.contains(item.company_id()) {
                    removed.push(item.company_id().clone());
                    false
                } else {
                    true
                }
            });
        }

        adjust_total(&mut state, organization_id, list_id, -(removed.len() as i64))?;
        Ok(removed)
    }

    async fn list_items(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        query: ItemPageQuery,
    ) -> AppResult<Vec<ListItemRecord>> {
        let state = self.state.read().await;

        let mut records: Vec<ListItemRecord> = state
            .items
            .get(&(organization_id, list_id))
            .map(|items| items.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|item| {
                state
                    .companies
                    .get(&(organization_id, item.company_id().clone()))
                    .map(|company| ListItemRecord {
                        item: item.clone(),
                        company: company.clone(),
                    })
            })
            .filter(|record| matches_filters(record, &query))
            .collect();

        records.sort_by(|left, right| {
            let ordering = compare_records(left, right, query.sort_by);
            match query.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        if let Some(after) = &query.after {
            records.retain(|record| {
                let ordering = compare_to_boundary(record, after, query.sort_by);
                match query.direction {
                    SortDirection::Asc => ordering == Ordering::Greater,
                    SortDirection::Desc => ordering == Ordering::Less,
                }
            });
        }

        records.truncate(query.limit);
        Ok(records)
    }

    async fn member_companies(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<Vec<CompanySummary>> {
        let state = self.state.read().await;
        Ok(state
            .items
            .get(&(organization_id, list_id))
            .map(|items| items.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|item| {
                state
                    .companies
                    .get(&(organization_id, item.company_id().clone()))
                    .cloned()
            })
            .collect())
    }
}

fn matches_scope(list: &CompanyList, filter: &ListScopeFilter) -> bool {
    match filter {
        ListScopeFilter::Mine { owner_subject } => list.owner_subject() == owner_subject,
        ListScopeFilter::SharedWith { subject } => {
            list.is_shared()
                && list.owner_subject() != subject
                && list.visibility() != ListVisibility::Private
        }
        ListScopeFilter::Organization => matches!(
            list.visibility(),
            ListVisibility::Organization | ListVisibility::Public
        ),
    }
}

fn matches_filters(record: &ListItemRecord, query: &ItemPageQuery) -> bool {
    if let Some(province) = &query.filters.province
        && record.company.province != *province
    {
        return false;
    }
    if let Some(tag_key) = &query.filters.tag_key
        && !record.company.tags.iter().any(|tag| tag == tag_key)
    {
        return false;
    }
    if let Some(industry_code) = &query.filters.industry_code
        && record.company.industry_code.as_ref() != Some(industry_code)
    {
        return false;
    }
    if let Some(search) = &query.search
        && !record
            .company
            .name
            .to_lowercase()
            .contains(&search.to_lowercase())
    {
        return false;
    }
    true
}

fn sort_value(record: &ListItemRecord, field: ItemSortField) -> ItemSortValue {
    match field {
        ItemSortField::Name => ItemSortValue::Text(record.company.name.clone()),
        ItemSortField::CreatedAt => ItemSortValue::Timestamp(record.item.added_at()),
        ItemSortField::Position => ItemSortValue::Position(record.item.position()),
    }
}

fn compare_values(left: &ItemSortValue, right: &ItemSortValue) -> Ordering {
    match (left, right) {
        (ItemSortValue::Text(left), ItemSortValue::Text(right)) => left.cmp(right),
        (ItemSortValue::Timestamp(left), ItemSortValue::Timestamp(right)) => left.cmp(right),
        (ItemSortValue::Position(left), ItemSortValue::Position(right)) => left.cmp(right),
        _ => Ordering::Equal,
    }
}

fn compare_records(left: &ListItemRecord, right: &ListItemRecord, field: ItemSortField) -> Ordering {
    compare_values(&sort_value(left, field), &sort_value(right, field))
        .then_with(|| left.item.item_id().cmp(&right.item.item_id()))
}

fn compare_to_boundary(
    record: &ListItemRecord,
    boundary: &ItemCursorPosition,
    field: ItemSortField,
) -> Ordering {
    compare_values(&sort_value(record, field), &boundary.sort_value)
        .then_with(|| record.item.item_id().cmp(&boundary.item_id))
}

fn adjust_total(
    state: &mut StoreState,
    organization_id: OrganizationId,
    list_id: ListId,
    delta: i64,
) -> AppResult<()> {
    if delta == 0 {
        return Ok(());
    }

    let list = state
        .lists
        .get(&(organization_id, list_id))
        .ok_or_else(|| {
            AppError::Internal(format!(
                "company list '{list_id}' vanished during a membership mutation"
            ))
        })?;

    let updated = CompanyList::from_parts(
        list.id(),
        list.organization_id(),
        list.name().as_str(),
        list.owner_subject(),
        list.visibility(),
        list.is_shared(),
        list.total_companies() + delta,
        list.smart_criteria().cloned(),
    )?;
    state.lists.insert((organization_id, list_id), updated);
    Ok(())
}
