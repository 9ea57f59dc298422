use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prospectra_core::{AppError, AppResult, OrganizationId};
use prospectra_domain::{
    CompanyId, CompanyList, CompanyListItem, CompanySummary, IndustryCode, ItemId, ListId,
};
use serde::{Deserialize, Serialize};

/// Scope filter for company-list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScopeFilter {
    /// Lists owned by the subject.
    Mine {
        /// Owner subject.
        owner_subject: String,
    },
    /// Lists shared with (but not owned by) the subject within the organization.
    SharedWith {
        /// Viewing subject.
        subject: String,
    },
    /// Organization-visible and public lists within the organization.
    Organization,
}

/// Offset page for company-list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    /// 1-based page number.
    pub page: usize,
    /// Maximum rows returned.
    pub limit: usize,
    /// Optional free-text filter on the list name.
    pub search: Option<String>,
}

/// Sortable column for list-item pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortField {
    /// Company name.
    Name,
    /// Time the company was added to the list.
    CreatedAt,
    /// Manual position within the list.
    Position,
}

impl ItemSortField {
    /// Parses a transport value into a sort field.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "name" => Ok(Self::Name),
            "createdAt" => Ok(Self::CreatedAt),
            "position" => Ok(Self::Position),
            _ => Err(AppError::Validation(format!(
                "unknown sort field '{value}'"
            ))),
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CreatedAt => "createdAt",
            Self::Position => "position",
        }
    }
}

/// Sort direction for list-item pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Parses a transport value into a sort direction.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Typed sort-key value captured at a pagination boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortValue {
    /// Value of a text sort column.
    Text(String),
    /// Value of a timestamp sort column.
    Timestamp(DateTime<Utc>),
    /// Value of an integer position sort column.
    Position(i64),
}

impl ItemSortValue {
    /// Returns whether this value shape belongs to the given sort field.
    #[must_use]
    pub fn belongs_to(&self, field: ItemSortField) -> bool {
        matches!(
            (self, field),
            (Self::Text(_), ItemSortField::Name)
                | (Self::Timestamp(_), ItemSortField::CreatedAt)
                | (Self::Position(_), ItemSortField::Position)
        )
    }
}

/// Exclusive lower bound for keyset pagination.
///
/// Rows are compared on `(sort value, item id)`; the item id breaks ties so
/// the boundary stays well-defined when the primary sort key has
/// duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCursorPosition {
    /// Sort-key value of the last returned row.
    pub sort_value: ItemSortValue,
    /// Item id of the last returned row.
    pub item_id: ItemId,
}

/// Equality and classification filters applied before pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilters {
    /// Exact province match.
    pub province: Option<String>,
    /// Tag key the company must carry.
    pub tag_key: Option<String>,
    /// Exact TSIC industry code match.
    pub industry_code: Option<IndustryCode>,
}

/// Validated query inputs for one page of list items.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPageQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Sort column.
    pub sort_by: ItemSortField,
    /// Sort direction.
    pub direction: SortDirection,
    /// Exclusive keyset lower bound; `None` starts from the beginning.
    pub after: Option<ItemCursorPosition>,
    /// Equality filters.
    pub filters: ItemFilters,
    /// Free-text filter against the company name.
    pub search: Option<String>,
}

/// A membership row joined with its company projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItemRecord {
    /// The membership row.
    pub item: CompanyListItem,
    /// The company the row tracks.
    pub company: CompanySummary,
}

/// Result of a transactional bulk membership insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberInsertOutcome {
    /// Company ids actually inserted.
    pub inserted: Vec<CompanyId>,
    /// Company ids that lost a concurrent duplicate race on
    /// `(list_id, company_id)` and were not inserted.
    pub conflicted: Vec<CompanyId>,
}

/// Repository port for company lists, membership, and item reads.
///
/// Implementations back every mutating membership operation with a single
/// storage transaction covering the row mutation and the denormalized
/// `total_companies` adjustment, so the counter invariant holds under
/// concurrent writers.
#[async_trait]
pub trait CompanyListRepository: Send + Sync {
    /// Persists a new company list.
    async fn insert_list(&self, list: CompanyList) -> AppResult<()>;

    /// Looks up a list by identifier within an organization.
    async fn find_list(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<Option<CompanyList>>;

    /// Deletes a list and its membership rows.
    async fn delete_list(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<()>;

    /// Lists company lists matching a scope filter, name-sorted, offset-paged.
    async fn list_lists(
        &self,
        organization_id: OrganizationId,
        filter: &ListScopeFilter,
        page: ListPage,
    ) -> AppResult<Vec<CompanyList>>;

    /// Returns the subset of the given ids present in the company registry.
    async fn existing_company_ids(
        &self,
        organization_id: OrganizationId,
        company_ids: &[CompanyId],
    ) -> AppResult<BTreeSet<CompanyId>>;

    /// Returns the subset of the given ids with a live membership row in the list.
    async fn member_company_ids(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        company_ids: &[CompanyId],
    ) -> AppResult<BTreeSet<CompanyId>>;

    /// Returns the highest membership position in the list, or zero when empty.
    async fn max_member_position(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<i64>;

    /// Inserts membership rows and bumps `total_companies` in one transaction.
    ///
    /// Ids violating the `(list_id, company_id)` unique constraint are
    /// reported in the outcome instead of failing the transaction.
    async fn insert_members(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        items: Vec<CompanyListItem>,
    ) -> AppResult<MemberInsertOutcome>;

    /// Deletes membership rows and decrements `total_companies` in one
    /// transaction; returns the ids that actually had a row.
    async fn delete_members(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        company_ids: &[CompanyId],
    ) -> AppResult<Vec<CompanyId>>;

    /// Reads one filtered, sorted, keyset-paged window of list items.
    async fn list_items(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        query: ItemPageQuery,
    ) -> AppResult<Vec<ListItemRecord>>;

    /// Returns the company projection of every live member of the list.
    async fn member_companies(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<Vec<CompanySummary>>;
}
