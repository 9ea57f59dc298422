use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use prospectra_core::{AppError, AppResult, Principal};
use prospectra_domain::{
    CompanyList, IndustryCode, ItemId, ListAction, ListId, RankedCompany, ScoreCriteria,
    can_access_list, rank,
};
use serde::{Deserialize, Serialize};

use crate::list_ports::{
    CompanyListRepository, ItemCursorPosition, ItemFilters, ItemPageQuery, ItemSortField,
    ItemSortValue, ListItemRecord, SortDirection,
};

/// Page size applied when the caller does not send a limit.
pub const DEFAULT_PAGE_LIMIT: usize = 25;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: usize = 200;

/// Raw transport inputs for one page of list items.
///
/// Everything arrives as optional strings; the service validates and
/// normalizes before touching storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItemsRequest {
    /// Requested page size.
    pub limit: Option<usize>,
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    /// Sort column transport value.
    pub sort_by: Option<String>,
    /// Sort direction transport value.
    pub sort_dir: Option<String>,
    /// Exact province filter.
    pub province: Option<String>,
    /// Tag-key filter.
    pub tag_key: Option<String>,
    /// TSIC industry-code filter.
    pub tsic: Option<String>,
    /// Free-text company-name filter.
    pub search: Option<String>,
}

/// One page of list items plus the cursor for the next page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItemsPage {
    /// Membership rows joined with their company projections.
    pub items: Vec<ListItemRecord>,
    /// Cursor resuming after the last row, or `None` on the final page.
    pub next_cursor: Option<String>,
}

/// Serialized form of a pagination cursor.
///
/// The cursor carries the sort configuration it was minted under so a
/// caller cannot resume a `name` walk with a `position` boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CursorToken {
    sort_by: ItemSortField,
    direction: SortDirection,
    sort_value: ItemSortValue,
    item_id: ItemId,
}

/// Application service for reading and ranking list members.
#[derive(Clone)]
pub struct ListItemQueryService {
    repository: Arc<dyn CompanyListRepository>,
}

impl ListItemQueryService {
    /// Creates a new query service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn CompanyListRepository>) -> Self {
        Self { repository }
    }

    /// Returns one filtered, sorted page of list items.
    pub async fn list_items(
        &self,
        actor: &Principal,
        list_id: ListId,
        request: ListItemsRequest,
    ) -> AppResult<ListItemsPage> {
        let limit = match request.limit {
            None => DEFAULT_PAGE_LIMIT,
            Some(limit) if (1..=MAX_PAGE_LIMIT).contains(&limit) => limit,
            Some(limit) => {
                return Err(AppError::Validation(format!(
                    "limit must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"
                )));
            }
        };

        let sort_by = match request.sort_by.as_deref() {
            None => ItemSortField::Name,
            Some(value) => ItemSortField::parse_transport(value)?,
        };
        let direction = match request.sort_dir.as_deref() {
            None => SortDirection::Asc,
            Some(value) => SortDirection::parse_transport(value)?,
        };

        let after = request
            .cursor
            .as_deref()
            .map(|cursor| decode_cursor(cursor, sort_by, direction))
            .transpose()?;

        let industry_code = request
            .tsic
            .as_deref()
            .map(IndustryCode::parse)
            .transpose()?;

        let query = ItemPageQuery {
            limit,
            sort_by,
            direction,
            after,
            filters: ItemFilters {
                province: request.province,
                tag_key: request.tag_key,
                industry_code,
            },
            search: request.search,
        };

        let list = self.require_readable_list(actor, list_id).await?;
        let items = self
            .repository
            .list_items(list.organization_id(), list_id, query)
            .await?;

        let next_cursor = (items.len() == limit)
            .then(|| items.last())
            .flatten()
            .map(|record| encode_cursor(record, sort_by, direction))
            .transpose()?;

        Ok(ListItemsPage { items, next_cursor })
    }

    /// Scores every member of the list and returns them ranked.
    pub async fn ranked_items(
        &self,
        actor: &Principal,
        list_id: ListId,
        criteria: &ScoreCriteria,
    ) -> AppResult<Vec<RankedCompany>> {
        let list = self.require_readable_list(actor, list_id).await?;
        let companies = self
            .repository
            .member_companies(list.organization_id(), list_id)
            .await?;
        Ok(rank(companies, criteria))
    }

    /// Looks the list up and checks read access.
    ///
    /// A readable-but-missing list and a present-but-denied list produce
    /// the same error, so callers cannot probe for lists they may not see.
    async fn require_readable_list(
        &self,
        actor: &Principal,
        list_id: ListId,
    ) -> AppResult<CompanyList> {
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
}

fn list_not_found(actor: &Principal, list_id: ListId) -> AppError {
    AppError::NotFound(format!(
        "company list '{list_id}' does not exist for organization '{}'",
        actor.organization_id()
    ))
}

fn encode_cursor(
    record: &ListItemRecord,
    sort_by: ItemSortField,
    direction: SortDirection,
) -> AppResult<String> {
    let sort_value = match sort_by {
        ItemSortField::Name => ItemSortValue::Text(record.company.name.clone()),
        ItemSortField::CreatedAt => ItemSortValue::Timestamp(record.item.added_at()),
        ItemSortField::Position => ItemSortValue::Position(record.item.position()),
    };
    let token = CursorToken {
        sort_by,
        direction,
        sort_value,
        item_id: record.item.item_id(),
    };

    let bytes = serde_json::to_vec(&token)
        .map_err(|err| AppError::Internal(format!("failed to encode pagination cursor: {err}")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_cursor(
    cursor: &str,
    sort_by: ItemSortField,
    direction: SortDirection,
) -> AppResult<ItemCursorPosition> {
    let malformed = || AppError::Validation("malformed pagination cursor".to_owned());

    let bytes = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| malformed())?;
    let token: CursorToken = serde_json::from_slice(&bytes).map_err(|_| malformed())?;

    if token.sort_by != sort_by || token.direction != direction {
        return Err(AppError::Validation(
            "pagination cursor does not match the requested sort".to_owned(),
        ));
    }
    if !token.sort_value.belongs_to(sort_by) {
        return Err(malformed());
    }

    Ok(ItemCursorPosition {
        sort_value: token.sort_value,
        item_id: token.item_id,
    })
}
