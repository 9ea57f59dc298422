//! Application services and ports for company prospecting.

#![forbid(unsafe_code)]

mod company_list_service;
mod item_query_service;
mod list_ports;
mod membership_service;

pub use company_list_service::{CompanyListService, CreateListInput, ListScope, ListScopeQuery};
pub use item_query_service::{
    DEFAULT_PAGE_LIMIT, ListItemQueryService, ListItemsPage, ListItemsRequest, MAX_PAGE_LIMIT,
};
pub use list_ports::{
    CompanyListRepository, ItemCursorPosition, ItemFilters, ItemPageQuery, ItemSortField,
    ItemSortValue, ListItemRecord, ListPage, ListScopeFilter, MemberInsertOutcome, SortDirection,
};
pub use membership_service::{
    AddCompaniesInput, AddCompaniesOutcome, ListMembershipService, RemoveCompaniesOutcome,
    SkippedCompany,
};
