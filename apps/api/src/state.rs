use prospectra_application::{CompanyListService, ListItemQueryService, ListMembershipService};
use prospectra_core::OrganizationId;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub company_list_service: CompanyListService,
    pub membership_service: ListMembershipService,
    pub item_query_service: ListItemQueryService,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub bootstrap_organization_id: Option<OrganizationId>,
}
