use std::collections::BTreeSet;

use async_trait::async_trait;
use prospectra_application::{
    CompanyListRepository, ItemPageQuery, ListItemRecord, ListPage, ListScopeFilter,
    MemberInsertOutcome,
};
use prospectra_core::{AppResult, OrganizationId};
use prospectra_domain::{CompanyId, CompanyList, CompanyListItem, CompanySummary, ListId};
use sqlx::PgPool;

mod items;
mod lists;
mod membership;

/// PostgreSQL-backed company-list repository.
///
/// Membership mutations run the row change and the `total_companies`
/// adjustment in one transaction.
#[derive(Clone)]
pub struct PostgresCompanyListRepository {
    pool: PgPool,
}

impl PostgresCompanyListRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyListRepository for PostgresCompanyListRepository {
    async fn insert_list(&self, list: CompanyList) -> AppResult<()> {
        lists::insert_list(&self.pool, &list).await
    }

    async fn find_list(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<Option<CompanyList>> {
        lists::find_list(&self.pool, organization_id, list_id).await
    }

    async fn delete_list(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<()> {
        lists::delete_list(&self.pool, organization_id, list_id).await
    }

    async fn list_lists(
        &self,
        organization_id: OrganizationId,
        filter: &ListScopeFilter,
        page: ListPage,
    ) -> AppResult<Vec<CompanyList>> {
        lists::list_lists(&self.pool, organization_id, filter, page).await
    }

    async fn existing_company_ids(
        &self,
        organization_id: OrganizationId,
        company_ids: &[CompanyId],
    ) -> AppResult<BTreeSet<CompanyId>> {
        membership::existing_company_ids(&self.pool, organization_id, company_ids).await
    }

    async fn member_company_ids(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        company_ids: &[CompanyId],
    ) -> AppResult<BTreeSet<CompanyId>> {
        membership::member_company_ids(&self.pool, organization_id, list_id, company_ids).await
    }

    async fn max_member_position(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<i64> {
        membership::max_member_position(&self.pool, organization_id, list_id).await
    }

    async fn insert_members(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        items: Vec<CompanyListItem>,
    ) -> AppResult<MemberInsertOutcome> {
        membership::insert_members(&self.pool, organization_id, list_id, items).await
    }

    async fn delete_members(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        company_ids: &[CompanyId],
    ) -> AppResult<Vec<CompanyId>> {
        membership::delete_members(&self.pool, organization_id, list_id, company_ids).await
    }

    async fn list_items(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
        query: ItemPageQuery,
    ) -> AppResult<Vec<ListItemRecord>> {
        items::list_items(&self.pool, organization_id, list_id, query).await
    }

    async fn member_companies(
        &self,
        organization_id: OrganizationId,
        list_id: ListId,
    ) -> AppResult<Vec<CompanySummary>> {
        items::member_companies(&self.pool, organization_id, list_id).await
    }
}
