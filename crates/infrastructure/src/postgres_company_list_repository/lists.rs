use prospectra_application::{ListPage, ListScopeFilter};
use prospectra_core::{AppError, AppResult, OrganizationId};
use prospectra_domain::{CompanyList, ListId, ListVisibility, ScoreCriteria};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct ListRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    owner_subject: String,
    visibility: String,
    is_shared: bool,
    total_companies: i64,
    smart_criteria: Option<String>,
}

impl ListRow {
    fn into_domain(self) -> AppResult<CompanyList> {
        let smart_criteria = self
            .smart_criteria
            .as_deref()
            .map(serde_json::from_str::<ScoreCriteria>)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!(
                    "stored smart criteria for list '{}' are not valid JSON: {error}",
                    self.id
                ))
            })?;

        CompanyList::from_parts(
            ListId::from_uuid(self.id),
            OrganizationId::from_uuid(self.organization_id),
            self.name,
            self.owner_subject,
            self.visibility.parse::<ListVisibility>()?,
            self.is_shared,
            self.total_companies,
            smart_criteria,
        )
    }
}

pub(super) async fn insert_list(pool: &PgPool, list: &CompanyList) -> AppResult<()> {
    let smart_criteria = list
        .smart_criteria()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|error| {
            AppError::Internal(format!("failed to serialize smart criteria: {error}"))
        })?;

    sqlx::query(
        r#"
        INSERT INTO company_lists
            (id, organization_id, name, owner_subject, visibility, is_shared,
             total_companies, smart_criteria)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(list.id().as_uuid())
    .bind(list.organization_id().as_uuid())
    .bind(list.name().as_str())
    .bind(list.owner_subject())
    .bind(list.visibility().as_str())
    .bind(list.is_shared())
    .bind(list.total_companies())
    .bind(smart_criteria)
    .execute(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to insert company list: {error}")))?;

    Ok(())
}

pub(super) async fn find_list(
    pool: &PgPool,
    organization_id: OrganizationId,
    list_id: ListId,
) -> AppResult<Option<CompanyList>> {
    let row = sqlx::query_as::<_, ListRow>(
        r#"
        SELECT id, organization_id, name, owner_subject, visibility, is_shared,
               total_companies, smart_criteria
        FROM company_lists
        WHERE organization_id = $1 AND id = $2
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(list_id.as_uuid())
    .fetch_optional(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to load company list: {error}")))?;

    row.map(ListRow::into_domain).transpose()
}

pub(super) async fn delete_list(
    pool: &PgPool,
    organization_id: OrganizationId,
    list_id: ListId,
) -> AppResult<()> {
    let mut transaction = pool
        .begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

    sqlx::query(
        r#"
        DELETE FROM company_list_items
        WHERE organization_id = $1 AND list_id = $2
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(list_id.as_uuid())
    .execute(&mut *transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to delete list members: {error}")))?;

    sqlx::query(
        r#"
        DELETE FROM company_lists
        WHERE organization_id = $1 AND id = $2
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(list_id.as_uuid())
    .execute(&mut *transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to delete company list: {error}")))?;

    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))?;

    Ok(())
}

pub(super) async fn list_lists(
    pool: &PgPool,
    organization_id: OrganizationId,
    filter: &ListScopeFilter,
    page: ListPage,
) -> AppResult<Vec<CompanyList>> {
    let offset = ((page.page - 1) * page.limit) as i64;
    let limit = page.limit as i64;

    let rows = match filter {
        ListScopeFilter::Mine { owner_subject } => {
            sqlx::query_as::<_, ListRow>(
                r#"
                SELECT id, organization_id, name, owner_subject, visibility, is_shared,
                       total_companies, smart_criteria
                FROM company_lists
                WHERE organization_id = $1
                  AND owner_subject = $2
                  AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
                ORDER BY name ASC
                LIMIT $4 OFFSET $5
                "#,
            )
            .bind(organization_id.as_uuid())
            .bind(owner_subject)
            .bind(page.search.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        ListScopeFilter::SharedWith { subject } => {
            sqlx::query_as::<_, ListRow>(
                r#"
                SELECT id, organization_id, name, owner_subject, visibility, is_shared,
                       total_companies, smart_criteria
                FROM company_lists
                WHERE organization_id = $1
                  AND is_shared = TRUE
                  AND owner_subject <> $2
                  AND visibility <> 'private'
                  AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
                ORDER BY name ASC
                LIMIT $4 OFFSET $5
                "#,
            )
            .bind(organization_id.as_uuid())
            .bind(subject)
            .bind(page.search.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        ListScopeFilter::Organization => {
            sqlx::query_as::<_, ListRow>(
                r#"
                SELECT id, organization_id, name, owner_subject, visibility, is_shared,
                       total_companies, smart_criteria
                FROM company_lists
                WHERE organization_id = $1
                  AND visibility IN ('organization', 'public')
                  AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
                ORDER BY name ASC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(organization_id.as_uuid())
            .bind(page.search.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
    .map_err(|error| AppError::Internal(format!("failed to list company lists: {error}")))?;

    rows.into_iter().map(ListRow::into_domain).collect()
}
