use std::collections::BTreeSet;

use prospectra_application::MemberInsertOutcome;
use prospectra_core::{AppError, AppResult, OrganizationId};
use prospectra_domain::{CompanyId, CompanyListItem, ListId};
use sqlx::PgPool;

fn id_strings(company_ids: &[CompanyId]) -> Vec<String> {
    company_ids
        .iter()
        .map(|id| id.as_str().to_owned())
        .collect()
}

fn parse_ids(values: Vec<String>) -> AppResult<Vec<CompanyId>> {
    values.into_iter().map(CompanyId::new).collect()
}

pub(super) async fn existing_company_ids(
    pool: &PgPool,
    organization_id: OrganizationId,
    company_ids: &[CompanyId],
) -> AppResult<BTreeSet<CompanyId>> {
    let found = sqlx::query_scalar::<_, String>(
        r#"
        SELECT company_id
        FROM companies
        WHERE organization_id = $1 AND company_id = ANY($2)
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(id_strings(company_ids))
    .fetch_all(pool)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to resolve registry companies: {error}"))
    })?;

    Ok(parse_ids(found)?.into_iter().collect())
}

pub(super) async fn member_company_ids(
    pool: &PgPool,
    organization_id: OrganizationId,
    list_id: ListId,
    company_ids: &[CompanyId],
) -> AppResult<BTreeSet<CompanyId>> {
    let found = sqlx::query_scalar::<_, String>(
        r#"
        SELECT company_id
        FROM company_list_items
        WHERE organization_id = $1 AND list_id = $2 AND company_id = ANY($3)
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(list_id.as_uuid())
    .bind(id_strings(company_ids))
    .fetch_all(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to resolve list members: {error}")))?;

    Ok(parse_ids(found)?.into_iter().collect())
}

pub(super) async fn max_member_position(
    pool: &PgPool,
    organization_id: OrganizationId,
    list_id: ListId,
) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(MAX(position), 0)
        FROM company_list_items
        WHERE organization_id = $1 AND list_id = $2
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(list_id.as_uuid())
    .fetch_one(pool)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to resolve the highest list position: {error}"))
    })
}

pub(super) async fn insert_members(
    pool: &PgPool,
    organization_id: OrganizationId,
    list_id: ListId,
    items: Vec<CompanyListItem>,
) -> AppResult<MemberInsertOutcome> {
    let mut transaction = pool
        .begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

    let mut outcome = MemberInsertOutcome::default();
    for item in items {
        // The unique constraint on (list_id, company_id) is the backstop
        // against concurrent duplicate adds; losers come back as conflicts
        // instead of failing the whole batch.
        let inserted = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO company_list_items
                (item_id, organization_id, list_id, company_id, note, position,
                 lead_score, status, added_at, added_by_subject)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (list_id, company_id) DO NOTHING
            RETURNING company_id
            "#,
        )
        .bind(item.item_id().as_uuid())
        .bind(organization_id.as_uuid())
        .bind(item.list_id().as_uuid())
        .bind(item.company_id().as_str())
        .bind(item.note())
        .bind(item.position())
        .bind(item.lead_score())
        .bind(item.status().as_str())
        .bind(item.added_at())
        .bind(item.added_by_subject())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert list member: {error}")))?;

        if inserted.is_some() {
            outcome.inserted.push(item.company_id().clone());
        } else {
            outcome.conflicted.push(item.company_id().clone());
        }
    }

    if !outcome.inserted.is_empty() {
        adjust_total(
            &mut transaction,
            organization_id,
            list_id,
            outcome.inserted.len() as i64,
        )
        .await?;
    }

    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))?;

    Ok(outcome)
}

pub(super) async fn delete_members(
    pool: &PgPool,
    organization_id: OrganizationId,
    list_id: ListId,
    company_ids: &[CompanyId],
) -> AppResult<Vec<CompanyId>> {
    let mut transaction = pool
        .begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

    let removed = sqlx::query_scalar::<_, String>(
        r#"
        DELETE FROM company_list_items
        WHERE organization_id = $1 AND list_id = $2 AND company_id = ANY($3)
        RETURNING company_id
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(list_id.as_uuid())
    .bind(id_strings(company_ids))
    .fetch_all(&mut *transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to delete list members: {error}")))?;

    if !removed.is_empty() {
        adjust_total(
            &mut transaction,
            organization_id,
            list_id,
            -(removed.len() as i64),
        )
        .await?;
    }

    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))?;

    parse_ids(removed)
}

async fn adjust_total(
    transaction: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    organization_id: OrganizationId,
    list_id: ListId,
    delta: i64,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE company_lists
        SET total_companies = total_companies + $3
        WHERE organization_id = $1 AND id = $2
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(list_id.as_uuid())
    .bind(delta)
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to adjust the membership counter: {error}"))
    })?;

    Ok(())
}
