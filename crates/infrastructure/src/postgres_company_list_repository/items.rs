use chrono::{DateTime, Utc};
use prospectra_application::{
    ItemPageQuery, ItemSortField, ItemSortValue, ListItemRecord, SortDirection,
};
use prospectra_core::{AppError, AppResult, OrganizationId};
use prospectra_domain::{
    CompanyId, CompanyListItem, CompanySummary, IndustryCode, ItemId, ListId, MembershipStatus,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct CompanyRow {
    company_id: String,
    name: String,
    province: String,
    company_size: String,
    verification_status: String,
    industry_code: Option<String>,
    contact_status: Option<String>,
    tags: Vec<String>,
}

impl CompanyRow {
    fn into_domain(self) -> AppResult<CompanySummary> {
        Ok(CompanySummary {
            company_id: CompanyId::new(self.company_id)?,
            name: self.name,
            province: self.province,
            company_size: self.company_size,
            verification_status: self.verification_status.parse()?,
            industry_code: self
                .industry_code
                .as_deref()
                .map(IndustryCode::parse)
                .transpose()?,
            contact_status: self.contact_status,
            tags: self.tags,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    item_id: Uuid,
    list_id: Uuid,
    note: Option<String>,
    position: i64,
    lead_score: f64,
    status: String,
    added_at: DateTime<Utc>,
    added_by_subject: String,
    #[sqlx(flatten)]
    company: CompanyRow,
}

impl ItemRow {
    fn into_domain(self) -> AppResult<ListItemRecord> {
        let company = self.company.into_domain()?;
        let item = CompanyListItem::from_parts(
            ItemId::from_uuid(self.item_id),
            ListId::from_uuid(self.list_id),
            company.company_id.clone(),
            self.note,
            self.position,
            self.lead_score,
            self.status.parse::<MembershipStatus>()?,
            self.added_at,
            self.added_by_subject,
        )?;

        Ok(ListItemRecord { item, company })
    }
}

fn sort_column(field: ItemSortField) -> &'static str {
    match field {
        ItemSortField::Name => "c.name",
        ItemSortField::CreatedAt => "i.added_at",
        ItemSortField::Position => "i.position",
    }
}

pub(super) async fn list_items(
    pool: &PgPool,
    organization_id: OrganizationId,
    list_id: ListId,
    query: ItemPageQuery,
) -> AppResult<Vec<ListItemRecord>> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT i.item_id, i.list_id, i.note, i.position, i.lead_score, i.status, \
         i.added_at, i.added_by_subject, c.company_id, c.name, c.province, \
         c.company_size, c.verification_status, c.industry_code, c.contact_status, c.tags \
         FROM company_list_items i \
         JOIN companies c \
           ON c.organization_id = i.organization_id AND c.company_id = i.company_id \
         WHERE i.organization_id = ",
    );
    builder.push_bind(organization_id.as_uuid());
    builder.push(" AND i.list_id = ");
    builder.push_bind(list_id.as_uuid());

    if let Some(province) = &query.filters.province {
        builder.push(" AND c.province = ");
        builder.push_bind(province.clone());
    }
    if let Some(tag_key) = &query.filters.tag_key {
        builder.push(" AND ");
        builder.push_bind(tag_key.clone());
        builder.push(" = ANY(c.tags)");
    }
    if let Some(industry_code) = &query.filters.industry_code {
        builder.push(" AND c.industry_code = ");
        builder.push_bind(industry_code.as_str().to_owned());
    }
    if let Some(search) = &query.search {
        builder.push(" AND c.name ILIKE ");
        builder.push_bind(format!("%{search}%"));
    }

    let column = sort_column(query.sort_by);
    if let Some(after) = &query.after {
        let comparator = match query.direction {
            SortDirection::Asc => " > ",
            SortDirection::Desc => " < ",
        };
        builder.push(format!(" AND ({column}, i.item_id)"));
        builder.push(comparator);
        builder.push("(");
        match &after.sort_value {
            ItemSortValue::Text(value) => builder.push_bind(value.clone()),
            ItemSortValue::Timestamp(value) => builder.push_bind(*value),
            ItemSortValue::Position(value) => builder.push_bind(*value),
        };
        builder.push(", ");
        builder.push_bind(after.item_id.as_uuid());
        builder.push(")");
    }

    let direction = match query.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    builder.push(format!(
        " ORDER BY {column} {direction}, i.item_id {direction} LIMIT "
    ));
    builder.push_bind(query.limit as i64);

    let rows = builder
        .build_query_as::<ItemRow>()
        .fetch_all(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load list items: {error}")))?;

    rows.into_iter().map(ItemRow::into_domain).collect()
}

pub(super) async fn member_companies(
    pool: &PgPool,
    organization_id: OrganizationId,
    list_id: ListId,
) -> AppResult<Vec<CompanySummary>> {
    let rows = sqlx::query_as::<_, CompanyRow>(
        r#"
        SELECT c.company_id, c.name, c.province, c.company_size,
               c.verification_status, c.industry_code, c.contact_status, c.tags
        FROM company_list_items i
        JOIN companies c
          ON c.organization_id = i.organization_id AND c.company_id = i.company_id
        WHERE i.organization_id = $1 AND i.list_id = $2
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(list_id.as_uuid())
    .fetch_all(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to load list companies: {error}")))?;

    rows.into_iter().map(CompanyRow::into_domain).collect()
}
