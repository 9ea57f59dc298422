use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use prospectra_application::{
    AddCompaniesOutcome, ListItemRecord, ListItemsPage, RemoveCompaniesOutcome,
};
use prospectra_core::Principal;
use prospectra_domain::{CompanyId, CompanyList, RankedCompany, ScoreCriteria};
use serde::{Deserialize, Serialize};

/// Health probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// The authenticated caller's identity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub subject: String,
    pub organization_id: String,
    pub roles: Vec<RoleResponse>,
}

/// One role held by the caller, with its permission keys.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub name: String,
    pub grants: Vec<String>,
}

impl From<&Principal> for MeResponse {
    fn from(value: &Principal) -> Self {
        Self {
            subject: value.subject().to_owned(),
            organization_id: value.organization_id().to_string(),
            roles: value
                .roles()
                .iter()
                .map(|role| RoleResponse {
                    name: role.name().to_owned(),
                    grants: role.grants().iter().map(|grant| grant.as_key()).collect(),
                })
                .collect(),
        }
    }
}

/// Lead-scoring criteria in transport form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCriteriaDto {
    pub industrial: Option<String>,
    pub province: Option<String>,
    pub company_size: Option<String>,
    pub contact_status: Option<String>,
}

impl From<ScoreCriteriaDto> for ScoreCriteria {
    fn from(value: ScoreCriteriaDto) -> Self {
        Self {
            industrial: value.industrial,
            province: value.province,
            company_size: value.company_size,
            contact_status: value.contact_status,
        }
    }
}

impl From<&ScoreCriteria> for ScoreCriteriaDto {
    fn from(value: &ScoreCriteria) -> Self {
        Self {
            industrial: value.industrial.clone(),
            province: value.province.clone(),
            company_size: value.company_size.clone(),
            contact_status: value.contact_status.clone(),
        }
    }
}

/// Incoming company-list create payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    pub name: String,
    pub visibility: String,
    #[serde(default)]
    pub is_shared: bool,
    pub smart_criteria: Option<ScoreCriteriaDto>,
}

/// API representation of a company list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyListResponse {
    pub id: String,
    pub name: String,
    pub owner_subject: String,
    pub visibility: String,
    pub is_shared: bool,
    pub total_companies: i64,
    pub is_smart_list: bool,
    pub smart_criteria: Option<ScoreCriteriaDto>,
}

impl From<CompanyList> for CompanyListResponse {
    fn from(value: CompanyList) -> Self {
        Self {
            id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
            owner_subject: value.owner_subject().to_owned(),
            visibility: value.visibility().as_str().to_owned(),
            is_shared: value.is_shared(),
            total_companies: value.total_companies(),
            is_smart_list: value.is_smart_list(),
            smart_criteria: value.smart_criteria().map(ScoreCriteriaDto::from),
        }
    }
}

/// Incoming bulk add payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCompaniesRequest {
    pub company_ids: Vec<String>,
    pub note: Option<String>,
}

/// Incoming bulk remove payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCompaniesRequest {
    pub company_ids: Vec<String>,
}

/// One skipped company id with the reason it was not added.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCompanyResponse {
    pub company_id: String,
    pub reason: &'static str,
}

/// Outcome of a bulk add.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCompaniesResponse {
    pub list_id: String,
    pub added: Vec<String>,
    pub skipped: Vec<SkippedCompanyResponse>,
}

impl From<AddCompaniesOutcome> for AddCompaniesResponse {
    fn from(value: AddCompaniesOutcome) -> Self {
        Self {
            list_id: value.list_id.to_string(),
            added: id_strings(value.added),
            skipped: value
                .skipped
                .into_iter()
                .map(|skip| SkippedCompanyResponse {
                    company_id: skip.company_id.as_str().to_owned(),
                    reason: skip.reason.as_str(),
                })
                .collect(),
        }
    }
}

/// Outcome of a bulk remove.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCompaniesResponse {
    pub list_id: String,
    pub removed: Vec<String>,
    pub missing: Vec<String>,
}

impl From<RemoveCompaniesOutcome> for RemoveCompaniesResponse {
    fn from(value: RemoveCompaniesOutcome) -> Self {
        Self {
            list_id: value.list_id.to_string(),
            removed: id_strings(value.removed),
            missing: id_strings(value.missing),
        }
    }
}

/// One list item joined with its company projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemResponse {
    pub item_id: String,
    pub company_id: String,
    pub name: String,
    pub province: String,
    pub company_size: String,
    pub verification_status: String,
    pub industry_code: Option<String>,
    pub contact_status: Option<String>,
    pub tags: Vec<String>,
    pub note: Option<String>,
    pub position: i64,
    pub lead_score: f64,
    pub status: String,
    pub added_at: DateTime<Utc>,
    pub added_by_subject: String,
}

impl From<ListItemRecord> for ListItemResponse {
    fn from(value: ListItemRecord) -> Self {
        Self {
            item_id: value.item.item_id().to_string(),
            company_id: value.company.company_id.as_str().to_owned(),
            name: value.company.name,
            province: value.company.province,
            company_size: value.company.company_size,
            verification_status: value.company.verification_status.as_str().to_owned(),
            industry_code: value
                .company
                .industry_code
                .map(|code| code.as_str().to_owned()),
            contact_status: value.company.contact_status,
            tags: value.company.tags,
            note: value.item.note().map(str::to_owned),
            position: value.item.position(),
            lead_score: value.item.lead_score(),
            status: value.item.status().as_str().to_owned(),
            added_at: value.item.added_at(),
            added_by_subject: value.item.added_by_subject().to_owned(),
        }
    }
}

/// One page of list items.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsResponse {
    pub items: Vec<ListItemResponse>,
    pub next_cursor: Option<String>,
}

impl From<ListItemsPage> for ListItemsResponse {
    fn from(value: ListItemsPage) -> Self {
        Self {
            items: value
                .items
                .into_iter()
                .map(ListItemResponse::from)
                .collect(),
            next_cursor: value.next_cursor,
        }
    }
}

/// One company with its score against the requested criteria.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCompanyResponse {
    pub company_id: String,
    pub name: String,
    pub province: String,
    pub company_size: String,
    pub score: u8,
    pub matching_summary: BTreeMap<&'static str, bool>,
}

impl From<RankedCompany> for RankedCompanyResponse {
    fn from(value: RankedCompany) -> Self {
        Self {
            company_id: value.company.company_id.as_str().to_owned(),
            name: value.company.name,
            province: value.company.province,
            company_size: value.company.company_size,
            score: value.breakdown.score,
            matching_summary: value
                .breakdown
                .matching_summary
                .into_iter()
                .map(|(criterion, matched)| (criterion.as_str(), matched))
                .collect(),
        }
    }
}

fn id_strings(company_ids: Vec<CompanyId>) -> Vec<String> {
    company_ids
        .into_iter()
        .map(|id| id.as_str().to_owned())
        .collect()
}
