use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use prospectra_core::{AppError, AppResult, NonEmptyString, OrganizationId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::company::CompanyId;
use crate::scoring::ScoreCriteria;

/// Stable identifier for a company list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListId(Uuid);

impl ListId {
    /// Creates a random list identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a list identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ListId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ListId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Stable identifier for a list membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Creates a random item identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an item identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ItemId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Sharing scope of a company list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListVisibility {
    /// Visible to the owner only.
    Private,
    /// Visible to the owner's team.
    Team,
    /// Visible to every member of the organization.
    Organization,
    /// Visible beyond the organization.
    Public,
}

impl ListVisibility {
    /// Returns a stable storage value for this visibility.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Team => "team",
            Self::Organization => "organization",
            Self::Public => "public",
        }
    }
}

impl FromStr for ListVisibility {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "private" => Ok(Self::Private),
            "team" => Ok(Self::Team),
            "organization" => Ok(Self::Organization),
            "public" => Ok(Self::Public),
            _ => Err(AppError::Validation(format!(
                "unknown list visibility '{value}'"
            ))),
        }
    }
}

/// A saved list of companies owned by an organization member.
///
/// `total_companies` is denormalized and must equal the count of live
/// membership rows at all times; repositories adjust it in the same
/// transaction as any membership mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyList {
    id: ListId,
    organization_id: OrganizationId,
    name: NonEmptyString,
    owner_subject: String,
    visibility: ListVisibility,
    is_shared: bool,
    total_companies: i64,
    is_smart_list: bool,
    smart_criteria: Option<ScoreCriteria>,
}

impl CompanyList {
    /// Creates a new empty list with validated fields.
    pub fn new(
        organization_id: OrganizationId,
        name: impl Into<String>,
        owner_subject: impl Into<String>,
        visibility: ListVisibility,
        is_shared: bool,
        smart_criteria: Option<ScoreCriteria>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: ListId::new(),
            organization_id,
            name: NonEmptyString::new(name)?,
            owner_subject: owner_subject.into(),
            visibility,
            is_shared,
            total_companies: 0,
            is_smart_list: smart_criteria.is_some(),
            smart_criteria,
        })
    }

    /// Restores a list from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ListId,
        organization_id: OrganizationId,
        name: impl Into<String>,
        owner_subject: impl Into<String>,
        visibility: ListVisibility,
        is_shared: bool,
        total_companies: i64,
        smart_criteria: Option<ScoreCriteria>,
    ) -> AppResult<Self> {
        if total_companies < 0 {
            return Err(AppError::Validation(
                "total_companies must not be negative".to_owned(),
            ));
        }

        Ok(Self {
            id,
            organization_id,
            name: NonEmptyString::new(name)?,
            owner_subject: owner_subject.into(),
            visibility,
            is_shared,
            total_companies,
            is_smart_list: smart_criteria.is_some(),
            smart_criteria,
        })
    }

    /// Returns the list identifier.
    #[must_use]
    pub fn id(&self) -> ListId {
        self.id
    }

    /// Returns the owning organization.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the list name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the subject that owns the list.
    #[must_use]
    pub fn owner_subject(&self) -> &str {
        self.owner_subject.as_str()
    }

    /// Returns the sharing scope.
    #[must_use]
    pub fn visibility(&self) -> ListVisibility {
        self.visibility
    }

    /// Returns whether the owner marked the list as shared.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.is_shared
    }

    /// Returns the denormalized live membership count.
    #[must_use]
    pub fn total_companies(&self) -> i64 {
        self.total_companies
    }

    /// Returns whether membership is recomputed from stored criteria.
    #[must_use]
    pub fn is_smart_list(&self) -> bool {
        self.is_smart_list
    }

    /// Returns the stored smart-list criteria, if any.
    #[must_use]
    pub fn smart_criteria(&self) -> Option<&ScoreCriteria> {
        self.smart_criteria.as_ref()
    }
}

/// Pipeline status of one company within a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Freshly added, not yet worked.
    New,
    /// First contact made.
    Contacted,
    /// Qualified as a viable prospect.
    Qualified,
    /// Converted to a customer.
    Converted,
    /// Rejected as a prospect.
    Rejected,
}

impl MembershipStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Converted => "converted",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for MembershipStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "qualified" => Ok(Self::Qualified),
            "converted" => Ok(Self::Converted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown membership status '{value}'"
            ))),
        }
    }
}

/// One live membership row: a company's place in a list.
///
/// `(list_id, company_id)` is unique; a company cannot appear twice in the
/// same list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyListItem {
    item_id: ItemId,
    list_id: ListId,
    company_id: CompanyId,
    note: Option<String>,
    position: i64,
    lead_score: f64,
    status: MembershipStatus,
    added_at: DateTime<Utc>,
    added_by_subject: String,
}

impl CompanyListItem {
    /// Creates a fresh membership row for a newly added company.
    #[must_use]
    pub fn added_now(
        list_id: ListId,
        company_id: CompanyId,
        note: Option<String>,
        position: i64,
        added_by_subject: impl Into<String>,
    ) -> Self {
        Self {
            item_id: ItemId::new(),
            list_id,
            company_id,
            note,
            position,
            lead_score: 0.0,
            status: MembershipStatus::New,
            added_at: Utc::now(),
            added_by_subject: added_by_subject.into(),
        }
    }

    /// Restores a membership row from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        item_id: ItemId,
        list_id: ListId,
        company_id: CompanyId,
        note: Option<String>,
        position: i64,
        lead_score: f64,
        status: MembershipStatus,
        added_at: DateTime<Utc>,
        added_by_subject: impl Into<String>,
    ) -> AppResult<Self> {
        if !(0.0..=100.0).contains(&lead_score) {
            return Err(AppError::Validation(format!(
                "lead score {lead_score} is outside the 0-100 range"
            )));
        }

        Ok(Self {
            item_id,
            list_id,
            company_id,
            note,
            position,
            lead_score,
            status,
            added_at,
            added_by_subject: added_by_subject.into(),
        })
    }

    /// Returns the membership row identifier.
    #[must_use]
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Returns the list this row belongs to.
    #[must_use]
    pub fn list_id(&self) -> ListId {
        self.list_id
    }

    /// Returns the company this row tracks.
    #[must_use]
    pub fn company_id(&self) -> &CompanyId {
        &self.company_id
    }

    /// Returns the free-form note captured on add.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Returns the manual ordering position within the list.
    #[must_use]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Returns the stored lead score (0-100).
    #[must_use]
    pub fn lead_score(&self) -> f64 {
        self.lead_score
    }

    /// Returns the pipeline status.
    #[must_use]
    pub fn status(&self) -> MembershipStatus {
        self.status
    }

    /// Returns when the company was added to the list.
    #[must_use]
    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Returns the subject that added the company.
    #[must_use]
    pub fn added_by_subject(&self) -> &str {
        self.added_by_subject.as_str()
    }
}

/// Why a requested bulk operation did not apply to a company identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// The company is already a live member of the list.
    Duplicate,
    /// The company does not exist in the registry.
    NotFound,
}

impl SkipReason {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "DUPLICATE",
            Self::NotFound => "NOT_FOUND",
        }
    }
}
