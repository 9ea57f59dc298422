use std::fmt::{Display, Formatter};
use std::str::FromStr;

use prospectra_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Stable identifier for a company in the registry.
///
/// Registry identifiers are issued by an external source and treated as
/// opaque non-empty strings rather than UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(String);

impl CompanyId {
    /// Creates a validated company identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "company id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CompanyId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Five-digit TSIC industry classification code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndustryCode(String);

impl IndustryCode {
    /// Parses a TSIC code; the value must be exactly five ASCII digits.
    pub fn parse(value: &str) -> AppResult<Self> {
        if value.len() == 5 && value.bytes().all(|byte| byte.is_ascii_digit()) {
            return Ok(Self(value.to_owned()));
        }

        Err(AppError::Validation(format!(
            "invalid tsic code '{value}': expected exactly five digits"
        )))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Verification state of a company profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Profile has not been reviewed.
    Unverified,
    /// Review is in progress.
    Pending,
    /// Profile data has been verified.
    Verified,
}

impl VerificationStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Verified => "verified",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unverified" => Ok(Self::Unverified),
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            _ => Err(AppError::Validation(format!(
                "unknown verification status '{value}'"
            ))),
        }
    }
}

/// Read-only company projection used for scoring and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    /// Registry identifier.
    pub company_id: CompanyId,
    /// Registered company name.
    pub name: String,
    /// Province of the registered address.
    pub province: String,
    /// Size band, e.g. "S", "M", "L".
    pub company_size: String,
    /// Verification state of the profile.
    pub verification_status: VerificationStatus,
    /// TSIC industry classification, when known.
    pub industry_code: Option<IndustryCode>,
    /// Latest recorded contact status for this company, when any.
    pub contact_status: Option<String>,
    /// Free-form tag keys attached to the company.
    pub tags: Vec<String>,
}
