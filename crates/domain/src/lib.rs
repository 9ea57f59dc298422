//! Domain entities and invariants for company prospecting.

#![forbid(unsafe_code)]

mod access;
mod company;
mod company_list;
mod scoring;

pub use access::{ListAction, can_access_list, keys};
pub use company::{CompanyId, CompanySummary, IndustryCode, VerificationStatus};
pub use company_list::{
    CompanyList, CompanyListItem, ItemId, ListId, ListVisibility, MembershipStatus, SkipReason,
};
pub use scoring::{RankedCompany, ScoreBreakdown, ScoreCriteria, ScoreCriterion, rank, score};
