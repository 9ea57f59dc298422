use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::company::CompanySummary;

/// A company attribute that lead-scoring criteria can target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCriterion {
    /// TSIC industry classification code.
    Industrial,
    /// Province of the registered address.
    Province,
    /// Company size band.
    CompanySize,
    /// Latest recorded contact status.
    ContactStatus,
}

impl ScoreCriterion {
    /// Returns a stable transport value for this criterion.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Industrial => "industrial",
            Self::Province => "province",
            Self::CompanySize => "company_size",
            Self::ContactStatus => "contact_status",
        }
    }
}

/// Caller-supplied matching criteria for lead scoring.
///
/// Blank or whitespace-only values count as unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCriteria {
    /// Expected TSIC industry code.
    pub industrial: Option<String>,
    /// Expected province.
    pub province: Option<String>,
    /// Expected company size band.
    pub company_size: Option<String>,
    /// Expected contact status.
    pub contact_status: Option<String>,
}

impl ScoreCriteria {
    /// Returns the criteria that carry a non-blank value.
    #[must_use]
    pub fn specified(&self) -> Vec<(ScoreCriterion, &str)> {
        [
            (ScoreCriterion::Industrial, self.industrial.as_deref()),
            (ScoreCriterion::Province, self.province.as_deref()),
            (ScoreCriterion::CompanySize, self.company_size.as_deref()),
            (ScoreCriterion::ContactStatus, self.contact_status.as_deref()),
        ]
        .into_iter()
        .filter_map(|(criterion, value)| {
            value
                .filter(|value| !value.trim().is_empty())
                .map(|value| (criterion, value))
        })
        .collect()
    }

    /// Returns whether no criterion carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specified().is_empty()
    }
}

/// Score and per-criterion match outcome for one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Rounded percentage of specified criteria that matched (0-100).
    pub score: u8,
    /// Match outcome per specified criterion.
    pub matching_summary: BTreeMap<ScoreCriterion, bool>,
}

/// A company paired with its score against a set of criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCompany {
    /// The scored company.
    pub company: CompanySummary,
    /// Score and match outcome.
    pub breakdown: ScoreBreakdown,
}

/// Scores one company against the caller's criteria.
///
/// Each specified criterion is compared against the corresponding company
/// attribute with exact case-sensitive equality; the score is the rounded
/// percentage of criteria that matched. A partial match scores
/// proportionally rather than zero: the criteria rank prospects, they do
/// not filter them. No specified criteria yields a zero score and an
/// empty summary.
#[must_use]
pub fn score(company: &CompanySummary, criteria: &ScoreCriteria) -> ScoreBreakdown {
    let specified = criteria.specified();
    if specified.is_empty() {
        return ScoreBreakdown {
            score: 0,
            matching_summary: BTreeMap::new(),
        };
    }

    let mut matching_summary = BTreeMap::new();
    for (criterion, expected) in &specified {
        let actual = match criterion {
            ScoreCriterion::Industrial => company
                .industry_code
                .as_ref()
                .map(|code| code.as_str()),
            ScoreCriterion::Province => Some(company.province.as_str()),
            ScoreCriterion::CompanySize => Some(company.company_size.as_str()),
            ScoreCriterion::ContactStatus => company.contact_status.as_deref(),
        };

        matching_summary.insert(*criterion, actual == Some(*expected));
    }

    let matched = matching_summary.values().filter(|matched| **matched).count();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = ((matched as f64 * 100.0) / specified.len() as f64).round() as u8;

    ScoreBreakdown {
        score: rounded,
        matching_summary,
    }
}

/// Scores and ranks companies against the caller's criteria.
///
/// Companies are sorted by score descending. Equal scores are broken by
/// company name ascending, then company id ascending, so repeated calls
/// over the same data always return the same order.
#[must_use]
pub fn rank(companies: Vec<CompanySummary>, criteria: &ScoreCriteria) -> Vec<RankedCompany> {
    let mut ranked: Vec<RankedCompany> = companies
        .into_iter()
        .map(|company| {
            let breakdown = score(&company, criteria);
            RankedCompany { company, breakdown }
        })
        .collect();

    ranked.sort_by(|left, right| {
        right
            .breakdown
            .score
            .cmp(&left.breakdown.score)
            .then_with(|| left.company.name.cmp(&right.company.name))
            .then_with(|| left.company.company_id.cmp(&right.company.company_id))
    });

    ranked
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{ScoreCriteria, ScoreCriterion, rank, score};
    use crate::company::{CompanyId, CompanySummary, VerificationStatus};

    fn company(id: &str, name: &str, province: &str, company_size: &str) -> CompanySummary {
        CompanySummary {
            company_id: CompanyId::new(id).unwrap_or_else(|_| unreachable!()),
            name: name.to_owned(),
            province: province.to_owned(),
            company_size: company_size.to_owned(),
            verification_status: VerificationStatus::Verified,
            industry_code: None,
            contact_status: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn empty_criteria_scores_zero_with_empty_summary() {
        let result = score(
            &company("c-1", "Acme", "Bangkok", "M"),
            &ScoreCriteria::default(),
        );
        assert_eq!(result.score, 0);
        assert!(result.matching_summary.is_empty());
    }

    #[test]
    fn blank_criterion_values_count_as_unspecified() {
        let criteria = ScoreCriteria {
            province: Some("   ".to_owned()),
            ..ScoreCriteria::default()
        };
        let result = score(&company("c-1", "Acme", "Bangkok", "M"), &criteria);
        assert_eq!(result.score, 0);
        assert!(result.matching_summary.is_empty());
    }

    #[test]
    fn half_matching_criteria_score_fifty() {
        let criteria = ScoreCriteria {
            province: Some("Bangkok".to_owned()),
            company_size: Some("L".to_owned()),
            ..ScoreCriteria::default()
        };

        let result = score(&company("c-1", "Acme", "Bangkok", "M"), &criteria);
        assert_eq!(result.score, 50);
        assert_eq!(
            result.matching_summary.get(&ScoreCriterion::Province),
            Some(&true)
        );
        assert_eq!(
            result.matching_summary.get(&ScoreCriterion::CompanySize),
            Some(&false)
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        let criteria = ScoreCriteria {
            province: Some("bangkok".to_owned()),
            ..ScoreCriteria::default()
        };
        let result = score(&company("c-1", "Acme", "Bangkok", "M"), &criteria);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn one_of_three_rounds_to_thirty_three() {
        let criteria = ScoreCriteria {
            province: Some("Bangkok".to_owned()),
            company_size: Some("L".to_owned()),
            contact_status: Some("contacted".to_owned()),
            ..ScoreCriteria::default()
        };
        let result = score(&company("c-1", "Acme", "Bangkok", "M"), &criteria);
        assert_eq!(result.score, 33);
    }

    #[test]
    fn rank_sorts_by_score_then_name_then_id() {
        let criteria = ScoreCriteria {
            province: Some("Bangkok".to_owned()),
            ..ScoreCriteria::default()
        };

        let ranked = rank(
            vec![
                company("c-3", "Beta", "Chiang Mai", "M"),
                company("c-2", "Acme", "Bangkok", "M"),
                company("c-1", "Acme", "Bangkok", "M"),
            ],
            &criteria,
        );

        let order: Vec<&str> = ranked
            .iter()
            .map(|entry| entry.company.company_id.as_str())
            .collect();
        assert_eq!(order, vec!["c-1", "c-2", "c-3"]);
    }

    proptest! {
        #[test]
        fn score_stays_within_bounds(
            province in "[A-Za-z ]{0,12}",
            company_size in "[SML]",
            wanted_province in "[A-Za-z ]{1,12}",
            wanted_size in "[SML]",
        ) {
            let criteria = ScoreCriteria {
                province: Some(wanted_province),
                company_size: Some(wanted_size),
                ..ScoreCriteria::default()
            };
            let result = score(
                &company("c-1", "Acme", province.as_str(), company_size.as_str()),
                &criteria,
            );
            prop_assert!(result.score <= 100);
            prop_assert_eq!(result.matching_summary.len(), criteria.specified().len());
        }
    }
}
