// src/types/job.rs
//! Job posting records produced by the extractor

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ===== Budget =====

/// Compensation model of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetType {
    FixedPrice,
    Hourly,
    Other,
    /// No budget row was present on the posting
    Unknown,
}

impl BudgetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetType::FixedPrice => "fixed-price",
            BudgetType::Hourly => "hourly",
            BudgetType::Other => "other",
            BudgetType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BudgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BudgetFields")]
pub struct Budget {
    #[serde(rename = "type")]
    pub budget_type: BudgetType,
    pub min_amount: Option<u64>,
    pub max_amount: Option<u64>,
    pub is_negotiable: bool,
}

/// Wire shape of [`Budget`], checked before it becomes one.
#[derive(Deserialize)]
struct BudgetFields {
    #[serde(rename = "type")]
    budget_type: BudgetType,
    min_amount: Option<u64>,
    max_amount: Option<u64>,
    is_negotiable: bool,
}

impl TryFrom<BudgetFields> for Budget {
    type Error = String;

    fn try_from(fields: BudgetFields) -> Result<Self, Self::Error> {
        if let (Some(min), Some(max)) = (fields.min_amount, fields.max_amount) {
            if min > max {
                return Err(format!(
                    "budget min_amount {} exceeds max_amount {}",
                    min, max
                ));
            }
        }

        Ok(Self {
            budget_type: fields.budget_type,
            min_amount: fields.min_amount,
            max_amount: fields.max_amount,
            is_negotiable: fields.is_negotiable,
        })
    }
}

impl Budget {
    /// Build a budget from the amounts found in a budget row.
    ///
    /// One amount yields `min == max`; two or more collapse to their min and
    /// max; none leaves both bounds empty. `min_amount <= max_amount` holds for
    /// every budget built here.
    pub fn from_amounts(budget_type: BudgetType, amounts: &[u64], is_negotiable: bool) -> Self {
        let min_amount = amounts.iter().copied().min();
        let max_amount = amounts.iter().copied().max();

        Self {
            budget_type,
            min_amount,
            max_amount,
            is_negotiable,
        }
    }

    /// Placeholder for postings without any budget row.
    pub fn unknown() -> Self {
        Self {
            budget_type: BudgetType::Unknown,
            min_amount: None,
            max_amount: None,
            is_negotiable: true,
        }
    }

    pub fn is_fixed_price(&self) -> bool {
        self.budget_type == BudgetType::FixedPrice
    }

    /// Human readable range used in prompts, e.g. `50000-100000`.
    pub fn range_label(&self) -> String {
        match (self.min_amount, self.max_amount) {
            (Some(min), Some(max)) if min == max => min.to_string(),
            (Some(min), Some(max)) => format!("{}-{}", min, max),
            (Some(min), None) => format!("{}+", min),
            (None, Some(max)) => format!("up to {}", max),
            (None, None) if self.is_negotiable => "negotiable".to_string(),
            (None, None) => "not stated".to_string(),
        }
    }
}

// ===== Job record =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub category: Option<String>,
    pub description: String,
    pub budget: Budget,
    pub deadline: Option<String>,
    pub posted_date: Option<NaiveDate>,
    pub client_name: String,
    pub url: Option<String>,
    pub is_pr: bool,
}

impl JobRecord {
    /// Natural key used for deduplication.
    pub fn key(&self) -> (&str, &str) {
        (&self.title, &self.client_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::sample_job;

    #[test]
    fn test_budget_from_amounts_orders_bounds() {
        let budget = Budget::from_amounts(BudgetType::FixedPrice, &[100_000, 50_000], false);
        assert_eq!(budget.min_amount, Some(50_000));
        assert_eq!(budget.max_amount, Some(100_000));

        let single = Budget::from_amounts(BudgetType::Hourly, &[1_500], true);
        assert_eq!(single.min_amount, Some(1_500));
        assert_eq!(single.max_amount, Some(1_500));

        let empty = Budget::from_amounts(BudgetType::Other, &[], true);
        assert_eq!(empty.min_amount, None);
        assert_eq!(empty.max_amount, None);
    }

    #[test]
    fn test_budget_with_inverted_bounds_is_rejected() {
        let inverted = r#"{"type":"fixed-price","min_amount":90000,"max_amount":10000,"is_negotiable":false}"#;
        let err = serde_json::from_str::<Budget>(inverted).unwrap_err();
        assert!(err.to_string().contains("exceeds max_amount"));

        let valid = r#"{"type":"fixed-price","min_amount":10000,"max_amount":90000,"is_negotiable":false}"#;
        let budget: Budget = serde_json::from_str(valid).unwrap();
        assert_eq!(budget.min_amount, Some(10_000));
    }

    #[test]
    fn test_budget_type_serializes_kebab_case() {
        let json = serde_json::to_string(&BudgetType::FixedPrice).unwrap();
        assert_eq!(json, "\"fixed-price\"");
        assert_eq!(BudgetType::Hourly.to_string(), "hourly");
    }

    #[test]
    fn test_job_record_json_round_trip() {
        let job = sample_job();
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"posted_date\":\"2025-06-20\""));
        assert!(json.contains("\"type\":\"fixed-price\""));

        let back: JobRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_missing_posted_date_serializes_as_null() {
        let mut job = sample_job();
        job.posted_date = None;
        let value = serde_json::to_value(&job).unwrap();
        assert!(value["posted_date"].is_null());
    }

    #[test]
    fn test_range_label() {
        assert_eq!(sample_job().budget.range_label(), "50000-100000");
        assert_eq!(Budget::unknown().range_label(), "negotiable");
    }
}
