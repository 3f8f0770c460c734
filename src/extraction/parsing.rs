// src/extraction/parsing.rs
//! Text-level parsers for budget rows, posted dates and categories

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use super::ExtractError;
use crate::types::{Budget, BudgetType};

/// Categories recognised in posting titles, in priority order.
pub const CATEGORY_VOCABULARY: &[&str] = &[
    "AI・機械学習",
    "機械学習・ディープラーニング",
    "AI・チャットボット開発",
    "ChatGPT開発",
    "AIアノテーション",
    "データサイエンス",
];

const FIXED_PRICE_KEYWORDS: &[&str] = &["固定報酬制", "fixed-price"];
const HOURLY_KEYWORDS: &[&str] = &["時間単価制", "hourly"];
const NEGOTIABLE_KEYWORDS: &[&str] = &["相談", "negotiable"];

// Comma-grouped amounts first so "50,000" is not split into "50" and "000".
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+|\d+").expect("valid amount pattern"));

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})年(\d{2})月(\d{2})日").expect("valid date pattern"));

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

/// Parse a budget row such as `固定報酬制 50,000円 〜 100,000円`.
pub fn parse_budget_text(budget_text: &str) -> Budget {
    let text = budget_text.trim();

    let is_negotiable = contains_any(text, NEGOTIABLE_KEYWORDS);

    let budget_type = if contains_any(text, FIXED_PRICE_KEYWORDS) {
        BudgetType::FixedPrice
    } else if contains_any(text, HOURLY_KEYWORDS) {
        BudgetType::Hourly
    } else {
        BudgetType::Other
    };

    let amounts: Vec<u64> = AMOUNT_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', "").parse().ok())
        .collect();

    Budget::from_amounts(budget_type, &amounts, is_negotiable)
}

/// Parse a localized `YYYY年MM月DD日` date anywhere in `date_text`.
pub fn parse_date_text(date_text: &str) -> Result<NaiveDate, ExtractError> {
    let invalid = || ExtractError::InvalidDate(date_text.trim().to_string());

    let caps = DATE_RE.captures(date_text).ok_or_else(invalid)?;
    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let day: u32 = caps[3].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// First vocabulary category contained in the title.
pub fn detect_category(title: &str) -> Option<String> {
    CATEGORY_VOCABULARY
        .iter()
        .find(|category| title.contains(*category))
        .map(|category| category.to_string())
}
