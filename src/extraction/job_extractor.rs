// src/extraction/job_extractor.rs
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use super::parsing::{detect_category, parse_budget_text, parse_date_text};
use super::ExtractError;
use crate::types::{Budget, JobRecord};

static CONTAINER: LazyLock<Selector> = LazyLock::new(|| selector("div.UNzN7"));
static TITLE_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("div.rGkuO"));
static BUDGET_ROW: LazyLock<Selector> = LazyLock::new(|| selector("div.mLant"));
static DATE_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("div.cAtkF"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

const POSTED_DATE_DELIMITER: &str = "掲載日：";
const UNKNOWN_CLIENT: &str = "不明";
const PR_MARKER: &str = "PR";
const BUDGET_MARKERS: &[&str] = &["円", "報酬", "¥"];
const DEADLINE_MARKER: &str = "まで";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// Turns rendered listing pages into job records.
#[derive(Debug, Clone, Default)]
pub struct JobExtractor {
    base_url: Option<Url>,
}

impl JobExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative posting links against `base_url`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        match Url::parse(base_url) {
            Ok(url) => self.base_url = Some(url),
            Err(e) => warn!("Ignoring invalid base URL {}: {}", base_url, e),
        }
        self
    }

    /// Extract every parseable posting from one document.
    ///
    /// A container that fails to parse is logged and skipped; it never
    /// aborts the rest of the document.
    pub fn extract_jobs(&self, html: &str) -> Vec<JobRecord> {
        let document = Html::parse_document(html);
        let mut jobs = Vec::new();
        let mut skipped = 0usize;

        for (index, container) in document.select(&CONTAINER).enumerate() {
            match self.parse_container(container) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping posting #{}: {}", index, e);
                }
            }
        }

        info!(
            "Extracted {} job(s) from document ({} skipped)",
            jobs.len(),
            skipped
        );
        jobs
    }

    /// Number of posting containers in a document, parseable or not.
    pub fn count_containers(html: &str) -> usize {
        Html::parse_document(html).select(&CONTAINER).count()
    }

    fn parse_container(&self, container: ElementRef<'_>) -> Result<JobRecord, ExtractError> {
        let title_block = container
            .select(&TITLE_BLOCK)
            .next()
            .ok_or(ExtractError::MissingElement("title block"))?;
        let client_name = split_client_name(&collapse_whitespace(&title_block.text().collect::<String>()));

        let lines = text_lines(container);
        let (title, is_pr, body_start) = split_title(&lines)?;
        let category = detect_category(&title);

        let mut budget = None;
        let mut deadline = None;
        for row in container.select(&BUDGET_ROW) {
            let text = collapse_whitespace(&row.text().collect::<Vec<_>>().join(" "));
            if BUDGET_MARKERS.iter().any(|m| text.contains(m)) {
                budget = Some(parse_budget_text(&text));
            } else if text.contains(DEADLINE_MARKER) {
                deadline = Some(text);
            }
        }

        let posted_date = match container.select(&DATE_BLOCK).next() {
            Some(block) => Some(parse_date_text(&block.text().collect::<String>())?),
            None => None,
        };

        let description = lines[body_start..]
            .iter()
            .filter(|line| !is_marker_line(line))
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        let url = container
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| self.resolve_link(href));

        debug!("Parsed posting '{}' from {}", title, client_name);

        Ok(JobRecord {
            title,
            category,
            description,
            budget: budget.unwrap_or_else(Budget::unknown),
            deadline,
            posted_date,
            client_name,
            url,
            is_pr,
        })
    }

    fn resolve_link(&self, href: &str) -> String {
        match &self.base_url {
            Some(base) => base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

/// Trimmed, non-empty text lines of an element, in document order.
fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .flat_map(|node| node.lines())
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Client name is everything before the posted-date delimiter.
fn split_client_name(block_text: &str) -> String {
    block_text
        .split_once(POSTED_DATE_DELIMITER)
        .map(|(client, _)| client.trim())
        .filter(|client| !client.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Returns the title, whether it carried the promotional marker, and the
/// index of the first description line.
fn split_title(lines: &[String]) -> Result<(String, bool, usize), ExtractError> {
    let first = lines.first().ok_or(ExtractError::EmptyTitle)?;

    // The badge is its own token: "PR記事作成" is an ordinary title.
    let badge = first
        .strip_prefix(PR_MARKER)
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));
    let Some(rest) = badge else {
        return Ok((first.clone(), false, 1));
    };

    let rest = rest.trim();
    if !rest.is_empty() {
        return Ok((rest.to_string(), true, 1));
    }

    // Badge rendered as its own element: the title is the next line.
    let title = lines.get(1).ok_or(ExtractError::EmptyTitle)?;
    Ok((title.clone(), true, 2))
}

fn is_marker_line(line: &str) -> bool {
    line.contains("円") || line.contains(DEADLINE_MARKER) || line.contains(POSTED_DATE_DELIMITER)
}
