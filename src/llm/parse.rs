//! Parsing of free-form model responses into typed payloads.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::models::{Clause, ClauseImportance, RiskReport};
use crate::services::ServiceError;

const MAX_KEY_POINTS: usize = 10;
const MAX_PER_CATEGORY: usize = 20;
/// Quoted clause text at or below this many characters is noise.
const MIN_CLAUSE_CHARS: usize = 20;
const MAX_QUESTIONS: usize = 10;
/// Fewer suggestions than this get topped up with generic questions...
const MIN_QUESTIONS: usize = 6;
/// ...up to this many.
const TOPPED_UP_QUESTIONS: usize = 8;

fn is_numbered(line: &str, max: u32) -> bool {
    let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
    !digits.is_empty()
        && line[digits.len()..].starts_with('.')
        && digits.parse::<u32>().is_ok_and(|n| (1..max).contains(&n))
}

fn is_bullet(line: &str) -> bool {
    line.starts_with('•') || line.starts_with('-') || line.starts_with('*')
}

/// Drop a leading bullet or `N.` marker.
fn strip_marker(line: &str) -> &str {
    let rest = if is_bullet(line) {
        line.trim_start_matches(['-', '*', '•'])
    } else {
        line.trim_start_matches(|c: char| c.is_ascii_digit())
            .strip_prefix('.')
            .unwrap_or(line)
    };
    rest.trim()
}

/// Key points of a summary: list items or lines flagged as key, important
/// or critical.
pub fn key_points(summary: &str) -> Vec<String> {
    summary
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            is_bullet(line)
                || is_numbered(line, 6)
                || lower.contains("key")
                || lower.contains("important")
                || lower.contains("critical")
        })
        .filter(|line| line.chars().count() > 10)
        .take(MAX_KEY_POINTS)
        .map(str::to_string)
        .collect()
}

/// Bulleted or numbered lines of a response.
pub fn bullet_points(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && (is_bullet(line) || is_numbered(line, 100)))
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Copy)]
enum RiskSection {
    High,
    Medium,
    Recommendations,
    Compliance,
}

/// Split a sectioned risk analysis into its four lists.
pub fn risk_report(response: &str) -> RiskReport {
    let mut report = RiskReport::default();
    let mut section = None;

    for line in response.lines().map(str::trim) {
        let upper = line.to_uppercase();
        if upper.contains("HIGH RISK") {
            section = Some(RiskSection::High);
        } else if upper.contains("MEDIUM RISK") {
            section = Some(RiskSection::Medium);
        } else if upper.contains("RECOMMENDATIONS") {
            section = Some(RiskSection::Recommendations);
        } else if upper.contains("COMPLIANCE") {
            section = Some(RiskSection::Compliance);
        } else if let (true, Some(current)) = (is_bullet(line), section) {
            let item = strip_marker(line).to_string();
            if item.is_empty() {
                continue;
            }
            match current {
                RiskSection::High => report.high_risks.push(item),
                RiskSection::Medium => report.medium_risks.push(item),
                RiskSection::Recommendations => report.recommendations.push(item),
                RiskSection::Compliance => report.compliance_notes.push(item),
            }
        }
    }
    report
}

/// Parse a `{"CATEGORY": ["item", ...]}` response.
///
/// Falls back to `CATEGORY:` headings followed by list lines when the
/// response holds no parseable JSON object. Items are trimmed, single
/// characters dropped, duplicates removed (first occurrence wins) and each
/// category capped.
pub fn categorized_lists(
    response: &str,
    categories: &[&str],
) -> Result<BTreeMap<String, Vec<String>>, ServiceError> {
    if let Some(raw) = json_lists(response) {
        return Ok(clean(raw));
    }

    debug!("No JSON object in response, falling back to line parsing");
    let raw = heading_lists(response, categories);
    if raw.is_empty() {
        return Err(ServiceError::Parse(
            "response contained neither JSON nor category headings".to_string(),
        ));
    }
    Ok(clean(raw))
}

fn json_lists(response: &str) -> Option<Vec<(String, Vec<String>)>> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    let value: Value = serde_json::from_str(&response[start..=end]).ok()?;
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(category, items)| {
                let items = items.as_array()?;
                let strings = items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                Some((category.clone(), strings))
            })
            .collect(),
    )
}

fn heading_lists(response: &str, categories: &[&str]) -> Vec<(String, Vec<String>)> {
    let mut lists: Vec<(String, Vec<String>)> = Vec::new();

    for line in response.lines().map(str::trim) {
        let upper = line.to_uppercase();
        // A bullet is always an item, even when it names a category.
        if !is_bullet(line) && line.contains(':') {
            if let Some(category) = categories.iter().find(|c| upper.contains(**c)) {
                lists.push((category.to_string(), Vec::new()));
                continue;
            }
        }
        if let Some((_, items)) = lists.last_mut() {
            if is_bullet(line) || is_numbered(line, 20) {
                items.push(strip_marker(line).to_string());
            }
        }
    }
    lists
}

/// Parse a JSON array of clause objects.
///
/// Falls back to `TYPE:` lines naming a known clause type when the
/// response holds no parseable array. Entries without a type or with
/// clause text of `MIN_CLAUSE_CHARS` or fewer are dropped.
pub fn clauses(response: &str, clause_types: &[String]) -> Result<Vec<Clause>, ServiceError> {
    if let Some(items) = json_array(response) {
        return Ok(items.iter().filter_map(clause_from_json).collect());
    }

    debug!("No JSON array in clause response, falling back to line parsing");
    let found = clause_lines(response, clause_types);
    if found.is_empty() {
        return Err(ServiceError::Parse(
            "response contained neither a JSON array nor clause headings".to_string(),
        ));
    }
    Ok(found)
}

fn json_array(response: &str) -> Option<Vec<Value>> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end < start {
        return None;
    }
    match serde_json::from_str(&response[start..=end]).ok()? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn clause_from_json(item: &Value) -> Option<Clause> {
    let field = |name: &str| item.get(name).and_then(Value::as_str).map(str::trim);
    let clause_type = field("clause_type")?;
    let clause_text = field("clause_text")?;
    if clause_type.is_empty() || clause_text.chars().count() <= MIN_CLAUSE_CHARS {
        return None;
    }
    Some(Clause {
        clause_type: clause_type.to_uppercase(),
        clause_text: clause_text.to_string(),
        context: field("context").unwrap_or_default().to_string(),
        importance: field("importance")
            .map(ClauseImportance::parse)
            .unwrap_or_default(),
        section: field("section")
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
            .to_string(),
    })
}

fn clause_lines(response: &str, clause_types: &[String]) -> Vec<Clause> {
    let mut found: Vec<Clause> = Vec::new();

    for line in response.lines().map(str::trim) {
        let upper = line.to_uppercase();
        if line.contains(':') {
            if let Some(clause_type) = clause_types.iter().find(|t| upper.contains(t.as_str())) {
                found.push(Clause {
                    clause_type: clause_type.clone(),
                    clause_text: String::new(),
                    context: String::new(),
                    importance: ClauseImportance::Medium,
                    section: "Unknown".to_string(),
                });
                continue;
            }
        }
        let lower = line.to_lowercase();
        let is_label = ["type:", "context:", "importance:"]
            .iter()
            .any(|label| lower.contains(label));
        if let Some(current) = found.last_mut() {
            if !is_label && line.chars().count() > MIN_CLAUSE_CHARS {
                current.clause_text = strip_marker(line).to_string();
            }
        }
    }
    found.retain(|c| !c.clause_text.is_empty());
    found
}

/// Questions from a numbered or bulleted list, topped up with generic ones
/// when the model offers too few.
pub fn suggested_questions(response: &str, fallback: &[&str]) -> Vec<String> {
    let mut questions: Vec<String> = Vec::new();
    for line in response.lines().map(str::trim) {
        if !(is_bullet(line) || line.starts_with(|c: char| c.is_ascii_digit())) {
            continue;
        }
        let question = strip_marker(line);
        if question.chars().count() > 10
            && question.ends_with('?')
            && !questions.iter().any(|q| q == question)
        {
            questions.push(question.to_string());
        }
    }

    if questions.len() < MIN_QUESTIONS {
        for question in fallback {
            if questions.len() >= TOPPED_UP_QUESTIONS {
                break;
            }
            if !questions.iter().any(|q| q == question) {
                questions.push(question.to_string());
            }
        }
    }
    questions.truncate(MAX_QUESTIONS);
    questions
}

fn clean(raw: Vec<(String, Vec<String>)>) -> BTreeMap<String, Vec<String>> {
    let mut cleaned = BTreeMap::new();
    for (category, items) in raw {
        let mut kept: Vec<String> = Vec::new();
        for item in items {
            let item = item.trim();
            if item.chars().count() > 1 && !kept.iter().any(|k| k == item) {
                kept.push(item.to_string());
            }
            if kept.len() == MAX_PER_CATEGORY {
                break;
            }
        }
        if !kept.is_empty() {
            cleaned
                .entry(category)
                .or_insert_with(Vec::new)
                .extend(kept);
        }
    }
    cleaned
}
