//! Analysis options shared by every document in a run.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Summary depth requested from the summarizer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
    #[default]
    Comprehensive,
    Brief,
    Executive,
}

impl SummaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Brief => "brief",
            Self::Executive => "executive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "comprehensive" => Some(Self::Comprehensive),
            "brief" => Some(Self::Brief),
            "executive" => Some(Self::Executive),
            _ => None,
        }
    }
}

/// Entity category set requested from the entity extractor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityExtractionType {
    Basic,
    #[default]
    Comprehensive,
    LegalSpecific,
}

impl EntityExtractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Comprehensive => "comprehensive",
            Self::LegalSpecific => "legal_specific",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "basic" => Some(Self::Basic),
            "comprehensive" => Some(Self::Comprehensive),
            "legal_specific" | "specific" => Some(Self::LegalSpecific),
            _ => None,
        }
    }
}

/// Which stages to run and how. Immutable for the duration of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub generate_summary: bool,
    pub summary_type: SummaryType,
    pub generate_bullet_points: bool,
    pub extract_entities: bool,
    pub entity_extraction_type: EntityExtractionType,
    pub analyze_risks: bool,
    pub extract_relationships: bool,
    pub extract_clauses: bool,
    /// Clause types to look for; empty means every known type.
    pub clause_types: Vec<String>,
    pub generate_qa_suggestions: bool,
    pub compare_documents: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            generate_summary: true,
            summary_type: SummaryType::default(),
            generate_bullet_points: true,
            extract_entities: true,
            entity_extraction_type: EntityExtractionType::default(),
            analyze_risks: true,
            extract_relationships: false,
            extract_clauses: true,
            clause_types: Vec::new(),
            generate_qa_suggestions: true,
            compare_documents: false,
        }
    }
}

impl AnalysisOptions {
    /// Options with every downstream stage disabled (extraction only).
    pub fn extraction_only() -> Self {
        Self {
            generate_summary: false,
            generate_bullet_points: false,
            extract_entities: false,
            analyze_risks: false,
            extract_relationships: false,
            extract_clauses: false,
            generate_qa_suggestions: false,
            compare_documents: false,
            ..Self::default()
        }
    }

    /// Every stage enabled, including comparison.
    pub fn all() -> Self {
        Self {
            extract_relationships: true,
            compare_documents: true,
            ..Self::default()
        }
    }

    /// Build options from loosely-typed key/value pairs, starting from the
    /// defaults. Unknown keys and unparseable values are rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref();
            match key {
                "summary_type" => {
                    options.summary_type = SummaryType::from_str(value)
                        .ok_or_else(|| invalid_value(key, value))?;
                }
                "entity_extraction_type" => {
                    options.entity_extraction_type = EntityExtractionType::from_str(value)
                        .ok_or_else(|| invalid_value(key, value))?;
                }
                "generate_summary" => options.generate_summary = parse_flag(key, value)?,
                "generate_bullet_points" => {
                    options.generate_bullet_points = parse_flag(key, value)?
                }
                "extract_entities" => options.extract_entities = parse_flag(key, value)?,
                "analyze_risks" => options.analyze_risks = parse_flag(key, value)?,
                "extract_relationships" => {
                    options.extract_relationships = parse_flag(key, value)?
                }
                "extract_clauses" => options.extract_clauses = parse_flag(key, value)?,
                "clause_types" => options.clause_types = parse_clause_types(key, value)?,
                "generate_qa_suggestions" => {
                    options.generate_qa_suggestions = parse_flag(key, value)?
                }
                "compare_documents" => options.compare_documents = parse_flag(key, value)?,
                other => {
                    return Err(AnalysisError::InvalidOptions(format!(
                        "unknown option '{}'",
                        other
                    )))
                }
            }
        }
        Ok(options)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, AnalysisError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid_value(key, value)),
    }
}

/// Comma-separated clause type names, normalized to `UPPER_SNAKE`.
fn parse_clause_types(key: &str, value: &str) -> Result<Vec<String>, AnalysisError> {
    let types: Vec<String> = value
        .split(',')
        .map(|t| t.trim().to_uppercase().replace([' ', '-'], "_"))
        .filter(|t| !t.is_empty())
        .collect();
    if types.is_empty() {
        return Err(invalid_value(key, value));
    }
    Ok(types)
}

fn invalid_value(key: &str, value: &str) -> AnalysisError {
    AnalysisError::InvalidOptions(format!("invalid value '{}' for '{}'", value, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_option_set() {
        let options = AnalysisOptions::default();
        assert!(options.generate_summary);
        assert!(options.extract_entities);
        assert!(options.analyze_risks);
        assert!(options.generate_bullet_points);
        assert!(!options.extract_relationships);
        assert!(options.extract_clauses);
        assert!(options.clause_types.is_empty());
        assert!(options.generate_qa_suggestions);
        assert!(!options.compare_documents);
        assert_eq!(options.summary_type, SummaryType::Comprehensive);
        assert_eq!(
            options.entity_extraction_type,
            EntityExtractionType::Comprehensive
        );
    }

    #[test]
    fn test_from_pairs() {
        let options = AnalysisOptions::from_pairs([
            ("summary_type", "executive"),
            ("entity_extraction_type", "legal_specific"),
            ("extract_relationships", "true"),
            ("analyze_risks", "no"),
            ("clause_types", "payment, force-majeure"),
            ("generate_qa_suggestions", "off"),
        ])
        .unwrap();
        assert_eq!(options.clause_types, vec!["PAYMENT", "FORCE_MAJEURE"]);
        assert!(!options.generate_qa_suggestions);
        assert_eq!(options.summary_type, SummaryType::Executive);
        assert_eq!(
            options.entity_extraction_type,
            EntityExtractionType::LegalSpecific
        );
        assert!(options.extract_relationships);
        assert!(!options.analyze_risks);
    }

    #[test]
    fn test_from_pairs_rejects_malformed() {
        assert!(matches!(
            AnalysisOptions::from_pairs([("summary_type", "haiku")]),
            Err(AnalysisError::InvalidOptions(_))
        ));
        assert!(matches!(
            AnalysisOptions::from_pairs([("analyze_risks", "maybe")]),
            Err(AnalysisError::InvalidOptions(_))
        ));
        assert!(matches!(
            AnalysisOptions::from_pairs([("extract_obligations", "true")]),
            Err(AnalysisError::InvalidOptions(_))
        ));
        assert!(matches!(
            AnalysisOptions::from_pairs([("clause_types", " , ")]),
            Err(AnalysisError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let options: AnalysisOptions =
            serde_json::from_str(r#"{"summary_type":"brief"}"#).unwrap();
        assert_eq!(options.summary_type, SummaryType::Brief);
        assert!(options.generate_summary);
    }
}
