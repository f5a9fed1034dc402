//! Prompt templates for legal document analysis.

use crate::models::{EntityExtractionType, SummaryType};

/// Entity categories requested for comprehensive extraction, with the
/// description given to the model.
pub const ENTITY_CATEGORIES: &[(&str, &str)] = &[
    ("PERSONS", "Names of individuals, lawyers, judges, witnesses"),
    ("ORGANIZATIONS", "Company names, law firms, courts, government bodies"),
    ("LOCATIONS", "Addresses, cities, states, countries, jurisdictions"),
    ("DATES", "Important dates, deadlines, effective dates"),
    ("MONETARY_VALUES", "Financial amounts, fees, damages, penalties"),
    ("LEGAL_REFERENCES", "Statutes, regulations, case law, legal codes"),
    ("AGREEMENTS", "Contract types, agreement names, legal instruments"),
    ("LEGAL_CONCEPTS", "Legal terms, causes of action, legal principles"),
];

pub const BASIC_ENTITY_CATEGORIES: &[&str] = &["PERSONS", "ORGANIZATIONS", "DATES", "LOCATIONS"];

pub const LEGAL_ENTITY_CATEGORIES: &[&str] = &[
    "CONTRACT_PARTIES",
    "LEGAL_DATES",
    "FINANCIAL_TERMS",
    "LEGAL_CITATIONS",
];

pub const RELATIONSHIP_CATEGORIES: &[&str] = &[
    "CONTRACTUAL_RELATIONSHIPS",
    "LEGAL_OBLIGATIONS",
    "AUTHORITY_RELATIONSHIPS",
    "FINANCIAL_RELATIONSHIPS",
];

/// Clause types searched by default, with the description given to the model.
pub const CLAUSE_TYPES: &[(&str, &str)] = &[
    ("TERMINATION", "Clauses related to contract termination, expiry, or cancellation"),
    ("PAYMENT", "Payment terms, fees, invoicing, and financial obligations"),
    ("INDEMNIFICATION", "Indemnity, liability, and hold harmless provisions"),
    ("CONFIDENTIALITY", "Non-disclosure and confidentiality requirements"),
    ("INTELLECTUAL_PROPERTY", "IP rights, ownership, and licensing terms"),
    ("FORCE_MAJEURE", "Force majeure and unforeseeable circumstances"),
    ("GOVERNING_LAW", "Jurisdiction, governing law, and dispute resolution"),
    ("WARRANTIES", "Warranties, representations, and guarantees"),
    ("LIMITATION_LIABILITY", "Liability limitations and damage caps"),
    ("ASSIGNMENT", "Assignment and transfer of rights provisions"),
    ("AMENDMENT", "Contract modification and amendment procedures"),
    ("DELIVERY", "Delivery terms, timelines, and performance obligations"),
];

/// Generic questions by topic, used to top up a short list of suggestions.
pub const CATEGORY_QUESTIONS: &[(&str, &[&str])] = &[
    (
        "parties",
        &[
            "Who are the parties to this agreement?",
            "What are the roles of each party?",
        ],
    ),
    (
        "terms",
        &[
            "What is the duration of this agreement?",
            "When does this contract expire?",
        ],
    ),
    (
        "payment",
        &[
            "What are the payment terms?",
            "How much will be paid and when?",
        ],
    ),
    (
        "termination",
        &[
            "How can this agreement be terminated?",
            "What notice period is required for termination?",
        ],
    ),
    (
        "obligations",
        &[
            "What are the main obligations of each party?",
            "What deliverables are expected?",
        ],
    ),
    (
        "legal",
        &[
            "What law governs this agreement?",
            "How are disputes resolved?",
        ],
    ),
];

/// Characters of the document shown to the model when suggesting questions.
pub const QUESTION_CONTEXT_CHARS: usize = 2000;

/// Categories expected back for an extraction type.
pub fn entity_categories(extraction_type: EntityExtractionType) -> Vec<&'static str> {
    match extraction_type {
        EntityExtractionType::Basic => BASIC_ENTITY_CATEGORIES.to_vec(),
        EntityExtractionType::LegalSpecific => LEGAL_ENTITY_CATEGORIES.to_vec(),
        EntityExtractionType::Comprehensive => {
            ENTITY_CATEGORIES.iter().map(|(name, _)| *name).collect()
        }
    }
}

fn json_example(categories: &[&str]) -> String {
    let fields: Vec<String> = categories
        .iter()
        .map(|c| format!("  \"{}\": [\"...\", \"...\"]", c))
        .collect();
    format!("{{\n{}\n}}", fields.join(",\n"))
}

pub fn summary_prompt(text: &str, summary_type: SummaryType) -> String {
    let instruction = match summary_type {
        SummaryType::Brief => {
            "Provide a brief summary (2-3 paragraphs) focusing on:\n\
             1. Document type and purpose\n\
             2. Main parties involved\n\
             3. Key obligations and terms"
        }
        SummaryType::Executive => {
            "Provide an executive summary (1 paragraph) highlighting:\n\
             1. Document essence in business terms\n\
             2. Critical legal implications\n\
             3. Key decision points"
        }
        SummaryType::Comprehensive => {
            "Provide a comprehensive summary including:\n\
             1. Document type, purpose, and context\n\
             2. All parties involved and their roles\n\
             3. Key provisions, clauses, and obligations\n\
             4. Important dates, deadlines, and milestones\n\
             5. Financial terms and considerations\n\
             6. Legal implications and potential risks\n\
             7. Compliance requirements\n\
             8. Termination and dispute resolution clauses"
        }
    };
    format!(
        "You are an expert legal analyst. Analyze the following legal document and provide a summary.\n\n\
         Document text:\n{text}\n\n{instruction}"
    )
}

pub fn bullet_points_prompt(text: &str) -> String {
    format!(
        "Extract the most important legal provisions from this document as concise bullet points.\n\
         Focus on actionable items, obligations, rights, and critical terms.\n\n\
         Document text: {text}\n\n\
         Return as a numbered list of bullet points."
    )
}

pub fn entity_prompt(text: &str, extraction_type: EntityExtractionType) -> String {
    let categories = entity_categories(extraction_type);
    let instruction = match extraction_type {
        EntityExtractionType::Basic => format!(
            "Extract entities in these categories: {}",
            categories.join(", ")
        ),
        EntityExtractionType::LegalSpecific => "Focus on extracting:\n\
             1. Contract parties and signatories\n\
             2. Legal deadlines and effective dates\n\
             3. Financial amounts and monetary terms\n\
             4. Legal references and citations"
            .to_string(),
        EntityExtractionType::Comprehensive => {
            let definitions: Vec<String> = ENTITY_CATEGORIES
                .iter()
                .map(|(name, desc)| format!("- {}: {}", name, desc))
                .collect();
            format!(
                "Extract entities in ALL these categories: {}\n\nCategory definitions:\n{}",
                categories.join(", "),
                definitions.join("\n")
            )
        }
    };
    format!(
        "Extract named entities from this legal document text. Return the results in valid JSON format.\n\n\
         Document text:\n{text}\n\n{instruction}\n\nReturn in this JSON format:\n{}",
        json_example(&categories)
    )
}

pub fn risk_prompt(text: &str) -> String {
    format!(
        "As a legal expert, analyze this document for potential legal risks and concerns.\n\n\
         Document text: {text}\n\n\
         Provide analysis in the following format:\n\n\
         HIGH RISK AREAS:\n- [List high-risk provisions or clauses]\n\n\
         MEDIUM RISK AREAS:\n- [List medium-risk provisions]\n\n\
         RECOMMENDATIONS:\n- [List recommended actions or considerations]\n\n\
         COMPLIANCE NOTES:\n- [List any compliance requirements or regulatory considerations]"
    )
}

pub fn relationship_prompt(text: &str) -> String {
    format!(
        "Analyze this legal document and identify key relationships between entities.\n\n\
         Document text: {text}\n\n\
         Identify:\n\
         1. CONTRACTUAL_RELATIONSHIPS: Who has agreements with whom\n\
         2. LEGAL_OBLIGATIONS: Who owes what to whom\n\
         3. AUTHORITY_RELATIONSHIPS: Who has authority over whom\n\
         4. FINANCIAL_RELATIONSHIPS: Who pays what to whom\n\n\
         Return as JSON with relationship descriptions:\n{}",
        json_example(RELATIONSHIP_CATEGORIES)
    )
}

pub fn comparison_prompt(left_text: &str, right_text: &str, left_name: &str, right_name: &str) -> String {
    format!(
        "Compare these two legal documents and provide a detailed analysis of their differences:\n\n\
         {left_name}:\n{left_text}\n\n\
         {right_name}:\n{right_text}\n\n\
         Provide analysis in the following format:\n\n\
         KEY DIFFERENCES:\n- [List major differences between documents]\n\n\
         SIMILAR PROVISIONS:\n- [List similar or identical provisions]\n\n\
         UNIQUE TO {left_upper}:\n- [List provisions only in the first document]\n\n\
         UNIQUE TO {right_upper}:\n- [List provisions only in the second document]\n\n\
         RECOMMENDATIONS:\n- [Recommendations based on the comparison]",
        left_upper = left_name.to_uppercase(),
        right_upper = right_name.to_uppercase(),
    )
}

/// Clause types to search: the requested ones, or every known type.
pub fn clause_types(requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        CLAUSE_TYPES.iter().map(|(name, _)| name.to_string()).collect()
    } else {
        requested.to_vec()
    }
}

pub fn clause_prompt(text: &str, clause_types: &[String]) -> String {
    let descriptions: Vec<String> = clause_types
        .iter()
        .map(|clause_type| {
            let description = CLAUSE_TYPES
                .iter()
                .find(|(name, _)| name == clause_type)
                .map(|(_, desc)| desc.to_string())
                .unwrap_or_else(|| format!("Clauses related to {}", clause_type));
            format!("- {}: {}", clause_type, description)
        })
        .collect();
    format!(
        "You are a legal expert analyzing a contract. Extract specific legal clauses from this document and provide their exact text with context.\n\n\
         Document text:\n{text}\n\n\
         Extract the following types of clauses:\n{}\n\n\
         For each clause found, return a JSON object with this structure:\n\
         {{\n\
           \"clause_type\": \"TYPE_NAME\",\n\
           \"clause_text\": \"The exact text of the clause\",\n\
           \"context\": \"Brief explanation of what this clause means\",\n\
           \"importance\": \"HIGH/MEDIUM/LOW\",\n\
           \"section\": \"Section or paragraph where found (if identifiable)\"\n\
         }}\n\n\
         Return all found clauses as a JSON array. If no clauses of a specific type are found, omit that type from the results.",
        descriptions.join("\n")
    )
}

pub fn question_prompt(text: &str) -> String {
    format!(
        "Analyze this legal document and suggest 8-10 important questions that someone might want to ask about it.\n\n\
         Document text:\n{text}\n\n\
         Based on the content, suggest practical questions that would help someone understand:\n\
         - Key terms and conditions\n\
         - Important dates and deadlines\n\
         - Responsibilities and obligations\n\
         - Financial terms\n\
         - Legal implications\n\n\
         Return as a simple numbered list of questions."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_prompt_lists_categories() {
        let prompt = entity_prompt("text", EntityExtractionType::Basic);
        assert!(prompt.contains("\"PERSONS\""));
        assert!(!prompt.contains("LEGAL_CONCEPTS"));

        let prompt = entity_prompt("text", EntityExtractionType::Comprehensive);
        assert!(prompt.contains("LEGAL_CONCEPTS: Legal terms"));
    }

    #[test]
    fn test_clause_prompt_describes_types() {
        let prompt = clause_prompt("text", &clause_types(&["PAYMENT".into(), "NON_COMPETE".into()]));
        assert!(prompt.contains("- PAYMENT: Payment terms"));
        assert!(prompt.contains("- NON_COMPETE: Clauses related to NON_COMPETE"));
        assert!(!prompt.contains("TERMINATION"));
        assert_eq!(clause_types(&[]).len(), CLAUSE_TYPES.len());
    }

    #[test]
    fn test_comparison_prompt_names_documents() {
        let prompt = comparison_prompt("a", "b", "lease.pdf", "amendment.docx");
        assert!(prompt.contains("UNIQUE TO LEASE.PDF"));
        assert!(prompt.contains("amendment.docx:\nb"));
    }
}
