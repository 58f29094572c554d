//! Document JSON parsing

use crate::{Document, ModelError, Result};

/// Schema versions this crate understands
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Parse a document from a JSON string
pub fn parse_document(json: &str) -> Result<Document> {
    let document: Document =
        serde_json::from_str(json).map_err(|e| ModelError::ParseError(e.to_string()))?;

    if !SUPPORTED_VERSIONS.contains(&document.version.as_str()) {
        return Err(ModelError::UnsupportedVersion(document.version));
    }

    Ok(document)
}

/// Serialize a document to pretty-printed JSON
pub fn to_json(document: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let json = r#"{
            "version": "1.0",
            "sections": []
        }"#;

        let document = parse_document(json).unwrap();
        assert_eq!(document.version, "1.0");
        assert!(document.sections.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_version() {
        let json = r#"{ "version": "9.9", "sections": [] }"#;
        let result = parse_document(json);
        assert!(matches!(result, Err(ModelError::UnsupportedVersion(v)) if v == "9.9"));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let result = parse_document("{ not json");
        assert!(matches!(result, Err(ModelError::ParseError(_))));
    }

    #[test]
    fn test_round_trip() {
        let mut document = Document::new();
        let mut section = crate::Section::new(crate::PageSetup::default());
        section.add_paragraph("Hello");
        document.add_section(section);

        let json = to_json(&document).unwrap();
        let parsed = parse_document(&json).unwrap();
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.sections[0].blocks.len(), 1);
    }
}
