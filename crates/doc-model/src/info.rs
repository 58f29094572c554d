//! Document-level info and output flags

use serde::{Deserialize, Serialize};

/// Descriptive metadata carried by a document
///
/// Every field is optional; absent fields are simply not propagated into
/// the rendered output's metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl DocumentInfo {
    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }
}

/// Output color space requested by the document
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Rgb,
    Cmyk,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_is_empty() {
        assert!(DocumentInfo::default().is_empty());

        let info = DocumentInfo {
            title: Some("Report".to_string()),
            ..Default::default()
        };
        assert!(!info.is_empty());
    }

    #[test]
    fn test_color_mode_serde() {
        let mode: ColorMode = serde_json::from_str("\"cmyk\"").unwrap();
        assert_eq!(mode, ColorMode::Cmyk);
        assert_eq!(serde_json::to_string(&ColorMode::Rgb).unwrap(), "\"rgb\"");
    }
}
