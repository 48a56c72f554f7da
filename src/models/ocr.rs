use garde::Validate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:html)?\s*(.*?)```").expect("valid regex"));

/// Optional form fields for `POST /ocr/process`.
#[derive(Debug, Clone, Default, Validate)]
pub struct ProcessOptions {
    /// Model to run; the service falls back to its active model when absent.
    #[garde(length(min = 1, max = 200))]
    pub model_name: Option<String>,

    #[garde(length(max = 20_000))]
    pub prompt: Option<String>,

    /// Free-form output template, e.g. a JSON skeleton.
    #[garde(length(max = 20_000))]
    pub template: Option<String>,
}

impl ProcessOptions {
    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Form fields to send, skipping unset and empty values.
    pub(crate) fn form_fields(&self) -> Vec<(&'static str, String)> {
        [
            ("model_name", &self.model_name),
            ("prompt", &self.prompt),
            ("template", &self.template),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (name, v.to_string()))
        })
        .collect()
    }
}

/// Result of a synchronous OCR call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrResponse {
    pub text: String,
    /// `plain`, `json`, `markdown` or `html`.
    pub format: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_boxes: Option<Vec<serde_json::Value>>,
}

impl OcrResponse {
    /// Text with a surrounding markdown code fence removed.
    pub fn cleaned_text(&self) -> String {
        if let Some(inner) = FENCED_BLOCK
            .captures(&self.text)
            .and_then(|c| c.get(1))
            .filter(|m| !m.as_str().trim().is_empty())
        {
            return inner.as_str().trim().to_string();
        }

        let text = self.text.trim();
        let text = text
            .strip_prefix("```html")
            .or_else(|| text.strip_prefix("```"))
            .unwrap_or(text);
        text.strip_suffix("```").unwrap_or(text).trim().to_string()
    }

    pub fn is_html(&self) -> bool {
        self.format == "html" || self.text.trim_start().starts_with('<') || self.text.contains("```html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(text: &str, format: &str) -> OcrResponse {
        OcrResponse {
            text: text.to_string(),
            format: format.to_string(),
            metadata: serde_json::Value::Null,
            bounding_boxes: None,
        }
    }

    #[test]
    fn test_cleaned_text_strips_html_fence() {
        let r = response("Here you go:\n```html\n<table><tr><td>1</td></tr></table>\n```\n", "plain");
        assert_eq!(r.cleaned_text(), "<table><tr><td>1</td></tr></table>");
        assert!(r.is_html());
    }

    #[test]
    fn test_cleaned_text_plain_passthrough() {
        let r = response("  JOHN DOE\n1990-01-01  ", "plain");
        assert_eq!(r.cleaned_text(), "JOHN DOE\n1990-01-01");
        assert!(!r.is_html());
    }

    #[test]
    fn test_unterminated_fence() {
        let r = response("```html\n<p>hi</p>", "plain");
        assert_eq!(r.cleaned_text(), "<p>hi</p>");
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let r: OcrResponse = serde_json::from_str(r#"{"text": "abc", "format": "plain"}"#).unwrap();
        assert!(r.metadata.is_null());
        assert!(r.bounding_boxes.is_none());
    }

    #[test]
    fn test_form_fields_skip_empty() {
        let opts = ProcessOptions::default().with_model("qwen3-vl:8b").with_prompt("");
        assert_eq!(opts.form_fields(), vec![("model_name", "qwen3-vl:8b".to_string())]);
    }

    #[test]
    fn test_validation_rejects_empty_model_name() {
        let opts = ProcessOptions::default().with_model("");
        assert!(opts.validate().is_err());
        assert!(ProcessOptions::default().validate().is_ok());
    }
}
