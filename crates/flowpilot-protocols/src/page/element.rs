//! DOM element snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A read-only copy of one matched element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Lower-case tag name.
    #[serde(default)]
    pub tag: String,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// `textContent`.
    #[serde(default)]
    pub text: String,

    /// `value` for form controls.
    #[serde(default)]
    pub value: Option<String>,

    /// Inline `style.transform`, when set.
    #[serde(default)]
    pub transform: Option<String>,

    /// Text of the element's `.node-name` descendant, when present.
    #[serde(default)]
    pub label: Option<String>,
}

impl ElementSnapshot {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_transform(mut self, transform: impl Into<String>) -> Self {
        self.transform = Some(transform.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attribute value, treating an empty string as absent.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// `dataset`-style view: `data-workflow-json` becomes `workflowJson`.
    pub fn dataset(&self) -> impl Iterator<Item = (String, &str)> {
        self.attributes.iter().filter_map(|(name, value)| {
            let key = name.strip_prefix("data-")?;
            Some((camel_case(key), value.as_str()))
        })
    }

    /// Form value if non-empty, otherwise the text content.
    pub fn value_or_text(&self) -> &str {
        match self.value.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => &self.text,
        }
    }
}

fn camel_case(dashed: &str) -> String {
    let mut out = String::with_capacity(dashed.len());
    let mut upper = false;
    for ch in dashed.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_ignores_empty() {
        let el = ElementSnapshot::new("div")
            .with_attr("data-workflow", "")
            .with_attr("content", "{}");
        assert_eq!(el.attr("data-workflow"), None);
        assert_eq!(el.attr("content"), Some("{}"));
    }

    #[test]
    fn test_dataset_keys_are_camel_cased() {
        let el = ElementSnapshot::new("div")
            .with_attr("data-workflow-json", "{}")
            .with_attr("data-nodes", "[]")
            .with_attr("class", "workflow-canvas");
        let keys: Vec<String> = el.dataset().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["nodes".to_string(), "workflowJson".to_string()]);
    }

    #[test]
    fn test_value_or_text() {
        let textarea = ElementSnapshot::new("textarea").with_value("").with_text("inner");
        assert_eq!(textarea.value_or_text(), "inner");
        let input = ElementSnapshot::new("input").with_value("typed");
        assert_eq!(input.value_or_text(), "typed");
    }
}
