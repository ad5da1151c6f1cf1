//! Structural mutation records reported by a page observer.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// What kind of DOM change a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    ChildList,
    Attributes,
}

/// An element added to the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedElement {
    #[serde(default)]
    pub classes: Vec<String>,

    /// Attribute names present on the element.
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Whether a `[data-workflow]` element sits anywhere below it.
    #[serde(default)]
    pub has_workflow_descendant: bool,
}

/// One mutation observer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRecord {
    pub kind: MutationKind,

    /// Changed attribute (attribute records).
    #[serde(default)]
    pub attribute_name: Option<String>,

    /// Classes of the record's target element.
    #[serde(default)]
    pub target_classes: Vec<String>,

    /// Added element nodes (child-list records); text nodes are dropped.
    #[serde(default)]
    pub added: Vec<AddedElement>,
}

impl MutationRecord {
    pub fn child_list(added: Vec<AddedElement>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            attribute_name: None,
            target_classes: Vec::new(),
            added,
        }
    }

    pub fn attribute(name: impl Into<String>, target_classes: Vec<String>) -> Self {
        Self {
            kind: MutationKind::Attributes,
            attribute_name: Some(name.into()),
            target_classes,
            added: Vec::new(),
        }
    }
}

/// Records delivered together by one observer callback.
pub type MutationBatch = Vec<MutationRecord>;

/// Stream of mutation batches; closes when the page goes away.
pub type MutationStream = mpsc::UnboundedReceiver<MutationBatch>;
