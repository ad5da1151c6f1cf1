//! Host page capability traits.
//!
//! A page is reached from two sides. [`PageDom`] is the isolated side: it
//! can read the rendered document but not the page's own script objects.
//! [`PageWorld`] runs inside the host page's script context and works on
//! opaque [`ObjectRef`] handles to live objects.

mod element;
mod mutation;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PageError;

pub use element::ElementSnapshot;
pub use mutation::{AddedElement, MutationBatch, MutationKind, MutationRecord, MutationStream};

/// Opaque handle to a live object inside the host page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef(String);

impl ObjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only access to the rendered document.
#[async_trait]
pub trait PageDom: Send + Sync {
    /// Current page URL.
    async fn url(&self) -> Result<String, PageError>;

    /// Document title.
    async fn title(&self) -> Result<String, PageError>;

    /// Rendered plain text of the body.
    async fn page_text(&self) -> Result<String, PageError>;

    /// Snapshot every element matching a CSS selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, PageError>;

    /// Install a structural observer over the body and stream its batches.
    async fn watch_mutations(&self) -> Result<MutationStream, PageError>;
}

/// Object-level access inside the host page's own script context.
///
/// Lookups return `Ok(None)` when the target is absent, null, or not an
/// object or function. `Err` is reserved for transport and script failures.
#[async_trait]
pub trait PageWorld: PageDom {
    /// `window[name]`.
    async fn global(&self, name: &str) -> Result<Option<ObjectRef>, PageError>;

    /// Every enumerable property name of `window`.
    async fn global_names(&self) -> Result<Vec<String>, PageError>;

    /// `object[key]`.
    async fn property(&self, object: &ObjectRef, key: &str)
        -> Result<Option<ObjectRef>, PageError>;

    /// Whether `object[method]` is a function.
    async fn is_callable(&self, object: &ObjectRef, method: &str) -> Result<bool, PageError>;

    /// Whether `object` itself is a function.
    async fn is_function(&self, object: &ObjectRef) -> Result<bool, PageError>;

    /// Call `object[method](...args)`, awaiting a returned promise.
    /// Results that cannot be copied out come back as `Value::Null`.
    async fn invoke(
        &self,
        object: &ObjectRef,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, PageError>;

    /// `object[key] = value`.
    async fn assign(&self, object: &ObjectRef, key: &str, value: Value) -> Result<(), PageError>;

    /// A JSON copy of the object, or `None` if it cannot be serialized.
    async fn snapshot(&self, object: &ObjectRef) -> Result<Option<Value>, PageError>;

    /// Reactive component attached to the first element matching `selector`.
    async fn element_component(&self, selector: &str) -> Result<Option<ObjectRef>, PageError>;

    /// First component in document order, optionally one that carries `with_property`.
    async fn first_component(
        &self,
        with_property: Option<&str>,
    ) -> Result<Option<ObjectRef>, PageError>;

    /// Entries of the page's persistent local storage.
    async fn storage_entries(&self) -> Result<Vec<(String, String)>, PageError>;

    /// Same-origin `GET` parsed as JSON.
    async fn fetch_json(&self, path: &str) -> Result<Value, PageError>;

    /// Drop every object handle handed out so far. Refs obtained earlier
    /// must not be used afterwards.
    async fn release(&self) -> Result<(), PageError> {
        Ok(())
    }
}
