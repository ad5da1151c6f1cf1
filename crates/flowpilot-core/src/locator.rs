//! Host-instance lookup.

use flowpilot_protocols::{ObjectRef, PageError, PageWorld};
use tracing::{debug, warn};

use crate::world::walk;

/// Names under which a host editor exposes itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProfile {
    /// Well-known globals, tried in order.
    pub globals: Vec<String>,
    /// Canvas root selectors, tried in order.
    pub canvas_selectors: Vec<String>,
    /// Lower-case keyword for the last-resort scan of global names.
    pub keyword: String,
    /// Global helper object with workflow mutation methods.
    pub helper_global: String,
}

impl Default for HostProfile {
    fn default() -> Self {
        Self {
            globals: vec!["n8n".to_string(), "$n8n".to_string()],
            canvas_selectors: vec![
                ".workflow-canvas".to_string(),
                ".n8n-workflow".to_string(),
                "#workflow-canvas".to_string(),
            ],
            keyword: "n8n".to_string(),
            helper_global: "n8nWorkflowHelpers".to_string(),
        }
    }
}

impl HostProfile {
    /// Profile for a host that publishes itself under `global`.
    pub fn with_global(mut self, global: impl Into<String>) -> Self {
        self.globals.insert(0, global.into());
        self
    }
}

/// A live host instance, opaque outside the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostHandle {
    /// A host object found directly.
    Instance(ObjectRef),
    /// Only a state store was found; it stands in as the instance's `$store`.
    Store(ObjectRef),
}

impl HostHandle {
    /// `handle.<path>`; a bare store exposes only `$store`.
    pub(crate) async fn member(
        &self,
        page: &dyn PageWorld,
        path: &[&str],
    ) -> Result<Option<ObjectRef>, PageError> {
        match self {
            Self::Instance(object) => walk(page, object, path).await,
            Self::Store(store) => match path.split_first() {
                Some((&"$store", rest)) => walk(page, store, rest).await,
                _ => Ok(None),
            },
        }
    }
}

/// Finds the host instance inside a page.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    profile: HostProfile,
}

impl Locator {
    pub fn new(profile: HostProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &HostProfile {
        &self.profile
    }

    /// Try, in order: the well-known globals, the canvas component, a store
    /// reachable from the first component in the document, then any global
    /// whose name contains the profile keyword and holds an object.
    pub async fn locate(&self, page: &dyn PageWorld) -> Option<HostHandle> {
        match self.try_locate(page).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Host instance lookup failed: {}", e);
                None
            }
        }
    }

    async fn try_locate(&self, page: &dyn PageWorld) -> Result<Option<HostHandle>, PageError> {
        for name in &self.profile.globals {
            if let Some(object) = page.global(name).await? {
                debug!("Host instance found at window.{}", name);
                return Ok(Some(HostHandle::Instance(object)));
            }
        }

        if let Some(canvas) = self.canvas_component(page).await? {
            debug!("Host instance found on the canvas component");
            return Ok(Some(HostHandle::Instance(canvas)));
        }

        if let Some(store) = first_component_store(page).await? {
            debug!("Host store found on a component");
            return Ok(Some(HostHandle::Store(store)));
        }

        for name in page.global_names().await? {
            if !name.to_lowercase().contains(&self.profile.keyword) {
                continue;
            }
            let Some(object) = page.global(&name).await? else {
                continue;
            };
            if page.is_function(&object).await? {
                debug!("Skipping window.{}: not an object", name);
                continue;
            }
            debug!("Host instance found by scanning window.{}", name);
            return Ok(Some(HostHandle::Instance(object)));
        }

        Ok(None)
    }

    /// Component on the first canvas root that has one.
    pub(crate) async fn canvas_component(
        &self,
        page: &dyn PageWorld,
    ) -> Result<Option<ObjectRef>, PageError> {
        for selector in &self.profile.canvas_selectors {
            if let Some(component) = page.element_component(selector).await? {
                return Ok(Some(component));
            }
        }
        Ok(None)
    }
}

/// `$store` of the first component in document order.
pub(crate) async fn first_component_store(
    page: &dyn PageWorld,
) -> Result<Option<ObjectRef>, PageError> {
    match page.first_component(None).await? {
        Some(component) => page.property(&component, "$store").await,
        None => Ok(None),
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
