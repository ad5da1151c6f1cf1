//! Workflow extraction strategies.
//!
//! Each strategy is an independent heuristic that either produces a
//! candidate workflow or `None`. The [`StrategyChain`] runs them strictly
//! in order and stops at the first candidate that passes the schema gate.

mod dom_attribute;
pub(crate) mod globals;
pub(crate) mod host_api;
mod page_text;
mod visible_json;

use std::sync::Arc;

use async_trait::async_trait;
use flowpilot_protocols::PageDom;
use serde_json::Value;
use tracing::{debug, info};

use crate::validator::is_valid_workflow;
use crate::world::WorldClient;

pub use dom_attribute::DomAttributeStrategy;
pub use globals::GlobalStateStrategy;
pub use host_api::HostApiStrategy;
pub use page_text::PageTextStrategy;
pub use visible_json::VisibleJsonStrategy;

/// One way of finding the editor's workflow in a page.
///
/// Strategies swallow their own failures: a missing element, a parse
/// error or a timeout all come back as `None`.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self) -> Option<Value>;
}

/// Strategies in priority order.
pub struct StrategyChain {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// DOM attributes, page globals, visible JSON, page text, host API.
    pub fn standard(dom: Arc<dyn PageDom>, world: WorldClient) -> Self {
        Self::new(vec![
            Box::new(DomAttributeStrategy::new(dom.clone())),
            Box::new(GlobalStateStrategy::new(world.clone())),
            Box::new(VisibleJsonStrategy::new(dom.clone())),
            Box::new(PageTextStrategy::new(dom)),
            Box::new(HostApiStrategy::new(world)),
        ])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First schema-valid candidate, if any strategy finds one.
    pub async fn run(&self) -> Option<Value> {
        for strategy in &self.strategies {
            debug!("Trying extraction strategy: {}", strategy.name());
            match strategy.extract().await {
                Some(candidate) if is_valid_workflow(&candidate) => {
                    info!("Workflow extracted by {}", strategy.name());
                    return Some(candidate);
                }
                Some(_) => debug!("{} produced a candidate without a nodes array", strategy.name()),
                None => debug!("{} found nothing", strategy.name()),
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
