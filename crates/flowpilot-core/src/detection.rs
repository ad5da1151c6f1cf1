//! Editor page detection.
//!
//! A page counts as an editor when at least one independent signal fires:
//! known editor elements, URL or title indicators, host globals, or a
//! script loaded from a path that names the host.

use std::sync::Arc;

use flowpilot_protocols::{PageDom, PageWorld};
use tracing::debug;

use crate::world::WorldClient;

const EDITOR_SELECTORS: &[&str] = &[
    ".n8n-workflow",
    ".workflow-canvas",
    "#n8n-editor",
    "[data-test-id=\"canvas-plus-button\"]",
    "[data-workflow]",
    ".node-create-dropdown",
    ".node-item",
    "#workflow-editor",
    ".workflow-editor",
    ".el-drawer__wrapper",
    ".workflow-name-wrapper",
    ".workflow-buttons",
    ".node-icon",
    ".node-connection",
];

const URL_INDICATORS: &[&str] = &[
    "n8n.io",
    "/n8n/",
    "/workflow/",
    "workflows",
    "execution",
    "n8n.cloud",
];

const TITLE_INDICATORS: &[&str] = &["n8n", "workflow", "flujo de trabajo", "automatización"];

const HOST_GLOBALS: &[&str] = &["n8n", "$n8n", "n8nWorkflow"];

const SCRIPT_KEYWORD: &str = "n8n";

/// Which detection signals fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionReport {
    pub elements: bool,
    pub url: bool,
    pub title: bool,
    pub globals: bool,
    pub scripts: bool,
}

impl DetectionReport {
    pub fn detected(&self) -> bool {
        self.signals().next().is_some()
    }

    /// Names of the positive signals.
    pub fn signals(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.elements, "elements"),
            (self.url, "url"),
            (self.title, "title"),
            (self.globals, "globals"),
            (self.scripts, "scripts"),
        ]
        .into_iter()
        .filter_map(|(fired, name)| fired.then_some(name))
    }
}

/// Runs the detection heuristics against one page.
#[derive(Clone)]
pub struct Detector {
    dom: Arc<dyn PageDom>,
    world: WorldClient,
}

impl Detector {
    pub fn new(dom: Arc<dyn PageDom>, world: WorldClient) -> Self {
        Self { dom, world }
    }

    /// Collect every signal. DOM read errors count as a negative signal.
    pub async fn detect(&self) -> DetectionReport {
        let report = DetectionReport {
            elements: self.has_editor_elements().await,
            url: self
                .dom
                .url()
                .await
                .is_ok_and(|url| URL_INDICATORS.iter().any(|i| url.contains(*i))),
            title: self.dom.title().await.is_ok_and(|title| {
                let title = title.to_lowercase();
                TITLE_INDICATORS.iter().any(|i| title.contains(*i))
            }),
            globals: self.world.has_host_globals().await,
            scripts: self.has_host_scripts().await,
        };

        let signals: Vec<_> = report.signals().collect();
        debug!("Detection signals: {:?}", signals);
        report
    }

    async fn has_editor_elements(&self) -> bool {
        for selector in EDITOR_SELECTORS {
            if self
                .dom
                .query_all(selector)
                .await
                .is_ok_and(|found| !found.is_empty())
            {
                return true;
            }
        }
        false
    }

    async fn has_host_scripts(&self) -> bool {
        self.dom.query_all("script").await.is_ok_and(|scripts| {
            scripts
                .iter()
                .any(|s| s.attr("src").is_some_and(|src| src.contains(SCRIPT_KEYWORD)))
        })
    }
}

/// Whether any host global is defined. Runs in the host-page context.
pub(crate) async fn host_globals_present(page: &dyn PageWorld) -> bool {
    for name in HOST_GLOBALS {
        match page.global(name).await {
            Ok(Some(_)) => return true,
            Ok(None) => {}
            Err(e) => debug!("Probing window.{} failed: {}", name, e),
        }
    }
    false
}
