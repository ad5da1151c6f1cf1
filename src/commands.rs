//! Subcommand handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use flowpilot_config::Config;
use flowpilot_core::notify::CURRENT_WORKFLOW_KEY;
use flowpilot_core::{HostProfile, LogNotifier, PersistingNotifier, Router, Session, WorldClient};
use flowpilot_page_cdp::CdpPage;
use flowpilot_protocols::{ApplyResult, JsonPayload, Request, Response, WorkflowNotifier};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::Commands;
use crate::store::FileStore;

/// Attach to the editor tab and build a session over it.
async fn open_session(
    config: &Config,
    notifier: Arc<dyn WorkflowNotifier>,
) -> anyhow::Result<Session> {
    let page = Arc::new(
        CdpPage::attach(&config.browser)
            .await
            .with_context(|| format!("attaching to {}", config.browser.endpoint))?,
    );
    let world = WorldClient::start(page.clone(), HostProfile::default(), config.bridge.clone());
    Ok(Session::builder(page, world, notifier)
        .with_config(config.detection.clone(), config.extraction.clone())
        .build())
}

pub(crate) async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Detect => detect(&router(&config).await?).await,
        Commands::Extract { output } => extract(&router(&config).await?, output.as_deref()).await,
        Commands::Apply { file } => {
            let workflow = JsonPayload::Text(read(&file)?);
            applied(router(&config).await?.handle(Request::ApplyWorkflow { workflow }).await)
        }
        Commands::ApplyChanges { file, original } => {
            let changes = JsonPayload::Text(read(&file)?);
            let original_workflow = original
                .as_deref()
                .map(read)
                .transpose()?
                .map(JsonPayload::Text);
            let request = Request::ApplyChanges {
                changes,
                original_workflow,
            };
            applied(router(&config).await?.handle(request).await)
        }
        Commands::NodeTypes => match router(&config).await?.handle(Request::GetNodeTypes).await {
            Response::NodeTypes { node_types } => {
                for node_type in node_types {
                    println!("{}", node_type);
                }
                Ok(())
            }
            other => unexpected(other),
        },
        Commands::Credentials => {
            match router(&config).await?.handle(Request::GetCredentials).await {
                Response::Credentials { credentials } => {
                    for credential in credentials {
                        println!(
                            "{}\t{}\t{}",
                            credential.id, credential.name, credential.credential_type
                        );
                    }
                    Ok(())
                }
                other => unexpected(other),
            }
        }
        Commands::Watch { store } => watch(&config, store).await,
    }
}

async fn router(config: &Config) -> anyhow::Result<Router> {
    Ok(Router::new(open_session(config, Arc::new(LogNotifier)).await?))
}

async fn detect(router: &Router) -> anyhow::Result<()> {
    match router.handle(Request::CheckN8n).await {
        Response::Detection { is_n8n: true } => println!("workflow editor detected"),
        Response::Detection { is_n8n: false } => println!("no workflow editor"),
        other => return unexpected(other),
    }
    Ok(())
}

async fn extract(router: &Router, output: Option<&Path>) -> anyhow::Result<()> {
    let (workflow, cached) = match router.handle(Request::ExtractWorkflow).await {
        Response::Workflow { workflow, cached } => (workflow, cached),
        other => return unexpected(other),
    };
    if cached {
        warn!("Returning the last known workflow");
    }
    let pretty = serde_json::to_string_pretty(&serde_json::from_str::<Value>(&workflow)?)?;
    match output {
        Some(path) => {
            std::fs::write(path, pretty).with_context(|| format!("writing {}", path.display()))?;
            info!("Workflow written to {}", path.display());
        }
        None => println!("{}", pretty),
    }
    Ok(())
}

async fn watch(config: &Config, store: Option<PathBuf>) -> anyhow::Result<()> {
    let store = FileStore::new(store.unwrap_or_else(|| crate::flowpilot_dir().join("state")));
    info!("Keeping the latest workflow under {}", store.dir().display());
    let notifier = PersistingNotifier::new(store).then(Arc::new(LogNotifier));
    let session = open_session(config, Arc::new(notifier)).await?;

    let runner = session.clone();
    let mut run = tokio::spawn(async move { runner.run().await });
    tokio::select! {
        result = &mut run => result.context("session task failed")?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping");
            session.shutdown();
            run.await.context("session task failed")?;
        }
    }
    if session.last_workflow().is_some() {
        info!("Last workflow saved as {}", CURRENT_WORKFLOW_KEY);
    }
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn applied(response: Response) -> anyhow::Result<()> {
    match response {
        Response::Applied(ApplyResult { success: true, .. }) => {
            println!("applied");
            Ok(())
        }
        Response::Applied(ApplyResult { error, .. }) => {
            bail!("{}", error.unwrap_or_else(|| "apply failed".to_string()))
        }
        other => unexpected(other),
    }
}

fn unexpected(response: Response) -> anyhow::Result<()> {
    match response {
        Response::Error { error } => bail!("{}", error),
        other => bail!("unexpected response: {:?}", other),
    }
}
