pub mod cli;
pub mod core;
pub mod models;
pub mod platform;

use crate::cli::Cli;
use crate::core::config::Config;
use crate::core::credentials::CredentialManager;
use crate::core::database::Database;
use crate::core::frame_loop::{FrameLoop, LoopStats};
use crate::core::gate::{CredentialGate, GateOutcome};
use crate::core::overlay::{AnnotationWriter, LogRenderer};
use crate::core::password::{PasswordHasher, Sha256Hasher};
use crate::core::prompt::{Prompt, StdioPrompt};
use crate::models::credential::Credential;
use crate::platform::pose::Recording;
use anyhow::{anyhow, bail, Context};
use log::{debug, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Authenticate, then play the configured recording through the posture classifier
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow!("Failed to load config: {}", e))?;

    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow!("Invalid config: {}", e))?;
    debug!("Running with {:?}", config);

    let mut prompt = StdioPrompt::stdin();
    let credential = authenticate(&config, &mut prompt, &Sha256Hasher).await?;
    info!("Welcome, {}", credential.username);

    let stats = play_recording(&config, tokio::signal::ctrl_c()).await?;
    info!(
        "Processed {} frames: {} with a body, {} with alerts",
        stats.frames, stats.frames_with_body, stats.frames_with_alerts
    );

    Ok(())
}

/// Run the credential gate against the configured store.
/// The store is only held open while the gate runs.
pub async fn authenticate<P, H>(config: &Config, prompt: &mut P, hasher: &H) -> anyhow::Result<Credential>
where
    P: Prompt + ?Sized,
    H: PasswordHasher + ?Sized,
{
    let db = Database::connect(&config.database_path, config.max_connections)
        .await
        .with_context(|| {
            format!(
                "Credential store at {} is unavailable",
                config.database_path.display()
            )
        })?;

    run_gate(Arc::new(db), prompt, hasher).await
}

/// Drive the gate over `db`, closing it on every exit path
async fn run_gate<P, H>(db: Arc<Database>, prompt: &mut P, hasher: &H) -> anyhow::Result<Credential>
where
    P: Prompt + ?Sized,
    H: PasswordHasher + ?Sized,
{
    let store = CredentialManager::new(db.clone());
    let outcome = CredentialGate::new(&store, prompt, hasher).run().await;
    db.close().await;

    match outcome.context("Authentication aborted")? {
        GateOutcome::Ready(credential) => Ok(credential),
        GateOutcome::Terminated => bail!("First user registration failed"),
    }
}

/// Replay the configured recording until it ends or `shutdown` resolves
pub async fn play_recording<F: Future>(config: &Config, shutdown: F) -> anyhow::Result<LoopStats> {
    let recording = Recording::load(&config.recording_path)?;
    if recording.is_empty() {
        info!("Recording {} has no frames", config.recording_path.display());
    }
    let (source, estimator) = recording.into_replay();

    let mut frame_loop = FrameLoop::new(
        source,
        estimator,
        Duration::from_millis(config.frame_interval_ms),
    )
    .with_renderer(Box::new(LogRenderer::default()));

    if let Some(path) = &config.annotations_path {
        frame_loop = frame_loop.with_renderer(Box::new(AnnotationWriter::create(path)?));
    }

    Ok(frame_loop.run_until(shutdown).await?)
}
