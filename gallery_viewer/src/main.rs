//! Gallery viewer demo
//!
//! Loads a portfolio document, builds the hub against the headless backend,
//! then walks into every room and back, opening one media popup per room.
//!
//! Usage: `gallery_viewer [portfolio.ron] [config.toml|config.ron]`

use gallery_engine::analytics::LogAnalytics;
use gallery_engine::config::{Config, ConfigError};
use gallery_engine::content::{gather_snapshot, RonContentSource};
use gallery_engine::core::config::GalleryConfig;
use gallery_engine::foundation::logging;
use gallery_engine::render::{ElementRole, HeadlessBackend, HeadlessConfig};
use gallery_engine::scene::{EntityRole, SceneContext, SceneDescriptor, SceneLifecycleManager};
use gallery_engine::ContentError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
enum ViewerError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Scene '{0}' did not settle within the frame budget")]
    Stalled(String),
}

type Manager = SceneLifecycleManager<HeadlessBackend>;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.get(1) {
        Some(path) => GalleryConfig::load_from_file(path).and_then(GalleryConfig::validated),
        None => Ok(GalleryConfig::default()),
    };

    let level = config
        .as_ref()
        .map_or_else(|_| "info".to_string(), |config| config.engine.log_level.clone());
    logging::init_with_level(&level);

    let portfolio_path = args
        .first()
        .map_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/demo_portfolio.ron"), PathBuf::from);

    let result = config
        .map_err(ViewerError::from)
        .and_then(|config| run(&portfolio_path, &config));
    if let Err(e) = result {
        log::error!("Viewer failed: {}", e);
        std::process::exit(1);
    }
}

fn run(portfolio_path: &Path, config: &GalleryConfig) -> Result<(), ViewerError> {
    log::info!("Loading portfolio from {}", portfolio_path.display());
    let snapshot = gather_snapshot(&RonContentSource::open(portfolio_path)?)?;
    let context = SceneContext::new(snapshot);

    let mut manager = SceneLifecycleManager::new(HeadlessBackend::new(HeadlessConfig::default()), config)
        .with_analytics(Box::new(LogAnalytics));

    manager.load_scene(SceneDescriptor::Hub, context);
    run_until_settled(&mut manager, config)?;

    let room_targets: Vec<SceneDescriptor> = manager
        .active_scene()
        .map(|hub| hub.edges().iter().map(|edge| edge.target.clone()).collect())
        .unwrap_or_default();

    for target in room_targets {
        if !navigate(&mut manager, &target) {
            log::warn!("No navigation entity for '{}'", target);
            continue;
        }
        run_until_settled(&mut manager, config)?;

        open_first_panel(&mut manager);
        manager.update(config.engine.frame_delta());

        if navigate(&mut manager, &SceneDescriptor::Hub) {
            run_until_settled(&mut manager, config)?;
        }
    }

    summarize(&manager);
    manager.shutdown();
    Ok(())
}

/// Click the navigation entity leading to `target`
fn navigate(manager: &mut Manager, target: &SceneDescriptor) -> bool {
    let handle = manager.active_scene().and_then(|scene| {
        scene
            .entities()
            .iter()
            .find(|entity| matches!(&entity.role, EntityRole::Navigation { target: t } if t == target))
            .map(|entity| entity.handle)
    });

    match handle {
        Some(handle) => manager.backend_mut().simulate_interaction(handle, ElementRole::Interact) > 0,
        None => false,
    }
}

fn open_first_panel(manager: &mut Manager) {
    let handle = manager.active_scene().and_then(|scene| {
        scene
            .entities()
            .iter()
            .find(|entity| matches!(entity.role, EntityRole::Panel { .. }))
            .map(|entity| entity.handle)
    });

    if let Some(handle) = handle {
        manager.backend_mut().simulate_interaction(handle, ElementRole::Interact);
    }
}

fn run_until_settled(manager: &mut Manager, config: &GalleryConfig) -> Result<(), ViewerError> {
    let delta = config.engine.frame_delta();

    // One frame so routed navigation reaches the manager
    manager.update(delta);
    for _ in 0..config.engine.frame_budget {
        if !manager.is_loading() {
            if let Some(scene) = manager.active_scene() {
                let stats = scene.diagnostics();
                log::info!(
                    "Scene '{}': {} entities, {} bound, {} skipped",
                    scene.descriptor(),
                    scene.entities().len(),
                    stats.bound,
                    stats.provision_failures
                );
            }
            return Ok(());
        }
        manager.update(delta);
    }

    let scene = manager
        .active_scene()
        .map_or_else(|| "none".to_string(), |scene| scene.descriptor().to_string());
    Err(ViewerError::Stalled(scene))
}

fn summarize(manager: &Manager) {
    let backend = manager.backend();
    log::info!(
        "Finished after {} frames: {} entities created, {} released, {} popups opened",
        backend.frame(),
        backend.creation_log().len(),
        backend.released_count(),
        backend.popups().len()
    );
    for (id, count) in manager.provisioner().created_ids() {
        log::debug!("  {} provisioned {}x", id, count);
    }
    if let Some(e) = manager.last_error() {
        log::warn!("Last transition error: {}", e);
    }
}
