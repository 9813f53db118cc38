//! Shelf application library
//!
//! Book catalog module plus the bootstrap shared by the `shelf-app` and
//! `shelf` binaries.

pub mod modules;

use anyhow::Context;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Registry populated with every application module
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Run the service until a shutdown signal arrives.
///
/// Telemetry must already be initialized by the caller.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        address = %settings.server.bind_address(),
        "shelf bootstrap starting"
    );

    let registry = registry();
    let ctx = InitCtx {
        settings: &settings,
    };

    registry
        .init_modules(&ctx)
        .await
        .context("module initialization failed")?;
    registry
        .start_modules(&ctx)
        .await
        .context("module start failed")?;

    tracing::info!("shelf bootstrap complete");

    let served = shelf_http::start_server(&registry, &settings).await;
    let stopped = registry.stop_modules().await;

    served?;
    stopped.context("module shutdown failed")
}
