//! Demo plugin host
//!
//! Loads the plugins found in a modules directory, drives them through the
//! full lifecycle, reports per-module readiness, and tears everything down.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use modhost::config::HostConfig;
use modhost::module::container::FactoryRegistry;
use modhost::module::events::LifecycleEvent;
use modhost::module::manager::ModuleManager;
use modhost::utils::init_logging;

#[derive(Debug, Parser)]
#[command(name = "modhost", about = "Demo plugin host", version)]
struct Args {
    /// Path to a host config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory containing module containers (overrides config)
    #[arg(long)]
    modules_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => HostConfig::from_file(path)?,
        None => HostConfig::default(),
    };
    init_logging(config.logging.filter.as_deref());

    let modules_dir = args
        .modules_dir
        .unwrap_or_else(|| PathBuf::from(&config.modules_dir));

    let mut factories = FactoryRegistry::new();
    modhost::demo::register_demo_factories(&mut factories);

    let mut manager = ModuleManager::new(Arc::new(factories));
    manager.set_config_overrides(config.module_configs.clone());
    manager.subscribe(Box::new(|event| match event {
        LifecycleEvent::Mounted(id) => info!("host: {} mounted", id),
        LifecycleEvent::Initialized(id) => info!("host: {} initialized", id),
        LifecycleEvent::Unmounted(id) => info!("host: {} unmounted", id),
        LifecycleEvent::Deinitialized(id) => info!("host: {} deinitialized", id),
    }));

    if !manager.load_all(&modules_dir) {
        anyhow::bail!("failed to scan modules directory {:?}", modules_dir);
    }

    for module in manager.modules() {
        info!(
            "{} v{} ready={}",
            module.id(),
            module.identity().version,
            module.is_ready()
        );
    }

    manager.dispose();
    Ok(())
}
