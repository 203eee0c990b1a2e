//! Demo application for the wicker kernel: wires a small "widgets" library
//! plus an inline announcer service, bootstraps, and waits for a
//! termination signal (which the kernel turns into a clean shutdown).

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::error;
use serde_json::Value;

use wicker_core::{
    ApplicationDefinition, BootstrapOptions, Kernel, LibraryDefinition, ServiceContext,
    ServiceInstance, service_fn,
};

/// Wicker: application-wiring and lifecycle kernel demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// TOML configuration file (top-level tables are projects)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inline configuration overrides, `project.property=value`
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

/// `project.property=value` -> (project, property, parsed value)
fn parse_override(raw: &str) -> Result<(String, String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected project.property=value, got '{}'", raw))?;
    let (project, property) = key
        .split_once('.')
        .ok_or_else(|| format!("expected project.property on the left side of '{}'", raw))?;
    let parsed = serde_json::from_str(value).unwrap_or(Value::String(value.to_string()));
    Ok((project.to_string(), property.to_string(), parsed))
}

#[derive(Debug)]
struct Inventory {
    capacity: u64,
}

fn widgets_library() -> LibraryDefinition {
    LibraryDefinition::new("widgets")
        .service(
            "inventory",
            service_fn(|context: ServiceContext| async move {
                let capacity = context.config.get_as::<u64>("capacity").await.unwrap_or(64);
                context.logger.info(&format!("inventory capacity {}", capacity));
                let instance: ServiceInstance = Arc::new(Inventory { capacity });
                Ok(instance)
            }),
        )
        .service(
            "announcer",
            service_fn(|context: ServiceContext| async move {
                let logger = context.logger.clone();
                let loader = context.loader.clone();
                context
                    .lifecycle
                    .on_ready(None, move || async move {
                        match loader.get_as::<Inventory>("inventory").await {
                            Some(inventory) => {
                                logger.info(&format!("announcing {} widget slots", inventory.capacity))
                            }
                            None => logger.warn("inventory missing at ready"),
                        }
                        Ok(())
                    })
                    .await;
                let instance: ServiceInstance = Arc::new(());
                Ok(instance)
            }),
        )
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let mut options = BootstrapOptions::new();
    if let Some(path) = args.config {
        options = options.with_config_file(path);
    }
    for raw in &args.set {
        match parse_override(raw) {
            Ok((project, property, value)) => {
                options = options.with_override(&project, &property, value);
            }
            Err(message) => {
                error!("{}", message);
                std::process::exit(2);
            }
        }
    }

    let application = ApplicationDefinition::new("wicker-demo").library(widgets_library());

    let kernel = Kernel::new();
    if let Err(err) = kernel.bootstrap(application, options).await {
        error!("{}", err);
        std::process::exit(2);
    }

    // The kernel's signal handler drives shutdown and process exit
    std::future::pending::<()>().await;
}
