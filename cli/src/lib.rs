use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use intel_core::Dispatcher;
use intel_core::InferenceOptions;
use intel_core::IntelConfig;
use intel_core::IntelligenceTypeRegistry;
use intel_core::PortalBridge;
use intel_core::PortalType;
use intel_core::Priority;
use intel_core::TypeFilter;
use intel_core::handlers::register_builtin_handlers;
use serde_json::Value as JsonValue;
use tracing::info;

/// Discover intelligence types from JSON evidence and dispatch requests to them.
#[derive(Debug, Parser)]
#[command(name = "intel", version)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "INTEL_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Evidence directory to scan (overrides `data_dir` from the config).
    #[arg(long = "data-dir", global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan the evidence directory and print the run statistics as JSON.
    Discover {
        /// Also write the registry export to this path.
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
    },
    /// List known intelligence types as JSON.
    Types {
        #[arg(long)]
        category: Option<String>,
        /// Only types with a registered handler.
        #[arg(long, default_value_t = false)]
        implemented: bool,
        /// HIGH, MEDIUM or LOW.
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Print the implementation and usage report.
    Status,
    /// Dispatch a request through the portal bridge and print the result.
    Run {
        /// Intelligence type to request.
        #[arg(value_name = "TYPE")]
        intelligence_type: String,
        /// Request payload as a JSON document.
        #[arg(long, default_value = "{}")]
        data: String,
        #[arg(long, default_value = "user")]
        portal: PortalType,
        /// Handler option as `key=value`; values are parsed as JSON when possible.
        #[arg(long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = IntelConfig::load_or_default(cli.config.as_deref())
        .context("failed to load intel configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    // Discovery first: handler registration only adds placeholders for
    // names the evidence never mentioned.
    let registry = Arc::new(IntelligenceTypeRegistry::from_config(&config));
    let stats = registry.discover_from_directory(&config.data_dir);
    register_builtin_handlers(&registry);
    info!(
        types = registry.len(),
        errors = stats.errors,
        "registry ready"
    );

    match cli.command {
        Command::Discover { export } => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            if let Some(path) = export {
                registry
                    .export_registry(&path)
                    .with_context(|| format!("failed to export registry to {}", path.display()))?;
                eprintln!("Registry exported to {}", path.display());
            }
        }
        Command::Types {
            category,
            implemented,
            priority,
        } => {
            let filter = TypeFilter {
                category,
                implemented_only: implemented,
                priority,
            };
            let types = registry.list_types(&filter);
            println!("{}", serde_json::to_string_pretty(&types)?);
        }
        Command::Status => {
            print!("{}", registry.render_report());
        }
        Command::Run {
            intelligence_type,
            data,
            portal,
            options,
        } => {
            let payload: JsonValue =
                serde_json::from_str(&data).context("--data must be a JSON document")?;
            let options = parse_options(&options)?;
            let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), config.dispatch));
            let bridge = PortalBridge::new(dispatcher);
            let response = bridge.get_intelligence(&intelligence_type, &payload, portal, &options);
            println!("{}", serde_json::to_string_pretty(&response.to_value())?);
        }
    }
    Ok(())
}

fn parse_options(raw: &[String]) -> Result<InferenceOptions> {
    let mut options = InferenceOptions::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("option '{entry}' must look like key=value"))?;
        let key = key.trim();
        anyhow::ensure!(!key.is_empty(), "option '{entry}' has an empty key");
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| JsonValue::String(value.to_string()));
        options.insert(key.to_string(), value);
    }
    Ok(options)
}
