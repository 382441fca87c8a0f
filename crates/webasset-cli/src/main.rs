//! Webasset - web asset publishing for repository resources
//!
//! Usage:
//!   webasset target add local public     # Register an install target
//!   webasset map /res/public /app        # Map a repository path to a web path
//!   webasset install                     # Install all mappings
//!   webasset url /res/public/app.js      # Print the public URL of a resource

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webasset_core::asset::{AssetManager, AssetMapping, target_filter};
use webasset_core::context::ProjectContext;
use webasset_core::expr::Expr;
use webasset_core::fs::LinkMode;
use webasset_core::install::{AssetInstallationManager, ResourceInstallOutcome};
use webasset_core::installer::{InstallerDescriptor, InstallerManager, InstallerParameter};
use webasset_core::target::{DEFAULT_TARGET, InstallTarget, InstallTargetManager};
use webasset_core::url::AssetUrlGenerator;

#[derive(Parser)]
#[command(name = "webasset")]
#[command(about = "Web asset publishing for repository resources", long_about = None)]
struct Cli {
    /// Project root (defaults to the nearest directory with a webasset.toml)
    #[arg(long, short = 'C', global = true)]
    project_root: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage install targets
    Target(TargetArgs),

    /// Manage installers
    Installer(InstallerArgs),

    /// Manage asset mappings
    Map(MapArgs),

    /// Install asset mappings onto their targets
    Install {
        /// Only install mappings of this target
        #[arg(long, short)]
        target: Option<String>,
    },

    /// Print the public URL of a repository resource
    Url {
        /// Absolute repository path, e.g. /res/public/app.js
        path: String,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct TargetArgs {
    #[command(subcommand)]
    command: TargetSubcommand,
}

#[derive(Subcommand)]
enum TargetSubcommand {
    /// List install targets
    List,

    /// Add an install target (replaces a target of the same name)
    Add {
        /// Target name
        name: String,
        /// Directory assets are installed into
        location: String,
        /// Installer used to install assets
        #[arg(long, short, default_value = "symlink")]
        installer: String,
        /// URL format; %s is replaced by the web path
        #[arg(long)]
        url_format: Option<String>,
        /// Installer parameter value
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// Make this the default target
        #[arg(long)]
        default: bool,
    },

    /// Remove an install target
    #[command(alias = "rm")]
    Remove {
        /// Target name
        name: String,
    },

    /// Set the default install target
    SetDefault {
        /// Target name
        name: String,
    },
}

#[derive(Args)]
struct InstallerArgs {
    #[command(subcommand)]
    command: InstallerSubcommand,
}

#[derive(Subcommand)]
enum InstallerSubcommand {
    /// List installers
    List,

    /// Add an installer (replaces a user installer of the same name)
    Add {
        /// Installer name
        name: String,
        /// How resources are materialized (copy or symlink)
        #[arg(long, short)]
        strategy: LinkMode,
        /// Installer description
        #[arg(long, short)]
        description: Option<String>,
        /// Required parameter
        #[arg(long = "required", value_name = "NAME")]
        required: Vec<String>,
        /// Optional parameter with an optional default value
        #[arg(long = "optional", value_name = "NAME[=DEFAULT]")]
        optional: Vec<String>,
    },

    /// Remove an installer
    #[command(alias = "rm")]
    Remove {
        /// Installer name
        name: String,
    },
}

#[derive(Args)]
struct MapArgs {
    #[command(subcommand)]
    command: MapSubcommand,
}

#[derive(Subcommand)]
enum MapSubcommand {
    /// List asset mappings
    List {
        /// Only list mappings of this target
        #[arg(long, short)]
        target: Option<String>,
    },

    /// Map a repository path or glob to a web path
    Add {
        /// Absolute repository path or glob
        glob: String,
        /// Web path on the target
        web_path: String,
        /// Target name
        #[arg(long, short, default_value = DEFAULT_TARGET)]
        target: String,
    },

    /// Remove an asset mapping
    #[command(alias = "rm")]
    Remove {
        /// UUID or unique UUID prefix
        uuid: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webasset=info,webasset_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = match &cli.project_root {
        Some(root) => ProjectContext::new(root.clone()),
        None => ProjectContext::with_defaults()?,
    };

    match cli.command {
        Commands::Target(args) => run_target(&ctx, args.command, cli.format)?,
        Commands::Installer(args) => run_installer(&ctx, args.command, cli.format)?,
        Commands::Map(args) => run_map(&ctx, args.command, cli.format)?,
        Commands::Install { target } => run_install(&ctx, target.as_deref(), cli.format)?,
        Commands::Url { path } => {
            let assets = ctx.asset_manager();
            let targets = ctx.target_manager();
            let url = AssetUrlGenerator::new(&assets, &targets).generate_url(&path)?;
            match cli.format {
                OutputFormat::Table => println!("{url}"),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "path": path, "url": url }))?
                ),
            }
        }
    }
    Ok(())
}

fn run_target(ctx: &ProjectContext, command: TargetSubcommand, format: OutputFormat) -> Result<()> {
    let targets = ctx.target_manager();
    match command {
        TargetSubcommand::List => {
            let all = targets.get_targets()?;
            let default = targets.get_default_target().ok().map(|t| t.name);
            match format {
                OutputFormat::Table => print_target_table(&all, default.as_deref()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&all)?),
            }
        }
        TargetSubcommand::Add {
            name,
            location,
            installer,
            url_format,
            params,
            default,
        } => {
            let mut target = InstallTarget::new(&name, installer, location)?;
            if let Some(url_format) = url_format {
                target = target.with_url_format(url_format);
            }
            for (key, value) in parse_pairs(&params)? {
                target = target.with_parameter(key, value);
            }
            targets.add_target(target)?;
            if default {
                targets.set_default_target(&name)?;
            }
            println!("✓ Added install target '{name}'");
        }
        TargetSubcommand::Remove { name } => {
            if !targets.has_target(&name)? {
                anyhow::bail!("Install target '{}' does not exist", name);
            }
            targets.remove_target(&name)?;
            println!("✓ Removed install target '{name}'");
        }
        TargetSubcommand::SetDefault { name } => {
            targets.set_default_target(&name)?;
            println!("✓ '{name}' is now the default target");
        }
    }
    Ok(())
}

fn run_installer(
    ctx: &ProjectContext,
    command: InstallerSubcommand,
    format: OutputFormat,
) -> Result<()> {
    let installers = ctx.installer_manager();
    match command {
        InstallerSubcommand::List => {
            let all = installers.get_installer_descriptors()?;
            match format {
                OutputFormat::Table => print_installer_table(&all),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&all)?),
            }
        }
        InstallerSubcommand::Add {
            name,
            strategy,
            description,
            required,
            optional,
        } => {
            let mut descriptor = InstallerDescriptor::new(&name, strategy)?;
            if let Some(description) = description {
                descriptor = descriptor.with_description(description);
            }
            for param in required {
                descriptor = descriptor.with_parameter(InstallerParameter::required(param));
            }
            for param in optional {
                let parameter = match param.split_once('=') {
                    Some((key, value)) => {
                        InstallerParameter::optional(key, Some(value.to_string()))
                    }
                    None => InstallerParameter::optional(param, None),
                };
                descriptor = descriptor.with_parameter(parameter);
            }
            installers.add_installer_descriptor(descriptor)?;
            println!("✓ Added installer '{name}'");
        }
        InstallerSubcommand::Remove { name } => {
            if !installers.has_installer_descriptor(&name)? {
                anyhow::bail!("Installer '{}' does not exist", name);
            }
            installers.remove_installer_descriptor(&name)?;
            println!("✓ Removed installer '{name}'");
        }
    }
    Ok(())
}

fn run_map(ctx: &ProjectContext, command: MapSubcommand, format: OutputFormat) -> Result<()> {
    let assets = ctx.asset_manager();
    match command {
        MapSubcommand::List { target } => {
            let mappings = match target {
                Some(target) => {
                    let targets = ctx.target_manager();
                    assets.find_asset_mappings(&target_filter(&targets, &target)?)?
                }
                None => assets.get_asset_mappings()?,
            };
            match format {
                OutputFormat::Table => print_mapping_table(&mappings),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&mappings)?),
            }
        }
        MapSubcommand::Add {
            glob,
            web_path,
            target,
        } => {
            let mapping = AssetMapping::new(glob, target, web_path)?;
            let uuid = mapping.uuid;
            assets.add_asset_mapping(mapping)?;
            match format {
                OutputFormat::Table => println!("✓ Added asset mapping {uuid}"),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "uuid": uuid }))?
                ),
            }
        }
        MapSubcommand::Remove { uuid } => {
            let matches =
                assets.find_asset_mappings(&Expr::starts_with(AssetMapping::UUID, uuid.clone()))?;
            let mapping = match matches.as_slice() {
                [] => anyhow::bail!("No asset mapping matches '{}'", uuid),
                [mapping] => mapping,
                _ => anyhow::bail!(
                    "'{}' matches {} asset mappings. Use a longer prefix.",
                    uuid,
                    matches.len()
                ),
            };
            assets.remove_asset_mapping(mapping.uuid)?;
            println!("✓ Removed asset mapping {}", mapping.uuid);
        }
    }
    Ok(())
}

fn run_install(ctx: &ProjectContext, target: Option<&str>, format: OutputFormat) -> Result<()> {
    let assets = ctx.asset_manager();
    let targets = ctx.target_manager();
    let installers = ctx.installer_manager();
    let manager = AssetInstallationManager::new(ctx.project_root(), &targets, &installers);

    let outcomes = manager.install_all(&assets, target)?;
    match format {
        OutputFormat::Table => print_install_table(ctx, &outcomes),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
    }
    Ok(())
}

fn parse_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got '{}'", pair))
        })
        .collect()
}

fn print_target_table(targets: &[InstallTarget], default: Option<&str>) {
    if targets.is_empty() {
        println!("No install targets configured.");
        println!("Add one with: webasset target add <name> <location>");
        return;
    }

    println!(
        "{:<2}{:<16} {:<12} {:<30} URL format",
        "", "Name", "Installer", "Location"
    );
    println!("{}", "-".repeat(80));

    for target in targets {
        let marker = if default == Some(target.name.as_str()) {
            "*"
        } else {
            ""
        };
        println!(
            "{:<2}{:<16} {:<12} {:<30} {}",
            marker, target.name, target.installer_name, target.location, target.url_format
        );
    }
}

fn print_installer_table(installers: &[InstallerDescriptor]) {
    println!("{:<16} {:<10} {:<20} Description", "Name", "Strategy", "Parameters");
    println!("{}", "-".repeat(70));

    for installer in installers {
        let params = if installer.parameters.is_empty() {
            "-".to_string()
        } else {
            installer
                .parameters
                .values()
                .map(|p| {
                    if p.required {
                        p.name.clone()
                    } else {
                        format!("[{}]", p.name)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "{:<16} {:<10} {:<20} {}",
            installer.name,
            installer.strategy,
            params,
            installer.description.as_deref().unwrap_or("-")
        );
    }
}

fn print_mapping_table(mappings: &[AssetMapping]) {
    if mappings.is_empty() {
        println!("No asset mappings configured.");
        println!("Add one with: webasset map add <glob> <web-path>");
        return;
    }

    println!("{:<10} {:<36} {:<12} Web path", "UUID", "Glob", "Target");
    println!("{}", "-".repeat(80));

    for mapping in mappings {
        let uuid = mapping.uuid.to_string();
        println!(
            "{:<10} {:<36} {:<12} {}",
            &uuid[..8],
            mapping.glob,
            mapping.target_name,
            mapping.web_path
        );
    }
}

fn print_install_table(ctx: &ProjectContext, outcomes: &[ResourceInstallOutcome]) {
    if outcomes.is_empty() {
        println!("Nothing to install.");
        return;
    }

    for outcome in outcomes {
        let resource = outcome
            .resource
            .strip_prefix(ctx.project_root())
            .unwrap_or(&outcome.resource);
        if outcome.changed {
            println!(
                "✓ {} → {} ({})",
                resource.display(),
                outcome.destination.display(),
                outcome.mode
            );
        } else {
            println!("• {} is up to date", outcome.destination.display());
        }
    }
}
