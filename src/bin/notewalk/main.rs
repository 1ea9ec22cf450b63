//! notewalk CLI tool
//!
//! Command-line interface over hierarchy snapshots and page content.
//!
//! ## Commands
//!
//! - `index [--snapshot <file>] [--scope <scope>]`: build the cross-reference index for a
//!   snapshot and print it as JSON
//! - `validate <content.json> [--schema <file.toml>]`: validate page content, apply the
//!   exponent-notation correction and report what is left
//!
//! Both commands read retry and index settings from `--config` (default `notewalk.toml`; a
//! missing file means defaults).

use clap::{Parser, Subcommand};
use notewalk::{
    config::Settings,
    hierarchy::Scope,
    host::MemoryHost,
    retry::Invoker,
    schema::{ContentElement, SchemaDefinition, Validator, SCHEMAS},
    xref::{Indexer, NeverCancel},
    NotewalkError,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notewalk")]
#[command(author, version, about = "Index notebook hierarchy snapshots and validate page content", long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = "notewalk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the cross-reference index of a hierarchy snapshot
    Index {
        /// JSON snapshot of the workspace (overrides `snapshot` in the settings file)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Slice of the hierarchy to index: pages, sections or notebooks
        #[arg(long, default_value = "sections")]
        scope: Scope,
    },

    /// Validate page content against its registered schema
    Validate {
        /// JSON page content
        content: PathBuf,

        /// Additional TOML schema definition to register before validating
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Print the corrected content as JSON
        #[arg(long)]
        emit: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    match cli.command {
        Commands::Index { snapshot, scope } => {
            let Some(snapshot) = snapshot.or_else(|| settings.snapshot.clone()) else {
                return Err(NotewalkError::Custom(
                    "no snapshot given (use --snapshot or set `snapshot` in settings)".to_string(),
                )
                .into());
            };
            let host = MemoryHost::from_snapshot_file(&snapshot)?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;

            let index = runtime.block_on(async {
                let indexer = Indexer::new(&host, Invoker::new(settings.retry.clone()))
                    .with_separator(settings.index.path_separator.clone());
                let progress = (
                    |total: usize| tracing::info!("Indexing {total} pages from {snapshot:?}"),
                    || tracing::trace!("Indexed page"),
                );
                indexer.build_index(scope, &NeverCancel, &progress).await
            });

            tracing::info!("Indexed {} pages", index.len());
            println!("{}", serde_json::to_string_pretty(&index)?);
            Ok(())
        }

        Commands::Validate {
            content,
            schema,
            emit,
        } => {
            if let Some(schema) = schema {
                let definition = SchemaDefinition::from_toml(&std::fs::read_to_string(&schema)?)?;
                SCHEMAS.register(definition);
            }

            let element = ContentElement::from_json(&std::fs::read_to_string(&content)?)?;
            let outcome = Validator::default().validate(&element);

            for correction in outcome.corrections.iter() {
                println!(
                    "corrected {}@{}: {} -> {}",
                    correction.path, correction.attribute, correction.from, correction.to
                );
            }
            for issue in outcome.issues.iter() {
                println!("error: {issue}");
            }
            if emit {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&outcome.content).map_err(NotewalkError::from)?
                );
            }

            if !outcome.is_valid() {
                eprintln!("{} validation error(s) in {:?}", outcome.issues.len(), content);
                std::process::exit(1);
            }
            println!("✓ {content:?} is valid");
            Ok(())
        }
    }
}
