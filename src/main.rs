//! CLI entry point for inkpress

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkpress::commands::list::ListKind;
use inkpress::Site;

#[derive(Parser)]
#[command(name = "inkpress")]
#[command(version)]
#[command(about = "Builds a static site from Markdown documents with front matter", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the site into the public folder
    #[command(alias = "g")]
    Build {
        /// Fail when any build warning was emitted
        #[arg(long)]
        strict: bool,
    },

    /// Delete the public folder
    Clean,

    /// List site information
    List {
        /// Type of content to list (post, tag, category)
        #[arg(default_value = "post")]
        r#type: ListKind,
    },

    /// Create a new document
    New {
        /// Title of the new document
        title: String,

        /// File name below the new-document folder, without extension
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "inkpress=debug,info"
    } else {
        "inkpress=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Build { strict } => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Building {:?}", site.source_dir);

            let report = site.build()?;
            println!("{}", report.summary());

            if strict && report.has_warnings() {
                for warning in &report.warnings {
                    eprintln!("warning: {}", warning);
                }
                anyhow::bail!(
                    "Build emitted {} warnings (--strict)",
                    report.warnings.len()
                );
            }
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            inkpress::commands::list::run(&site, r#type)?;
        }

        Commands::New { title, path } => {
            let site = Site::new(&base_dir)?;
            let created = site.new_document(&title, path.as_deref())?;
            println!("Created: {:?}", created);
        }

        Commands::Version => {
            println!("inkpress version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
