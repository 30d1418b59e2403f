use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docforge::cli::commands;

#[derive(Parser)]
#[command(name = "docforge")]
#[command(
    version,
    about = "AI-assisted documentation generator and linter for code repositories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize DocForge in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
        #[arg(long, help = "Directory holding <owner>/<name> checkouts")]
        repositories_root: Option<PathBuf>,
    },

    /// Check that the model backend is reachable and the model is available
    Check {
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// List or search candidate repositories
    Repos {
        #[arg(help = "Case-insensitive substring of owner/name")]
        query: Option<String>,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Analyze a repository and print its code summary
    Analyze {
        #[arg(help = "Repository id (owner/name)")]
        repository: String,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Generate draft documentation for one or more repositories
    Generate {
        #[arg(required = true, help = "Repository ids (owner/name)")]
        repositories: Vec<String>,
        #[arg(long, short, help = "Output file, or directory for several repositories")]
        output: Option<PathBuf>,
        #[arg(long, help = "Lint each draft after generation")]
        lint: bool,
        #[arg(long, help = "Do not save drafts to the version history")]
        no_save: bool,
    },

    /// Lint a Markdown document
    Lint {
        #[arg(help = "Document to lint")]
        file: PathBuf,
        #[arg(long, help = "Skip the model-backed semantic pass")]
        structural_only: bool,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
        #[arg(long, help = "Also write the report as JSON to this path")]
        report: Option<PathBuf>,
    },

    /// Save an edited document as a new version
    Save {
        #[arg(help = "Repository id (owner/name)")]
        repository: String,
        #[arg(help = "Document file to save")]
        file: PathBuf,
        #[arg(long, short, help = "Note stored with the version")]
        note: Option<String>,
    },

    /// Show saved versions of a repository's documentation
    History {
        #[arg(help = "Repository id (owner/name)")]
        repository: String,
        #[arg(long, help = "Print the content of this version")]
        show: Option<u32>,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, default_value = "toml", help = "Output format: toml, json")]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mDocForge encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init {
            force,
            repositories_root,
        } => {
            commands::init::run(force, repositories_root.as_deref())?;
        }
        Commands::Check { format } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::check::run(&format))?;
        }
        Commands::Repos { query, format } => {
            commands::repos::run(query.as_deref(), &format)?;
        }
        Commands::Analyze { repository, format } => {
            commands::analyze::run(&repository, &format)?;
        }
        Commands::Generate {
            repositories,
            output,
            lint,
            no_save,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::generate::run(commands::generate::GenerateOptions {
                repositories,
                output,
                lint,
                save: !no_save,
            }))?;
        }
        Commands::Lint {
            file,
            structural_only,
            format,
            report,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::lint::run(
                &file,
                structural_only,
                &format,
                report.as_deref(),
            ))?;
        }
        Commands::Save {
            repository,
            file,
            note,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::save::run(&repository, &file, note))?;
        }
        Commands::History {
            repository,
            show,
            format,
        } => {
            commands::history::run(&repository, show, &format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                commands::config::show(&format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    commands::config::init_global(force)?;
                } else {
                    commands::config::init_project()?;
                }
            }
        },
    }

    Ok(())
}
