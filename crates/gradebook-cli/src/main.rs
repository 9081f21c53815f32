//! gradebook CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use gradebook_core::KindFilter;

mod commands;

use commands::{EvaluationArgs, StoreArgs};

#[derive(Parser)]
#[command(
    name = "gradebook",
    version,
    about = "Track academic evaluations and their grades"
)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and a sample data file
    Init,

    /// Add an evaluation
    Add {
        #[command(flatten)]
        evaluation: EvaluationArgs,
    },

    /// Replace an existing evaluation
    Update {
        /// Name of the evaluation to replace
        #[arg(long)]
        original: String,

        #[command(flatten)]
        evaluation: EvaluationArgs,
    },

    /// Delete an evaluation by name
    Remove {
        #[arg(long)]
        name: String,
    },

    /// Show one evaluation and its grade
    Show {
        #[arg(long)]
        name: String,
    },

    /// List evaluations
    List {
        /// Filter: all, exam, assignment, presentation
        #[arg(long, default_value = "all")]
        kind: KindFilter,
    },

    /// Summary statistics
    Stats {
        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Delete every evaluation
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Import evaluations from a JSON file
    Import {
        #[arg(long)]
        file: PathBuf,

        /// Keep existing evaluations instead of replacing them
        #[arg(long)]
        append: bool,
    },

    /// Export evaluations to a JSON file
    Export {
        #[arg(long)]
        file: PathBuf,
    },

    /// Write an HTML summary report
    Report {
        /// Output file (default: <report_dir>/gradebook-report.html)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gradebook=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = cli.store;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Add { evaluation } => commands::add::execute(&store, evaluation),
        Commands::Update {
            original,
            evaluation,
        } => commands::update::execute(&store, original, evaluation),
        Commands::Remove { name } => commands::remove::execute(&store, name),
        Commands::Show { name } => commands::show::execute(&store, name),
        Commands::List { kind } => commands::list::execute(&store, kind),
        Commands::Stats { format } => commands::stats::execute(&store, format),
        Commands::Clear { yes } => commands::clear::execute(&store, yes),
        Commands::Import { file, append } => commands::import::execute(&store, file, append),
        Commands::Export { file } => commands::export::execute(&store, file),
        Commands::Report { output } => commands::report::execute(&store, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
