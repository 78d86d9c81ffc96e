mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, feedback::FeedbackSubcommand, guide::GuideArgs,
    simulate::SimulateArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "router",
    about = "Recommend which prompt command fits a request, from the request text and the project around it",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .router/ or .git/)
    #[arg(long, global = true, env = "ROUTER_ROOT")]
    root: Option<PathBuf>,

    /// Framework directory holding commands/*.md (default: <root>/.claude)
    #[arg(long, global = true, env = "ROUTER_FRAMEWORK")]
    framework: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a command for a request
    Recommend {
        /// What you want to do, in plain words
        input: String,
        /// A recently used command (repeatable, oldest first)
        #[arg(long = "recent", value_name = "CMD")]
        recent: Vec<String>,
        /// Show up to N ranked recommendations instead of the best one
        #[arg(long, value_name = "N")]
        max: Option<usize>,
    },

    /// Explain how the recommendation for a request was reached
    Explain {
        input: String,
        #[arg(long = "recent", value_name = "CMD")]
        recent: Vec<String>,
    },

    /// Show the structural signals detected in the project
    Analyze,

    /// List the routing rules in evaluation order
    Rules,

    /// Walk the decision graph for a described request
    Simulate(SimulateArgs),

    /// Walk the decision graph from guided questionnaire answers
    Guide(GuideArgs),

    /// Run the bundled sample scenarios through the decision graph
    Scenarios,

    /// Print the decision graph
    Tree,

    /// Record feedback and inspect learning state
    Feedback {
        #[command(subcommand)]
        subcommand: FeedbackSubcommand,
    },

    /// Show, validate or create the routing config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let framework = cli
        .framework
        .unwrap_or_else(|| router_core::paths::default_framework_dir(&root));
    let ws = cmd::Workspace {
        root: &root,
        framework: &framework,
    };

    let result = match cli.command {
        Commands::Recommend { input, recent, max } => {
            cmd::recommend::run(&ws, &input, &recent, max, cli.json)
        }
        Commands::Explain { input, recent } => cmd::explain::run(&ws, &input, &recent, cli.json),
        Commands::Analyze => cmd::analyze::run(&ws, cli.json),
        Commands::Rules => cmd::rules::run(&ws, cli.json),
        Commands::Simulate(args) => cmd::simulate::run(args, cli.json),
        Commands::Guide(args) => cmd::guide::run(args, cli.json),
        Commands::Scenarios => cmd::scenarios::run(cli.json),
        Commands::Tree => cmd::tree::run(cli.json),
        Commands::Feedback { subcommand } => cmd::feedback::run(&ws, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
