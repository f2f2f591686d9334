//! argo-preview CLI - render Argo CD applications without a cluster

use argo_preview_core::DependencyFailurePolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "argo-preview")]
#[command(author = "argo-preview Contributors")]
#[command(version)]
#[command(about = "Preview the manifests of Argo CD applications locally", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration file (default: <config dir>/argo-preview/config.yaml)
    #[arg(long, global = true, env = "ARGO_PREVIEW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render application manifests
    Render {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        repos: RepoArgs,

        /// Output directory (if not set, outputs to stdout)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Number of applications rendered concurrently
        #[arg(short, long, default_value_t = 4)]
        jobs: usize,
    },

    /// Check multi-source rules and references without rendering
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Output validation results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Application files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Only process the application with this name
    #[arg(long = "app")]
    app: Option<String>,
}

#[derive(Args)]
struct RepoArgs {
    /// Helm binary used for templating and dependency builds
    #[arg(long)]
    helm: Option<PathBuf>,

    /// Use a local checkout for a repository (URL=PATH)
    #[arg(long = "local-repo", value_name = "URL=PATH")]
    local_repos: Vec<String>,

    /// Never substitute local checkouts
    #[arg(long, conflicts_with = "local_repos")]
    no_local: bool,

    /// What a failed chart dependency build does to the application
    #[arg(long, value_name = "warn|fail")]
    on_dependency_failure: Option<DependencyFailurePolicy>,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display; long repository URLs stay on one line
    miette::set_panic_hook();
    let _ = miette::set_hook(Box::new(|_| {
        let handler = miette::MietteHandlerOpts::new().wrap_lines(false);
        Box::new(handler.build())
    }));

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Render {
            input,
            repos,
            output_dir,
            jobs,
        } => {
            commands::render::run(commands::render::RenderOptions {
                config: cli.config,
                paths: input.paths,
                app: input.app,
                helm: repos.helm,
                local_repos: repos.local_repos,
                no_local: repos.no_local,
                on_dependency_failure: repos.on_dependency_failure,
                output_dir,
                jobs,
            })
            .await
        }

        Commands::Validate { input, json } => {
            commands::validate::run(&input.paths, input.app.as_deref(), json)
        }
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
