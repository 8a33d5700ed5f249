use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use boj_notebook::controller::Controller;
use boj_notebook::fetch::{http_client, ProblemFetcher};
use boj_notebook::selection::SelectedProblem;
use boj_notebook::shell::Shell;
use boj_notebook::{relay, Config};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::BufReader;
use tracing::{info, warn};

/// Turn Baekjoon problems into a Jupyter notebook.
#[derive(Debug, Parser)]
#[command(name = "boj-notebook", version, about)]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Relay endpoint to send every upstream request through.
    #[arg(long, global = true)]
    relay: Option<String>,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the cross-origin relay endpoint.
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Crawl problems in order and write the notebook.
    Build {
        #[arg(required = true)]
        ids: Vec<u32>,
        /// Notebook path (defaults to the configured file name).
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Also write the assembled markdown here.
        #[arg(long)]
        markdown: Option<PathBuf>,
    },
    /// Search problems by number or title.
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Interactive selection, crawl and generation.
    Shell,
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "boj_notebook=info",
        1 => "boj_notebook=debug",
        _ => "boj_notebook=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(relay) = &cli.relay {
        config.relay_url = Some(relay.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);
    let config = load_config(&cli)?;

    match cli.command {
        Command::Serve { bind } => {
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            relay::serve(listener, http_client(&config)?).await?;
        }
        Command::Build { ids, out, markdown } => {
            let mut controller = Controller::new(ProblemFetcher::from_config(&config)?, &config);
            for id in ids {
                if let Err(e) = controller.add(SelectedProblem::untitled(id)) {
                    warn!("{e}");
                }
            }

            let report = controller.crawl().await?;
            info!(
                fetched = report.problems.len(),
                skipped = report.skipped.len(),
                "crawl finished"
            );
            let Some(content) = controller.markdown() else {
                bail!("no problem could be processed");
            };

            if let Some(path) = markdown {
                std::fs::write(&path, content)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            let out = out.unwrap_or_else(|| PathBuf::from(&config.notebook_file));
            controller.generate()?.write_to(&out)?;
            println!("{}", out.display());
        }
        Command::Search { query } => {
            let fetcher = ProblemFetcher::from_config(&config)?;
            for hit in fetcher.search(&query.join(" ")).await? {
                println!("{}\t{}\t{}", hit.id, hit.title, hit.tier.name);
            }
        }
        Command::Shell => {
            let controller = Controller::new(ProblemFetcher::from_config(&config)?, &config);
            let mut shell = Shell::new(controller, &config.notebook_file);
            shell
                .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await?;
        }
    }

    Ok(())
}
