use clap::{Parser, Subcommand};
use task_server::config::{Config, print_setting};
use tracing_subscriber::EnvFilter;

/// Task API server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (the default)
    Serve,
    /// Print the value of a single setting
    Settings {
        /// Setting name, e.g. `port` or `APP_NAME`
        key: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config),
        Command::Settings { key } => {
            print_setting(&config, &key, &mut std::io::stdout().lock())?;
            Ok(())
        }
    }
}

fn serve(config: Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.web_concurrency.max(1))
        .enable_all()
        .build()?;
    runtime.block_on(task_server::web::start_web_server(config))
}
