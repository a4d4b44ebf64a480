use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use kitchen_intake::config::AppConfig;
use kitchen_intake::error::AppError;
use kitchen_intake::workflows::intake::{HttpRequirementsSource, RequirementsSource};

#[derive(Parser, Debug)]
#[command(
    name = "Kitchen Intake Service",
    about = "Run the tiered commercial-kitchen application service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a full intake scenario in memory and print each step
    Demo(DemoArgs),
    /// Fetch a location's published requirements from the marketplace backend
    FetchRequirements(FetchRequirementsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct FetchRequirementsArgs {
    /// Location identifier to fetch requirements for
    #[arg(long)]
    pub(crate) location: String,
    /// Override the configured marketplace base URL
    #[arg(long)]
    pub(crate) base_url: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::FetchRequirements(args) => fetch_requirements(args).await,
    }
}

/// Prints the document a form session at that location would use. A fetch
/// failure prints the conservative fallback, the same document the engine
/// would fall back to.
async fn fetch_requirements(args: FetchRequirementsArgs) -> Result<(), AppError> {
    let base_url = match args.base_url {
        Some(base_url) => base_url,
        None => AppConfig::load()?.marketplace.base_url,
    };
    let source = HttpRequirementsSource::new(base_url);
    let document = source.fetch_or_fallback(&args.location).await;
    match serde_json::to_string_pretty(&document) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("requirements unavailable: {err}"),
    }
    Ok(())
}
