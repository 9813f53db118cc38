use anyhow::Context;
use clap::{Parser, Subcommand};

use shelf_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "shelf", version, about = "In-memory book catalog service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured listening port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the merged OpenAPI document and exit
    Openapi {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => serve(host, port).await,
        Command::Openapi { pretty } => print_openapi(pretty),
    }
}

async fn serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    shelf_telemetry::init(&settings.telemetry)?;
    tracing::info!(env = ?settings.environment, "shelf CLI serving");

    shelf_app::run(settings).await
}

fn print_openapi(pretty: bool) -> anyhow::Result<()> {
    let document = shelf_http::openapi_document(&shelf_app::registry());
    let rendered = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .context("failed to render OpenAPI document")?;

    println!("{rendered}");
    Ok(())
}
