use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Book catalog service
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service until Ctrl-C
    Serve {
        /// Overrides `server.host`
        #[arg(long)]
        host: Option<String>,
        /// Overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the merged OpenAPI document
    Openapi,
    /// Print the effective settings
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port } => {
            let mut settings = load_settings()?;
            apply_server_overrides(&mut settings, host, port);

            bookshelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(
                env = ?settings.environment,
                addr = %settings.server.bind_addr(),
                "bookshelf serve"
            );

            bookshelf_app::run(settings).await
        }
        Command::Openapi => {
            let registry = bookshelf_app::build_registry();
            let doc = bookshelf_http::router::merged_openapi(&registry);
            let rendered =
                serde_json::to_string_pretty(&doc).context("failed to render OpenAPI document")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Config => {
            let settings = load_settings()?;
            println!("environment = {}", settings.environment.as_str());
            println!("host = {}", settings.server.host);
            println!("port = {}", settings.server.port);
            println!("request_timeout_ms = {}", settings.server.request_timeout_ms);
            println!("log_format = {:?}", settings.telemetry.log_format);
            println!("log_filter = {}", settings.telemetry.filter);
            Ok(())
        }
    }
}

fn load_settings() -> anyhow::Result<Settings> {
    Settings::load().with_context(|| "failed to load bookshelf settings")
}

/// `serve --host/--port` win over file and environment settings
fn apply_server_overrides(settings: &mut Settings, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }
}
