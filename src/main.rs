use std::{error::Error, fs::read_to_string, path::Path};

use clap::Parser;
use gantry::{app_fn, CanonicalResponse, Gantry};
use gantry::config::ServerConfig;
use http::StatusCode;
use log::error;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct GantryFileConfig {
    server: ServerConfig,
}

#[derive(Parser)]
#[command(
    name = "gantry",
    about = "gantry - pluggable HTTP server adapter",
    long_about = r#"
gantry - pluggable HTTP server adapter

Serves a small demo application through the adapter. Real deployments embed
the library and pass their own application to the startup contract.

Usage:
    gantry [OPTIONS]

Options:
    -h, --help       Print help information
    -V, --version    Print version information
    -c, --config     <CONFIG>
                     Config file to use
"#
)]
struct Args {
    #[arg(short, long, required = false, help = "Config file to use.")]
    config: Option<String>,
}

async fn run() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();

    let config = match args.config {
        Some(path) => {
            if !Path::exists(Path::new(&path)) {
                error!("Config file not found: {path}");
                return Ok(());
            }
            let file = read_to_string(&path)?;
            toml::from_str::<GantryFileConfig>(&file)?.server
        }
        None => ServerConfig::default(),
    };

    // Demo application; the binary is only a thin caller of the startup
    // contract.
    let app = app_fn(|request| async move {
        let body = format!("{} {}\n", request.method(), request.path());
        Ok(CanonicalResponse::builder()
            .status(StatusCode::OK)
            .text(&body))
    });

    let server = Gantry::new(config, app);
    server.run().await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run().await {
        error!("Failed to start server: {}", e);
    }
    Ok(())
}
