// SPDX-License-Identifier: MIT OR Apache-2.0
//! flypath encoding service.

use std::path::PathBuf;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use flypath_encoder::{configure, isolation_headers, AppState, EncoderSettings, ENCODER_SETTINGS_FILE};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "flypath-encoder", version)]
struct Args {
    /// Settings file (RON). Defaults are used if it does not exist.
    #[arg(long, default_value = ENCODER_SETTINGS_FILE)]
    config: PathBuf,

    /// Override the listening port.
    #[arg(long)]
    port: Option<u16>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("flypath_encoder=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting flypath encoder v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut settings = if args.config.exists() {
        match EncoderSettings::load(&args.config) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("Failed to load {:?}: {e}", args.config);
                std::process::exit(1);
            }
        }
    } else {
        EncoderSettings::default()
    };
    if let Some(port) = args.port {
        settings.port = port;
    }

    std::fs::create_dir_all(&settings.output_dir)?;
    let address = (settings.bind_address.clone(), settings.port);
    tracing::info!("Serving on {}:{}, output in {:?}", address.0, address.1, settings.output_dir);

    let state = web::Data::new(AppState::new(settings));
    HttpServer::new(move || {
        App::new()
            .wrap(isolation_headers())
            .configure(configure(state.clone()))
    })
    .bind(address)?
    .run()
    .await
}
