// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::process::exit;
use std::sync::Arc;

use simplemail::api::rest::{run_server, AppState};
use simplemail::config::Settings;
use simplemail::imap::client::create_imap_factory;
use simplemail::services::{email::EmailService, smtp::SmtpService};

#[derive(Parser, Debug)]
#[command(version, about = "REST API over an IMAP/SMTP mailbox", long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, env = "SIMPLEMAIL_CONFIG")]
    config: Option<String>,

    /// Address the REST server binds to.
    #[arg(long, env = "SIMPLEMAIL_HOST")]
    host: Option<String>,

    /// Port the REST server listens on.
    #[arg(short, long, env = "SIMPLEMAIL_PORT")]
    port: Option<u16>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = Settings::new(cli.config.as_deref()).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {}", err);
        exit(1);
    });
    if let Some(host) = cli.host {
        settings.rest.host = host;
    }
    if let Some(port) = cli.port {
        settings.rest.port = port;
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log.level.as_str()))
        .init();

    if settings.imap_user.is_empty() {
        error!("IMAP_USER is not set; every mailbox call will fail to log in");
    }

    let factory = create_imap_factory(&settings).unwrap_or_else(|e| {
        error!("Failed to prepare IMAP connector: {}", e);
        exit(1);
    });
    let smtp_service = SmtpService::from_settings(&settings).unwrap_or_else(|e| {
        error!("Failed to prepare SMTP transport: {}", e);
        exit(1);
    });
    let email_service = EmailService::from_settings(factory, &settings);

    info!(
        "IMAP {}:{} / SMTP {}:{} as {}",
        settings.imap_host,
        settings.imap_port,
        settings.smtp_host,
        settings.smtp_port,
        settings.smtp_sender()
    );

    let state = AppState {
        settings: Arc::new(settings),
        email_service: Arc::new(email_service),
        smtp_service: Arc::new(smtp_service),
    };

    match run_server(state).await {
        Ok(()) => {
            info!("REST server finished.");
            Ok(())
        }
        Err(e) => {
            error!("REST server failed: {}", e);
            Err(e)
        }
    }
}
