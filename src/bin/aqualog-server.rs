// ABOUTME: Main server binary for the Aqualog hydration tracking backend
// ABOUTME: Loads environment configuration, runs migrations, and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

//! # Aqualog Server Binary
//!
//! Starts the hydration tracking API with JWT authentication and an
//! `SQLite`-backed store.

use anyhow::Result;
use aqualog::{config::ServerConfig, database::Database, logging, server, server::ServerResources};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "aqualog-server")]
#[command(about = "Aqualog - hydration tracking and social engagement API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    info!("Starting Aqualog server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    database.migrate().await?;
    info!("Database migrated");

    let resources = Arc::new(ServerResources::new(database, config));
    server::serve(resources).await?;

    Ok(())
}
