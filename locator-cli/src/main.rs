//! Locator CLI
//!
//! Command-line interface for the store-locator geocoding cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use locator_api::{ApiConfig, ApiServer};
use locator_cache::{AddressWatcher, GeocodeCache, GeocodeState};
use locator_core::types::Address;
use locator_geocode::NominatimClient;

/// Locator - address geocoding for the store map
#[derive(Parser)]
#[command(name = "locator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode a single address
    Resolve {
        #[command(flatten)]
        address: AddressArgs,
        /// Geocoder search endpoint
        #[arg(long, env = "GEOCODER_ENDPOINT")]
        endpoint: Option<String>,
        /// Client identifier sent to the geocoder
        #[arg(long, env = "GEOCODER_USER_AGENT")]
        user_agent: Option<String>,
    },

    /// Print the query key an address renders to
    Key {
        #[command(flatten)]
        address: AddressArgs,
    },

    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
    },
}

#[derive(Args)]
struct AddressArgs {
    /// Street line
    #[arg(long)]
    street: String,
    /// City
    #[arg(long)]
    city: String,
    /// State code
    #[arg(long)]
    state: String,
    /// Postal code
    #[arg(long)]
    zip: String,
}

impl From<AddressArgs> for Address {
    fn from(args: AddressArgs) -> Self {
        Address::new(args.street, args.city, args.state, args.zip)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "locator=debug,info"
    } else {
        "locator=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Resolve {
            address,
            endpoint,
            user_agent,
        } => cmd_resolve(address.into(), endpoint, user_agent).await,
        Commands::Key { address } => cmd_key(address.into()),
        Commands::Serve { port, bind } => cmd_serve(port, &bind).await,
    }
}

/// Geocode one address through a fresh cache and watch it settle
async fn cmd_resolve(
    address: Address,
    endpoint: Option<String>,
    user_agent: Option<String>,
) -> Result<()> {
    let ApiConfig { mut geocoder, cache } = ApiConfig::from_env();
    if let Some(endpoint) = endpoint {
        geocoder.endpoint = endpoint;
    }
    if let Some(ua) = user_agent {
        geocoder = geocoder.with_user_agent(ua);
    }

    let client = NominatimClient::with_config(geocoder).context("Invalid geocoder configuration")?;
    println!("{} {}", "🔍 Resolving:".cyan().bold(), address.query_key());
    println!("   {} {}", "Geocoder:".dimmed(), client.config().endpoint);

    let cache = GeocodeCache::with_config(Arc::new(client), cache)
        .context("Failed to start geocode cache")?;

    let watcher = AddressWatcher::new(Arc::new(cache), address);
    let state = watcher.settled().await;
    let coord = state.coordinate().context("Lookup did not settle")?;

    if let GeocodeState::Fallback(_) = state {
        println!("\n{}", "⚠️  No usable match, using fallback location".yellow().bold());
    } else {
        println!("\n{}", "✅ Resolved:".green().bold());
    }
    println!("   {} {:.6}", "Latitude:".dimmed(), coord.lat);
    println!("   {} {:.6}", "Longitude:".dimmed(), coord.lng);

    Ok(())
}

/// Print the query key
fn cmd_key(address: Address) -> Result<()> {
    println!("{}", address.query_key());
    Ok(())
}

/// Run the API server
async fn cmd_serve(port: u16, bind: &str) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .context("Invalid bind address")?;

    println!("{} http://{}", "🚀 Starting Locator API server on".cyan().bold(), addr);
    println!();
    println!("   {}", "Endpoints:".yellow());
    println!("   GET  /health");
    println!("   GET  /api/v1/geocode?street=&city=&state=&zip=");
    println!("   POST /api/v1/geocode/batch");
    println!("   GET  /api/v1/geocode/key?street=&city=&state=&zip=");
    println!("   GET  /api/v1/cache/stats");
    println!("   POST /api/v1/cache/clear");
    println!();

    let server = ApiServer::new(ApiConfig::from_env()).context("Failed to configure API server")?;
    server.run(addr).await?;

    Ok(())
}
