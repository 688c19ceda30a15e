//! NextGCore NEF (Network Exposure Function)
//!
//! The NEF exposes network capabilities to Application Functions:
//! - Traffic influence subscriptions (TS 29.522, 3gpp-traffic-influence)
//! - Translation into PCF app sessions (TS 29.514, Npcf_PolicyAuthorization)
//! - PCF discovery through the NRF (TS 29.510, Nnrf_NFDiscovery)

use anyhow::{Context, Result};
use clap::Parser;
use nextgcore_nefd::{
    nef_context_final, nef_context_init, nef_nbi_request_handler, nef_self, NefConfig,
    PcfDiscovery, PolicySessionClient, SbiClientPool, SbiNrfClient, SbiPcfClient,
    TrafficInfluenceService,
};
use ogs_sbi::server::{SbiServer, SbiServerConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// NextGCore NEF - Network Exposure Function
#[derive(Parser, Debug)]
#[command(name = "nextgcore-nefd")]
#[command(author = "NextGCore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "5G Core Network Exposure Function", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, default_value = "/etc/nextgcore/nef.yaml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'e', long, default_value = "info")]
    log_level: String,

    /// Disable color output
    #[arg(short = 'm', long)]
    no_color: bool,

    /// Northbound server address, overrides nbi.fqdn
    #[arg(long)]
    nbi_addr: Option<String>,

    /// Northbound server port, overrides nbi.port
    #[arg(long)]
    nbi_port: Option<u16>,

    /// NRF URI, overrides sbi.nrfSvc
    #[arg(long)]
    nrf_uri: Option<String>,
}

impl Args {
    fn apply_overrides(&self, config: &mut NefConfig) {
        if let Some(addr) = &self.nbi_addr {
            config.nbi.fqdn = addr.clone();
        }
        if let Some(port) = self.nbi_port {
            config.nbi.port = port;
        }
        if let Some(uri) = &self.nrf_uri {
            config.sbi.nrf_svc = uri.clone();
        }
    }
}

/// Initialize logging based on command line arguments
fn init_logging(args: &Args) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };
    builder.filter_level(level);
    builder.format_timestamp_millis();

    if args.no_color {
        builder.write_style(env_logger::WriteStyle::Never);
    }

    builder.try_init().context("Failed to initialize logging")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        shutdown.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    Ok(())
}

fn load_config(args: &Args) -> Result<NefConfig> {
    let mut config = NefConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    let app_id = uuid::Uuid::new_v4();
    log::info!("NextGCore NEF v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Application instance id: {app_id}");

    let config = load_config(&args)?;
    log::info!("Running configuration:\n{}", config.dumps());

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    nef_context_init();

    let pool = Arc::new(SbiClientPool::new(
        config.sbi.http_version(),
        config.sbi.request_timeout(),
    ));
    let nrf = Arc::new(SbiNrfClient::new(config.sbi.nrf_svc.clone(), pool.clone()));
    let pcf = Arc::new(SbiPcfClient::new(pool.clone()));
    let service = Arc::new(TrafficInfluenceService::new(
        nef_self(),
        PcfDiscovery::new(config.sbi.clone(), nrf),
        PolicySessionClient::new(pcf),
        config.supported_features.clone(),
    ));

    let bind = format!("{}:{}", config.nbi.fqdn, config.nbi.port);
    let addr = tokio::net::lookup_host(&bind)
        .await
        .with_context(|| format!("Cannot resolve northbound address {bind}"))?
        .next()
        .with_context(|| format!("No address for {bind}"))?;

    let nbi_server = SbiServer::new(SbiServerConfig::new(addr));
    let handler_service = service.clone();
    let local_addr = nbi_server
        .start(move |request| {
            let service = handler_service.clone();
            async move { nef_nbi_request_handler(&service, request).await }
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start NBI server: {e}"))?;

    log::info!("NBI server listening on {local_addr} (HTTP/1.1, HTTP/2)");
    log::info!("NextGCore NEF ready");

    // Main event loop
    let mut tick = tokio::time::interval(Duration::from_millis(100));
    while !shutdown.load(Ordering::SeqCst) {
        tick.tick().await;
    }

    log::info!("Shutting down...");
    nbi_server
        .stop()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to stop NBI server: {e}"))?;
    log::info!("NBI server stopped");

    pool.clear().await;
    nef_context_final();
    log::info!("NEF context finalized");

    log::info!("NextGCore NEF stopped");
    Ok(())
}
