use anyhow::{anyhow, Result};
use hostgate::dns::dispatcher::{capture_panic_backtraces, Dispatcher};
use hostgate::error::Error::DNSError;
use hostgate::{Config, Engine, HostsFile, OverrideStore, SharedConfig, Stats, UpstreamPool};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();
    capture_panic_backtraces();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("hostgate".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;

    let upstreams = UpstreamPool::try_from_file(&config.nameservers_path, config.upstream_timeout)
        .await
        .map_err(|err| anyhow!("failed to read {}: {err}", config.nameservers_path))?;
    tracing::info!("starting with nameservers {:?}", upstreams.servers());

    let hosts_file = HostsFile::new(config.hosts_path.clone());
    let table = hosts_file.load().await?;
    let hosts_file = Arc::new(Mutex::new(hosts_file));
    tracing::info!("starting with override table {table}");

    let overrides = Arc::new(OverrideStore::new(table));
    let stats = Arc::new(Stats::new());
    if let Some(name) = &config.fault_trigger_name {
        tracing::warn!("fault trigger enabled: queries for {name} will fail with SERVFAIL");
    }
    let engine = Engine::new(overrides.clone(), Arc::new(upstreams), stats.clone())
        .with_fault_trigger(config.fault_trigger_name.clone());
    let dispatcher = Dispatcher::new(Arc::new(engine));

    tracing::info!("DNS listening on UDP {}", &config.dns_udp_bind_addr);
    tracing::info!("DNS listening on TCP {}", &config.dns_tcp_bind_addr);
    let dns_server = hostgate::dns::new(config.clone(), dispatcher).await?;
    let dns_handle = tokio::spawn(dns_server.block_until_done());

    tracing::info!("API listening on {}", &config.api_bind_addr);
    let api_server = hostgate::api::new(config.clone(), overrides, hosts_file, stats);
    let api_handle = tokio::spawn(api_server);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        Ok(dns_res) = dns_handle => {
            if let Err(err) = dns_res {
                return Err(DNSError(err).into())
            }
        }
        Ok(api_res) = api_handle => {
            if let Err(err) = api_res {
                return Err(err.into())
            }
        }
    }
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostgate=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<SharedConfig> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            tracing::debug!("loaded config from {config_file}");
            let config = Config::try_from_file(&config_file)?;
            Ok(Arc::new(config))
        }
    }
}
