use crate::api::routes;
use crate::config::SharedConfig;
use crate::overrides::{SharedHostsFile, SharedOverrides};
use crate::stats::SharedStats;
use std::future::Future;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub overrides: SharedOverrides,
    pub hosts_file: SharedHostsFile,
    pub stats: SharedStats,
}

pub fn new(
    config: SharedConfig,
    overrides: SharedOverrides,
    hosts_file: SharedHostsFile,
    stats: SharedStats,
) -> impl Future<Output = hyper::Result<()>> {
    let bind_addr = config.api_bind_addr;
    axum::Server::bind(&bind_addr).serve(
        routes::new(AppState {
            config,
            overrides,
            hosts_file,
            stats,
        })
        .into_make_service(),
    )
}
