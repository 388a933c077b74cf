//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the filter chain, reading geo tables once
//! - Decide which client address sources are trusted
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A disabled filter skips table loading entirely

use std::path::Path;
use std::sync::Arc;

use axum::http::{header::InvalidHeaderName, uri::InvalidUri};
use thiserror::Error;

use crate::config::{load_config, ConfigError, GateConfig};
use crate::filter::FilterChain;
use crate::http::GateServer;
use crate::ipset::GeoError;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::security::{AccessControlState, IpExtractor};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("filter: {0}")]
    Filter(#[from] GeoError),

    #[error("client address headers: {0}")]
    Header(#[from] InvalidHeaderName),

    #[error("upstream address: {0}")]
    Upstream(#[from] InvalidUri),
}

/// Everything the server needs, fully initialized.
#[derive(Clone)]
pub struct Gate {
    pub config: GateConfig,
    pub access: AccessControlState,
}

impl Gate {
    pub fn chain(&self) -> &FilterChain {
        &self.access.chain
    }

    pub fn into_server(self) -> Result<GateServer, StartupError> {
        Ok(GateServer::new(self.config, self.access)?)
    }
}

/// Build the gate from an already validated config.
pub fn prepare(config: GateConfig, shutdown: &Shutdown) -> Result<Gate, StartupError> {
    let filter = &config.filter;

    let (chain, extractor) = if filter.enabled {
        let chain = FilterChain::from_config(filter, shutdown)?;
        let extractor = IpExtractor::from_names(filter.header_bearer, &filter.headers)?;
        if extractor.trusts_headers() {
            tracing::warn!(
                headers = ?filter.headers,
                "Trusting client address headers; only safe behind a proxy that overwrites them"
            );
        }
        (chain, extractor)
    } else {
        tracing::warn!("Filter disabled; all requests pass through");
        (FilterChain::default(), IpExtractor::direct())
    };

    metrics::record_chain(&chain);

    let access = AccessControlState {
        chain: Arc::new(chain),
        extractor: Arc::new(extractor),
        enabled: filter.enabled,
    };

    Ok(Gate { config, access })
}

/// Load the config at `path` and prepare the gate from it.
pub fn load(path: &Path, shutdown: &Shutdown) -> Result<Gate, StartupError> {
    let config = load_config(path)?;
    tracing::info!(
        path = %path.display(),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        filter_enabled = config.filter.enabled,
        "Configuration loaded"
    );
    prepare(config, shutdown)
}
