//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that geo settings come as a complete set
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - File existence is not checked here; the geo loader reports it

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::GateConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("filter.tags requires filter.codeFile")]
    MissingCodeFile,

    #[error("filter.tags requires at least one filter.geoFiles entry")]
    MissingGeoFiles,

    #[error("filter.geoFiles/codeFile given without filter.tags")]
    GeoFilesWithoutTags,

    #[error("filter.headerBearer requires at least one filter.headers entry")]
    NoHeaders,

    #[error("invalid header name in filter.headers: {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid {field}: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_addr(&mut errors, "upstream.address", &config.upstream.address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    let filter = &config.filter;
    if filter.enabled {
        if filter.tags.is_empty() {
            if filter.code_file.is_some() || !filter.geo_files.is_empty() {
                errors.push(ValidationError::GeoFilesWithoutTags);
            }
        } else {
            if filter.code_file.is_none() {
                errors.push(ValidationError::MissingCodeFile);
            }
            if filter.geo_files.is_empty() {
                errors.push(ValidationError::MissingGeoFiles);
            }
        }

        if filter.header_bearer && filter.headers.is_empty() {
            errors.push(ValidationError::NoHeaders);
        }
        for name in &filter.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                errors.push(ValidationError::InvalidHeaderName(name.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
