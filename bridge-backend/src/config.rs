// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Environment configuration for the bridge backend.

use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 20;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PORT: u16 = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// GraphQL endpoint of the bridge indexer
    pub indexer_url: String,
    /// Chain filter applied when a request does not name one
    pub l2_chain_name: Option<String>,
    /// Indexer's per-request row cap; also the aggregate batch size
    pub max_page_size: u32,
    pub items_per_page: u32,
    pub request_timeout: Duration,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Config {
    pub fn new(indexer_url: impl Into<String>) -> Self {
        Self {
            indexer_url: indexer_url.into(),
            l2_chain_name: None,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            port: DEFAULT_PORT,
            log_format: LogFormat::Text,
        }
    }

    /// Load settings from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let indexer_url = lookup("BRIDGE_INDEXER_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("BRIDGE_INDEXER_URL"))?;

        let mut config = Config::new(indexer_url);
        config.l2_chain_name = lookup("L2_CHAIN_NAME").filter(|name| !name.trim().is_empty());
        config.max_page_size = parse_positive(&lookup, "INDEXER_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?;
        config.items_per_page = parse_positive(&lookup, "ITEMS_PER_PAGE", DEFAULT_ITEMS_PER_PAGE)?;
        config.request_timeout = Duration::from_secs(parse_positive(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?);
        config.port = parse_var(&lookup, "PORT", DEFAULT_PORT)?;
        config.log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected 'text' or 'json'".to_string(),
                })
            }
        };

        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}

fn parse_positive<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + Copy + ToString,
    T::Err: std::fmt::Display,
{
    let value = parse_var(lookup, name, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
