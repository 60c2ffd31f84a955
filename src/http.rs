//! Blocking HTTP client used for the channel API and the EPG feed

use std::io::Read;
use std::time::Duration;

use log::debug;

use crate::config::AppConfig;
use crate::error::{Error, Result};

/// One GET, whole body in memory
pub trait HttpFetch: Send {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct UreqFetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqFetcher {
    pub fn new(config: &AppConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.read_timeout_secs)))
            .timeout_connect(Some(Duration::from_secs(config.connect_timeout_secs)))
            .max_idle_connections(4)
            .max_idle_connections_per_host(2)
            .build()
            .new_agent();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl HttpFetch for UreqFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| Error::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status != 200 {
            return Err(Error::Network(format!("HTTP error: {}", status)));
        }

        let mut body = Vec::new();
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| Error::Network(format!("Read failed: {}", e)))?;

        debug!("GET {} -> {} bytes", redact_query(url), body.len());
        Ok(body)
    }
}

/// Strip the query string so credentials never reach the log
pub fn redact_query(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}
