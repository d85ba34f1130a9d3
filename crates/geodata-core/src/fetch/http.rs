use std::path::Path;

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use super::{ArtifactSource, Fetched, write_replacing};
use crate::config::NetworkSettings;
use crate::error::{BootstrapError, Result};

/// Plain HTTP(S) GET without authentication or retries.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(network: &NetworkSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(network.user_agent.clone())
            .timeout(network.timeout)
            .build()
            .map_err(|source| BootstrapError::Network {
                url: "<client>".to_string(),
                source,
            })?;
        Ok(Self { client })
    }
}

impl ArtifactSource for HttpSource {
    fn scheme(&self) -> &'static str {
        "http"
    }

    fn fetch_to(
        &self,
        locator: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<Fetched> {
        let url = Url::parse(locator)
            .map_err(|err| BootstrapError::Config(format!("invalid URL `{locator}`: {err}")))?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| BootstrapError::Network {
                url: locator.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(BootstrapError::HttpStatus {
                url: locator.to_string(),
                status: status.as_u16(),
            });
        }
        debug!(%url, dest = %dest.display(), "streaming response body");
        write_replacing(response, locator, dest, expected_sha256)
    }
}
