use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use initkit::{InstalledPlugin, PluginDescriptor, PluginRegistry};

use crate::error::PluginStoreError;

/// HTTP client for a plugin service.
///
/// `GET {base}/plugins` lists installed plugins as a JSON array,
/// `POST {base}/plugins` installs a descriptor. A 409 answer means the
/// identifier is taken.
#[derive(Debug, Clone)]
pub struct RemotePluginRegistry {
    client: Client,
    base_url: String,
    plugins_url: Url,
}

impl RemotePluginRegistry {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PluginStoreError> {
        let base = base_url.trim_end_matches('/');
        let plugins_url =
            Url::parse(&format!("{base}/plugins")).map_err(|source| PluginStoreError::InvalidBaseUrl {
                url: base_url.to_string(),
                source,
            })?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base.to_string(),
            plugins_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(name = "plugin_store.remote.list", skip(self))]
    pub async fn list(&self) -> Result<Vec<InstalledPlugin>, PluginStoreError> {
        let response = self.client.get(self.plugins_url.clone()).send().await?;
        let plugins: Vec<InstalledPlugin> = check(response).await?.json().await?;
        debug!(count = plugins.len(), "Listed installed plugins");
        Ok(plugins)
    }

    #[instrument(name = "plugin_store.remote.install", skip_all, fields(identifier = %descriptor.identifier))]
    pub async fn install(&self, descriptor: &PluginDescriptor) -> Result<(), PluginStoreError> {
        let response = self
            .client
            .post(self.plugins_url.clone())
            .json(descriptor)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Err(PluginStoreError::Duplicate {
                identifier: descriptor.identifier.clone(),
            });
        }
        check(response).await?;
        debug!("Plugin installed");
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, PluginStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PluginStoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl PluginRegistry for RemotePluginRegistry {
    async fn list_installed(&self) -> anyhow::Result<Vec<InstalledPlugin>> {
        Ok(self.list().await?)
    }

    async fn create(&self, descriptor: PluginDescriptor) -> anyhow::Result<()> {
        Ok(self.install(&descriptor).await?)
    }
}
