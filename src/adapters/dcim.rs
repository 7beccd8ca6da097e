use crate::config::DcimSettings;
use crate::domain::model::{Device, FrontPort, Interface, Rack, RackFace};
use crate::domain::ports::InventorySource;
use crate::utils::error::{ReportError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

/// NetBox accepts `Token <key>` (v1 tokens) and `Bearer <key>` (v2); a bare key gets `Token `.
pub fn authorization_header(token: &str) -> String {
    let token = token.trim();
    if token.starts_with("Token ") || token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Token {}", token)
    }
}

/// Blocking-in-spirit NetBox client: one request at a time, first results page only.
pub struct DcimClient {
    base_url: String,
    authorization: String,
    page_limit: Option<usize>,
    client: Client,
}

impl DcimClient {
    pub fn new(settings: &DcimSettings) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(settings.timeout_seconds));

        if settings.insecure_tls {
            tracing::warn!(
                "⚠️ TLS certificate validation disabled for {}",
                settings.url
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| ReportError::ConfigError {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            authorization: authorization_header(&settings.token),
            page_limit: settings.page_limit,
            client,
        })
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            ReportError::InvalidConfigValueError {
                field: "dcim.url".to_string(),
                value: self.base_url.clone(),
                reason: format!("Invalid URL format: {}", e),
            }
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    fn list_endpoint(&self, path: &str, filter: (&str, String)) -> Result<Url> {
        let mut query = vec![filter];
        if let Some(limit) = self.page_limit {
            query.push(("limit", limit.to_string()));
        }
        self.endpoint(path, &query)
    }

    async fn get(&self, resource: &str, url: Url, accept: &str) -> Result<Option<Response>> {
        tracing::debug!("GET {} ({})", url, resource);

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|source| ReportError::Transport {
                resource: resource.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Failed to fetch {}. Status code: {}", resource, status);
            return Ok(None);
        }

        Ok(Some(response))
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: &str, url: Url) -> Result<Option<T>> {
        let Some(response) = self.get(resource, url, "application/json").await? else {
            return Ok(None);
        };

        let body = response
            .text()
            .await
            .map_err(|source| ReportError::Transport {
                resource: resource.to_string(),
                source,
            })?;

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| ReportError::Decode {
                resource: resource.to_string(),
                source,
            })
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        resource: &str,
        url: Url,
    ) -> Result<Option<Vec<T>>> {
        let page: Option<Page<T>> = self.get_json(resource, url).await?;
        Ok(page.map(|p| p.results))
    }
}

impl InventorySource for DcimClient {
    async fn rack_id_by_name(&self, name: &str) -> Result<Option<u64>> {
        let resource = format!("rack lookup '{}'", name);
        let url = self.endpoint("/dcim/racks/", &[("name", name.to_string())])?;

        let Some(racks) = self.get_list::<Rack>(&resource, url).await? else {
            return Ok(None);
        };

        if racks.len() > 1 {
            tracing::warn!(
                "{} racks are named '{}'; using the first (id {})",
                racks.len(),
                name,
                racks[0].id
            );
        }

        match racks.into_iter().next() {
            Some(rack) => Ok(Some(rack.id)),
            None => Err(ReportError::RackNotFound {
                name: name.to_string(),
            }),
        }
    }

    async fn rack(&self, rack_id: u64) -> Result<Option<Rack>> {
        let url = self.endpoint(&format!("/dcim/racks/{}/", rack_id), &[])?;
        self.get_json(&format!("rack {}", rack_id), url).await
    }

    async fn rack_elevation(&self, rack_id: u64, face: RackFace) -> Result<Option<String>> {
        let resource = format!("{} elevation of rack {}", face.as_str(), rack_id);
        let url = self.endpoint(
            &format!("/dcim/racks/{}/elevation/", rack_id),
            &[
                ("face", face.as_str().to_string()),
                ("render", "svg".to_string()),
            ],
        )?;

        let Some(response) = self.get(&resource, url, "image/svg+xml, */*").await? else {
            return Ok(None);
        };

        response
            .text()
            .await
            .map(Some)
            .map_err(|source| ReportError::Transport { resource, source })
    }

    async fn devices_by_rack(&self, rack_id: u64) -> Result<Option<Vec<Device>>> {
        let url = self.list_endpoint("/dcim/devices/", ("rack_id", rack_id.to_string()))?;
        self.get_list(&format!("devices of rack {}", rack_id), url)
            .await
    }

    async fn interfaces_by_device(&self, device_id: u64) -> Result<Option<Vec<Interface>>> {
        let url = self.list_endpoint("/dcim/interfaces/", ("device_id", device_id.to_string()))?;
        self.get_list(&format!("interfaces of device {}", device_id), url)
            .await
    }

    async fn front_ports_by_device(&self, device_id: u64) -> Result<Option<Vec<FrontPort>>> {
        let url =
            self.list_endpoint("/dcim/front-ports/", ("device_id", device_id.to_string()))?;
        self.get_list(&format!("front ports of device {}", device_id), url)
            .await
    }

    async fn rendered_config(&self, device_id: u64) -> Result<Option<Vec<u8>>> {
        let resource = format!("rendered config of device {}", device_id);
        let url = self.endpoint(
            &format!("/dcim/devices/{}/render-config/", device_id),
            &[("export", "True".to_string())],
        )?;

        let Some(response) = self.get(&resource, url, "*/*").await? else {
            return Ok(None);
        };

        response
            .bytes()
            .await
            .map(|b| Some(b.to_vec()))
            .map_err(|source| ReportError::Transport { resource, source })
    }
}
