//! Clients for the two remote collaborators: the weather/region backend and
//! the window actuator.

use crate::{
    Config, DeviceError, ServerError,
    model::{CommandReply, DeviceStatus, RegionSuggestion, WeatherSnapshot, WindowAction},
    provider::{esp32::Esp32Device, weather_server::WeatherServer},
};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::{fmt::Debug, sync::Arc};

pub mod esp32;
pub mod weather_server;

#[async_trait]
pub trait WeatherLookup: Send + Sync + Debug {
    /// Look up weather for free-text `location`. The input is trimmed before
    /// it is sent.
    async fn fetch_weather(&self, location: &str) -> Result<WeatherSnapshot, ServerError>;
}

#[async_trait]
pub trait RegionSearch: Send + Sync + Debug {
    /// Ranked autocomplete candidates. Blank queries yield an empty list
    /// without touching the network.
    async fn search_regions(&self, query: &str) -> Result<Vec<RegionSuggestion>, ServerError>;
}

#[async_trait]
pub trait DeviceLink: Send + Sync + Debug {
    async fn send_command(&self, action: WindowAction) -> Result<CommandReply, DeviceError>;

    async fn fetch_status(&self) -> Result<DeviceStatus, DeviceError>;
}

/// The set of clients the panel runs against.
#[derive(Debug, Clone)]
pub struct Services {
    pub weather: Arc<dyn WeatherLookup>,
    pub regions: Arc<dyn RegionSearch>,
    pub device: Arc<dyn DeviceLink>,
}

/// Construct the HTTP clients from config.
pub fn services_from_config(config: &Config) -> anyhow::Result<Services> {
    let http = Client::builder()
        .timeout(config.polling.http_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let server = Arc::new(WeatherServer::new(config.server_base(), http.clone())?);
    let device = Arc::new(Esp32Device::new(config.device_base(), http)?);

    Ok(Services {
        weather: server.clone(),
        regions: server,
        device,
    })
}

/// Validate a base URL and strip the trailing slash so paths can be appended.
pub(crate) fn normalize_base(base: &str) -> anyhow::Result<String> {
    let trimmed = base.trim().trim_end_matches('/');

    let url = Url::parse(trimmed).with_context(|| format!("Invalid base URL '{base}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!(
            "Unsupported scheme '{}' in base URL '{base}'. Use http or https.",
            url.scheme()
        ));
    }

    Ok(trimmed.to_string())
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let head: String = body.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

/// One-shot HTTP listener for checking what the clients put on the wire.
#[cfg(test)]
pub(crate) mod stub {
    use reqwest::Client;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Client that never routes loopback traffic through a proxy.
    pub(crate) fn client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    /// Accept a single connection, answer it with `status` and the JSON
    /// `body`, and resolve to the raw request text. Returns the base URL.
    pub(crate) async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\n\
                 content-type: application/json\r\n\
                 content-length: {}\r\n\
                 connection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8(raw).unwrap()
        });

        (base, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&raw[..end]).to_ascii_lowercase();
        let length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        raw.len() >= end + 4 + length
    }

    /// First line of the request, e.g. `GET /status HTTP/1.1`.
    pub(crate) fn request_line(raw: &str) -> &str {
        raw.lines().next().unwrap_or_default()
    }

    pub(crate) fn request_body(raw: &str) -> &str {
        raw.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or_default()
    }
}
