// SPDX-License-Identifier: MIT OR Apache-2.0
//! Client side of the encoding service protocol.
//!
//! | Call   | Request                                          | Response      |
//! |--------|--------------------------------------------------|---------------|
//! | start  | `POST /start`, headers `token`, `frames`         | empty         |
//! | frame  | `POST /frame`, headers `token`, `index`, PNG body | empty         |
//! | finish | `POST /finish`, header `token`                   | artifact URL  |

use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::error::TransportError;
use crate::settings::ExportSettings;

/// Connection to an encoding service.
///
/// Cloned into every upload task, so implementations should be cheap to
/// clone (share the connection pool).
pub trait EncoderTransport: Clone + Send + Sync + 'static {
    /// Open a session expecting `frames` frames
    fn start(&self, token: &str, frames: u32) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Upload one PNG frame
    fn send_frame(
        &self,
        token: &str,
        index: u32,
        png: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the session, returning the URL of the encoded video
    fn finish(&self, token: &str) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// Fetch the encoded video
    fn download(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// HTTP transport to a service on `base_url`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for a service such as `http://localhost:67`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a transport sharing an existing client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Create a transport for the service configured in `settings`
    pub fn from_settings(settings: &ExportSettings) -> Self {
        Self::new(settings.service_url.as_str())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl EncoderTransport for HttpTransport {
    fn start(&self, token: &str, frames: u32) -> impl Future<Output = Result<(), TransportError>> + Send {
        let request = self
            .client
            .post(self.url("start"))
            .header("token", token)
            .header("frames", frames.to_string());

        async move {
            request.send().await?.error_for_status()?;
            Ok(())
        }
    }

    fn send_frame(
        &self,
        token: &str,
        index: u32,
        png: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        let request = self
            .client
            .post(self.url("frame"))
            .header("token", token)
            .header("index", index.to_string())
            .header(CONTENT_TYPE, "image/png")
            .body(png);

        async move {
            request.send().await?.error_for_status()?;
            Ok(())
        }
    }

    fn finish(&self, token: &str) -> impl Future<Output = Result<String, TransportError>> + Send {
        let request = self.client.post(self.url("finish")).header("token", token);

        async move {
            let url = request.send().await?.error_for_status()?.text().await?;
            let url = url.trim().to_string();
            if url.is_empty() {
                return Err(TransportError::Service(
                    "finish returned no artifact location".to_string(),
                ));
            }
            Ok(url)
        }
    }

    fn download(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send {
        let request = self.client.get(url);

        async move {
            let bytes = request.send().await?.error_for_status()?.bytes().await?;
            Ok(bytes.to_vec())
        }
    }
}
