use std::future::Future;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::composer::prompts::NOTE_FALLBACK;
use crate::composer::{Composer, GenerationResult, Selection};

/// Where the wizard gets its card content from. Implementations never fail;
/// they hand back fallback content instead.
pub trait CardSource {
    fn fetch(&self, selection: &Selection) -> impl Future<Output = GenerationResult> + Send;
}

impl CardSource for Composer {
    async fn fetch(&self, selection: &Selection) -> GenerationResult {
        self.compose(selection).await
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

/// Missing image becomes empty, missing or blank note becomes the fallback.
pub fn with_client_fallbacks(image: Option<String>, note: Option<String>) -> GenerationResult {
    let note = note
        .filter(|note| !note.trim().is_empty())
        .unwrap_or_else(|| NOTE_FALLBACK.to_string());
    GenerationResult {
        image: image.unwrap_or_default(),
        note,
    }
}

/// Calls a running composer over `POST /generate`.
#[derive(Debug, Clone)]
pub struct HttpCardSource {
    client: Client,
    endpoint: Url,
}

impl HttpCardSource {
    pub fn new(client: Client, server: &str) -> Result<Self> {
        let base = Url::parse(server).map_err(|err| anyhow!("Invalid server URL '{server}': {err}"))?;
        let endpoint = base
            .join("generate")
            .map_err(|err| anyhow!("Invalid server URL '{server}': {err}"))?;
        Ok(HttpCardSource { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request(&self, selection: &Selection) -> Result<GenerateResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(selection)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<GenerateResponse>().await?)
    }
}

impl CardSource for HttpCardSource {
    async fn fetch(&self, selection: &Selection) -> GenerationResult {
        match self.request(selection).await {
            Ok(body) => with_client_fallbacks(body.image, body.note),
            Err(err) => {
                warn!("Card request to {} failed: {}", self.endpoint, err);
                with_client_fallbacks(None, None)
            }
        }
    }
}
