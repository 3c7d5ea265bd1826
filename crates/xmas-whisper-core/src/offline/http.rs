use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use super::{Fetcher, Request, Response};
use crate::error::OfflineError;

/// Live fetches over HTTP.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, OfflineError> {
        let failed = |e: reqwest::Error| OfflineError::FetchFailed {
            url: request.url.clone(),
            message: e.to_string(),
        };
        let resp = self.client.get(&request.url).send().await.map_err(failed)?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await.map_err(failed)?.to_vec();
        Ok(Response {
            status,
            content_type,
            body,
        })
    }
}
