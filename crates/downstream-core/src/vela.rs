//! Vela REST API client.
//!
//! Talks to `{server}/api/v1/repos/{org}/{repo}/builds` with a bearer token
//! fixed at construction time.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LINK};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::client::{BuildClient, BuildPage, ListOptions};
use crate::error::{ClientError, ClientResult};
use crate::model::BuildSummary;

/// Connection settings for a Vela server.
#[derive(Clone)]
pub struct VelaConfig {
    /// Vela server URL, e.g. `https://vela.example.com`
    pub server_url: String,
    /// Personal access token
    pub token: String,
}

impl VelaConfig {
    pub fn new(server_url: &str, token: &str) -> Self {
        VelaConfig {
            server_url: server_url.to_string(),
            token: token.to_string(),
        }
    }
}

impl fmt::Debug for VelaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VelaConfig")
            .field("server_url", &self.server_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// `reqwest`-backed [`BuildClient`].
pub struct VelaClient {
    base: Url,
    http_client: reqwest::Client,
}

impl VelaClient {
    pub fn new(config: VelaConfig) -> ClientResult<Self> {
        trace!("creating new Vela client from plugin configuration");

        let base = Url::parse(&config.server_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", config.server_url)))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ClientError::InvalidToken)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("vela-downstream/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(VelaClient { base, http_client })
    }

    fn builds_url(&self, org: &str, repo: &str, number: Option<u64>) -> ClientResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?;
            segments
                .pop_if_empty()
                .extend(["api", "v1", "repos", org, repo, "builds"]);
            if let Some(number) = number {
                segments.push(&number.to_string());
            }
        }
        Ok(url)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Page number of the `rel="next"` entry in a `Link` header, or 0.
pub fn next_page_from_link(header: &str) -> u32 {
    header
        .split(',')
        .find_map(|entry| {
            let (target, params) = entry.split_once(';')?;
            let is_next = params
                .split(';')
                .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
            if !is_next {
                return None;
            }
            let url = target.trim().trim_start_matches('<').trim_end_matches('>');
            let url = Url::parse(url).ok()?;
            url.query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse::<u32>().ok())
        })
        .unwrap_or(0)
}

#[async_trait]
impl BuildClient for VelaClient {
    async fn list_builds(
        &self,
        org: &str,
        repo: &str,
        opts: &ListOptions,
    ) -> ClientResult<BuildPage> {
        let url = self.builds_url(org, repo, None)?;
        let mut query: Vec<(&str, String)> = vec![
            ("page", opts.page.to_string()),
            ("per_page", opts.per_page.to_string()),
        ];
        if let Some(branch) = opts.branch.as_deref().filter(|b| !b.is_empty()) {
            query.push(("branch", branch.to_string()));
        }
        if let Some(event) = opts.event {
            query.push(("event", event.as_str().to_string()));
        }

        debug!(%url, page = opts.page, "listing builds");
        let response = self.http_client.get(url).query(&query).send().await?;
        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(next_page_from_link)
            .unwrap_or(0);
        let builds: Vec<BuildSummary> = decode(response).await?;

        Ok(BuildPage { builds, next_page })
    }

    async fn get_build(&self, org: &str, repo: &str, number: u64) -> ClientResult<BuildSummary> {
        let url = self.builds_url(org, repo, Some(number))?;
        debug!(%url, "fetching build");
        let response = self.http_client.get(url).send().await?;
        decode(response).await
    }

    async fn restart_build(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> ClientResult<BuildSummary> {
        let url = self.builds_url(org, repo, Some(number))?;
        debug!(%url, "restarting build");
        let response = self.http_client.post(url).send().await?;
        decode(response).await
    }
}
