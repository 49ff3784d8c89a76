use anyhow::{Context, Result};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;
use crate::models::{RepositorySummary, SearchResponse, Statistics, TagSummary};
use crate::session::Session;

/// Status line and body of a request whose response is shown verbatim
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final request URL, query string included
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

pub struct HarborClient {
    client: Client,
    base_url: String,
    session: Option<Session>,
}

impl HarborClient {
    pub fn new(base_url: &str, insecure: bool) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /api/statistics
    pub async fn statistics(&self) -> Result<Statistics> {
        self.get_json("/api/statistics", &[])
            .await
            .context("Failed to fetch statistics")
    }

    /// GET /api/repositories/top?count=N
    pub async fn top_repositories(&self, count: u64) -> Result<Vec<RepositorySummary>> {
        let count = count.to_string();
        self.get_json("/api/repositories/top", &[("count", count.as_str())])
            .await
            .context("Failed to fetch top repositories")
    }

    /// GET /api/search?q=<query>, query percent-encoded. An empty query lists everything visible.
    pub async fn search(&self, query: &str) -> Result<SearchResponse> {
        self.get_json("/api/search", &[("q", query)])
            .await
            .with_context(|| format!("Failed to search for '{}'", query))
    }

    /// GET /api/repositories/<repo>/tags
    pub async fn list_tags(&self, repo: &str) -> Result<Vec<TagSummary>> {
        self.get_json(&format!("/api/repositories/{}/tags", repo), &[])
            .await
            .with_context(|| format!("Failed to fetch tags for {}", repo))
    }

    /// DELETE /api/repositories/<repo>
    pub async fn delete_repository(&self, repo: &str) -> Result<()> {
        self.delete(&format!("/api/repositories/{}", repo))
            .await
            .with_context(|| format!("Failed to DELETE repository {}", repo))
    }

    /// DELETE /api/repositories/<repo>/tags/<tag>
    pub async fn delete_tag(&self, repo: &str, tag: &str) -> Result<()> {
        self.delete(&format!("/api/repositories/{}/tags/{}", repo, tag))
            .await
            .with_context(|| format!("Failed to DELETE tag {}:{}", repo, tag))
    }

    /// Issue a request and hand back the status and body untouched
    pub async fn raw(&self, method: Method, path: &str, query: &[(&str, &str)]) -> Result<RawResponse> {
        let url = self.url(path);
        debug!("{} {} {:?}", method, url, query);
        let resp = self
            .request(method.clone(), &url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to {} {}", method, url))?;
        let url = resp.url().to_string();
        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("Failed to read response body of {} {}", method, url))?;
        Ok(RawResponse { url, status, body })
    }

    /// POST /login with form credentials; returns the session from Set-Cookie
    pub async fn login(&self, username: &str, password: &str) -> Result<(Session, RawResponse)> {
        let url = self.url("/login");
        debug!("POST {}", url);
        let resp = self
            .client
            .post(&url)
            .form(&[("principal", username), ("password", password)])
            .send()
            .await
            .with_context(|| format!("Failed to POST {}", url))?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        let session = Session::from_set_cookie(
            resp.headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AppError::UnexpectedStatus {
                method: "POST",
                url,
                status,
                body,
            }
            .into());
        }
        let session = session.ok_or(AppError::SessionCookieMissing)?;
        Ok((
            session,
            RawResponse {
                url: final_url,
                status,
                body,
            },
        ))
    }

    /// GET /log_out
    pub async fn logout(&self) -> Result<RawResponse> {
        self.raw(Method::GET, "/log_out", &[]).await
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.session {
            Some(session) => builder.header(COOKIE, session.cookie_header()),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, query);
        let resp = self
            .request(Method::GET, &url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", url))?;
        let resp = Self::ensure_success("GET", &url, resp).await?;
        resp.json()
            .await
            .with_context(|| format!("Failed to parse response of GET {}", url))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!("DELETE {}", url);
        let resp = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .with_context(|| format!("Failed to send DELETE {}", url))?;
        Self::ensure_success("DELETE", &url, resp).await?;
        Ok(())
    }

    async fn ensure_success(method: &'static str, url: &str, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(AppError::UnexpectedStatus {
            method,
            url: url.to_string(),
            status,
            body,
        }
        .into())
    }
}
