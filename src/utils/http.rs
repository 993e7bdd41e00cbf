use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::errors::FetchFailure;

/// What the scraper needs to know about an HTTP response.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    /// URI of the request that produced this response. Redirects are never followed.
    pub final_url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// All values of a (possibly repeated) header, case-insensitive on the name.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[async_trait(?Send)]
pub trait HttpClient {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<Response, FetchFailure>;

    async fn get(
        &self,
        url: &str,
        cookies: &[(&str, &str)],
        query: &[(&str, &str)],
    ) -> Result<Response, FetchFailure>;
}

/// `HttpClient` backed by reqwest. Cookies are attached explicitly per request, there is no jar.
///
/// Redirects are not followed: the login answer is a redirect whose own `Set-Cookie` and body
/// carry the session and the interstitial link.
pub struct PortalClient {
    client: Client,
}

impl PortalClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("culearn_grades/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::none())
            .build()
            .context("Failed to build the client")?;
        Ok(PortalClient { client })
    }
}

fn transport_error(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Network(e.into())
    }
}

async fn into_response(response: reqwest::Response) -> Result<Response, FetchFailure> {
    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            // Cookie attributes sometimes carry latin-1 bytes; keep the header rather than drop it.
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            (name.as_str().to_string(), value)
        })
        .collect();
    let body = response.text().await.map_err(transport_error)?;
    Ok(Response { status, final_url, headers, body })
}

#[async_trait(?Send)]
impl HttpClient for PortalClient {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<Response, FetchFailure> {
        let mut request = self.client.post(url).form(form);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(transport_error)?;
        into_response(response).await
    }

    async fn get(
        &self,
        url: &str,
        cookies: &[(&str, &str)],
        query: &[(&str, &str)],
    ) -> Result<Response, FetchFailure> {
        let mut request = self.client.get(url).query(query);
        if !cookies.is_empty() {
            let header = cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.header(COOKIE, header);
        }
        let response = request.send().await.map_err(transport_error)?;
        into_response(response).await
    }
}
