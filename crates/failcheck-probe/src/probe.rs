//! Single-shot content probe.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use failcheck_core::ContentCheck;

use crate::error::{ProbeError, ProbeResult};

/// Fetches a check's URL and reports whether the expected content is there.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, check: &ContentCheck) -> ProbeResult<bool>;
}

/// Parse `raw` as an absolute http(s) URL.
///
/// Runs before any network call.
pub fn validate_url(raw: &str) -> ProbeResult<Url> {
    let url = Url::parse(raw).map_err(|e| ProbeError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProbeError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

/// Probe backed by reqwest.
///
/// Holds one verifying client and one that skips certificate checks; the
/// latter is only used for checks that explicitly opt in.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    strict: Client,
    insecure: Client,
}

impl HttpProbe {
    pub fn new() -> ProbeResult<Self> {
        let strict = Client::builder().build().map_err(ProbeError::Client)?;
        let insecure = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(ProbeError::Client)?;
        Ok(Self { strict, insecure })
    }

    fn client_for(&self, check: &ContentCheck) -> &Client {
        if check.skip_tls_verify() {
            &self.insecure
        } else {
            &self.strict
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, check: &ContentCheck) -> ProbeResult<bool> {
        debug!(url = check.url(), content = check.expected(), "checking for content at url");

        let url = validate_url(check.url())?;

        let mut request = self
            .client_for(check)
            .get(url)
            .header(USER_AGENT, "failcheck/0.1");
        if let Some((user, password)) = check.basic_auth() {
            request = request.basic_auth(user, password);
        }

        let response = request.send().await.map_err(|source| ProbeError::Fetch {
            url: check.url().to_string(),
            source,
        })?;
        let status = response.status();

        let body = response.bytes().await.map_err(|source| ProbeError::Read {
            url: check.url().to_string(),
            source,
        })?;
        let body = String::from_utf8_lossy(&body);

        let matched = body.contains(check.expected());
        if matched {
            debug!(url = check.url(), %status, "found expected content");
        } else {
            warn!(
                url = check.url(),
                %status,
                content = check.expected(),
                "did not find the expected content"
            );
        }
        Ok(matched)
    }
}
