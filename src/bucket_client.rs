use crate::configuration::BucketSettings;
use crate::utils::error_chain_fmt;
use secrecy::{ExposeSecret, Secret};
use std::fmt::{Debug, Formatter};

pub const ACL_HEADER: &str = "x-amz-acl";

/// Canned ACLs understood by the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum AccessPolicy {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
}

#[derive(thiserror::Error)]
pub enum BucketError {
    #[error("Invalid object url for key `{0}`")]
    InvalidUrl(String),
    #[error("Bucket rejected the upload")]
    Rejected(#[source] reqwest::Error),
    #[error("Failed to reach the bucket")]
    Unreachable(#[source] reqwest::Error),
}

impl Debug for BucketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct BucketClient {
    http_client: reqwest::Client,
    endpoint: reqwest::Url,
    bucket_name: String,
    public_base_url: reqwest::Url,
    auth_token: Secret<String>,
}

fn parse_base_url(name: &str, value: &str) -> Result<reqwest::Url, anyhow::Error> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| anyhow::anyhow!("Invalid bucket {} `{}`: {}", name, value, e))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("Invalid bucket {} `{}`: not a base url", name, value);
    }
    Ok(url)
}

// Each segment is percent-encoded on its own, so `/`, `?`, `#` and `..` in a
// key never escape the object's path
fn append_segments(base: &reqwest::Url, segments: &[&str]) -> Option<reqwest::Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    Some(url)
}

impl BucketClient {
    pub fn new(settings: &BucketSettings) -> Result<Self, anyhow::Error> {
        let endpoint = parse_base_url("endpoint", &settings.endpoint)?;
        let public_base_url = parse_base_url("public base url", &settings.public_base_url)?;
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            http_client,
            endpoint,
            bucket_name: settings.bucket_name.clone(),
            public_base_url,
            auth_token: settings.auth_token.clone(),
        })
    }

    pub fn public_url(&self, key: &str) -> Result<String, BucketError> {
        append_segments(&self.public_base_url, &[key])
            .map(String::from)
            .ok_or_else(|| BucketError::InvalidUrl(key.to_string()))
    }

    /// Stores `bytes` under `key` and returns the object's public URL.
    #[tracing::instrument(name = "Upload object to bucket", skip(self, bytes), fields(size = bytes.len()))]
    pub async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        policy: AccessPolicy,
    ) -> Result<String, BucketError> {
        let url = append_segments(&self.endpoint, &[self.bucket_name.as_str(), key])
            .ok_or_else(|| BucketError::InvalidUrl(key.to_string()))?;
        let public_url = self.public_url(key)?;

        self.http_client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(ACL_HEADER, policy.as_ref())
            .bearer_auth(self.auth_token.expose_secret())
            .body(bytes)
            .send()
            .await
            .map_err(BucketError::Unreachable)?
            .error_for_status()
            .map_err(BucketError::Rejected)?;

        Ok(public_url)
    }
}
