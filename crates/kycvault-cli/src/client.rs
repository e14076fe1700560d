//! HTTP client for the node API.

use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use kycvault_core::{Address, Receipt, RegistryCall, Submission};
use kycvault_crypto::{KeyPair, SignedEnvelope};

/// Default API endpoint of a local node.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9101";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct NonceResponse {
    nonce: u64,
}

/// Thin wrapper over `reqwest` that turns error bodies into `anyhow` errors.
pub struct NodeClient {
    endpoint: String,
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.endpoint, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        match resp.json::<ErrorResponse>().await {
            Ok(err) => anyhow::bail!("node rejected the request (HTTP {}): {}", status, err.error),
            Err(_) => anyhow::bail!("node returned HTTP {}", status),
        }
    }

    /// GET `path` under `/api/v1`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("could not reach node at {}", self.endpoint))?;
        Self::decode(resp).await
    }

    /// POST a JSON body to `path` under `/api/v1`.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("could not reach node at {}", self.endpoint))?;
        Self::decode(resp).await
    }

    /// The next nonce the node expects from `account`.
    pub async fn nonce(&self, account: &Address) -> anyhow::Result<u64> {
        let resp: NonceResponse = self.get(&format!("/accounts/{account}/nonce")).await?;
        Ok(resp.nonce)
    }

    /// Sign `call` with the next nonce and submit it.
    pub async fn submit(&self, keypair: &KeyPair, call: RegistryCall) -> anyhow::Result<Receipt> {
        let nonce = self.nonce(&keypair.address()).await?;
        let path = submit_path(&call);
        tracing::debug!(method = call.method(), nonce, "submitting call");
        let envelope = SignedEnvelope::seal(keypair, Submission { nonce, call })?;
        self.post(path, &envelope).await
    }
}

/// The endpoint that accepts `call`.
pub fn submit_path(call: &RegistryCall) -> &'static str {
    match call {
        RegistryCall::IssueCredential { .. } => "/credentials/issue",
        RegistryCall::RevokeCredential { .. } => "/credentials/revoke",
        RegistryCall::GrantConsent { .. } => "/consents/grant",
        RegistryCall::RevokeConsent { .. } => "/consents/revoke",
    }
}

/// Print a receipt the way every submitting command does.
pub fn print_receipt(receipt: &Receipt) {
    println!("Submitted.");
    println!("  Sequence: {}", receipt.sequence);
    println!("  Event:    {}", receipt.event);
}
