//! Client for an external passwordless-login signing bridge

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;

use super::{validate_email, AccountIdentity, BroadcastResult, IdentityService, SignedTransaction};
use crate::chain::messages::{FeeDescriptor, WireMessage};
use crate::error::{TransferError, TransferResult};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    request_id: String,
}

#[derive(Debug, Serialize)]
struct SessionRequest {
    request_id: String,
}

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    messages: &'a [WireMessage],
    fee: &'a FeeDescriptor,
    request_id: String,
}

/// Every bridge reply: `{success, error, stage, request_id, result}`
#[derive(Debug, Deserialize)]
struct BridgeReply<T> {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    /// Which step failed on sign-and-broadcast: "sign" or "broadcast"
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default = "Option::default")]
    result: Option<T>,
}

/// Signed envelope with byte fields base64 encoded
#[derive(Debug, Deserialize)]
struct SignedPayload {
    tx_bytes: String,
    sign_bytes: String,
    signatures: Vec<String>,
    #[serde(default)]
    public_key: Option<String>,
}

impl SignedPayload {
    fn decode(self) -> TransferResult<SignedTransaction> {
        let field = |name: &str, value: &str| {
            BASE64
                .decode(value)
                .map_err(|e| TransferError::Signing(format!("bridge returned bad {}: {}", name, e)))
        };

        Ok(SignedTransaction {
            tx_bytes: field("tx_bytes", &self.tx_bytes)?,
            sign_bytes: field("sign_bytes", &self.sign_bytes)?,
            signatures: self
                .signatures
                .iter()
                .map(|sig| field("signature", sig))
                .collect::<TransferResult<_>>()?,
            public_key: self.public_key.as_deref().map(|key| field("public_key", key)).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BroadcastPayload {
    transaction_hash: String,
}

pub struct BridgeIdentity {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    session: RwLock<Option<AccountIdentity>>,
}

impl BridgeIdentity {
    pub fn new(base_url: &str, api_key: Option<String>) -> TransferResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransferError::Session(format!("cannot create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            session: RwLock::new(None),
        })
    }

    /// Check if the bridge service is healthy
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Wait for the bridge service to become healthy
    pub async fn wait_for_health(&self, max_attempts: u32) -> TransferResult<()> {
        for i in 0..max_attempts {
            if self.health_check().await {
                log::info!("Signing bridge is healthy");
                return Ok(());
            }

            if i + 1 < max_attempts {
                log::info!("Waiting for signing bridge... attempt {}/{}", i + 1, max_attempts);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        Err(TransferError::Session(format!(
            "signing bridge failed to become healthy after {} attempts",
            max_attempts
        )))
    }

    /// POST `body` to `path` and unwrap the reply envelope.
    /// Transport and bridge failures are both reported through `fail`.
    async fn call<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
        fail: fn(String) -> TransferError,
    ) -> TransferResult<BridgeReply<Resp>>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(body);

        if let Some(api_key) = &self.api_key {
            req = req.header("X-API-Key", api_key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| fail(format!("bridge request to {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(fail(format!("bridge returned {} for {}: {}", status, path, error_text)));
        }

        response
            .json::<BridgeReply<Resp>>()
            .await
            .map_err(|e| fail(format!("unreadable bridge reply from {}: {}", path, e)))
    }

    fn request_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    async fn require_session(&self) -> TransferResult<()> {
        if self.session.read().await.is_none() {
            return Err(TransferError::Session("not logged in".to_string()));
        }
        Ok(())
    }
}

/// Success payload of `reply`, or the bridge's error through `fail`
fn into_result<T>(reply: BridgeReply<T>, fail: fn(String) -> TransferError) -> TransferResult<T> {
    if !reply.success {
        return Err(fail(reply.error.unwrap_or_else(|| "Unknown error".to_string())));
    }
    reply.result.ok_or_else(|| {
        fail(format!(
            "success but no result returned (request {})",
            reply.request_id.unwrap_or_default()
        ))
    })
}

#[async_trait]
impl IdentityService for BridgeIdentity {
    async fn login(&self, email: &str) -> TransferResult<()> {
        validate_email(email)?;

        let request = LoginRequest {
            email: email.trim(),
            request_id: Self::request_id(),
        };
        let reply = self.call::<_, AccountIdentity>("/login", &request, TransferError::Session).await?;
        let identity = into_result(reply, TransferError::Session)?;

        log::info!("Logged in {} as {}", identity.email, identity.public_address);
        *self.session.write().await = Some(identity);
        Ok(())
    }

    async fn logout(&self) -> TransferResult<()> {
        if self.session.read().await.is_none() {
            return Ok(());
        }

        let request = SessionRequest {
            request_id: Self::request_id(),
        };
        let reply = self.call::<_, serde_json::Value>("/logout", &request, TransferError::Session).await?;
        if !reply.success {
            return Err(TransferError::Session(
                reply.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        self.session.write().await.take();
        log::info!("Logged out");
        Ok(())
    }

    async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn get_metadata(&self) -> TransferResult<AccountIdentity> {
        self.require_session().await?;

        let request = SessionRequest {
            request_id: Self::request_id(),
        };
        let reply = self.call::<_, AccountIdentity>("/metadata", &request, TransferError::Session).await?;
        let identity = into_result(reply, TransferError::Session)?;

        *self.session.write().await = Some(identity.clone());
        Ok(identity)
    }

    async fn sign(&self, messages: &[WireMessage], fee: &FeeDescriptor) -> TransferResult<SignedTransaction> {
        self.require_session().await?;

        let request = SignRequest {
            messages,
            fee,
            request_id: Self::request_id(),
        };
        let reply = self.call::<_, SignedPayload>("/sign", &request, TransferError::Signing).await?;
        into_result(reply, TransferError::Signing)?.decode()
    }

    async fn sign_and_broadcast(
        &self,
        messages: &[WireMessage],
        fee: &FeeDescriptor,
    ) -> TransferResult<BroadcastResult> {
        self.require_session().await?;

        let request = SignRequest {
            messages,
            fee,
            request_id: Self::request_id(),
        };
        let reply = self
            .call::<_, BroadcastPayload>("/sign-and-broadcast", &request, TransferError::Broadcast)
            .await?;

        let fail = match reply.stage.as_deref() {
            Some("sign") => TransferError::Signing,
            _ => TransferError::Broadcast,
        };
        let payload = into_result(reply, fail)?;

        log::info!("Bridge broadcast transaction {}", payload.transaction_hash);
        Ok(BroadcastResult {
            transaction_hash: payload.transaction_hash,
        })
    }
}
