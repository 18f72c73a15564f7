use async_trait::async_trait;
use prost::Message;
use std::future::Future;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use crate::chain::account::Account;
use crate::chain::messages::{from_proto_coins, Coin};
use crate::chain::proto::{
    Any, AuthQueryClient, BankQueryClient, BroadcastMode, BroadcastTxRequest, GetTxRequest, PageRequest,
    QueryAccountRequest, QueryAllBalancesRequest, QueryAllBalancesResponse, TxServiceClient,
};
use crate::error::{TransferError, TransferResult};

/// Page size used when walking paginated balance queries
const BALANCES_PAGE_LIMIT: u64 = 100;

/// Read side of the chain, as consumed by the transfer workflow
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// All balances held by `address` as (denom, amount) pairs
    async fn get_all_balances(&self, address: &str) -> TransferResult<Vec<Coin>>;

    /// Raw envelope bytes of the committed transaction with `hash`
    async fn get_tx(&self, hash: &str) -> TransferResult<Vec<u8>>;
}

/// Write side of the chain, as consumed by a local signing session
#[async_trait]
pub trait ChainSubmitter: Send + Sync {
    fn chain_id(&self) -> &str;

    /// Account number and sequence for signing
    async fn query_account(&self, address: &str) -> TransferResult<AccountInfo>;

    /// Submit an encoded `TxRaw`
    async fn broadcast_tx(&self, tx_bytes: Vec<u8>) -> TransferResult<BroadcastResponse>;
}

/// Configuration for the gRPC chain client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// gRPC endpoint URL (e.g., "http://localhost:9090")
    pub grpc_endpoint: String,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
    /// Request timeout in seconds
    pub request_timeout: u64,
    /// Maximum retry attempts for read queries
    pub max_retries: u32,
    pub chain_id: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            grpc_endpoint: "http://localhost:9090".to_string(),
            connection_timeout: 10,
            request_timeout: 30,
            max_retries: 3,
            chain_id: "localnet".to_string(),
        }
    }
}

/// Account number and sequence needed to sign
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub address: String,
    pub account_number: u64,
    pub sequence: u64,
}

/// Result of submitting a transaction in sync mode
#[derive(Debug, Clone)]
pub struct BroadcastResponse {
    pub tx_hash: String,
    pub code: u32,
    pub raw_log: String,
}

/// gRPC client for a Cosmos SDK node
#[derive(Clone)]
pub struct ChainClient {
    config: ClientConfig,
    channel: Option<Channel>,
}

impl ChainClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config, channel: None }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect to the gRPC endpoint
    pub async fn connect(&mut self) -> TransferResult<()> {
        log::info!("Connecting to chain at {}", self.config.grpc_endpoint);

        let endpoint = Endpoint::from_shared(self.config.grpc_endpoint.clone())
            .map_err(|e| TransferError::Chain(format!("Invalid endpoint: {}", e)))?
            .timeout(Duration::from_secs(self.config.request_timeout))
            .connect_timeout(Duration::from_secs(self.config.connection_timeout));

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| TransferError::Chain(format!("Failed to connect: {}", e)))?;
        self.channel = Some(channel);

        log::info!("Connected to {}", self.config.chain_id);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    fn channel(&self) -> TransferResult<Channel> {
        self.channel
            .clone()
            .ok_or_else(|| TransferError::Chain("Client not connected. Call connect() first.".to_string()))
    }

    /// Query account number and sequence
    /// Accounts the chain has not seen yet report zero for both
    pub async fn query_account(&self, address: &str) -> TransferResult<AccountInfo> {
        let account = self
            .with_retry(|| async move {
                let mut client = AuthQueryClient::new(self.channel()?);
                let request = tonic::Request::new(QueryAccountRequest {
                    address: address.to_string(),
                });
                match client.account(request).await {
                    Ok(response) => Ok(response.into_inner().account),
                    Err(status) if status.code() == Code::NotFound => Ok(None),
                    Err(status) => Err(TransferError::Chain(format!("Failed to query account: {}", status))),
                }
            })
            .await?;

        account_info(address, account)
    }

    /// Broadcast a signed transaction in sync mode (never retried)
    pub async fn broadcast_tx(&self, tx_bytes: Vec<u8>) -> TransferResult<BroadcastResponse> {
        log::info!("broadcast_tx called with {} bytes", tx_bytes.len());

        let mut client = TxServiceClient::new(self.channel()?);
        let request = tonic::Request::new(BroadcastTxRequest {
            tx_bytes,
            mode: BroadcastMode::Sync as i32,
        });
        let response = client
            .broadcast_tx(request)
            .await
            .map_err(|status| TransferError::Broadcast(format!("Failed to broadcast transaction: {}", status)))?
            .into_inner();

        let tx_response = response
            .tx_response
            .ok_or_else(|| TransferError::Broadcast("No tx response in broadcast response".to_string()))?;

        if tx_response.code != 0 {
            return Err(TransferError::Broadcast(format!(
                "Transaction rejected (code {}): {}",
                tx_response.code, tx_response.raw_log
            )));
        }

        log::info!("Transaction accepted: {}", tx_response.txhash);
        Ok(BroadcastResponse {
            tx_hash: tx_response.txhash,
            code: tx_response.code,
            raw_log: tx_response.raw_log,
        })
    }

    /// Retry helper for read queries
    async fn with_retry<T, F, Fut>(&self, f: F) -> TransferResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = TransferResult<T>>,
    {
        let mut retries = 0;
        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(TransferError::Chain(msg)) if retries < self.config.max_retries => {
                    retries += 1;
                    log::warn!("Query failed (attempt {}): {}", retries, msg);
                    tokio::time::sleep(Duration::from_millis(100 * retries as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Signing info from the auth module's account, unwrapping module and vesting accounts.
/// A missing account is a fresh one.
fn account_info(address: &str, account: Option<Any>) -> TransferResult<AccountInfo> {
    let Some(account_any) = account else {
        log::info!("Account {} not found on chain, using fresh account info", address);
        return Ok(AccountInfo {
            address: address.to_string(),
            ..Default::default()
        });
    };

    let account = Account::decode_any(&account_any)?;
    let base = account.base_account().ok_or_else(|| {
        TransferError::Chain(format!("{} for {} carries no base account", account.account_type(), address))
    })?;
    log::debug!(
        "{} {}: number={}, sequence={}",
        account.account_type(),
        base.address,
        base.account_number,
        base.sequence
    );

    Ok(AccountInfo {
        address: base.address.clone(),
        account_number: base.account_number,
        sequence: base.sequence,
    })
}

/// Map a failed GetTx call. Older nodes report a missing tx as a generic error.
fn tx_lookup_error(hash: &str, status: &Status) -> TransferError {
    if status.code() == Code::NotFound || status.message().contains("not found") {
        TransferError::NotFound(hash.to_string())
    } else {
        TransferError::Chain(format!("Failed to fetch transaction: {}", status))
    }
}

/// Walk a paginated balance query, feeding each page's `next_key` into the next request
async fn collect_balance_pages<F, Fut>(mut fetch_page: F) -> TransferResult<Vec<Coin>>
where
    F: FnMut(Vec<u8>) -> Fut,
    Fut: Future<Output = TransferResult<QueryAllBalancesResponse>>,
{
    let mut balances = Vec::new();
    let mut next_key = Vec::new();

    loop {
        let page = fetch_page(next_key).await?;
        balances.extend(from_proto_coins(page.balances));
        match page.pagination {
            Some(p) if !p.next_key.is_empty() => next_key = p.next_key,
            _ => return Ok(balances),
        }
    }
}

#[async_trait]
impl ChainReader for ChainClient {
    async fn get_all_balances(&self, address: &str) -> TransferResult<Vec<Coin>> {
        let balances = collect_balance_pages(move |key| {
            let request = QueryAllBalancesRequest {
                address: address.to_string(),
                pagination: Some(PageRequest {
                    key,
                    limit: BALANCES_PAGE_LIMIT,
                    ..Default::default()
                }),
                ..Default::default()
            };

            self.with_retry(move || {
                let request = request.clone();
                async move {
                    let mut client = BankQueryClient::new(self.channel()?);
                    client
                        .all_balances(tonic::Request::new(request))
                        .await
                        .map(tonic::Response::into_inner)
                        .map_err(|status| TransferError::Chain(format!("Failed to query balances: {}", status)))
                }
            })
        })
        .await?;

        log::debug!("{} holds {} denomination(s)", address, balances.len());
        Ok(balances)
    }

    async fn get_tx(&self, hash: &str) -> TransferResult<Vec<u8>> {
        let mut client = TxServiceClient::new(self.channel()?);
        let request = tonic::Request::new(GetTxRequest { hash: hash.to_string() });
        let response = client
            .get_tx(request)
            .await
            .map_err(|status| tx_lookup_error(hash, &status))?
            .into_inner();

        // `Tx` and `TxRaw` share field numbers, so the re-encoded tx decodes as an envelope
        let tx = response.tx.ok_or_else(|| TransferError::NotFound(hash.to_string()))?;
        Ok(tx.encode_to_vec())
    }
}

#[async_trait]
impl ChainSubmitter for ChainClient {
    fn chain_id(&self) -> &str {
        &self.config.chain_id
    }

    async fn query_account(&self, address: &str) -> TransferResult<AccountInfo> {
        ChainClient::query_account(self, address).await
    }

    async fn broadcast_tx(&self, tx_bytes: Vec<u8>) -> TransferResult<BroadcastResponse> {
        ChainClient::broadcast_tx(self, tx_bytes).await
    }
}
