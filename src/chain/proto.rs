//! Cosmos SDK protobuf types and typed gRPC clients
//! Re-exported from cosmos-sdk-proto under the names the rest of the crate uses

pub use prost_types::Any;

pub mod cosmos {
    pub use cosmos_sdk_proto::cosmos::{auth, bank, base, crypto, tx, vesting};
}

pub use cosmos::auth::v1beta1::{BaseAccount, ModuleAccount, QueryAccountRequest};
pub use cosmos::bank::v1beta1::{MsgSend, QueryAllBalancesRequest, QueryAllBalancesResponse};
pub use cosmos::base::query::v1beta1::{PageRequest, PageResponse};
pub use cosmos::base::v1beta1::Coin as ProtoCoin;
pub use cosmos::crypto::secp256k1::PubKey;
pub use cosmos::tx::signing::v1beta1::SignMode;
pub use cosmos::tx::v1beta1::{
    mode_info, AuthInfo, BroadcastMode, BroadcastTxRequest, Fee, GetTxRequest, ModeInfo, SignDoc,
    SignerInfo, TxBody, TxRaw,
};
pub use cosmos::vesting::v1beta1::{
    BaseVestingAccount, ContinuousVestingAccount, DelayedVestingAccount, PeriodicVestingAccount,
    PermanentLockedAccount,
};

// Typed gRPC clients
pub use cosmos::auth::v1beta1::query_client::QueryClient as AuthQueryClient;
pub use cosmos::bank::v1beta1::query_client::QueryClient as BankQueryClient;
pub use cosmos::tx::v1beta1::service_client::ServiceClient as TxServiceClient;

pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

pub const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";
pub const MODULE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.ModuleAccount";
pub const BASE_VESTING_ACCOUNT_TYPE_URL: &str = "/cosmos.vesting.v1beta1.BaseVestingAccount";
pub const CONTINUOUS_VESTING_ACCOUNT_TYPE_URL: &str = "/cosmos.vesting.v1beta1.ContinuousVestingAccount";
pub const DELAYED_VESTING_ACCOUNT_TYPE_URL: &str = "/cosmos.vesting.v1beta1.DelayedVestingAccount";
pub const PERIODIC_VESTING_ACCOUNT_TYPE_URL: &str = "/cosmos.vesting.v1beta1.PeriodicVestingAccount";
pub const PERMANENT_LOCKED_ACCOUNT_TYPE_URL: &str = "/cosmos.vesting.v1beta1.PermanentLockedAccount";
