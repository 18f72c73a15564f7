use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::coin::{from_proto_coins, to_proto_coins, Coin};
use crate::chain::proto::Fee;

/// Gas limit authorized when no override is configured
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;

/// Fee amount (in the minor denomination) authorized when no override is configured
pub const DEFAULT_FEE_AMOUNT: u128 = 0;

/// Fee a transaction is willing to pay.
///
/// The JSON form matches what signing bridges expect: `gas` is a
/// string-encoded integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeDescriptor {
    pub amount: Vec<Coin>,
    #[serde(rename = "gas", serialize_with = "gas_to_string", deserialize_with = "gas_from_string")]
    pub gas_limit: u64,
}

impl FeeDescriptor {
    /// Single fee line in `denom`
    pub fn new(amount: u128, denom: &str, gas_limit: u64) -> Self {
        Self {
            amount: vec![Coin::new(&amount.to_string(), denom)],
            gas_limit,
        }
    }

    /// Fixed default fee: zero in the minor denomination, fixed gas limit
    pub fn default_for(denom: &str) -> Self {
        Self::new(DEFAULT_FEE_AMOUNT, denom, DEFAULT_GAS_LIMIT)
    }

    /// Total amount charged in `denom`, or None if any line fails to parse
    pub fn amount_of(&self, denom: &str) -> Option<u128> {
        self.amount
            .iter()
            .filter(|coin| coin.denom == denom)
            .try_fold(0u128, |acc, coin| {
                coin.amount.parse::<u128>().ok().and_then(|v| acc.checked_add(v))
            })
    }

    /// True when this (charged) fee does not exceed `authorized` in gas or in
    /// any denomination. A denomination the client never authorized must be zero.
    pub fn is_within(&self, authorized: &FeeDescriptor) -> bool {
        if self.gas_limit > authorized.gas_limit {
            return false;
        }

        self.amount.iter().all(|coin| {
            match (self.amount_of(&coin.denom), authorized.amount_of(&coin.denom)) {
                (Some(charged), Some(allowed)) => charged <= allowed,
                _ => false,
            }
        })
    }
}

impl From<&FeeDescriptor> for Fee {
    fn from(fee: &FeeDescriptor) -> Self {
        Fee {
            amount: to_proto_coins(&fee.amount),
            gas_limit: fee.gas_limit,
            payer: String::new(),
            granter: String::new(),
        }
    }
}

impl From<Fee> for FeeDescriptor {
    fn from(fee: Fee) -> Self {
        Self {
            amount: from_proto_coins(fee.amount),
            gas_limit: fee.gas_limit,
        }
    }
}

fn gas_to_string<S: Serializer>(gas: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&gas.to_string())
}

fn gas_from_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse::<u64>().map_err(serde::de::Error::custom)
}
