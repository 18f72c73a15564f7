use serde::{Deserialize, Serialize};

use crate::chain::proto::ProtoCoin;

/// A (denom, amount) pair. `amount` is kept as the decimal string carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: &str, denom: &str) -> Self {
        Self {
            denom: denom.to_string(),
            amount: amount.to_string(),
        }
    }
}

impl From<ProtoCoin> for Coin {
    fn from(coin: ProtoCoin) -> Self {
        Self {
            denom: coin.denom,
            amount: coin.amount,
        }
    }
}

impl From<&Coin> for ProtoCoin {
    fn from(coin: &Coin) -> Self {
        ProtoCoin {
            denom: coin.denom.clone(),
            amount: coin.amount.clone(),
        }
    }
}

pub(crate) fn from_proto_coins(coins: Vec<ProtoCoin>) -> Vec<Coin> {
    coins.into_iter().map(Coin::from).collect()
}

pub(crate) fn to_proto_coins(coins: &[Coin]) -> Vec<ProtoCoin> {
    coins.iter().map(ProtoCoin::from).collect()
}
