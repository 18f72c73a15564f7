//! Decoding of the `Any`-wrapped account returned by the auth module.
//! Module and vesting accounts embed a `BaseAccount` that carries the
//! number and sequence needed for signing.

use prost::Message;

use crate::chain::proto::{
    Any, BaseAccount, BaseVestingAccount, ContinuousVestingAccount, DelayedVestingAccount, ModuleAccount,
    PeriodicVestingAccount, PermanentLockedAccount, BASE_ACCOUNT_TYPE_URL, BASE_VESTING_ACCOUNT_TYPE_URL,
    CONTINUOUS_VESTING_ACCOUNT_TYPE_URL, DELAYED_VESTING_ACCOUNT_TYPE_URL, MODULE_ACCOUNT_TYPE_URL,
    PERIODIC_VESTING_ACCOUNT_TYPE_URL, PERMANENT_LOCKED_ACCOUNT_TYPE_URL,
};
use crate::error::{TransferError, TransferResult};

/// Account types a Cosmos SDK auth query can return
#[derive(Debug, Clone, PartialEq)]
pub enum Account {
    Base(BaseAccount),
    Module(ModuleAccount),
    BaseVesting(BaseVestingAccount),
    ContinuousVesting(ContinuousVestingAccount),
    DelayedVesting(DelayedVestingAccount),
    PeriodicVesting(PeriodicVestingAccount),
    PermanentLocked(PermanentLockedAccount),
}

impl Account {
    /// Decode by `type_url`. Unknown account types are a chain error.
    pub fn decode_any(any: &Any) -> TransferResult<Self> {
        let value = any.value.as_slice();
        let account = match any.type_url.as_str() {
            BASE_ACCOUNT_TYPE_URL => Account::Base(BaseAccount::decode(value)?),
            MODULE_ACCOUNT_TYPE_URL => Account::Module(ModuleAccount::decode(value)?),
            BASE_VESTING_ACCOUNT_TYPE_URL => Account::BaseVesting(BaseVestingAccount::decode(value)?),
            CONTINUOUS_VESTING_ACCOUNT_TYPE_URL => {
                Account::ContinuousVesting(ContinuousVestingAccount::decode(value)?)
            }
            DELAYED_VESTING_ACCOUNT_TYPE_URL => Account::DelayedVesting(DelayedVestingAccount::decode(value)?),
            PERIODIC_VESTING_ACCOUNT_TYPE_URL => Account::PeriodicVesting(PeriodicVestingAccount::decode(value)?),
            PERMANENT_LOCKED_ACCOUNT_TYPE_URL => Account::PermanentLocked(PermanentLockedAccount::decode(value)?),
            other => {
                return Err(TransferError::Chain(format!("Unsupported account type: {}", other)));
            }
        };
        Ok(account)
    }

    pub fn account_type(&self) -> &'static str {
        match self {
            Account::Base(_) => "BaseAccount",
            Account::Module(_) => "ModuleAccount",
            Account::BaseVesting(_) => "BaseVestingAccount",
            Account::ContinuousVesting(_) => "ContinuousVestingAccount",
            Account::DelayedVesting(_) => "DelayedVestingAccount",
            Account::PeriodicVesting(_) => "PeriodicVestingAccount",
            Account::PermanentLocked(_) => "PermanentLockedAccount",
        }
    }

    /// The embedded `BaseAccount`, if the wrapper carries one
    pub fn base_account(&self) -> Option<&BaseAccount> {
        fn vesting(v: &Option<BaseVestingAccount>) -> Option<&BaseAccount> {
            v.as_ref().and_then(|v| v.base_account.as_ref())
        }

        match self {
            Account::Base(acc) => Some(acc),
            Account::Module(acc) => acc.base_account.as_ref(),
            Account::BaseVesting(acc) => acc.base_account.as_ref(),
            Account::ContinuousVesting(acc) => vesting(&acc.base_vesting_account),
            Account::DelayedVesting(acc) => vesting(&acc.base_vesting_account),
            Account::PeriodicVesting(acc) => vesting(&acc.base_vesting_account),
            Account::PermanentLocked(acc) => vesting(&acc.base_vesting_account),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(account_number: u64, sequence: u64) -> BaseAccount {
        BaseAccount {
            address: "cosmos1vested".to_string(),
            account_number,
            sequence,
            ..Default::default()
        }
    }

    fn wrap(type_url: &str, value: Vec<u8>) -> Any {
        Any {
            type_url: type_url.to_string(),
            value,
        }
    }

    #[test]
    fn test_base_account() {
        let any = wrap(BASE_ACCOUNT_TYPE_URL, base(4, 9).encode_to_vec());
        let account = Account::decode_any(&any).unwrap();
        assert_eq!(account.account_type(), "BaseAccount");
        assert_eq!(account.base_account(), Some(&base(4, 9)));
    }

    #[test]
    fn test_module_account_unwraps_base() {
        let module = ModuleAccount {
            base_account: Some(base(7, 0)),
            name: "fee_collector".to_string(),
            permissions: vec![],
        };
        let account = Account::decode_any(&wrap(MODULE_ACCOUNT_TYPE_URL, module.encode_to_vec())).unwrap();

        let inner = account.base_account().unwrap();
        assert_eq!(inner.account_number, 7);
        assert_eq!(inner.sequence, 0);
    }

    #[test]
    fn test_vesting_accounts_unwrap_base() {
        let vesting = BaseVestingAccount {
            base_account: Some(base(12, 3)),
            ..Default::default()
        };

        let continuous = ContinuousVestingAccount {
            base_vesting_account: Some(vesting.clone()),
            start_time: 1_700_000_000,
        };
        let permanent = PermanentLockedAccount {
            base_vesting_account: Some(vesting.clone()),
        };

        for any in [
            wrap(BASE_VESTING_ACCOUNT_TYPE_URL, vesting.encode_to_vec()),
            wrap(CONTINUOUS_VESTING_ACCOUNT_TYPE_URL, continuous.encode_to_vec()),
            wrap(PERMANENT_LOCKED_ACCOUNT_TYPE_URL, permanent.encode_to_vec()),
        ] {
            let account = Account::decode_any(&any).unwrap();
            let inner = account.base_account().unwrap();
            assert_eq!(inner.address, "cosmos1vested");
            assert_eq!((inner.account_number, inner.sequence), (12, 3), "{}", any.type_url);
        }
    }

    #[test]
    fn test_wrapper_without_base() {
        let any = wrap(DELAYED_VESTING_ACCOUNT_TYPE_URL, DelayedVestingAccount::default().encode_to_vec());
        let account = Account::decode_any(&any).unwrap();
        assert_eq!(account.account_type(), "DelayedVestingAccount");
        assert!(account.base_account().is_none());
    }

    #[test]
    fn test_unknown_and_malformed() {
        let err = Account::decode_any(&wrap("/injective.types.v1beta1.EthAccount", vec![])).unwrap_err();
        assert!(matches!(err, TransferError::Chain(ref m) if m.contains("EthAccount")));

        let err = Account::decode_any(&wrap(MODULE_ACCOUNT_TYPE_URL, vec![0xff, 0xff])).unwrap_err();
        assert!(matches!(err, TransferError::Decode(_)));
    }
}
