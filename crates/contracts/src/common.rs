//! Debit and spendability checks shared by the contracts.

use forge_api::ExecCtx;
use forge_keepers::AccountKeeper;
use forge_types::error::ContractError;
use forge_types::{Account, Amount, BalanceAccount, PublicKey};

/// Verifies that a transaction can spend `value + fee` from `acct`:
/// the nonce must be the account's next nonce and the spendable balance at
/// `height` (total balance minus active stakes) must cover the total.
pub fn can_exec_coin_transfer(
    acct: &Account,
    value: Amount,
    fee: Amount,
    nonce: u64,
    height: u64,
) -> Result<(), ContractError> {
    let expected = acct.nonce + 1;
    if nonce != expected {
        return Err(ContractError::InvalidNonce {
            expected,
            got: nonce,
        });
    }

    let required = value + fee;
    let spendable = acct.spendable(height);
    if spendable < required {
        return Err(ContractError::InsufficientBalance {
            spendable: spendable.to_string(),
            required: required.to_string(),
        });
    }
    Ok(())
}

/// Loads the sender account, verifies nonce and funds for `value + fee`,
/// debits the total, advances the nonce, cleans matured stakes and persists.
/// Returns the updated account for callers that need further reads.
pub fn debit_sender(
    ctx: &mut ExecCtx<'_>,
    sender: &PublicKey,
    value: Amount,
    fee: Amount,
    nonce: u64,
    height: u64,
) -> Result<Account, ContractError> {
    let addr = sender.to_address();
    let mut accounts = AccountKeeper::new(&mut *ctx.tree);
    let mut acct = accounts.get(&addr)?;
    can_exec_coin_transfer(&acct, value, fee, nonce, height)?;

    acct.balance -= value + fee;
    acct.nonce += 1;
    acct.clean(height);
    accounts.update(&addr, &acct)?;
    Ok(acct)
}

/// Credits `amount` to an account, creating it lazily.
pub fn credit_account(
    ctx: &mut ExecCtx<'_>,
    addr: &forge_types::Address,
    amount: Amount,
    height: u64,
) -> Result<(), ContractError> {
    let mut accounts = AccountKeeper::new(&mut *ctx.tree);
    let mut acct = accounts.get(addr)?;
    acct.balance += amount;
    acct.clean(height);
    accounts.update(addr, &acct)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_types::StakeKind;

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_wrong_nonce() {
        let mut acct = Account::bare();
        acct.balance = amt("10");
        acct.nonce = 4;

        let err = can_exec_coin_transfer(&acct, amt("1"), amt("1"), 4, 1).unwrap_err();
        assert!(matches!(
            err,
            ContractError::InvalidNonce {
                expected: 5,
                got: 4
            }
        ));
        assert!(can_exec_coin_transfer(&acct, amt("1"), amt("1"), 5, 1).is_ok());
    }

    #[test]
    fn spendable_check_excludes_staked_funds() {
        let mut acct = Account::bare();
        acct.balance = amt("10");
        acct.stakes.add(StakeKind::Host, amt("6"), 0);

        let err = can_exec_coin_transfer(&acct, amt("4"), amt("1"), 1, 1).unwrap_err();
        assert!(matches!(err, ContractError::InsufficientBalance { .. }));
        assert!(can_exec_coin_transfer(&acct, amt("3"), amt("1"), 1, 1).is_ok());
    }
}
