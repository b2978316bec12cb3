use sea_orm::{ConnectionTrait, DatabaseTransaction};

use crate::{
    Account, EngineError, Entry, ResultEngine, Transfer, TransferCmd, TransferOutcome, accounts,
    store,
};

use super::Engine;

impl Engine {
    /// Moves funds between two accounts as one atomic unit: one transfer
    /// record, two balancing entries, and both balance mutations.
    ///
    /// Fails without touching the store if the amount is not strictly
    /// positive or if from and to are the same account. Any failure inside
    /// the unit of work rolls the whole transfer back; no partial transfer is
    /// ever committed, and lock contention is not retried here.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferOutcome> {
        validate_transfer(&cmd)?;
        tracing::debug!(
            from = cmd.from_account_id,
            to = cmd.to_account_id,
            amount = cmd.amount_minor,
            "executing transfer"
        );
        self.with_tx(move |engine, db_tx| {
            Box::pin(async move { engine.transfer_in_tx(db_tx, &cmd).await })
        })
        .await
    }

    /// Transfer body shared with the deposit workflow. Runs inside an
    /// already-open transaction; the caller owns commit and rollback.
    pub(in crate::ops) async fn transfer_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &TransferCmd,
    ) -> ResultEngine<TransferOutcome> {
        let transfer = store::create_transfer(
            db_tx,
            cmd.from_account_id,
            cmd.to_account_id,
            cmd.amount_minor,
        )
        .await?;
        let from_entry = store::create_entry(db_tx, cmd.from_account_id, -cmd.amount_minor).await?;
        let to_entry = store::create_entry(db_tx, cmd.to_account_id, cmd.amount_minor).await?;
        let (from_account, to_account) = add_balances(
            db_tx,
            (cmd.from_account_id, -cmd.amount_minor),
            (cmd.to_account_id, cmd.amount_minor),
        )
        .await?;

        Ok(TransferOutcome {
            transfer: Transfer::from(transfer),
            from_account: Account::try_from(from_account)?,
            to_account: Account::try_from(to_account)?,
            from_entry: Entry::from(from_entry),
            to_entry: Entry::from(to_entry),
        })
    }
}

fn validate_transfer(cmd: &TransferCmd) -> ResultEngine<()> {
    if cmd.amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "transfer amount must be > 0".to_string(),
        ));
    }
    if cmd.from_account_id == cmd.to_account_id {
        return Err(EngineError::InvalidAmount(
            "from_account_id and to_account_id must differ".to_string(),
        ));
    }
    Ok(())
}

/// Applies both balance deltas, always mutating the account with the
/// numerically smaller id first.
///
/// Ascending account id is a total order over all accounts, so two
/// concurrent transfers over the same pair can never each hold one row lock
/// while waiting for the other. Every call site that mutates two accounts
/// together must go through this helper.
async fn add_balances<C: ConnectionTrait>(
    conn: &C,
    from: (i64, i64),
    to: (i64, i64),
) -> ResultEngine<(accounts::Model, accounts::Model)> {
    let (from_id, from_delta) = from;
    let (to_id, to_delta) = to;
    if from_id < to_id {
        let from_account = store::add_account_balance(conn, from_id, from_delta).await?;
        let to_account = store::add_account_balance(conn, to_id, to_delta).await?;
        Ok((from_account, to_account))
    } else {
        let to_account = store::add_account_balance(conn, to_id, to_delta).await?;
        let from_account = store::add_account_balance(conn, from_id, from_delta).await?;
        Ok((from_account, to_account))
    }
}
