use crate::{DepositCmd, EngineError, ResultEngine, Transfer, TransferCmd, store};

use super::Engine;

impl Engine {
    /// Deposits funds into a user's bank account for one currency, moving
    /// them from the paired `external` settlement account.
    ///
    /// At the ledger level a deposit is indistinguishable from a transfer
    /// originating at the settlement account: it delegates to the transfer
    /// body and inherits its atomicity, entry pairing and lock order. Both
    /// accounts are read with row locks before the move.
    pub async fn deposit(&self, cmd: DepositCmd) -> ResultEngine<Transfer> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "deposit amount must be > 0".to_string(),
            ));
        }
        tracing::debug!(
            user = %cmd.username,
            currency = %cmd.currency,
            amount = cmd.amount_minor,
            "executing deposit"
        );
        self.with_tx(move |engine, db_tx| {
            Box::pin(async move {
                let user = store::get_user(db_tx, &cmd.username).await?;
                let bank =
                    store::get_bank_account_for_update(db_tx, &user.username, cmd.currency).await?;
                let external =
                    store::get_external_account_for_update(db_tx, &user.username, cmd.currency)
                        .await?;

                let outcome = engine
                    .transfer_in_tx(
                        db_tx,
                        &TransferCmd::new(external.id, bank.id, cmd.amount_minor),
                    )
                    .await?;
                Ok(outcome.transfer)
            })
        })
        .await
    }
}
