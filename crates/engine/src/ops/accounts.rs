use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, SqlErr};

use crate::{Account, AccountKind, EngineError, OpenAccountCmd, ResultEngine, accounts, store};

use super::Engine;

impl Engine {
    /// Opens an account together with its paired `external` settlement
    /// account for the same owner and currency.
    ///
    /// Both rows are created in one transaction: either both exist afterwards
    /// or neither does, so a `bank` account never exists without its
    /// settlement counterpart. A uniqueness violation (a pair already exists
    /// for that owner+currency) rolls everything back and surfaces as
    /// [`EngineError::AlreadyExists`].
    pub async fn open_account(&self, cmd: OpenAccountCmd) -> ResultEngine<Account> {
        if cmd.initial_balance_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "initial balance must be >= 0".to_string(),
            ));
        }
        tracing::debug!(owner = %cmd.owner, currency = %cmd.currency, "opening account pair");

        let pair_label = format!("{} {} account pair", cmd.owner, cmd.currency);
        let result = self
            .with_tx(move |_engine, db_tx| {
                Box::pin(async move {
                    let model = store::create_account(
                        db_tx,
                        &cmd.owner,
                        cmd.currency,
                        cmd.initial_balance_minor,
                        cmd.kind,
                    )
                    .await?;
                    store::create_account(
                        db_tx,
                        &cmd.owner,
                        cmd.currency,
                        0,
                        AccountKind::External,
                    )
                    .await?;
                    Account::try_from(model)
                })
            })
            .await;

        match result {
            Err(EngineError::Database(db_err))
                if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                Err(EngineError::AlreadyExists(pair_label))
            }
            other => other,
        }
    }

    /// Return an account snapshot by id.
    pub async fn account(&self, account_id: i64) -> ResultEngine<Account> {
        let model = store::get_account(self.database(), account_id).await?;
        Account::try_from(model)
    }

    /// List all accounts of one owner, bank and settlement alike, in id
    /// order.
    pub async fn accounts_for_owner(&self, owner: &str) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::Owner.eq(owner))
            .order_by_asc(accounts::Column::Id)
            .all(self.database())
            .await?;
        models.into_iter().map(Account::try_from).collect()
    }
}
