//! Entity-store primitives.
//!
//! Plain per-entity operations consumed by the composite workflows in the
//! engine. Every function is generic over [`ConnectionTrait`], so the same
//! primitive runs against the pooled connection or inside an open
//! [`sea_orm::DatabaseTransaction`]; tests exercise them against a plain
//! connection directly.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QuerySelect, Statement,
};

use crate::{AccountKind, Currency, EngineError, ResultEngine, accounts, entries, transfers, users};

pub async fn create_account<C: ConnectionTrait>(
    conn: &C,
    owner: &str,
    currency: Currency,
    balance_minor: i64,
    kind: AccountKind,
) -> ResultEngine<accounts::Model> {
    let account = accounts::ActiveModel {
        id: ActiveValue::NotSet,
        owner: ActiveValue::Set(owner.to_string()),
        currency: ActiveValue::Set(currency.code().to_string()),
        balance_minor: ActiveValue::Set(balance_minor),
        kind: ActiveValue::Set(kind.as_str().to_string()),
        created_at: ActiveValue::Set(Utc::now()),
    };
    Ok(account.insert(conn).await?)
}

pub async fn get_account<C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
) -> ResultEngine<accounts::Model> {
    accounts::Entity::find_by_id(account_id)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id}")))
}

/// Row-locking read of an owner's `bank` account for one currency.
///
/// Renders `SELECT … FOR UPDATE` on backends with row locks; SQLite's
/// single-writer model provides the equivalent guarantee.
pub async fn get_bank_account_for_update<C: ConnectionTrait>(
    conn: &C,
    owner: &str,
    currency: Currency,
) -> ResultEngine<accounts::Model> {
    accounts::Entity::find()
        .filter(accounts::Column::Owner.eq(owner))
        .filter(accounts::Column::Currency.eq(currency.code()))
        .filter(accounts::Column::Kind.eq(AccountKind::Bank.as_str()))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("{currency} account of \"{owner}\"")))
}

/// Row-locking read of the paired `external` settlement account.
pub async fn get_external_account_for_update<C: ConnectionTrait>(
    conn: &C,
    owner: &str,
    currency: Currency,
) -> ResultEngine<accounts::Model> {
    accounts::Entity::find()
        .filter(accounts::Column::Owner.eq(owner))
        .filter(accounts::Column::Currency.eq(currency.code()))
        .filter(accounts::Column::Kind.eq(AccountKind::External.as_str()))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| {
            EngineError::KeyNotFound(format!("{currency} settlement account of \"{owner}\""))
        })
}

/// Applies a signed balance delta as one atomic read-modify-write statement.
///
/// The increment is folded into a single `UPDATE … RETURNING`, so no
/// intermediate balance is ever observable by another transaction.
pub async fn add_account_balance<C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
    delta_minor: i64,
) -> ResultEngine<accounts::Model> {
    let backend = conn.get_database_backend();
    let stmt = Statement::from_sql_and_values(
        backend,
        "UPDATE accounts SET balance_minor = balance_minor + ? WHERE id = ? \
         RETURNING id, owner, currency, balance_minor, kind, created_at",
        [delta_minor.into(), account_id.into()],
    );
    accounts::Entity::find()
        .from_raw_sql(stmt)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id}")))
}

pub async fn create_entry<C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
    amount_minor: i64,
) -> ResultEngine<entries::Model> {
    let entry = entries::ActiveModel {
        id: ActiveValue::NotSet,
        account_id: ActiveValue::Set(account_id),
        amount_minor: ActiveValue::Set(amount_minor),
        created_at: ActiveValue::Set(Utc::now()),
    };
    Ok(entry.insert(conn).await?)
}

pub async fn create_transfer<C: ConnectionTrait>(
    conn: &C,
    from_account_id: i64,
    to_account_id: i64,
    amount_minor: i64,
) -> ResultEngine<transfers::Model> {
    let transfer = transfers::ActiveModel {
        id: ActiveValue::NotSet,
        from_account_id: ActiveValue::Set(from_account_id),
        to_account_id: ActiveValue::Set(to_account_id),
        amount_minor: ActiveValue::Set(amount_minor),
        created_at: ActiveValue::Set(Utc::now()),
    };
    Ok(transfer.insert(conn).await?)
}

pub async fn get_user<C: ConnectionTrait>(conn: &C, username: &str) -> ResultEngine<users::Model> {
    users::Entity::find_by_id(username)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("user \"{username}\"")))
}
