//! Ledger accounts.
//!
//! Every user-facing `bank` account is created together with a paired
//! `external` settlement account for the same owner and currency. The
//! external account is the counterparty for funds entering or leaving the
//! ledger and may hold a negative balance; it is what keeps the double-entry
//! books closed without modelling the outside world.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// A user-owned account usable for transfers.
    Bank,
    /// The paired settlement counterparty for one owner+currency.
    External,
}

impl AccountKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::External => "external",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bank" => Ok(Self::Bank),
            "external" => Ok(Self::External),
            other => Err(EngineError::InvalidKind(other.to_string())),
        }
    }
}

/// An account snapshot as seen by callers.
///
/// The id is the store's auto-increment integer key. The lock order used by
/// the transfer workflow is defined over these ids, so they are never
/// recycled or reassigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub currency: Currency,
    pub balance_minor: i64,
    pub kind: AccountKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner: String,
    pub currency: String,
    pub balance_minor: i64,
    pub kind: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::Owner",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner: model.owner,
            currency: Currency::try_from(model.currency.as_str())?,
            balance_minor: model.balance_minor,
            kind: AccountKind::try_from(model.kind.as_str())?,
            created_at: model.created_at,
        })
    }
}
