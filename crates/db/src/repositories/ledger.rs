//! Ledger and snapshot writes shared by the repositories.
//!
//! Every function takes a generic connection so callers can run it inside
//! their own transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use cashdesk_core::ledger::MovementKind;
use cashdesk_shared::types::{CurrencyId, PointId, UserId};

use crate::entities::{balance_movements, balances};

/// Movement to append to the ledger.
#[derive(Debug, Clone)]
pub(crate) struct NewMovement {
    pub point_id: PointId,
    pub currency_id: CurrencyId,
    pub kind: MovementKind,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub description: String,
    pub reference_kind: Option<&'static str>,
    pub reference_id: Option<String>,
    pub recorded_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Appends a movement.
pub(crate) async fn append_movement<C: ConnectionTrait>(
    conn: &C,
    movement: NewMovement,
) -> Result<balance_movements::Model, DbErr> {
    balance_movements::ActiveModel {
        id: Set(Uuid::now_v7()),
        point_id: Set(movement.point_id.into_inner()),
        currency_id: Set(movement.currency_id.into_inner()),
        kind: Set(movement.kind.as_str().to_string()),
        amount: Set(movement.amount),
        balance_before: Set(movement.balance_before),
        balance_after: Set(movement.balance_after),
        description: Set(Some(movement.description)),
        reference_kind: Set(movement.reference_kind.map(String::from)),
        reference_id: Set(movement.reference_id),
        recorded_by: Set(movement.recorded_by.into_inner()),
        created_at: Set(movement.created_at.into()),
    }
    .insert(conn)
    .await
}

/// Fields to overwrite on a balance snapshot. `None` leaves a field as is.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SnapshotChange {
    pub amount: Option<Decimal>,
    pub cash_notes: Option<Decimal>,
    pub cash_coins: Option<Decimal>,
    pub bank: Option<Decimal>,
}

/// Finds the snapshot row of a (point, currency).
pub(crate) async fn find_snapshot<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    currency_id: CurrencyId,
) -> Result<Option<balances::Model>, DbErr> {
    balances::Entity::find()
        .filter(balances::Column::PointId.eq(point_id.into_inner()))
        .filter(balances::Column::CurrencyId.eq(currency_id.into_inner()))
        .one(conn)
        .await
}

/// Updates the snapshot of a (point, currency), creating it with zero
/// buckets when missing.
pub(crate) async fn upsert_snapshot<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    currency_id: CurrencyId,
    change: SnapshotChange,
) -> Result<balances::Model, DbErr> {
    let now = Utc::now();

    match find_snapshot(conn, point_id, currency_id).await? {
        Some(existing) => {
            let mut active: balances::ActiveModel = existing.into();
            if let Some(amount) = change.amount {
                active.amount = Set(amount);
            }
            if let Some(notes) = change.cash_notes {
                active.cash_notes = Set(notes);
            }
            if let Some(coins) = change.cash_coins {
                active.cash_coins = Set(coins);
            }
            if let Some(bank) = change.bank {
                active.bank = Set(bank);
            }
            active.updated_at = Set(now.into());
            active.update(conn).await
        }
        None => {
            balances::ActiveModel {
                id: Set(Uuid::now_v7()),
                point_id: Set(point_id.into_inner()),
                currency_id: Set(currency_id.into_inner()),
                amount: Set(change.amount.unwrap_or_default()),
                cash_notes: Set(change.cash_notes.unwrap_or_default()),
                cash_coins: Set(change.cash_coins.unwrap_or_default()),
                bank: Set(change.bank.unwrap_or_default()),
                updated_at: Set(now.into()),
            }
            .insert(conn)
            .await
        }
    }
}
