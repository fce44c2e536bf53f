//! Balance calculation and reconciliation.
//!
//! The authoritative cash balance of a (point, currency) is rebuilt from the
//! active initial balance and the ledger. The `balances` table is a cache of
//! that value; reconciliation refreshes the cache and never writes a ledger
//! movement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cashdesk_core::ledger::{MovementKind, MovementLine, fold_cash_balance};
use cashdesk_core::maintenance::{BackfillReport, Correction, RunMode};
use cashdesk_shared::AppError;
use cashdesk_shared::types::{CurrencyId, PointId, UserId, exceeds_tolerance, round_money};

use super::ledger::{NewMovement, SnapshotChange, append_movement, find_snapshot, upsert_snapshot};
use crate::entities::{balance_movements, balances, currencies, initial_balances, points};

/// Error types for balance operations.
#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    /// Initial balances cannot be negative.
    #[error("Invalid initial balance: {0}")]
    InvalidAmount(Decimal),

    /// Point not found.
    #[error("Point not found: {0}")]
    PointNotFound(PointId),

    /// Currency not found.
    #[error("Currency not found: {0}")]
    CurrencyNotFound(CurrencyId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<BalanceError> for AppError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::InvalidAmount(_) => Self::Validation(err.to_string()),
            BalanceError::PointNotFound(_) | BalanceError::CurrencyNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            BalanceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for assigning an initial balance.
#[derive(Debug, Clone)]
pub struct AssignInitialBalanceInput {
    /// Point.
    pub point_id: PointId,
    /// Currency.
    pub currency_id: CurrencyId,
    /// New baseline amount.
    pub amount: Decimal,
    /// Assigning user.
    pub assigned_by: UserId,
    /// Free-text note.
    pub notes: Option<String>,
}

/// Result of reconciling one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// Point.
    pub point_id: PointId,
    /// Currency.
    pub currency_id: CurrencyId,
    /// Snapshot amount before reconciling.
    pub before: Decimal,
    /// Calculated amount.
    pub after: Decimal,
    /// `before - after`.
    pub diff: Decimal,
    /// Whether the snapshot was rewritten.
    pub corrected: bool,
}

/// Per-currency entry of [`BalanceRepository::reconcile_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyReconciliation {
    /// Currency.
    pub currency_id: CurrencyId,
    /// Outcome, or the error message if this currency failed.
    pub result: Result<ReconcileOutcome, String>,
}

/// Calculates the cash balance of a (point, currency).
///
/// Nil ids and corrupt folds are logged and yield zero. Storage errors
/// propagate.
pub async fn calculate_balance<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    currency_id: CurrencyId,
) -> Result<Decimal, DbErr> {
    if point_id.is_nil() || currency_id.is_nil() {
        tracing::warn!(%point_id, %currency_id, "Balance requested for a nil id, returning zero");
        return Ok(Decimal::ZERO);
    }

    let initial = active_initial_balance(conn, point_id, currency_id).await?;
    let (base, cutover) = initial
        .as_ref()
        .map_or((Decimal::ZERO, None), |row| (row.amount, Some(row.assigned_at)));

    let mut query = balance_movements::Entity::find()
        .filter(balance_movements::Column::PointId.eq(point_id.into_inner()))
        .filter(balance_movements::Column::CurrencyId.eq(currency_id.into_inner()));
    if let Some(cutover) = cutover {
        query = query.filter(balance_movements::Column::CreatedAt.gte(cutover));
    }
    let rows = query
        .order_by_asc(balance_movements::Column::CreatedAt)
        .order_by_asc(balance_movements::Column::Id)
        .all(conn)
        .await?;

    let lines = rows
        .iter()
        .map(|row| MovementLine::new(&row.kind, row.amount, row.description.as_deref()));

    match fold_cash_balance(base, lines) {
        Ok(fold) => {
            tracing::debug!(
                %point_id,
                %currency_id,
                balance = %fold.balance,
                applied = fold.applied,
                skipped_bank = fold.skipped_bank,
                "Calculated cash balance"
            );
            Ok(fold.balance)
        }
        Err(e) => {
            tracing::error!(%point_id, %currency_id, error = %e, "Corrupt ledger, returning zero");
            Ok(Decimal::ZERO)
        }
    }
}

/// Active initial balance of a (point, currency), if any.
pub(crate) async fn active_initial_balance<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    currency_id: CurrencyId,
) -> Result<Option<initial_balances::Model>, DbErr> {
    initial_balances::Entity::find()
        .filter(initial_balances::Column::PointId.eq(point_id.into_inner()))
        .filter(initial_balances::Column::CurrencyId.eq(currency_id.into_inner()))
        .filter(initial_balances::Column::IsActive.eq(true))
        .order_by_desc(initial_balances::Column::AssignedAt)
        .one(conn)
        .await
}

/// Reconciles one snapshot inside `conn`.
async fn reconcile_with<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    currency_id: CurrencyId,
) -> Result<ReconcileOutcome, DbErr> {
    let before = find_snapshot(conn, point_id, currency_id)
        .await?
        .map_or(Decimal::ZERO, |row| row.amount);
    let after = calculate_balance(conn, point_id, currency_id).await?;
    let diff = round_money(before - after);
    let corrected = exceeds_tolerance(diff);

    if corrected {
        upsert_snapshot(
            conn,
            point_id,
            currency_id,
            SnapshotChange {
                amount: Some(after),
                ..SnapshotChange::default()
            },
        )
        .await?;
        tracing::info!(%point_id, %currency_id, %before, %after, %diff, "Balance snapshot corrected");
    }

    Ok(ReconcileOutcome {
        point_id,
        currency_id,
        before,
        after,
        diff,
        corrected,
    })
}

/// Balance repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Calculates the cash balance of a (point, currency).
    pub async fn calculate(
        &self,
        point_id: PointId,
        currency_id: CurrencyId,
    ) -> Result<Decimal, BalanceError> {
        Ok(calculate_balance(&self.db, point_id, currency_id).await?)
    }

    /// Assigns a new initial balance.
    ///
    /// Deactivates the current active row, inserts the new one, appends a
    /// `SALDO_INICIAL` movement at the same instant and sets the snapshot
    /// amount. Movements before this instant stop counting.
    pub async fn assign_initial_balance(
        &self,
        input: AssignInitialBalanceInput,
    ) -> Result<initial_balances::Model, BalanceError> {
        if input.amount < Decimal::ZERO {
            return Err(BalanceError::InvalidAmount(input.amount));
        }
        let amount = round_money(input.amount);

        let txn = self.db.begin().await?;

        points::Entity::find_by_id(input.point_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(BalanceError::PointNotFound(input.point_id))?;
        currencies::Entity::find_by_id(input.currency_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(BalanceError::CurrencyNotFound(input.currency_id))?;

        initial_balances::Entity::update_many()
            .col_expr(initial_balances::Column::IsActive, Expr::value(false))
            .filter(initial_balances::Column::PointId.eq(input.point_id.into_inner()))
            .filter(initial_balances::Column::CurrencyId.eq(input.currency_id.into_inner()))
            .filter(initial_balances::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        let now = Utc::now();
        let row = initial_balances::ActiveModel {
            id: Set(Uuid::now_v7()),
            point_id: Set(input.point_id.into_inner()),
            currency_id: Set(input.currency_id.into_inner()),
            amount: Set(amount),
            assigned_at: Set(now.into()),
            assigned_by: Set(input.assigned_by.into_inner()),
            is_active: Set(true),
            notes: Set(input.notes.clone()),
        }
        .insert(&txn)
        .await?;

        let previous = find_snapshot(&txn, input.point_id, input.currency_id)
            .await?
            .map_or(Decimal::ZERO, |snapshot| snapshot.amount);

        append_movement(
            &txn,
            NewMovement {
                point_id: input.point_id,
                currency_id: input.currency_id,
                kind: MovementKind::InitialBalance,
                amount,
                balance_before: previous,
                balance_after: amount,
                description: input
                    .notes
                    .unwrap_or_else(|| "Saldo inicial asignado".to_string()),
                reference_kind: Some("INITIAL_BALANCE"),
                reference_id: Some(row.id.to_string()),
                recorded_by: input.assigned_by,
                created_at: now,
            },
        )
        .await?;

        upsert_snapshot(
            &txn,
            input.point_id,
            input.currency_id,
            SnapshotChange {
                amount: Some(amount),
                ..SnapshotChange::default()
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            point_id = %input.point_id,
            currency_id = %input.currency_id,
            %amount,
            "Initial balance assigned"
        );
        Ok(row)
    }

    /// Refreshes one snapshot from the calculated balance.
    ///
    /// Writes only when `|before - after| > 0.01`. Calling it twice in a row
    /// reports `corrected = false` the second time.
    pub async fn reconcile_one(
        &self,
        point_id: PointId,
        currency_id: CurrencyId,
    ) -> Result<ReconcileOutcome, BalanceError> {
        let txn = self.db.begin().await?;
        let outcome = reconcile_with(&txn, point_id, currency_id).await?;
        txn.commit().await?;
        Ok(outcome)
    }

    /// Reconciles every currency that has a snapshot at the point.
    ///
    /// A failing currency is reported in its entry and does not stop the
    /// others.
    pub async fn reconcile_all(
        &self,
        point_id: PointId,
    ) -> Result<Vec<CurrencyReconciliation>, BalanceError> {
        let snapshots = balances::Entity::find()
            .filter(balances::Column::PointId.eq(point_id.into_inner()))
            .order_by_asc(balances::Column::CurrencyId)
            .all(&self.db)
            .await?;

        let mut results = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let currency_id = CurrencyId::from_uuid(snapshot.currency_id);
            let result = self
                .reconcile_one(point_id, currency_id)
                .await
                .map_err(|e| {
                    tracing::error!(%point_id, %currency_id, error = %e, "Reconciliation failed");
                    e.to_string()
                });
            results.push(CurrencyReconciliation { currency_id, result });
        }

        Ok(results)
    }

    /// Every snapshot system-wide whose stored amount differs from the
    /// calculated one by more than the tolerance. Read only.
    ///
    /// A pair that fails to calculate is listed in `errors` and the scan
    /// goes on.
    pub async fn drift_report(&self) -> Result<BackfillReport, BalanceError> {
        let snapshots = balances::Entity::find()
            .order_by_asc(balances::Column::PointId)
            .order_by_asc(balances::Column::CurrencyId)
            .all(&self.db)
            .await?;

        let mut report = BackfillReport::new(RunMode::DryRun);
        for snapshot in snapshots {
            report.scanned += 1;
            let point_id = PointId::from_uuid(snapshot.point_id);
            let currency_id = CurrencyId::from_uuid(snapshot.currency_id);
            let calculated = match calculate_balance(&self.db, point_id, currency_id).await {
                Ok(calculated) => calculated,
                Err(e) => {
                    tracing::error!(%point_id, %currency_id, error = %e, "Drift check failed");
                    report.errors.push(format!("{point_id}/{currency_id}: {e}"));
                    continue;
                }
            };
            let diff = round_money(snapshot.amount - calculated);
            if exceeds_tolerance(diff) {
                report.corrections.push(Correction {
                    point_id,
                    currency_id,
                    stored: snapshot.amount,
                    calculated,
                    diff,
                });
            }
        }

        tracing::info!(
            scanned = report.scanned,
            drifted = report.corrections.len(),
            errors = report.errors.len(),
            "Drift report complete"
        );
        Ok(report)
    }
}

/// Instant from which movements count for a (point, currency).
pub(crate) async fn cutover<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    currency_id: CurrencyId,
) -> Result<Option<DateTime<Utc>>, DbErr> {
    Ok(active_initial_balance(conn, point_id, currency_id)
        .await?
        .map(|row| row.assigned_at.with_timezone(&Utc)))
}
