//! External-service ledger adapter.
//!
//! Guide payments for courier services (Servientrega) move money into the
//! point's cash and bank buckets. Each operation writes the service's own
//! audit row, its bucket totals, the general ledger and the general balance
//! snapshot in one transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cashdesk_core::external::{
    CashSplit, CounterError, ServiceCounters, floor_decrement, normalize_split,
};
use cashdesk_core::ledger::{MovementKind, cash_description};
use cashdesk_shared::AppError;
use cashdesk_shared::types::{PointId, UserId, round_money};

use super::ledger::{NewMovement, SnapshotChange, append_movement, find_snapshot, upsert_snapshot};
use super::reference::ReferenceData;
use crate::entities::{
    external_service_balances, external_service_history, external_service_movements, points,
    sea_orm_active_enums::{ServiceHistoryKind, ServiceMovementKind},
};

/// Service name of the Servientrega courier.
pub const SERVIENTREGA: &str = "SERVIENTREGA";

pub(crate) const GUIDE_REFERENCE_KIND: &str = "EXTERNAL_SERVICE_GUIDE";
const CREDIT_REFERENCE_KIND: &str = "EXTERNAL_SERVICE_CREDIT";

/// Error types for external-service operations.
#[derive(Debug, thiserror::Error)]
pub enum ExternalServiceError {
    /// Credit/debit rule failed.
    #[error(transparent)]
    Counter(#[from] CounterError),

    /// Point not found.
    #[error("Point not found: {0}")]
    PointNotFound(PointId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ExternalServiceError {
    /// Stable code callers branch on.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Counter(e) => e.error_code(),
            Self::PointNotFound(_) => "POINT_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<ExternalServiceError> for AppError {
    fn from(err: ExternalServiceError) -> Self {
        match err {
            ExternalServiceError::Counter(ref e) => Self::BusinessRule {
                code: e.error_code(),
                message: err.to_string(),
            },
            ExternalServiceError::PointNotFound(_) => Self::NotFound(err.to_string()),
            ExternalServiceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// A guide payment or its cancellation.
#[derive(Debug, Clone)]
pub struct GuideMovementInput {
    /// Point.
    pub point_id: PointId,
    /// Service name.
    pub service: String,
    /// Guide amount.
    pub amount: Decimal,
    /// Guide number.
    pub guide_reference: String,
    /// Requested notes part.
    pub notes: Option<Decimal>,
    /// Requested coins part.
    pub coins: Option<Decimal>,
    /// Requested bank part.
    pub bank: Option<Decimal>,
    /// Operator; the system user when absent.
    pub recorded_by: Option<UserId>,
}

impl GuideMovementInput {
    /// A Servientrega guide paid fully in notes.
    #[must_use]
    pub fn servientrega(point_id: PointId, amount: Decimal, guide_reference: impl Into<String>) -> Self {
        Self {
            point_id,
            service: SERVIENTREGA.to_string(),
            amount,
            guide_reference: guide_reference.into(),
            notes: None,
            coins: None,
            bank: None,
            recorded_by: None,
        }
    }

    /// Sets the requested split.
    #[must_use]
    pub const fn with_split(
        mut self,
        notes: Option<Decimal>,
        coins: Option<Decimal>,
        bank: Option<Decimal>,
    ) -> Self {
        self.notes = notes;
        self.coins = coins;
        self.bank = bank;
        self
    }

    /// Sets the operator.
    #[must_use]
    pub const fn recorded_by(mut self, user_id: UserId) -> Self {
        self.recorded_by = Some(user_id);
        self
    }
}

/// Balances before and after a guide movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideLedgerOutcome {
    /// Audit row id.
    pub movement_id: Uuid,
    /// Applied split.
    pub split: CashSplit,
    /// Service cash plus bank before.
    pub service_before: Decimal,
    /// Service cash plus bank after.
    pub service_after: Decimal,
    /// General snapshot amount before.
    pub general_before: Decimal,
    /// General snapshot amount after.
    pub general_after: Decimal,
}

/// Available credit before and after a credit or debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterOutcome {
    /// Available before.
    pub before: Decimal,
    /// Available after.
    pub after: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuideDirection {
    Income,
    Reversal,
}

/// External-service ledger adapter.
#[derive(Debug, Clone)]
pub struct ExternalServiceLedger {
    db: DatabaseConnection,
    reference: ReferenceData,
}

impl ExternalServiceLedger {
    /// Creates an adapter settling in the reference base currency.
    #[must_use]
    pub const fn new(db: DatabaseConnection, reference: ReferenceData) -> Self {
        Self { db, reference }
    }

    /// Records a paid guide.
    pub async fn record_income(
        &self,
        input: GuideMovementInput,
    ) -> Result<GuideLedgerOutcome, ExternalServiceError> {
        self.apply_guide(input, GuideDirection::Income).await
    }

    /// Records a cancelled guide. Bucket decrements stop at zero.
    pub async fn reverse_income(
        &self,
        input: GuideMovementInput,
    ) -> Result<GuideLedgerOutcome, ExternalServiceError> {
        self.apply_guide(input, GuideDirection::Reversal).await
    }

    /// Current counters of a service at a point, zero when never assigned.
    pub async fn counters(
        &self,
        point_id: PointId,
        service: &str,
    ) -> Result<ServiceCounters, ExternalServiceError> {
        Ok(find_service_row(&self.db, point_id, service)
            .await?
            .map_or_else(ServiceCounters::default, |row| ServiceCounters {
                total_assigned: row.total_assigned,
                total_used: row.total_used,
            }))
    }

    /// Assigns credit to a service.
    pub async fn credit_balance(
        &self,
        point_id: PointId,
        service: &str,
        amount: Decimal,
        recorded_by: UserId,
        note: Option<String>,
    ) -> Result<CounterOutcome, ExternalServiceError> {
        self.apply_counter(point_id, service, amount, recorded_by, note, ServiceHistoryKind::Credit)
            .await
    }

    /// Consumes service credit.
    ///
    /// Fails with `INSUFFICIENT_BALANCE` when used would exceed assigned.
    pub async fn debit_balance(
        &self,
        point_id: PointId,
        service: &str,
        amount: Decimal,
        recorded_by: UserId,
        note: Option<String>,
    ) -> Result<CounterOutcome, ExternalServiceError> {
        self.apply_counter(point_id, service, amount, recorded_by, note, ServiceHistoryKind::Debit)
            .await
    }

    async fn apply_guide(
        &self,
        input: GuideMovementInput,
        direction: GuideDirection,
    ) -> Result<GuideLedgerOutcome, ExternalServiceError> {
        let split = normalize_split(input.amount, input.notes, input.coins, input.bank);
        if split.total() <= Decimal::ZERO {
            return Err(CounterError::InvalidAmount(input.amount).into());
        }
        let recorded_by = input.recorded_by.unwrap_or(self.reference.system_user);
        let currency_id = self.reference.base_currency;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        ensure_point(&txn, input.point_id).await?;

        // Service buckets
        let service_row = service_row_or_default(&txn, input.point_id, &input.service).await?;
        let service_before = service_row.cash_amount + service_row.bank;
        let mut service: external_service_balances::ActiveModel = service_row.clone().into();
        let (cash_amount, notes, coins, bank) = match direction {
            GuideDirection::Income => (
                service_row.cash_amount + split.cash(),
                service_row.cash_notes + split.notes,
                service_row.cash_coins + split.coins,
                service_row.bank + split.bank,
            ),
            GuideDirection::Reversal => (
                floor_decrement(service_row.cash_amount, split.cash()),
                floor_decrement(service_row.cash_notes, split.notes),
                floor_decrement(service_row.cash_coins, split.coins),
                floor_decrement(service_row.bank, split.bank),
            ),
        };
        service.cash_amount = Set(cash_amount);
        service.cash_notes = Set(notes);
        service.cash_coins = Set(coins);
        service.bank = Set(bank);
        service.updated_at = Set(now.into());
        service.update(&txn).await?;
        let service_after = cash_amount + bank;

        let (kind, movement_kind, sign) = match direction {
            GuideDirection::Income => (ServiceMovementKind::Income, MovementKind::Income, Decimal::ONE),
            GuideDirection::Reversal => {
                (ServiceMovementKind::Reversal, MovementKind::Expense, Decimal::NEGATIVE_ONE)
            }
        };

        let audit = external_service_movements::ActiveModel {
            id: Set(Uuid::now_v7()),
            point_id: Set(input.point_id.into_inner()),
            service: Set(input.service.clone()),
            kind: Set(kind),
            amount: Set(split.total()),
            cash_notes: Set(split.notes),
            cash_coins: Set(split.coins),
            bank: Set(split.bank),
            guide_reference: Set(input.guide_reference.clone()),
            recorded_by: Set(recorded_by.into_inner()),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        // General ledger and snapshot
        let snapshot = find_snapshot(&txn, input.point_id, currency_id).await?;
        let (general_before, snap_notes, snap_coins, snap_bank) = snapshot
            .as_ref()
            .map_or((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO), |s| {
                (s.amount, s.cash_notes, s.cash_coins, s.bank)
            });
        let action = match direction {
            GuideDirection::Income => "Ingreso",
            GuideDirection::Reversal => "Reverso",
        };
        let description = cash_description(&format!(
            "{action} por guía {} ({})",
            input.guide_reference, input.service
        ));

        let mut change = SnapshotChange::default();
        let mut general_after = general_before;

        if split.cash() > Decimal::ZERO {
            general_after = round_money(general_before + sign * split.cash());
            append_movement(
                &txn,
                NewMovement {
                    point_id: input.point_id,
                    currency_id,
                    kind: movement_kind.clone(),
                    amount: sign * split.cash(),
                    balance_before: general_before,
                    balance_after: general_after,
                    description: description.clone(),
                    reference_kind: Some(GUIDE_REFERENCE_KIND),
                    reference_id: Some(audit.id.to_string()),
                    recorded_by,
                    created_at: now,
                },
            )
            .await?;
            change.amount = Some(general_after);
            change.cash_notes = Some(match direction {
                GuideDirection::Income => snap_notes + split.notes,
                GuideDirection::Reversal => floor_decrement(snap_notes, split.notes),
            });
            change.cash_coins = Some(match direction {
                GuideDirection::Income => snap_coins + split.coins,
                GuideDirection::Reversal => floor_decrement(snap_coins, split.coins),
            });
        }

        if split.bank > Decimal::ZERO {
            let bank_after = match direction {
                GuideDirection::Income => snap_bank + split.bank,
                GuideDirection::Reversal => floor_decrement(snap_bank, split.bank),
            };
            append_movement(
                &txn,
                NewMovement {
                    point_id: input.point_id,
                    currency_id,
                    kind: movement_kind,
                    amount: sign * split.bank,
                    balance_before: snap_bank,
                    balance_after: bank_after,
                    description: format!("{description} a bancos"),
                    reference_kind: Some(GUIDE_REFERENCE_KIND),
                    reference_id: Some(audit.id.to_string()),
                    recorded_by,
                    created_at: now,
                },
            )
            .await?;
            change.bank = Some(bank_after);
        }

        upsert_snapshot(&txn, input.point_id, currency_id, change).await?;
        txn.commit().await?;

        tracing::info!(
            point_id = %input.point_id,
            service = %input.service,
            guide = %input.guide_reference,
            direction = ?direction,
            cash = %split.cash(),
            bank = %split.bank,
            %general_before,
            %general_after,
            "Guide movement recorded"
        );

        Ok(GuideLedgerOutcome {
            movement_id: audit.id,
            split,
            service_before,
            service_after,
            general_before,
            general_after,
        })
    }

    async fn apply_counter(
        &self,
        point_id: PointId,
        service: &str,
        amount: Decimal,
        recorded_by: UserId,
        note: Option<String>,
        kind: ServiceHistoryKind,
    ) -> Result<CounterOutcome, ExternalServiceError> {
        let amount = round_money(amount);
        let now = Utc::now();

        let txn = self.db.begin().await?;
        ensure_point(&txn, point_id).await?;

        let row = service_row_or_default(&txn, point_id, service).await?;
        let current = ServiceCounters {
            total_assigned: row.total_assigned,
            total_used: row.total_used,
        };
        let next = match kind {
            ServiceHistoryKind::Credit => current.credit(amount),
            ServiceHistoryKind::Debit => current.debit(amount),
        }
        .inspect_err(|e| {
            tracing::warn!(%point_id, service, %amount, code = e.error_code(), "Service counter rejected");
        })?;

        let mut active: external_service_balances::ActiveModel = row.into();
        active.total_assigned = Set(next.total_assigned);
        active.total_used = Set(next.total_used);
        active.updated_at = Set(now.into());
        active.update(&txn).await?;

        let before = current.available();
        let after = next.available();

        let history = external_service_history::ActiveModel {
            id: Set(Uuid::now_v7()),
            point_id: Set(point_id.into_inner()),
            service: Set(service.to_string()),
            kind: Set(kind),
            amount: Set(amount),
            available_before: Set(before),
            available_after: Set(after),
            note: Set(note.clone()),
            recorded_by: Set(recorded_by.into_inner()),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        // Settled through the bank, so the movement never touches cash.
        let (movement_kind, signed, label) = match kind {
            ServiceHistoryKind::Credit => (MovementKind::Expense, -amount, "Asignación de saldo"),
            ServiceHistoryKind::Debit => (MovementKind::Income, amount, "Consumo de saldo"),
        };
        append_movement(
            &txn,
            NewMovement {
                point_id,
                currency_id: self.reference.base_currency,
                kind: movement_kind,
                amount: signed,
                balance_before: before,
                balance_after: after,
                description: note.map_or_else(
                    || format!("{label} {service} vía bancos"),
                    |text| format!("{label} {service} vía bancos: {text}"),
                ),
                reference_kind: Some(CREDIT_REFERENCE_KIND),
                reference_id: Some(history.id.to_string()),
                recorded_by,
                created_at: now,
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(%point_id, service, kind = ?kind, %amount, %before, %after, "Service counters updated");
        Ok(CounterOutcome { before, after })
    }
}

async fn ensure_point<C: ConnectionTrait>(conn: &C, point_id: PointId) -> Result<(), ExternalServiceError> {
    points::Entity::find_by_id(point_id.into_inner())
        .one(conn)
        .await?
        .map(|_| ())
        .ok_or(ExternalServiceError::PointNotFound(point_id))
}

async fn find_service_row<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    service: &str,
) -> Result<Option<external_service_balances::Model>, DbErr> {
    external_service_balances::Entity::find()
        .filter(external_service_balances::Column::PointId.eq(point_id.into_inner()))
        .filter(external_service_balances::Column::Service.eq(service))
        .one(conn)
        .await
}

/// Loads the service row, creating it with zero totals when missing.
async fn service_row_or_default<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    service: &str,
) -> Result<external_service_balances::Model, DbErr> {
    if let Some(row) = find_service_row(conn, point_id, service).await? {
        return Ok(row);
    }

    external_service_balances::ActiveModel {
        id: Set(Uuid::now_v7()),
        point_id: Set(point_id.into_inner()),
        service: Set(service.to_string()),
        total_assigned: Set(Decimal::ZERO),
        total_used: Set(Decimal::ZERO),
        cash_amount: Set(Decimal::ZERO),
        cash_notes: Set(Decimal::ZERO),
        cash_coins: Set(Decimal::ZERO),
        bank: Set(Decimal::ZERO),
        updated_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
}
