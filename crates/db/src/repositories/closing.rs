//! Daily closing repository.
//!
//! A closing runs as one transaction over five tables: the cash count header,
//! its per-currency details, the day closure, the operator's shift and the
//! balance snapshots. Precondition failures come back as
//! [`ClosingRejection`] values, storage failures as [`ClosingError`].

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cashdesk_core::closing::{
    ClosingDetailInput, ClosingRejection, CurrencyDaySummary, DayActivity, DayState, DaySummary,
    Discrepancy, MovementTotals, PointAccess, UserAccess, checked_total, collect_discrepancies,
    evaluate_closure,
};
use cashdesk_core::ledger::LedgerError;
use cashdesk_shared::AppError;
use cashdesk_shared::config::OpeningFallback;
use cashdesk_shared::time::{DayRange, day_range_for};
use cashdesk_shared::types::{CashCountId, CurrencyId, DayClosureId, PointId, UserId};

use super::balance::calculate_balance;
use super::external_service::GUIDE_REFERENCE_KIND;
use super::ledger::{SnapshotChange, find_snapshot, upsert_snapshot};
use crate::entities::{
    balance_movements, cash_count_details, cash_counts, currencies, day_closures, exchanges,
    external_service_movements, points, shifts, transfers, users,
    sea_orm_active_enums::{
        CashCountStatus, DayClosureStatus, ExchangeStatus, ShiftStatus, TransferStatus,
    },
};

const SHIFT_AUTO_NOTE: &str = "Turno finalizado automáticamente por cierre diario";

/// Error types for closing operations.
#[derive(Debug, thiserror::Error)]
pub enum ClosingError {
    /// The same currency appears twice in a cash count.
    #[error("Currency {0} appears more than once in the cash count")]
    DuplicateDetail(CurrencyId),

    /// Stored discrepancies could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Counted totals left the representable range.
    #[error("Cash count totals overflow: {0}")]
    Overflow(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ClosingError> for AppError {
    fn from(err: ClosingError) -> Self {
        match err {
            ClosingError::DuplicateDetail(_) | ClosingError::Overflow(_) => {
                Self::Validation(err.to_string())
            }
            ClosingError::Serialization(e) => Self::Internal(e.to_string()),
            ClosingError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Outcome of the closing precondition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureValidation {
    /// The closing may proceed.
    Allowed,
    /// The closing must not proceed.
    Rejected(ClosingRejection),
}

/// A cash count submitted by an operator, for a partial save or a closing.
#[derive(Debug, Clone)]
pub struct CashCountInput {
    /// Point.
    pub point_id: PointId,
    /// Operator.
    pub user_id: UserId,
    /// Business day.
    pub day: NaiveDate,
    /// One line per counted currency.
    pub details: Vec<ClosingDetailInput>,
    /// Operation counts shown in the day summary.
    pub activity: DayActivity,
    /// Free-text note.
    pub notes: Option<String>,
}

/// Identifiers produced by a successful closing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingReceipt {
    /// Day closure row.
    pub day_closure_id: DayClosureId,
    /// Cash count header.
    pub cash_count_id: CashCountId,
    /// Whether an open shift was ended.
    pub shift_ended: bool,
    /// Differences reported on the closure.
    pub discrepancies: Vec<Discrepancy>,
}

/// Outcome of [`ClosingRepository::perform_closing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosingResult {
    /// The day is closed.
    Closed(ClosingReceipt),
    /// A precondition failed; nothing was written.
    Rejected(ClosingRejection),
}

/// Outcome of [`ClosingRepository::save_partial_count`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialCountResult {
    /// The count was saved under this header.
    Saved(CashCountId),
    /// The day is already closed.
    Rejected(ClosingRejection),
}

/// Closing state of a (point, day) with display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureStatus {
    /// Point.
    pub point_id: PointId,
    /// Business day.
    pub day: NaiveDate,
    /// Day state.
    pub state: DayState,
    /// Day closure row, if any.
    pub day_closure_id: Option<DayClosureId>,
    /// User who closed the day.
    pub closed_by: Option<UserId>,
    /// Display name of that user.
    pub closed_by_name: Option<String>,
    /// When the day was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Latest cash count header of the day.
    pub cash_count_id: Option<CashCountId>,
    /// Its status.
    pub cash_count_status: Option<CashCountStatus>,
    /// Display name of the operator who counted.
    pub counted_by_name: Option<String>,
    /// Differences reported on the closure.
    pub discrepancies: Vec<Discrepancy>,
}

/// Daily closing repository.
#[derive(Debug, Clone)]
pub struct ClosingRepository {
    db: DatabaseConnection,
    opening_fallback: OpeningFallback,
}

impl ClosingRepository {
    /// Creates a closing repository using the snapshot opening fallback.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            opening_fallback: OpeningFallback::Snapshot,
        }
    }

    /// Sets where opening balances come from when no earlier count exists.
    #[must_use]
    pub const fn with_opening_fallback(mut self, fallback: OpeningFallback) -> Self {
        self.opening_fallback = fallback;
        self
    }

    /// Checks whether `user_id` may close `day` at `point_id`.
    pub async fn validate_closure_possible(
        &self,
        point_id: PointId,
        day: NaiveDate,
        user_id: UserId,
    ) -> Result<ClosureValidation, ClosingError> {
        Ok(validate_with(&self.db, point_id, day, user_id).await?)
    }

    /// Opening balance of a currency for a period starting at `period_start`.
    ///
    /// Uses the physical count of the latest closed or partial cash count
    /// created before `period_start`. Without one, falls back to the
    /// configured source.
    pub async fn compute_opening_balance(
        &self,
        point_id: PointId,
        currency_id: CurrencyId,
        period_start: DateTime<Utc>,
    ) -> Result<Decimal, ClosingError> {
        Ok(opening_balance_with(
            &self.db,
            self.opening_fallback,
            point_id,
            currency_id,
            period_start,
        )
        .await?)
    }

    /// Builds the summary an operator reviews before closing a day.
    pub async fn summarize_day(
        &self,
        point_id: PointId,
        day: NaiveDate,
        user_id: UserId,
    ) -> Result<DaySummary, ClosingError> {
        let range = day_range_for(day);
        let mut touched: BTreeSet<Uuid> = BTreeSet::new();
        let mut activity = DayActivity::default();

        let day_exchanges = exchanges::Entity::find()
            .filter(exchanges::Column::PointId.eq(point_id.into_inner()))
            .filter(exchanges::Column::Status.eq(ExchangeStatus::Completed))
            .filter(in_range(exchanges::Column::CreatedAt, range))
            .all(&self.db)
            .await?;
        for exchange in &day_exchanges {
            touched.insert(exchange.origin_currency_id);
            touched.insert(exchange.destination_currency_id);
        }
        activity.exchanges = u64::try_from(day_exchanges.len()).unwrap_or(u64::MAX);

        let day_transfers = transfers::Entity::find()
            .filter(transfers::Column::Status.eq(TransferStatus::Approved))
            .filter(
                Condition::any()
                    .add(transfers::Column::DestinationPointId.eq(point_id.into_inner()))
                    .add(transfers::Column::OriginPointId.eq(point_id.into_inner())),
            )
            .filter(in_range(transfers::Column::CreatedAt, range))
            .all(&self.db)
            .await?;
        for transfer in &day_transfers {
            touched.insert(transfer.currency_id);
            if transfer.destination_point_id == point_id.into_inner() {
                activity.transfers_in += 1;
            } else {
                activity.transfers_out += 1;
            }
        }

        activity.external_operations = external_service_movements::Entity::find()
            .filter(external_service_movements::Column::PointId.eq(point_id.into_inner()))
            .filter(in_range(external_service_movements::Column::CreatedAt, range))
            .count(&self.db)
            .await?;
        let guide_currencies = balance_movements::Entity::find()
            .filter(balance_movements::Column::PointId.eq(point_id.into_inner()))
            .filter(balance_movements::Column::ReferenceKind.eq(GUIDE_REFERENCE_KIND))
            .filter(in_range(balance_movements::Column::CreatedAt, range))
            .all(&self.db)
            .await?;
        touched.extend(guide_currencies.into_iter().map(|movement| movement.currency_id));

        let codes = currencies::Entity::find()
            .filter(currencies::Column::Id.is_in(touched.iter().copied()))
            .all(&self.db)
            .await?;

        let mut lines = Vec::with_capacity(codes.len());
        for currency in codes {
            let currency_id = CurrencyId::from_uuid(currency.id);
            let opening_balance = opening_balance_with(
                &self.db,
                self.opening_fallback,
                point_id,
                currency_id,
                range.gte,
            )
            .await?;
            let theoretical_closing = calculate_balance(&self.db, point_id, currency_id).await?;

            let amounts = balance_movements::Entity::find()
                .filter(balance_movements::Column::PointId.eq(point_id.into_inner()))
                .filter(balance_movements::Column::CurrencyId.eq(currency.id))
                .filter(in_range(balance_movements::Column::CreatedAt, range))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|movement| movement.amount);
            let totals = MovementTotals::from_amounts(amounts).unwrap_or_else(|e| {
                tracing::error!(
                    point_id = %point_id,
                    currency_id = %currency_id,
                    error = %e,
                    "Day totals overflowed, reporting zero"
                );
                MovementTotals::default()
            });

            lines.push(CurrencyDaySummary {
                currency_id,
                currency_code: currency.code,
                opening_balance,
                theoretical_closing,
                totals,
            });
        }
        lines.sort_by(|a, b| a.currency_code.cmp(&b.currency_code));

        let open_cash_count = cash_counts::Entity::find()
            .filter(cash_counts::Column::PointId.eq(point_id.into_inner()))
            .filter(cash_counts::Column::UserId.eq(user_id.into_inner()))
            .filter(cash_counts::Column::BusinessDay.eq(day))
            .filter(
                cash_counts::Column::Status
                    .is_in([CashCountStatus::Open, CashCountStatus::Partial]),
            )
            .order_by_desc(cash_counts::Column::CreatedAt)
            .one(&self.db)
            .await?
            .map(|header| CashCountId::from_uuid(header.id));

        Ok(DaySummary {
            day,
            currencies: lines,
            activity,
            open_cash_count,
        })
    }

    /// Saves a cash count without closing the day.
    ///
    /// The first save of the day creates the header as `PARTIAL`; later saves
    /// update it in place and replace its details.
    pub async fn save_partial_count(
        &self,
        input: CashCountInput,
    ) -> Result<PartialCountResult, ClosingError> {
        ensure_distinct_currencies(&input.details)?;

        let txn = self.db.begin().await?;

        if load_day_state(&txn, input.point_id, input.day).await? == DayState::Closed {
            return Ok(PartialCountResult::Rejected(ClosingRejection::AlreadyClosed {
                point_id: input.point_id,
                day: input.day,
            }));
        }

        let header = upsert_header(&txn, &input, CashCountStatus::Partial).await?;
        replace_details(&txn, header.id, &input.details).await?;

        txn.commit().await?;

        tracing::info!(
            point_id = %input.point_id,
            day = %input.day,
            cash_count_id = %header.id,
            currencies = input.details.len(),
            "Partial cash count saved"
        );
        Ok(PartialCountResult::Saved(CashCountId::from_uuid(header.id)))
    }

    /// Closes a business day.
    ///
    /// In one transaction: re-validates, closes the cash count and replaces
    /// its details, closes the day with its discrepancies, ends the
    /// operator's open shift at the point and sets each counted currency's
    /// snapshot to the physical count. Any storage failure rolls back every
    /// step.
    pub async fn perform_closing(&self, input: CashCountInput) -> Result<ClosingResult, ClosingError> {
        ensure_distinct_currencies(&input.details)?;

        let txn = self.db.begin().await?;

        let outcome = close_with(&txn, &input).await;
        let result = match outcome {
            Ok(ClosingResult::Closed(receipt)) => txn
                .commit()
                .await
                .map(|()| ClosingResult::Closed(receipt))
                .map_err(ClosingError::from),
            Ok(rejected) => Ok(rejected),
            Err(e) => Err(e),
        };

        match result {
            Ok(ClosingResult::Closed(receipt)) => {
                tracing::info!(
                    point_id = %input.point_id,
                    day = %input.day,
                    user_id = %input.user_id,
                    day_closure_id = %receipt.day_closure_id,
                    discrepancies = receipt.discrepancies.len(),
                    shift_ended = receipt.shift_ended,
                    "Day closed"
                );
                Ok(ClosingResult::Closed(receipt))
            }
            Ok(ClosingResult::Rejected(rejection)) => {
                tracing::warn!(
                    point_id = %input.point_id,
                    day = %input.day,
                    code = rejection.code(),
                    "Closing rejected"
                );
                Ok(ClosingResult::Rejected(rejection))
            }
            Err(ClosingError::Database(e))
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                tracing::warn!(point_id = %input.point_id, day = %input.day, "Concurrent closing lost the race");
                Ok(ClosingResult::Rejected(ClosingRejection::AlreadyClosed {
                    point_id: input.point_id,
                    day: input.day,
                }))
            }
            Err(e) => {
                tracing::error!(point_id = %input.point_id, day = %input.day, error = %e, "Closing rolled back");
                Err(e)
            }
        }
    }

    /// Closing state of a (point, day) joined with user display names.
    pub async fn get_closure_status(
        &self,
        point_id: PointId,
        day: NaiveDate,
    ) -> Result<ClosureStatus, ClosingError> {
        let closure = find_closure(&self.db, point_id, day).await?;

        let header = cash_counts::Entity::find()
            .filter(cash_counts::Column::PointId.eq(point_id.into_inner()))
            .filter(cash_counts::Column::BusinessDay.eq(day))
            .order_by_desc(cash_counts::Column::CreatedAt)
            .one(&self.db)
            .await?;

        let closed_by = closure.as_ref().and_then(|c| c.closed_by);
        let closed_by_name = match closed_by {
            Some(id) => display_name(&self.db, id).await?,
            None => None,
        };
        let counted_by_name = match &header {
            Some(h) => display_name(&self.db, h.user_id).await?,
            None => None,
        };

        let discrepancies = match &closure {
            Some(c) => serde_json::from_value(c.reported_differences.clone())?,
            None => Vec::new(),
        };

        Ok(ClosureStatus {
            point_id,
            day,
            state: closure.as_ref().map_or(DayState::NoClosure, |c| state_of(c.status)),
            day_closure_id: closure.as_ref().map(|c| DayClosureId::from_uuid(c.id)),
            closed_by: closed_by.map(UserId::from_uuid),
            closed_by_name,
            closed_at: closure
                .as_ref()
                .and_then(|c| c.closed_at)
                .map(|at| at.with_timezone(&Utc)),
            cash_count_id: header.as_ref().map(|h| CashCountId::from_uuid(h.id)),
            cash_count_status: header.as_ref().map(|h| h.status),
            counted_by_name,
            discrepancies,
        })
    }
}

async fn close_with<C: ConnectionTrait>(
    conn: &C,
    input: &CashCountInput,
) -> Result<ClosingResult, ClosingError> {
    // (a) preconditions
    if let ClosureValidation::Rejected(rejection) =
        validate_with(conn, input.point_id, input.day, input.user_id).await?
    {
        return Ok(ClosingResult::Rejected(rejection));
    }

    let now = Utc::now();

    // (b) cash count header and details
    let header = upsert_header(conn, input, CashCountStatus::Closed).await?;
    replace_details(conn, header.id, &input.details).await?;

    // (c) day closure
    let discrepancies = collect_discrepancies(&input.details);
    let reported = serde_json::to_value(&discrepancies)?;
    let closure = match find_closure(conn, input.point_id, input.day).await? {
        Some(existing) => {
            let mut active: day_closures::ActiveModel = existing.into();
            active.status = Set(DayClosureStatus::Closed);
            active.closed_by = Set(Some(input.user_id.into_inner()));
            active.reported_differences = Set(reported);
            active.notes = Set(input.notes.clone());
            active.closed_at = Set(Some(now.into()));
            active.update(conn).await?
        }
        None => {
            day_closures::ActiveModel {
                id: Set(Uuid::now_v7()),
                point_id: Set(input.point_id.into_inner()),
                business_day: Set(input.day),
                status: Set(DayClosureStatus::Closed),
                closed_by: Set(Some(input.user_id.into_inner())),
                reported_differences: Set(reported),
                notes: Set(input.notes.clone()),
                created_at: Set(now.into()),
                closed_at: Set(Some(now.into())),
            }
            .insert(conn)
            .await?
        }
    };

    // (d) operator shift
    let open_shifts = shifts::Entity::find()
        .filter(shifts::Column::UserId.eq(input.user_id.into_inner()))
        .filter(shifts::Column::PointId.eq(input.point_id.into_inner()))
        .filter(shifts::Column::Status.is_in([ShiftStatus::Active, ShiftStatus::Lunch]))
        .filter(shifts::Column::EndedAt.is_null())
        .all(conn)
        .await?;
    let shift_ended = !open_shifts.is_empty();
    for shift in open_shifts {
        let mut active: shifts::ActiveModel = shift.into();
        active.status = Set(ShiftStatus::Completed);
        active.ended_at = Set(Some(now.into()));
        active.notes = Set(Some(SHIFT_AUTO_NOTE.to_string()));
        active.update(conn).await?;
    }

    // (e) snapshots follow the physical count
    for detail in &input.details {
        upsert_snapshot(
            conn,
            input.point_id,
            detail.currency_id,
            SnapshotChange {
                amount: Some(detail.physical_count),
                cash_notes: Some(detail.cash_notes),
                cash_coins: Some(detail.cash_coins),
                bank: None,
            },
        )
        .await?;
    }

    Ok(ClosingResult::Closed(ClosingReceipt {
        day_closure_id: DayClosureId::from_uuid(closure.id),
        cash_count_id: CashCountId::from_uuid(header.id),
        shift_ended,
        discrepancies,
    }))
}

async fn validate_with<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    day: NaiveDate,
    user_id: UserId,
) -> Result<ClosureValidation, DbErr> {
    let state = load_day_state(conn, point_id, day).await?;

    let point = points::Entity::find_by_id(point_id.into_inner())
        .one(conn)
        .await?
        .map(|p| PointAccess {
            is_active: p.is_active,
        });

    let user = users::Entity::find_by_id(user_id.into_inner())
        .one(conn)
        .await?
        .map(|u| UserAccess {
            is_active: u.is_active,
            point_bound: u.role.is_point_bound(),
            assigned_point: u.point_id.map(PointId::from_uuid),
        });

    Ok(match evaluate_closure(point_id, day, user_id, state, point, user) {
        Ok(()) => ClosureValidation::Allowed,
        Err(rejection) => ClosureValidation::Rejected(rejection),
    })
}

async fn opening_balance_with<C: ConnectionTrait>(
    conn: &C,
    fallback: OpeningFallback,
    point_id: PointId,
    currency_id: CurrencyId,
    period_start: DateTime<Utc>,
) -> Result<Decimal, DbErr> {
    let previous = cash_count_details::Entity::find()
        .inner_join(cash_counts::Entity)
        .filter(cash_counts::Column::PointId.eq(point_id.into_inner()))
        .filter(
            cash_counts::Column::Status.is_in([CashCountStatus::Closed, CashCountStatus::Partial]),
        )
        .filter(cash_counts::Column::CreatedAt.lt(at(period_start)))
        .filter(cash_count_details::Column::CurrencyId.eq(currency_id.into_inner()))
        .order_by_desc(cash_counts::Column::CreatedAt)
        .one(conn)
        .await?;

    if let Some(detail) = previous {
        return Ok(detail.physical_count);
    }

    match fallback {
        OpeningFallback::Snapshot => Ok(find_snapshot(conn, point_id, currency_id)
            .await?
            .map_or(Decimal::ZERO, |snapshot| snapshot.amount)),
        OpeningFallback::Ledger => calculate_balance(conn, point_id, currency_id).await,
    }
}

async fn find_closure<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    day: NaiveDate,
) -> Result<Option<day_closures::Model>, DbErr> {
    day_closures::Entity::find()
        .filter(day_closures::Column::PointId.eq(point_id.into_inner()))
        .filter(day_closures::Column::BusinessDay.eq(day))
        .one(conn)
        .await
}

async fn load_day_state<C: ConnectionTrait>(
    conn: &C,
    point_id: PointId,
    day: NaiveDate,
) -> Result<DayState, DbErr> {
    Ok(find_closure(conn, point_id, day)
        .await?
        .map_or(DayState::NoClosure, |closure| state_of(closure.status)))
}

const fn state_of(status: DayClosureStatus) -> DayState {
    match status {
        DayClosureStatus::Open => DayState::Open,
        DayClosureStatus::Closed => DayState::Closed,
    }
}

/// Creates or updates the day's unclosed header for the point.
async fn upsert_header<C: ConnectionTrait>(
    conn: &C,
    input: &CashCountInput,
    status: CashCountStatus,
) -> Result<cash_counts::Model, ClosingError> {
    let now = Utc::now();
    let total_income = checked_total(input.details.iter().map(|d| d.income))?;
    let total_expense = checked_total(input.details.iter().map(|d| d.expense))?;
    let closed_at: Option<DateTimeWithTimeZone> =
        (status == CashCountStatus::Closed).then(|| now.into());

    let existing = cash_counts::Entity::find()
        .filter(cash_counts::Column::PointId.eq(input.point_id.into_inner()))
        .filter(cash_counts::Column::BusinessDay.eq(input.day))
        .filter(
            cash_counts::Column::Status.is_in([CashCountStatus::Open, CashCountStatus::Partial]),
        )
        .order_by_desc(cash_counts::Column::CreatedAt)
        .one(conn)
        .await?;

    match existing {
        Some(header) => {
            let mut active: cash_counts::ActiveModel = header.into();
            active.user_id = Set(input.user_id.into_inner());
            active.status = Set(status);
            active.total_exchanges = Set(count_column(input.activity.exchanges));
            active.transfers_in = Set(count_column(input.activity.transfers_in));
            active.transfers_out = Set(count_column(input.activity.transfers_out));
            active.total_income = Set(total_income);
            active.total_expense = Set(total_expense);
            active.notes = Set(input.notes.clone());
            active.closed_at = Set(closed_at);
            Ok(active.update(conn).await?)
        }
        None => {
            let header = cash_counts::ActiveModel {
                id: Set(Uuid::now_v7()),
                point_id: Set(input.point_id.into_inner()),
                user_id: Set(input.user_id.into_inner()),
                business_day: Set(input.day),
                status: Set(status),
                total_exchanges: Set(count_column(input.activity.exchanges)),
                transfers_in: Set(count_column(input.activity.transfers_in)),
                transfers_out: Set(count_column(input.activity.transfers_out)),
                total_income: Set(total_income),
                total_expense: Set(total_expense),
                notes: Set(input.notes.clone()),
                created_at: Set(now.into()),
                closed_at: Set(closed_at),
            }
            .insert(conn)
            .await?;
            Ok(header)
        }
    }
}

async fn replace_details<C: ConnectionTrait>(
    conn: &C,
    cash_count_id: Uuid,
    details: &[ClosingDetailInput],
) -> Result<(), DbErr> {
    cash_count_details::Entity::delete_many()
        .filter(cash_count_details::Column::CashCountId.eq(cash_count_id))
        .exec(conn)
        .await?;

    for detail in details {
        cash_count_details::ActiveModel {
            id: Set(Uuid::now_v7()),
            cash_count_id: Set(cash_count_id),
            currency_id: Set(detail.currency_id.into_inner()),
            opening_balance: Set(detail.opening_balance),
            theoretical_closing: Set(detail.theoretical_closing),
            physical_count: Set(detail.physical_count),
            cash_notes: Set(detail.cash_notes),
            cash_coins: Set(detail.cash_coins),
            difference: Set(detail.difference()),
            income: Set(detail.income),
            expense: Set(detail.expense),
            movement_count: Set(detail.movement_count),
            justification: Set(detail.justification.clone()),
        }
        .insert(conn)
        .await?;
    }

    Ok(())
}

fn ensure_distinct_currencies(details: &[ClosingDetailInput]) -> Result<(), ClosingError> {
    let mut seen = HashSet::with_capacity(details.len());
    for detail in details {
        if !seen.insert(detail.currency_id) {
            return Err(ClosingError::DuplicateDetail(detail.currency_id));
        }
    }
    Ok(())
}

async fn display_name<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> Result<Option<String>, DbErr> {
    Ok(users::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .map(|user| user.full_name))
}

fn in_range<Col: ColumnTrait>(column: Col, range: DayRange) -> Condition {
    Condition::all()
        .add(column.gte(at(range.gte)))
        .add(column.lt(at(range.lt)))
}

fn at(instant: DateTime<Utc>) -> DateTimeWithTimeZone {
    instant.into()
}

fn count_column(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
