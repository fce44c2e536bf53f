//! Batch maintenance over balances and historical records.
//!
//! Every job runs sequentially and honors [`RunMode`]: a dry run reads and
//! reports, an execute run writes. Per-item failures are collected in the
//! report and do not stop the batch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cashdesk_core::ledger::{MovementKind, cash_description};
use cashdesk_core::maintenance::{
    ADJUSTMENT_REFERENCE_KIND, BackfillReport, Correction, DuplicateCandidate, DuplicateEntity,
    DuplicateGroup, DuplicateReport, ExchangeKey, RunMode, ServiceMovementKey, TargetBalance,
    TransferKey, adjustment_amount, adjustment_reference, find_duplicate_groups,
};
use cashdesk_shared::AppError;
use cashdesk_shared::types::{CurrencyId, PointId, UserId, exceeds_tolerance, round_money};

use super::balance::{calculate_balance, cutover};
use super::ledger::{NewMovement, SnapshotChange, append_movement, find_snapshot, upsert_snapshot};
use crate::entities::{
    balance_movements, balances, exchanges, external_service_movements, transfers,
};

/// Error types for maintenance jobs.
#[derive(Debug, thiserror::Error)]
pub enum MaintenanceError {
    /// Database error outside any single item.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<MaintenanceError> for AppError {
    fn from(err: MaintenanceError) -> Self {
        match err {
            MaintenanceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Duplicate ids found for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSet {
    /// Entity kind.
    pub entity: DuplicateEntity,
    /// Earliest record of each group.
    pub keep: Vec<Uuid>,
    /// Every other record of each group.
    pub remove: Vec<Uuid>,
}

impl DuplicateSet {
    fn from_groups<K>(entity: DuplicateEntity, groups: Vec<DuplicateGroup<K>>) -> Self {
        let mut set = Self {
            entity,
            keep: Vec::with_capacity(groups.len()),
            remove: Vec::new(),
        };
        for group in groups {
            set.keep.push(group.keep);
            set.remove.extend(group.remove);
        }
        set
    }
}

/// Maintenance repository.
#[derive(Debug, Clone)]
pub struct MaintenanceRepository {
    db: DatabaseConnection,
    operator: UserId,
}

impl MaintenanceRepository {
    /// Creates a maintenance repository. Adjustment movements are recorded
    /// under `operator`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, operator: UserId) -> Self {
        Self { db, operator }
    }

    /// Recalculates every snapshot and corrects those over tolerance.
    pub async fn recalculate_all(&self, mode: RunMode) -> Result<BackfillReport, MaintenanceError> {
        let snapshots = balances::Entity::find()
            .order_by_asc(balances::Column::PointId)
            .order_by_asc(balances::Column::CurrencyId)
            .all(&self.db)
            .await?;

        let mut report = BackfillReport::new(mode);
        for snapshot in snapshots {
            report.scanned += 1;
            let point_id = PointId::from_uuid(snapshot.point_id);
            let currency_id = CurrencyId::from_uuid(snapshot.currency_id);

            match self.recalculate_one(point_id, currency_id, snapshot.amount, mode).await {
                Ok(Some(correction)) => {
                    if mode.is_execute() {
                        report.applied += 1;
                    }
                    report.corrections.push(correction);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(%point_id, %currency_id, error = %e, "Recalculation failed");
                    report.errors.push(format!("{point_id}/{currency_id}: {e}"));
                }
            }
        }

        tracing::info!(
            mode = %mode,
            scanned = report.scanned,
            corrections = report.corrections.len(),
            applied = report.applied,
            errors = report.errors.len(),
            "Recalculation finished"
        );
        Ok(report)
    }

    async fn recalculate_one(
        &self,
        point_id: PointId,
        currency_id: CurrencyId,
        stored: Decimal,
        mode: RunMode,
    ) -> Result<Option<Correction>, DbErr> {
        let calculated = calculate_balance(&self.db, point_id, currency_id).await?;
        let diff = round_money(stored - calculated);
        if !exceeds_tolerance(diff) {
            return Ok(None);
        }

        if mode.is_execute() {
            upsert_snapshot(
                &self.db,
                point_id,
                currency_id,
                SnapshotChange {
                    amount: Some(calculated),
                    ..SnapshotChange::default()
                },
            )
            .await?;
        }

        Ok(Some(Correction {
            point_id,
            currency_id,
            stored,
            calculated,
            diff,
        }))
    }

    /// Brings each pair to a manually counted target balance.
    ///
    /// Writes at most one `AJUSTE` movement per (point, currency, tag) and
    /// rewrites it on re-runs, then sets the snapshot to the target. A pair
    /// already at its target reports no correction.
    pub async fn apply_target_corrections(
        &self,
        targets: &[TargetBalance],
        mode: RunMode,
    ) -> Result<BackfillReport, MaintenanceError> {
        let mut report = BackfillReport::new(mode);

        for target in targets {
            report.scanned += 1;
            match self.apply_target(target, mode).await {
                Ok(Some(correction)) => {
                    if mode.is_execute() {
                        report.applied += 1;
                    }
                    report.corrections.push(correction);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        point_id = %target.point_id,
                        currency_id = %target.currency_id,
                        tag = %target.tag,
                        error = %e,
                        "Target correction failed"
                    );
                    report.errors.push(format!(
                        "{}/{} [{}]: {e}",
                        target.point_id, target.currency_id, target.tag
                    ));
                }
            }
        }

        tracing::info!(
            mode = %mode,
            scanned = report.scanned,
            corrections = report.corrections.len(),
            applied = report.applied,
            "Target corrections finished"
        );
        Ok(report)
    }

    async fn apply_target(
        &self,
        target: &TargetBalance,
        mode: RunMode,
    ) -> Result<Option<Correction>, DbErr> {
        let txn = self.db.begin().await?;
        let point_id = target.point_id;
        let currency_id = target.currency_id;
        let goal = round_money(target.target);
        let reference = adjustment_reference(point_id, currency_id, &target.tag);

        let existing = balance_movements::Entity::find()
            .filter(balance_movements::Column::ReferenceKind.eq(ADJUSTMENT_REFERENCE_KIND))
            .filter(balance_movements::Column::ReferenceId.eq(reference.as_str()))
            .one(&txn)
            .await?;

        // An adjustment older than the cutover no longer counts toward the
        // calculated balance.
        let since = cutover(&txn, point_id, currency_id).await?;
        let counted = existing.as_ref().and_then(|movement| {
            let created: DateTime<Utc> = movement.created_at.with_timezone(&Utc);
            since.is_none_or(|cut| created >= cut).then_some(movement.amount)
        });

        let calculated = calculate_balance(&txn, point_id, currency_id).await?;
        let amount = adjustment_amount(calculated, counted, goal);
        let stored = find_snapshot(&txn, point_id, currency_id)
            .await?
            .map_or(Decimal::ZERO, |snapshot| snapshot.amount);

        let movement_stale = counted.map_or(!amount.is_zero(), |previous| previous != amount);
        let snapshot_stale = stored != goal;
        if !movement_stale && !snapshot_stale {
            return Ok(None);
        }

        let correction = Correction {
            point_id,
            currency_id,
            stored,
            calculated: goal,
            diff: round_money(stored - goal),
        };
        if !mode.is_execute() {
            return Ok(Some(correction));
        }

        let now = Utc::now();
        let balance_before = round_money(calculated - counted.unwrap_or_default());
        let description = cash_description(&target.note.as_deref().map_or_else(
            || format!("Ajuste de conciliación {}", target.tag),
            |note| format!("Ajuste de conciliación {}: {note}", target.tag),
        ));

        if movement_stale {
            match existing {
                Some(movement) => {
                    let keep_instant = counted.is_some();
                    let mut active: balance_movements::ActiveModel = movement.into();
                    active.amount = Set(amount);
                    active.balance_before = Set(balance_before);
                    active.balance_after = Set(goal);
                    active.description = Set(Some(description));
                    if !keep_instant {
                        active.created_at = Set(now.into());
                    }
                    active.update(&txn).await?;
                }
                None => {
                    append_movement(
                        &txn,
                        NewMovement {
                            point_id,
                            currency_id,
                            kind: MovementKind::Adjustment,
                            amount,
                            balance_before,
                            balance_after: goal,
                            description,
                            reference_kind: Some(ADJUSTMENT_REFERENCE_KIND),
                            reference_id: Some(reference),
                            recorded_by: self.operator,
                            created_at: now,
                        },
                    )
                    .await?;
                }
            }
        }

        upsert_snapshot(
            &txn,
            point_id,
            currency_id,
            SnapshotChange {
                amount: Some(goal),
                ..SnapshotChange::default()
            },
        )
        .await?;

        txn.commit().await?;
        tracing::info!(%point_id, %currency_id, %amount, target = %goal, "Adjustment applied");
        Ok(Some(correction))
    }

    /// Finds duplicate exchanges, transfers and guide movements. Read only.
    pub async fn scan_duplicates(&self) -> Result<Vec<DuplicateSet>, MaintenanceError> {
        Ok(vec![
            scan_exchanges(&self.db).await?,
            scan_transfers(&self.db).await?,
            scan_service_movements(&self.db).await?,
        ])
    }

    /// Removes duplicates found by [`Self::scan_duplicates`], keeping the
    /// earliest record of each group.
    ///
    /// Each entity kind is cleaned in its own transaction together with the
    /// ledger movements that reference the removed rows.
    pub async fn remove_duplicates(
        &self,
        mode: RunMode,
    ) -> Result<Vec<DuplicateReport>, MaintenanceError> {
        let sets = self.scan_duplicates().await?;
        let mut reports = Vec::with_capacity(sets.len());

        for set in sets {
            let mut report = DuplicateReport {
                entity: set.entity,
                groups: set.keep.len(),
                duplicates: set.remove.len(),
                removed: 0,
            };

            if mode.is_execute() && !set.remove.is_empty() {
                let txn = self.db.begin().await?;
                let references: Vec<String> = set.remove.iter().map(Uuid::to_string).collect();

                let movements = balance_movements::Entity::delete_many()
                    .filter(balance_movements::Column::ReferenceId.is_in(references))
                    .exec(&txn)
                    .await?;

                let records = match set.entity {
                    DuplicateEntity::Exchange => {
                        exchanges::Entity::delete_many()
                            .filter(exchanges::Column::Id.is_in(set.remove.clone()))
                            .exec(&txn)
                            .await?
                    }
                    DuplicateEntity::Transfer => {
                        transfers::Entity::delete_many()
                            .filter(transfers::Column::Id.is_in(set.remove.clone()))
                            .exec(&txn)
                            .await?
                    }
                    DuplicateEntity::ServiceMovement => {
                        external_service_movements::Entity::delete_many()
                            .filter(external_service_movements::Column::Id.is_in(set.remove.clone()))
                            .exec(&txn)
                            .await?
                    }
                };

                txn.commit().await?;
                report.removed = records.rows_affected + movements.rows_affected;
            }

            tracing::info!(
                entity = %report.entity,
                mode = %mode,
                groups = report.groups,
                duplicates = report.duplicates,
                removed = report.removed,
                "Duplicate pass finished"
            );
            reports.push(report);
        }

        Ok(reports)
    }
}

async fn scan_exchanges<C: ConnectionTrait>(conn: &C) -> Result<DuplicateSet, DbErr> {
    let rows = exchanges::Entity::find()
        .order_by_asc(exchanges::Column::CreatedAt)
        .all(conn)
        .await?;

    let candidates = rows.into_iter().map(|row| {
        let recorded_at = row.created_at.with_timezone(&Utc);
        DuplicateCandidate {
            id: row.id,
            key: ExchangeKey::new(
                PointId::from_uuid(row.point_id),
                CurrencyId::from_uuid(row.origin_currency_id),
                CurrencyId::from_uuid(row.destination_currency_id),
                row.origin_amount,
                row.destination_amount,
                row.operation.as_str(),
                row.receipt_number,
                recorded_at,
            ),
            recorded_at,
        }
    });

    Ok(DuplicateSet::from_groups(
        DuplicateEntity::Exchange,
        find_duplicate_groups(candidates),
    ))
}

async fn scan_transfers<C: ConnectionTrait>(conn: &C) -> Result<DuplicateSet, DbErr> {
    let rows = transfers::Entity::find()
        .order_by_asc(transfers::Column::CreatedAt)
        .all(conn)
        .await?;

    let candidates = rows.into_iter().map(|row| {
        let recorded_at = row.created_at.with_timezone(&Utc);
        DuplicateCandidate {
            id: row.id,
            key: TransferKey::new(
                row.origin_point_id.map(PointId::from_uuid),
                PointId::from_uuid(row.destination_point_id),
                CurrencyId::from_uuid(row.currency_id),
                row.amount,
                row.receipt_number,
                recorded_at,
            ),
            recorded_at,
        }
    });

    Ok(DuplicateSet::from_groups(
        DuplicateEntity::Transfer,
        find_duplicate_groups(candidates),
    ))
}

async fn scan_service_movements<C: ConnectionTrait>(conn: &C) -> Result<DuplicateSet, DbErr> {
    let rows = external_service_movements::Entity::find()
        .order_by_asc(external_service_movements::Column::CreatedAt)
        .all(conn)
        .await?;

    let candidates = rows.into_iter().map(|row| {
        let recorded_at = row.created_at.with_timezone(&Utc);
        DuplicateCandidate {
            id: row.id,
            key: ServiceMovementKey::new(
                PointId::from_uuid(row.point_id),
                row.service,
                row.kind.as_str(),
                row.amount,
                row.guide_reference,
                recorded_at,
            ),
            recorded_at,
        }
    });

    Ok(DuplicateSet::from_groups(
        DuplicateEntity::ServiceMovement,
        find_duplicate_groups(candidates),
    ))
}
