//! Batch recalculation, target corrections and duplicate cleanup.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use cashdesk_core::maintenance::{
    ADJUSTMENT_REFERENCE_KIND, DuplicateEntity, RunMode, TargetBalance,
};
use cashdesk_db::entities::{
    balance_movements, balances, exchanges, transfers,
    sea_orm_active_enums::{ExchangeOperation, ExchangeStatus, TransferStatus},
};
use cashdesk_db::{BalanceRepository, MaintenanceRepository};
use cashdesk_shared::types::CurrencyId;

use common::{TestContext, insert_movement, set_snapshot, setup};

async fn stored(ctx: &TestContext, currency: CurrencyId) -> Decimal {
    balances::Entity::find()
        .filter(balances::Column::PointId.eq(ctx.point.into_inner()))
        .filter(balances::Column::CurrencyId.eq(currency.into_inner()))
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap()
        .amount
}

async fn insert_exchange(ctx: &TestContext, amount: Decimal, receipt: &str, at: DateTime<Utc>) -> Uuid {
    let id = Uuid::now_v7();
    exchanges::ActiveModel {
        id: Set(id),
        point_id: Set(ctx.point.into_inner()),
        user_id: Set(ctx.operator.into_inner()),
        origin_currency_id: Set(ctx.usd.into_inner()),
        destination_currency_id: Set(ctx.eur.into_inner()),
        origin_amount: Set(amount),
        destination_amount: Set(amount / dec!(2)),
        rate: Set(dec!(0.5)),
        operation: Set(ExchangeOperation::Sell),
        status: Set(ExchangeStatus::Completed),
        receipt_number: Set(Some(receipt.to_string())),
        created_at: Set(at.into()),
    }
    .insert(&ctx.db)
    .await
    .unwrap();
    id
}

async fn insert_transfer(ctx: &TestContext, amount: Decimal, at: DateTime<Utc>) -> Uuid {
    let id = Uuid::now_v7();
    transfers::ActiveModel {
        id: Set(id),
        origin_point_id: Set(None),
        destination_point_id: Set(ctx.point.into_inner()),
        currency_id: Set(ctx.usd.into_inner()),
        amount: Set(amount),
        status: Set(TransferStatus::Approved),
        receipt_number: Set(None),
        created_at: Set(at.into()),
    }
    .insert(&ctx.db)
    .await
    .unwrap();
    id
}

#[tokio::test]
async fn test_recalculate_dry_run_then_execute() {
    let ctx = setup().await;
    let t0 = Utc::now().trunc_subsecs(0) - Duration::hours(1);
    insert_movement(&ctx.db, ctx.point, ctx.usd, "INGRESO", dec!(100), None, t0).await;
    insert_movement(&ctx.db, ctx.point, ctx.eur, "INGRESO", dec!(40), None, t0).await;
    set_snapshot(&ctx.db, ctx.point, ctx.usd, dec!(100)).await;
    set_snapshot(&ctx.db, ctx.point, ctx.eur, dec!(30)).await;

    let repo = MaintenanceRepository::new(ctx.db.clone(), ctx.reference.system_user);

    let dry = repo.recalculate_all(RunMode::DryRun).await.unwrap();
    assert_eq!(dry.scanned, 2);
    assert_eq!(dry.corrections.len(), 1);
    assert_eq!(dry.corrections[0].currency_id, ctx.eur);
    assert_eq!(dry.corrections[0].diff, dec!(-10));
    assert_eq!(dry.applied, 0);
    assert_eq!(stored(&ctx, ctx.eur).await, dec!(30));

    let executed = repo.recalculate_all(RunMode::Execute).await.unwrap();
    assert_eq!(executed.applied, 1);
    assert!(executed.errors.is_empty());
    assert_eq!(stored(&ctx, ctx.eur).await, dec!(40));

    let again = repo.recalculate_all(RunMode::Execute).await.unwrap();
    assert!(again.corrections.is_empty());
}

#[tokio::test]
async fn test_target_corrections_are_idempotent() {
    let ctx = setup().await;
    let t0 = Utc::now().trunc_subsecs(0) - Duration::hours(1);
    insert_movement(&ctx.db, ctx.point, ctx.usd, "INGRESO", dec!(100), None, t0).await;
    set_snapshot(&ctx.db, ctx.point, ctx.usd, dec!(100)).await;

    let repo = MaintenanceRepository::new(ctx.db.clone(), ctx.reference.system_user);
    let balances_repo = BalanceRepository::new(ctx.db.clone());
    let target = |amount: Decimal| TargetBalance {
        point_id: ctx.point,
        currency_id: ctx.usd,
        target: amount,
        tag: "arqueo-marzo".to_string(),
        note: Some("Conteo físico".to_string()),
    };
    let adjustments = || {
        balance_movements::Entity::find()
            .filter(balance_movements::Column::ReferenceKind.eq(ADJUSTMENT_REFERENCE_KIND))
            .all(&ctx.db)
    };

    let dry = repo
        .apply_target_corrections(&[target(dec!(120))], RunMode::DryRun)
        .await
        .unwrap();
    assert_eq!(dry.corrections.len(), 1);
    assert!(adjustments().await.unwrap().is_empty());

    let first = repo
        .apply_target_corrections(&[target(dec!(120))], RunMode::Execute)
        .await
        .unwrap();
    assert_eq!(first.applied, 1);
    let rows = adjustments().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, "AJUSTE");
    assert_eq!(rows[0].amount, dec!(20));
    assert_eq!(stored(&ctx, ctx.usd).await, dec!(120));
    assert_eq!(balances_repo.calculate(ctx.point, ctx.usd).await.unwrap(), dec!(120));

    let rerun = repo
        .apply_target_corrections(&[target(dec!(120))], RunMode::Execute)
        .await
        .unwrap();
    assert!(rerun.corrections.is_empty());
    assert_eq!(adjustments().await.unwrap().len(), 1);

    // Same tag with a new target rewrites the movement in place.
    repo.apply_target_corrections(&[target(dec!(110))], RunMode::Execute)
        .await
        .unwrap();
    let rows = adjustments().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, dec!(10));
    assert_eq!(balances_repo.calculate(ctx.point, ctx.usd).await.unwrap(), dec!(110));
    assert_eq!(stored(&ctx, ctx.usd).await, dec!(110));
}

#[tokio::test]
async fn test_target_note_naming_a_bank_still_counts_as_cash() {
    let ctx = setup().await;
    let t0 = Utc::now().trunc_subsecs(0) - Duration::hours(1);
    insert_movement(&ctx.db, ctx.point, ctx.usd, "INGRESO", dec!(100), None, t0).await;
    set_snapshot(&ctx.db, ctx.point, ctx.usd, dec!(100)).await;

    let repo = MaintenanceRepository::new(ctx.db.clone(), ctx.reference.system_user);
    let report = repo
        .apply_target_corrections(
            &[TargetBalance {
                point_id: ctx.point,
                currency_id: ctx.usd,
                target: dec!(120),
                tag: "arqueo-abril".to_string(),
                note: Some("Cotejado con estado del Banco Pichincha".to_string()),
            }],
            RunMode::Execute,
        )
        .await
        .unwrap();
    assert_eq!(report.applied, 1);

    let balance = BalanceRepository::new(ctx.db.clone())
        .calculate(ctx.point, ctx.usd)
        .await
        .unwrap();
    assert_eq!(balance, dec!(120));

    let rerun = repo.recalculate_all(RunMode::DryRun).await.unwrap();
    assert!(rerun.corrections.is_empty());
}

#[tokio::test]
async fn test_target_errors_do_not_stop_the_batch() {
    let ctx = setup().await;
    let repo = MaintenanceRepository::new(ctx.db.clone(), ctx.reference.system_user);

    let report = repo
        .apply_target_corrections(
            &[
                TargetBalance {
                    point_id: ctx.point,
                    currency_id: CurrencyId::new(),
                    target: dec!(5),
                    tag: "huerfano".to_string(),
                    note: None,
                },
                TargetBalance {
                    point_id: ctx.point,
                    currency_id: ctx.eur,
                    target: dec!(5),
                    tag: "ok".to_string(),
                    note: None,
                },
            ],
            RunMode::Execute,
        )
        .await
        .unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.applied, 1);
    assert_eq!(stored(&ctx, ctx.eur).await, dec!(5));
}

#[tokio::test]
async fn test_duplicates_are_reported_then_removed() {
    let ctx = setup().await;
    let base = Utc::now().trunc_subsecs(0) - Duration::hours(1);

    let kept = insert_exchange(&ctx, dec!(100), "CAM-7", base).await;
    let dup_a = insert_exchange(&ctx, dec!(100), "CAM-7", base + Duration::milliseconds(250)).await;
    let dup_b = insert_exchange(&ctx, dec!(100.00), "CAM-7", base + Duration::milliseconds(500)).await;
    let distinct = insert_exchange(&ctx, dec!(100), "CAM-8", base).await;

    insert_transfer(&ctx, dec!(30), base).await;
    insert_transfer(&ctx, dec!(30), base).await;

    let movement = insert_movement(&ctx.db, ctx.point, ctx.usd, "CAMBIO_DIVISA", dec!(100), None, base).await;
    let mut active: balance_movements::ActiveModel = balance_movements::Entity::find_by_id(movement)
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap()
        .into();
    active.reference_kind = Set(Some("EXCHANGE".to_string()));
    active.reference_id = Set(Some(dup_a.to_string()));
    active.update(&ctx.db).await.unwrap();

    let repo = MaintenanceRepository::new(ctx.db.clone(), ctx.reference.system_user);

    let sets = repo.scan_duplicates().await.unwrap();
    let exchange_set = sets.iter().find(|s| s.entity == DuplicateEntity::Exchange).unwrap();
    assert_eq!(exchange_set.keep, vec![kept]);
    let mut removed = exchange_set.remove.clone();
    removed.sort();
    let mut expected = vec![dup_a, dup_b];
    expected.sort();
    assert_eq!(removed, expected);

    let dry = repo.remove_duplicates(RunMode::DryRun).await.unwrap();
    assert!(dry.iter().all(|r| r.removed == 0));
    assert_eq!(exchanges::Entity::find().count(&ctx.db).await.unwrap(), 4);

    let executed = repo.remove_duplicates(RunMode::Execute).await.unwrap();
    let exchange_report = executed.iter().find(|r| r.entity == DuplicateEntity::Exchange).unwrap();
    assert_eq!(exchange_report.groups, 1);
    assert_eq!(exchange_report.duplicates, 2);
    assert_eq!(exchange_report.removed, 3);
    let transfer_report = executed.iter().find(|r| r.entity == DuplicateEntity::Transfer).unwrap();
    assert_eq!(transfer_report.removed, 1);

    let remaining: Vec<Uuid> = exchanges::Entity::find()
        .all(&ctx.db)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.id)
        .collect();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.contains(&kept));
    assert!(remaining.contains(&distinct));
    assert!(balance_movements::Entity::find_by_id(movement).one(&ctx.db).await.unwrap().is_none());
    assert_eq!(transfers::Entity::find().count(&ctx.db).await.unwrap(), 1);
}
