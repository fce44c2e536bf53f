//! Daily closing against a real schema: preconditions, persistence,
//! rollback on failure and racing closings.

#![allow(clippy::unwrap_used)]
#![allow(clippy::too_many_lines)]

mod common;

use chrono::{Duration, NaiveDate, SubsecRound, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use cashdesk_core::closing::{ClosingDetailInput, ClosingRejection, DayActivity, DayState};
use cashdesk_db::{ClosingRepository, ExternalServiceLedger};
use cashdesk_db::entities::{
    balances, cash_count_details, cash_counts, day_closures, exchanges, shifts, transfers,
    sea_orm_active_enums::{
        CashCountStatus, ExchangeOperation, ExchangeStatus, ShiftStatus, TransferStatus, UserRole,
    },
};
use cashdesk_db::repositories::{
    CashCountInput, ClosingError, ClosingResult, ClosureValidation, GuideMovementInput, PartialCountResult,
};
use cashdesk_shared::AppError;
use cashdesk_shared::config::OpeningFallback;
use cashdesk_shared::time::{business_date, day_range_for};
use cashdesk_shared::types::{CurrencyId, PointId, UserId};

use common::{
    TestContext, insert_initial_balance, insert_movement, insert_point, insert_user, open_shift,
    set_snapshot, setup,
};

fn today() -> NaiveDate {
    business_date(Utc::now())
}

fn detail(currency_id: CurrencyId, theoretical: Decimal, physical: Decimal) -> ClosingDetailInput {
    ClosingDetailInput {
        currency_id,
        opening_balance: dec!(100),
        theoretical_closing: theoretical,
        physical_count: physical,
        cash_notes: physical,
        cash_coins: Decimal::ZERO,
        income: dec!(50),
        expense: Decimal::ZERO,
        movement_count: 1,
        justification: None,
    }
}

fn count_input(ctx: &TestContext, details: Vec<ClosingDetailInput>) -> CashCountInput {
    CashCountInput {
        point_id: ctx.point,
        user_id: ctx.operator,
        day: today(),
        details,
        activity: DayActivity::default(),
        notes: None,
    }
}

async fn snapshot_amount(ctx: &TestContext, currency: CurrencyId) -> Option<Decimal> {
    balances::Entity::find()
        .filter(balances::Column::PointId.eq(ctx.point.into_inner()))
        .filter(balances::Column::CurrencyId.eq(currency.into_inner()))
        .one(&ctx.db)
        .await
        .unwrap()
        .map(|row| row.amount)
}

#[tokio::test]
async fn test_close_day_with_discrepancy() {
    let ctx = setup().await;
    let t0 = Utc::now().trunc_subsecs(0) - Duration::minutes(30);
    insert_initial_balance(&ctx.db, ctx.point, ctx.usd, dec!(100), t0, ctx.operator).await;
    insert_movement(&ctx.db, ctx.point, ctx.usd, "INGRESO", dec!(50), None, t0 + Duration::minutes(1)).await;
    set_snapshot(&ctx.db, ctx.point, ctx.usd, dec!(150)).await;
    let shift_id = open_shift(&ctx.db, ctx.operator, ctx.point).await;

    let repo = ClosingRepository::new(ctx.db.clone());
    let mut line = detail(ctx.usd, dec!(150), dec!(148.5));
    line.cash_notes = dec!(148);
    line.cash_coins = dec!(0.5);
    line.justification = Some("Billete falso retenido".to_string());

    let ClosingResult::Closed(receipt) = repo.perform_closing(count_input(&ctx, vec![line])).await.unwrap()
    else {
        panic!("closing was rejected");
    };

    assert!(receipt.shift_ended);
    assert_eq!(receipt.discrepancies.len(), 1);
    assert_eq!(receipt.discrepancies[0].difference, dec!(-1.5));

    let details = cash_count_details::Entity::find()
        .filter(cash_count_details::Column::CashCountId.eq(receipt.cash_count_id.into_inner()))
        .all(&ctx.db)
        .await
        .unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].difference, dec!(-1.5));

    let header = cash_counts::Entity::find_by_id(receipt.cash_count_id.into_inner())
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.status, CashCountStatus::Closed);
    assert!(header.closed_at.is_some());

    let closure = day_closures::Entity::find_by_id(receipt.day_closure_id.into_inner())
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();
    let reported = closure.reported_differences.as_array().unwrap();
    assert_eq!(reported.len(), 1);

    let shift = shifts::Entity::find_by_id(shift_id).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(shift.status, ShiftStatus::Completed);
    assert!(shift.ended_at.is_some());
    assert!(shift.notes.unwrap().contains("cierre diario"));

    let snapshot = balances::Entity::find()
        .filter(balances::Column::PointId.eq(ctx.point.into_inner()))
        .filter(balances::Column::CurrencyId.eq(ctx.usd.into_inner()))
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.amount, dec!(148.5));
    assert_eq!(snapshot.cash_notes, dec!(148));
    assert_eq!(snapshot.cash_coins, dec!(0.5));

    let status = repo.get_closure_status(ctx.point, today()).await.unwrap();
    assert_eq!(status.state, DayState::Closed);
    assert_eq!(status.closed_by, Some(ctx.operator));
    assert_eq!(status.closed_by_name.as_deref(), Some("Usuario operador1"));
    assert_eq!(status.counted_by_name.as_deref(), Some("Usuario operador1"));
    assert_eq!(status.cash_count_status, Some(CashCountStatus::Closed));
    assert_eq!(status.discrepancies, receipt.discrepancies);
}

#[tokio::test]
async fn test_second_closing_is_rejected() {
    let ctx = setup().await;
    let repo = ClosingRepository::new(ctx.db.clone());

    let first = repo
        .perform_closing(count_input(&ctx, vec![detail(ctx.usd, dec!(10), dec!(10))]))
        .await
        .unwrap();
    assert!(matches!(first, ClosingResult::Closed(_)));

    let second = repo
        .perform_closing(count_input(&ctx, vec![detail(ctx.usd, dec!(10), dec!(12))]))
        .await
        .unwrap();
    let ClosingResult::Rejected(rejection) = second else {
        panic!("second closing succeeded");
    };
    assert_eq!(rejection.code(), "ALREADY_CLOSED");

    // The rejected attempt wrote nothing.
    assert_eq!(snapshot_amount(&ctx, ctx.usd).await, Some(dec!(10)));
}

#[tokio::test]
async fn test_racing_closings_produce_one_closure() {
    let ctx = setup().await;
    let repo = ClosingRepository::new(ctx.db.clone());
    let input = count_input(&ctx, vec![detail(ctx.usd, dec!(20), dec!(20))]);

    let (a, b) = tokio::join!(repo.perform_closing(input.clone()), repo.perform_closing(input));
    let results = [a.unwrap(), b.unwrap()];

    let closed = results.iter().filter(|r| matches!(r, ClosingResult::Closed(_))).count();
    let rejected = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                ClosingResult::Rejected(ClosingRejection::AlreadyClosed { .. })
            )
        })
        .count();
    assert_eq!((closed, rejected), (1, 1));

    let closures = day_closures::Entity::find()
        .filter(day_closures::Column::PointId.eq(ctx.point.into_inner()))
        .count(&ctx.db)
        .await
        .unwrap();
    assert_eq!(closures, 1);
    assert_eq!(cash_count_details::Entity::find().count(&ctx.db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_failure_at_shift_step_rolls_everything_back() {
    let ctx = setup().await;
    set_snapshot(&ctx.db, ctx.point, ctx.usd, dec!(75)).await;
    ctx.db.execute_unprepared("DROP TABLE shifts").await.unwrap();

    let repo = ClosingRepository::new(ctx.db.clone());
    let result = repo
        .perform_closing(count_input(&ctx, vec![detail(ctx.usd, dec!(75), dec!(70))]))
        .await;
    assert!(result.is_err());

    assert_eq!(cash_counts::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(cash_count_details::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(day_closures::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(snapshot_amount(&ctx, ctx.usd).await, Some(dec!(75)));
}

#[tokio::test]
async fn test_duplicate_currency_lines_are_refused() {
    let ctx = setup().await;
    let repo = ClosingRepository::new(ctx.db.clone());

    let result = repo
        .perform_closing(count_input(
            &ctx,
            vec![detail(ctx.usd, dec!(1), dec!(1)), detail(ctx.usd, dec!(2), dec!(2))],
        ))
        .await;
    assert!(result.is_err());
    assert_eq!(day_closures::Entity::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_overflowing_count_totals_are_refused() {
    let ctx = setup().await;
    let repo = ClosingRepository::new(ctx.db.clone());

    let mut usd = detail(ctx.usd, dec!(1), dec!(1));
    usd.income = Decimal::MAX;
    let mut eur = detail(ctx.eur, dec!(1), dec!(1));
    eur.income = Decimal::MAX;

    let err = repo
        .save_partial_count(count_input(&ctx, vec![usd.clone(), eur.clone()]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClosingError::Overflow(_)));
    assert_eq!(AppError::from(err).status_code(), 400);

    let err = repo.perform_closing(count_input(&ctx, vec![usd, eur])).await.unwrap_err();
    assert!(matches!(err, ClosingError::Overflow(_)));

    assert_eq!(cash_counts::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(day_closures::Entity::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_validation_rules() {
    let ctx = setup().await;
    let repo = ClosingRepository::new(ctx.db.clone());
    let day = today();

    assert_eq!(
        repo.validate_closure_possible(ctx.point, day, ctx.operator).await.unwrap(),
        ClosureValidation::Allowed
    );

    // Admins may close any point.
    let other_point = insert_point(&ctx.db, "Sucursal Norte", true).await;
    assert_eq!(
        repo.validate_closure_possible(other_point, day, ctx.reference.system_user)
            .await
            .unwrap(),
        ClosureValidation::Allowed
    );

    let reject_code = |validation: ClosureValidation| match validation {
        ClosureValidation::Rejected(rejection) => rejection.code(),
        ClosureValidation::Allowed => "ALLOWED",
    };

    assert_eq!(
        reject_code(repo.validate_closure_possible(other_point, day, ctx.operator).await.unwrap()),
        "NO_PERMISSION"
    );

    let inactive_point = insert_point(&ctx.db, "Cerrado", false).await;
    assert_eq!(
        reject_code(
            repo.validate_closure_possible(inactive_point, day, ctx.operator)
                .await
                .unwrap()
        ),
        "POINT_INACTIVE"
    );
    assert_eq!(
        reject_code(
            repo.validate_closure_possible(PointId::new(), day, ctx.operator)
                .await
                .unwrap()
        ),
        "POINT_NOT_FOUND"
    );

    let inactive_user = insert_user(&ctx.db, "baja", UserRole::Operator, Some(ctx.point), false).await;
    assert_eq!(
        reject_code(
            repo.validate_closure_possible(ctx.point, day, inactive_user)
                .await
                .unwrap()
        ),
        "USER_NOT_FOUND"
    );
    assert_eq!(
        reject_code(
            repo.validate_closure_possible(ctx.point, day, UserId::new())
                .await
                .unwrap()
        ),
        "USER_NOT_FOUND"
    );

    let unassigned = insert_user(&ctx.db, "concesion", UserRole::Concession, None, true).await;
    assert_eq!(
        reject_code(
            repo.validate_closure_possible(ctx.point, day, unassigned)
                .await
                .unwrap()
        ),
        "NO_PERMISSION"
    );
}

#[tokio::test]
async fn test_partial_saves_reuse_the_header() {
    let ctx = setup().await;
    let repo = ClosingRepository::new(ctx.db.clone());

    let PartialCountResult::Saved(first) = repo
        .save_partial_count(count_input(
            &ctx,
            vec![detail(ctx.usd, dec!(10), dec!(10)), detail(ctx.eur, dec!(5), dec!(5))],
        ))
        .await
        .unwrap()
    else {
        panic!("partial save rejected");
    };

    let PartialCountResult::Saved(second) = repo
        .save_partial_count(count_input(&ctx, vec![detail(ctx.usd, dec!(10), dec!(9.5))]))
        .await
        .unwrap()
    else {
        panic!("partial save rejected");
    };
    assert_eq!(first, second);

    let header = cash_counts::Entity::find_by_id(first.into_inner())
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.status, CashCountStatus::Partial);
    assert_eq!(cash_count_details::Entity::find().count(&ctx.db).await.unwrap(), 1);

    let summary = repo.summarize_day(ctx.point, today(), ctx.operator).await.unwrap();
    assert_eq!(summary.open_cash_count, Some(first));

    let ClosingResult::Closed(receipt) = repo
        .perform_closing(count_input(&ctx, vec![detail(ctx.usd, dec!(10), dec!(10))]))
        .await
        .unwrap()
    else {
        panic!("closing rejected");
    };
    assert_eq!(receipt.cash_count_id, first);
    assert!(!receipt.shift_ended);
    assert!(receipt.discrepancies.is_empty());

    let after_close = repo
        .save_partial_count(count_input(&ctx, vec![detail(ctx.usd, dec!(10), dec!(10))]))
        .await
        .unwrap();
    assert!(matches!(
        after_close,
        PartialCountResult::Rejected(ClosingRejection::AlreadyClosed { .. })
    ));
}

#[tokio::test]
async fn test_opening_balance_sources() {
    let ctx = setup().await;
    let day = today();
    let start = day_range_for(day).gte;

    // No earlier count: snapshot, or the ledger when configured.
    set_snapshot(&ctx.db, ctx.point, ctx.usd, dec!(42)).await;
    insert_movement(&ctx.db, ctx.point, ctx.usd, "INGRESO", dec!(60), None, start - Duration::hours(2)).await;

    let snapshot_repo = ClosingRepository::new(ctx.db.clone());
    assert_eq!(
        snapshot_repo.compute_opening_balance(ctx.point, ctx.usd, start).await.unwrap(),
        dec!(42)
    );
    assert_eq!(
        snapshot_repo.compute_opening_balance(ctx.point, ctx.eur, start).await.unwrap(),
        Decimal::ZERO
    );

    let ledger_repo =
        ClosingRepository::new(ctx.db.clone()).with_opening_fallback(OpeningFallback::Ledger);
    assert_eq!(
        ledger_repo.compute_opening_balance(ctx.point, ctx.usd, start).await.unwrap(),
        dec!(60)
    );

    // A count from the previous day wins.
    let header_id = Uuid::now_v7();
    let yesterday = start - Duration::hours(3);
    cash_counts::ActiveModel {
        id: Set(header_id),
        point_id: Set(ctx.point.into_inner()),
        user_id: Set(ctx.operator.into_inner()),
        business_day: Set(business_date(yesterday)),
        status: Set(CashCountStatus::Closed),
        total_exchanges: Set(0),
        transfers_in: Set(0),
        transfers_out: Set(0),
        total_income: Set(Decimal::ZERO),
        total_expense: Set(Decimal::ZERO),
        notes: Set(None),
        created_at: Set(yesterday.into()),
        closed_at: Set(Some(yesterday.into())),
    }
    .insert(&ctx.db)
    .await
    .unwrap();
    cash_count_details::ActiveModel {
        id: Set(Uuid::now_v7()),
        cash_count_id: Set(header_id),
        currency_id: Set(ctx.usd.into_inner()),
        opening_balance: Set(Decimal::ZERO),
        theoretical_closing: Set(dec!(60)),
        physical_count: Set(dec!(59.5)),
        cash_notes: Set(dec!(59.5)),
        cash_coins: Set(Decimal::ZERO),
        difference: Set(dec!(-0.5)),
        income: Set(Decimal::ZERO),
        expense: Set(Decimal::ZERO),
        movement_count: Set(0),
        justification: Set(None),
    }
    .insert(&ctx.db)
    .await
    .unwrap();

    assert_eq!(
        ledger_repo.compute_opening_balance(ctx.point, ctx.usd, start).await.unwrap(),
        dec!(59.5)
    );
    // The count has no EUR line.
    assert_eq!(
        snapshot_repo.compute_opening_balance(ctx.point, ctx.eur, start).await.unwrap(),
        Decimal::ZERO
    );
}

#[tokio::test]
async fn test_summarize_day_collects_touched_currencies() {
    let ctx = setup().await;
    let now = Utc::now();
    let other_point = insert_point(&ctx.db, "Sucursal Sur", true).await;
    set_snapshot(&ctx.db, ctx.point, ctx.usd, dec!(100)).await;

    exchanges::ActiveModel {
        id: Set(Uuid::now_v7()),
        point_id: Set(ctx.point.into_inner()),
        user_id: Set(ctx.operator.into_inner()),
        origin_currency_id: Set(ctx.usd.into_inner()),
        destination_currency_id: Set(ctx.eur.into_inner()),
        origin_amount: Set(dec!(100)),
        destination_amount: Set(dec!(50)),
        rate: Set(dec!(0.5)),
        operation: Set(ExchangeOperation::Sell),
        status: Set(ExchangeStatus::Completed),
        receipt_number: Set(Some("CAM-1".to_string())),
        created_at: Set(now.into()),
    }
    .insert(&ctx.db)
    .await
    .unwrap();

    for (origin, destination) in [(Some(other_point), ctx.point), (Some(ctx.point), other_point)] {
        transfers::ActiveModel {
            id: Set(Uuid::now_v7()),
            origin_point_id: Set(origin.map(PointId::into_inner)),
            destination_point_id: Set(destination.into_inner()),
            currency_id: Set(ctx.eur.into_inner()),
            amount: Set(dec!(25)),
            status: Set(TransferStatus::Approved),
            receipt_number: Set(None),
            created_at: Set(now.into()),
        }
        .insert(&ctx.db)
        .await
        .unwrap();
    }

    insert_movement(&ctx.db, ctx.point, ctx.usd, "CAMBIO_DIVISA", dec!(100), Some("Ingreso por cambio"), now).await;
    insert_movement(&ctx.db, ctx.point, ctx.usd, "EGRESO", dec!(-20), None, now).await;

    let repo = ClosingRepository::new(ctx.db.clone());
    let summary = repo.summarize_day(ctx.point, today(), ctx.operator).await.unwrap();

    let codes: Vec<_> = summary.currencies.iter().map(|line| line.currency_code.as_str()).collect();
    assert_eq!(codes, vec!["EUR", "USD"]);
    assert_eq!(summary.activity.exchanges, 1);
    assert_eq!(summary.activity.transfers_in, 1);
    assert_eq!(summary.activity.transfers_out, 1);
    assert_eq!(summary.open_cash_count, None);

    let usd = &summary.currencies[1];
    assert_eq!(usd.opening_balance, dec!(100));
    assert_eq!(usd.theoretical_closing, dec!(80));
    assert_eq!(usd.totals.income, dec!(100));
    assert_eq!(usd.totals.expense, dec!(20));
    assert_eq!(usd.totals.count, 2);
}

#[tokio::test]
async fn test_summarize_day_with_only_guide_movements() {
    let ctx = setup().await;
    ExternalServiceLedger::new(ctx.db.clone(), ctx.reference)
        .record_income(GuideMovementInput::servientrega(ctx.point, dec!(25), "GUIA-1"))
        .await
        .unwrap();

    let summary = ClosingRepository::new(ctx.db.clone())
        .summarize_day(ctx.point, today(), ctx.operator)
        .await
        .unwrap();

    assert_eq!(summary.activity.external_operations, 1);
    assert_eq!(summary.currencies.len(), 1);
    let line = &summary.currencies[0];
    assert_eq!(line.currency_id, ctx.usd);
    assert_eq!(line.theoretical_closing, dec!(25));
    assert_eq!(line.totals.income, dec!(25));
    assert_eq!(line.totals.count, 1);
}
