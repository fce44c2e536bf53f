//! Shared fixtures for repository tests.
//!
//! Each test gets its own in-memory SQLite database with the full schema and
//! the reference rows provisioned.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

use cashdesk_db::ReferenceRepository;
use cashdesk_db::entities::{
    balance_movements, balances, currencies, initial_balances, points, shifts, users,
    sea_orm_active_enums::{CurrencyBehavior, ShiftStatus, UserRole},
};
use cashdesk_db::migration::{Migrator, MigratorTrait};
use cashdesk_db::repositories::ReferenceData;
use cashdesk_shared::config::ReferenceConfig;
use cashdesk_shared::types::{CurrencyId, PointId, UserId};

pub struct TestContext {
    pub db: DatabaseConnection,
    pub reference: ReferenceData,
    pub point: PointId,
    pub usd: CurrencyId,
    pub eur: CurrencyId,
    pub operator: UserId,
}

pub async fn setup() -> TestContext {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let reference = ReferenceRepository::new(db.clone())
        .provision(&ReferenceConfig::default())
        .await
        .unwrap()
        .data;

    let point = insert_point(&db, "Matriz", true).await;
    let eur = insert_currency(&db, "EUR").await;
    let operator = insert_user(&db, "operador1", UserRole::Operator, Some(point), true).await;

    TestContext {
        db,
        reference,
        point,
        usd: reference.base_currency,
        eur,
        operator,
    }
}

pub async fn insert_point(db: &DatabaseConnection, name: &str, is_active: bool) -> PointId {
    let id = Uuid::now_v7();
    points::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        is_active: Set(is_active),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap();
    PointId::from_uuid(id)
}

pub async fn insert_currency(db: &DatabaseConnection, code: &str) -> CurrencyId {
    let id = Uuid::now_v7();
    currencies::ActiveModel {
        id: Set(id),
        code: Set(code.to_string()),
        name: Set(code.to_string()),
        symbol: Set(code.to_string()),
        is_active: Set(true),
        buy_behavior: Set(CurrencyBehavior::Multiply),
        sell_behavior: Set(CurrencyBehavior::Divide),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap();
    CurrencyId::from_uuid(id)
}

pub async fn insert_user(
    db: &DatabaseConnection,
    username: &str,
    role: UserRole,
    point: Option<PointId>,
    is_active: bool,
) -> UserId {
    let id = Uuid::now_v7();
    users::ActiveModel {
        id: Set(id),
        username: Set(username.to_string()),
        full_name: Set(format!("Usuario {username}")),
        role: Set(role),
        point_id: Set(point.map(PointId::into_inner)),
        is_active: Set(is_active),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap();
    UserId::from_uuid(id)
}

pub async fn insert_initial_balance(
    db: &DatabaseConnection,
    point: PointId,
    currency: CurrencyId,
    amount: Decimal,
    assigned_at: DateTime<Utc>,
    assigned_by: UserId,
) {
    initial_balances::ActiveModel {
        id: Set(Uuid::now_v7()),
        point_id: Set(point.into_inner()),
        currency_id: Set(currency.into_inner()),
        amount: Set(amount),
        assigned_at: Set(assigned_at.into()),
        assigned_by: Set(assigned_by.into_inner()),
        is_active: Set(true),
        notes: Set(None),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn insert_movement(
    db: &DatabaseConnection,
    point: PointId,
    currency: CurrencyId,
    kind: &str,
    amount: Decimal,
    description: Option<&str>,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::now_v7();
    balance_movements::ActiveModel {
        id: Set(id),
        point_id: Set(point.into_inner()),
        currency_id: Set(currency.into_inner()),
        kind: Set(kind.to_string()),
        amount: Set(amount),
        balance_before: Set(Decimal::ZERO),
        balance_after: Set(Decimal::ZERO),
        description: Set(description.map(String::from)),
        reference_kind: Set(None),
        reference_id: Set(None),
        recorded_by: Set(Uuid::nil()),
        created_at: Set(created_at.into()),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub async fn set_snapshot(db: &DatabaseConnection, point: PointId, currency: CurrencyId, amount: Decimal) {
    balances::ActiveModel {
        id: Set(Uuid::now_v7()),
        point_id: Set(point.into_inner()),
        currency_id: Set(currency.into_inner()),
        amount: Set(amount),
        cash_notes: Set(amount),
        cash_coins: Set(Decimal::ZERO),
        bank: Set(Decimal::ZERO),
        updated_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn open_shift(db: &DatabaseConnection, user: UserId, point: PointId) -> Uuid {
    let id = Uuid::now_v7();
    shifts::ActiveModel {
        id: Set(id),
        user_id: Set(user.into_inner()),
        point_id: Set(point.into_inner()),
        status: Set(ShiftStatus::Active),
        started_at: Set(Utc::now().into()),
        ended_at: Set(None),
        notes: Set(None),
    }
    .insert(db)
    .await
    .unwrap();
    id
}
