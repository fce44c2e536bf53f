//! Fixed reference rows: the system user and the base currency.
//!
//! These rows are provisioned once by `cashdesk-provisioner` and looked up at
//! startup. Business operations never create them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use cashdesk_shared::AppError;
use cashdesk_shared::config::ReferenceConfig;
use cashdesk_shared::types::{CurrencyId, UserId};

use crate::entities::{
    currencies, users,
    sea_orm_active_enums::{CurrencyBehavior, UserRole},
};

/// Error types for reference data.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// The system user has not been provisioned.
    #[error("System user '{0}' not found, run the provisioner first")]
    SystemUserMissing(String),

    /// The base currency has not been provisioned.
    #[error("Base currency '{0}' not found, run the provisioner first")]
    BaseCurrencyMissing(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReferenceError> for AppError {
    fn from(err: ReferenceError) -> Self {
        match err {
            ReferenceError::SystemUserMissing(_) | ReferenceError::BaseCurrencyMissing(_) => {
                Self::Internal(err.to_string())
            }
            ReferenceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Ids of the fixed reference rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceData {
    /// User recorded on automatic movements.
    pub system_user: UserId,
    /// Currency external services settle in.
    pub base_currency: CurrencyId,
}

impl ReferenceData {
    /// Looks up the reference rows named in the configuration.
    pub async fn load<C: ConnectionTrait>(
        conn: &C,
        config: &ReferenceConfig,
    ) -> Result<Self, ReferenceError> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(config.system_username.as_str()))
            .one(conn)
            .await?
            .ok_or_else(|| ReferenceError::SystemUserMissing(config.system_username.clone()))?;

        let currency = currencies::Entity::find()
            .filter(currencies::Column::Code.eq(config.base_currency_code.as_str()))
            .one(conn)
            .await?
            .ok_or_else(|| ReferenceError::BaseCurrencyMissing(config.base_currency_code.clone()))?;

        Ok(Self {
            system_user: UserId::from_uuid(user.id),
            base_currency: CurrencyId::from_uuid(currency.id),
        })
    }
}

/// What a provisioning run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Resulting reference ids.
    pub data: ReferenceData,
    /// Whether the system user was created by this run.
    pub created_user: bool,
    /// Whether the base currency was created by this run.
    pub created_currency: bool,
}

/// Reference data repository.
#[derive(Debug, Clone)]
pub struct ReferenceRepository {
    db: DatabaseConnection,
}

impl ReferenceRepository {
    /// Creates a new reference repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the reference rows.
    pub async fn load(&self, config: &ReferenceConfig) -> Result<ReferenceData, ReferenceError> {
        ReferenceData::load(&self.db, config).await
    }

    /// Creates the reference rows that do not exist yet. Safe to re-run.
    pub async fn provision(&self, config: &ReferenceConfig) -> Result<ProvisionReport, ReferenceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let existing_user = users::Entity::find()
            .filter(users::Column::Username.eq(config.system_username.as_str()))
            .one(&txn)
            .await?;
        let created_user = existing_user.is_none();
        if created_user {
            users::ActiveModel {
                id: Set(Uuid::now_v7()),
                username: Set(config.system_username.clone()),
                full_name: Set("Sistema".to_string()),
                role: Set(UserRole::Admin),
                point_id: Set(None),
                is_active: Set(true),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await?;
        }

        let existing_currency = currencies::Entity::find()
            .filter(currencies::Column::Code.eq(config.base_currency_code.as_str()))
            .one(&txn)
            .await?;
        let created_currency = existing_currency.is_none();
        if created_currency {
            currencies::ActiveModel {
                id: Set(Uuid::now_v7()),
                code: Set(config.base_currency_code.clone()),
                name: Set(config.base_currency_code.clone()),
                symbol: Set("$".to_string()),
                is_active: Set(true),
                buy_behavior: Set(CurrencyBehavior::Multiply),
                sell_behavior: Set(CurrencyBehavior::Multiply),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await?;
        }

        let data = ReferenceData::load(&txn, config).await?;
        txn.commit().await?;

        tracing::info!(
            system_user = %data.system_user,
            base_currency = %data.base_currency,
            created_user,
            created_currency,
            "Reference rows provisioned"
        );

        Ok(ProvisionReport {
            data,
            created_user,
            created_currency,
        })
    }
}
