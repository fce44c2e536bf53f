//! String-backed enums stored in the cashdesk tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a back-office user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UserRole {
    /// Full access.
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    /// Full access, including system configuration.
    #[sea_orm(string_value = "SUPER_USUARIO")]
    SuperUser,
    /// Works the counter of one point.
    #[sea_orm(string_value = "OPERADOR")]
    Operator,
    /// Concessionaire bound to one point.
    #[sea_orm(string_value = "CONCESION")]
    Concession,
    /// Back-office staff.
    #[sea_orm(string_value = "ADMINISTRATIVO")]
    Administrative,
}

impl UserRole {
    /// Roles restricted to the point they are assigned to.
    #[must_use]
    pub const fn is_point_bound(self) -> bool {
        matches!(self, Self::Operator | Self::Concession)
    }
}

/// How an exchange rate is applied for a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum CurrencyBehavior {
    /// Amount times rate.
    #[sea_orm(string_value = "MULTIPLY")]
    Multiply,
    /// Amount divided by rate.
    #[sea_orm(string_value = "DIVIDE")]
    Divide,
}

/// Cash count header status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum CashCountStatus {
    /// Started, nothing saved.
    #[sea_orm(string_value = "OPEN")]
    Open,
    /// Saved at least once, not closed.
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
    /// Closed with the day.
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

/// Day closure status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum DayClosureStatus {
    /// Day in progress.
    #[sea_orm(string_value = "OPEN")]
    Open,
    /// Day closed.
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

/// Operator shift status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum ShiftStatus {
    /// Working.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// On lunch break.
    #[sea_orm(string_value = "LUNCH")]
    Lunch,
    /// Ended normally.
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    /// Voided.
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

/// Direction of a currency exchange from the point's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum ExchangeOperation {
    /// Point buys foreign currency.
    #[sea_orm(string_value = "BUY")]
    Buy,
    /// Point sells foreign currency.
    #[sea_orm(string_value = "SELL")]
    Sell,
}

impl ExchangeOperation {
    /// Stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

/// Exchange status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum ExchangeStatus {
    /// Awaiting completion.
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Completed.
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    /// Cancelled.
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

/// Transfer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum TransferStatus {
    /// Awaiting approval.
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Approved.
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

/// Guide movement direction on an external-service balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum ServiceMovementKind {
    /// Guide paid.
    #[sea_orm(string_value = "INGRESO")]
    Income,
    /// Guide cancelled.
    #[sea_orm(string_value = "EGRESO")]
    Reversal,
}

impl ServiceMovementKind {
    /// Stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INGRESO",
            Self::Reversal => "EGRESO",
        }
    }
}

/// Audit entry kind on an external-service balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
pub enum ServiceHistoryKind {
    /// Credit assigned.
    #[sea_orm(string_value = "ASIGNACION")]
    Credit,
    /// Credit consumed.
    #[sea_orm(string_value = "DEBITO")]
    Debit,
}
