//! `SeaORM` Entity for cash_counts table.

use super::sea_orm_active_enums::CashCountStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_counts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub point_id: Uuid,
    pub user_id: Uuid,
    pub business_day: Date,
    pub status: CashCountStatus,
    pub total_exchanges: i64,
    pub transfers_in: i64,
    pub transfers_out: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_income: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_expense: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub closed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cash_count_details::Entity")]
    CashCountDetails,
    #[sea_orm(
        belongs_to = "super::points::Entity",
        from = "Column::PointId",
        to = "super::points::Column::Id"
    )]
    Points,
}

impl Related<super::cash_count_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashCountDetails.def()
    }
}

impl Related<super::points::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Points.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
