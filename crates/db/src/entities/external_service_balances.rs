//! `SeaORM` Entity for external_service_balances table.
//!
//! One row per (point, service). `total_assigned - total_used` is the credit
//! still available; the cash columns track guide collections.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "external_service_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub point_id: Uuid,
    pub service: String,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_assigned: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_used: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub cash_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub cash_notes: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub cash_coins: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub bank: Decimal,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::points::Entity",
        from = "Column::PointId",
        to = "super::points::Column::Id"
    )]
    Points,
}

impl Related<super::points::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Points.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
