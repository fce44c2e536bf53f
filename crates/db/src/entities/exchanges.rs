//! `SeaORM` Entity for exchanges table.

use super::sea_orm_active_enums::{ExchangeOperation, ExchangeStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exchanges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub point_id: Uuid,
    pub user_id: Uuid,
    pub origin_currency_id: Uuid,
    pub destination_currency_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub origin_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub destination_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 6)))")]
    pub rate: Decimal,
    pub operation: ExchangeOperation,
    pub status: ExchangeStatus,
    pub receipt_number: Option<String>,
    pub created_at: DateTimeWithTimeZone,
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
