//! `SeaORM` Entity for cash_count_details table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_count_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cash_count_id: Uuid,
    pub currency_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub opening_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub theoretical_closing: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub physical_count: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub cash_notes: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub cash_coins: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub difference: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub income: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub expense: Decimal,
    pub movement_count: i32,
    pub justification: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cash_counts::Entity",
        from = "Column::CashCountId",
        to = "super::cash_counts::Column::Id",
        on_delete = "Cascade"
    )]
    CashCounts,
}

impl Related<super::cash_counts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashCounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
