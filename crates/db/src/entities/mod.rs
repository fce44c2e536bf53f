//! `SeaORM` entity definitions.

pub mod prelude;

pub mod balance_movements;
pub mod balances;
pub mod cash_count_details;
pub mod cash_counts;
pub mod currencies;
pub mod day_closures;
pub mod exchanges;
pub mod external_service_balances;
pub mod external_service_history;
pub mod external_service_movements;
pub mod initial_balances;
pub mod points;
pub mod sea_orm_active_enums;
pub mod shifts;
pub mod transfers;
pub mod users;
