//! Entity prelude.

pub use super::balance_movements::Entity as BalanceMovements;
pub use super::balances::Entity as Balances;
pub use super::cash_count_details::Entity as CashCountDetails;
pub use super::cash_counts::Entity as CashCounts;
pub use super::currencies::Entity as Currencies;
pub use super::day_closures::Entity as DayClosures;
pub use super::exchanges::Entity as Exchanges;
pub use super::external_service_balances::Entity as ExternalServiceBalances;
pub use super::external_service_history::Entity as ExternalServiceHistory;
pub use super::external_service_movements::Entity as ExternalServiceMovements;
pub use super::initial_balances::Entity as InitialBalances;
pub use super::points::Entity as Points;
pub use super::shifts::Entity as Shifts;
pub use super::transfers::Entity as Transfers;
pub use super::users::Entity as Users;
