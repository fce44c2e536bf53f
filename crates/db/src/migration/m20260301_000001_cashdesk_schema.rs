//! Cashdesk schema.
//!
//! Built with the portable schema builder so the same migration runs on
//! Postgres in production and SQLite in tests.
//!
//! - reference rows: `points`, `currencies`, `users`
//! - balance trail: `initial_balances`, `balance_movements`, `balances`
//! - daily closing: `cash_counts`, `cash_count_details`, `day_closures`, `shifts`
//! - domain records: `exchanges`, `transfers`
//! - external service: `external_service_balances`, `external_service_history`,
//!   `external_service_movements`

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Points {
    Table,
    Id,
    Name,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Currencies {
    Table,
    Id,
    Code,
    Name,
    Symbol,
    IsActive,
    BuyBehavior,
    SellBehavior,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    FullName,
    Role,
    PointId,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum InitialBalances {
    Table,
    Id,
    PointId,
    CurrencyId,
    Amount,
    AssignedAt,
    AssignedBy,
    IsActive,
    Notes,
}

#[derive(Iden)]
enum BalanceMovements {
    Table,
    Id,
    PointId,
    CurrencyId,
    Kind,
    Amount,
    BalanceBefore,
    BalanceAfter,
    Description,
    ReferenceKind,
    ReferenceId,
    RecordedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Balances {
    Table,
    Id,
    PointId,
    CurrencyId,
    Amount,
    CashNotes,
    CashCoins,
    Bank,
    UpdatedAt,
}

#[derive(Iden)]
enum CashCounts {
    Table,
    Id,
    PointId,
    UserId,
    BusinessDay,
    Status,
    TotalExchanges,
    TransfersIn,
    TransfersOut,
    TotalIncome,
    TotalExpense,
    Notes,
    CreatedAt,
    ClosedAt,
}

#[derive(Iden)]
enum CashCountDetails {
    Table,
    Id,
    CashCountId,
    CurrencyId,
    OpeningBalance,
    TheoreticalClosing,
    PhysicalCount,
    CashNotes,
    CashCoins,
    Difference,
    Income,
    Expense,
    MovementCount,
    Justification,
}

#[derive(Iden)]
enum DayClosures {
    Table,
    Id,
    PointId,
    BusinessDay,
    Status,
    ClosedBy,
    ReportedDifferences,
    Notes,
    CreatedAt,
    ClosedAt,
}

#[derive(Iden)]
enum Shifts {
    Table,
    Id,
    UserId,
    PointId,
    Status,
    StartedAt,
    EndedAt,
    Notes,
}

#[derive(Iden)]
enum Exchanges {
    Table,
    Id,
    PointId,
    UserId,
    OriginCurrencyId,
    DestinationCurrencyId,
    OriginAmount,
    DestinationAmount,
    Rate,
    Operation,
    Status,
    ReceiptNumber,
    CreatedAt,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    OriginPointId,
    DestinationPointId,
    CurrencyId,
    Amount,
    Status,
    ReceiptNumber,
    CreatedAt,
}

#[derive(Iden)]
enum ExternalServiceBalances {
    Table,
    Id,
    PointId,
    Service,
    TotalAssigned,
    TotalUsed,
    CashAmount,
    CashNotes,
    CashCoins,
    Bank,
    UpdatedAt,
}

#[derive(Iden)]
enum ExternalServiceHistory {
    Table,
    Id,
    PointId,
    Service,
    Kind,
    Amount,
    AvailableBefore,
    AvailableAfter,
    Note,
    RecordedBy,
    CreatedAt,
}

#[derive(Iden)]
enum ExternalServiceMovements {
    Table,
    Id,
    PointId,
    Service,
    Kind,
    Amount,
    CashNotes,
    CashCoins,
    Bank,
    GuideReference,
    RecordedBy,
    CreatedAt,
}

fn money<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).decimal_len(16, 2).not_null().to_owned()
}

fn uuid_pk<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().primary_key().to_owned()
}

fn instant<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).timestamp_with_time_zone().not_null().to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reference rows
        manager
            .create_table(
                Table::create()
                    .table(Points::Table)
                    .if_not_exists()
                    .col(uuid_pk(Points::Id))
                    .col(ColumnDef::new(Points::Name).string().not_null())
                    .col(ColumnDef::new(Points::IsActive).boolean().not_null().default(true))
                    .col(instant(Points::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Currencies::Table)
                    .if_not_exists()
                    .col(uuid_pk(Currencies::Id))
                    .col(ColumnDef::new(Currencies::Code).string_len(10).not_null().unique_key())
                    .col(ColumnDef::new(Currencies::Name).string().not_null())
                    .col(ColumnDef::new(Currencies::Symbol).string_len(10).not_null())
                    .col(ColumnDef::new(Currencies::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Currencies::BuyBehavior).string_len(10).not_null())
                    .col(ColumnDef::new(Currencies::SellBehavior).string_len(10).not_null())
                    .col(instant(Currencies::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(uuid_pk(Users::Id))
                    .col(ColumnDef::new(Users::Username).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(ColumnDef::new(Users::Role).string_len(20).not_null())
                    .col(ColumnDef::new(Users::PointId).uuid())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(instant(Users::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-point_id")
                            .from(Users::Table, Users::PointId)
                            .to(Points::Table, Points::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Balance trail
        manager
            .create_table(
                Table::create()
                    .table(InitialBalances::Table)
                    .if_not_exists()
                    .col(uuid_pk(InitialBalances::Id))
                    .col(ColumnDef::new(InitialBalances::PointId).uuid().not_null())
                    .col(ColumnDef::new(InitialBalances::CurrencyId).uuid().not_null())
                    .col(money(InitialBalances::Amount))
                    .col(instant(InitialBalances::AssignedAt))
                    .col(ColumnDef::new(InitialBalances::AssignedBy).uuid().not_null())
                    .col(ColumnDef::new(InitialBalances::IsActive).boolean().not_null())
                    .col(ColumnDef::new(InitialBalances::Notes).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-initial_balances-point_id")
                            .from(InitialBalances::Table, InitialBalances::PointId)
                            .to(Points::Table, Points::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-initial_balances-currency_id")
                            .from(InitialBalances::Table, InitialBalances::CurrencyId)
                            .to(Currencies::Table, Currencies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-initial_balances-point_currency_active")
                    .table(InitialBalances::Table)
                    .col(InitialBalances::PointId)
                    .col(InitialBalances::CurrencyId)
                    .col(InitialBalances::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BalanceMovements::Table)
                    .if_not_exists()
                    .col(uuid_pk(BalanceMovements::Id))
                    .col(ColumnDef::new(BalanceMovements::PointId).uuid().not_null())
                    .col(ColumnDef::new(BalanceMovements::CurrencyId).uuid().not_null())
                    .col(ColumnDef::new(BalanceMovements::Kind).string_len(40).not_null())
                    .col(money(BalanceMovements::Amount))
                    .col(money(BalanceMovements::BalanceBefore))
                    .col(money(BalanceMovements::BalanceAfter))
                    .col(ColumnDef::new(BalanceMovements::Description).text())
                    .col(ColumnDef::new(BalanceMovements::ReferenceKind).string_len(40))
                    .col(ColumnDef::new(BalanceMovements::ReferenceId).string())
                    .col(ColumnDef::new(BalanceMovements::RecordedBy).uuid().not_null())
                    .col(instant(BalanceMovements::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-balance_movements-point_id")
                            .from(BalanceMovements::Table, BalanceMovements::PointId)
                            .to(Points::Table, Points::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-balance_movements-currency_id")
                            .from(BalanceMovements::Table, BalanceMovements::CurrencyId)
                            .to(Currencies::Table, Currencies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-balance_movements-point_currency_created")
                    .table(BalanceMovements::Table)
                    .col(BalanceMovements::PointId)
                    .col(BalanceMovements::CurrencyId)
                    .col(BalanceMovements::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-balance_movements-reference")
                    .table(BalanceMovements::Table)
                    .col(BalanceMovements::ReferenceKind)
                    .col(BalanceMovements::ReferenceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Balances::Table)
                    .if_not_exists()
                    .col(uuid_pk(Balances::Id))
                    .col(ColumnDef::new(Balances::PointId).uuid().not_null())
                    .col(ColumnDef::new(Balances::CurrencyId).uuid().not_null())
                    .col(money(Balances::Amount))
                    .col(money(Balances::CashNotes))
                    .col(money(Balances::CashCoins))
                    .col(money(Balances::Bank))
                    .col(instant(Balances::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-balances-point_id")
                            .from(Balances::Table, Balances::PointId)
                            .to(Points::Table, Points::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-balances-currency_id")
                            .from(Balances::Table, Balances::CurrencyId)
                            .to(Currencies::Table, Currencies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-balances-point_currency-unique")
                    .table(Balances::Table)
                    .col(Balances::PointId)
                    .col(Balances::CurrencyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Daily closing
        manager
            .create_table(
                Table::create()
                    .table(CashCounts::Table)
                    .if_not_exists()
                    .col(uuid_pk(CashCounts::Id))
                    .col(ColumnDef::new(CashCounts::PointId).uuid().not_null())
                    .col(ColumnDef::new(CashCounts::UserId).uuid().not_null())
                    .col(ColumnDef::new(CashCounts::BusinessDay).date().not_null())
                    .col(ColumnDef::new(CashCounts::Status).string_len(10).not_null())
                    .col(ColumnDef::new(CashCounts::TotalExchanges).big_integer().not_null().default(0))
                    .col(ColumnDef::new(CashCounts::TransfersIn).big_integer().not_null().default(0))
                    .col(ColumnDef::new(CashCounts::TransfersOut).big_integer().not_null().default(0))
                    .col(money(CashCounts::TotalIncome))
                    .col(money(CashCounts::TotalExpense))
                    .col(ColumnDef::new(CashCounts::Notes).text())
                    .col(instant(CashCounts::CreatedAt))
                    .col(ColumnDef::new(CashCounts::ClosedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_counts-point_id")
                            .from(CashCounts::Table, CashCounts::PointId)
                            .to(Points::Table, Points::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_counts-user_id")
                            .from(CashCounts::Table, CashCounts::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_counts-point_day")
                    .table(CashCounts::Table)
                    .col(CashCounts::PointId)
                    .col(CashCounts::BusinessDay)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CashCountDetails::Table)
                    .if_not_exists()
                    .col(uuid_pk(CashCountDetails::Id))
                    .col(ColumnDef::new(CashCountDetails::CashCountId).uuid().not_null())
                    .col(ColumnDef::new(CashCountDetails::CurrencyId).uuid().not_null())
                    .col(money(CashCountDetails::OpeningBalance))
                    .col(money(CashCountDetails::TheoreticalClosing))
                    .col(money(CashCountDetails::PhysicalCount))
                    .col(money(CashCountDetails::CashNotes))
                    .col(money(CashCountDetails::CashCoins))
                    .col(money(CashCountDetails::Difference))
                    .col(money(CashCountDetails::Income))
                    .col(money(CashCountDetails::Expense))
                    .col(ColumnDef::new(CashCountDetails::MovementCount).integer().not_null().default(0))
                    .col(ColumnDef::new(CashCountDetails::Justification).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_count_details-cash_count_id")
                            .from(CashCountDetails::Table, CashCountDetails::CashCountId)
                            .to(CashCounts::Table, CashCounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_count_details-currency_id")
                            .from(CashCountDetails::Table, CashCountDetails::CurrencyId)
                            .to(Currencies::Table, Currencies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_count_details-count_currency-unique")
                    .table(CashCountDetails::Table)
                    .col(CashCountDetails::CashCountId)
                    .col(CashCountDetails::CurrencyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DayClosures::Table)
                    .if_not_exists()
                    .col(uuid_pk(DayClosures::Id))
                    .col(ColumnDef::new(DayClosures::PointId).uuid().not_null())
                    .col(ColumnDef::new(DayClosures::BusinessDay).date().not_null())
                    .col(ColumnDef::new(DayClosures::Status).string_len(10).not_null())
                    .col(ColumnDef::new(DayClosures::ClosedBy).uuid())
                    .col(ColumnDef::new(DayClosures::ReportedDifferences).json().not_null())
                    .col(ColumnDef::new(DayClosures::Notes).text())
                    .col(instant(DayClosures::CreatedAt))
                    .col(ColumnDef::new(DayClosures::ClosedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-day_closures-point_id")
                            .from(DayClosures::Table, DayClosures::PointId)
                            .to(Points::Table, Points::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-day_closures-point_day-unique")
                    .table(DayClosures::Table)
                    .col(DayClosures::PointId)
                    .col(DayClosures::BusinessDay)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Shifts::Table)
                    .if_not_exists()
                    .col(uuid_pk(Shifts::Id))
                    .col(ColumnDef::new(Shifts::UserId).uuid().not_null())
                    .col(ColumnDef::new(Shifts::PointId).uuid().not_null())
                    .col(ColumnDef::new(Shifts::Status).string_len(10).not_null())
                    .col(instant(Shifts::StartedAt))
                    .col(ColumnDef::new(Shifts::EndedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Shifts::Notes).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shifts-user_id")
                            .from(Shifts::Table, Shifts::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Domain records
        manager
            .create_table(
                Table::create()
                    .table(Exchanges::Table)
                    .if_not_exists()
                    .col(uuid_pk(Exchanges::Id))
                    .col(ColumnDef::new(Exchanges::PointId).uuid().not_null())
                    .col(ColumnDef::new(Exchanges::UserId).uuid().not_null())
                    .col(ColumnDef::new(Exchanges::OriginCurrencyId).uuid().not_null())
                    .col(ColumnDef::new(Exchanges::DestinationCurrencyId).uuid().not_null())
                    .col(money(Exchanges::OriginAmount))
                    .col(money(Exchanges::DestinationAmount))
                    .col(ColumnDef::new(Exchanges::Rate).decimal_len(16, 6).not_null())
                    .col(ColumnDef::new(Exchanges::Operation).string_len(10).not_null())
                    .col(ColumnDef::new(Exchanges::Status).string_len(10).not_null())
                    .col(ColumnDef::new(Exchanges::ReceiptNumber).string_len(50))
                    .col(instant(Exchanges::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-exchanges-point_id")
                            .from(Exchanges::Table, Exchanges::PointId)
                            .to(Points::Table, Points::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(uuid_pk(Transfers::Id))
                    .col(ColumnDef::new(Transfers::OriginPointId).uuid())
                    .col(ColumnDef::new(Transfers::DestinationPointId).uuid().not_null())
                    .col(ColumnDef::new(Transfers::CurrencyId).uuid().not_null())
                    .col(money(Transfers::Amount))
                    .col(ColumnDef::new(Transfers::Status).string_len(10).not_null())
                    .col(ColumnDef::new(Transfers::ReceiptNumber).string_len(50))
                    .col(instant(Transfers::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-currency_id")
                            .from(Transfers::Table, Transfers::CurrencyId)
                            .to(Currencies::Table, Currencies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // External service
        manager
            .create_table(
                Table::create()
                    .table(ExternalServiceBalances::Table)
                    .if_not_exists()
                    .col(uuid_pk(ExternalServiceBalances::Id))
                    .col(ColumnDef::new(ExternalServiceBalances::PointId).uuid().not_null())
                    .col(ColumnDef::new(ExternalServiceBalances::Service).string_len(40).not_null())
                    .col(money(ExternalServiceBalances::TotalAssigned))
                    .col(money(ExternalServiceBalances::TotalUsed))
                    .col(money(ExternalServiceBalances::CashAmount))
                    .col(money(ExternalServiceBalances::CashNotes))
                    .col(money(ExternalServiceBalances::CashCoins))
                    .col(money(ExternalServiceBalances::Bank))
                    .col(instant(ExternalServiceBalances::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-external_service_balances-point_id")
                            .from(ExternalServiceBalances::Table, ExternalServiceBalances::PointId)
                            .to(Points::Table, Points::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-external_service_balances-point_service-unique")
                    .table(ExternalServiceBalances::Table)
                    .col(ExternalServiceBalances::PointId)
                    .col(ExternalServiceBalances::Service)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExternalServiceHistory::Table)
                    .if_not_exists()
                    .col(uuid_pk(ExternalServiceHistory::Id))
                    .col(ColumnDef::new(ExternalServiceHistory::PointId).uuid().not_null())
                    .col(ColumnDef::new(ExternalServiceHistory::Service).string_len(40).not_null())
                    .col(ColumnDef::new(ExternalServiceHistory::Kind).string_len(12).not_null())
                    .col(money(ExternalServiceHistory::Amount))
                    .col(money(ExternalServiceHistory::AvailableBefore))
                    .col(money(ExternalServiceHistory::AvailableAfter))
                    .col(ColumnDef::new(ExternalServiceHistory::Note).text())
                    .col(ColumnDef::new(ExternalServiceHistory::RecordedBy).uuid().not_null())
                    .col(instant(ExternalServiceHistory::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExternalServiceMovements::Table)
                    .if_not_exists()
                    .col(uuid_pk(ExternalServiceMovements::Id))
                    .col(ColumnDef::new(ExternalServiceMovements::PointId).uuid().not_null())
                    .col(ColumnDef::new(ExternalServiceMovements::Service).string_len(40).not_null())
                    .col(ColumnDef::new(ExternalServiceMovements::Kind).string_len(10).not_null())
                    .col(money(ExternalServiceMovements::Amount))
                    .col(money(ExternalServiceMovements::CashNotes))
                    .col(money(ExternalServiceMovements::CashCoins))
                    .col(money(ExternalServiceMovements::Bank))
                    .col(ColumnDef::new(ExternalServiceMovements::GuideReference).string_len(60).not_null())
                    .col(ColumnDef::new(ExternalServiceMovements::RecordedBy).uuid().not_null())
                    .col(instant(ExternalServiceMovements::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExternalServiceMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExternalServiceHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExternalServiceBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exchanges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shifts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DayClosures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashCountDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashCounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BalanceMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InitialBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Currencies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Points::Table).to_owned())
            .await?;
        Ok(())
    }
}
