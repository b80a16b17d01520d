use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string(Users::Role).string_len(16))
                    .to_owned(),
            )
            .await?;

        // Create otp_codes table
        manager
            .create_table(
                Table::create()
                    .table(OtpCodes::Table)
                    .if_not_exists()
                    .col(pk_auto(OtpCodes::Id))
                    .col(string(OtpCodes::Email))
                    .col(string(OtpCodes::Code))
                    .col(timestamp_with_time_zone(OtpCodes::ExpiresAt))
                    .col(integer(OtpCodes::Attempts).default(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_otp_codes_email")
                    .table(OtpCodes::Table)
                    .col(OtpCodes::Email)
                    .to_owned(),
            )
            .await?;

        // Create transactions table (the ledger)
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(integer(Transactions::UserId))
                    .col(decimal(Transactions::Amount).decimal_len(16, 4))
                    .col(string(Transactions::Kind).string_len(16))
                    .col(string(Transactions::Category))
                    .col(date(Transactions::Date))
                    .col(string(Transactions::PaymentMethod))
                    .col(string_null(Transactions::Description))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_user")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The reconciliation engine scans by owner, kind, and date window.
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_user_kind_date")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::Kind)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(integer(Categories::UserId))
                    .col(string(Categories::Name))
                    .col(string(Categories::Kind).string_len(16))
                    .col(string_null(Categories::Description))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_user")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create category_budgets table
        manager
            .create_table(
                Table::create()
                    .table(CategoryBudgets::Table)
                    .if_not_exists()
                    .col(pk_auto(CategoryBudgets::Id))
                    .col(integer(CategoryBudgets::UserId))
                    .col(string(CategoryBudgets::Category))
                    .col(string(CategoryBudgets::MonthYear).string_len(7))
                    .col(decimal(CategoryBudgets::MonthlyLimit).decimal_len(16, 4))
                    .col(decimal(CategoryBudgets::CurrentSpent).decimal_len(16, 4).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_budgets_user")
                            .from(CategoryBudgets::Table, CategoryBudgets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_category_budgets_user_month")
                    .table(CategoryBudgets::Table)
                    .col(CategoryBudgets::UserId)
                    .col(CategoryBudgets::MonthYear)
                    .to_owned(),
            )
            .await?;

        // Create monthly_budgets table; one per (user, month)
        manager
            .create_table(
                Table::create()
                    .table(MonthlyBudgets::Table)
                    .if_not_exists()
                    .col(pk_auto(MonthlyBudgets::Id))
                    .col(integer(MonthlyBudgets::UserId))
                    .col(string(MonthlyBudgets::MonthYear).string_len(7))
                    .col(decimal(MonthlyBudgets::MonthlyLimit).decimal_len(16, 4))
                    .col(decimal(MonthlyBudgets::CurrentSpent).decimal_len(16, 4).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_monthly_budgets_user")
                            .from(MonthlyBudgets::Table, MonthlyBudgets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_monthly_budgets_user_month")
                    .table(MonthlyBudgets::Table)
                    .col(MonthlyBudgets::UserId)
                    .col(MonthlyBudgets::MonthYear)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create goals table
        manager
            .create_table(
                Table::create()
                    .table(Goals::Table)
                    .if_not_exists()
                    .col(pk_auto(Goals::Id))
                    .col(integer(Goals::UserId))
                    .col(string(Goals::Name))
                    .col(decimal(Goals::TargetAmount).decimal_len(16, 4))
                    .col(decimal(Goals::CurrentAmount).decimal_len(16, 4).default(0))
                    .col(date(Goals::TargetDate))
                    .col(string(Goals::Priority).string_len(16))
                    .col(string_null(Goals::Description))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_goals_user")
                            .from(Goals::Table, Goals::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Goals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MonthlyBudgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CategoryBudgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OtpCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
}

#[derive(DeriveIden)]
enum OtpCodes {
    Table,
    Id,
    Email,
    Code,
    ExpiresAt,
    Attempts,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    UserId,
    Amount,
    Kind,
    Category,
    Date,
    PaymentMethod,
    Description,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    Kind,
    Description,
}

#[derive(DeriveIden)]
enum CategoryBudgets {
    Table,
    Id,
    UserId,
    Category,
    MonthYear,
    MonthlyLimit,
    CurrentSpent,
}

#[derive(DeriveIden)]
enum MonthlyBudgets {
    Table,
    Id,
    UserId,
    MonthYear,
    MonthlyLimit,
    CurrentSpent,
}

#[derive(DeriveIden)]
enum Goals {
    Table,
    Id,
    UserId,
    Name,
    TargetAmount,
    CurrentAmount,
    TargetDate,
    Priority,
    Description,
}
