//! This file serves as the root for all SeaORM entity modules.
//! The data models mirror the Budget Buddy application: a per-user
//! transaction ledger, free-text spending categories, two kinds of
//! monthly budgets, savings goals, and the auth tables (users plus
//! short-lived OTP codes).

pub mod category;
pub mod category_budget;
pub mod goal;
pub mod monthly_budget;
pub mod otp_code;
pub mod transaction;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::category::Entity as Category;
    pub use super::category_budget::Entity as CategoryBudget;
    pub use super::goal::Entity as Goal;
    pub use super::monthly_budget::Entity as MonthlyBudget;
    pub use super::otp_code::Entity as OtpCode;
    pub use super::transaction::Entity as Transaction;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let owner = user::ActiveModel {
            username: Set("alice".to_string()),
            email: Set("alice@example.com".to_string()),
            password_hash: Set("$2b$12$notarealhash".to_string()),
            role: Set(user::UserRole::User),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let groceries = category::ActiveModel {
            user_id: Set(owner.id),
            name: Set("Groceries".to_string()),
            kind: Set(transaction::TransactionKind::Expense),
            description: Set(Some("Food and household items".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let expense = transaction::ActiveModel {
            user_id: Set(owner.id),
            amount: Set(Decimal::new(8000, 2)), // 80.00
            kind: Set(transaction::TransactionKind::Expense),
            category: Set("Groceries".to_string()),
            date: Set(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()),
            payment_method: Set("card".to_string()),
            description: Set(Some("Weekly grocery run".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let budget = category_budget::ActiveModel {
            user_id: Set(owner.id),
            category: Set("Groceries".to_string()),
            month_year: Set("2024-03".to_string()),
            monthly_limit: Set(Decimal::new(200, 0)),
            current_spent: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let monthly = monthly_budget::ActiveModel {
            user_id: Set(owner.id),
            month_year: Set("2024-03".to_string()),
            monthly_limit: Set(Decimal::new(1000, 0)),
            current_spent: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let goal = goal::ActiveModel {
            user_id: Set(owner.id),
            name: Set("Emergency fund".to_string()),
            target_amount: Set(Decimal::new(5000, 0)),
            current_amount: Set(Decimal::new(1200, 0)),
            target_date: Set(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()),
            priority: Set(goal::GoalPriority::High),
            description: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let otp = otp_code::ActiveModel {
            email: Set("alice@example.com".to_string()),
            code: Set("123456".to_string()),
            expires_at: Set(chrono::Utc::now() + chrono::Duration::minutes(10)),
            attempts: Set(0),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify
        let users = User::find().all(&db).await?;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");

        let categories = Category::find().all(&db).await?;
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, groceries.id);

        let expenses = Transaction::find()
            .filter(transaction::Column::Kind.eq(transaction::TransactionKind::Expense))
            .all(&db)
            .await?;
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].id, expense.id);
        assert_eq!(expenses[0].amount, Decimal::new(8000, 2));

        let budgets = CategoryBudget::find()
            .filter(category_budget::Column::UserId.eq(owner.id))
            .all(&db)
            .await?;
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].id, budget.id);
        assert_eq!(budgets[0].month_year, "2024-03");

        let monthlies = MonthlyBudget::find().all(&db).await?;
        assert_eq!(monthlies.len(), 1);
        assert_eq!(monthlies[0].id, monthly.id);

        let goals = Goal::find().all(&db).await?;
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].id, goal.id);
        assert_eq!(goals[0].priority, goal::GoalPriority::High);

        let codes = OtpCode::find()
            .filter(otp_code::Column::Email.eq("alice@example.com"))
            .all(&db)
            .await?;
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].id, otp.id);
        assert_eq!(codes[0].attempts, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_budget_unique_per_user_month() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let owner = user::ActiveModel {
            username: Set("bob".to_string()),
            email: Set("bob@example.com".to_string()),
            password_hash: Set("$2b$12$notarealhash".to_string()),
            role: Set(user::UserRole::User),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        monthly_budget::ActiveModel {
            user_id: Set(owner.id),
            month_year: Set("2024-05".to_string()),
            monthly_limit: Set(Decimal::new(500, 0)),
            current_spent: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let duplicate = monthly_budget::ActiveModel {
            user_id: Set(owner.id),
            month_year: Set("2024-05".to_string()),
            monthly_limit: Set(Decimal::new(700, 0)),
            current_spent: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&db)
        .await;

        assert!(duplicate.is_err(), "unique (user_id, month_year) index must reject duplicates");
        Ok(())
    }
}
