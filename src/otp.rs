//! One-time passcode issue/verify lifecycle.
//!
//! Codes are six decimal digits with a short lifetime. At most one live
//! code exists per email; issuing replaces any previous code. A code is
//! consumed by successful verification and destroyed by expiry or by
//! five failed attempts.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use model::entities::otp_code;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use tracing::{debug, info, instrument};

pub const MAX_ATTEMPTS: i32 = 5;

/// Delivery channel for one-time passcodes.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_code(&self, email: &str, code: &str) -> anyhow::Result<()>;
}

/// Default delivery channel: writes the code to the application log.
/// Stands in until a real mail transport is wired up per deployment.
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_code(&self, email: &str, code: &str) -> anyhow::Result<()> {
        info!(email, code, "One-time passcode issued");
        Ok(())
    }
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Issue a fresh code for the email, replacing any previous one.
#[instrument(skip(db))]
pub async fn issue_code(
    db: &DatabaseConnection,
    email: &str,
    ttl_minutes: i64,
) -> Result<otp_code::Model, sea_orm::DbErr> {
    let replaced = otp_code::Entity::delete_many()
        .filter(otp_code::Column::Email.eq(email))
        .exec(db)
        .await?;
    if replaced.rows_affected > 0 {
        debug!(email, "Replaced previous one-time passcode");
    }

    otp_code::ActiveModel {
        email: Set(email.to_string()),
        code: Set(generate_code()),
        expires_at: Set(Utc::now() + Duration::minutes(ttl_minutes)),
        attempts: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Outcome of checking a submitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code matched; it has been consumed.
    Verified,
    /// No live code exists for this email.
    NoCode,
    /// The code existed but its lifetime had elapsed; it is gone now.
    Expired,
    /// Wrong digits; the code survives until the attempt cap.
    WrongCode { attempts_left: i32 },
    /// The attempt cap was hit; the code is gone.
    TooManyAttempts,
}

/// Check a submitted code against the live one for the email.
#[instrument(skip(db, submitted))]
pub async fn verify_code(
    db: &DatabaseConnection,
    email: &str,
    submitted: &str,
) -> Result<VerifyOutcome, sea_orm::DbErr> {
    let Some(row) = otp_code::Entity::find()
        .filter(otp_code::Column::Email.eq(email))
        .one(db)
        .await?
    else {
        return Ok(VerifyOutcome::NoCode);
    };

    if row.expires_at < Utc::now() {
        debug!(email, "One-time passcode expired");
        row.delete(db).await?;
        return Ok(VerifyOutcome::Expired);
    }

    if row.code == submitted {
        row.delete(db).await?;
        return Ok(VerifyOutcome::Verified);
    }

    let attempts = row.attempts + 1;
    if attempts >= MAX_ATTEMPTS {
        debug!(email, "One-time passcode attempt cap reached");
        row.delete(db).await?;
        return Ok(VerifyOutcome::TooManyAttempts);
    }

    let mut active: otp_code::ActiveModel = row.into();
    active.attempts = Set(attempts);
    active.update(db).await?;
    Ok(VerifyOutcome::WrongCode {
        attempts_left: MAX_ATTEMPTS - attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::setup_test_db;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_issue_replaces_previous_code() {
        let db = setup_test_db().await;

        let first = issue_code(&db, "a@example.com", 10).await.unwrap();
        let second = issue_code(&db, "a@example.com", 10).await.unwrap();
        assert_ne!(first.id, second.id);

        let live = otp_code::Entity::find()
            .filter(otp_code::Column::Email.eq("a@example.com"))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(live, 1);
    }

    #[tokio::test]
    async fn test_verify_consumes_code() {
        let db = setup_test_db().await;
        let issued = issue_code(&db, "a@example.com", 10).await.unwrap();

        let outcome = verify_code(&db, "a@example.com", &issued.code).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Verified);

        // Second use fails: the code is single-use.
        let outcome = verify_code(&db, "a@example.com", &issued.code).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::NoCode);
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected_and_removed() {
        let db = setup_test_db().await;
        let issued = issue_code(&db, "a@example.com", -1).await.unwrap();

        let outcome = verify_code(&db, "a@example.com", &issued.code).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Expired);
        let outcome = verify_code(&db, "a@example.com", &issued.code).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::NoCode);
    }

    #[tokio::test]
    async fn test_attempt_cap_destroys_code() {
        let db = setup_test_db().await;
        let issued = issue_code(&db, "a@example.com", 10).await.unwrap();
        let wrong = if issued.code == "000000" { "111111" } else { "000000" };

        for remaining in (1..MAX_ATTEMPTS).rev() {
            let outcome = verify_code(&db, "a@example.com", wrong).await.unwrap();
            assert_eq!(
                outcome,
                VerifyOutcome::WrongCode {
                    attempts_left: remaining
                }
            );
        }
        let outcome = verify_code(&db, "a@example.com", wrong).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::TooManyAttempts);

        // Even the right code is useless now.
        let outcome = verify_code(&db, "a@example.com", &issued.code).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::NoCode);
    }
}
