use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};
use crate::types::PayoutStatus;

pub const DEFAULT_CURRENCY: &str = "KRW";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payout {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub classes_count: i32,
    #[sqlx(try_from = "String")]
    pub status: PayoutStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePayout {
    pub teacher_id: Uuid,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub classes_count: Option<i32>,
    pub note: Option<String>,
}

fn check_currency(errors: &mut FieldErrors, currency: &str) {
    errors.check(
        "currency",
        currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()),
        "Must be a three-letter ISO code",
    );
}

impl CreatePayout {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.check("amount", self.amount > Decimal::ZERO, "Must be greater than zero");
        errors.check("period_end", self.period_start <= self.period_end, "Must not be before period_start");
        if let Some(count) = self.classes_count {
            errors.check("classes_count", count >= 0, "Must not be negative");
        }
        if let Some(currency) = &self.currency {
            check_currency(&mut errors, currency);
        }
        errors.into_result()
    }

    pub fn currency(&self) -> String {
        self.currency.clone().unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePayout {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub classes_count: Option<i32>,
    pub status: Option<PayoutStatus>,
    pub note: Option<String>,
}

impl UpdatePayout {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(amount) = self.amount {
            errors.check("amount", amount > Decimal::ZERO, "Must be greater than zero");
        }
        if let Some(count) = self.classes_count {
            errors.check("classes_count", count >= 0, "Must not be negative");
        }
        if let Some(currency) = &self.currency {
            check_currency(&mut errors, currency);
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PayoutFilter {
    pub teacher_id: Option<Uuid>,
    pub status: Option<PayoutStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
