/*
 * Responsibility
 * - Expenses の request/response DTO
 * - amount は Decimal (浮動小数で丸めない)
 */
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::expense_repo::{ExpenseFields, ExpenseRow};

const MAX_NOTES_LEN: usize = 2048;
/// NUMERIC(19,4): 15 integer digits
const AMOUNT_INTEGER_DIGITS: u32 = 15;
const AMOUNT_SCALE: u32 = 4;

fn amount_fits_column(amount: Decimal) -> bool {
    // Postgres rounds to the column scale before the precision check
    amount.round_dp(AMOUNT_SCALE) < Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS))
}

/// create / update 共通 (update も全項目置き換え)
#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl ExpenseRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.amount <= Decimal::ZERO {
            return Err("amount must be positive");
        }
        if !amount_fits_column(self.amount) {
            return Err("amount must be < 1000000000000000");
        }
        if self.category.trim().is_empty() {
            return Err("category is required");
        }
        if let Some(notes) = &self.notes
            && notes.chars().count() > MAX_NOTES_LEN
        {
            return Err("notes must be <= 2048 chars");
        }

        Ok(())
    }

    pub fn fields(&self) -> ExpenseFields<'_> {
        ExpenseFields {
            title: self.title.trim(),
            amount: self.amount,
            category: self.category.trim(),
            date: self.date,
            notes: self.notes.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl From<ExpenseRow> for ExpenseResponse {
    fn from(row: ExpenseRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            amount: row.amount,
            category: row.category,
            date: row.date,
            notes: row.notes,
        }
    }
}
