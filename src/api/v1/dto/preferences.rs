/*
 * Responsibility
 * - Preferences の request/response DTO
 */
use serde::{Deserialize, Serialize};

use crate::repos::preference_repo::PreferenceRow;
use crate::services::preferences::{ALLOWED_CURRENCIES, ALLOWED_THEMES};

#[derive(Debug, Deserialize)]
pub struct PreferenceRequest {
    pub currency: String,
    pub theme: String,
}

impl PreferenceRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !ALLOWED_CURRENCIES.contains(&self.currency.as_str()) {
            return Err("invalid currency");
        }
        if !ALLOWED_THEMES.contains(&self.theme.as_str()) {
            return Err("invalid theme");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PreferenceResponse {
    pub currency: String,
    pub theme: String,
}

impl From<PreferenceRow> for PreferenceResponse {
    fn from(row: PreferenceRow) -> Self {
        Self {
            currency: row.currency,
            theme: row.theme,
        }
    }
}
