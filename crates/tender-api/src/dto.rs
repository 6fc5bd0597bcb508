// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request payloads.
//!
//! [`ProcurementDto`] is the text form procurements arrive in, typically
//! scraped from a registry page by the browser extension. Converting it
//! checks every field and reports all failures at once.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tender_core::Procurement;

use crate::error::{ApiError, ApiResult, ValidationErrors};

const DATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Procurement as submitted by clients. All values are text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcurementDto {
    /// Law reference number (required).
    #[serde(alias = "fzNumber")]
    pub fz_number: String,
    /// Registry identifier (required).
    pub uin: String,
    /// Subject of the procurement (required).
    #[serde(alias = "objectOf")]
    pub object_of: String,
    /// Publishing organisation (required).
    #[serde(alias = "publisherName")]
    pub publisher_name: String,
    /// Contract price; spaces and a decimal comma are accepted.
    #[serde(alias = "contractPrice")]
    pub contract_price: Option<String>,
    /// Procedure type (required).
    #[serde(alias = "procedureType")]
    pub procedure_type: String,
    /// Procedure stage.
    pub stage: Option<String>,
    /// Registry link.
    #[serde(alias = "linkOnPlacement")]
    pub link_on_placement: Option<String>,
    /// Application deadline date.
    #[serde(alias = "applicationDeadline")]
    pub application_deadline: Option<String>,
    /// Application security.
    #[serde(alias = "applicationSecure")]
    pub application_secure: Option<String>,
    /// Contract security.
    #[serde(alias = "contractSecure")]
    pub contract_secure: Option<String>,
    /// Participation restrictions.
    pub restrictions: Option<String>,
    /// Date of the last registry update.
    #[serde(alias = "lastUpdatedFromEIS", alias = "lastUpdatedFromEis")]
    pub last_updated_from_eis: Option<String>,
    /// Placement date.
    #[serde(alias = "dateOfPlacement")]
    pub date_of_placement: Option<String>,
    /// Auction date.
    #[serde(alias = "dateOfAuction")]
    pub date_of_auction: Option<String>,
    /// Auction time, `HH:MM`.
    #[serde(alias = "timeOfAuction")]
    pub time_of_auction: Option<String>,
    /// Time zone label.
    #[serde(alias = "timeZone")]
    pub time_zone: Option<String>,
    /// Trading platform name.
    #[serde(alias = "etpName")]
    pub etp_name: Option<String>,
    /// Trading platform URL.
    #[serde(alias = "etpUrl")]
    pub etp_url: Option<String>,
    /// Summing-up date.
    #[serde(alias = "summingUpDate")]
    pub summing_up_date: Option<String>,
}

impl ProcurementDto {
    /// Validates the payload and converts it into an unsaved record.
    pub fn into_procurement(self) -> ApiResult<Procurement> {
        let mut errors = ValidationErrors::new();

        let fz_number = required(&mut errors, "fz_number", &self.fz_number).and_then(|raw| {
            raw.parse::<i32>()
                .map_err(|_| errors.add("fz_number", "must be a whole number"))
                .ok()
        });
        let uin = required(&mut errors, "uin", &self.uin);
        let object_of = required(&mut errors, "object_of", &self.object_of);
        let publisher_name = required(&mut errors, "publisher_name", &self.publisher_name);
        let procedure_type = required(&mut errors, "procedure_type", &self.procedure_type);

        let contract_price = optional(&self.contract_price).and_then(|raw| {
            parse_price(raw)
                .map_err(|message| errors.add("contract_price", message))
                .ok()
        });

        let mut date = |field: &'static str, value: &Option<String>| {
            optional(value).and_then(|raw| {
                parse_date(raw)
                    .map_err(|message| errors.add(field, message))
                    .ok()
            })
        };
        let application_deadline = date("application_deadline", &self.application_deadline);
        let last_updated_from_eis = date("last_updated_from_eis", &self.last_updated_from_eis);
        let date_of_placement = date("date_of_placement", &self.date_of_placement);
        let date_of_auction = date("date_of_auction", &self.date_of_auction);
        let summing_up_date = date("summing_up_date", &self.summing_up_date);

        let time_of_auction = optional(&self.time_of_auction).and_then(|raw| {
            parse_time(raw)
                .map_err(|message| errors.add("time_of_auction", message))
                .ok()
        });

        if !errors.is_empty() {
            return Err(ApiError::validation_with_errors(
                format!("Invalid procurement: {}", errors),
                errors,
            ));
        }

        let (Some(fz_number), Some(uin), Some(object_of), Some(publisher_name), Some(procedure_type)) =
            (fz_number, uin, object_of, publisher_name, procedure_type)
        else {
            return Err(ApiError::validation("Invalid procurement"));
        };

        Ok(Procurement {
            fz_number,
            uin: uin.to_string(),
            object_of: object_of.to_string(),
            publisher_name: publisher_name.to_string(),
            contract_price,
            procedure_type: procedure_type.to_string(),
            stage: owned(&self.stage),
            link_on_placement: owned(&self.link_on_placement),
            application_deadline,
            application_secure: owned(&self.application_secure),
            contract_secure: owned(&self.contract_secure),
            restrictions: owned(&self.restrictions),
            last_updated_from_eis,
            date_of_placement,
            date_of_auction,
            time_of_auction,
            time_zone: owned(&self.time_zone),
            etp_name: owned(&self.etp_name),
            etp_url: owned(&self.etp_url),
            summing_up_date,
            ..Procurement::default()
        })
    }
}

// =============================================================================
// Field parsing
// =============================================================================

fn required<'a>(errors: &mut ValidationErrors, field: &str, value: &'a str) -> Option<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "must not be blank");
        None
    } else {
        Some(trimmed)
    }
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> Option<String> {
    optional(value).map(str::to_string)
}

/// Parses a price such as `1 234 567,89`.
pub fn parse_price(raw: &str) -> Result<Decimal, String> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let price = Decimal::from_str(&normalized).map_err(|_| format!("'{raw}' is not a decimal number"))?;
    if price.is_sign_negative() {
        return Err("must not be negative".to_string());
    }
    Ok(price)
}

/// Parses `dd.mm.yyyy` or ISO `yyyy-mm-dd`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| format!("'{raw}' is not a date (expected dd.mm.yyyy or yyyy-mm-dd)"))
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| format!("'{raw}' is not a time (expected HH:MM)"))
}

// =============================================================================
// Tests
// =============================================================================
