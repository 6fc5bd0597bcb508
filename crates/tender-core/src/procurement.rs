// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The procurement record and its identifier.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// ProcurementId
// =============================================================================

/// Storage-assigned identifier of a procurement record.
///
/// # Examples
///
/// ```
/// use tender_core::ProcurementId;
///
/// let id = ProcurementId::new(42);
/// assert_eq!(id.get(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcurementId(i64);

impl ProcurementId {
    /// Creates a new procurement id.
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProcurementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProcurementId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// =============================================================================
// Procurement
// =============================================================================

/// A tracked public procurement.
///
/// `uin` together with `fz_number` is the business key used by the browser
/// extension. `id` and `created_at` are filled in by storage on first save.
///
/// # Examples
///
/// ```
/// use tender_core::Procurement;
///
/// let record = Procurement::new(44, "0373200041524000123")
///     .with_object_of("Road maintenance")
///     .with_publisher_name("City administration")
///     .with_procedure_type("Electronic auction");
///
/// assert!(record.id.is_none());
/// assert_eq!(record.business_key(), ("0373200041524000123", 44));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procurement {
    /// Storage id, `None` until persisted.
    pub id: Option<ProcurementId>,
    /// Federal law reference number (44, 223, ...).
    pub fz_number: i32,
    /// Unique procurement number in the public registry.
    pub uin: String,
    /// Subject of the procurement.
    pub object_of: String,
    /// Name of the customer organisation.
    pub publisher_name: String,
    /// Initial contract price.
    pub contract_price: Option<Decimal>,
    /// Procedure kind (auction, tender, request for quotes).
    pub procedure_type: String,
    /// Current stage of the procedure.
    pub stage: Option<String>,
    /// Link to the registry placement page.
    pub link_on_placement: Option<String>,
    /// Deadline for applications.
    pub application_deadline: Option<NaiveDate>,
    /// Application security amount, as published.
    pub application_secure: Option<String>,
    /// Contract security amount, as published.
    pub contract_secure: Option<String>,
    /// Participation restrictions.
    pub restrictions: Option<String>,
    /// Date of the last registry update.
    pub last_updated_from_eis: Option<NaiveDate>,
    /// Placement date.
    pub date_of_placement: Option<NaiveDate>,
    /// Auction date.
    pub date_of_auction: Option<NaiveDate>,
    /// Auction start time, local to `time_zone`.
    pub time_of_auction: Option<NaiveTime>,
    /// Time zone label of the auction time.
    pub time_zone: Option<String>,
    /// Electronic trading platform name.
    pub etp_name: Option<String>,
    /// Electronic trading platform URL.
    pub etp_url: Option<String>,
    /// Date results are summed up.
    pub summing_up_date: Option<NaiveDate>,
    /// First persistence instant.
    pub created_at: Option<DateTime<Utc>>,
}

impl Procurement {
    /// Creates an unsaved record with the given business key.
    pub fn new(fz_number: i32, uin: impl Into<String>) -> Self {
        Self {
            fz_number,
            uin: uin.into(),
            ..Default::default()
        }
    }

    /// Returns the business key `(uin, fz_number)`.
    pub fn business_key(&self) -> (&str, i32) {
        (&self.uin, self.fz_number)
    }

    /// Returns `true` once storage has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: ProcurementId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the subject.
    pub fn with_object_of(mut self, object_of: impl Into<String>) -> Self {
        self.object_of = object_of.into();
        self
    }

    /// Sets the publisher.
    pub fn with_publisher_name(mut self, name: impl Into<String>) -> Self {
        self.publisher_name = name.into();
        self
    }

    /// Sets the procedure type.
    pub fn with_procedure_type(mut self, procedure_type: impl Into<String>) -> Self {
        self.procedure_type = procedure_type.into();
        self
    }

    /// Sets the contract price.
    pub fn with_contract_price(mut self, price: Decimal) -> Self {
        self.contract_price = Some(price);
        self
    }

    /// Sets the stage.
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Sets the creation instant.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the auction date and time.
    pub fn with_auction(mut self, date: NaiveDate, time: Option<NaiveTime>) -> Self {
        self.date_of_auction = Some(date);
        self.time_of_auction = time;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_is_unsaved() {
        let record = Procurement::new(223, "32413851740");
        assert!(!record.is_persisted());
        assert!(record.created_at.is_none());
        assert_eq!(record.fz_number, 223);
    }

    #[test]
    fn test_price_is_exact_in_json() {
        let price = Decimal::from_str("1234567.89").unwrap();
        let record = Procurement::new(44, "1").with_contract_price(price);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"1234567.89\""));

        let back: Procurement = serde_json::from_str(&json).unwrap();
        assert_eq!(back.contract_price, Some(price));
    }

    #[test]
    fn test_id_serializes_as_number() {
        let record = Procurement::new(44, "1").with_id(ProcurementId::new(7));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], 7);
    }
}
