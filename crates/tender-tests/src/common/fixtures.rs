// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built test data for consistent and reproducible testing.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tender_api::{ApiConfig, JwtConfig};
use tender_core::{Procurement, ProcurementRepository};
use tender_store::{MemoryRepository, SqliteRepository};

/// Signing secret shared by test servers and tokens.
pub const TEST_SECRET: &str = "integration-test-secret-that-is-long-enough";

/// Password used for every fixture account.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

// =============================================================================
// Procurement Fixtures
// =============================================================================

/// Fixture providing procurement records.
pub struct ProcurementFixtures;

impl ProcurementFixtures {
    /// A fully populated 44-FZ electronic auction.
    pub fn road_repair() -> Procurement {
        Procurement::new(44, "0373200041524000123")
            .with_object_of("Road maintenance, district 4")
            .with_publisher_name("City administration")
            .with_procedure_type("Electronic auction")
            .with_contract_price(Decimal::from_str("1250000.50").unwrap_or_default())
            .with_stage("Submission of applications")
            .with_auction(
                NaiveDate::from_ymd_opt(2024, 6, 3).unwrap_or_default(),
                NaiveTime::from_hms_opt(10, 30, 0),
            )
    }

    /// A minimal record with only the required fields.
    pub fn minimal(fz_number: i32, uin: &str) -> Procurement {
        Procurement::new(fz_number, uin)
            .with_object_of(format!("Supply {uin}"))
            .with_publisher_name("State clinic")
            .with_procedure_type("Request for quotations")
    }

    /// A minimal record with a fixed creation date (00:00 UTC + `hour`).
    pub fn created_on(uin: &str, date: NaiveDate, hour: u32) -> Procurement {
        let created_at = Utc
            .from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap_or_default());
        Self::minimal(44, uin).with_created_at(created_at)
    }

    /// `count` minimal records under 44-FZ with UINs `batch-000`, ...
    pub fn batch(count: usize) -> Vec<Procurement> {
        (0..count)
            .map(|i| Self::minimal(44, &format!("batch-{i:03}")))
            .collect()
    }

    /// A request body as the browser extension sends it (camelCase, string
    /// fields, decimal comma).
    pub fn extension_payload(uin: &str) -> Value {
        json!({
            "fzNumber": "44",
            "uin": uin,
            "objectOf": "Snow removal",
            "publisherName": "Municipal housing office",
            "contractPrice": "98 500,00",
            "procedureType": "Electronic auction",
            "stage": "Commission work",
            "dateOfPlacement": "15.01.2024",
            "dateOfAuction": "2024-01-25",
            "timeOfAuction": "09:00",
            "lastUpdatedFromEIS": "16.01.2024"
        })
    }

    /// A snake_case request body with only the required fields.
    pub fn api_payload(fz_number: i32, uin: &str) -> Value {
        json!({
            "fz_number": fz_number.to_string(),
            "uin": uin,
            "object_of": format!("Supply {uin}"),
            "publisher_name": "State clinic",
            "procedure_type": "Request for quotations"
        })
    }
}

// =============================================================================
// Storage Fixtures
// =============================================================================

/// Fixture providing storage backends.
pub struct StorageFixtures;

impl StorageFixtures {
    /// A fresh in-memory repository.
    pub fn memory() -> Arc<dyn ProcurementRepository> {
        Arc::new(MemoryRepository::new())
    }

    /// A fresh SQLite repository in a temporary directory.
    ///
    /// Keep the returned directory alive for the duration of the test.
    pub fn sqlite() -> (Arc<dyn ProcurementRepository>, tempfile::TempDir) {
        let dir = super::temp_test_dir("tender-sqlite");
        let repository = SqliteRepository::open(dir.path().join("tender.db"))
            .expect("Failed to open SQLite repository");
        (Arc::new(repository), dir)
    }
}

// =============================================================================
// Config Fixtures
// =============================================================================

/// Fixture providing configurations.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// API configuration signing with [`TEST_SECRET`].
    pub fn api() -> ApiConfig {
        ApiConfig::default().with_jwt(JwtConfig::new(TEST_SECRET))
    }

    /// A complete YAML configuration file.
    pub fn yaml() -> String {
        format!(
            r#"
server:
  bind_address: "127.0.0.1"
  port: 9090
  request_timeout_secs: 15
  cors:
    allowed_origins:
      - "chrome-extension://abcdef"

security:
  jwt:
    secret: "{TEST_SECRET}"
    expiration_secs: 3600
    issuer: "tender-test"
  login_code_ttl_secs: 120
  signup_enabled: false

storage:
  backend: memory

logging:
  level: debug
  format: json

bootstrap:
  users:
    - user_name: admin
      email: admin@example.org
      password: "{TEST_PASSWORD}"
      roles: [ROLE_ADMIN]
    - user_name: extension
      password: "{TEST_PASSWORD}"
      roles: [ROLE_CHROME_EXTENSION]
"#
        )
    }
}
