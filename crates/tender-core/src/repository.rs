// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Storage contract for procurement records.
//!
//! Implementations live in `tender-store`. Every paged query returns records
//! in ascending id order, which is also insertion order since ids are
//! assigned from a monotonic sequence.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::page::{Page, PageRequest};
use crate::procurement::{Procurement, ProcurementId};

/// Persistent storage for [`Procurement`] records.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` and handle their own locking.
#[async_trait]
pub trait ProcurementRepository: Send + Sync + Debug {
    /// Stores a new record and returns it with its assigned id.
    ///
    /// Any `id` already set on the input is ignored.
    async fn insert(&self, record: Procurement) -> StoreResult<Procurement>;

    /// Replaces the record with the same id.
    ///
    /// A `created_at` of `None` keeps the stored value. Returns `None` when
    /// no record with that id exists or the input has no id.
    async fn replace(&self, record: Procurement) -> StoreResult<Option<Procurement>>;

    /// Looks up a record by id.
    async fn find_by_id(&self, id: ProcurementId) -> StoreResult<Option<Procurement>>;

    /// Returns one page of all records.
    async fn find_all(&self, page: PageRequest) -> StoreResult<Page<Procurement>>;

    /// Returns one page of the records whose id is in `ids`.
    async fn find_by_ids(
        &self,
        ids: &[ProcurementId],
        page: PageRequest,
    ) -> StoreResult<Page<Procurement>>;

    /// Returns every record with the given law reference number.
    async fn find_by_fz_number(&self, fz_number: i32) -> StoreResult<Vec<Procurement>>;

    /// Returns one page of records created strictly before `cutoff`.
    ///
    /// Records without a creation instant never match.
    async fn find_created_before(
        &self,
        cutoff: DateTime<Utc>,
        page: PageRequest,
    ) -> StoreResult<Page<Procurement>>;

    /// Looks up a record by its business key.
    async fn find_by_business_key(
        &self,
        uin: &str,
        fz_number: i32,
    ) -> StoreResult<Option<Procurement>>;

    /// Removes a record. Returns `false` if it did not exist.
    async fn delete(&self, id: ProcurementId) -> StoreResult<bool>;

    /// Number of stored records.
    async fn count(&self) -> StoreResult<u64>;

    /// Checks that the backend is reachable.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}
