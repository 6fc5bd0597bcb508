// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Procurement data manager.
//!
//! The service layer between HTTP handlers and a [`ProcurementRepository`].
//! It owns the rules the storage contract does not: null checks before any
//! storage access, page validation, creation timestamps, the business-key
//! upsert, and the mapping of "nothing there" into typed errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use tender_core::{ProcurementDataManager, PageRequest};
//!
//! let manager = ProcurementDataManager::new(repository);
//!
//! let saved = manager.save(record).await?;
//! let page = manager.load_all(PageRequest::of(0, 20)).await?;
//! manager.delete_by_id(saved.id.unwrap()).await?;
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{DataManagerError, DataResult};
use crate::page::{Page, PageRequest};
use crate::procurement::{Procurement, ProcurementId};
use crate::repository::ProcurementRepository;

/// Service for reading and writing procurement records.
///
/// Cheap to clone; clones share the repository and the upsert lock.
#[derive(Debug, Clone)]
pub struct ProcurementDataManager {
    repository: Arc<dyn ProcurementRepository>,
    upserts: Arc<Mutex<()>>,
}

impl ProcurementDataManager {
    /// Creates a manager over the given repository.
    pub fn new(repository: Arc<dyn ProcurementRepository>) -> Self {
        Self {
            repository,
            upserts: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &Arc<dyn ProcurementRepository> {
        &self.repository
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a record without an id, or fully replaces the record with the
    /// same id.
    ///
    /// # Errors
    ///
    /// [`DataManagerError::NotFound`] when the record carries an id that is
    /// not stored.
    pub async fn save(&self, mut record: Procurement) -> DataResult<Procurement> {
        match record.id {
            None => {
                if record.created_at.is_none() {
                    record.created_at = Some(Utc::now());
                }
                let saved = self.repository.insert(record).await?;
                info!(
                    id = ?saved.id,
                    uin = %saved.uin,
                    fz_number = saved.fz_number,
                    "Procurement created"
                );
                Ok(saved)
            }
            Some(id) => {
                let saved = self
                    .repository
                    .replace(record)
                    .await?
                    .ok_or_else(|| DataManagerError::not_found(id))?;
                debug!(id = %id, "Procurement replaced");
                Ok(saved)
            }
        }
    }

    /// Inserts or replaces a record identified by its UIN and FZ number.
    ///
    /// When a record with the same business key exists, its id and creation
    /// instant are kept and every other field is taken from `record`.
    ///
    /// Upserts through the same manager run one at a time, so concurrent
    /// calls for one key never insert twice.
    pub async fn save_by_business_key(&self, mut record: Procurement) -> DataResult<Procurement> {
        let _serial = self.upserts.lock().await;
        let existing = self
            .repository
            .find_by_business_key(&record.uin, record.fz_number)
            .await?;

        match existing {
            Some(existing) => {
                record.id = existing.id;
                record.created_at = existing.created_at;
                self.save(record).await
            }
            None => {
                record.id = None;
                self.save(record).await
            }
        }
    }

    /// Deletes the given record.
    ///
    /// # Errors
    ///
    /// [`DataManagerError::NullInput`] when the record has no id, otherwise as
    /// [`delete_by_id`](Self::delete_by_id).
    pub async fn delete(&self, record: &Procurement) -> DataResult<()> {
        let id = record.id.ok_or(DataManagerError::null_input("delete"))?;
        self.delete_by_id(id).await
    }

    /// Deletes the record with the given id.
    ///
    /// # Errors
    ///
    /// [`DataManagerError::NonExistingDelete`] when no such record exists.
    pub async fn delete_by_id(&self, id: ProcurementId) -> DataResult<()> {
        if self.repository.delete(id).await? {
            info!(id = %id, "Procurement deleted");
            Ok(())
        } else {
            Err(DataManagerError::non_existing_delete(id))
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Loads a record by id.
    ///
    /// # Errors
    ///
    /// [`DataManagerError::NullInput`] when `id` is `None` (storage is not
    /// consulted), [`DataManagerError::NotFound`] when no record matches.
    pub async fn load_by_id(&self, id: Option<ProcurementId>) -> DataResult<Procurement> {
        let id = id.ok_or(DataManagerError::null_input("load"))?;
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DataManagerError::not_found(id))
    }

    /// Loads a record by its business key.
    pub async fn load_by_business_key(&self, uin: &str, fz_number: i32) -> DataResult<Procurement> {
        self.repository
            .find_by_business_key(uin, fz_number)
            .await?
            .ok_or_else(|| DataManagerError::not_found_by_key(uin, fz_number))
    }

    /// Loads one page of all records in id order.
    pub async fn load_all(&self, page: PageRequest) -> DataResult<Page<Procurement>> {
        page.validate()?;
        Ok(self.repository.find_all(page).await?)
    }

    /// Loads one page of the records whose id is in `ids`.
    ///
    /// Unknown ids are skipped. An empty id list yields an empty page.
    pub async fn load_by_id_list(
        &self,
        ids: &[ProcurementId],
        page: PageRequest,
    ) -> DataResult<Page<Procurement>> {
        page.validate()?;
        if ids.is_empty() {
            return Ok(Page::empty(page));
        }
        Ok(self.repository.find_by_ids(ids, page).await?)
    }

    /// Loads every record with the given law reference number.
    pub async fn load_list_by_fz_number(&self, fz_number: i32) -> DataResult<Vec<Procurement>> {
        Ok(self.repository.find_by_fz_number(fz_number).await?)
    }

    /// Loads one page of records created strictly before the start of `date`
    /// (00:00 UTC).
    pub async fn load_created_before_date(
        &self,
        date: NaiveDate,
        page: PageRequest,
    ) -> DataResult<Page<Procurement>> {
        page.validate()?;
        let cutoff = start_of_day(date);
        debug!(%cutoff, "Loading procurements created before cutoff");
        Ok(self.repository.find_created_before(cutoff, page).await?)
    }

    /// Number of stored records.
    pub async fn count(&self) -> DataResult<u64> {
        Ok(self.repository.count().await?)
    }

    /// Checks that storage is reachable.
    pub async fn health_check(&self) -> DataResult<()> {
        Ok(self.repository.health_check().await?)
    }
}

/// Returns 00:00 UTC of the given date.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
