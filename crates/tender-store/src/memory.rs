// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory procurement repository.
//!
//! Records live in a `BTreeMap` keyed by id, so iteration is already in id
//! order and paging is a skip/take over the filtered values. Nothing is
//! persisted; data is lost when the repository is dropped.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::trace;

use tender_core::error::StoreResult;
use tender_core::{Page, PageRequest, Procurement, ProcurementId, ProcurementRepository};

/// A thread-safe in-memory [`ProcurementRepository`].
#[derive(Debug)]
pub struct MemoryRepository {
    records: RwLock<BTreeMap<ProcurementId, Procurement>>,
    next_id: AtomicI64,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Creates an empty repository. The first id handed out is 1.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Removes every record. The id sequence is not reset.
    pub fn clear(&self) {
        self.records.write().clear();
    }

    fn page_where(
        &self,
        page: PageRequest,
        mut predicate: impl FnMut(&Procurement) -> bool,
    ) -> Page<Procurement> {
        let records = self.records.read();
        Page::from_ordered(
            records.values().filter(|r| predicate(r)).cloned(),
            page,
        )
    }
}

#[async_trait]
impl ProcurementRepository for MemoryRepository {
    async fn insert(&self, mut record: Procurement) -> StoreResult<Procurement> {
        let id = ProcurementId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        record.id = Some(id);
        self.records.write().insert(id, record.clone());
        trace!(id = %id, "Inserted procurement");
        Ok(record)
    }

    async fn replace(&self, mut record: Procurement) -> StoreResult<Option<Procurement>> {
        let Some(id) = record.id else {
            return Ok(None);
        };
        let mut records = self.records.write();
        let Some(stored) = records.get_mut(&id) else {
            return Ok(None);
        };
        if record.created_at.is_none() {
            record.created_at = stored.created_at;
        }
        *stored = record.clone();
        Ok(Some(record))
    }

    async fn find_by_id(&self, id: ProcurementId) -> StoreResult<Option<Procurement>> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn find_all(&self, page: PageRequest) -> StoreResult<Page<Procurement>> {
        Ok(self.page_where(page, |_| true))
    }

    async fn find_by_ids(
        &self,
        ids: &[ProcurementId],
        page: PageRequest,
    ) -> StoreResult<Page<Procurement>> {
        let wanted: HashSet<ProcurementId> = ids.iter().copied().collect();
        Ok(self.page_where(page, |r| r.id.is_some_and(|id| wanted.contains(&id))))
    }

    async fn find_by_fz_number(&self, fz_number: i32) -> StoreResult<Vec<Procurement>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|r| r.fz_number == fz_number)
            .cloned()
            .collect())
    }

    async fn find_created_before(
        &self,
        cutoff: DateTime<Utc>,
        page: PageRequest,
    ) -> StoreResult<Page<Procurement>> {
        Ok(self.page_where(page, |r| r.created_at.is_some_and(|at| at < cutoff)))
    }

    async fn find_by_business_key(
        &self,
        uin: &str,
        fz_number: i32,
    ) -> StoreResult<Option<Procurement>> {
        Ok(self
            .records
            .read()
            .values()
            .find(|r| r.uin == uin && r.fz_number == fz_number)
            .cloned())
    }

    async fn delete(&self, id: ProcurementId) -> StoreResult<bool> {
        Ok(self.records.write().remove(&id).is_some())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.records.read().len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
