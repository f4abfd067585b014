//! Mutex-guarded reference implementations of the collaborator contracts.
//!
//! `MemoryInventory` keeps real optimistic-concurrency semantics — a
//! conditional write checks the stored version under the lock and applies the
//! patch atomically or not at all — so the engine's conflict behavior can be
//! exercised with plain threads. `MemoryLedger` is an insert-if-absent key
//! set over an append-only entry log.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use tracing::debug;

use polemap_core::{
    GeoPoint, InventoryError, LedgerError, LedgerKey, LedgerOutcome, NewPole, PoleId,
    PoleInventory, PolePatch, PoleRecord, ScoreLedger, distance_m,
};

// ── Inventory ──

#[derive(Debug, Default)]
struct InventoryInner {
    poles: BTreeMap<u64, PoleRecord>,
    next_id: u64,
}

/// In-memory pole inventory.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    inner: Mutex<InventoryInner>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an inventory from previously snapshotted records.
    pub fn from_records(records: Vec<PoleRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id.0 + 1).max().unwrap_or(0);
        let poles = records.into_iter().map(|r| (r.id.0, r)).collect();
        Self {
            inner: Mutex::new(InventoryInner { poles, next_id }),
        }
    }

    /// All records, ordered by id.
    pub fn records(&self) -> Vec<PoleRecord> {
        match self.inner.lock() {
            Ok(inner) => inner.poles.values().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().poles.values().cloned().collect(),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InventoryInner>, InventoryError> {
        self.inner
            .lock()
            .map_err(|e| InventoryError::Backend(format!("mutex poisoned: {e}")))
    }
}

impl PoleInventory for MemoryInventory {
    fn read(&self, id: PoleId) -> Result<Option<PoleRecord>, InventoryError> {
        Ok(self.lock()?.poles.get(&id.0).cloned())
    }

    fn within_radius(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<(PoleRecord, f64)>, InventoryError> {
        let inner = self.lock()?;
        Ok(inner
            .poles
            .values()
            .filter_map(|record| {
                let d = distance_m(center, record.location);
                (d <= radius_m).then(|| (record.clone(), d))
            })
            .collect())
    }

    fn find_by_identifier(&self, canonical: &str) -> Result<Option<PoleRecord>, InventoryError> {
        let inner = self.lock()?;
        // BTreeMap iteration gives the lowest-id holder on duplicates.
        Ok(inner
            .poles
            .values()
            .find(|record| record.identifiers.iter().any(|i| i.canonical == canonical))
            .cloned())
    }

    fn insert(&self, pole: NewPole) -> Result<PoleRecord, InventoryError> {
        let mut inner = self.lock()?;
        let id = PoleId(inner.next_id);
        inner.next_id += 1;
        let record = PoleRecord {
            id,
            location: pole.location,
            location_source: pole.location_source,
            identifiers: pole.identifiers,
            evidence: pole.evidence,
            verification_count: 0,
            last_verified_at: None,
            version: 1,
        };
        inner.poles.insert(id.0, record.clone());
        debug!(%id, "inserted pole");
        Ok(record)
    }

    fn write_if_version(
        &self,
        id: PoleId,
        version: u64,
        patch: PolePatch,
    ) -> Result<PoleRecord, InventoryError> {
        let mut inner = self.lock()?;
        let record = inner
            .poles
            .get_mut(&id.0)
            .ok_or(InventoryError::NotFound(id))?;
        if record.version != version {
            return Err(InventoryError::Conflict(id));
        }

        record.identifiers.extend(patch.add_identifiers);
        record.evidence = record.evidence.union(patch.add_evidence);
        if let Some(ts) = patch.record_verification {
            record.verification_count += 1;
            record.last_verified_at = Some(ts);
        }
        record.version += 1;
        Ok(record.clone())
    }
}

// ── Ledger ──

/// One accepted payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub key: LedgerKey,
    pub points: u32,
}

#[derive(Debug, Default)]
struct LedgerInner {
    keys: HashSet<LedgerKey>,
    entries: Vec<LedgerEntry>,
}

/// In-memory score ledger with at-most-once semantics per key.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<LedgerInner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        match self.inner.lock() {
            Ok(inner) => inner.entries.clone(),
            Err(poisoned) => poisoned.into_inner().entries.clone(),
        }
    }

    /// Sum of accepted payouts for one contribution.
    pub fn total_for(&self, contribution_id: &str) -> u32 {
        self.entries()
            .iter()
            .filter(|e| e.key.contribution_id == contribution_id)
            .map(|e| e.points)
            .sum()
    }
}

impl ScoreLedger for MemoryLedger {
    fn try_append(&self, key: LedgerKey, points: u32) -> Result<LedgerOutcome, LedgerError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| LedgerError::Backend(format!("mutex poisoned: {e}")))?;
        if !inner.keys.insert(key.clone()) {
            return Ok(LedgerOutcome::AlreadyExists);
        }
        inner.entries.push(LedgerEntry { key, points });
        Ok(LedgerOutcome::Accepted)
    }
}
