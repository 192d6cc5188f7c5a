use crate::engine;
use crate::errors::{AppError, AppResult};
use crate::legacy;
use crate::models::{Calculations, KpiPatch, KpiRecord, RevenueTier};
use crate::normalize;
use crate::storage::KeyValueStorage;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

pub const DEFAULT_STORAGE_KEY: &str = "sales-incentive-kpis-v1";

static DEFAULT_RECORD_JSON: Lazy<Map<String, Value>> = Lazy::new(|| match serde_json::to_value(KpiRecord::default()) {
    Ok(Value::Object(map)) => map,
    _ => Map::new(),
});

pub type Observer = Box<dyn FnMut(&KpiRecord, &Calculations)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct KpiStore<S> {
    storage: S,
    storage_key: String,
    record: KpiRecord,
    calculations: Calculations,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    persist_failed: bool,
}

impl<S: KeyValueStorage> KpiStore<S> {
    pub fn open(storage: S, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let record = load_record(&storage, &storage_key);
        let calculations = engine::derive(&record);
        tracing::info!(storage_key = %storage_key, period = %record.period_label, "kpi store opened");

        Self {
            storage,
            storage_key,
            record,
            calculations,
            observers: Vec::new(),
            next_subscription: 0,
            persist_failed: false,
        }
    }

    pub fn load(&self) -> KpiRecord {
        load_record(&self.storage, &self.storage_key)
    }

    pub fn state(&self) -> &KpiRecord {
        &self.record
    }

    pub fn calculations(&self) -> &Calculations {
        &self.calculations
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn last_persist_failed(&self) -> bool {
        self.persist_failed
    }

    pub fn apply_patch(&mut self, patch: KpiPatch) {
        let current = std::mem::take(&mut self.record);
        self.record = merge_patch(current, patch);
        tracing::debug!(storage_key = %self.storage_key, "kpi patch applied");
        self.persist();
        self.commit();
    }

    // An absent key loads as defaults, so clearing it persists the reset.
    pub fn reset_to_defaults(&mut self) {
        self.record = KpiRecord::default();
        tracing::info!(storage_key = %self.storage_key, "kpi record reset to defaults");
        let result = self.storage.remove(&self.storage_key);
        self.track_persist(result);
        self.commit();
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&KpiRecord, &Calculations) + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn commit(&mut self) {
        self.calculations = engine::derive(&self.record);
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.record, &self.calculations);
        }
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.record)
            .map_err(AppError::from)
            .and_then(|raw| self.storage.write(&self.storage_key, &raw));
        self.track_persist(result);
    }

    fn track_persist(&mut self, result: AppResult<()>) {
        match result {
            Ok(()) => {
                if self.persist_failed {
                    tracing::info!(storage_key = %self.storage_key, "kpi persistence recovered");
                }
                self.persist_failed = false;
            }
            Err(error) => {
                tracing::warn!(error = %error, storage_key = %self.storage_key, "kpi persist failed; keeping in-memory state");
                self.persist_failed = true;
            }
        }
    }
}

/// Loads the record stored under `key`, falling back to defaults on any failure.
/// Stored keys are merged shallowly over the defaults, nulls skipped.
pub fn load_record<S: KeyValueStorage + ?Sized>(storage: &S, key: &str) -> KpiRecord {
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(storage_key = %key, "no stored kpi record; using defaults");
            return KpiRecord::default();
        }
        Err(error) => {
            tracing::warn!(error = %error, storage_key = %key, "kpi storage read failed; using defaults");
            return KpiRecord::default();
        }
    };

    let parsed = match serde_json::from_str::<Value>(&raw) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!(error = %error, storage_key = %key, "stored kpi record is not valid json; using defaults");
            return KpiRecord::default();
        }
    };

    let Value::Object(stored) = legacy::upgrade_stored_value(parsed) else {
        tracing::warn!(storage_key = %key, "stored kpi record is not an object; using defaults");
        return KpiRecord::default();
    };

    let mut merged = DEFAULT_RECORD_JSON.clone();
    merge_shallow_skip_null(&mut merged, stored);

    match serde_json::from_value::<KpiRecord>(Value::Object(merged)) {
        Ok(record) => record.normalized(),
        Err(error) => {
            tracing::warn!(error = %error, storage_key = %key, "stored kpi record could not be decoded; using defaults");
            KpiRecord::default()
        }
    }
}

fn merge_shallow_skip_null(target: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, value) in update {
        if value.is_null() {
            continue;
        }
        target.insert(key, value);
    }
}

fn merge_patch(existing: KpiRecord, patch: KpiPatch) -> KpiRecord {
    KpiRecord {
        period_label: patch
            .period_label
            .as_deref()
            .and_then(normalize::period_label)
            .unwrap_or(existing.period_label),
        days_remaining: patch.days_remaining.map(normalize::days).unwrap_or(existing.days_remaining),
        team_size: patch.team_size.map(normalize::team_size).unwrap_or(existing.team_size),
        current_count: patch.current_count.map(normalize::amount).unwrap_or(existing.current_count),
        target_count: patch.target_count.map(normalize::amount).unwrap_or(existing.target_count),
        count_bonus: patch.count_bonus.map(normalize::amount).unwrap_or(existing.count_bonus),
        current_ticket: patch.current_ticket.map(normalize::amount).unwrap_or(existing.current_ticket),
        target_ticket: patch.target_ticket.map(normalize::amount).unwrap_or(existing.target_ticket),
        ticket_bonus: patch.ticket_bonus.map(normalize::amount).unwrap_or(existing.ticket_bonus),
        current_revenue: patch.current_revenue.map(normalize::amount).unwrap_or(existing.current_revenue),
        revenue_tiers: patch
            .revenue_tiers
            .map(|tiers| {
                tiers
                    .into_iter()
                    .map(|tier| RevenueTier::new(tier.threshold, tier.bonus))
                    .collect()
            })
            .unwrap_or(existing.revenue_tiers),
    }
}
