//! Change-history engine.
//!
//! Gives any entity type audit logging around its save path: a snapshot of
//! the persisted scalar fields is captured when the entity is loaded, a
//! field-level diff is computed at save time, and a journal entry with
//! actor/timestamp metadata is prepended to the entity's [`HistoryLog`].
//!
//! The original design hung this off the model base class with nullable
//! function-pointer hooks (a field serializer and an actor resolver) checked
//! for callability on every save. Here the field serializer is the
//! [`Audited`] impl itself and the actor arrives through the request context,
//! so both are resolved at compile time and a "non-string who" simply cannot
//! be represented.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{json, Value as JsonValue};

use crate::models::history::{FieldChange, HistoryLog, JournalEntry, StoredHistory};
use crate::models::resource::Resource;

/// An entity whose saves are journaled.
///
/// `audit_fields` returns the persisted scalar fields as a name → serialized
/// value map covering a static field set. Impls may render fields in a
/// human-readable way (owner references become email strings for resources);
/// the method is pure and must not mutate the entity.
pub trait Audited {
    fn audit_fields(&self) -> BTreeMap<String, JsonValue>;
}

/// Per-entity-type journaling policy, built once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPolicy {
    /// Maximum number of journal entries kept; insertion prepends and the
    /// tail is trimmed. `None` is unbounded; `Some(0)` empties the log on
    /// every save.
    pub max_entries: Option<usize>,
    /// Whether a save with zero changed fields still appends an entry.
    pub record_empty_diffs: bool,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            max_entries: None,
            record_empty_diffs: true,
        }
    }
}

impl HistoryPolicy {
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }
}

/// Dirty tracker for one in-memory entity.
///
/// Construct it when the entity is loaded or created so the baseline snapshot
/// matches the stored state; call [`ChangeTracker::record`] as part of every
/// save.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    initial: BTreeMap<String, JsonValue>,
    policy: HistoryPolicy,
}

impl ChangeTracker {
    /// Capture the baseline snapshot from the entity's current fields.
    pub fn new<E: Audited>(entity: &E, policy: HistoryPolicy) -> Self {
        Self {
            initial: entity.audit_fields(),
            policy,
        }
    }

    /// Field-level diff of the entity against the baseline snapshot, ordered
    /// by field name. Equality is by serialized value.
    ///
    /// Snapshots always cover the same static field set, so keys present on
    /// one side only are not expected and not checked for.
    pub fn diff<E: Audited>(&self, entity: &E) -> Vec<FieldChange> {
        let current = entity.audit_fields();
        self.initial
            .iter()
            .filter(|(field, prev)| current.get(*field) != Some(prev))
            .map(|(field, prev)| {
                FieldChange::new(
                    field.clone(),
                    prev.clone(),
                    current.get(field).cloned().unwrap_or(JsonValue::Null),
                )
            })
            .collect()
    }

    pub fn has_changed<E: Audited>(&self, entity: &E) -> bool {
        !self.diff(entity).is_empty()
    }

    /// Journal the pending diff and re-baseline.
    ///
    /// Prepends a journal entry (subject to the empty-diff policy), trims the
    /// log per the configured maximum, and re-captures the snapshot so the
    /// next diff is relative to the just-saved state. Returns whether an
    /// entry was appended.
    ///
    /// The caller performs the actual persistence write; history is
    /// best-effort and never blocks it.
    pub fn record<E: Audited>(
        &mut self,
        entity: &E,
        log: &mut HistoryLog,
        who: Option<&str>,
    ) -> bool {
        let what = self.diff(entity);
        self.initial = entity.audit_fields();

        if what.is_empty() && !self.policy.record_empty_diffs {
            tracing::debug!("Skipping empty-diff journal entry");
            return false;
        }

        let entry = JournalEntry {
            who: who.map(String::from),
            when: Utc::now(),
            what,
        };
        tracing::debug!(?entry, "Adding record to history");
        log.prepend(entry, self.policy.max_entries);
        true
    }

    /// Like [`ChangeTracker::record`], against the journal as loaded from
    /// storage. On a corrupt blob the append is skipped with an error log (the
    /// tracker still re-baselines so the caller's save can proceed normally).
    pub fn record_stored<E: Audited>(
        &mut self,
        entity: &E,
        history: &mut StoredHistory,
        who: Option<&str>,
    ) -> bool {
        match history {
            StoredHistory::Journal(log) => self.record(entity, log, who),
            StoredHistory::Corrupt { .. } => {
                tracing::error!("History field not saved initially as list; skipping append");
                self.initial = entity.audit_fields();
                false
            }
        }
    }
}

impl Audited for Resource {
    fn audit_fields(&self) -> BTreeMap<String, JsonValue> {
        // Owner references are rendered as emails rather than raw ids so the
        // journal stays readable after users are renamed or removed.
        let mut fields = BTreeMap::new();
        fields.insert("name".into(), json!(self.name));
        fields.insert("serial_num".into(), json!(self.serial_num));
        fields.insert("current_user".into(), json!(self.current_user.email));
        fields.insert(
            "previous_user".into(),
            self.previous_user
                .as_ref()
                .map(|u| json!(u.email))
                .unwrap_or(JsonValue::Null),
        );
        fields.insert("device_admin".into(), json!(self.device_admin.email));
        fields.insert("status".into(), json!(self.status.as_token()));
        fields.insert("description".into(), json!(self.description));
        fields.insert("org".into(), json!(self.org_id.to_string()));
        fields
    }
}
