//! Change-history journal models.
//!
//! A tracked entity carries its journal as a single serialized text column:
//! a JSON array of entries, most-recent first. The shape of an entry is
//! `{ "who": <actor?>, "when": <RFC3339>, "what": [<field changes>] }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A single field-level change captured at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub prev: JsonValue,
    pub cur: JsonValue,
}

impl FieldChange {
    pub fn new(field: impl Into<String>, prev: JsonValue, cur: JsonValue) -> Self {
        Self {
            field: field.into(),
            prev,
            cur,
        }
    }
}

/// One audit record: who changed what, and when.
///
/// `who` is omitted from the serialized form entirely when no actor could be
/// resolved for the save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub who: Option<String>,
    pub when: DateTime<Utc>,
    pub what: Vec<FieldChange>,
}

/// Ordered journal of an entity's saves, most-recent first.
///
/// Owned exclusively by its entity; persisted alongside it as an opaque
/// serialized blob and destroyed with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog(pub Vec<JournalEntry>);

impl HistoryLog {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.0
    }

    /// Prepend an entry and trim the tail to `max_entries` if configured.
    ///
    /// A limit of exactly 0 empties the log.
    pub fn prepend(&mut self, entry: JournalEntry, max_entries: Option<usize>) {
        self.0.insert(0, entry);
        if let Some(max) = max_entries {
            self.0.truncate(max);
        }
    }

    /// Decode the journal from its stored text form.
    ///
    /// An empty column yields an empty log. A blob that decodes to anything
    /// other than a JSON array is corrupt storage: the error is logged and
    /// `None` is returned so the caller can skip the append while letting the
    /// primary save proceed.
    pub fn from_stored(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return Some(Self::new());
        }
        match serde_json::from_str::<JsonValue>(raw) {
            Ok(JsonValue::Array(_)) => match serde_json::from_str::<HistoryLog>(raw) {
                Ok(log) => Some(log),
                Err(err) => {
                    tracing::error!(error = %err, "History entries do not match journal shape");
                    None
                }
            },
            Ok(_) => {
                tracing::error!("History field not stored as a list");
                None
            }
            Err(err) => {
                tracing::error!(error = %err, "History field is not valid JSON");
                None
            }
        }
    }

    /// Encode the journal for storage.
    pub fn to_stored(&self) -> String {
        // A Vec of serializable entries cannot fail to encode.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

/// The journal as loaded from storage.
///
/// A corrupt blob is carried through unchanged: appends are skipped against
/// it, but the save path writes the original bytes back so history corruption
/// never blocks or mangles the primary write.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredHistory {
    Journal(HistoryLog),
    Corrupt { raw: String },
}

impl Default for StoredHistory {
    fn default() -> Self {
        StoredHistory::Journal(HistoryLog::new())
    }
}

impl StoredHistory {
    /// Decode the stored column, falling back to `Corrupt` when the blob is
    /// not a journal-shaped list.
    pub fn decode(raw: &str) -> Self {
        match HistoryLog::from_stored(raw) {
            Some(log) => StoredHistory::Journal(log),
            None => StoredHistory::Corrupt {
                raw: raw.to_string(),
            },
        }
    }

    pub fn journal(&self) -> Option<&HistoryLog> {
        match self {
            StoredHistory::Journal(log) => Some(log),
            StoredHistory::Corrupt { .. } => None,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoredHistory::Corrupt { .. })
    }

    /// Encode for storage; corrupt blobs round-trip byte-identically.
    pub fn to_stored(&self) -> String {
        match self {
            StoredHistory::Journal(log) => log.to_stored(),
            StoredHistory::Corrupt { raw } => raw.clone(),
        }
    }
}
