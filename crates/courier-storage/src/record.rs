// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The canonical in-memory record map and its JSON document form.
//!
//! Documents written by older tooling come in two shapes: a map
//! `{"<identity>": "<timestamp>", ...}` and a list of singleton maps
//! `[{"<identity>": "<timestamp>"}, ...]`. Both are accepted on read; writes
//! always use the map shape with RFC 3339 UTC timestamps.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use courier_core::{StoreError, Timestamp};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identity → first-seen timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: BTreeMap<String, Timestamp>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Membership test.
    pub fn exists(&self, identity: &str) -> bool {
        self.records.contains_key(identity)
    }

    pub fn seen_at(&self, identity: &str) -> Option<Timestamp> {
        self.records.get(identity).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Timestamp)> {
        self.records.iter().map(|(id, at)| (id.as_str(), *at))
    }

    /// Removes every record with `now - seen_at > horizon`. Returns how many
    /// records were removed.
    pub fn prune(&mut self, horizon: Duration, now: Timestamp) -> usize {
        let horizon = TimeDelta::from_std(horizon).unwrap_or(TimeDelta::MAX);
        let before = self.records.len();
        self.records.retain(|_, seen_at| now.signed_duration_since(*seen_at) <= horizon);
        before - self.records.len()
    }

    /// Records `now` for every identity not already present. Existing
    /// timestamps are left alone. Returns how many identities were new.
    pub fn commit<I, S>(&mut self, identities: I, now: Timestamp) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inserted = 0;
        for identity in identities {
            let identity = identity.as_ref();
            if !self.records.contains_key(identity) {
                self.records.insert(identity.to_string(), now);
                inserted += 1;
            }
        }
        inserted
    }

    /// Parses a record document. Blank documents are an empty store.
    pub fn from_json(document: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
            document: document.to_string(),
            message: e.to_string(),
        })
    }

    /// Serializes to the canonical map document.
    pub fn to_json(&self, document: &str) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec_pretty(self).map_err(|e| StoreError::Save {
            document: document.to_string(),
            message: e.to_string(),
        })
    }
}

impl FromIterator<(String, Timestamp)> for RecordStore {
    fn from_iter<T: IntoIterator<Item = (String, Timestamp)>>(iter: T) -> Self {
        let mut store = Self::new();
        for (identity, seen_at) in iter {
            store.insert_keep_latest(identity, seen_at);
        }
        store
    }
}

impl RecordStore {
    /// Duplicate identities in legacy documents keep the later timestamp, so
    /// normalizing never moves a record's time backwards.
    fn insert_keep_latest(&mut self, identity: String, seen_at: Timestamp) {
        self.records
            .entry(identity)
            .and_modify(|existing| *existing = (*existing).max(seen_at))
            .or_insert(seen_at);
    }
}

impl Serialize for RecordStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.records
                .iter()
                .map(|(id, at)| (id, at.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireDocument {
    Map(BTreeMap<String, String>),
    List(Vec<BTreeMap<String, String>>),
}

impl<'de> Deserialize<'de> for RecordStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries: Vec<(String, String)> = match WireDocument::deserialize(deserializer)
            .map_err(|_| {
                D::Error::custom(
                    "expected a map of identity to timestamp, or a list of single-entry maps",
                )
            })? {
            WireDocument::Map(map) => map.into_iter().collect(),
            WireDocument::List(list) => list.into_iter().flatten().collect(),
        };

        let mut store = RecordStore::new();
        for (identity, raw) in entries {
            let seen_at = parse_timestamp(&raw).ok_or_else(|| {
                D::Error::custom(format!("invalid timestamp `{raw}` for `{identity}`"))
            })?;
            store.insert_keep_latest(identity, seen_at);
        }
        Ok(store)
    }
}

/// Accepts RFC 3339 with any offset, or a naive ISO-8601 date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(day: u32, hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn map_document_is_read() {
        let json = br#"{"a": "2026-01-10T08:00:00+00:00", "b": "2026-01-11T09:30:00Z"}"#;
        let store = RecordStore::from_json("news.json", json).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.seen_at("a"), Some(at(10, 8)));
    }

    #[test]
    fn list_of_singleton_maps_is_normalized() {
        let json = br#"[{"a": "2026-01-10T08:00:00"}, {"b": "2026-01-11T09:00:00.123456"}]"#;
        let store = RecordStore::from_json("news.json", json).unwrap();
        assert!(store.exists("a"));
        assert!(store.exists("b"));
        assert_eq!(store.seen_at("a"), Some(at(10, 8)));
    }

    #[test]
    fn duplicate_list_entries_keep_latest_time() {
        let json = br#"[{"a": "2026-01-10T08:00:00Z"}, {"a": "2026-01-12T08:00:00Z"}]"#;
        let store = RecordStore::from_json("news.json", json).unwrap();
        assert_eq!(store.seen_at("a"), Some(at(12, 8)));
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let parsed = parse_timestamp("2026-01-10T10:00:00+02:00").unwrap();
        assert_eq!(parsed, at(10, 8));
        assert_eq!(parse_timestamp("2026-01-10 08:00:00"), Some(at(10, 8)));
        assert_eq!(parse_timestamp("last tuesday"), None);
    }

    #[test]
    fn written_document_is_canonical_map() {
        let mut store = RecordStore::new();
        store.commit(["b", "a"], at(10, 8));
        let json: serde_json::Value =
            serde_json::from_slice(&store.to_json("news.json").unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"a": "2026-01-10T08:00:00Z", "b": "2026-01-10T08:00:00Z"})
        );
    }

    #[test]
    fn blank_document_is_empty_store() {
        assert!(RecordStore::from_json("x.json", b"  \n").unwrap().is_empty());
    }

    #[test]
    fn malformed_document_is_corrupt() {
        let err = RecordStore::from_json("x.json", br#"{"a": 17}"#).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        let err = RecordStore::from_json("x.json", br#"{"a": "yesterday"}"#).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn commit_keeps_first_seen_time() {
        let mut store = RecordStore::new();
        assert_eq!(store.commit(["a"], at(10, 8)), 1);
        assert_eq!(store.commit(["a", "b"], at(11, 8)), 1);
        assert_eq!(store.seen_at("a"), Some(at(10, 8)));
        assert_eq!(store.seen_at("b"), Some(at(11, 8)));
    }

    #[test]
    fn prune_boundary_is_inclusive_of_horizon() {
        let mut store = RecordStore::new();
        store.commit(["edge"], at(3, 8));
        store.commit(["old"], at(3, 7));
        let removed = store.prune(Duration::from_secs(7 * 86_400), at(10, 8));
        assert_eq!(removed, 1);
        assert!(store.exists("edge"));
        assert!(!store.exists("old"));
    }

    fn arb_identity() -> impl Strategy<Value = String> {
        "[a-z0-9]{1,12}"
    }

    fn arb_store() -> impl Strategy<Value = RecordStore> {
        prop::collection::vec((arb_identity(), 0i64..30 * 86_400), 0..40).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(id, secs)| (id, at(1, 0) + TimeDelta::seconds(secs)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn commit_is_idempotent(
            store in arb_store(),
            ids in prop::collection::vec(arb_identity(), 0..10),
            offset in 0i64..86_400,
        ) {
            let now = at(20, 0) + TimeDelta::seconds(offset);
            let mut once = store.clone();
            once.commit(&ids, now);
            let mut twice = once.clone();
            let inserted = twice.commit(&ids, now + TimeDelta::hours(1));
            prop_assert_eq!(inserted, 0);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prune_removes_exactly_the_expired(
            store in arb_store(),
            horizon_days in 1u64..20,
        ) {
            let now = at(31, 0);
            let horizon = Duration::from_secs(horizon_days * 86_400);
            let mut pruned = store.clone();
            pruned.prune(horizon, now);

            for (identity, seen_at) in store.iter() {
                let expired = now - seen_at > TimeDelta::from_std(horizon).unwrap();
                prop_assert_eq!(pruned.exists(identity), !expired);
            }
        }

        #[test]
        fn canonical_document_reads_back_identically(store in arb_store()) {
            let bytes = store.to_json("p.json").unwrap();
            prop_assert_eq!(RecordStore::from_json("p.json", &bytes).unwrap(), store);
        }
    }
}
