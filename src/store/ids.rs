//! Sequential record ids.
//!
//! Ids are decimal strings padded to [`ID_WIDTH`] digits. The next id of a
//! collection is one past the largest numeric id present.

use std::collections::{HashMap, HashSet};

use crate::domain::aggregates::Record;

pub const ID_WIDTH: usize = 4;

pub fn format_id(n: u64) -> String {
    format!("{n:0width$}", width = ID_WIDTH)
}

/// Numeric value of a well-formed id. Zero and non-digit ids are rejected.
pub fn parse_id(id: &str) -> Option<u64> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse::<u64>().ok().filter(|n| *n > 0)
}

/// Canonical form of an id supplied by a caller: `"7"` becomes `"0007"`.
pub fn canonical(id: &str) -> String {
    let id = id.trim();
    parse_id(id).map(format_id).unwrap_or_else(|| id.to_string())
}

pub fn next_id<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let max = ids.into_iter().filter_map(parse_id).max().unwrap_or(0);
    format_id(max + 1)
}

pub fn next_record_id<T: Record>(records: &[T]) -> String {
    next_id(records.iter().map(Record::id))
}

/// Old id to new id, for rewriting references after a migration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IdRemap(HashMap<String, String>);

impl IdRemap {
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }

    pub fn get(&self, old: &str) -> Option<&str> { self.0.get(old).map(String::as_str) }

    /// Rewrites `id` to its new value, or else to its canonical form.
    pub fn apply(&self, id: &mut String) {
        *id = match self.0.get(id.as_str()) {
            Some(new) => new.clone(),
            None => canonical(id),
        };
    }

    pub fn apply_opt(&self, id: &mut Option<String>) {
        if let Some(id) = id.as_mut() { self.apply(id); }
    }

    pub fn apply_all(&self, ids: &mut [String]) {
        for id in ids { self.apply(id); }
    }
}

/// Gives every record a canonical, unique id.
///
/// Numeric ids keep their value (re-padded). Records with a non-numeric id,
/// or a duplicate of an earlier id, are numbered after the current maximum.
/// References to a duplicate keep pointing at the first record.
pub fn migrate_ids<T: Record>(records: &mut [T]) -> IdRemap {
    let mut max = records.iter().filter_map(|r| parse_id(r.id())).max().unwrap_or(0);
    let mut seen = HashSet::new();
    let mut remap = HashMap::new();

    for record in records.iter_mut() {
        let original = record.id().trim().to_string();
        let canonical = parse_id(&original).map(format_id);
        let assigned = match &canonical {
            Some(id) if !seen.contains(id) => id.clone(),
            Some(_) => {
                max += 1;
                format_id(max)
            }
            None => {
                max += 1;
                let id = format_id(max);
                if !original.is_empty() {
                    remap.entry(original.clone()).or_insert_with(|| id.clone());
                }
                id
            }
        };
        if canonical.as_deref() == Some(assigned.as_str()) && original != assigned {
            remap.entry(original.clone()).or_insert_with(|| assigned.clone());
        }
        seen.insert(assigned.clone());
        *record.id_mut() = assigned;
    }

    IdRemap(remap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Tag;

    fn tag(id: &str) -> Tag { Tag::new(id.into(), "t", "t".into()) }

    #[test]
    fn test_format_and_parse() {
        assert_eq!(format_id(7), "0007");
        assert_eq!(format_id(123456), "123456");
        assert_eq!(parse_id("0042"), Some(42));
        assert_eq!(parse_id("0000"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(canonical(" 7 "), "0007");
        assert_eq!(canonical("legacy"), "legacy");
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        assert_eq!(next_id([]), "0001");
        assert_eq!(next_id(["0001", "0009", "x", "0003"]), "0010");
    }

    #[test]
    fn test_migrate_ids() {
        let mut tags = vec![tag("3"), tag("uuid-a"), tag("0003"), tag("0001"), tag("")];
        let remap = migrate_ids(&mut tags);
        let ids: Vec<_> = tags.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["0003", "0004", "0005", "0001", "0006"]);
        assert_eq!(remap.get("3"), Some("0003"));
        assert_eq!(remap.get("uuid-a"), Some("0004"));
        assert_eq!(remap.get("0003"), None);
        assert_eq!(remap.len(), 2);
    }

    #[test]
    fn test_apply_pads_unmapped_references() {
        let remap = IdRemap::default();
        let mut refs = vec!["1".to_string(), "0002".to_string(), "legacy".to_string()];
        remap.apply_all(&mut refs);
        assert_eq!(refs, ["0001", "0002", "legacy"]);
        let mut parent = Some(" 12 ".to_string());
        remap.apply_opt(&mut parent);
        assert_eq!(parent.as_deref(), Some("0012"));
    }

    #[test]
    fn test_migrate_is_noop_on_canonical_ids() {
        let mut tags = vec![tag("0001"), tag("0002")];
        assert!(migrate_ids(&mut tags).is_empty());
    }
}
