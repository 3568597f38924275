//! URL slugs.

use std::collections::HashSet;

use crate::domain::aggregates::Slugged;

pub const MAX_SLUG_LEN: usize = 80;

/// Lowercase ASCII alphanumerics joined by single dashes.
///
/// Falls back to `fallback` when nothing usable remains.
pub fn slugify(text: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() { fallback.to_string() } else { slug.to_string() }
}

/// First of `base`, `base-2`, `base-3`, ... for which `taken` is false.
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2u64..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Unique slug for a record at `index` (or a new one when `None`), derived
/// from `requested` or else the record's own slug source.
pub fn slug_for<T: Slugged>(records: &[T], index: Option<usize>, requested: Option<&str>, source: &str) -> String {
    let text = requested.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(source);
    let base = slugify(text, T::KIND);
    unique_slug(&base, |candidate| {
        records.iter().enumerate().any(|(i, r)| Some(i) != index && r.slug() == candidate)
    })
}

/// Re-slugs a whole collection in order, keeping the first holder of a slug.
///
/// Returns the number of slugs that changed.
pub fn dedupe_slugs<T: Slugged>(records: &mut [T]) -> usize {
    let mut taken = HashSet::new();
    let mut changed = 0;
    for record in records.iter_mut() {
        let text = if record.slug().trim().is_empty() { record.slug_source() } else { record.slug() };
        let base = slugify(text, T::KIND);
        let slug = unique_slug(&base, |c| taken.contains(c));
        if slug != record.slug() {
            *record.slug_mut() = slug.clone();
            changed += 1;
        }
        taken.insert(slug);
    }
    changed
}
