//! Whole-store repair, run once after loading.
//!
//! Files written by older versions (or by hand) may carry non-numeric or
//! duplicate ids, slug collisions, category names instead of ids, and
//! references to records that no longer exist. Normalization fixes all of
//! that in one pass; afterwards every mutation keeps the store consistent.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use super::{contains, ids, slug, Store};
use crate::domain::value_objects::{non_blank, Email};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// Records whose id was rewritten.
    pub ids_remapped: usize,
    pub slugs_changed: usize,
    /// Categories and tags created from product references.
    pub taxonomy_created: usize,
    pub dangling_refs_dropped: usize,
    pub records_dropped: usize,
}

impl NormalizeReport {
    pub fn is_clean(&self) -> bool { *self == Self::default() }
}

impl Store {
    pub fn normalize(&mut self) -> NormalizeReport {
        let mut report = NormalizeReport::default();

        self.migrate_all_ids(&mut report);
        self.normalize_records(&mut report);
        self.reconcile_taxonomy(&mut report);
        self.drop_dangling_refs(&mut report);

        report.slugs_changed += slug::dedupe_slugs(&mut self.products);
        report.slugs_changed += slug::dedupe_slugs(&mut self.categories);
        report.slugs_changed += slug::dedupe_slugs(&mut self.tags);
        report.slugs_changed += slug::dedupe_slugs(&mut self.pages);

        if report.is_clean() {
            info!("store is consistent");
        } else {
            info!(?report, "store normalized");
        }
        report
    }

    fn migrate_all_ids(&mut self, report: &mut NormalizeReport) {
        let products = ids::migrate_ids(&mut self.products);
        let categories = ids::migrate_ids(&mut self.categories);
        let tags = ids::migrate_ids(&mut self.tags);
        let media = ids::migrate_ids(&mut self.media);
        let users = ids::migrate_ids(&mut self.users);
        let orders = ids::migrate_ids(&mut self.orders);
        let unreferenced = ids::migrate_ids(&mut self.coupons).len()
            + ids::migrate_ids(&mut self.reviews).len()
            + ids::migrate_ids(&mut self.pages).len()
            + ids::migrate_ids(&mut self.tickets).len();
        report.ids_remapped += unreferenced
            + [&products, &categories, &tags, &media, &users, &orders].iter().map(|r| r.len()).sum::<usize>();

        for product in &mut self.products {
            categories.apply_all(&mut product.category_ids);
            tags.apply_all(&mut product.tag_ids);
            media.apply_all(&mut product.media_ids);
        }
        for category in &mut self.categories {
            categories.apply_opt(&mut category.parent_id);
        }
        for order in &mut self.orders {
            users.apply_opt(&mut order.user_id);
            for item in &mut order.items {
                products.apply(&mut item.product_id);
            }
        }
        for review in &mut self.reviews {
            products.apply(&mut review.product_id);
            users.apply_opt(&mut review.user_id);
        }
        for ticket in &mut self.tickets {
            users.apply_opt(&mut ticket.user_id);
            orders.apply_opt(&mut ticket.order_id);
        }
    }

    fn normalize_records(&mut self, report: &mut NormalizeReport) {
        self.settings.normalize();

        for product in &mut self.products {
            product.normalize_text();
            product.normalize_pricing();
            if product.sku.is_empty() {
                product.sku = format!("SKU-{}", product.id);
            }
        }
        for category in &mut self.categories {
            category.name = category.name.trim().to_string();
            category.description = non_blank(category.description.take());
        }
        for tag in &mut self.tags {
            tag.name = tag.name.trim().to_string();
        }

        let mut codes = HashSet::new();
        let before = self.coupons.len();
        self.coupons.retain_mut(|coupon| {
            coupon.normalize();
            !coupon.code.is_empty() && codes.insert(coupon.code.clone())
        });
        report.records_dropped += before - self.coupons.len();

        let mut emails = HashSet::new();
        let before = self.users.len();
        self.users.retain_mut(|user| match Email::parse(&user.email) {
            Ok(email) if emails.insert(email.as_str().to_string()) => {
                user.email = email.into_string();
                user.name = user.name.trim().to_string();
                true
            }
            Ok(email) => {
                warn!(user_id = %user.id, email = %email, "dropping user with duplicate email");
                false
            }
            Err(err) => {
                warn!(user_id = %user.id, %err, "dropping user with invalid email");
                false
            }
        });
        report.records_dropped += before - self.users.len();

        for order in &mut self.orders {
            order.normalize_amounts();
        }
        for page in &mut self.pages {
            page.title = page.title.trim().to_string();
            page.seo_title = non_blank(page.seo_title.take());
            page.seo_description = non_blank(page.seo_description.take());
        }
        for ticket in &mut self.tickets {
            ticket.email = ticket.email.trim().to_lowercase();
        }
    }

    /// Folds legacy category/tag name lists into id lists, creating taxonomy as needed.
    fn reconcile_taxonomy(&mut self, report: &mut NormalizeReport) {
        for index in 0..self.products.len() {
            let legacy_categories = std::mem::take(&mut self.products[index].legacy_categories);
            let legacy_tags = std::mem::take(&mut self.products[index].legacy_tags);
            if legacy_categories.is_empty() && legacy_tags.is_empty() {
                continue;
            }
            let (categories_before, tags_before) = (self.categories.len(), self.tags.len());
            let category_ids = self.resolve_categories(&legacy_categories);
            let tag_ids = self.resolve_tags(&legacy_tags);
            report.taxonomy_created += self.categories.len() - categories_before + self.tags.len() - tags_before;

            let product = &mut self.products[index];
            for id in category_ids {
                if !product.category_ids.contains(&id) { product.category_ids.push(id); }
            }
            for id in tag_ids {
                if !product.tag_ids.contains(&id) { product.tag_ids.push(id); }
            }
        }
    }

    fn drop_dangling_refs(&mut self, report: &mut NormalizeReport) {
        let mut dropped = 0;

        let (categories, tags, media) = (&self.categories, &self.tags, &self.media);
        for product in &mut self.products {
            dropped += retain_known(&mut product.category_ids, |id| contains(categories, id));
            dropped += retain_known(&mut product.tag_ids, |id| contains(tags, id));
            dropped += retain_known(&mut product.media_ids, |id| contains(media, id));
        }

        let category_ids: HashSet<String> = self.categories.iter().map(|c| c.id.clone()).collect();
        for category in &mut self.categories {
            let bad_parent = category.parent_id.as_ref()
                .is_some_and(|p| *p == category.id || !category_ids.contains(p));
            if bad_parent {
                category.parent_id = None;
                dropped += 1;
            }
        }
        dropped += self.break_category_cycles();

        let product_ids: HashSet<String> = self.products.iter().map(|p| p.id.clone()).collect();
        let before = self.reviews.len();
        self.reviews.retain(|r| product_ids.contains(&r.product_id));
        report.records_dropped += before - self.reviews.len();

        let user_ids: HashSet<String> = self.users.iter().map(|u| u.id.clone()).collect();
        let order_ids: HashSet<String> = self.orders.iter().map(|o| o.id.clone()).collect();
        let mut clear = |id: &mut Option<String>, known: &HashSet<String>| {
            if id.as_ref().is_some_and(|i| !known.contains(i)) {
                *id = None;
                dropped += 1;
            }
        };
        for order in &mut self.orders { clear(&mut order.user_id, &user_ids); }
        for review in &mut self.reviews { clear(&mut review.user_id, &user_ids); }
        for ticket in &mut self.tickets {
            clear(&mut ticket.user_id, &user_ids);
            clear(&mut ticket.order_id, &order_ids);
        }

        report.dangling_refs_dropped += dropped;
    }

    /// Detaches any category whose parent chain loops back on itself.
    fn break_category_cycles(&mut self) -> usize {
        let mut broken = 0;
        for index in 0..self.categories.len() {
            let mut seen = HashSet::from([self.categories[index].id.clone()]);
            let mut parent = self.categories[index].parent_id.clone();
            while let Some(id) = parent {
                if !seen.insert(id.clone()) {
                    self.categories[index].parent_id = None;
                    broken += 1;
                    break;
                }
                parent = self.categories.iter().find(|c| c.id == id).and_then(|c| c.parent_id.clone());
            }
        }
        broken
    }
}

/// Keeps known, unique ids; returns how many were dropped.
fn retain_known(ids: &mut Vec<String>, known: impl Fn(&str) -> bool) -> usize {
    let before = ids.len();
    let mut seen = HashSet::new();
    ids.retain(|id| known(id) && seen.insert(id.clone()));
    before - ids.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::store::persist::decode_lenient;

    #[test]
    fn test_legacy_ids_are_remapped_with_references() {
        let mut store = decode_lenient(json!({
            "products": [
                { "id": "prod_abc", "name": "Hat", "price": "10.00", "categories": ["Accessories"], "tags": ["Winter", "winter"] },
                { "id": "7", "name": "Hat", "price": 12 }
            ],
            "orders": [
                { "id": "ord_1", "email": " A@B.CO ", "items": [{ "product_id": "prod_abc", "name": "Hat", "unit_price": "10", "quantity": 2 }] }
            ],
            "reviews": [
                { "id": "r1", "product_id": "prod_abc", "author_name": "Ann", "rating": 9, "body": "ok" },
                { "id": "r2", "product_id": "missing", "author_name": "Bob", "rating": 1, "body": "meh" }
            ]
        }));
        let report = store.normalize();

        let ids: Vec<_> = store.products().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["0008", "0007"]);
        assert_eq!(store.orders()[0].items[0].product_id, "0008");
        assert_eq!(store.orders()[0].items[0].line_total, rust_decimal::Decimal::from(20));
        assert_eq!(store.orders()[0].email, "a@b.co");
        assert_eq!(store.reviews().len(), 1);
        assert_eq!(store.reviews()[0].product_id, "0008");
        assert_eq!(store.reviews()[0].rating.value(), 5);

        assert_eq!(store.products()[0].slug, "hat");
        assert_eq!(store.products()[1].slug, "hat-2");
        assert_eq!(store.categories().len(), 1);
        assert_eq!(store.tags().len(), 1);
        assert_eq!(store.products()[0].category_ids, vec!["0001".to_string()]);
        assert_eq!(report.taxonomy_created, 2);
        assert_eq!(report.records_dropped, 1);
    }

    #[test]
    fn test_dangling_refs_and_cycles_are_dropped() {
        let mut store = decode_lenient(json!({
            "categories": [
                { "id": "1", "name": "A", "parent_id": "0002" },
                { "id": "2", "name": "B", "parent_id": "0001" },
                { "id": "3", "name": "C", "parent_id": "0042" }
            ],
            "products": [{ "id": "1", "name": "P", "category_ids": ["0001", "0009", "0001"], "media_ids": ["0003"] }],
            "tickets": [{ "id": "1", "subject": "s", "email": "x@y.co", "user_id": "0005" }]
        }));
        let report = store.normalize();
        assert_eq!(store.products()[0].category_ids, vec!["0001".to_string()]);
        assert!(store.products()[0].media_ids.is_empty());
        assert_eq!(store.category("3").unwrap().parent_id, None);
        let parents: Vec<_> = store.categories().iter().filter(|c| c.parent_id.is_some()).collect();
        assert_eq!(parents.len(), 1);
        assert_eq!(store.tickets()[0].user_id, None);
        assert!(report.dangling_refs_dropped >= 5);
    }

    #[test]
    fn test_unpadded_references_are_canonicalized() {
        let mut store = decode_lenient(json!({
            "categories": [{ "id": "0001", "name": "Kitchen" }, { "id": "0002", "name": "Knives", "parent_id": "1" }],
            "products": [{ "id": "0001", "name": "Knife", "category_ids": ["1", "0002"] }],
            "orders": [{ "id": "0001", "email": "a@b.co", "items": [{ "product_id": "1", "name": "Knife", "unit_price": 5, "quantity": 1 }] }],
            "reviews": [{ "id": "0001", "product_id": "1", "author_name": "Ann", "rating": 4, "body": "Sharp" }]
        }));
        let report = store.normalize();
        assert_eq!(store.products()[0].category_ids, vec!["0001".to_string(), "0002".to_string()]);
        assert_eq!(store.categories()[1].parent_id.as_deref(), Some("0001"));
        assert_eq!(store.orders()[0].items[0].product_id, "0001");
        assert_eq!(store.reviews().len(), 1);
        assert_eq!(report.dangling_refs_dropped, 0);
    }

    #[test]
    fn test_duplicate_coupons_and_users_dropped() {
        let mut store = decode_lenient(json!({
            "coupons": [{ "id": "1", "code": "save" }, { "id": "2", "code": " SAVE " }],
            "users": [
                { "id": "1", "email": "A@x.io", "name": "A" },
                { "id": "2", "email": "a@x.io", "name": "A again" },
                { "id": "3", "email": "broken", "name": "B" }
            ]
        }));
        let report = store.normalize();
        assert_eq!(store.coupons().len(), 1);
        assert_eq!(store.coupons()[0].code, "SAVE");
        assert_eq!(store.users().len(), 1);
        assert_eq!(store.users()[0].email, "a@x.io");
        assert_eq!(report.records_dropped, 3);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut store = decode_lenient(json!({
            "products": [{ "id": "x", "name": "Thing", "categories": ["Stuff"] }]
        }));
        assert!(!store.normalize().is_clean());
        assert!(store.normalize().is_clean());
    }
}
