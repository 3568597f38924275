//! Catalog operations: products, categories, tags and media.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use super::{contains, find, ids, position, require, slug, Paginated, Store};
use crate::domain::aggregates::*;
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{max_price, non_blank, Sku};
use crate::{Result, StoreError};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    /// Case-insensitive match on name, SKU or description.
    pub search: Option<String>,
    /// Category id or slug; products in child categories match too.
    pub category: Option<String>,
    /// Tag id or slug.
    pub tag: Option<String>,
    pub status: Option<ProductStatus>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub sort: ProductSort,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductQuery {
    /// Active products only, as the storefront lists them.
    pub fn storefront() -> Self {
        Self { status: Some(ProductStatus::Active), ..Self::default() }
    }
}

impl Store {
    // =========================================================================
    // Products
    // =========================================================================

    pub fn product(&self, id: &str) -> Option<&Product> { find(&self.products, id) }

    pub fn product_by_slug(&self, slug: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.slug == slug)
    }

    pub fn create_product(&mut self, input: ProductInput) -> Result<Product> {
        input.validate()?;
        let media_ids = self.check_product_refs(&input, None)?;
        let id = ids::next_record_id(&self.products);

        let mut product = Product { id: id.clone(), ..Product::default() };
        product.apply_input(&input);
        if product.sku.is_empty() { product.sku = Sku::for_product(&id).into_string(); }
        product.slug = slug::slug_for(&self.products, None, input.slug.as_deref(), &product.name);
        product.category_ids = self.resolve_categories(&input.categories);
        product.tag_ids = self.resolve_tags(&input.tags);
        product.media_ids = media_ids;

        info!(product_id = %id, slug = %product.slug, "product created");
        self.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id, slug: product.slug.clone() }));
        self.products.push(product.clone());
        Ok(product)
    }

    /// Replaces a product's fields. The slug only changes when one is given.
    pub fn update_product(&mut self, id: &str, input: ProductInput) -> Result<Product> {
        input.validate()?;
        let index = require(&self.products, id)?;
        let media_ids = self.check_product_refs(&input, Some(index))?;
        let slug = match non_blank(input.slug.clone()) {
            Some(requested) => slug::slug_for(&self.products, Some(index), Some(&requested), &input.name),
            None => self.products[index].slug.clone(),
        };
        let category_ids = self.resolve_categories(&input.categories);
        let tag_ids = self.resolve_tags(&input.tags);

        let product = &mut self.products[index];
        product.apply_input(&input);
        product.slug = slug;
        product.category_ids = category_ids;
        product.tag_ids = tag_ids;
        product.media_ids = media_ids;
        let product = product.clone();

        debug!(product_id = %product.id, "product updated");
        self.raise_event(DomainEvent::Product(ProductEvent::Updated { product_id: product.id.clone() }));
        Ok(product)
    }

    /// Deletes a product and its reviews. Orders keep their item snapshots.
    pub fn delete_product(&mut self, id: &str) -> Result<Product> {
        let index = require(&self.products, id)?;
        let product = self.products.remove(index);
        let before = self.reviews.len();
        self.reviews.retain(|r| r.product_id != product.id);
        info!(product_id = %product.id, reviews_removed = before - self.reviews.len(), "product deleted");
        self.raise_event(DomainEvent::Product(ProductEvent::Deleted { product_id: product.id.clone() }));
        Ok(product)
    }

    /// Adds `delta` (possibly negative) to a tracked product's stock.
    pub fn adjust_stock(&mut self, id: &str, delta: i64) -> Result<Product> {
        let index = require(&self.products, id)?;
        let product = &self.products[index];
        let next = (product.stock as i64).saturating_add(delta);
        if next < 0 {
            return Err(StoreError::InsufficientStock {
                product_id: product.id.clone(),
                available: product.stock,
                requested: delta.unsigned_abs().min(u32::MAX as u64) as u32,
            });
        }
        let stock = next.min(u32::MAX as i64) as u32;
        self.set_stock(index, stock);
        Ok(self.products[index].clone())
    }

    /// Sets stock and raises a low-stock event when it drops to the threshold.
    pub(crate) fn set_stock(&mut self, index: usize, stock: u32) {
        let threshold = self.settings.low_stock_threshold;
        let product = &mut self.products[index];
        let previous = product.stock;
        product.stock = stock;
        product.touch();
        if product.track_stock && stock < previous && stock <= threshold {
            let event = ProductEvent::StockLow { product_id: product.id.clone(), stock };
            info!(product_id = %product.id, stock, "stock low");
            self.raise_event(DomainEvent::Product(event));
        }
    }

    pub fn list_products(&self, query: &ProductQuery, now: DateTime<Utc>) -> Paginated<Product> {
        let search = non_blank(query.search.clone()).map(|s| s.to_lowercase());
        let category_ids = match non_blank(query.category.clone()) {
            Some(reference) => match self.category_ref(&reference) {
                Some(id) => Some(self.category_with_descendants(&id)),
                None => return Paginated::from_vec(vec![], query.page, query.per_page),
            },
            None => None,
        };
        let tag_id = match non_blank(query.tag.clone()) {
            Some(reference) => match self.tags.iter().find(|t| t.id == ids::canonical(&reference) || t.slug == reference) {
                Some(tag) => Some(tag.id.clone()),
                None => return Paginated::from_vec(vec![], query.page, query.per_page),
            },
            None => None,
        };

        let mut items: Vec<Product> = self.products.iter()
            .filter(|p| query.status.map_or(true, |s| p.status == s))
            .filter(|p| query.featured.map_or(true, |f| p.featured == f))
            .filter(|p| query.in_stock.map_or(true, |s| p.is_in_stock() == s))
            .filter(|p| category_ids.as_ref().map_or(true, |allowed| p.category_ids.iter().any(|c| allowed.contains(c))))
            .filter(|p| tag_id.as_ref().map_or(true, |t| p.tag_ids.contains(t)))
            .filter(|p| search.as_ref().map_or(true, |s| {
                p.name.to_lowercase().contains(s) || p.sku.to_lowercase().contains(s) || p.description.to_lowercase().contains(s)
            }))
            .cloned()
            .collect();

        match query.sort {
            ProductSort::Newest => items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))),
            ProductSort::Oldest => items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))),
            ProductSort::PriceAsc => items.sort_by(|a, b| a.effective_price(now).cmp(&b.effective_price(now)).then_with(|| a.id.cmp(&b.id))),
            ProductSort::PriceDesc => items.sort_by(|a, b| b.effective_price(now).cmp(&a.effective_price(now)).then_with(|| a.id.cmp(&b.id))),
            ProductSort::Name => items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.id.cmp(&b.id))),
        }
        Paginated::from_vec(items, query.page, query.per_page)
    }

    /// Checks SKU uniqueness and media references; returns canonical media ids.
    fn check_product_refs(&self, input: &ProductInput, index: Option<usize>) -> Result<Vec<String>> {
        if input.price.is_sign_negative() {
            return Err(StoreError::Validation("price must not be negative".into()));
        }
        if input.price > max_price() || input.sale_price.is_some_and(|sale| sale > max_price()) {
            return Err(StoreError::Validation(format!("price must not exceed {}", max_price())));
        }
        if let Some(sku) = non_blank(input.sku.clone()) {
            let sku = Sku::new(sku).map_err(|e| StoreError::Validation(e.to_string()))?;
            let clash = self.products.iter().enumerate()
                .any(|(i, p)| Some(i) != index && p.sku == sku.as_str());
            if clash {
                return Err(StoreError::Conflict(format!("SKU {sku} is already in use")));
            }
        }
        let mut media_ids = Vec::new();
        for reference in &input.media_ids {
            let id = ids::canonical(reference);
            if !contains(&self.media, &id) {
                return Err(StoreError::not_found(MediaAsset::KIND, reference.clone()));
            }
            if !media_ids.contains(&id) { media_ids.push(id); }
        }
        Ok(media_ids)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub fn category(&self, id: &str) -> Option<&Category> { find(&self.categories, id) }

    pub fn create_category(&mut self, input: CategoryInput) -> Result<Category> {
        input.validate()?;
        let parent_id = self.check_parent(None, input.parent_id.as_deref())?;
        let id = ids::next_record_id(&self.categories);
        let slug = slug::slug_for(&self.categories, None, input.slug.as_deref(), &input.name);
        let mut category = Category::new(id, &input.name, slug);
        category.description = non_blank(input.description);
        category.parent_id = parent_id;
        info!(category_id = %category.id, slug = %category.slug, "category created");
        self.categories.push(category.clone());
        Ok(category)
    }

    pub fn update_category(&mut self, id: &str, input: CategoryInput) -> Result<Category> {
        input.validate()?;
        let index = require(&self.categories, id)?;
        let parent_id = self.check_parent(Some(index), input.parent_id.as_deref())?;
        let slug = match non_blank(input.slug.clone()) {
            Some(requested) => slug::slug_for(&self.categories, Some(index), Some(&requested), &input.name),
            None => self.categories[index].slug.clone(),
        };
        let category = &mut self.categories[index];
        category.name = input.name.trim().to_string();
        category.slug = slug;
        category.description = non_blank(input.description);
        category.parent_id = parent_id;
        Ok(category.clone())
    }

    /// Deletes a category, unlinking products and lifting its children to its parent.
    pub fn delete_category(&mut self, id: &str) -> Result<Category> {
        let index = require(&self.categories, id)?;
        let category = self.categories.remove(index);
        for child in self.categories.iter_mut().filter(|c| c.parent_id.as_deref() == Some(category.id.as_str())) {
            child.parent_id = category.parent_id.clone();
        }
        let mut unlinked = 0;
        for product in &mut self.products {
            let before = product.category_ids.len();
            product.category_ids.retain(|c| *c != category.id);
            if product.category_ids.len() != before {
                unlinked += 1;
                product.touch();
            }
        }
        info!(category_id = %category.id, products_unlinked = unlinked, "category deleted");
        Ok(category)
    }

    /// `id` and every category below it.
    pub fn category_with_descendants(&self, id: &str) -> HashSet<String> {
        let mut found = HashSet::from([id.to_string()]);
        loop {
            let before = found.len();
            for category in &self.categories {
                if category.parent_id.as_ref().is_some_and(|p| found.contains(p)) {
                    found.insert(category.id.clone());
                }
            }
            if found.len() == before { return found; }
        }
    }

    fn category_ref(&self, reference: &str) -> Option<String> {
        let canonical = ids::canonical(reference);
        self.categories.iter()
            .find(|c| c.id == canonical || c.slug == reference)
            .map(|c| c.id.clone())
    }

    /// Validates a parent reference; a category may not sit below itself.
    fn check_parent(&self, index: Option<usize>, parent: Option<&str>) -> Result<Option<String>> {
        let Some(parent) = parent.map(str::trim).filter(|p| !p.is_empty()) else { return Ok(None) };
        let parent_index = require(&self.categories, parent)?;
        let parent_id = self.categories[parent_index].id.clone();
        if let Some(index) = index {
            let own_id = &self.categories[index].id;
            if self.category_with_descendants(own_id).contains(&parent_id) {
                return Err(StoreError::Validation("category cannot be nested under itself".into()));
            }
        }
        Ok(Some(parent_id))
    }

    /// Ids for category references, creating categories for unknown names.
    pub(crate) fn resolve_categories(&mut self, references: &[String]) -> Vec<String> {
        let mut resolved = Vec::new();
        for reference in references.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            let id = match self.lookup_taxon(&self.categories, reference) {
                Some(id) => id,
                None => {
                    let id = ids::next_record_id(&self.categories);
                    let slug = slug::slug_for(&self.categories, None, None, reference);
                    info!(category_id = %id, name = reference, "category created from product reference");
                    self.categories.push(Category::new(id.clone(), reference, slug));
                    id
                }
            };
            if !resolved.contains(&id) { resolved.push(id); }
        }
        resolved
    }

    /// Id, then case-insensitive name, then slug.
    fn lookup_taxon<T: Slugged + Named>(&self, records: &[T], reference: &str) -> Option<String> {
        let canonical = ids::canonical(reference);
        let by_slug = slug::slugify(reference, T::KIND);
        records.iter().find(|r| r.id() == canonical)
            .or_else(|| records.iter().find(|r| r.name().eq_ignore_ascii_case(reference)))
            .or_else(|| records.iter().find(|r| r.slug() == by_slug))
            .map(|r| r.id().to_string())
    }

    // =========================================================================
    // Tags
    // =========================================================================

    pub fn create_tag(&mut self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("tag name is required".into()));
        }
        let id = self.resolve_tags(&[name.to_string()]).remove(0);
        let tag = find(&self.tags, &id).cloned().ok_or_else(|| StoreError::not_found(Tag::KIND, &id))?;
        Ok(tag)
    }

    pub fn delete_tag(&mut self, id: &str) -> Result<Tag> {
        let index = require(&self.tags, id)?;
        let tag = self.tags.remove(index);
        for product in &mut self.products {
            product.tag_ids.retain(|t| *t != tag.id);
        }
        info!(tag_id = %tag.id, "tag deleted");
        Ok(tag)
    }

    /// Removes tags that no product references. Returns how many were removed.
    pub fn prune_unused_tags(&mut self) -> usize {
        let used: HashSet<&String> = self.products.iter().flat_map(|p| &p.tag_ids).collect();
        let before = self.tags.len();
        let kept: Vec<Tag> = self.tags.iter().filter(|t| used.contains(&t.id)).cloned().collect();
        self.tags = kept;
        let removed = before - self.tags.len();
        if removed > 0 { info!(removed, "unused tags pruned"); }
        removed
    }

    pub(crate) fn resolve_tags(&mut self, references: &[String]) -> Vec<String> {
        let mut resolved = Vec::new();
        for reference in references.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            let id = match self.lookup_taxon(&self.tags, reference) {
                Some(id) => id,
                None => {
                    let id = ids::next_record_id(&self.tags);
                    let slug = slug::slug_for(&self.tags, None, None, reference);
                    debug!(tag_id = %id, name = reference, "tag created from product reference");
                    self.tags.push(Tag::new(id.clone(), reference, slug));
                    id
                }
            };
            if !resolved.contains(&id) { resolved.push(id); }
        }
        resolved
    }

    // =========================================================================
    // Media
    // =========================================================================

    pub fn media_asset(&self, id: &str) -> Option<&MediaAsset> { find(&self.media, id) }

    pub fn register_media(&mut self, input: MediaInput) -> Result<MediaAsset> {
        input.validate()?;
        let asset = MediaAsset {
            id: ids::next_record_id(&self.media),
            file_name: input.file_name.trim().to_string(),
            url: input.url.trim().to_string(),
            alt_text: non_blank(input.alt_text),
            mime_type: non_blank(input.mime_type).unwrap_or_else(|| "application/octet-stream".to_string()),
            size_bytes: input.size_bytes,
            width: input.width,
            height: input.height,
            created_at: Utc::now(),
        };
        info!(media_id = %asset.id, file = %asset.file_name, "media registered");
        self.media.push(asset.clone());
        Ok(asset)
    }

    pub fn update_media(&mut self, id: &str, input: MediaInput) -> Result<MediaAsset> {
        input.validate()?;
        let index = require(&self.media, id)?;
        let asset = &mut self.media[index];
        asset.file_name = input.file_name.trim().to_string();
        asset.url = input.url.trim().to_string();
        asset.alt_text = non_blank(input.alt_text);
        if let Some(mime) = non_blank(input.mime_type) { asset.mime_type = mime; }
        asset.size_bytes = input.size_bytes;
        asset.width = input.width;
        asset.height = input.height;
        Ok(asset.clone())
    }

    /// Deletes a media asset and removes it from every product gallery.
    pub fn delete_media(&mut self, id: &str) -> Result<MediaAsset> {
        let index = require(&self.media, id)?;
        let asset = self.media.remove(index);
        for product in &mut self.products {
            product.media_ids.retain(|m| *m != asset.id);
        }
        info!(media_id = %asset.id, "media deleted");
        Ok(asset)
    }

    /// Media assets a product shows, in gallery order.
    pub fn product_media(&self, product_id: &str) -> Vec<&MediaAsset> {
        let Some(index) = position(&self.products, product_id) else { return vec![] };
        self.products[index].media_ids.iter().filter_map(|id| find(&self.media, id)).collect()
    }
}

/// Taxonomy records looked up by display name.
pub(crate) trait Named {
    fn name(&self) -> &str;
}

impl Named for Category {
    fn name(&self) -> &str { &self.name }
}

impl Named for Tag {
    fn name(&self) -> &str { &self.name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn input(name: &str, price: i64) -> ProductInput {
        ProductInput { name: name.into(), price: Decimal::new(price, 2), status: ProductStatus::Active, track_stock: true, ..Default::default() }
    }

    #[test]
    fn test_create_product_assigns_sequential_ids_and_unique_slugs() {
        let mut store = Store::new();
        let a = store.create_product(input("Blue Shirt", 1999)).unwrap();
        let b = store.create_product(input("Blue Shirt", 2499)).unwrap();
        assert_eq!((a.id.as_str(), b.id.as_str()), ("0001", "0002"));
        assert_eq!((a.slug.as_str(), b.slug.as_str()), ("blue-shirt", "blue-shirt-2"));
        assert_eq!(a.sku, "SKU-0001");
        assert_eq!(store.take_events().len(), 2);
    }

    #[test]
    fn test_taxonomy_created_lazily_and_matched_by_name() {
        let mut store = Store::new();
        let mut first = input("Mug", 900);
        first.categories = vec!["Kitchen".into(), "kitchen".into()];
        first.tags = vec!["Gift".into()];
        let mug = store.create_product(first).unwrap();
        assert_eq!(store.categories().len(), 1);
        assert_eq!(mug.category_ids, vec!["0001".to_string()]);

        let mut second = input("Plate", 1200);
        second.categories = vec!["KITCHEN".into(), "Dining Room".into()];
        second.tags = vec!["gift".into()];
        let plate = store.create_product(second).unwrap();
        assert_eq!(plate.category_ids, vec!["0001".to_string(), "0002".to_string()]);
        assert_eq!(store.categories()[1].slug, "dining-room");
        assert_eq!(store.tags().len(), 1);
    }

    #[test]
    fn test_duplicate_sku_conflicts() {
        let mut store = Store::new();
        let mut a = input("A", 100);
        a.sku = Some("abc-1".into());
        store.create_product(a.clone()).unwrap();
        a.name = "B".into();
        assert!(matches!(store.create_product(a), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn test_price_ceiling() {
        let mut store = Store::new();
        let mut a = input("A", 100);
        a.price = max_price() + Decimal::ONE;
        assert!(matches!(store.create_product(a.clone()), Err(StoreError::Validation(_))));
        a.price = Decimal::TEN;
        a.sale_price = Some(Decimal::MAX);
        assert!(matches!(store.create_product(a.clone()), Err(StoreError::Validation(_))));
        a.sale_price = None;
        a.price = max_price();
        assert!(store.create_product(a).is_ok());
    }

    #[test]
    fn test_unknown_media_is_rejected() {
        let mut store = Store::new();
        let mut a = input("A", 100);
        a.media_ids = vec!["0009".into()];
        assert!(matches!(store.create_product(a), Err(StoreError::NotFound { .. })));
        assert!(store.products().is_empty());
    }

    #[test]
    fn test_delete_category_unlinks_and_reparents() {
        let mut store = Store::new();
        let root = store.create_category(CategoryInput { name: "Clothing".into(), ..Default::default() }).unwrap();
        let mid = store.create_category(CategoryInput { name: "Tops".into(), parent_id: Some(root.id.clone()), ..Default::default() }).unwrap();
        let leaf = store.create_category(CategoryInput { name: "Tees".into(), parent_id: Some(mid.id.clone()), ..Default::default() }).unwrap();
        let mut p = input("Tee", 1500);
        p.categories = vec![mid.id.clone()];
        let p = store.create_product(p).unwrap();

        store.delete_category(&mid.id).unwrap();
        assert_eq!(store.category(&leaf.id).unwrap().parent_id.as_deref(), Some(root.id.as_str()));
        assert!(store.product(&p.id).unwrap().category_ids.is_empty());
    }

    #[test]
    fn test_category_cycle_rejected() {
        let mut store = Store::new();
        let a = store.create_category(CategoryInput { name: "A".into(), ..Default::default() }).unwrap();
        let b = store.create_category(CategoryInput { name: "B".into(), parent_id: Some(a.id.clone()), ..Default::default() }).unwrap();
        let err = store.update_category(&a.id, CategoryInput { name: "A".into(), parent_id: Some(b.id), ..Default::default() });
        assert!(matches!(err, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_list_products_filters_and_sorts() {
        let mut store = Store::new();
        let mut cheap = input("Cheap Socks", 500);
        cheap.categories = vec!["Clothing".into()];
        store.create_product(cheap).unwrap();
        let mut pricey = input("Fancy Socks", 5000);
        pricey.sale_price = Some(Decimal::new(400, 2));
        pricey.categories = vec!["Clothing".into()];
        store.create_product(pricey).unwrap();
        let mut hidden = input("Draft Hat", 100);
        hidden.status = ProductStatus::Draft;
        store.create_product(hidden).unwrap();

        let query = ProductQuery { sort: ProductSort::PriceAsc, ..ProductQuery::storefront() };
        let page = store.list_products(&query, Utc::now());
        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Fancy Socks", "Cheap Socks"]);

        let query = ProductQuery { search: Some("SOCKS".into()), category: Some("clothing".into()), ..Default::default() };
        assert_eq!(store.list_products(&query, Utc::now()).total, 2);

        let query = ProductQuery { category: Some("nope".into()), ..Default::default() };
        assert_eq!(store.list_products(&query, Utc::now()).total, 0);
    }

    #[test]
    fn test_adjust_stock_and_low_stock_event() {
        let mut store = Store::new();
        let mut p = input("Lamp", 3000);
        p.stock = 10;
        let p = store.create_product(p).unwrap();
        store.take_events();

        assert_eq!(store.adjust_stock(&p.id, -6).unwrap().stock, 4);
        let events = store.take_events();
        assert!(matches!(events.as_slice(), [DomainEvent::Product(ProductEvent::StockLow { stock: 4, .. })]));
        assert!(matches!(store.adjust_stock(&p.id, -5), Err(StoreError::InsufficientStock { available: 4, .. })));
        assert_eq!(store.adjust_stock(&p.id, i64::MAX).unwrap().stock, u32::MAX);
        assert!(matches!(store.adjust_stock(&p.id, i64::MIN), Err(StoreError::InsufficientStock { .. })));
    }

    #[test]
    fn test_category_filter_includes_descendants() {
        let mut store = Store::new();
        let clothing = store.create_category(CategoryInput { name: "Clothing".into(), ..Default::default() }).unwrap();
        let tops = store.create_category(CategoryInput { name: "Tops".into(), parent_id: Some(clothing.id.clone()), ..Default::default() }).unwrap();
        store.create_category(CategoryInput { name: "Tees".into(), parent_id: Some(tops.id.clone()), ..Default::default() }).unwrap();
        let mut tee = input("Plain Tee", 1500);
        tee.categories = vec!["tees".into()];
        store.create_product(tee).unwrap();
        let mut mug = input("Mug", 900);
        mug.categories = vec!["Kitchen".into()];
        store.create_product(mug).unwrap();

        let by_root = ProductQuery { category: Some("clothing".into()), ..Default::default() };
        let page = store.list_products(&by_root, Utc::now());
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Plain Tee");

        let by_id = ProductQuery { category: Some("2".into()), ..Default::default() };
        assert_eq!(store.list_products(&by_id, Utc::now()).total, 1);
        let by_leaf_sibling = ProductQuery { category: Some("kitchen".into()), ..Default::default() };
        assert_eq!(store.list_products(&by_leaf_sibling, Utc::now()).items[0].name, "Mug");
    }

    #[test]
    fn test_tag_filter_by_slug_and_id() {
        let mut store = Store::new();
        let mut lamp = input("Lamp", 3000);
        lamp.tags = vec!["Gift Ideas".into()];
        store.create_product(lamp).unwrap();
        store.create_product(input("Chair", 9000)).unwrap();

        let by_slug = ProductQuery { tag: Some("gift-ideas".into()), ..Default::default() };
        let page = store.list_products(&by_slug, Utc::now());
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Lamp");
        let by_id = ProductQuery { tag: Some("1".into()), ..Default::default() };
        assert_eq!(store.list_products(&by_id, Utc::now()).total, 1);
        let unknown = ProductQuery { tag: Some("nope".into()), ..Default::default() };
        assert_eq!(store.list_products(&unknown, Utc::now()).total, 0);
    }

    #[test]
    fn test_huge_page_number_is_empty() {
        let mut store = Store::new();
        store.create_product(input("Lamp", 3000)).unwrap();
        let query = ProductQuery { page: Some(usize::MAX), ..Default::default() };
        let page = store.list_products(&query, Utc::now());
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_delete_media_and_tags_clear_references() {
        let mut store = Store::new();
        let media = store.register_media(MediaInput { file_name: "a.png".into(), url: "/uploads/a.png".into(), mime_type: Some("image/png".into()), ..Default::default() }).unwrap();
        let mut p = input("Poster", 1000);
        p.media_ids = vec![media.id.clone()];
        p.tags = vec!["Art".into(), "Print".into()];
        let p = store.create_product(p).unwrap();
        assert_eq!(store.product_media(&p.id).len(), 1);

        store.delete_media(&media.id).unwrap();
        assert!(store.product(&p.id).unwrap().media_ids.is_empty());

        store.delete_tag("0001").unwrap();
        assert_eq!(store.product(&p.id).unwrap().tag_ids, vec!["0002".to_string()]);
        store.create_tag("Unused").unwrap();
        assert_eq!(store.prune_unused_tags(), 1);
    }
}
