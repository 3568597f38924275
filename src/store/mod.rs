//! The embedded store.
//!
//! [`Store`] holds every collection in memory and implements the CRUD and
//! query operations. Each operation leaves the store normalized, so readers
//! never have to repair data. [`ShopStore`] wraps a `Store` for concurrent
//! use and persists it to a JSON file.

mod admin;
mod catalog;
mod commerce;
mod content;
pub mod ids;
mod normalize;
pub mod persist;
pub mod seed;
mod shared;
pub mod slug;

pub use admin::DashboardStats;
pub use catalog::{ProductQuery, ProductSort};
pub use commerce::OrderQuery;
pub use normalize::NormalizeReport;
pub use shared::ShopStore;

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::*;
use crate::domain::events::DomainEvent;
use crate::{Result, StoreError};

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;

/// All collections plus site settings; this is also the on-disk document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub(crate) settings: SiteSettings,
    pub(crate) products: Vec<Product>,
    pub(crate) categories: Vec<Category>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) media: Vec<MediaAsset>,
    pub(crate) coupons: Vec<Coupon>,
    pub(crate) orders: Vec<Order>,
    pub(crate) reviews: Vec<Review>,
    pub(crate) users: Vec<User>,
    pub(crate) pages: Vec<Page>,
    pub(crate) tickets: Vec<SupportTicket>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// One page of a listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

impl<T> Paginated<T> {
    /// Slices `items` to the requested page. Page numbers start at 1.
    pub fn from_vec(items: Vec<T>, page: Option<usize>, per_page: Option<usize>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let total = items.len();
        let skip = (page - 1).saturating_mul(per_page);
        let items = items.into_iter().skip(skip).take(per_page).collect();
        Self { items, total, page, per_page }
    }

    pub fn total_pages(&self) -> usize { self.total.div_ceil(self.per_page) }
}

impl Store {
    pub fn new() -> Self { Self::default() }

    pub fn settings(&self) -> &SiteSettings { &self.settings }
    pub fn products(&self) -> &[Product] { &self.products }
    pub fn categories(&self) -> &[Category] { &self.categories }
    pub fn tags(&self) -> &[Tag] { &self.tags }
    pub fn media(&self) -> &[MediaAsset] { &self.media }
    pub fn coupons(&self) -> &[Coupon] { &self.coupons }
    pub fn orders(&self) -> &[Order] { &self.orders }
    pub fn reviews(&self) -> &[Review] { &self.reviews }
    pub fn users(&self) -> &[User] { &self.users }
    pub fn pages(&self) -> &[Page] { &self.pages }
    pub fn tickets(&self) -> &[SupportTicket] { &self.tickets }

    /// Drains the events raised since the last call.
    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    pub(crate) fn raise_event(&mut self, event: DomainEvent) { self.events.push(event); }
}

/// Index of the record with `id`, accepting unpadded ids.
pub(crate) fn position<T: Record>(records: &[T], id: &str) -> Option<usize> {
    let id = ids::canonical(id);
    records.iter().position(|r| r.id() == id)
}

pub(crate) fn find<'a, T: Record>(records: &'a [T], id: &str) -> Option<&'a T> {
    position(records, id).map(|i| &records[i])
}

pub(crate) fn require<T: Record>(records: &[T], id: &str) -> Result<usize> {
    position(records, id).ok_or_else(|| StoreError::not_found(T::KIND, id))
}

pub(crate) fn contains<T: Record>(records: &[T], id: &str) -> bool {
    records.iter().any(|r| r.id() == id)
}
