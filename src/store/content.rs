//! Pages, reviews and support tickets.

use chrono::Utc;
use tracing::{debug, info};
use validator::Validate;

use super::{find, ids, require, slug, Store};
use crate::domain::aggregates::*;
use crate::domain::events::{DomainEvent, ReviewEvent, TicketEvent};
use crate::domain::value_objects::{non_blank, Email, Rating};
use crate::{Result, StoreError};

impl Store {
    // =========================================================================
    // Pages
    // =========================================================================

    pub fn page(&self, id: &str) -> Option<&Page> { find(&self.pages, id) }

    pub fn page_by_slug(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    /// A page as the storefront sees it: published only.
    pub fn published_page(&self, slug: &str) -> Option<&Page> {
        self.page_by_slug(slug).filter(|p| p.is_published())
    }

    /// Published pages flagged for navigation, by title.
    pub fn published_pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.pages.iter().filter(|p| p.is_published() && p.show_in_nav).collect();
        pages.sort_by_key(|p| p.title.to_lowercase());
        pages
    }

    pub fn create_page(&mut self, input: PageInput) -> Result<Page> {
        input.validate()?;
        let now = Utc::now();
        let page = Page {
            id: ids::next_record_id(&self.pages),
            title: input.title.trim().to_string(),
            slug: slug::slug_for(&self.pages, None, input.slug.as_deref(), &input.title),
            content: input.content,
            status: input.status,
            show_in_nav: input.show_in_nav,
            seo_title: non_blank(input.seo_title),
            seo_description: non_blank(input.seo_description),
            created_at: now,
            updated_at: now,
        };
        info!(page_id = %page.id, slug = %page.slug, "page created");
        self.pages.push(page.clone());
        Ok(page)
    }

    pub fn update_page(&mut self, id: &str, input: PageInput) -> Result<Page> {
        input.validate()?;
        let index = require(&self.pages, id)?;
        let slug = match non_blank(input.slug.clone()) {
            Some(requested) => slug::slug_for(&self.pages, Some(index), Some(&requested), &input.title),
            None => self.pages[index].slug.clone(),
        };
        let page = &mut self.pages[index];
        page.title = input.title.trim().to_string();
        page.slug = slug;
        page.content = input.content;
        page.status = input.status;
        page.show_in_nav = input.show_in_nav;
        page.seo_title = non_blank(input.seo_title);
        page.seo_description = non_blank(input.seo_description);
        page.updated_at = Utc::now();
        Ok(page.clone())
    }

    pub fn delete_page(&mut self, id: &str) -> Result<Page> {
        let index = require(&self.pages, id)?;
        let page = self.pages.remove(index);
        info!(page_id = %page.id, "page deleted");
        Ok(page)
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    pub fn review(&self, id: &str) -> Option<&Review> { find(&self.reviews, id) }

    /// Records a review awaiting moderation.
    pub fn submit_review(&mut self, product_id: &str, input: ReviewInput) -> Result<Review> {
        input.validate()?;
        let product_id = self.products[require(&self.products, product_id)?].id.clone();
        let user_id = match non_blank(input.user_id) {
            Some(id) => Some(find(&self.users, &id).ok_or_else(|| StoreError::not_found(User::KIND, &id))?.id.clone()),
            None => None,
        };
        let review = Review {
            id: ids::next_record_id(&self.reviews),
            product_id,
            user_id,
            author_name: input.author_name.trim().to_string(),
            rating: Rating::clamped(input.rating),
            title: non_blank(input.title),
            body: input.body.trim().to_string(),
            status: ReviewStatus::Pending,
            created_at: Utc::now(),
        };
        debug!(review_id = %review.id, product_id = %review.product_id, "review submitted");
        self.raise_event(DomainEvent::Review(ReviewEvent::Submitted { review_id: review.id.clone(), product_id: review.product_id.clone() }));
        self.reviews.push(review.clone());
        Ok(review)
    }

    pub fn moderate_review(&mut self, id: &str, status: ReviewStatus) -> Result<Review> {
        let index = require(&self.reviews, id)?;
        let review = &mut self.reviews[index];
        review.status = status;
        info!(review_id = %review.id, ?status, "review moderated");
        Ok(review.clone())
    }

    pub fn delete_review(&mut self, id: &str) -> Result<Review> {
        let index = require(&self.reviews, id)?;
        Ok(self.reviews.remove(index))
    }

    /// Reviews of a product, newest first. `approved_only` hides pending and rejected ones.
    pub fn product_reviews(&self, product_id: &str, approved_only: bool) -> Vec<&Review> {
        let product_id = ids::canonical(product_id);
        let mut reviews: Vec<&Review> = self.reviews.iter()
            .filter(|r| r.product_id == product_id)
            .filter(|r| !approved_only || r.status == ReviewStatus::Approved)
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        reviews
    }

    pub fn product_rating(&self, product_id: &str) -> RatingSummary {
        RatingSummary::from_ratings(self.product_reviews(product_id, true).into_iter().map(|r| r.rating))
    }

    pub fn pending_reviews(&self) -> Vec<&Review> {
        self.reviews.iter().filter(|r| r.status == ReviewStatus::Pending).collect()
    }

    // =========================================================================
    // Support tickets
    // =========================================================================

    pub fn ticket(&self, id: &str) -> Option<&SupportTicket> { find(&self.tickets, id) }

    pub fn open_ticket(&mut self, input: TicketInput) -> Result<SupportTicket> {
        input.validate()?;
        let email = Email::parse(&input.email).map_err(|e| StoreError::Validation(e.to_string()))?;
        let user_id = match non_blank(input.user_id) {
            Some(id) => Some(find(&self.users, &id).ok_or_else(|| StoreError::not_found(User::KIND, &id))?.id.clone()),
            None => None,
        };
        let order_id = match non_blank(input.order_id) {
            Some(id) => Some(find(&self.orders, &id).ok_or_else(|| StoreError::not_found(Order::KIND, &id))?.id.clone()),
            None => None,
        };
        let now = Utc::now();
        let name = input.name.trim().to_string();
        let ticket = SupportTicket {
            id: ids::next_record_id(&self.tickets),
            subject: input.subject.trim().to_string(),
            email: email.into_string(),
            name: name.clone(),
            user_id,
            order_id,
            status: TicketStatus::Open,
            priority: input.priority,
            messages: vec![TicketMessage { author: name, body: input.message.trim().to_string(), staff: false, created_at: now }],
            created_at: now,
            updated_at: now,
        };
        info!(ticket_id = %ticket.id, priority = ?ticket.priority, "ticket opened");
        self.raise_event(DomainEvent::Ticket(TicketEvent::Opened { ticket_id: ticket.id.clone(), priority: ticket.priority }));
        self.tickets.push(ticket.clone());
        Ok(ticket)
    }

    pub fn reply_ticket(&mut self, id: &str, reply: TicketReply) -> Result<SupportTicket> {
        reply.validate()?;
        let index = require(&self.tickets, id)?;
        let ticket = &mut self.tickets[index];
        if ticket.status == TicketStatus::Closed {
            return Err(StoreError::Conflict(format!("ticket {} is closed", ticket.id)));
        }
        ticket.add_reply(&reply);
        let ticket = ticket.clone();
        self.raise_event(DomainEvent::Ticket(TicketEvent::Replied { ticket_id: ticket.id.clone(), staff: reply.staff }));
        Ok(ticket)
    }

    pub fn set_ticket_status(&mut self, id: &str, status: TicketStatus) -> Result<SupportTicket> {
        let index = require(&self.tickets, id)?;
        let ticket = &mut self.tickets[index];
        ticket.status = status;
        ticket.updated_at = Utc::now();
        debug!(ticket_id = %ticket.id, ?status, "ticket status set");
        Ok(ticket.clone())
    }

    /// Tickets, optionally only open/pending ones, most urgent then oldest first.
    pub fn list_tickets(&self, open_only: bool) -> Vec<&SupportTicket> {
        let mut tickets: Vec<&SupportTicket> = self.tickets.iter().filter(|t| !open_only || t.is_open()).collect();
        tickets.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.created_at.cmp(&b.created_at)));
        tickets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn page(title: &str, status: PageStatus) -> PageInput {
        PageInput { title: title.into(), content: "Hello".into(), status, show_in_nav: true, ..Default::default() }
    }

    #[test]
    fn test_pages_have_unique_slugs_and_published_filter() {
        let mut store = Store::new();
        let about = store.create_page(page("About Us", PageStatus::Published)).unwrap();
        let draft = store.create_page(page("About Us", PageStatus::Draft)).unwrap();
        assert_eq!(about.slug, "about-us");
        assert_eq!(draft.slug, "about-us-2");
        assert!(store.published_page("about-us-2").is_none());
        assert_eq!(store.published_pages().len(), 1);

        let renamed = store.update_page(&draft.id, PageInput { slug: Some("About Us".into()), ..page("About", PageStatus::Published) }).unwrap();
        assert_eq!(renamed.slug, "about-us-2");
    }

    #[test]
    fn test_reviews_are_moderated_before_counting() {
        let mut store = Store::new();
        let product = store.create_product(ProductInput { name: "Pen".into(), price: Decimal::ONE, ..Default::default() }).unwrap();
        let review = |rating| ReviewInput { author_name: "Ann".into(), rating, body: "Nice".into(), ..Default::default() };
        let first = store.submit_review(&product.id, review(5)).unwrap();
        let second = store.submit_review(&product.id, review(2)).unwrap();
        assert_eq!(store.product_rating(&product.id).count, 0);

        store.moderate_review(&first.id, ReviewStatus::Approved).unwrap();
        store.moderate_review(&second.id, ReviewStatus::Approved).unwrap();
        let rating = store.product_rating(&product.id);
        assert_eq!((rating.count, rating.average), (2, 3.5));

        store.delete_product(&product.id).unwrap();
        assert!(store.reviews().is_empty());
    }

    #[test]
    fn test_out_of_range_ratings_are_clamped() {
        let mut store = Store::new();
        let product = store.create_product(ProductInput { name: "Pen".into(), price: Decimal::ONE, ..Default::default() }).unwrap();
        let review = |rating| ReviewInput { author_name: "Ann".into(), rating, body: "Nice".into(), ..Default::default() };
        let high = store.submit_review(&product.id, review(9)).unwrap();
        let low = store.submit_review(&product.id, review(0)).unwrap();
        assert_eq!(high.rating.value(), 5);
        assert_eq!(low.rating.value(), 1);
    }

    #[test]
    fn test_review_for_unknown_product() {
        let mut store = Store::new();
        let input = ReviewInput { author_name: "Ann".into(), rating: 4, body: "Nice".into(), ..Default::default() };
        assert!(matches!(store.submit_review("0001", input), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_ticket_lifecycle() {
        let mut store = Store::new();
        let ticket = store.open_ticket(TicketInput {
            subject: "Where is my order?".into(), email: "ANN@example.com".into(), name: "Ann".into(),
            message: "It has been a week".into(), priority: TicketPriority::High, ..Default::default()
        }).unwrap();
        assert_eq!(ticket.email, "ann@example.com");
        assert_eq!(ticket.messages.len(), 1);

        let replied = store.reply_ticket(&ticket.id, TicketReply { author: "Support".into(), body: "Shipped today".into(), staff: true }).unwrap();
        assert_eq!(replied.status, TicketStatus::Pending);
        assert_eq!(store.list_tickets(true).len(), 1);

        store.set_ticket_status(&ticket.id, TicketStatus::Closed).unwrap();
        assert!(store.list_tickets(true).is_empty());
        let err = store.reply_ticket(&ticket.id, TicketReply { author: "Ann".into(), body: "?".into(), staff: false });
        assert!(matches!(err, Err(StoreError::Conflict(_))));
    }
}
