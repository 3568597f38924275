//! Aggregates module
pub mod cart;
pub mod coupon;
pub mod media;
pub mod order;
pub mod page;
pub mod product;
pub mod review;
pub mod settings;
pub mod taxonomy;
pub mod ticket;
pub mod user;

pub use cart::{Cart, CartItem, CheckoutQuote, CheckoutRequest};
pub use coupon::{Coupon, CouponInput, CouponKind, CouponRejection};
pub use media::{MediaAsset, MediaInput};
pub use order::{Address, Order, OrderError, OrderItem, OrderStatus, PaymentStatus};
pub use page::{Page, PageInput, PageStatus};
pub use product::{Product, ProductInput, ProductStatus};
pub use review::{RatingSummary, Review, ReviewInput, ReviewStatus};
pub use settings::SiteSettings;
pub use taxonomy::{Category, CategoryInput, Tag};
pub use ticket::{SupportTicket, TicketInput, TicketMessage, TicketPriority, TicketReply, TicketStatus};
pub use user::{Permission, Role, User, UserInput};

/// A stored record with a sequential id.
pub trait Record {
    /// Entity name used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn id_mut(&mut self) -> &mut String;
}

/// A record addressable by a unique slug.
pub trait Slugged: Record {
    fn slug(&self) -> &str;
    fn slug_mut(&mut self) -> &mut String;
    /// Text the slug is derived from when none is given.
    fn slug_source(&self) -> &str;
}

macro_rules! impl_record {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(impl Record for $ty {
            const KIND: &'static str = $kind;
            fn id(&self) -> &str { &self.id }
            fn id_mut(&mut self) -> &mut String { &mut self.id }
        })*
    };
}

macro_rules! impl_slugged {
    ($($ty:ty => $source:ident),* $(,)?) => {
        $(impl Slugged for $ty {
            fn slug(&self) -> &str { &self.slug }
            fn slug_mut(&mut self) -> &mut String { &mut self.slug }
            fn slug_source(&self) -> &str { &self.$source }
        })*
    };
}

impl_record! {
    Product => "product",
    Category => "category",
    Tag => "tag",
    MediaAsset => "media",
    Coupon => "coupon",
    Order => "order",
    Review => "review",
    User => "user",
    Page => "page",
    SupportTicket => "ticket",
}

impl_slugged! {
    Product => name,
    Category => name,
    Tag => name,
    Page => title,
}
