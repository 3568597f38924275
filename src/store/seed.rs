//! Demo catalog for local development.

use rust_decimal::Decimal;
use tracing::info;

use super::Store;
use crate::domain::aggregates::*;
use crate::Result;

/// Seeds a small catalog, a coupon, an about page and an admin user.
///
/// Does nothing unless the store has no products and no users. Returns
/// whether anything was seeded.
pub fn seed_demo(store: &mut Store) -> Result<bool> {
    if !store.products.is_empty() || !store.users.is_empty() {
        return Ok(false);
    }

    store.create_user(UserInput {
        email: "admin@example.com".into(),
        name: "Store Admin".into(),
        role: Role::Admin,
        active: true,
        password_hash: None,
    })?;

    let apparel = store.create_category(CategoryInput { name: "Apparel".into(), ..Default::default() })?;
    store.create_category(CategoryInput { name: "T-Shirts".into(), parent_id: Some(apparel.id), ..Default::default() })?;

    let catalog = [
        ("Classic Tee", 2500, Some(1999), 40, "T-Shirts", vec!["cotton", "bestseller"]),
        ("Heavyweight Hoodie", 6500, None, 12, "Apparel", vec!["cotton"]),
        ("Canvas Tote", 1800, None, 3, "Accessories", vec!["gift"]),
    ];
    for (name, cents, sale_cents, stock, category, tags) in catalog {
        store.create_product(ProductInput {
            name: name.into(),
            price: Decimal::new(cents, 2),
            sale_price: sale_cents.map(|c| Decimal::new(c, 2)),
            stock,
            track_stock: true,
            status: ProductStatus::Active,
            featured: sale_cents.is_some(),
            categories: vec![category.into()],
            tags: tags.into_iter().map(String::from).collect(),
            ..Default::default()
        })?;
    }

    store.create_coupon(CouponInput {
        code: "WELCOME10".into(),
        kind: CouponKind::Percentage,
        value: Decimal::TEN,
        active: true,
        ..Default::default()
    })?;

    store.create_page(PageInput {
        title: "About Us".into(),
        content: "We make simple, durable basics.".into(),
        status: PageStatus::Published,
        show_in_nav: true,
        ..Default::default()
    })?;

    // Seeding is not business activity.
    store.take_events();
    info!(products = store.products.len(), "demo catalog seeded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_only_fills_empty_store() {
        let mut store = Store::new();
        assert!(seed_demo(&mut store).unwrap());
        assert_eq!(store.products().len(), 3);
        assert_eq!(store.categories().len(), 3);
        assert!(store.coupon_by_code("welcome10").is_some());
        assert!(store.take_events().is_empty());

        assert!(!seed_demo(&mut store).unwrap());
        assert_eq!(store.products().len(), 3);
    }
}
