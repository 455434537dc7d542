//! Shopping cart: line items, the cart collection and change notifications.
//!
//! A [`Cart`] is plain data and can be stored in a session. A [`CartStore`]
//! owns a cart and notifies subscribers after every mutation that actually
//! changed it, so views can re-render.

use core::fmt;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Errors that can occur when building a [`CartLineItem`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantity must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Unit price cannot be negative.
    #[error("unit price cannot be negative (got {0})")]
    NegativePrice(Decimal),
    /// Adding to an existing line overflowed its quantity.
    #[error("quantity overflow for line {0}")]
    QuantityOverflow(LineItemKey),
    /// A line total or the cart subtotal does not fit in a `Decimal`.
    #[error("cart amount is too large")]
    AmountOverflow,
}

/// Uniqueness key of a line item: product plus selected variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineItemKey {
    pub id: ProductId,
    pub size: String,
    pub color: String,
}

impl LineItemKey {
    /// Create a new key.
    #[must_use]
    pub fn new(id: ProductId, size: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            size: size.into(),
            color: color.into(),
        }
    }
}

impl fmt::Display for LineItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.id, self.size, self.color)
    }
}

/// One distinct product variant (size and colour) and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineItemRecord")]
pub struct CartLineItem {
    pub id: ProductId,
    pub name: String,
    /// Unit price in the shop currency's major unit.
    pub unit_price: Decimal,
    quantity: u32,
    pub selected_size: String,
    /// Also the lookup key into `images`.
    pub selected_color: String,
    /// Colour name to image reference.
    pub images: BTreeMap<String, String>,
}

impl CartLineItem {
    /// Create a line item.
    ///
    /// # Errors
    ///
    /// Returns an error if `quantity` is zero, `unit_price` is negative, or
    /// `unit_price × quantity` does not fit in a `Decimal`.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
        selected_size: impl Into<String>,
        selected_color: impl Into<String>,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(CartError::NegativePrice(unit_price));
        }
        unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or(CartError::AmountOverflow)?;

        Ok(Self {
            id,
            name: name.into(),
            unit_price,
            quantity,
            selected_size: selected_size.into(),
            selected_color: selected_color.into(),
            images: BTreeMap::new(),
        })
    }

    /// Attach a colour-to-image mapping.
    #[must_use]
    pub fn with_images(mut self, images: BTreeMap<String, String>) -> Self {
        self.images = images;
        self
    }

    /// Quantity of this line (always at least one).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// The line's uniqueness key.
    #[must_use]
    pub fn key(&self) -> LineItemKey {
        LineItemKey::new(self.id, &self.selected_size, &self.selected_color)
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Image for the selected colour, falling back to the first mapped image.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.images
            .get(&self.selected_color)
            .or_else(|| self.images.values().next())
            .map(String::as_str)
    }

    fn matches(&self, key: &LineItemKey) -> bool {
        self.id == key.id && self.selected_size == key.size && self.selected_color == key.color
    }
}

/// Unvalidated wire form of a [`CartLineItem`].
#[derive(Deserialize)]
struct LineItemRecord {
    id: ProductId,
    name: String,
    unit_price: Decimal,
    quantity: u32,
    selected_size: String,
    selected_color: String,
    #[serde(default)]
    images: BTreeMap<String, String>,
}

impl TryFrom<LineItemRecord> for CartLineItem {
    type Error = CartError;

    fn try_from(record: LineItemRecord) -> Result<Self, Self::Error> {
        Ok(Self::new(
            record.id,
            record.name,
            record.unit_price,
            record.quantity,
            record.selected_size,
            record.selected_color,
        )?
        .with_images(record.images))
    }
}

/// What a cart mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A new line was appended.
    Added(LineItemKey),
    /// An existing line's quantity grew to `quantity`.
    QuantityIncreased { key: LineItemKey, quantity: u32 },
    /// A line was removed.
    Removed(LineItemKey),
    /// All lines were removed.
    Cleared,
}

/// Ordered collection of line items, unique by [`LineItemKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartLineItem>", into = "Vec<CartLineItem>")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Look up a line by key.
    #[must_use]
    pub fn get(&self, key: &LineItemKey) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.matches(key))
    }

    /// Add a line, merging quantities with an existing line of the same key.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if the merged quantity does not
    /// fit in a `u32`, or [`CartError::AmountOverflow`] if the merged line
    /// total or the cart subtotal would not fit in a `Decimal`. The cart is
    /// left unchanged in either case.
    pub fn add(&mut self, item: CartLineItem) -> Result<CartEvent, CartError> {
        let key = item.key();
        let current = crate::pricing::subtotal(&self.items);

        if let Some(existing) = self.items.iter_mut().find(|line| line.matches(&key)) {
            let quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or_else(|| CartError::QuantityOverflow(key.clone()))?;
            existing
                .unit_price
                .checked_mul(Decimal::from(quantity))
                .and_then(|line_total| (current - existing.line_total()).checked_add(line_total))
                .ok_or(CartError::AmountOverflow)?;
            existing.quantity = quantity;
            return Ok(CartEvent::QuantityIncreased { key, quantity });
        }

        current
            .checked_add(item.line_total())
            .ok_or(CartError::AmountOverflow)?;
        self.items.push(item);
        Ok(CartEvent::Added(key))
    }

    /// Remove the line with `key`. Removing an absent key is a no-op.
    ///
    /// Returns `true` if a line was removed.
    pub fn remove(&mut self, key: &LineItemKey) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !item.matches(key));
        self.items.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl TryFrom<Vec<CartLineItem>> for Cart {
    type Error = CartError;

    /// Builds a cart from a list, merging lines that share a key.
    fn try_from(items: Vec<CartLineItem>) -> Result<Self, Self::Error> {
        let mut cart = Self::new();
        for item in items {
            cart.add(item)?;
        }
        Ok(cart)
    }
}

impl From<Cart> for Vec<CartLineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&CartEvent, &Cart) + Send + Sync>;

/// A cart plus the subscribers interested in its changes.
///
/// Listeners run synchronously after the mutation, in subscription order.
#[derive(Default)]
pub struct CartStore {
    cart: Cart,
    revision: u64,
    next_subscription: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl CartStore {
    /// Wrap an existing cart.
    #[must_use]
    pub fn new(cart: Cart) -> Self {
        Self {
            cart,
            ..Self::default()
        }
    }

    /// Read the current cart.
    #[must_use]
    pub const fn read(&self) -> &Cart {
        &self.cart
    }

    /// Number of effective mutations since the store was created.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Consume the store and return the cart.
    #[must_use]
    pub fn into_cart(self) -> Cart {
        self.cart
    }

    /// Register a listener for cart changes.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&CartEvent, &Cart) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Add a line item and notify subscribers.
    ///
    /// # Errors
    ///
    /// Propagates overflow errors from [`Cart::add`].
    pub fn add(&mut self, item: CartLineItem) -> Result<(), CartError> {
        let event = self.cart.add(item)?;
        self.publish(&event);
        Ok(())
    }

    /// Remove a line item. Subscribers are only notified if something was removed.
    pub fn remove(&mut self, key: &LineItemKey) -> bool {
        let removed = self.cart.remove(key);
        if removed {
            self.publish(&CartEvent::Removed(key.clone()));
        }
        removed
    }

    /// Empty the cart. Subscribers are only notified if it held anything.
    pub fn clear(&mut self) {
        if !self.cart.is_empty() {
            self.cart.clear();
            self.publish(&CartEvent::Cleared);
        }
    }

    fn publish(&mut self, event: &CartEvent) {
        self.revision += 1;
        for (_, listener) in &self.listeners {
            listener(event, &self.cart);
        }
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rust_decimal_macros::dec;

    use super::*;

    fn jar(id: i32, size: &str, color: &str) -> CartLineItem {
        CartLineItem::new(
            ProductId::new(id),
            "Miel de Litchi",
            dec!(25000),
            1,
            size,
            color,
        )
        .unwrap()
    }

    fn populated() -> Cart {
        let mut cart = Cart::new();
        cart.add(jar(1, "Bocal", "gray")).unwrap();
        cart.add(jar(2, "Bouteille", "green")).unwrap();
        cart.add(jar(3, "Bocal", "blue")).unwrap();
        cart
    }

    #[test]
    fn test_new_rejects_zero_quantity() {
        let result = CartLineItem::new(ProductId::new(1), "x", dec!(1), 0, "Bocal", "gray");
        assert_eq!(result, Err(CartError::ZeroQuantity));
    }

    #[test]
    fn test_new_rejects_negative_price() {
        let result = CartLineItem::new(ProductId::new(1), "x", dec!(-1), 1, "Bocal", "gray");
        assert!(matches!(result, Err(CartError::NegativePrice(_))));
    }

    #[test]
    fn test_line_total() {
        let item =
            CartLineItem::new(ProductId::new(1), "x", dec!(25000), 2, "Bocal", "gray").unwrap();
        assert_eq!(item.line_total(), dec!(50000));
    }

    #[test]
    fn test_image_prefers_selected_color() {
        let images = BTreeMap::from([
            ("gray".to_string(), "/products/litchi-gray.png".to_string()),
            ("purple".to_string(), "/products/litchi-purple.png".to_string()),
        ]);
        let item = jar(1, "Bocal", "purple").with_images(images);
        assert_eq!(item.image(), Some("/products/litchi-purple.png"));
    }

    #[test]
    fn test_image_falls_back_to_first() {
        let images = BTreeMap::from([("gray".to_string(), "/products/litchi.png".to_string())]);
        let item = jar(1, "Bocal", "pink").with_images(images);
        assert_eq!(item.image(), Some("/products/litchi.png"));
        assert_eq!(jar(1, "Bocal", "pink").image(), None);
    }

    #[test]
    fn test_variants_are_distinct_lines() {
        let mut cart = Cart::new();
        cart.add(jar(1, "Bocal", "gray")).unwrap();
        cart.add(jar(1, "Bouteille", "gray")).unwrap();
        cart.add(jar(1, "Bocal", "purple")).unwrap();
        assert_eq!(cart.len(), 3);
    }

    #[test]
    fn test_add_same_key_merges_quantity() {
        let mut cart = Cart::new();
        cart.add(jar(1, "Bocal", "gray")).unwrap();
        let event = cart.add(jar(1, "Bocal", "gray")).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity(), 2);
        assert_eq!(
            event,
            CartEvent::QuantityIncreased {
                key: LineItemKey::new(ProductId::new(1), "Bocal", "gray"),
                quantity: 2,
            }
        );
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_add_overflow_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        let big = CartLineItem::new(ProductId::new(1), "x", dec!(1), u32::MAX, "Bocal", "gray")
            .unwrap();
        cart.add(big).unwrap();
        let before = cart.clone();

        let result = cart.add(jar(1, "Bocal", "gray"));
        assert!(matches!(result, Err(CartError::QuantityOverflow(_))));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_new_rejects_line_total_overflow() {
        let result = CartLineItem::new(ProductId::new(1), "x", Decimal::MAX, 2, "Bocal", "gray");
        assert_eq!(result, Err(CartError::AmountOverflow));
    }

    #[test]
    fn test_add_rejects_subtotal_overflow() {
        let mut cart = Cart::new();
        let max = CartLineItem::new(ProductId::new(1), "x", Decimal::MAX, 1, "Bocal", "gray")
            .unwrap();
        cart.add(max.clone()).unwrap();
        let before = cart.clone();

        // Merging doubles the line total.
        assert_eq!(cart.add(max), Err(CartError::AmountOverflow));
        // A new line pushes the subtotal past the bound.
        assert_eq!(cart.add(jar(2, "Bocal", "gray")), Err(CartError::AmountOverflow));
        assert_eq!(cart, before);
        assert_eq!(crate::pricing::subtotal(cart.items()), Decimal::MAX);
    }

    #[test]
    fn test_deserialize_rejects_amount_overflow() {
        let json = r#"[{"id":1,"name":"x","unit_price":"79228162514264337593543950335","quantity":2,
            "selected_size":"Bocal","selected_color":"gray"}]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }

    #[test]
    fn test_remove_present_key_preserves_order() {
        let mut cart = populated();
        let removed = cart.remove(&LineItemKey::new(ProductId::new(2), "Bouteille", "green"));

        assert!(removed);
        assert_eq!(cart.len(), 2);
        let ids: Vec<i32> = cart.items().iter().map(|i| i.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let mut cart = populated();
        let before = cart.clone();

        // Same product, different variant.
        let removed = cart.remove(&LineItemKey::new(ProductId::new(2), "Bocal", "green"));

        assert!(!removed);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_twice_is_idempotent() {
        let mut cart = populated();
        let key = LineItemKey::new(ProductId::new(1), "Bocal", "gray");
        assert!(cart.remove(&key));
        assert!(!cart.remove(&key));
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_cart_serde_is_a_list() {
        let cart = populated();
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        let parsed: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, cart);
    }

    #[test]
    fn test_deserialize_rejects_zero_quantity() {
        let json = r#"[{"id":1,"name":"x","unit_price":"25000","quantity":0,
            "selected_size":"Bocal","selected_color":"gray"}]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }

    #[test]
    fn test_deserialize_merges_duplicate_lines() {
        let json = r#"[
            {"id":1,"name":"x","unit_price":"25000","quantity":1,"selected_size":"Bocal","selected_color":"gray"},
            {"id":1,"name":"x","unit_price":"25000","quantity":2,"selected_size":"Bocal","selected_color":"gray"}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_store_notifies_on_effective_mutations_only() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut store = CartStore::new(populated());
        let sink = Arc::clone(&events);
        store.subscribe(move |event, _| sink.lock().unwrap().push(event.clone()));

        let key = LineItemKey::new(ProductId::new(3), "Bocal", "blue");
        assert!(store.remove(&key));
        assert!(!store.remove(&key));

        let events = events.lock().unwrap();
        assert_eq!(events.as_slice(), &[CartEvent::Removed(key)]);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_store_listener_sees_updated_cart() {
        let lens = Arc::new(Mutex::new(Vec::new()));
        let mut store = CartStore::default();
        let sink = Arc::clone(&lens);
        store.subscribe(move |_, cart| sink.lock().unwrap().push(cart.len()));

        store.add(jar(1, "Bocal", "gray")).unwrap();
        store.add(jar(2, "Bocal", "gray")).unwrap();
        store.clear();
        store.clear();

        assert_eq!(lens.lock().unwrap().as_slice(), &[1, 2, 0]);
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let count = Arc::new(Mutex::new(0));
        let mut store = CartStore::default();
        let sink = Arc::clone(&count);
        let id = store.subscribe(move |_, _| *sink.lock().unwrap() += 1);

        store.add(jar(1, "Bocal", "gray")).unwrap();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add(jar(2, "Bocal", "gray")).unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(store.revision(), 2);
    }
}
