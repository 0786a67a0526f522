//! Client-held cart state: an ordered list of pending purchase intents,
//! durable across navigation through a single-key store.
//!
//! Line items carry a generated stable id so removal targets the item the
//! user actually saw; positional removal races with concurrent re-renders.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::order::{NewOrder, OrderItem};
use crate::domain::product::{Product, ProductId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemId(pub String);

impl LineItemId {
    fn generate() -> Self {
        Self(format!("LINE-{}", &Uuid::new_v4().simple().to_string()[..12]))
    }
}

/// One pending purchase intent. Name and price are snapshotted from the
/// product at add time so the cart renders without re-fetching the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    #[serde(rename = "lineId")]
    pub line_id: LineItemId,
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(rename = "from")]
    pub sender: String,
    #[serde(rename = "to")]
    pub recipient: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "pickupDateTime", with = "crate::domain::order::pickup_time")]
    pub pickup_at: NaiveDateTime,
}

/// User-entered details accompanying an add-to-cart action.
#[derive(Clone, Debug, PartialEq)]
pub struct LineDetails {
    pub quantity: u32,
    pub sender: String,
    pub recipient: String,
    pub message: Option<String>,
    pub pickup_at: NaiveDateTime,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart is empty")]
    Empty,
    #[error("sender and recipient names are required")]
    MissingNames,
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Append a line item and return its generated id. Duplicate products
    /// are independent lines; there is no merge-by-product.
    pub fn add(&mut self, product: &Product, details: LineDetails) -> Result<LineItemId, CartError> {
        if details.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if details.sender.trim().is_empty() || details.recipient.trim().is_empty() {
            return Err(CartError::MissingNames);
        }

        let line_id = LineItemId::generate();
        self.items.push(CartLineItem {
            line_id: line_id.clone(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity: details.quantity,
            sender: details.sender,
            recipient: details.recipient,
            message: details.message,
            pickup_at: details.pickup_at,
        });
        Ok(line_id)
    }

    pub fn remove(&mut self, line_id: &LineItemId) -> Option<CartLineItem> {
        let index = self.items.iter().position(|item| &item.line_id == line_id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }

    /// Serialize the whole cart into one checkout request. Refused locally
    /// when empty — the order service is never contacted.
    pub fn to_order(&self) -> Result<NewOrder, CartError> {
        if self.items.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(NewOrder {
            items: self
                .items
                .iter()
                .map(|item| OrderItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    sender: item.sender.clone(),
                    recipient: item.recipient.clone(),
                    message: item.message.clone(),
                    pickup_at: item.pickup_at,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("could not read cart state: {0}")]
    Read(#[source] io::Error),
    #[error("could not write cart state: {0}")]
    Write(#[source] io::Error),
    #[error("stored cart state is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable single-key storage for the serialized cart. An absent key is an
/// empty cart.
pub trait CartStore {
    fn load(&self) -> Result<Cart, CartStoreError>;
    fn save(&self, cart: &Cart) -> Result<(), CartStoreError>;
    fn clear(&self) -> Result<(), CartStoreError>;
}

/// File-backed store: one JSON document at a fixed path.
pub struct JsonFileCartStore {
    path: PathBuf,
}

impl JsonFileCartStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStore for JsonFileCartStore {
    fn load(&self) -> Result<Cart, CartStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Cart::default()),
            Err(error) => return Err(CartStoreError::Read(error)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, cart: &Cart) -> Result<(), CartStoreError> {
        let raw = serde_json::to_string(cart)?;
        fs::write(&self.path, raw).map_err(CartStoreError::Write)
    }

    fn clear(&self) -> Result<(), CartStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(CartStoreError::Write(error)),
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Store(#[from] CartStoreError),
}

/// Session-owned cart handle: every mutation goes straight through the
/// store, and checkout clears the key only after the caller reports that
/// the order service acknowledged the submission.
pub struct CartSession<S: CartStore> {
    store: S,
}

impl<S: CartStore> CartSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn cart(&self) -> Result<Cart, CartStoreError> {
        self.store.load()
    }

    pub fn add_line(
        &self,
        product: &Product,
        details: LineDetails,
    ) -> Result<LineItemId, CheckoutError> {
        let mut cart = self.store.load()?;
        let line_id = cart.add(product, details)?;
        self.store.save(&cart)?;
        Ok(line_id)
    }

    pub fn remove_line(&self, line_id: &LineItemId) -> Result<Option<CartLineItem>, CartStoreError> {
        let mut cart = self.store.load()?;
        let removed = cart.remove(line_id);
        if removed.is_some() {
            self.store.save(&cart)?;
        }
        Ok(removed)
    }

    pub fn empty(&self) -> Result<(), CartStoreError> {
        self.store.clear()
    }

    /// First half of the checkout handshake: build the order request
    /// without touching the stored cart.
    pub fn begin_checkout(&self) -> Result<NewOrder, CheckoutError> {
        Ok(self.cart()?.to_order()?)
    }

    /// Second half, called only after the order service acknowledged.
    pub fn complete_checkout(&self) -> Result<(), CartStoreError> {
        self.store.clear()
    }
}
