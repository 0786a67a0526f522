pub mod cart;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filter;

pub use cart::{
    Cart, CartError, CartLineItem, CartSession, CartStore, CartStoreError, CheckoutError,
    JsonFileCartStore, LineDetails, LineItemId,
};
pub use domain::order::{NewOrder, Order, OrderId, OrderItem, OrderStatus};
pub use domain::product::{Color, FlowerType, Product, ProductId, ProductPatch};
pub use errors::{StorefrontError, ValidationError};
pub use filter::{FilterRequest, PriceBucket};
