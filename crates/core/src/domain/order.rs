use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Orders are created in `pending` and this core defines no further
/// transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        (value == "pending").then_some(Self::Pending)
    }
}

/// One line of a checkout submission. The wire names (`from`, `to`,
/// `pickupDateTime`) come from the storefront's order form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(rename = "from")]
    pub sender: String,
    #[serde(rename = "to")]
    pub recipient: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "pickupDateTime", with = "pickup_time")]
    pub pickup_at: NaiveDateTime,
}

/// A checkout request before the server assigns identity. Validation is
/// all-or-nothing: an invalid request must never leave a partial record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    // A body without the key at all reads as an empty order so it is rejected
    // with the same validation message as an explicit empty list.
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        if self.items.iter().any(|item| item.quantity == 0) {
            return Err(ValidationError::ZeroQuantity);
        }
        Ok(())
    }

    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order { id, items: self.items, status: OrderStatus::Pending, created_at }
    }
}

/// An immutable persisted purchase-intent record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Pickup times come from an HTML `datetime-local` input, which omits the
/// seconds when they are zero. Accept both forms; emit the full one.
pub mod pickup_time {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FULL: &str = "%Y-%m-%dT%H:%M:%S";
    const MINUTES: &str = "%Y-%m-%dT%H:%M";

    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value, FULL)
            .or_else(|_| NaiveDateTime::parse_from_str(value, MINUTES))
            .ok()
    }

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FULL).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid pickup date-time `{raw}`")))
    }
}
