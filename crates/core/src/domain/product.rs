use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Catalog categories offered by the shop. Wire values match the labels the
/// storefront UI sends verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowerType {
    #[serde(rename = "Fresh Flowers")]
    FreshFlowers,
    #[serde(rename = "Dried Flowers")]
    DriedFlowers,
    #[serde(rename = "Balloon")]
    Balloon,
    #[serde(rename = "Personalized Gift")]
    PersonalizedGift,
}

impl FlowerType {
    pub const ALL: [FlowerType; 4] =
        [Self::FreshFlowers, Self::DriedFlowers, Self::Balloon, Self::PersonalizedGift];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreshFlowers => "Fresh Flowers",
            Self::DriedFlowers => "Dried Flowers",
            Self::Balloon => "Balloon",
            Self::PersonalizedGift => "Personalized Gift",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Pink,
    Yellow,
    Purple,
}

impl Color {
    pub const ALL: [Color; 4] = [Self::Red, Self::Pink, Self::Yellow, Self::Purple];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Pink => "Pink",
            Self::Yellow => "Yellow",
            Self::Purple => "Purple",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == value)
    }
}

/// A purchasable catalog record. Identity and `created_at` are assigned by
/// the server at creation time and never change afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub flower_type: Option<FlowerType>,
    pub color: Option<Color>,
    #[serde(rename = "image")]
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creation-time invariants: non-empty name, non-negative price, and a
    /// stored image reference.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice);
        }
        if self.image_path.trim().is_empty() {
            return Err(ValidationError::MissingImage);
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(flower_type) = patch.flower_type {
            self.flower_type = flower_type;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(image_path) = patch.image_path {
            self.image_path = image_path;
        }
    }
}

/// Partial update for a product. Outer `None` means "leave the field alone";
/// the nested `Option` on optional fields distinguishes clearing a value
/// from keeping it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<Option<String>>,
    pub flower_type: Option<Option<FlowerType>>,
    pub color: Option<Option<Color>>,
    pub image_path: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.flower_type.is_none()
            && self.color.is_none()
            && self.image_path.is_none()
    }
}
