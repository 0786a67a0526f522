use thiserror::Error;

/// Field-level failures rejected at the API boundary before any store
/// access happens.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("product name is required")]
    MissingName,
    #[error("product price is required")]
    MissingPrice,
    #[error("product price must be a number")]
    InvalidPrice,
    #[error("product price must not be negative")]
    NegativePrice,
    #[error("product image is required")]
    MissingImage,
    #[error("unknown flower type `{0}`")]
    UnknownFlowerType(String),
    #[error("unknown color `{0}`")]
    UnknownColor(String),
    #[error("order must contain at least one item")]
    EmptyOrder,
    #[error("order item quantity must be at least 1")]
    ZeroQuantity,
    #[error("{field} is required")]
    MissingField { field: &'static str },
}

/// Application-level taxonomy: validation is rejected before store access,
/// not-found and store failures surface as distinct response statuses.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("store failure: {0}")]
    Store(String),
}

impl StorefrontError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    /// Message safe to hand to an end user; internals stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(validation) => validation.to_string(),
            Self::NotFound { entity, .. } => format!("{entity} not found"),
            Self::Store(_) => "an internal error occurred".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StorefrontError, ValidationError};

    #[test]
    fn validation_message_reaches_the_user() {
        let error = StorefrontError::from(ValidationError::EmptyOrder);
        assert_eq!(error.user_message(), "order must contain at least one item");
    }

    #[test]
    fn store_failure_details_stay_internal() {
        let error = StorefrontError::Store("disk full at /var/db".to_string());
        assert_eq!(error.user_message(), "an internal error occurred");
        assert!(error.to_string().contains("disk full"));
    }

    #[test]
    fn not_found_names_the_entity_only() {
        let error = StorefrontError::not_found("product", "PRD-123");
        assert_eq!(error.user_message(), "product not found");
    }
}
