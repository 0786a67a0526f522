use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use bloomery_core::domain::order::{NewOrder, Order, OrderId};

use crate::bootstrap::ApiState;
use crate::error::ApiError;

pub fn router(state: ApiState) -> Router {
    Router::new().route("/api/orders", post(create_order)).with_state(state)
}

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub message: String,
    pub order: Order,
}

fn new_order_id() -> OrderId {
    OrderId(format!("ORD-{}", &Uuid::new_v4().simple().to_string()[..12]))
}

/// `POST /api/orders`. Validation happens before any store access, so a
/// rejected checkout never leaves a partial record behind.
pub async fn create_order(
    State(state): State<ApiState>,
    Json(body): Json<NewOrder>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    body.validate()?;

    let order = body.into_order(new_order_id(), Utc::now());
    state.orders.save(&order).await?;

    info!(
        event_name = "orders.created",
        order_id = %order.id.0,
        item_count = order.items.len(),
        "order accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse { message: "Order placed successfully!".to_string(), order }),
    ))
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use chrono::NaiveDate;

    use bloomery_core::domain::order::{NewOrder, OrderItem, OrderStatus};
    use bloomery_core::domain::product::ProductId;

    use super::create_order;
    use crate::bootstrap::test_support::in_memory_state;

    fn item(product: &str, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: ProductId(product.to_string()),
            quantity,
            sender: "Ana".to_string(),
            recipient: "Luis".to_string(),
            message: Some("Get well soon".to_string()),
            pickup_at: NaiveDate::from_ymd_opt(2026, 9, 14)
                .expect("valid date")
                .and_hms_opt(10, 30, 0)
                .expect("valid time"),
        }
    }

    #[tokio::test]
    async fn two_item_checkout_persists_a_pending_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());

        let (status, payload) = create_order(
            State(state.clone()),
            Json(NewOrder { items: vec![item("PRD-rose", 2), item("PRD-tulip", 1)] }),
        )
        .await
        .expect("checkout succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(payload.0.message, "Order placed successfully!");
        let order = payload.0.order;
        assert!(order.id.0.starts_with("ORD-"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);

        let persisted =
            state.orders.find_by_id(&order.id).await.expect("lookup").expect("order stored");
        assert_eq!(persisted.items.len(), 2);
    }

    #[tokio::test]
    async fn empty_checkout_is_rejected_without_a_record() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());

        let error = create_order(State(state), Json(NewOrder { items: Vec::new() }))
            .await
            .expect_err("empty order must be rejected");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "order must contain at least one item");
    }

    #[tokio::test]
    async fn checkout_body_without_items_key_is_a_bad_request() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());

        let body: NewOrder = serde_json::from_str("{}").expect("bare body deserializes");
        let error = create_order(State(state), Json(body))
            .await
            .expect_err("bare body must be rejected");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "order must contain at least one item");
    }

    #[tokio::test]
    async fn zero_quantity_item_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());

        let error = create_order(
            State(state),
            Json(NewOrder { items: vec![item("PRD-rose", 0)] }),
        )
        .await
        .expect_err("zero quantity must be rejected");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }
}
