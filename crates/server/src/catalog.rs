//! Catalog browse and admin routes.
//!
//! - `GET    /api/products`        — filtered search (query parameters)
//! - `GET    /api/products/{id}`   — point lookup
//! - `POST   /api/products`        — create (multipart, image required)
//! - `PUT    /api/products/{id}`   — partial update (multipart, image optional)
//! - `DELETE /api/products/{id}`   — delete plus best-effort image cleanup

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use bloomery_core::domain::product::{Color, FlowerType, Product, ProductId, ProductPatch};
use bloomery_core::errors::{StorefrontError, ValidationError};
use bloomery_core::filter::FilterRequest;

use crate::bootstrap::ApiState;
use crate::error::ApiError;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/{id}", get(get_product).put(update_product).delete(delete_product))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
}

/// Multipart fields for create and update. Every field is optional at this
/// layer; the operation decides which ones it requires.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub flower_type: Option<String>,
    pub color: Option<String>,
    pub image: Option<UploadedImage>,
}

#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

async fn collect_form(mut multipart: Multipart) -> Result<ProductForm, ApiError> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?.to_vec();
                form.image = Some(UploadedImage { file_name, bytes });
            }
            "name" => form.name = Some(field.text().await.map_err(bad_multipart)?),
            "price" => form.price = Some(field.text().await.map_err(bad_multipart)?),
            "description" => form.description = Some(field.text().await.map_err(bad_multipart)?),
            "flowerType" => form.flower_type = Some(field.text().await.map_err(bad_multipart)?),
            "color" => form.color = Some(field.text().await.map_err(bad_multipart)?),
            // Unknown parts are ignored, matching a lenient form parser.
            _ => {}
        }
    }

    Ok(form)
}

fn bad_multipart(error: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("invalid multipart payload: {error}"))
}

fn new_product_id() -> ProductId {
    ProductId(format!("PRD-{}", &Uuid::new_v4().simple().to_string()[..12]))
}

fn parse_price(raw: &str) -> Result<Decimal, ValidationError> {
    let price = raw.trim().parse::<Decimal>().map_err(|_| ValidationError::InvalidPrice)?;
    if price < Decimal::ZERO {
        return Err(ValidationError::NegativePrice);
    }
    Ok(price)
}

fn parse_flower_type(raw: &str) -> Result<Option<FlowerType>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    FlowerType::parse(trimmed)
        .map(Some)
        .ok_or_else(|| ValidationError::UnknownFlowerType(trimmed.to_string()))
}

fn parse_color(raw: &str) -> Result<Option<Color>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Color::parse(trimmed).map(Some).ok_or_else(|| ValidationError::UnknownColor(trimmed.to_string()))
}

fn image_store_failure(error: std::io::Error) -> ApiError {
    error!(event_name = "catalog.image_write_failed", error = %error, "could not store image");
    ApiError::Internal("could not store product image".to_string())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn list_products(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let filter = FilterRequest::from_pairs(pairs);
    let products = state.catalog.search(&filter).await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = ProductId(id);
    let product = state
        .catalog
        .find_by_id(&id)
        .await?
        .ok_or_else(|| StorefrontError::not_found("Product", id.0))?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let form = collect_form(multipart).await?;
    create_product_from_form(&state, form).await
}

pub(crate) async fn create_product_from_form(
    state: &ApiState,
    form: ProductForm,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ValidationError::MissingName)?
        .to_string();
    let price = parse_price(&form.price.ok_or(ValidationError::MissingPrice)?)?;
    let image = form.image.ok_or(ValidationError::MissingImage)?;
    let flower_type = form.flower_type.as_deref().map(parse_flower_type).transpose()?.flatten();
    let color = form.color.as_deref().map(parse_color).transpose()?.flatten();
    let description =
        form.description.map(|text| text.trim().to_string()).filter(|text| !text.is_empty());

    let image_path =
        state.images.save(&image.file_name, &image.bytes).await.map_err(image_store_failure)?;

    let product = Product {
        id: new_product_id(),
        name,
        price,
        description,
        flower_type,
        color,
        image_path,
        created_at: Utc::now(),
    };
    state.catalog.insert(&product).await?;

    info!(
        event_name = "catalog.product_created",
        product_id = %product.id.0,
        "product added to the catalog"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Product>, ApiError> {
    let form = collect_form(multipart).await?;
    update_product_from_form(&state, ProductId(id), form).await
}

pub(crate) async fn update_product_from_form(
    state: &ApiState,
    id: ProductId,
    form: ProductForm,
) -> Result<Json<Product>, ApiError> {
    let mut patch = ProductPatch::default();

    if let Some(name) = form.name {
        let trimmed = name.trim().to_string();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        patch.name = Some(trimmed);
    }
    if let Some(price) = form.price {
        patch.price = Some(parse_price(&price)?);
    }
    if let Some(description) = form.description {
        let trimmed = description.trim().to_string();
        patch.description = Some((!trimmed.is_empty()).then_some(trimmed));
    }
    if let Some(raw) = form.flower_type {
        patch.flower_type = Some(parse_flower_type(&raw)?);
    }
    if let Some(raw) = form.color {
        patch.color = Some(parse_color(&raw)?);
    }
    if let Some(image) = form.image {
        // The previous file stays on disk; records only ever point at the
        // newest upload.
        let image_path =
            state.images.save(&image.file_name, &image.bytes).await.map_err(image_store_failure)?;
        patch.image_path = Some(image_path);
    }

    let updated = state
        .catalog
        .update(&id, patch)
        .await?
        .ok_or_else(|| StorefrontError::not_found("Product", id.0.clone()))?;

    info!(
        event_name = "catalog.product_updated",
        product_id = %updated.id.0,
        "product updated"
    );

    Ok(Json(updated))
}

pub async fn delete_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = ProductId(id);
    let removed = state
        .catalog
        .delete(&id)
        .await?
        .ok_or_else(|| StorefrontError::not_found("Product", id.0))?;

    state.images.remove(&removed.image_path).await;

    info!(
        event_name = "catalog.product_deleted",
        product_id = %removed.id.0,
        "product removed from the catalog"
    );

    Ok(Json(DeletedResponse { message: "Product deleted successfully".to_string() }))
}

#[cfg(test)]
mod tests {
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;

    use super::{
        create_product_from_form, delete_product, get_product, list_products,
        update_product_from_form, ProductForm, UploadedImage,
    };
    use crate::bootstrap::test_support::in_memory_state;
    use crate::bootstrap::ApiState;
    use bloomery_core::domain::product::{Color, FlowerType, Product, ProductId};

    fn image() -> UploadedImage {
        UploadedImage { file_name: "rose.jpg".to_string(), bytes: b"jpeg".to_vec() }
    }

    fn valid_form() -> ProductForm {
        ProductForm {
            name: Some("Rose Bouquet".to_string()),
            price: Some("450".to_string()),
            description: Some("A dozen red roses".to_string()),
            flower_type: Some("Fresh Flowers".to_string()),
            color: Some("Red".to_string()),
            image: Some(image()),
        }
    }

    async fn create(state: &ApiState, form: ProductForm) -> Product {
        let (status, payload) =
            create_product_from_form(state, form).await.expect("create product");
        assert_eq!(status, StatusCode::CREATED);
        payload.0
    }

    #[tokio::test]
    async fn create_assigns_id_and_stores_the_image() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());

        let product = create(&state, valid_form()).await;
        assert!(product.id.0.starts_with("PRD-"));
        assert_eq!(product.price, Decimal::from(450));
        assert_eq!(product.flower_type, Some(FlowerType::FreshFlowers));
        assert_eq!(product.color, Some(Color::Red));
        assert!(product.image_path.starts_with("uploads/"));

        let stored = tmp
            .path()
            .join(product.image_path.strip_prefix("uploads/").expect("managed path"));
        assert!(stored.is_file());

        let fetched = get_product(State(state), Path(product.id.0.clone()))
            .await
            .expect("product retrievable");
        assert_eq!(fetched.0, product);
    }

    #[tokio::test]
    async fn create_rejects_missing_required_fields() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());

        for broken in [
            ProductForm { name: None, ..valid_form() },
            ProductForm { name: Some("   ".to_string()), ..valid_form() },
            ProductForm { price: None, ..valid_form() },
            ProductForm { price: Some("florist".to_string()), ..valid_form() },
            ProductForm { price: Some("-5".to_string()), ..valid_form() },
            ProductForm { image: None, ..valid_form() },
            ProductForm { flower_type: Some("Cactus".to_string()), ..valid_form() },
            ProductForm { color: Some("Chartreuse".to_string()), ..valid_form() },
        ] {
            let error = create_product_from_form(&state, broken)
                .await
                .expect_err("invalid form must be rejected");
            assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        }

        let listed = list_products(State(state), Query(Vec::new())).await.expect("list");
        assert!(listed.0.is_empty(), "no record may survive a rejected create");
    }

    #[tokio::test]
    async fn blank_category_fields_mean_uncategorized() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());

        let product = create(
            &state,
            ProductForm {
                flower_type: Some(String::new()),
                color: Some("  ".to_string()),
                description: Some("".to_string()),
                ..valid_form()
            },
        )
        .await;
        assert_eq!(product.flower_type, None);
        assert_eq!(product.color, None);
        assert_eq!(product.description, None);
    }

    #[tokio::test]
    async fn list_applies_repeatable_query_parameters() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());

        create(&state, valid_form()).await;
        create(
            &state,
            ProductForm {
                name: Some("Luxury Basket".to_string()),
                price: Some("2000".to_string()),
                ..valid_form()
            },
        )
        .await;

        let pairs = vec![("price".to_string(), "0-500".to_string())];
        let cheap = list_products(State(state.clone()), Query(pairs)).await.expect("list");
        assert_eq!(cheap.0.len(), 1);
        assert_eq!(cheap.0[0].name, "Rose Bouquet");

        // A 450 product sits in the low bucket only.
        let pairs = vec![("price".to_string(), "500-1000".to_string())];
        let mid = list_products(State(state), Query(pairs)).await.expect("list");
        assert!(mid.0.iter().all(|product| product.name != "Rose Bouquet"));
    }

    #[tokio::test]
    async fn update_changes_supplied_fields_and_keeps_the_image() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());
        let created = create(&state, valid_form()).await;

        let updated = update_product_from_form(
            &state,
            created.id.clone(),
            ProductForm { price: Some("600".to_string()), ..ProductForm::default() },
        )
        .await
        .expect("update");

        assert_eq!(updated.0.price, Decimal::from(600));
        assert_eq!(updated.0.name, "Rose Bouquet");
        assert_eq!(updated.0.image_path, created.image_path);
    }

    #[tokio::test]
    async fn update_with_new_image_repoints_the_record() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());
        let created = create(&state, valid_form()).await;

        let updated = update_product_from_form(
            &state,
            created.id.clone(),
            ProductForm {
                image: Some(UploadedImage {
                    file_name: "tulip.jpg".to_string(),
                    bytes: b"new".to_vec(),
                }),
                ..ProductForm::default()
            },
        )
        .await
        .expect("update");

        assert_ne!(updated.0.image_path, created.image_path);
        assert!(updated.0.image_path.ends_with("-tulip.jpg"));
    }

    #[tokio::test]
    async fn unknown_product_is_a_404_for_update_and_delete() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());

        let error = update_product_from_form(
            &state,
            ProductId("PRD-ghost".to_string()),
            ProductForm::default(),
        )
        .await
        .expect_err("missing product");
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "Product not found");

        let error = delete_product(State(state), Path("PRD-ghost".to_string()))
            .await
            .expect_err("missing product");
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "Product not found");
    }

    #[tokio::test]
    async fn delete_then_get_is_a_404_and_the_image_is_gone() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state = in_memory_state(tmp.path());
        let created = create(&state, valid_form()).await;
        let stored = tmp
            .path()
            .join(created.image_path.strip_prefix("uploads/").expect("managed path"));
        assert!(stored.is_file());

        let response = delete_product(State(state.clone()), Path(created.id.0.clone()))
            .await
            .expect("delete");
        assert_eq!(response.0.message, "Product deleted successfully");
        assert!(!stored.exists(), "stored image removed with the record");

        let error = get_product(State(state), Path(created.id.0))
            .await
            .expect_err("deleted product");
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }
}
