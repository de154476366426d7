//! HTTP routes for the cart demo.

use axum::extract::{Form, Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use http::StatusCode;
use kvcart_commerce::{Cart, CartItem, CartService, CommerceError, ItemId};
use serde::{Deserialize, Deserializer};
use tower_http::trace::TraceLayer;

use crate::render;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Service for the demo cart.
    pub service: CartService,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/add-item/", post(add_item))
        .route("/remove-item/{item_id}/", get(remove_item))
        .route("/increment/{item_id}/", get(increment_item))
        .route("/decrement/{item_id}/", get(decrement_item))
        .route("/clear-cart/", get(clear_cart))
        .route("/apply-overall-discount/", post(apply_overall_discount))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Form fields for adding an item.
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    title: String,
    price: f64,
    quantity: u32,
    #[serde(default, deserialize_with = "blank_as_zero")]
    discount: f64,
}

/// Form fields for the overall discount.
#[derive(Debug, Deserialize)]
pub struct DiscountForm {
    #[serde(default, deserialize_with = "blank_as_zero")]
    overall_discount: f64,
}

/// Browsers submit empty number inputs as empty strings.
fn blank_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse().map_err(serde::de::Error::custom)
}

async fn home(State(state): State<AppState>) -> Html<String> {
    let cart = state.service.get_cart().await;
    Html(render::cart_page(&cart))
}

async fn add_item(State(state): State<AppState>, Form(form): Form<AddItemForm>) -> Response {
    let Some(id) = ItemId::from_title(&form.title) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Title must contain at least one letter or digit",
        )
            .into_response();
    };
    let item = match CartItem::new(id, form.title.trim(), form.price, form.quantity)
        .and_then(|item| item.with_discount(form.discount))
    {
        Ok(item) => item,
        Err(e) => return rejected(e),
    };
    finish("add-item", state.service.add_item(item).await)
}

async fn remove_item(State(state): State<AppState>, Path(item_id): Path<String>) -> Response {
    let item_id = ItemId::from(item_id);
    finish("remove-item", state.service.remove_item(&item_id).await)
}

async fn increment_item(State(state): State<AppState>, Path(item_id): Path<String>) -> Response {
    let item_id = ItemId::from(item_id);
    finish("increment", state.service.increment_quantity(&item_id).await)
}

async fn decrement_item(State(state): State<AppState>, Path(item_id): Path<String>) -> Response {
    let item_id = ItemId::from(item_id);
    finish("decrement", state.service.decrement_quantity(&item_id).await)
}

async fn clear_cart(State(state): State<AppState>) -> Response {
    finish("clear-cart", state.service.clear_cart().await)
}

async fn apply_overall_discount(
    State(state): State<AppState>,
    Form(form): Form<DiscountForm>,
) -> Response {
    finish(
        "apply-overall-discount",
        state.service.apply_overall_discount(form.overall_discount).await,
    )
}

/// Redirect back to the cart.
///
/// Backend failures are logged and still redirect, so an outage shows up as
/// an unchanged (or empty) cart rather than an error page.
fn finish(action: &'static str, result: Result<Cart, CommerceError>) -> Response {
    match result {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) if e.is_validation() => rejected(e),
        Err(e) => {
            tracing::error!(action, error = %e, "cart update failed");
            Redirect::to("/").into_response()
        }
    }
}

fn rejected(e: CommerceError) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response()
}
