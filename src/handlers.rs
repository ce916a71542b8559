// region:    --- Imports
use crate::auth::Actor;
use crate::catalog;
use crate::catalog::model::ItemFilter;
use crate::database::DatabaseManager;
use crate::error::{MarketError, MarketResult};
use crate::offer::commands::OfferEngine;
use crate::offer::model::{AcceptOfferInput, CreateOfferInput};
use crate::order::commands::OrderEngine;
use crate::order::model::{CreateOrderInput, ShippingReceiptInput, UpdateOrderStatusInput};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- App State
/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub db_manager: Arc<DatabaseManager>,
    pub offers: Arc<OfferEngine>,
    pub orders: Arc<OrderEngine>,
}

/// 라우터 설정 (모든 경로는 /api 아래)
pub fn routes(state: AppState, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/offers", post(handle_create_offer))
        .route("/offers/my", get(handle_get_my_offers))
        .route("/offers/inbox", get(handle_get_offers_to_seller))
        .route("/offers/:id/accept", post(handle_accept_offer))
        .route("/offers/:id/reject", post(handle_reject_offer))
        .route("/market/items", get(handle_list_market_items))
        .route("/market/items/:id", get(handle_get_item_detail))
        .route("/orders", post(handle_create_order))
        .route("/orders/:id/status", patch(handle_update_order_status))
        .route("/orders/:id/shipping", post(handle_input_shipping_receipt))
        .route("/orders/:id/tracking", get(handle_get_order_tracking));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn parse_id(raw: &str) -> MarketResult<Uuid> {
    raw.parse::<Uuid>()
        .map_err(|_| MarketError::Validation(format!("잘못된 ID 형식: {}", raw)))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> MarketResult<T> {
    body.map(|Json(input)| input)
        .map_err(|e| MarketError::Validation(e.body_text()))
}
// endregion: --- App State

// region:    --- Offer Handlers

/// 제안 등록
pub async fn handle_create_offer(
    State(state): State<AppState>,
    actor: Actor,
    body: Result<Json<CreateOfferInput>, JsonRejection>,
) -> MarketResult<impl IntoResponse> {
    info!("{:<12} --> 제안 등록 요청: {}", "Handler", actor.id);
    let input = json_body(body)?;
    let offer = state.offers.create_offer(actor, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "제안이 등록되었습니다.",
            "offer": offer,
        })),
    ))
}

/// 내 제안 목록
pub async fn handle_get_my_offers(
    State(state): State<AppState>,
    actor: Actor,
) -> MarketResult<impl IntoResponse> {
    let offers = state.offers.get_my_offers(actor).await?;
    Ok(Json(json!({
        "message": format!("제안 {}건", offers.len()),
        "offers": offers,
    })))
}

/// 판매자 수신함
pub async fn handle_get_offers_to_seller(
    State(state): State<AppState>,
    actor: Actor,
) -> MarketResult<impl IntoResponse> {
    let offers = state.offers.get_offers_to_seller(actor).await?;
    Ok(Json(json!({
        "message": format!("받은 제안 {}건", offers.len()),
        "offers": offers,
    })))
}

/// 제안 수락
pub async fn handle_accept_offer(
    State(state): State<AppState>,
    actor: Actor,
    Path(offer_id): Path<String>,
    body: Result<Json<AcceptOfferInput>, JsonRejection>,
) -> MarketResult<impl IntoResponse> {
    info!("{:<12} --> 제안 수락 요청: {}", "Handler", offer_id);
    let offer_id = parse_id(&offer_id)?;
    let input = json_body(body)?;
    let outcome = state
        .offers
        .accept_offer(actor, offer_id, input.agreed_price)
        .await?;

    let mut response = json!({
        "message": "제안이 수락되었습니다.",
        "offer": outcome.offer,
        "draft_item": outcome.draft_item,
    });
    if let Some(warning) = outcome.draft_error {
        response["warning"] = json!(warning);
    }
    Ok(Json(response))
}

/// 제안 거절
pub async fn handle_reject_offer(
    State(state): State<AppState>,
    actor: Actor,
    Path(offer_id): Path<String>,
) -> MarketResult<impl IntoResponse> {
    info!("{:<12} --> 제안 거절 요청: {}", "Handler", offer_id);
    let offer_id = parse_id(&offer_id)?;
    let offer = state.offers.reject_offer(actor, offer_id).await?;
    Ok(Json(json!({
        "message": "제안이 거절되었습니다.",
        "offer": offer,
    })))
}

// endregion: --- Offer Handlers

// region:    --- Market Handlers

/// 마켓 상품 목록
pub async fn handle_list_market_items(
    State(state): State<AppState>,
    filter: Result<Query<ItemFilter>, QueryRejection>,
) -> MarketResult<impl IntoResponse> {
    let Query(filter) = filter.map_err(|e| MarketError::Validation(e.body_text()))?;
    let items = catalog::handlers::list_market_items(&state.db_manager, &filter).await?;
    Ok(Json(json!({
        "message": format!("상품 {}건", items.len()),
        "items": items,
    })))
}

/// 마켓 상품 상세
pub async fn handle_get_item_detail(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> MarketResult<impl IntoResponse> {
    let item_id = parse_id(&item_id)?;
    let item = catalog::handlers::get_item_detail(&state.db_manager, item_id).await?;
    Ok(Json(json!({
        "message": "상품 상세",
        "item": item,
    })))
}

// endregion: --- Market Handlers

// region:    --- Order Handlers

/// 주문 생성
pub async fn handle_create_order(
    State(state): State<AppState>,
    actor: Actor,
    body: Result<Json<CreateOrderInput>, JsonRejection>,
) -> MarketResult<impl IntoResponse> {
    info!("{:<12} --> 주문 생성 요청: {}", "Handler", actor.id);
    let input = json_body(body)?;
    let detail = state.orders.create_order(actor, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "주문이 생성되었습니다.",
            "order": detail.order,
            "items": detail.items,
        })),
    ))
}

/// 주문 상태 변경
pub async fn handle_update_order_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(order_id): Path<String>,
    body: Result<Json<UpdateOrderStatusInput>, JsonRejection>,
) -> MarketResult<impl IntoResponse> {
    info!("{:<12} --> 주문 상태 변경 요청: {}", "Handler", order_id);
    let order_id = parse_id(&order_id)?;
    let input = json_body(body)?;
    let order = state
        .orders
        .update_order_status(actor, order_id, &input.status)
        .await?;
    Ok(Json(json!({
        "message": "주문 상태가 변경되었습니다.",
        "order": order,
    })))
}

/// 배송 정보 입력
pub async fn handle_input_shipping_receipt(
    State(state): State<AppState>,
    actor: Actor,
    Path(order_id): Path<String>,
    body: Result<Json<ShippingReceiptInput>, JsonRejection>,
) -> MarketResult<impl IntoResponse> {
    info!("{:<12} --> 배송 정보 입력 요청: {}", "Handler", order_id);
    let order_id = parse_id(&order_id)?;
    let input = json_body(body)?;
    let order = state
        .orders
        .input_shipping_receipt(actor, order_id, input)
        .await?;
    Ok(Json(json!({
        "message": "배송 정보가 등록되었습니다.",
        "order": order,
    })))
}

/// 주문 추적
pub async fn handle_get_order_tracking(
    State(state): State<AppState>,
    actor: Actor,
    Path(order_id): Path<String>,
) -> MarketResult<impl IntoResponse> {
    let order_id = parse_id(&order_id)?;
    let detail = state.orders.get_order_tracking(actor, order_id).await?;
    Ok(Json(json!({
        "message": format!("주문 상태: {}", detail.order.status),
        "order": detail.order,
        "items": detail.items,
    })))
}

// endregion: --- Order Handlers
