// region:    --- Imports
use super::model::{Item, ItemFilter, ItemStatus, Shop};
use super::queries;
use crate::database::DatabaseManager;
use crate::error::{MarketError, MarketResult};
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Query Handlers

/// 상품 조회 (상태 무관)
pub async fn get_item(db_manager: &DatabaseManager, item_id: Uuid) -> MarketResult<Option<Item>> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    db_manager
        .timed(async {
            sqlx::query_as::<_, Item>(queries::GET_ITEM)
                .bind(item_id)
                .fetch_optional(db_manager.pool())
                .await
                .map_err(MarketError::from)
        })
        .await
}

/// 마켓 상품 상세 조회 (활성 상품만 노출)
pub async fn get_item_detail(db_manager: &DatabaseManager, item_id: Uuid) -> MarketResult<Item> {
    match get_item(db_manager, item_id).await? {
        Some(item) if item.status == ItemStatus::Active => Ok(item),
        _ => Err(MarketError::ItemNotFound),
    }
}

/// 마켓 상품 목록 조회
pub async fn list_market_items(
    db_manager: &DatabaseManager,
    filter: &ItemFilter,
) -> MarketResult<Vec<Item>> {
    info!("{:<12} --> 마켓 상품 목록 조회: {:?}", "Query", filter);
    if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
        if min > max {
            return Err(MarketError::Validation(
                "min_price는 max_price보다 클 수 없습니다.".to_string(),
            ));
        }
    }
    db_manager
        .timed(async {
            sqlx::query_as::<_, Item>(queries::LIST_MARKET_ITEMS)
                .bind(filter.keyword_pattern())
                .bind(filter.category_id)
                .bind(filter.min_price)
                .bind(filter.max_price)
                .bind(filter.limit())
                .bind(filter.offset())
                .fetch_all(db_manager.pool())
                .await
                .map_err(MarketError::from)
        })
        .await
}

/// 상품 저장
pub async fn insert_item(db_manager: &DatabaseManager, item: &Item) -> MarketResult<Item> {
    info!(
        "{:<12} --> 상품 저장 id: {} status: {}",
        "Query", item.id, item.status
    );
    db_manager
        .timed(async {
            sqlx::query_as::<_, Item>(queries::INSERT_ITEM)
                .bind(item.id)
                .bind(item.shop_id)
                .bind(item.category_id)
                .bind(&item.name)
                .bind(&item.description)
                .bind(item.price)
                .bind(item.stock)
                .bind(&item.condition)
                .bind(item.status.as_str())
                .fetch_one(db_manager.pool())
                .await
                .map_err(MarketError::from)
        })
        .await
}

/// 사용자 소유 상점 조회
pub async fn get_shop_by_user(
    db_manager: &DatabaseManager,
    user_id: Uuid,
) -> MarketResult<Option<Shop>> {
    db_manager
        .timed(async {
            sqlx::query_as::<_, Shop>(queries::GET_SHOP_BY_USER)
                .bind(user_id)
                .fetch_optional(db_manager.pool())
                .await
                .map_err(MarketError::from)
        })
        .await
}

/// 상점 소유자 조회
pub async fn get_shop_owner(
    db_manager: &DatabaseManager,
    shop_id: Uuid,
) -> MarketResult<Option<Uuid>> {
    db_manager
        .timed(async {
            sqlx::query_scalar::<_, Uuid>(queries::GET_SHOP_OWNER)
                .bind(shop_id)
                .fetch_optional(db_manager.pool())
                .await
                .map_err(MarketError::from)
        })
        .await
}

// endregion: --- Query Handlers
