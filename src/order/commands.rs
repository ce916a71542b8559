/// 주문 관련 커맨드 처리
/// 1. 주문 생성 (재고 예약 트랜잭션)
/// 2. 주문 상태 변경
/// 3. 배송 정보 입력
/// 4. 주문 추적
// region:    --- Imports
use super::model::{
    merge_lines, CreateOrderInput, Order, OrderDetail, OrderDraft, OrderItem, OrderStatus,
    ShippingReceiptInput,
};
use super::queries;
use crate::auth::{AccessGuard, Actor, Role};
use crate::catalog::handlers as catalog;
use crate::database::DatabaseManager;
use crate::error::{MarketError, MarketResult};
use crate::log_sink::{NotificationType, RelatedType, SideEffects};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Order Engine
pub struct OrderEngine {
    db_manager: Arc<DatabaseManager>,
    guard: Arc<AccessGuard>,
    effects: SideEffects,
}

impl OrderEngine {
    pub fn new(
        db_manager: Arc<DatabaseManager>,
        guard: Arc<AccessGuard>,
        effects: SideEffects,
    ) -> Self {
        Self {
            db_manager,
            guard,
            effects,
        }
    }

    /// 1. 주문 생성
    pub async fn create_order(
        &self,
        actor: Actor,
        input: CreateOrderInput,
    ) -> MarketResult<OrderDetail> {
        info!(
            "{:<12} --> 주문 생성 요청: 구매자 {} 라인 {}개",
            "Order",
            actor.id,
            input.items.len()
        );
        actor.require_role(Role::Buyer)?;

        // 상품 ID 순으로 정렬되어 차감 시 잠금 순서가 일정하다
        let merged = merge_lines(&input.items)?;
        let mut lines = Vec::with_capacity(merged.len());
        for (item_id, quantity) in merged {
            let item = catalog::get_item(&self.db_manager, item_id)
                .await?
                .ok_or_else(|| MarketError::InvalidItem(format!("존재하지 않는 상품 {}", item_id)))?;
            lines.push((item, quantity));
        }

        let OrderDraft { order, items } =
            OrderDraft::build(actor.id, &input.shipping_address, lines)?;

        let (order, items) = self
            .db_manager
            .timed(self.db_manager.transaction(move |tx| {
                Box::pin(async move {
                    let order = sqlx::query_as::<_, Order>(queries::INSERT_ORDER)
                        .bind(order.id)
                        .bind(order.buyer_id)
                        .bind(order.shop_id)
                        .bind(order.total_price)
                        .bind(order.status.as_str())
                        .bind(&order.shipping_address)
                        .bind(order.created_at)
                        .bind(order.updated_at)
                        .fetch_one(&mut **tx)
                        .await?;

                    // 재고 가드: 조건부 차감이 실패하면 전체 롤백
                    for line in &items {
                        let result = sqlx::query(queries::DECREMENT_STOCK)
                            .bind(line.quantity)
                            .bind(line.item_id)
                            .execute(&mut **tx)
                            .await?;
                        if result.rows_affected() == 0 {
                            warn!(
                                "{:<12} --> 재고 차감 실패: 상품 {} 수량 {}",
                                "Order", line.item_id, line.quantity
                            );
                            return Err(MarketError::InvalidItem(format!(
                                "상품 {}의 재고가 부족하거나 판매 중이 아닙니다",
                                line.item_id
                            )));
                        }
                    }

                    for line in &items {
                        sqlx::query(queries::INSERT_ORDER_ITEM)
                            .bind(line.id)
                            .bind(line.order_id)
                            .bind(line.item_id)
                            .bind(line.quantity)
                            .bind(line.price)
                            .execute(&mut **tx)
                            .await?;
                    }

                    Ok::<_, MarketError>((order, items))
                })
            }))
            .await?;

        info!(
            "{:<12} --> 주문 생성 완료: {} 총액 {}",
            "Order", order.id, order.total_price
        );

        // 커밋 이후 부수 효과
        match self.guard.shop_owner(order.shop_id).await {
            Ok(Some(owner_id)) => {
                self.effects
                    .record_notification(
                        owner_id,
                        "새 주문 도착",
                        format!(
                            "새 주문 #{}이(가) 들어왔습니다. 총액 {}",
                            order.short_id(),
                            order.total_price
                        ),
                        NotificationType::NewOrder,
                        order.id,
                    )
                    .await
            }
            Ok(None) => {}
            Err(e) => warn!(
                "{:<12} --> 상점 소유자 조회 실패, 알림 생략: {}",
                "Order", e
            ),
        }

        Ok(OrderDetail { order, items })
    }

    /// 2. 주문 상태 변경 (상점 소유자 또는 관리자)
    /// 이전 상태와 무관하게 열거된 어떤 상태로든 변경할 수 있다.
    pub async fn update_order_status(
        &self,
        actor: Actor,
        order_id: Uuid,
        new_status: &str,
    ) -> MarketResult<Order> {
        info!(
            "{:<12} --> 주문 상태 변경 요청: {} -> {}",
            "Order", order_id, new_status
        );
        let new_status: OrderStatus = new_status.trim().parse()?;
        let order = self.find_order(order_id).await?;
        self.ensure_can_manage(actor, &order).await?;

        let (old_status, updated) = self
            .db_manager
            .timed(self.db_manager.transaction(move |tx| {
                Box::pin(async move {
                    let current = Self::lock_status(tx, order_id).await?;
                    let updated = sqlx::query_as::<_, Order>(queries::UPDATE_ORDER_STATUS)
                        .bind(new_status.as_str())
                        .bind(order_id)
                        .fetch_one(&mut **tx)
                        .await?;
                    Ok::<_, MarketError>((current, updated))
                })
            }))
            .await?;

        self.effects
            .record_status_change(
                order_id,
                RelatedType::Order,
                old_status.as_str(),
                updated.status.as_str(),
                actor.id,
                None,
            )
            .await;
        self.effects
            .record_notification(
                updated.buyer_id,
                "주문 상태 변경",
                format!(
                    "주문 #{}의 상태가 {}(으)로 변경되었습니다.",
                    updated.short_id(),
                    updated.status
                ),
                NotificationType::OrderStatus,
                updated.id,
            )
            .await;

        Ok(updated)
    }

    /// 3. 배송 정보 입력 (이전 상태와 무관하게 shipped로 변경)
    pub async fn input_shipping_receipt(
        &self,
        actor: Actor,
        order_id: Uuid,
        input: ShippingReceiptInput,
    ) -> MarketResult<Order> {
        info!("{:<12} --> 배송 정보 입력 요청: {}", "Order", order_id);
        let (courier, receipt) = input.validate()?;
        let order = self.find_order(order_id).await?;
        self.ensure_can_manage(actor, &order).await?;

        let note = format!("{} / {}", courier, receipt);
        let (old_status, updated) = self
            .db_manager
            .timed(self.db_manager.transaction(move |tx| {
                Box::pin(async move {
                    let current = Self::lock_status(tx, order_id).await?;
                    let updated = sqlx::query_as::<_, Order>(queries::UPDATE_ORDER_SHIPMENT)
                        .bind(&courier)
                        .bind(&receipt)
                        .bind(order_id)
                        .fetch_one(&mut **tx)
                        .await?;
                    Ok::<_, MarketError>((current, updated))
                })
            }))
            .await?;

        self.effects
            .record_status_change(
                order_id,
                RelatedType::Order,
                old_status.as_str(),
                OrderStatus::Shipped.as_str(),
                actor.id,
                Some(note),
            )
            .await;
        self.effects
            .record_notification(
                updated.buyer_id,
                "상품 발송",
                format!(
                    "주문 #{}이(가) 발송되었습니다. 운송장 번호 {}",
                    updated.short_id(),
                    updated.shipping_receipt.as_deref().unwrap_or_default()
                ),
                NotificationType::OrderStatus,
                updated.id,
            )
            .await;

        Ok(updated)
    }

    /// 4. 주문 추적 (구매자 또는 관리자)
    pub async fn get_order_tracking(&self, actor: Actor, order_id: Uuid) -> MarketResult<OrderDetail> {
        info!("{:<12} --> 주문 추적 조회: {}", "Order", order_id);
        let order = self.find_order(order_id).await?;
        if !actor.can_track_order(&order) {
            return Err(MarketError::Unauthorized(
                "구매자 본인 또는 관리자만 조회할 수 있습니다.".to_string(),
            ));
        }

        let items = self
            .db_manager
            .timed(async {
                sqlx::query_as::<_, OrderItem>(queries::GET_ORDER_ITEMS)
                    .bind(order_id)
                    .fetch_all(self.db_manager.pool())
                    .await
                    .map_err(MarketError::from)
            })
            .await?;

        Ok(OrderDetail { order, items })
    }

    async fn find_order(&self, order_id: Uuid) -> MarketResult<Order> {
        self.db_manager
            .timed(async {
                sqlx::query_as::<_, Order>(queries::GET_ORDER)
                    .bind(order_id)
                    .fetch_optional(self.db_manager.pool())
                    .await
                    .map_err(MarketError::from)
            })
            .await?
            .ok_or(MarketError::OrderNotFound)
    }

    async fn ensure_can_manage(&self, actor: Actor, order: &Order) -> MarketResult<()> {
        let principal = self.guard.resolve(actor).await?;
        if principal.can_manage_order(order) {
            Ok(())
        } else {
            Err(MarketError::Unauthorized(
                "주문 상점의 소유자 또는 관리자만 변경할 수 있습니다.".to_string(),
            ))
        }
    }

    /// 트랜잭션 안에서 주문 행 잠금 후 현재 상태 반환 (이력의 이전 상태)
    async fn lock_status(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
    ) -> MarketResult<OrderStatus> {
        let status = sqlx::query_scalar::<_, String>(queries::LOCK_ORDER_STATUS)
            .bind(order_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(MarketError::OrderNotFound)?;
        Ok(status.parse()?)
    }
}
// endregion: --- Order Engine
