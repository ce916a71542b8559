/// 제안 관련 커맨드 처리
/// 1. 제안 등록 (기부자)
/// 2. 내 제안 / 수신함 조회
/// 3. 제안 수락 (초안 상품 생성 포함) / 거절
// region:    --- Imports
use super::model::{AcceptOutcome, CreateOfferInput, Offer, OfferStatus};
use super::queries;
use crate::auth::{AccessGuard, Actor, Role};
use crate::catalog::handlers as catalog;
use crate::database::DatabaseManager;
use crate::error::{MarketError, MarketResult};
use crate::log_sink::{NotificationType, RelatedType, SideEffects};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
// endregion: --- Imports

/// 초안 상품 생성 실패 시 클라이언트에 전달하는 경고
pub const DRAFT_FAILED_WARNING: &str =
    "제안은 수락되었지만 초안 상품을 만들지 못했습니다. 상품을 직접 등록해 주세요.";

/// 판매자 결정
#[derive(Debug, Clone, Copy)]
enum Decision {
    Accept { agreed_price: i64 },
    Reject,
}

impl Decision {
    fn target(&self) -> OfferStatus {
        match self {
            Self::Accept { .. } => OfferStatus::Accepted,
            Self::Reject => OfferStatus::Rejected,
        }
    }
}

// region:    --- Offer Engine
pub struct OfferEngine {
    db_manager: Arc<DatabaseManager>,
    guard: Arc<AccessGuard>,
    effects: SideEffects,
    inbox_limit: i64,
}

impl OfferEngine {
    pub fn new(
        db_manager: Arc<DatabaseManager>,
        guard: Arc<AccessGuard>,
        effects: SideEffects,
        inbox_limit: i64,
    ) -> Self {
        Self {
            db_manager,
            guard,
            effects,
            inbox_limit,
        }
    }

    /// 1. 제안 등록
    pub async fn create_offer(&self, actor: Actor, input: CreateOfferInput) -> MarketResult<Offer> {
        info!("{:<12} --> 제안 등록 요청: 기부자 {}", "Offer", actor.id);
        actor.require_role(Role::Giver)?;
        let offer = input.into_offer(actor.id)?;

        let offer = self
            .db_manager
            .timed(async {
                sqlx::query_as::<_, Offer>(queries::INSERT_OFFER)
                    .bind(offer.id)
                    .bind(offer.giver_id)
                    .bind(offer.seller_id)
                    .bind(&offer.item_name)
                    .bind(&offer.description)
                    .bind(&offer.image_url)
                    .bind(offer.expected_price)
                    .bind(&offer.condition)
                    .bind(&offer.location)
                    .bind(offer.status.as_str())
                    .bind(offer.created_at)
                    .bind(offer.updated_at)
                    .fetch_one(self.db_manager.pool())
                    .await
                    .map_err(MarketError::from)
            })
            .await?;
        info!("{:<12} --> 제안 등록 완료: {}", "Offer", offer.id);

        if let Some(seller_id) = offer.seller_id {
            self.effects
                .record_notification(
                    seller_id,
                    "새 제안 도착",
                    format!(
                        "'{}' 상품에 대한 새 제안이 도착했습니다. 희망 가격 {}",
                        offer.item_name, offer.expected_price
                    ),
                    NotificationType::Offer,
                    offer.id,
                )
                .await;
        }

        Ok(offer)
    }

    /// 2-1. 내가 등록한 제안 목록
    pub async fn get_my_offers(&self, actor: Actor) -> MarketResult<Vec<Offer>> {
        info!("{:<12} --> 내 제안 조회: {}", "Offer", actor.id);
        actor.require_role(Role::Giver)?;
        self.db_manager
            .timed(async {
                sqlx::query_as::<_, Offer>(queries::GET_OFFERS_BY_GIVER)
                    .bind(actor.id)
                    .fetch_all(self.db_manager.pool())
                    .await
                    .map_err(MarketError::from)
            })
            .await
    }

    /// 2-2. 판매자 수신함
    pub async fn get_offers_to_seller(&self, actor: Actor) -> MarketResult<Vec<Offer>> {
        info!("{:<12} --> 제안 수신함 조회: {}", "Offer", actor.id);
        actor.require_role(Role::Seller)?;
        self.guard.resolve(actor).await?.require_shop()?;
        self.db_manager
            .timed(async {
                sqlx::query_as::<_, Offer>(queries::GET_OFFERS_FOR_SELLER)
                    .bind(actor.id)
                    .bind(self.inbox_limit)
                    .fetch_all(self.db_manager.pool())
                    .await
                    .map_err(MarketError::from)
            })
            .await
    }

    /// 3-1. 제안 수락
    pub async fn accept_offer(
        &self,
        actor: Actor,
        offer_id: Uuid,
        agreed_price: i64,
    ) -> MarketResult<AcceptOutcome> {
        info!(
            "{:<12} --> 제안 수락 요청: {} 가격 {}",
            "Offer", offer_id, agreed_price
        );
        if agreed_price < 0 {
            return Err(MarketError::Validation(
                "합의 가격은 0 이상이어야 합니다.".to_string(),
            ));
        }
        let shop_id = self.guard.resolve(actor).await?.require_shop()?.id;

        let offer = self
            .decide(actor, offer_id, Decision::Accept { agreed_price })
            .await?;

        // 제안은 이미 커밋됨. 초안 상품 생성 실패는 경고로만 전달
        let (draft_item, draft_error) = match offer.draft_item(shop_id) {
            Ok(item) => match catalog::insert_item(&self.db_manager, &item).await {
                Ok(item) => {
                    info!(
                        "{:<12} --> 초안 상품 생성: {} (제안 {})",
                        "Offer", item.id, offer.id
                    );
                    (Some(item), None)
                }
                Err(e) => {
                    error!("{:<12} --> 초안 상품 생성 실패: {}", "Offer", e);
                    (None, Some(DRAFT_FAILED_WARNING.to_string()))
                }
            },
            Err(e) => {
                error!("{:<12} --> 초안 상품 구성 실패: {}", "Offer", e);
                (None, Some(DRAFT_FAILED_WARNING.to_string()))
            }
        };

        Ok(AcceptOutcome {
            offer,
            draft_item,
            draft_error,
        })
    }

    /// 3-2. 제안 거절
    pub async fn reject_offer(&self, actor: Actor, offer_id: Uuid) -> MarketResult<Offer> {
        info!("{:<12} --> 제안 거절 요청: {}", "Offer", offer_id);
        self.guard.resolve(actor).await?.require_shop()?;
        self.decide(actor, offer_id, Decision::Reject).await
    }

    /// 잠금 → 검증 → 상태 기록을 한 트랜잭션에서 처리한 뒤 부수 효과 기록
    async fn decide(&self, actor: Actor, offer_id: Uuid, decision: Decision) -> MarketResult<Offer> {
        let seller_id = actor.id;
        let (old_status, offer) = self
            .db_manager
            .timed(self.db_manager.transaction(move |tx| {
                Box::pin(async move {
                    let current = sqlx::query_as::<_, Offer>(queries::LOCK_OFFER)
                        .bind(offer_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(MarketError::OfferNotFound)?;
                    current.check_addressed_to(seller_id)?;
                    current.ensure_pending()?;

                    let updated = match decision {
                        Decision::Accept { agreed_price } => {
                            sqlx::query_as::<_, Offer>(queries::ACCEPT_OFFER)
                                .bind(agreed_price)
                                .bind(seller_id)
                                .bind(offer_id)
                                .fetch_one(&mut **tx)
                                .await?
                        }
                        Decision::Reject => sqlx::query_as::<_, Offer>(queries::REJECT_OFFER)
                            .bind(offer_id)
                            .fetch_one(&mut **tx)
                            .await?,
                    };
                    Ok::<_, MarketError>((current.status, updated))
                })
            }))
            .await?;
        info!(
            "{:<12} --> 제안 {} 처리 완료: {} -> {}",
            "Offer", offer.id, old_status, offer.status
        );

        self.effects
            .record_status_change(
                offer.id,
                RelatedType::Offer,
                old_status.as_str(),
                decision.target().as_str(),
                actor.id,
                None,
            )
            .await;

        let (title, message) = match decision {
            Decision::Accept { agreed_price } => (
                "제안 수락",
                format!(
                    "'{}' 제안이 수락되었습니다. 합의 가격 {}",
                    offer.item_name, agreed_price
                ),
            ),
            Decision::Reject => (
                "제안 거절",
                format!("'{}' 제안이 거절되었습니다.", offer.item_name),
            ),
        };
        self.effects
            .record_notification(
                offer.giver_id,
                title,
                message,
                NotificationType::Offer,
                offer.id,
            )
            .await;

        Ok(offer)
    }
}
// endregion: --- Offer Engine
