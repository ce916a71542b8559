/// 인가 가드
/// 인증(토큰 발급/검증)은 앞단 게이트웨이가 담당한다고 가정
/// 게이트웨이가 검증한 사용자 ID와 역할을 X-User-Id / X-User-Role 헤더로 전달한다.
// region:    --- Imports
use crate::catalog::handlers as catalog;
use crate::catalog::model::Shop;
use crate::database::DatabaseManager;
use crate::error::{MarketError, MarketResult};
use crate::order::model::Order;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

// endregion: --- Imports

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

// region:    --- Role / Actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Giver,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Giver => "giver",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "giver" => Ok(Self::Giver),
            "admin" => Ok(Self::Admin),
            other => Err(MarketError::Unauthenticated(format!(
                "알 수 없는 역할: {}",
                other
            ))),
        }
    }
}

/// 인증된 요청 주체
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 주문 조회 권한: 구매자 본인 또는 관리자
    pub fn can_track_order(&self, order: &Order) -> bool {
        self.is_admin() || order.buyer_id == self.id
    }

    /// 역할 검사
    pub fn require_role(&self, role: Role) -> MarketResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(MarketError::RoleDenied(format!(
                "{} 역할만 허용됩니다 (현재: {})",
                role, self.role
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| -> MarketResult<String> {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| MarketError::Unauthenticated(format!("{} 헤더가 없습니다", name)))
        };

        let id = header(USER_ID_HEADER)?
            .parse::<Uuid>()
            .map_err(|_| MarketError::Unauthenticated("사용자 ID 형식 오류".to_string()))?;
        let role = header(USER_ROLE_HEADER)?.parse::<Role>()?;
        debug!("{:<12} --> 요청 주체: {} ({})", "Guard", id, role);
        Ok(Actor { id, role })
    }
}
// endregion: --- Role / Actor

// region:    --- Principal
/// 역할 + 상점 소유 정보
#[derive(Debug, Clone)]
pub struct Principal {
    pub actor: Actor,
    pub shop: Option<Shop>,
}

impl Principal {
    /// 상점 소유 필수
    pub fn require_shop(&self) -> MarketResult<&Shop> {
        self.shop.as_ref().ok_or(MarketError::NoShopOwned)
    }

    /// 주문 관리 권한: 주문 상점의 소유자 또는 관리자
    pub fn can_manage_order(&self, order: &Order) -> bool {
        self.actor.is_admin() || self.shop.as_ref().is_some_and(|s| s.id == order.shop_id)
    }
}
// endregion: --- Principal

// region:    --- Access Guard
pub struct AccessGuard {
    db_manager: Arc<DatabaseManager>,
}

impl AccessGuard {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }

    /// 요청 주체의 상점 소유 정보 확인
    pub async fn resolve(&self, actor: Actor) -> MarketResult<Principal> {
        let shop = catalog::get_shop_by_user(&self.db_manager, actor.id).await?;
        Ok(Principal { actor, shop })
    }

    /// 상점 소유자 조회 (알림 수신자 결정용)
    pub async fn shop_owner(&self, shop_id: Uuid) -> MarketResult<Option<Uuid>> {
        let owner = catalog::get_shop_owner(&self.db_manager, shop_id).await?;
        if owner.is_none() {
            warn!("{:<12} --> 소유자가 없는 상점: {}", "Guard", shop_id);
        }
        Ok(owner)
    }
}
// endregion: --- Access Guard

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::model::OrderStatus;
    use chrono::Utc;

    fn shop_of(user_id: Uuid) -> Shop {
        Shop {
            id: Uuid::new_v4(),
            user_id,
            name: "중고나라".to_string(),
            description: String::new(),
            address: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(buyer_id: Uuid, shop_id: Uuid) -> Order {
        Order {
            id: Uuid::new_v4(),
            buyer_id,
            shop_id,
            total_price: 1000,
            status: OrderStatus::Pending,
            shipping_address: "서울".to_string(),
            shipping_courier: None,
            shipping_receipt: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("Seller".parse::<Role>().unwrap(), Role::Seller);
        assert!(matches!(
            "guest".parse::<Role>(),
            Err(MarketError::Unauthenticated(_))
        ));
    }

    #[test]
    fn require_role_denies_other_roles() {
        let actor = Actor::new(Uuid::new_v4(), Role::Buyer);
        assert!(actor.require_role(Role::Buyer).is_ok());
        assert!(matches!(
            actor.require_role(Role::Giver),
            Err(MarketError::RoleDenied(_))
        ));
    }

    #[test]
    fn order_management_requires_shop_owner_or_admin() {
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);
        let shop = shop_of(seller.id);
        let own_order = order(Uuid::new_v4(), shop.id);
        let other_order = order(Uuid::new_v4(), Uuid::new_v4());

        let principal = Principal {
            actor: seller,
            shop: Some(shop),
        };
        assert!(principal.can_manage_order(&own_order));
        assert!(!principal.can_manage_order(&other_order));

        let admin = Principal {
            actor: Actor::new(Uuid::new_v4(), Role::Admin),
            shop: None,
        };
        assert!(admin.can_manage_order(&other_order));
        assert!(matches!(admin.require_shop(), Err(MarketError::NoShopOwned)));
    }

    #[test]
    fn tracking_is_limited_to_buyer_or_admin() {
        let buyer = Actor::new(Uuid::new_v4(), Role::Buyer);
        let placed = order(buyer.id, Uuid::new_v4());
        let stranger = Actor::new(Uuid::new_v4(), Role::Buyer);
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        assert!(buyer.can_track_order(&placed));
        assert!(!stranger.can_track_order(&placed));
        assert!(admin.can_track_order(&placed));
    }
}
