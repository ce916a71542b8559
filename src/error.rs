// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;
// endregion: --- Imports

// region:    --- Market Error
/// 엔진 공통 에러
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("잘못된 요청입니다: {0}")]
    Validation(String),
    #[error("주문할 수 없는 상품입니다: {0}")]
    InvalidItem(String),
    #[error("여러 상점의 상품을 한 번에 주문할 수 없습니다.")]
    MultiShopUnsupported,
    #[error("인증 정보가 없거나 올바르지 않습니다: {0}")]
    Unauthenticated(String),
    #[error("접근 권한이 없는 역할입니다: {0}")]
    RoleDenied(String),
    #[error("권한이 없습니다: {0}")]
    Unauthorized(String),
    #[error("다른 판매자에게 보낸 제안이거나 소유자가 아닙니다.")]
    NotSellerOrOwner,
    #[error("상점을 소유하고 있지 않습니다.")]
    NoShopOwned,
    #[error("제안을 찾을 수 없습니다.")]
    OfferNotFound,
    #[error("주문을 찾을 수 없습니다.")]
    OrderNotFound,
    #[error("상품을 찾을 수 없습니다.")]
    ItemNotFound,
    #[error("현재 상태에서 처리할 수 없습니다: {0}")]
    StateConflict(String),
    #[error("저장소 응답 시간 초과")]
    Timeout,
    #[error("데이터베이스 오류: {0}")]
    Database(sqlx::Error),
    #[error("메시지 브로커 오류: {0}")]
    Broker(String),
    #[error("설정 오류: {0}")]
    Config(String),
}

impl MarketError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidItem(_) | Self::MultiShopUnsupported => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::RoleDenied(_)
            | Self::Unauthorized(_)
            | Self::NotSellerOrOwner
            | Self::NoShopOwned => StatusCode::FORBIDDEN,
            Self::OfferNotFound | Self::OrderNotFound | Self::ItemNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::StateConflict(_) => StatusCode::CONFLICT,
            Self::Timeout | Self::Database(_) | Self::Broker(_) | Self::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidItem(_) => "INVALID_ITEM",
            Self::MultiShopUnsupported => "MULTI_SHOP_UNSUPPORTED",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::RoleDenied(_) => "ROLE_DENIED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotSellerOrOwner => "NOT_SELLER_OR_OWNER",
            Self::NoShopOwned => "NO_SHOP_OWNED",
            Self::OfferNotFound => "OFFER_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::ItemNotFound => "ITEM_NOT_FOUND",
            Self::StateConflict(_) => "STATE_CONFLICT",
            Self::Timeout => "TIMEOUT",
            Self::Database(_) | Self::Broker(_) | Self::Config(_) => "INTERNAL_ERROR",
        }
    }
}

/// 외래 키 위반은 존재하지 않는 대상을 참조한 입력 오류로 본다
impl From<sqlx::Error> for MarketError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_foreign_key_violation() {
                return MarketError::Validation(format!(
                    "존재하지 않는 대상을 참조합니다 ({})",
                    db_err.constraint().unwrap_or("unknown")
                ));
            }
        }
        MarketError::Database(e)
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{:<12} --> 내부 오류: {}", "Handler", self);
            "서버 내부 오류가 발생했습니다.".to_string()
        } else {
            self.to_string()
        };
        (
            status,
            Json(serde_json::json!({
                "error": message,
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
// endregion: --- Market Error

/// 엔진 결과 타입
pub type MarketResult<T> = Result<T, MarketError>;

/// 저장된 상태 문자열을 열거형으로 바꾸지 못했을 때
#[derive(Debug, Error)]
#[error("알 수 없는 {kind} 상태: {value}")]
pub struct StatusParseError {
    pub kind: &'static str,
    pub value: String,
}

impl From<StatusParseError> for MarketError {
    fn from(e: StatusParseError) -> Self {
        MarketError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_http_status() {
        assert_eq!(
            MarketError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MarketError::MultiShopUnsupported.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MarketError::RoleDenied("giver".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(MarketError::NotSellerOrOwner.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(MarketError::OfferNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            MarketError::StateConflict("accepted".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            MarketError::Database(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_share_one_code() {
        assert_eq!(MarketError::Broker("down".into()).code(), "INTERNAL_ERROR");
        assert_eq!(MarketError::Timeout.code(), "TIMEOUT");
    }

    #[test]
    fn response_carries_status() {
        let response = MarketError::OrderNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
