use crate::catalog::model::Item;
use crate::error::{MarketError, MarketResult, StatusParseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// 주문 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(StatusParseError {
                kind: "order",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// 주문 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub shop_id: Uuid,
    pub total_price: i64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub shipping_address: String,
    pub shipping_courier: Option<String>,
    pub shipping_receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// 알림 메시지용 짧은 주문 번호
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

// 주문 상품 모델 (주문 시점 가격 보관)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

/// 주문 + 주문 상품
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// region:    --- Inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderInput {
    pub items: Vec<OrderLineInput>,
    pub shipping_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusInput {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingReceiptInput {
    pub shipping_courier: String,
    pub shipping_receipt: String,
}

impl ShippingReceiptInput {
    pub fn validate(&self) -> MarketResult<(String, String)> {
        let courier = self.shipping_courier.trim();
        let receipt = self.shipping_receipt.trim();
        if courier.is_empty() || receipt.is_empty() {
            return Err(MarketError::Validation(
                "택배사와 운송장 번호는 필수입니다.".to_string(),
            ));
        }
        Ok((courier.to_string(), receipt.to_string()))
    }
}
// endregion: --- Inputs

// region:    --- Order Draft
/// 같은 상품을 가리키는 주문 라인을 합친다 (상품 ID 순 정렬)
pub fn merge_lines(lines: &[OrderLineInput]) -> MarketResult<BTreeMap<Uuid, i32>> {
    if lines.is_empty() {
        return Err(MarketError::Validation(
            "주문 상품이 비어 있습니다.".to_string(),
        ));
    }

    let mut merged = BTreeMap::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(MarketError::Validation(format!(
                "수량은 1 이상이어야 합니다 (상품 {})",
                line.item_id
            )));
        }
        let quantity = merged.entry(line.item_id).or_insert(0i32);
        *quantity = quantity.checked_add(line.quantity).ok_or_else(|| {
            MarketError::Validation(format!("수량이 너무 큽니다 (상품 {})", line.item_id))
        })?;
    }
    Ok(merged)
}

/// 검증이 끝난 주문 초안
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDraft {
    /// 재고/상태 검증, 단일 상점 확인, 가격 스냅샷으로 총액 계산
    pub fn build(
        buyer_id: Uuid,
        shipping_address: &str,
        lines: Vec<(Item, i32)>,
    ) -> MarketResult<Self> {
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(MarketError::Validation("배송지는 필수입니다.".to_string()));
        }
        if lines.is_empty() {
            return Err(MarketError::Validation(
                "주문 상품이 비어 있습니다.".to_string(),
            ));
        }

        for (item, quantity) in &lines {
            if !item.can_fulfil(*quantity) {
                return Err(MarketError::InvalidItem(format!(
                    "{} (상태: {}, 재고: {}, 요청: {})",
                    item.name, item.status, item.stock, quantity
                )));
            }
        }

        let shops: HashSet<Uuid> = lines.iter().map(|(item, _)| item.shop_id).collect();
        if shops.len() != 1 {
            return Err(MarketError::MultiShopUnsupported);
        }
        let shop_id = lines[0].0.shop_id;

        let mut total_price: i64 = 0;
        for (item, quantity) in &lines {
            total_price = item
                .price
                .checked_mul(i64::from(*quantity))
                .and_then(|subtotal| total_price.checked_add(subtotal))
                .ok_or_else(|| MarketError::Validation("주문 금액이 너무 큽니다.".to_string()))?;
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            buyer_id,
            shop_id,
            total_price,
            status: OrderStatus::Pending,
            shipping_address: shipping_address.to_string(),
            shipping_courier: None,
            shipping_receipt: None,
            created_at: now,
            updated_at: now,
        };
        let items = lines
            .iter()
            .map(|(item, quantity)| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                item_id: item.id,
                quantity: *quantity,
                price: item.price,
            })
            .collect();

        Ok(Self { order, items })
    }
}
// endregion: --- Order Draft

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::ItemStatus;

    fn item(shop_id: Uuid, price: i64, stock: i32, status: ItemStatus) -> Item {
        Item {
            id: Uuid::new_v4(),
            shop_id,
            category_id: Some(Uuid::new_v4()),
            name: "책상".to_string(),
            description: String::new(),
            price,
            stock,
            condition: "used".to_string(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
    }

    #[test]
    fn merges_lines_for_the_same_item() {
        let item_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();
        let merged = merge_lines(&[
            OrderLineInput {
                item_id,
                quantity: 1,
            },
            OrderLineInput {
                item_id: other_id,
                quantity: 4,
            },
            OrderLineInput {
                item_id,
                quantity: 2,
            },
        ])
        .unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&item_id], 3);
        assert_eq!(merged[&other_id], 4);
    }

    #[test]
    fn rejects_empty_or_non_positive_lines() {
        assert!(matches!(merge_lines(&[]), Err(MarketError::Validation(_))));
        assert!(matches!(
            merge_lines(&[OrderLineInput {
                item_id: Uuid::new_v4(),
                quantity: 0,
            }]),
            Err(MarketError::Validation(_))
        ));
    }

    #[test]
    fn snapshots_total_price() {
        let shop_id = Uuid::new_v4();
        let chair = item(shop_id, 15_000, 5, ItemStatus::Active);
        let lamp = item(shop_id, 7_500, 2, ItemStatus::Active);
        let buyer_id = Uuid::new_v4();

        let draft =
            OrderDraft::build(buyer_id, " 서울시 마포구 ", vec![(chair.clone(), 3), (lamp, 2)])
                .unwrap();

        assert_eq!(draft.order.total_price, 15_000 * 3 + 7_500 * 2);
        assert_eq!(draft.order.shop_id, shop_id);
        assert_eq!(draft.order.status, OrderStatus::Pending);
        assert_eq!(draft.order.shipping_address, "서울시 마포구");
        assert_eq!(draft.items.len(), 2);
        assert!(draft.items.iter().all(|i| i.order_id == draft.order.id));
        assert_eq!(draft.items[0].item_id, chair.id);
        assert_eq!(draft.items[0].price, 15_000);
    }

    #[test]
    fn rejects_multi_shop_orders() {
        let a = item(Uuid::new_v4(), 1_000, 5, ItemStatus::Active);
        let b = item(Uuid::new_v4(), 1_000, 5, ItemStatus::Active);
        assert!(matches!(
            OrderDraft::build(Uuid::new_v4(), "부산", vec![(a, 1), (b, 1)]),
            Err(MarketError::MultiShopUnsupported)
        ));
    }

    #[test]
    fn rejects_inactive_or_understocked_items() {
        let shop_id = Uuid::new_v4();
        let draft = item(shop_id, 1_000, 5, ItemStatus::Draft);
        assert!(matches!(
            OrderDraft::build(Uuid::new_v4(), "부산", vec![(draft, 1)]),
            Err(MarketError::InvalidItem(_))
        ));

        let scarce = item(shop_id, 1_000, 2, ItemStatus::Active);
        assert!(matches!(
            OrderDraft::build(Uuid::new_v4(), "부산", vec![(scarce, 3)]),
            Err(MarketError::InvalidItem(_))
        ));
    }

    #[test]
    fn requires_shipping_address() {
        let chair = item(Uuid::new_v4(), 1_000, 5, ItemStatus::Active);
        assert!(matches!(
            OrderDraft::build(Uuid::new_v4(), "   ", vec![(chair, 1)]),
            Err(MarketError::Validation(_))
        ));
    }

    #[test]
    fn shipping_input_must_not_be_blank() {
        let input = ShippingReceiptInput {
            shipping_courier: " JNE ".to_string(),
            shipping_receipt: "".to_string(),
        };
        assert!(input.validate().is_err());

        let input = ShippingReceiptInput {
            shipping_courier: " JNE ".to_string(),
            shipping_receipt: "RCPT-001".to_string(),
        };
        assert_eq!(
            input.validate().unwrap(),
            ("JNE".to_string(), "RCPT-001".to_string())
        );
    }
}
