/// 주문 조회
pub const GET_ORDER: &str = r#"
    SELECT id, buyer_id, shop_id, total_price, status, shipping_address, shipping_courier, shipping_receipt, created_at, updated_at
    FROM orders
    WHERE id = $1
"#;

/// 주문 잠금 조회 (상태 변경 직렬화)
pub const LOCK_ORDER_STATUS: &str = "SELECT status FROM orders WHERE id = $1 FOR UPDATE";

/// 주문 생성
pub const INSERT_ORDER: &str = r#"
    INSERT INTO orders (id, buyer_id, shop_id, total_price, status, shipping_address, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id, buyer_id, shop_id, total_price, status, shipping_address, shipping_courier, shipping_receipt, created_at, updated_at
"#;

/// 주문 상품 생성
pub const INSERT_ORDER_ITEM: &str = r#"
    INSERT INTO order_items (id, order_id, item_id, quantity, price)
    VALUES ($1, $2, $3, $4, $5)
"#;

/// 재고 차감 (재고가 부족하거나 비활성 상품이면 0행)
pub const DECREMENT_STOCK: &str = r#"
    UPDATE items
    SET stock = stock - $1, updated_at = NOW()
    WHERE id = $2 AND status = 'active' AND stock >= $1
"#;

/// 주문 상품 조회
pub const GET_ORDER_ITEMS: &str = r#"
    SELECT id, order_id, item_id, quantity, price
    FROM order_items
    WHERE order_id = $1
    ORDER BY item_id
"#;

/// 주문 상태 변경
pub const UPDATE_ORDER_STATUS: &str = r#"
    UPDATE orders
    SET status = $1, updated_at = NOW()
    WHERE id = $2
    RETURNING id, buyer_id, shop_id, total_price, status, shipping_address, shipping_courier, shipping_receipt, created_at, updated_at
"#;

/// 배송 정보 입력 (상태는 항상 shipped)
pub const UPDATE_ORDER_SHIPMENT: &str = r#"
    UPDATE orders
    SET shipping_courier = $1, shipping_receipt = $2, status = 'shipped', updated_at = NOW()
    WHERE id = $3
    RETURNING id, buyer_id, shop_id, total_price, status, shipping_address, shipping_courier, shipping_receipt, created_at, updated_at
"#;
