/// 상품 조회
pub const GET_ITEM: &str = "SELECT id, shop_id, category_id, name, description, price, stock, condition, status, created_at, updated_at FROM items WHERE id = $1";

/// 마켓 상품 목록 (활성 상품만, 선택 조건은 NULL이면 무시)
pub const LIST_MARKET_ITEMS: &str = r#"
    SELECT id, shop_id, category_id, name, description, price, stock, condition, status, created_at, updated_at
    FROM items
    WHERE status = 'active'
      AND ($1::TEXT IS NULL OR name ILIKE $1 OR description ILIKE $1)
      AND ($2::UUID IS NULL OR category_id = $2)
      AND ($3::BIGINT IS NULL OR price >= $3)
      AND ($4::BIGINT IS NULL OR price <= $4)
    ORDER BY created_at DESC
    LIMIT $5 OFFSET $6
"#;

/// 드래프트 상품 생성
pub const INSERT_ITEM: &str = r#"
    INSERT INTO items (id, shop_id, category_id, name, description, price, stock, condition, status, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
    RETURNING id, shop_id, category_id, name, description, price, stock, condition, status, created_at, updated_at
"#;

/// 사용자 소유 상점 조회
pub const GET_SHOP_BY_USER: &str = "SELECT id, user_id, name, description, address, created_at, updated_at FROM shops WHERE user_id = $1";

/// 상점 소유자 조회
pub const GET_SHOP_OWNER: &str = "SELECT user_id FROM shops WHERE id = $1";
