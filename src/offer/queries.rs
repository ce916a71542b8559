/// 제안 생성
pub const INSERT_OFFER: &str = r#"
    INSERT INTO offers (id, giver_id, seller_id, item_name, description, image_url, expected_price, condition, location, status, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    RETURNING id, giver_id, seller_id, item_name, description, image_url, expected_price, agreed_price, condition, location, status, created_at, updated_at
"#;

/// 기부자가 작성한 제안 목록
pub const GET_OFFERS_BY_GIVER: &str = r#"
    SELECT id, giver_id, seller_id, item_name, description, image_url, expected_price, agreed_price, condition, location, status, created_at, updated_at
    FROM offers
    WHERE giver_id = $1
    ORDER BY created_at DESC
"#;

/// 판매자 수신함: 지정 제안(모든 상태) + 대기 중인 공개 제안
pub const GET_OFFERS_FOR_SELLER: &str = r#"
    SELECT id, giver_id, seller_id, item_name, description, image_url, expected_price, agreed_price, condition, location, status, created_at, updated_at
    FROM (
        SELECT * FROM offers WHERE seller_id = $1
        UNION ALL
        SELECT * FROM offers WHERE seller_id IS NULL AND status = 'pending'
    ) inbox
    ORDER BY created_at DESC
    LIMIT $2
"#;

/// 제안 잠금 조회
pub const LOCK_OFFER: &str = r#"
    SELECT id, giver_id, seller_id, item_name, description, image_url, expected_price, agreed_price, condition, location, status, created_at, updated_at
    FROM offers
    WHERE id = $1
    FOR UPDATE
"#;

/// 제안 수락 (공개 제안은 수락한 판매자가 가져간다)
pub const ACCEPT_OFFER: &str = r#"
    UPDATE offers
    SET status = 'accepted', agreed_price = $1, seller_id = COALESCE(seller_id, $2), updated_at = NOW()
    WHERE id = $3
    RETURNING id, giver_id, seller_id, item_name, description, image_url, expected_price, agreed_price, condition, location, status, created_at, updated_at
"#;

/// 제안 거절
pub const REJECT_OFFER: &str = r#"
    UPDATE offers
    SET status = 'rejected', updated_at = NOW()
    WHERE id = $1
    RETURNING id, giver_id, seller_id, item_name, description, image_url, expected_price, agreed_price, condition, location, status, created_at, updated_at
"#;
