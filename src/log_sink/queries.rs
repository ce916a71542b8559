/// 이력 저장
pub const INSERT_HISTORY_STATUS: &str = r#"
    INSERT INTO history_status (id, related_id, related_type, old_status, new_status, changed_by, timestamp, note)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

/// 알림 저장
pub const INSERT_NOTIFICATION: &str = r#"
    INSERT INTO notifications (id, user_id, title, message, type, related_id, is_read, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

/// 대상별 이력 조회
pub const GET_HISTORY_BY_RELATED_ID: &str = r#"
    SELECT id, related_id, related_type, old_status, new_status, changed_by, timestamp, note
    FROM history_status
    WHERE related_id = $1
    ORDER BY timestamp ASC
"#;

/// 사용자별 알림 조회
pub const GET_NOTIFICATIONS_BY_USER: &str = r#"
    SELECT id, user_id, title, message, type, related_id, is_read, created_at
    FROM notifications
    WHERE user_id = $1
    ORDER BY created_at DESC
"#;
