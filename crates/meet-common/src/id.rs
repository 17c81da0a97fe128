pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Identifier for a participant that joined without supplying one.
pub fn new_member_id() -> String {
    format!("user-{}", new_id())
}

pub fn new_message_id() -> String {
    format!("msg-{}", new_id())
}

/// Short shareable room identifier, e.g. `room-1a2b3c4d`.
pub fn new_room_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "room-{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// Milliseconds since the Unix epoch, the `at` field on the wire.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
