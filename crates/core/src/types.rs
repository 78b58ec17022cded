/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque user identifier. Identity lives outside this system.
pub type UserId = DbId;

/// Type-specific block fields, stored as a JSON object.
pub type Payload = serde_json::Map<String, serde_json::Value>;
