use chrono::Utc;

/// Wall-clock seconds since the epoch; stamps room events.
pub fn now_secs() -> i64 { Utc::now().timestamp() }

/// Wall-clock milliseconds since the epoch; stamps pong replies.
pub fn now_millis() -> i64 { Utc::now().timestamp_millis() }
