//! Entity-id helpers shared by the condition compiler and the sensor
//! registration passes.

/// Home Assistant domains whose states are boolean on/off.
pub const BINARY_DOMAINS: [&str; 8] = [
    "binary_sensor.",
    "switch.",
    "light.",
    "input_boolean.",
    "fan.",
    "cover.",
    "vacuum.",
    "lock.",
];

/// State literals that read as booleans rather than free text.
pub const BOOLEAN_KEYWORDS: [&str; 16] = [
    "on", "off", "true", "false", "open", "closed", "locked", "unlocked", "home", "not_home",
    "occupied", "clear", "active", "inactive", "detected", "idle",
];

/// Boolean keywords that map to the truthy side of a binary sensor.
pub const POSITIVE_STATES: [&str; 9] = [
    "on", "true", "1", "open", "locked", "home", "occupied", "active", "detected",
];

const NEGATIVE_STATES: [&str; 8] = [
    "off", "false", "closed", "unlocked", "not_home", "clear", "inactive", "idle",
];

/// ESPHome object id derived from an entity id. Everything outside
/// `[a-zA-Z0-9_]` becomes `_`, capped at ESPHome's 63-char id limit.
pub fn safe_id(entity: &str) -> String {
    let mut out: String = entity
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    out.truncate(63);
    out
}

pub fn is_binary_entity(entity: &str) -> bool {
    BINARY_DOMAINS.iter().any(|d| entity.starts_with(d))
}

pub fn is_text_entity(entity: &str) -> bool {
    entity.starts_with("text_sensor.")
}

pub fn is_positive_state(state: &str) -> bool {
    POSITIVE_STATES.contains(&state.trim().to_ascii_lowercase().as_str())
}

/// Numeric value a boolean keyword compares against, if it is one.
pub fn keyword_value(state: &str) -> Option<f64> {
    let lower = state.trim().to_ascii_lowercase();
    if POSITIVE_STATES.contains(&lower.as_str()) && lower != "1" {
        Some(1.0)
    } else if NEGATIVE_STATES.contains(&lower.as_str()) {
        Some(0.0)
    } else {
        None
    }
}

/// Prefix a bare entity name with a domain when none is present.
pub fn with_domain(entity: &str, domain: &str) -> String {
    if entity.contains('.') {
        entity.to_string()
    } else {
        format!("{domain}.{entity}")
    }
}
