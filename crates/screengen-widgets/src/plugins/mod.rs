//! Builtin widget plugins.

pub mod icon;
pub mod progress_bar;
pub mod sensor_text;
pub mod shapes;
pub mod text;
pub mod touch_area;

use screengen_core::Widget;

/// String prop with an empty-means-default fallback.
pub(crate) fn str_prop_or<'a>(w: &'a Widget, key: &str, default: &'a str) -> &'a str {
    match w.prop_str(key) {
        Some(s) if !s.is_empty() => s,
        _ => default,
    }
}

/// Integer prop where zero and missing both fall back to the default,
/// matching how the layout editor leaves unset numeric fields.
pub(crate) fn int_prop_or(w: &Widget, key: &str, default: i64) -> i64 {
    match w.prop_i64(key) {
        Some(v) if v != 0 => v,
        _ => default,
    }
}

/// printf format escaping for literal text fragments.
pub(crate) fn escape_fmt(s: &str) -> String {
    s.replace('%', "%%")
}

/// Round a half-pixel coordinate the way the editor canvas does.
pub(crate) fn round_mid(base: i32, span: i32) -> i32 {
    (base as f64 + span as f64 / 2.0).round() as i32
}
