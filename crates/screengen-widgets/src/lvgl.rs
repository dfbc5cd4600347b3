//! LVGL descriptor model and its YAML serialization. Plugins return an
//! [`LvglWidget`] tree; the orchestrator serializes it under the
//! `lvgl:` section with scalar quoting and `!lambda` pass-through.

use indexmap::IndexMap;
use screengen_core::Widget;

use crate::fonts::font_id;

pub type Attrs = IndexMap<String, LvglValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum LvglValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<LvglValue>),
    Map(Attrs),
}

impl From<&str> for LvglValue {
    fn from(s: &str) -> Self {
        LvglValue::Str(s.to_string())
    }
}

impl From<String> for LvglValue {
    fn from(s: String) -> Self {
        LvglValue::Str(s)
    }
}

impl From<i64> for LvglValue {
    fn from(v: i64) -> Self {
        LvglValue::Int(v)
    }
}

impl From<i32> for LvglValue {
    fn from(v: i32) -> Self {
        LvglValue::Int(v as i64)
    }
}

impl From<bool> for LvglValue {
    fn from(v: bool) -> Self {
        LvglValue::Bool(v)
    }
}

/// One LVGL widget: the YAML key (`label`, `obj`, `bar`, ...) and its
/// attribute map.
#[derive(Debug, Clone)]
pub struct LvglWidget {
    pub kind: String,
    pub attrs: Attrs,
}

impl LvglWidget {
    pub fn new(kind: &str, attrs: Attrs) -> Self {
        LvglWidget {
            kind: kind.to_string(),
            attrs,
        }
    }
}

/// Read-only helpers passed to `export_lvgl`.
pub struct LvglContext {
    pub has_touch: bool,
}

/// Common attributes every LVGL widget starts from.
pub fn common_attrs(w: &Widget) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("id".into(), LvglValue::Str(w.id.clone()));
    attrs.insert("x".into(), w.x.into());
    attrs.insert("y".into(), w.y.into());
    attrs.insert("width".into(), w.width.into());
    attrs.insert("height".into(), w.height.into());
    attrs
}

/// Hex or named color into the quoted form LVGL expects.
pub fn convert_color(c: &str) -> String {
    if c.is_empty() || c == "transparent" || c == "theme_auto" {
        return "\"0x000000\"".to_string();
    }
    if let Some(hex) = c.strip_prefix('#') {
        return format!("\"0x{}\"", hex.to_ascii_uppercase());
    }
    format!("\"{c}\"")
}

pub fn lvgl_font(family: &str, weight: u32, size: u32, italic: bool) -> String {
    font_id(family, weight, size, italic)
}

/// 0-255 opacity into LVGL's `cover`/`transp`/percentage form.
pub fn format_opacity(opa: Option<i64>) -> String {
    match opa {
        None => "cover".to_string(),
        Some(v) if v >= 255 => "cover".to_string(),
        Some(v) if v <= 0 => "transp".to_string(),
        Some(v) => format!("{}%", ((v as f64 / 255.0) * 100.0).round() as i64),
    }
}

/// Marker comment a layout round-trips through: geometry plus all
/// extended props as JSON scalars on one line.
pub fn widget_marker(w: &Widget) -> String {
    let mut parts = vec![
        format!("# widget:{}", w.kind),
        format!("id:{}", w.id),
        format!("type:{}", w.kind),
        format!("x:{}", w.x),
        format!("y:{}", w.y),
        format!("w:{}", w.width),
        format!("h:{}", w.height),
    ];
    if let Some(entity) = w.entity_id.as_deref().filter(|e| !e.is_empty()) {
        parts.push(format!("entity:{entity}"));
    }
    for (k, v) in &w.props {
        if v.is_null() {
            continue;
        }
        if let Some(s) = v.as_str() {
            if s.is_empty() {
                continue;
            }
        }
        if matches!(k.as_str(), "id" | "type" | "x" | "y" | "w" | "h" | "entity_id") {
            continue;
        }
        parts.push(format!("{k}:{v}"));
    }
    parts.join(" ").replace(['\r', '\n'], " ")
}

/// Recursively serialize an attribute map to YAML lines at the given
/// indent. Empty strings are skipped, multi-line `!lambda` strings are
/// re-indented under the key, other multi-line strings become block
/// scalars.
pub fn serialize_attrs(attrs: &Attrs, lines: &mut Vec<String>, indent: usize) {
    let pad = " ".repeat(indent);
    for (key, val) in attrs {
        match val {
            LvglValue::Str(s) if s.is_empty() => {}
            LvglValue::Str(s) if s.contains('\n') => {
                let parts: Vec<&str> = s.split('\n').collect();
                if s.trim_start().starts_with("!lambda") {
                    lines.push(format!("{pad}{key}: {}", parts[0].trim()));
                    let min_indent = parts[1..]
                        .iter()
                        .filter(|l| !l.trim().is_empty())
                        .map(|l| l.len() - l.trim_start().len())
                        .min()
                        .unwrap_or(0);
                    for part in &parts[1..] {
                        if part.trim().is_empty() {
                            lines.push(format!("{pad}  "));
                        } else {
                            lines.push(format!("{pad}  {}", &part[min_indent..]));
                        }
                    }
                } else {
                    lines.push(format!("{pad}{key}: |-"));
                    for part in parts {
                        lines.push(format!("{pad}  {part}"));
                    }
                }
            }
            LvglValue::Str(s) => lines.push(format!("{pad}{key}: {}", safe_yaml_value(s))),
            LvglValue::Int(v) => lines.push(format!("{pad}{key}: {v}")),
            LvglValue::Float(v) => lines.push(format!("{pad}{key}: {v}")),
            LvglValue::Bool(v) => lines.push(format!("{pad}{key}: {v}")),
            LvglValue::List(items) => {
                if items.is_empty() {
                    lines.push(format!("{pad}{key}: []"));
                } else {
                    lines.push(format!("{pad}{key}:"));
                    for item in items {
                        match item {
                            LvglValue::Map(m) => {
                                lines.push(format!("{pad}  -"));
                                serialize_attrs(m, lines, indent + 4);
                            }
                            LvglValue::Str(s) => {
                                lines.push(format!("{pad}  - {}", safe_yaml_value(s)))
                            }
                            LvglValue::Int(v) => lines.push(format!("{pad}  - {v}")),
                            LvglValue::Float(v) => lines.push(format!("{pad}  - {v}")),
                            LvglValue::Bool(v) => lines.push(format!("{pad}  - {v}")),
                            LvglValue::List(_) => {}
                        }
                    }
                }
            }
            LvglValue::Map(m) => {
                lines.push(format!("{pad}{key}:"));
                serialize_attrs(m, lines, indent + 2);
            }
        }
    }
}

/// Quote a scalar when YAML would otherwise misread it: leading
/// indicator characters, boolean-ish literals, or embedded `: ` / ` #`
/// sequences. Already-quoted strings and `!lambda`/`!secret` tags pass
/// through untouched.
pub fn safe_yaml_value(val: &str) -> String {
    let trimmed = val.trim();
    let quoted = (val.starts_with('"') && val.ends_with('"') && val.len() >= 2)
        || (val.starts_with('\'') && val.ends_with('\'') && val.len() >= 2);
    if quoted || trimmed.starts_with("!lambda") || trimmed.starts_with("!secret") {
        return val.to_string();
    }

    let leading = trimmed
        .chars()
        .next()
        .map(|c| "*&!|>%@,-{}[]?#:".contains(c))
        .unwrap_or(false);
    let reserved = matches!(
        trimmed.to_ascii_lowercase().as_str(),
        "true" | "false" | "null" | "yes" | "no"
    );
    if leading || reserved || trimmed.contains(": ") || trimmed.contains(" #") {
        let escaped = val.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("\"{escaped}\"");
    }
    val.to_string()
}
