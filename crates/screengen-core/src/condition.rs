//! Compiles widget visibility conditions into C boolean expressions for
//! the display lambda.

use serde_json::Value;

use crate::entity::{is_binary_entity, is_positive_state, keyword_value, safe_id, BOOLEAN_KEYWORDS};
use crate::project::Widget;

/// A compiled visibility condition. `None` from [`compile_condition`]
/// means the widget is always visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCondition {
    expr: String,
}

impl CompiledCondition {
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Opening guard line, `if (expr) {`.
    pub fn open(&self) -> String {
        format!("if ({}) {{", self.expr)
    }

    pub fn close(&self) -> &'static str {
        "}"
    }
}

/// Marker-comment fragment describing the condition, attached to widget
/// marker lines so layouts survive a round-trip through the output.
pub fn condition_props(w: &Widget) -> String {
    let ent = w.condition_entity.as_deref().unwrap_or("").trim();
    if ent.is_empty() {
        return String::new();
    }
    let op = w.condition_operator.as_deref().unwrap_or("==");
    let mut s = format!(" cond_ent:\"{ent}\" cond_op:\"{op}\"");
    if op == "range" {
        if let Some(min) = &w.condition_min {
            s.push_str(&format!(" cond_min:\"{}\"", value_text(min)));
        }
        if let Some(max) = &w.condition_max {
            s.push_str(&format!(" cond_max:\"{}\"", value_text(max)));
        }
    } else if let Some(state) = &w.condition_state {
        s.push_str(&format!(" cond_state:\"{state}\""));
    }
    s
}

/// Compile the condition fields of a widget.
///
/// Binary-domain entities compare against the boolean state directly
/// (`== "off"` negates). Text comparisons are detected from a
/// `text_sensor.` prefix or a non-numeric, non-keyword state literal.
/// Everything else compares numerically, with boolean keywords coerced
/// to 0/1 and unparseable states to 0. Range bounds fall back to 0/100.
pub fn compile_condition(w: &Widget) -> Option<CompiledCondition> {
    let ent = w.condition_entity.as_deref().unwrap_or("").trim();
    if ent.is_empty() {
        return None;
    }

    let op = w.condition_operator.as_deref().unwrap_or("==");
    let state = w.condition_state.as_deref().unwrap_or("").trim();
    let state_lower = state.to_ascii_lowercase();

    let val_expr = format!("id({}).state", safe_id(ent));

    let is_binary = is_binary_entity(ent);
    let mut is_text = ent.starts_with("text_sensor.");
    if !is_text && !is_binary && op != "range" {
        let non_numeric = parse_float_prefix(state).is_none();
        if !state.is_empty() && non_numeric && !BOOLEAN_KEYWORDS.contains(&state_lower.as_str()) {
            is_text = true;
        }
    }

    let expr = match op {
        "==" | "!=" | ">" | "<" | ">=" | "<=" => {
            if is_text {
                format!("{val_expr} {op} \"{state}\"")
            } else if is_binary {
                let positive = is_positive_state(state);
                match op {
                    "==" => {
                        if positive {
                            val_expr
                        } else {
                            format!("!{val_expr}")
                        }
                    }
                    "!=" => {
                        if positive {
                            format!("!{val_expr}")
                        } else {
                            val_expr
                        }
                    }
                    _ => format!("(int){val_expr} {op} {}", if positive { 1 } else { 0 }),
                }
            } else {
                let num = parse_float_prefix(state)
                    .or_else(|| keyword_value(state))
                    .unwrap_or(0.0);
                format!("{val_expr} {op} {}", fmt_num(num))
            }
        }
        "range" => {
            let min = json_float(w.condition_min.as_ref()).unwrap_or(0.0);
            let max = json_float(w.condition_max.as_ref()).unwrap_or(100.0);
            format!(
                "{val_expr} >= {} && {val_expr} <= {}",
                fmt_num(min),
                fmt_num(max)
            )
        }
        _ => return None,
    };

    Some(CompiledCondition { expr })
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_float(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

/// Parse a leading float, ignoring trailing junk ("50%" -> 50.0).
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut end = 0;
    for (i, c) in s.char_indices() {
        if c.is_ascii_digit()
            || c == '.'
            || ((c == '-' || c == '+') && i == 0)
            || (c == 'e' || c == 'E') && end > 0
        {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    s[..end].parse().ok()
}

/// Print whole numbers without a fractional part, as the lambda does.
pub fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
