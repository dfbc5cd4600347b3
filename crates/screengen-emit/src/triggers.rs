//! Injects deferred automation blocks into already-emitted sensor
//! entries, matched by `entity_id:`/`id:` lines.

use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Entity id (or object id) -> action lines to run when the sensor
/// updates. `BTreeSet` keeps both dedup and a stable injection order.
pub type PendingTriggers = IndexMap<String, BTreeSet<String>>;

fn entity_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(entity_id|id):\s*"?([^"]+)"?"#).expect("entity line regex")
    })
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Single pass over `lines`. For every sensor entry whose
/// `entity_id:`/`id:` value has pending actions: if the entry already
/// carries a `{trigger}:` automation, the actions are spliced into it
/// (after `then:`, or before its first list item); otherwise a fresh
/// `{trigger}:` block is appended right after the matched line. All
/// other lines pass through untouched.
pub fn inject_triggers(lines: &[String], pending: &PendingTriggers, trigger: &str) -> Vec<String> {
    if pending.is_empty() {
        return lines.to_vec();
    }

    let trigger_key = format!("{trigger}:");
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    // Actions waiting for the `then:` of an existing automation block.
    let mut splice: Option<(&BTreeSet<String>, bool)> = None;

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        out.push(line.clone());

        if let Some(caps) = entity_line_re().captures(line) {
            let ent = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            if let Some(actions) = pending.get(ent) {
                let indent = indent_of(line);
                let mut has_existing = false;
                for next in &lines[i + 1..] {
                    let next_trim = next.trim();
                    if next_trim.is_empty() {
                        continue;
                    }
                    if indent_of(next) <= indent && next_trim.starts_with('-') {
                        break;
                    }
                    if next_trim == trigger_key {
                        has_existing = true;
                        break;
                    }
                }
                if has_existing {
                    splice = Some((actions, false));
                } else {
                    let pad = " ".repeat(indent);
                    out.push(format!("{pad}{trigger_key}"));
                    out.push(format!("{pad}  then:"));
                    for action in actions {
                        for action_line in action.lines() {
                            out.push(format!("{pad}    {action_line}"));
                        }
                    }
                }
            }
        }

        if let Some((actions, found_key)) = splice {
            if trimmed == trigger_key {
                splice = Some((actions, true));
            } else if found_key {
                if trimmed == "then:" {
                    let pad = " ".repeat(indent_of(line) + 2);
                    for action in actions {
                        for action_line in action.lines() {
                            out.push(format!("{pad}{action_line}"));
                        }
                    }
                    splice = None;
                } else if trimmed.starts_with('-') {
                    let pad = " ".repeat(indent_of(line));
                    for action in actions {
                        for action_line in action.lines() {
                            out.push(format!("{pad}{action_line}"));
                        }
                    }
                    splice = None;
                }
            }
        }
    }

    out
}
