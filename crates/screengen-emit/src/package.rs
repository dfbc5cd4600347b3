//! Cleanup of fetched hardware packages before they are merged with
//! generated content.

/// Top-level keys a user's own config already provides. Blocks under
/// them are commented out so the merged snippet drops in without
/// conflicts.
const SYSTEM_KEYS: [&str; 13] = [
    "esphome:",
    "esp32:",
    "psram:",
    "wifi:",
    "api:",
    "ota:",
    "logger:",
    "web_server:",
    "captive_portal:",
    "platformio_options:",
    "preferences:",
    "substitutions:",
    "deep_sleep:",
];

pub const LAMBDA_PLACEHOLDER: &str = "# __LAMBDA_PLACEHOLDER__";
pub const TOUCH_PLACEHOLDER: &str = "# __TOUCH_SENSORS_PLACEHOLDER__";

/// Comment out system-level top-level blocks, leaving everything else
/// byte-identical. Blank lines inside a commented block stay blank.
pub fn comment_out_system_sections(yaml: &str) -> String {
    if yaml.is_empty() {
        return String::new();
    }
    let mut out = Vec::new();
    let mut in_system_block = false;

    for line in yaml.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push(line.to_string());
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        if indent == 0 && trimmed.ends_with(':') {
            in_system_block = SYSTEM_KEYS.iter().any(|k| trimmed.starts_with(k));
            if in_system_block {
                out.push(format!("# {line} # (Auto-commented)"));
            } else {
                out.push(line.to_string());
            }
        } else if in_system_block {
            out.push(format!("# {line}"));
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n")
}

/// Replace the lambda and touch-sensor placeholder comments in a
/// package with generated content, keeping the placeholder's
/// indentation for every inserted line.
pub fn substitute_placeholders(
    package: &str,
    lambda_lines: &[String],
    touch_lines: &[String],
) -> String {
    let mut out = Vec::new();
    for line in package.lines() {
        let trimmed = line.trim();
        if trimmed == LAMBDA_PLACEHOLDER {
            indent_into(&mut out, line, lambda_lines);
        } else if trimmed == TOUCH_PLACEHOLDER {
            indent_into(&mut out, line, touch_lines);
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n")
}

fn indent_into(out: &mut Vec<String>, placeholder_line: &str, content: &[String]) {
    let pad = &placeholder_line[..placeholder_line.len() - placeholder_line.trim_start().len()];
    for line in content {
        if line.is_empty() {
            out.push(String::new());
        } else {
            out.push(format!("{pad}{line}"));
        }
    }
}
