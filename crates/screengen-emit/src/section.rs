//! Merges generated YAML sections into a base document so keys like
//! `sensor:` never appear twice at top level.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

/// Top-level keys whose list entries can safely be concatenated.
const MERGEABLE_SECTIONS: [&str; 26] = [
    "sensor:",
    "binary_sensor:",
    "text_sensor:",
    "font:",
    "image:",
    "output:",
    "light:",
    "switch:",
    "button:",
    "script:",
    "globals:",
    "i2c:",
    "spi:",
    "external_components:",
    "time:",
    "interval:",
    "fan:",
    "cover:",
    "climate:",
    "number:",
    "select:",
    "datetime:",
    "lock:",
    "alarm_control_panel:",
    "siren:",
    "media_player:",
];

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A trailing comment does not stop a line being a header.
    RE.get_or_init(|| Regex::new(r"^([a-z0-9_]+:)(\s*#.*)?$").expect("section header regex"))
}

/// Top-level section header of a line, if it is one. Indented lines
/// never match.
fn top_level_header(line: &str) -> Option<&str> {
    if line.starts_with(' ') || line.starts_with('\t') {
        return None;
    }
    header_re()
        .captures(line)
        .map(|c| c.get(1).map(|m| m.as_str()).unwrap_or(""))
}

struct ParsedDoc<'a> {
    sections: IndexMap<&'a str, Vec<&'a str>>,
    other_lines: Vec<&'a str>,
}

fn parse_sections(doc: &str) -> ParsedDoc<'_> {
    let mut sections: IndexMap<&str, Vec<&str>> = IndexMap::new();
    let mut other_lines = Vec::new();
    let mut current: Option<&str> = None;

    for line in doc.lines() {
        match top_level_header(line) {
            Some(header) if MERGEABLE_SECTIONS.contains(&header) => {
                current = Some(header);
                sections.entry(header).or_default();
            }
            Some(_) => {
                current = None;
                other_lines.push(line);
            }
            None => {
                if let Some(section) = current {
                    sections
                        .get_mut(section)
                        .map(|content| content.push(line));
                } else {
                    other_lines.push(line);
                }
            }
        }
    }

    ParsedDoc {
        sections,
        other_lines,
    }
}

/// Merge `extra` into `base`. Mergeable sections present in both end up
/// as one header with base content followed by extra content. Base
/// comments and non-mergeable sections pass through first, then the
/// merged sections in first-seen order, then any leftover extra lines
/// (duplicate top-level headers from `extra` are dropped).
pub fn merge_sections(base: &str, extra: &str) -> String {
    if extra.trim().is_empty() {
        return base.to_string();
    }
    if base.trim().is_empty() {
        return extra.to_string();
    }

    let base_parsed = parse_sections(base);
    let extra_parsed = parse_sections(extra);

    let mut merged = base_parsed.sections;
    for (header, content) in extra_parsed.sections {
        merged.entry(header).or_default().extend(content);
    }

    let mut out: Vec<String> = base_parsed
        .other_lines
        .iter()
        .map(|l| l.to_string())
        .collect();

    for (header, content) in &merged {
        if out.last().map(|l| !l.trim().is_empty()).unwrap_or(false) {
            out.push(String::new());
        }
        out.push(header.to_string());
        out.extend(content.iter().map(|l| l.to_string()));
    }

    for line in &extra_parsed.other_lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(header) = top_level_header(line) {
            let duplicate = base_parsed
                .other_lines
                .iter()
                .any(|bl| top_level_header(bl) == Some(header));
            if duplicate {
                continue;
            }
        }
        out.push(line.to_string());
    }

    let mut result = out
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_sensor_sections_become_one() {
        let base = "esphome:\n  name: dev\n\nsensor:\n  - platform: adc\n    pin: GPIO1\n";
        let extra = "sensor:\n  - platform: homeassistant\n    id: sensor_temp\n";
        let merged = merge_sections(base, extra);
        assert_eq!(merged.matches("sensor:").count(), 1);
        let sensor_pos = merged.find("sensor:").unwrap();
        let adc_pos = merged.find("platform: adc").unwrap();
        let ha_pos = merged.find("platform: homeassistant").unwrap();
        assert!(sensor_pos < adc_pos && adc_pos < ha_pos);
    }

    #[test]
    fn non_mergeable_base_sections_pass_through() {
        let base = "display:\n  - platform: ili9xxx\n    lambda: |-\n      it.fill(COLOR_WHITE);\n";
        let extra = "font:\n  - file: roboto\n";
        let merged = merge_sections(base, extra);
        assert!(merged.contains("display:"));
        assert!(merged.contains("it.fill(COLOR_WHITE);"));
        assert!(merged.contains("font:"));
    }

    #[test]
    fn duplicate_non_mergeable_header_from_extra_is_dropped() {
        let base = "display:\n  - platform: a\n";
        let extra = "display:\n";
        let merged = merge_sections(base, extra);
        assert_eq!(merged.matches("display:").count(), 1);
    }

    #[test]
    fn header_with_trailing_comment_still_merges() {
        let base = "sensor: # hardware sensors\n  - platform: adc\n";
        let extra = "sensor:\n  - platform: homeassistant\n";
        let merged = merge_sections(base, extra);
        // The clean header wins; both entries live under it.
        assert_eq!(merged.matches("sensor:").count(), 1);
        assert!(merged.contains("platform: adc"));
        assert!(merged.contains("platform: homeassistant"));
    }

    #[test]
    fn indented_keys_are_not_headers() {
        let base = "packages:\n  remote:\n    sensor: something\n";
        let extra = "sensor:\n  - platform: homeassistant\n";
        let merged = merge_sections(base, extra);
        assert!(merged.contains("    sensor: something"));
        assert!(merged.contains("\nsensor:\n  - platform: homeassistant"));
    }

    #[test]
    fn merge_is_a_union_and_idempotent_on_empty_extra() {
        let base = "globals:\n  - id: a\n\nscript:\n  - id: s\n";
        assert_eq!(merge_sections(base, ""), base);
        let merged = merge_sections(base, "globals:\n  - id: b\n");
        assert!(merged.contains("- id: a"));
        assert!(merged.contains("- id: b"));
        assert_eq!(merged.matches("globals:").count(), 1);
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        let merged = merge_sections("sensor:   \n  - platform: adc  \n", "font:\n  - file: f\n");
        for line in merged.lines() {
            assert_eq!(line, line.trim_end());
        }
    }
}
