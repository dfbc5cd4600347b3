//! Per-compilation registry of fonts and icon glyphs. Plugins record
//! what they need during the pre-pass; the orchestrator renders the
//! whole `font:` section once at the end.

use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;
use tracing::debug;

const ICON_FONT_FAMILY: &str = "Material Design Icons";
const ICON_FONT_FILE: &str = "fonts/materialdesignicons-webfont.ttf";

/// Symbolic icon names resolvable without the full icon database.
const ICON_NAMES: [(&str, &str); 28] = [
    ("account", "F0004"),
    ("alert", "F0026"),
    ("battery", "F0079"),
    ("battery-50", "F007E"),
    ("battery-charging", "F0084"),
    ("battery-outline", "F0083"),
    ("calendar", "F00ED"),
    ("check-circle", "F05E0"),
    ("clock-outline", "F0150"),
    ("email", "F01EE"),
    ("fan", "F0210"),
    ("fire", "F0238"),
    ("flash", "F0241"),
    ("gauge", "F029A"),
    ("home", "F02DC"),
    ("information", "F02FC"),
    ("lightbulb", "F0335"),
    ("lock", "F033E"),
    ("lock-open", "F033F"),
    ("power", "F0425"),
    ("thermometer", "F050F"),
    ("water-percent", "F058E"),
    ("weather-cloudy", "F0590"),
    ("weather-night", "F0594"),
    ("weather-partly-cloudy", "F0595"),
    ("weather-rainy", "F0597"),
    ("weather-sunny", "F0599"),
    ("wifi", "F05A9"),
];

#[derive(Debug, Clone)]
struct FontDef {
    id: String,
    family: String,
    weight: u32,
    size: u32,
    italic: bool,
}

#[derive(Debug, Default)]
pub struct FontRegistry {
    defined_ids: IndexSet<String>,
    fonts: Vec<FontDef>,
    icon_codes_by_size: IndexMap<u32, BTreeSet<String>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font and return its id. Idempotent: the same
    /// family/weight/size/italic combination always yields one entry.
    pub fn add_font(&mut self, family: &str, weight: u32, size: u32, italic: bool) -> String {
        let id = font_id(family, weight, size, italic);
        if !self.defined_ids.insert(id.clone()) {
            return id;
        }
        // Icon fonts are emitted per tracked size, not per id.
        if family != ICON_FONT_FAMILY {
            self.fonts.push(FontDef {
                id: id.clone(),
                family: family.to_string(),
                weight,
                size,
                italic,
            });
        }
        id
    }

    /// Track an icon glyph at a pixel size. Accepts raw `FXXXX` codes
    /// or symbolic names (optionally `mdi:`-prefixed); names that do
    /// not resolve are dropped.
    pub fn track_icon(&mut self, name_or_code: &str, size: u32) {
        let raw = name_or_code.trim().trim_start_matches("mdi:");
        if raw.is_empty() {
            return;
        }
        let code = if is_icon_code(raw) {
            Some(raw.to_ascii_uppercase())
        } else {
            lookup_icon(raw)
        };
        match code {
            Some(code) => {
                self.icon_codes_by_size.entry(size).or_default().insert(code);
            }
            None => debug!(icon = raw, "unknown icon name, dropping"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.defined_ids.is_empty()
    }

    /// Render the `font:` section. A Roboto fallback is registered when
    /// nothing else asked for a font, so the section is never empty.
    pub fn render(&mut self, glyphsets: &[String], extended_latin: bool) -> Vec<String> {
        if self.defined_ids.is_empty() {
            self.add_font("Roboto", 400, 20, false);
        }

        let mut lines = vec!["font:".to_string()];

        for f in &self.fonts {
            lines.push("  - file:".to_string());
            lines.push("      type: gfonts".to_string());
            lines.push(format!("      family: \"{}\"", f.family));
            lines.push(format!("      weight: {}", f.weight));
            lines.push(format!("      italic: {}", f.italic));
            lines.push(format!("    id: {}", f.id));
            lines.push(format!("    size: {}", f.size));
            if !glyphsets.is_empty() {
                lines.push(format!("    glyphsets: [{}]", glyphsets.join(", ")));
                lines.push("    ignore_missing_glyphs: true".to_string());
            }
            if extended_latin || glyphsets.is_empty() {
                let glyphs = extended_glyphs()
                    .map(|g| format!("\"{g}\""))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!("    glyphs: [{glyphs}]"));
            }
        }

        for (size, codes) in &self.icon_codes_by_size {
            lines.push(format!("  - file: \"{ICON_FONT_FILE}\""));
            lines.push(format!(
                "    id: {}",
                font_id(ICON_FONT_FAMILY, 400, *size, false)
            ));
            lines.push(format!("    size: {size}"));
            let glyphs = codes
                .iter()
                .map(|c| format!("\"\\U000{c}\""))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("    glyphs: [{glyphs}]"));
        }

        lines
    }
}

/// Deterministic font id: `font_{family}_{weight}_{size}[_italic]`.
pub fn font_id(family: &str, weight: u32, size: u32, italic: bool) -> String {
    let safe_family = family
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    let italic_suffix = if italic { "_italic" } else { "" };
    format!("font_{safe_family}_{weight}_{size}{italic_suffix}")
}

pub fn is_icon_code(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 5
        && (b[0] == b'F' || b[0] == b'f')
        && b[1..].iter().all(|c| c.is_ascii_hexdigit())
}

fn lookup_icon(name: &str) -> Option<String> {
    let lower = name.to_ascii_lowercase();
    ICON_NAMES
        .iter()
        .find(|(n, _)| *n == lower)
        .map(|(_, code)| code.to_string())
}

/// ASCII 32-126, Latin-1 160-255 plus a handful of technical glyphs.
fn extended_glyphs() -> impl Iterator<Item = String> {
    (32u32..=126)
        .chain(160..=255)
        .map(|cp| format!("\\U{cp:08X}"))
        .chain(
            ["\\U000003BC", "\\U000003A9", "\\U000020AC", "\\U00002122"]
                .into_iter()
                .map(String::from),
        )
}
