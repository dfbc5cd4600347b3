use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project has no pages")]
    NoPages,
    #[error("widget '{0}' has no type tag")]
    MissingType(String),
}

/// Display orientation as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

/// How the output renders widgets. `Auto` picks LVGL when the device or
/// the widget set asks for it, direct drawing-lambda mode otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderingMode {
    #[default]
    Auto,
    Direct,
    Lvgl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageTheme {
    #[default]
    Inherit,
    Light,
    Dark,
}

/// Pin assignments and display description for devices that are not in
/// the builtin profile table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomHardware {
    #[serde(default)]
    pub chip: String,
    #[serde(default)]
    pub board: String,
    #[serde(default)]
    pub display_platform: String,
    #[serde(default)]
    pub display_model: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Pin role -> pin name, e.g. `"cs" -> "GPIO10"`.
    #[serde(default)]
    pub pins: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: String,
    pub device_model: String,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub dark_mode: bool,
    /// Default page refresh period in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u32,
    #[serde(default)]
    pub rendering_mode: RenderingMode,
    /// ESPHome glyphset names; empty means explicit glyph lists.
    #[serde(default)]
    pub glyphsets: Vec<String>,
    #[serde(default = "default_true")]
    pub extended_latin_glyphs: bool,
    #[serde(default)]
    pub custom_hardware: Option<CustomHardware>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

fn default_refresh_interval() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

impl Project {
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.pages.is_empty() {
            return Err(ProjectError::NoPages);
        }
        for page in &self.pages {
            for w in &page.widgets {
                if w.kind.trim().is_empty() {
                    return Err(ProjectError::MissingType(w.id.clone()));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub theme: PageTheme,
    /// Per-page refresh override in seconds.
    #[serde(default)]
    pub refresh_time: Option<u32>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

impl Page {
    /// Effective dark mode for this page given the project default.
    pub fn dark_mode(&self, project_dark: bool) -> bool {
        match self.theme {
            PageTheme::Inherit => project_dark,
            PageTheme::Light => false,
            PageTheme::Dark => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    #[serde(default)]
    pub entity_id: Option<String>,
    /// Secondary entity for widgets that show two values.
    #[serde(default)]
    pub entity_id_2: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub condition_entity: Option<String>,
    #[serde(default)]
    pub condition_operator: Option<String>,
    #[serde(default)]
    pub condition_state: Option<String>,
    #[serde(default)]
    pub condition_min: Option<Value>,
    #[serde(default)]
    pub condition_max: Option<Value>,
    #[serde(default)]
    pub props: IndexMap<String, Value>,
}

impl Widget {
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// Numeric prop; accepts JSON numbers and numeric strings.
    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        match self.props.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn prop_i64(&self, key: &str) -> Option<i64> {
        self.prop_f64(key).map(|v| v as i64)
    }

    /// Boolean prop; accepts JSON booleans and the strings
    /// "true"/"false" that round-trip through form inputs.
    pub fn prop_bool(&self, key: &str) -> Option<bool> {
        match self.props.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn entity(&self) -> &str {
        self.entity_id.as_deref().unwrap_or("").trim()
    }

    pub fn entity2(&self) -> &str {
        self.entity_id_2.as_deref().unwrap_or("").trim()
    }

    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Widget id as a C identifier fragment.
    pub fn ident(&self) -> String {
        self.id.replace('-', "_")
    }
}

/// Escape a string for embedding inside a double-quoted YAML/C literal.
pub fn escape_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_props_accept_stringly_values() {
        let w: Widget = serde_json::from_value(serde_json::json!({
            "id": "w1",
            "type": "text",
            "props": { "font_size": "24", "show_label": "false", "fill": true }
        }))
        .unwrap();
        assert_eq!(w.prop_i64("font_size"), Some(24));
        assert_eq!(w.prop_bool("show_label"), Some(false));
        assert_eq!(w.prop_bool("fill"), Some(true));
        assert_eq!(w.prop_bool("missing"), None);
    }

    #[test]
    fn page_theme_overrides_project_dark_mode() {
        let mut page = Page {
            name: "p".into(),
            theme: PageTheme::Inherit,
            refresh_time: None,
            widgets: vec![],
        };
        assert!(page.dark_mode(true));
        page.theme = PageTheme::Light;
        assert!(!page.dark_mode(true));
        page.theme = PageTheme::Dark;
        assert!(page.dark_mode(false));
    }

    #[test]
    fn validate_rejects_empty_projects() {
        let p: Project = serde_json::from_value(serde_json::json!({
            "device_model": "trmnl",
            "pages": []
        }))
        .unwrap();
        assert!(matches!(p.validate(), Err(ProjectError::NoPages)));
    }
}
