//! Contexts handed to plugins during export.

use indexmap::IndexSet;
use screengen_core::Widget;

use crate::color::{color_const, is_gray};
use crate::fonts::FontRegistry;

/// Pending-trigger map shared with the emit crate: entity id -> action
/// lines, populated by plugin hooks and spliced in after the sensor
/// sections are emitted.
pub type PendingTriggers = indexmap::IndexMap<String, std::collections::BTreeSet<String>>;

/// A visible widget plus the index of the page it sits on.
#[derive(Debug, Clone, Copy)]
pub struct PlacedWidget<'a> {
    pub page_index: usize,
    pub widget: &'a Widget,
}

/// Context for direct-mode drawing. Plugins push lambda lines and
/// register fonts as they go.
pub struct DrawContext<'a> {
    pub lines: Vec<String>,
    pub fonts: &'a mut FontRegistry,
    pub is_epaper: bool,
    pub is_dark: bool,
}

impl<'a> DrawContext<'a> {
    pub fn new(fonts: &'a mut FontRegistry, is_epaper: bool, is_dark: bool) -> Self {
        DrawContext {
            lines: Vec::new(),
            fonts,
            is_epaper,
            is_dark,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn add_font(&mut self, family: &str, weight: u32, size: u32, italic: bool) -> String {
        self.fonts.add_font(family, weight, size, italic)
    }

    pub fn color_const(&self, prop: &str) -> String {
        color_const(prop)
    }

    /// Checkerboard dither over a region when a gray color lands on an
    /// e-paper panel.
    pub fn dither_mask(&mut self, color_prop: &str, x: i32, y: i32, w: i32, h: i32) {
        if !self.is_epaper || color_prop.is_empty() || !is_gray(color_prop) {
            return;
        }
        self.lines
            .push(format!("          apply_grey_dither_mask({x}, {y}, {w}, {h});"));
    }

    pub fn is_gray_on_epaper(&self, color_prop: &str) -> bool {
        self.is_epaper && is_gray(color_prop)
    }
}

/// Context for the category hooks (`on_export_*`). Lines emitted here
/// land in the matching top-level section; the dedup sets are shared
/// across all hooks and the orchestrator's safety-net passes.
pub struct HookContext<'a> {
    pub lines: Vec<String>,
    pub widgets: &'a [PlacedWidget<'a>],
    pub is_lvgl: bool,
    pub has_touch: bool,
    pub seen_entity_ids: &'a mut IndexSet<String>,
    pub seen_sensor_ids: &'a mut IndexSet<String>,
    pub seen_text_entity_ids: &'a mut IndexSet<String>,
    pub pending_triggers: &'a mut PendingTriggers,
}

impl HookContext<'_> {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Queue an action to run when the given entity's sensor updates.
    pub fn defer_trigger(&mut self, entity_id: &str, action: impl Into<String>) {
        self.pending_triggers
            .entry(entity_id.to_string())
            .or_default()
            .insert(action.into());
    }
}
