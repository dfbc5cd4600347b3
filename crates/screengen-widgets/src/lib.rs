//! Widget plugins: the contract every widget type implements, the
//! registry that dispatches on type tags, and the font/icon registry
//! the plugins record their resources in.

pub mod color;
pub mod context;
pub mod fonts;
pub mod lvgl;
pub mod plugins;
pub mod registry;
pub mod wrap;

use screengen_core::Widget;
use thiserror::Error;

pub use context::{DrawContext, HookContext, PlacedWidget};
pub use fonts::FontRegistry;
pub use lvgl::{LvglValue, LvglWidget};
pub use registry::PluginRegistry;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("widget '{id}': {reason}")]
    Invalid { id: String, reason: String },
}

impl ExportError {
    pub fn invalid(id: &str, reason: impl Into<String>) -> Self {
        ExportError::Invalid {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Contract implemented by every widget type. Plugins are stateless;
/// all per-compilation state lives in the contexts handed to them.
pub trait WidgetPlugin: Send + Sync {
    /// Canonical type tag this plugin handles.
    fn kind(&self) -> &'static str;

    /// Pre-pass: record fonts and icon glyphs the widget will need.
    fn collect_requirements(&self, _widget: &Widget, _fonts: &mut FontRegistry) {}

    /// Emit direct-mode drawing lines for one widget.
    fn export(&self, widget: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError>;

    /// LVGL descriptor for one widget, when the plugin supports it.
    fn export_lvgl(&self, _widget: &Widget, _ctx: &lvgl::LvglContext) -> Option<LvglWidget> {
        None
    }

    fn on_export_globals(&self, _ctx: &mut HookContext<'_>) {}
    fn on_export_numeric_sensors(&self, _ctx: &mut HookContext<'_>) {}
    fn on_export_text_sensors(&self, _ctx: &mut HookContext<'_>) {}
    fn on_export_binary_sensors(&self, _ctx: &mut HookContext<'_>) {}
    fn on_export_components(&self, _ctx: &mut HookContext<'_>) {}
    fn on_export_helpers(&self, _ctx: &mut HookContext<'_>) {}
}
