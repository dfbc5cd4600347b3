//! Plugin registry: dispatch by widget type tag, with an alias table
//! for legacy and shorthand tags.

use indexmap::IndexMap;
use tracing::debug;

use crate::context::HookContext;
use crate::plugins;
use crate::WidgetPlugin;

/// Legacy/shorthand tags and the canonical kind they resolve to.
const ALIASES: [(&str, &str); 7] = [
    ("label", "text"),
    ("rectangle", "shape_rect"),
    ("rrect", "rounded_rect"),
    ("circle", "shape_circle"),
    ("nav_next_page", "touch_area"),
    ("nav_previous_page", "touch_area"),
    ("nav_reload_page", "touch_area"),
];

/// Component-section ordering: image-like plugins export before the
/// rest so later sections can reference their ids.
const COMPONENT_ORDER: [&str; 4] = ["image", "online_image", "graph", "qr_code"];

pub struct PluginRegistry {
    plugins: IndexMap<&'static str, Box<dyn WidgetPlugin>>,
    aliases: IndexMap<&'static str, &'static str>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        PluginRegistry {
            plugins: IndexMap::new(),
            aliases: ALIASES.into_iter().collect(),
        }
    }

    /// Registry with every builtin widget plugin.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(Box::new(plugins::text::TextPlugin));
        reg.register(Box::new(plugins::sensor_text::SensorTextPlugin));
        reg.register(Box::new(plugins::shapes::RectPlugin));
        reg.register(Box::new(plugins::shapes::RoundedRectPlugin));
        reg.register(Box::new(plugins::shapes::CirclePlugin));
        reg.register(Box::new(plugins::shapes::LinePlugin));
        reg.register(Box::new(plugins::icon::IconPlugin));
        reg.register(Box::new(plugins::progress_bar::ProgressBarPlugin));
        reg.register(Box::new(plugins::touch_area::TouchAreaPlugin));
        reg
    }

    pub fn register(&mut self, plugin: Box<dyn WidgetPlugin>) {
        self.plugins.insert(plugin.kind(), plugin);
    }

    pub fn alias(&mut self, alias: &'static str, target: &'static str) {
        self.aliases.insert(alias, target);
    }

    /// Resolve a type tag (following aliases) to its plugin.
    pub fn get(&self, kind: &str) -> Option<&dyn WidgetPlugin> {
        let canonical = self.aliases.get(kind).copied().unwrap_or(kind);
        let found = self.plugins.get(canonical).map(|p| p.as_ref());
        if found.is_none() {
            debug!(kind, "no plugin for widget type");
        }
        found
    }

    /// Resolve an alias to its canonical kind.
    pub fn canonical_kind<'a>(&self, kind: &'a str) -> &'a str {
        self.aliases.get(kind).copied().unwrap_or(kind)
    }

    /// Plugins in registration order.
    pub fn all(&self) -> impl Iterator<Item = &dyn WidgetPlugin> {
        self.plugins.values().map(|p| p.as_ref())
    }

    /// Plugins in component-export order: the image-like kinds first,
    /// everything else alphabetically.
    pub fn in_component_order(&self) -> Vec<&dyn WidgetPlugin> {
        let mut plugins: Vec<&dyn WidgetPlugin> = self.all().collect();
        plugins.sort_by(|a, b| {
            let ia = COMPONENT_ORDER.iter().position(|k| *k == a.kind());
            let ib = COMPONENT_ORDER.iter().position(|k| *k == b.kind());
            match (ia, ib) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.kind().cmp(b.kind()),
            }
        });
        plugins
    }

    pub fn on_export_globals(&self, ctx: &mut HookContext<'_>) {
        for p in self.all() {
            p.on_export_globals(ctx);
        }
    }

    pub fn on_export_numeric_sensors(&self, ctx: &mut HookContext<'_>) {
        for p in self.all() {
            p.on_export_numeric_sensors(ctx);
        }
    }

    pub fn on_export_text_sensors(&self, ctx: &mut HookContext<'_>) {
        for p in self.all() {
            p.on_export_text_sensors(ctx);
        }
    }

    pub fn on_export_binary_sensors(&self, ctx: &mut HookContext<'_>) {
        for p in self.all() {
            p.on_export_binary_sensors(ctx);
        }
    }

    pub fn on_export_components(&self, ctx: &mut HookContext<'_>) {
        for p in self.in_component_order() {
            p.on_export_components(ctx);
        }
    }

    pub fn on_export_helpers(&self, ctx: &mut HookContext<'_>) {
        for p in self.all() {
            p.on_export_helpers(ctx);
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
