//! Progress bar bound to a 0-100 sensor.

use screengen_core::entity::safe_id;
use screengen_core::{compile_condition, condition_props, escape_quotes, Widget};

use crate::context::{DrawContext, HookContext};
use crate::lvgl::{common_attrs, convert_color, Attrs, LvglContext, LvglValue, LvglWidget};
use crate::plugins::{int_prop_or, str_prop_or};
use crate::{ExportError, FontRegistry, WidgetPlugin};

fn resolved_entity(w: &Widget) -> String {
    let entity = w.entity().to_string();
    let local = w.prop_bool("is_local_sensor").unwrap_or(false);
    if !entity.is_empty() && !local && !entity.contains('.') {
        format!("sensor.{entity}")
    } else {
        entity
    }
}

pub struct ProgressBarPlugin;

impl WidgetPlugin for ProgressBarPlugin {
    fn kind(&self) -> &'static str {
        "progress_bar"
    }

    fn collect_requirements(&self, _w: &Widget, fonts: &mut FontRegistry) {
        fonts.add_font("Roboto", 400, 12, false);
    }

    fn export(&self, w: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError> {
        let entity = resolved_entity(w);
        let local = w.prop_bool("is_local_sensor").unwrap_or(false);
        let title = escape_quotes(w.title_text());
        let show_label = w.prop_bool("show_label") != Some(false);
        let show_pct = w.prop_bool("show_percentage") != Some(false);
        let bar_height = int_prop_or(w, "bar_height", 15) as i32;
        let color_prop = str_prop_or(w, "color", "theme_auto").to_string();
        let color = ctx.color_const(&color_prop);
        let font = ctx.add_font("Roboto", 400, 12, false);

        ctx.push(format!(
            "        // widget:progress_bar id:{} type:progress_bar x:{} y:{} w:{} h:{} entity:{entity} title:\"{title}\" show_label:{show_label} show_pct:{show_pct} bar_height:{bar_height} color:{color_prop} local:{local}{}",
            w.id,
            w.x,
            w.y,
            w.width,
            w.height,
            condition_props(w)
        ));

        let bg_prop = match w.prop_str("bg_color").filter(|s| !s.is_empty()) {
            Some(s) => s.to_string(),
            None => str_prop_or(w, "background_color", "transparent").to_string(),
        };
        if !bg_prop.is_empty() && bg_prop != "transparent" {
            let bg = ctx.color_const(&bg_prop);
            ctx.push(format!(
                "        it.filled_rectangle({}, {}, {}, {}, {});",
                w.x, w.y, w.width, w.height, bg
            ));
        }

        let cond = compile_condition(w);
        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.open()));
        }

        let sensor_id = if local {
            if entity.is_empty() { "battery_level".to_string() } else { entity.clone() }
        } else if entity.is_empty() {
            String::new()
        } else {
            safe_id(&entity)
        };

        let v = w.ident();
        if !sensor_id.is_empty() {
            ctx.push(format!("        float val_{v} = id({sensor_id}).state;"));
            ctx.push(format!("        if (std::isnan(val_{v})) val_{v} = 0;"));
            ctx.push(format!("        int pct_{v} = (int)val_{v};"));
            ctx.push(format!("        if (pct_{v} < 0) pct_{v} = 0;"));
            ctx.push(format!("        if (pct_{v} > 100) pct_{v} = 100;"));

            if show_label && !title.is_empty() {
                ctx.push(format!(
                    "        it.printf({}, {}, id({font}), {color}, TextAlign::TOP_LEFT, \"{title}\");",
                    w.x, w.y
                ));
            }
            if show_pct {
                ctx.push(format!(
                    "        it.printf({} + {}, {}, id({font}), {color}, TextAlign::TOP_RIGHT, \"%d%%\", pct_{v});",
                    w.x, w.width, w.y
                ));
            }

            let bar_y = w.y + (w.height - bar_height);
            ctx.push(format!(
                "        it.rectangle({}, {bar_y}, {}, {bar_height}, {color});",
                w.x, w.width
            ));
            ctx.push(format!("        if (pct_{v} > 0) {{"));
            ctx.push(format!(
                "          int bar_w = ({} - 4) * pct_{v} / 100;",
                w.width
            ));
            ctx.push(format!(
                "          it.filled_rectangle({} + 2, {bar_y} + 2, bar_w, {bar_height} - 4, {color});",
                w.x
            ));
            ctx.push("        }".to_string());
            ctx.dither_mask(&color_prop, w.x, bar_y, w.width, bar_height);
        } else {
            // No sensor bound: static half-full preview.
            ctx.push(format!(
                "        it.rectangle({}, {} + {} - {bar_height}, {}, {bar_height}, {color});",
                w.x, w.y, w.height, w.width
            ));
            ctx.push(format!(
                "        it.filled_rectangle({} + 2, {} + {} - {bar_height} + 2, {} / 2, {bar_height} - 4, {color});",
                w.x, w.y, w.height, w.width
            ));
            if show_label && !title.is_empty() {
                ctx.push(format!(
                    "        it.printf({}, {}, id({font}), {color}, TextAlign::TOP_LEFT, \"{title}\");",
                    w.x, w.y
                ));
            }
        }

        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.close()));
        }
        Ok(())
    }

    fn export_lvgl(&self, w: &Widget, _ctx: &LvglContext) -> Option<LvglWidget> {
        let mut attrs = common_attrs(w);
        attrs.insert("min_value".into(), int_prop_or(w, "min", 0).into());
        attrs.insert("max_value".into(), int_prop_or(w, "max", 100).into());
        let value: LvglValue = if !w.entity().is_empty() {
            format!("!lambda \"return id({}).state;\"", safe_id(w.entity())).into()
        } else {
            int_prop_or(w, "value", 0).into()
        };
        attrs.insert("value".into(), value);
        attrs.insert(
            "bg_color".into(),
            convert_color(str_prop_or(w, "bg_color", "white")).into(),
        );
        let mut indicator = Attrs::new();
        indicator.insert(
            "bg_color".into(),
            convert_color(str_prop_or(w, "color", "")).into(),
        );
        attrs.insert("indicator".into(), LvglValue::Map(indicator));
        attrs.insert("mode".into(), str_prop_or(w, "mode", "normal").into());
        Some(LvglWidget::new("bar", attrs))
    }

    /// LVGL bars re-render through a widget refresh when the backing
    /// sensor updates; the homeassistant sensor itself comes from the
    /// shared safety-net pass.
    fn on_export_numeric_sensors(&self, ctx: &mut HookContext<'_>) {
        if !ctx.is_lvgl {
            return;
        }
        let mut refreshes = Vec::new();
        for placed in ctx.widgets {
            let w = placed.widget;
            if w.kind != "progress_bar" || w.prop_bool("is_local_sensor").unwrap_or(false) {
                continue;
            }
            let entity = resolved_entity(w);
            if entity.is_empty() {
                continue;
            }
            refreshes.push((entity, format!("- lvgl.widget.refresh: {}", w.id)));
        }
        for (entity, action) in refreshes {
            ctx.defer_trigger(&entity, action);
        }
    }
}
