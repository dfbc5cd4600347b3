//! Touchscreen hotspot widget, also backing the nav_* page buttons.

use screengen_core::entity::safe_id;
use screengen_core::{compile_condition, condition_props, Widget};

use crate::context::{DrawContext, HookContext};
use crate::plugins::{int_prop_or, str_prop_or};
use crate::{ExportError, FontRegistry, WidgetPlugin};

const TOUCH_KINDS: [&str; 4] = [
    "touch_area",
    "nav_next_page",
    "nav_previous_page",
    "nav_reload_page",
];

fn touch_sensor_id(w: &Widget) -> String {
    if w.entity().is_empty() {
        format!("touch_area_{}", w.ident())
    } else {
        safe_id(w.entity())
    }
}

fn icon_prop(w: &Widget, key: &str) -> String {
    str_prop_or(w, key, "")
        .trim_start_matches("mdi:")
        .to_ascii_uppercase()
}

/// Navigation action for a touch widget: the explicit prop wins, the
/// nav_* type tags imply theirs.
fn nav_action<'a>(w: &'a Widget) -> &'a str {
    if let Some(a) = w.prop_str("nav_action").filter(|a| !a.is_empty()) {
        return a;
    }
    match w.kind.as_str() {
        "nav_next_page" => "next_page",
        "nav_previous_page" => "previous_page",
        "nav_reload_page" => "reload_page",
        _ => "none",
    }
}

pub struct TouchAreaPlugin;

impl WidgetPlugin for TouchAreaPlugin {
    fn kind(&self) -> &'static str {
        "touch_area"
    }

    fn collect_requirements(&self, w: &Widget, fonts: &mut FontRegistry) {
        let size = int_prop_or(w, "icon_size", 40) as u32;
        for key in ["icon", "icon_pressed"] {
            if let Some(code) = w.prop_str(key).filter(|c| !c.is_empty()) {
                fonts.track_icon(code, size);
            }
        }
    }

    fn export(&self, w: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError> {
        let icon = icon_prop(w, "icon");
        let icon_pressed = icon_prop(w, "icon_pressed");
        let icon_size = int_prop_or(w, "icon_size", 40);
        let icon_color_prop = str_prop_or(w, "icon_color", "theme_auto").to_string();
        let icon_color = ctx.color_const(&icon_color_prop);

        ctx.push(format!(
            "        // widget:touch_area id:{} type:touch_area x:{} y:{} w:{} h:{} icon:\"{}\" icon_pressed:\"{}\" icon_size:{icon_size} icon_color:{icon_color_prop}{}",
            w.id,
            w.x,
            w.y,
            w.width,
            w.height,
            str_prop_or(w, "icon", ""),
            str_prop_or(w, "icon_pressed", ""),
            condition_props(w)
        ));

        let cond = compile_condition(w);
        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.open()));
        }

        if !icon.is_empty() {
            let font_ref = ctx.add_font("Material Design Icons", 400, icon_size as u32, false);
            let sensor = touch_sensor_id(w);
            let (x, y, rw, rh) = (w.x, w.y, w.width, w.height);
            if !icon_pressed.is_empty() {
                ctx.push(format!("        if (id({sensor}).state) {{"));
                ctx.push(format!(
                    "          it.printf({x} + {rw}/2, {y} + {rh}/2, id({font_ref}), {icon_color}, TextAlign::CENTER, \"\\U000{icon_pressed}\");"
                ));
                ctx.push("        } else {".to_string());
                ctx.push(format!(
                    "          it.printf({x} + {rw}/2, {y} + {rh}/2, id({font_ref}), {icon_color}, TextAlign::CENTER, \"\\U000{icon}\");"
                ));
                ctx.push("        }".to_string());
            } else {
                ctx.push(format!(
                    "        it.printf({x} + {rw}/2, {y} + {rh}/2, id({font_ref}), {icon_color}, TextAlign::CENTER, \"\\U000{icon}\");"
                ));
            }
        }

        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.close()));
        }
        Ok(())
    }

    fn on_export_binary_sensors(&self, ctx: &mut HookContext<'_>) {
        let targets: Vec<_> = ctx
            .widgets
            .iter()
            .filter(|p| TOUCH_KINDS.contains(&p.widget.kind.as_str()))
            .copied()
            .collect();
        if targets.is_empty() {
            return;
        }

        ctx.push("# Touch Area Binary Sensors");
        for placed in targets {
            let w = placed.widget;
            let sensor = touch_sensor_id(w);
            ctx.push("- platform: touchscreen");
            ctx.push(format!("  id: {sensor}"));
            ctx.push("  touchscreen_id: my_touchscreen");
            ctx.push(format!("  x_min: {}", w.x));
            ctx.push(format!("  x_max: {}", w.x + w.width));
            ctx.push(format!("  y_min: {}", w.y));
            ctx.push(format!("  y_max: {}", w.y + w.height));

            let action = nav_action(w);
            if action == "none" && w.entity().is_empty() {
                continue;
            }
            ctx.push("  on_press:");
            ctx.push("    - if:");
            ctx.push("        condition:");
            ctx.push(format!(
                "          lambda: 'return id(display_page) == {};'",
                placed.page_index
            ));
            ctx.push("        then:");
            match action {
                "next_page" => {
                    ctx.push("          - script.execute:");
                    ctx.push("              id: change_page_to");
                    ctx.push("              target_page: !lambda 'return id(display_page) + 1;'");
                }
                "previous_page" => {
                    ctx.push("          - script.execute:");
                    ctx.push("              id: change_page_to");
                    ctx.push("              target_page: !lambda 'return id(display_page) - 1;'");
                }
                "reload_page" => {
                    ctx.push("          - script.execute: manage_run_and_sleep");
                }
                _ => {
                    ctx.push("          - homeassistant.service:");
                    ctx.push("              service: homeassistant.toggle");
                    ctx.push("              data:");
                    ctx.push(format!("                entity_id: {}", w.entity()));
                }
            }
        }
    }
}
