//! Shape widgets: rectangle, rounded rectangle, circle and line.

use screengen_core::{compile_condition, condition_props, Widget};

use crate::context::DrawContext;
use crate::lvgl::{common_attrs, convert_color, format_opacity, LvglContext, LvglValue, LvglWidget};
use crate::plugins::{int_prop_or, str_prop_or};
use crate::{ExportError, WidgetPlugin};

fn fill_flag(w: &Widget) -> bool {
    w.prop_bool("fill").unwrap_or(false)
}

/// Filled shapes in plain gray on e-paper draw only the dither mask.
fn gray_fill_skipped(color_prop: &str, is_epaper: bool) -> bool {
    is_epaper && color_prop.eq_ignore_ascii_case("gray")
}

fn obj_lvgl(w: &Widget, radius: i64) -> LvglWidget {
    let color = str_prop_or(w, "color", "");
    let bg = match w.prop_str("bg_color").filter(|s| !s.is_empty()) {
        Some(c) => c,
        None => color,
    };
    let border = match w.prop_str("border_color").filter(|s| !s.is_empty()) {
        Some(c) => c,
        None => color,
    };
    let mut attrs = common_attrs(w);
    attrs.insert("bg_color".into(), convert_color(bg).into());
    attrs.insert(
        "bg_opa".into(),
        if w.prop_bool("fill") != Some(false) { "cover" } else { "transp" }.into(),
    );
    if let Some(bw) = w.prop_i64("border_width") {
        attrs.insert("border_width".into(), bw.into());
    }
    attrs.insert("border_color".into(), convert_color(border).into());
    attrs.insert("radius".into(), radius.into());
    attrs.insert("opa".into(), format_opacity(w.prop_i64("opa")).into());
    LvglWidget::new("obj", attrs)
}

pub struct RectPlugin;

impl WidgetPlugin for RectPlugin {
    fn kind(&self) -> &'static str {
        "shape_rect"
    }

    fn export(&self, w: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError> {
        let fill = fill_flag(w);
        let border_width = int_prop_or(w, "border_width", 1);
        let color_prop = str_prop_or(w, "color", "theme_auto").to_string();
        let border_color_prop = str_prop_or(w, "border_color", &color_prop).to_string();
        let color = ctx.color_const(&color_prop);
        let border_color = ctx.color_const(&border_color_prop);
        let (x, y, rw, rh) = (w.x, w.y, w.width, w.height);

        ctx.push(format!(
            "        // widget:shape_rect id:{} type:shape_rect x:{x} y:{y} w:{rw} h:{rh} fill:{fill} border:{border_width} color:{color_prop} border_color:{border_color_prop}{}",
            w.id,
            condition_props(w)
        ));

        let cond = compile_condition(w);
        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.open()));
        }

        if fill {
            ctx.dither_mask(&color_prop, x, y, rw, rh);
            if !gray_fill_skipped(&color_prop, ctx.is_epaper) {
                ctx.push(format!(
                    "        it.filled_rectangle({x}, {y}, {rw}, {rh}, {color});"
                ));
            }
        }

        // Border draws even when filled, in its own color.
        if border_width > 0 {
            ctx.push(format!("        for (int i = 0; i < {border_width}; i++) {{"));
            ctx.push(format!(
                "          it.rectangle({x} + i, {y} + i, {rw} - 2 * i, {rh} - 2 * i, {border_color});"
            ));
            ctx.push("        }".to_string());
            if !fill {
                ctx.dither_mask(&border_color_prop, x, y, rw, rh);
            }
        }

        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.close()));
        }
        Ok(())
    }

    fn export_lvgl(&self, w: &Widget, _ctx: &LvglContext) -> Option<LvglWidget> {
        Some(obj_lvgl(w, int_prop_or(w, "radius", 0)))
    }
}

pub struct RoundedRectPlugin;

impl WidgetPlugin for RoundedRectPlugin {
    fn kind(&self) -> &'static str {
        "rounded_rect"
    }

    fn export(&self, w: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError> {
        let fill = fill_flag(w);
        let show_border = w.prop_bool("show_border") != Some(false);
        let r = int_prop_or(w, "radius", 10);
        let thickness = int_prop_or(w, "border_width", 4);
        let color_prop = str_prop_or(w, "color", "theme_auto").to_string();
        let border_default = if fill { "black" } else { color_prop.as_str() };
        let border_color_prop = str_prop_or(w, "border_color", border_default).to_string();
        let color = ctx.color_const(&color_prop);
        let border_color = ctx.color_const(&border_color_prop);
        let (x, y, rw, rh) = (w.x, w.y, w.width, w.height);

        ctx.push(format!(
            "        // widget:rounded_rect id:{} type:rounded_rect x:{x} y:{y} w:{rw} h:{rh} fill:{fill} show_border:{show_border} border:{thickness} radius:{r} color:{color_prop} border_color:{border_color_prop}{}",
            w.id,
            condition_props(w)
        ));

        let cond = compile_condition(w);
        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.open()));
        }
        ctx.push("        {".to_string());

        if fill {
            ctx.push("          auto draw_filled_rrect = [&](int x, int y, int w, int h, int r, auto c) {".to_string());
            ctx.push("            it.filled_rectangle(x + r, y, w - 2 * r, h, c);".to_string());
            ctx.push("            it.filled_rectangle(x, y + r, r, h - 2 * r, c);".to_string());
            ctx.push("            it.filled_rectangle(x + w - r, y + r, r, h - 2 * r, c);".to_string());
            ctx.push("            it.filled_circle(x + r, y + r, r, c);".to_string());
            ctx.push("            it.filled_circle(x + w - r - 1, y + r, r, c);".to_string());
            ctx.push("            it.filled_circle(x + r, y + h - r - 1, r, c);".to_string());
            ctx.push("            it.filled_circle(x + w - r - 1, y + h - r - 1, r, c);".to_string());
            ctx.push("          };".to_string());

            let (mut fx, mut fy, mut fw, mut fh, mut fr) = (x as i64, y as i64, rw as i64, rh as i64, r);
            if show_border {
                ctx.push(format!(
                    "          draw_filled_rrect({x}, {y}, {rw}, {rh}, {r}, {border_color});"
                ));
                fx += thickness;
                fy += thickness;
                fw -= 2 * thickness;
                fh -= 2 * thickness;
                fr = (fr - thickness).max(0);
            }
            if gray_fill_skipped(&color_prop, ctx.is_epaper) {
                ctx.dither_mask(&color_prop, fx as i32, fy as i32, fw as i32, fh as i32);
            } else if fw > 0 && fh > 0 {
                ctx.push(format!(
                    "          draw_filled_rrect({fx}, {fy}, {fw}, {fh}, {fr}, {color});"
                ));
            }
        } else {
            ctx.push("          auto draw_rrect_border = [&](int x, int y, int w, int h, int r, int t, auto c) {".to_string());
            ctx.push("            it.filled_rectangle(x + r, y, w - 2 * r, t, c);".to_string());
            ctx.push("            it.filled_rectangle(x + r, y + h - t, w - 2 * r, t, c);".to_string());
            ctx.push("            it.filled_rectangle(x, y + r, t, h - 2 * r, c);".to_string());
            ctx.push("            it.filled_rectangle(x + w - t, y + r, t, h - 2 * r, c);".to_string());
            ctx.push("            for (int dx = 0; dx <= r; dx++) {".to_string());
            ctx.push("              for (int dy = 0; dy <= r; dy++) {".to_string());
            ctx.push("                int ds = dx*dx + dy*dy;".to_string());
            ctx.push("                if (ds <= r*r && ds > (r-t)*(r-t)) {".to_string());
            ctx.push("                  it.draw_pixel_at(x + r - dx, y + r - dy, c);".to_string());
            ctx.push("                  it.draw_pixel_at(x + w - r + dx - 1, y + r - dy, c);".to_string());
            ctx.push("                  it.draw_pixel_at(x + r - dx, y + h - r + dy - 1, c);".to_string());
            ctx.push("                  it.draw_pixel_at(x + w - r + dx - 1, y + h - r + dy - 1, c);".to_string());
            ctx.push("                }".to_string());
            ctx.push("              }".to_string());
            ctx.push("            }".to_string());
            ctx.push("          };".to_string());
            ctx.push(format!(
                "          draw_rrect_border({x}, {y}, {rw}, {rh}, {r}, {thickness}, {border_color});"
            ));
        }

        ctx.dither_mask(&border_color_prop, x, y, rw, rh);
        ctx.push("        }".to_string());
        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.close()));
        }
        Ok(())
    }

    fn export_lvgl(&self, w: &Widget, _ctx: &LvglContext) -> Option<LvglWidget> {
        Some(obj_lvgl(w, int_prop_or(w, "radius", 10)))
    }
}

pub struct CirclePlugin;

impl WidgetPlugin for CirclePlugin {
    fn kind(&self) -> &'static str {
        "shape_circle"
    }

    fn export(&self, w: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError> {
        let r = w.width.min(w.height) / 2;
        let cx = w.x + w.width / 2;
        let cy = w.y + w.height / 2;
        let fill = fill_flag(w);
        let border_width = int_prop_or(w, "border_width", 1);
        let color_prop = str_prop_or(w, "color", "theme_auto").to_string();
        let border_color_prop = str_prop_or(w, "border_color", &color_prop).to_string();
        let color = ctx.color_const(&color_prop);
        let border_color = ctx.color_const(&border_color_prop);

        ctx.push(format!(
            "        // widget:shape_circle id:{} type:shape_circle x:{} y:{} w:{} h:{} fill:{fill} border:{border_width} color:{color_prop} border_color:{border_color_prop}{}",
            w.id,
            w.x,
            w.y,
            w.width,
            w.height,
            condition_props(w)
        ));

        let cond = compile_condition(w);
        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.open()));
        }

        if fill {
            ctx.dither_mask(&color_prop, w.x, w.y, w.width, w.height);
            if !gray_fill_skipped(&color_prop, ctx.is_epaper) {
                ctx.push(format!("        it.filled_circle({cx}, {cy}, {r}, {color});"));
            }
        }

        if border_width > 0 {
            ctx.push(format!("        for (int i = 0; i < {border_width}; i++) {{"));
            ctx.push(format!("          it.circle({cx}, {cy}, {r} - i, {border_color});"));
            ctx.push("        }".to_string());
            if !fill {
                ctx.dither_mask(&border_color_prop, w.x, w.y, w.width, w.height);
            }
        }

        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.close()));
        }
        Ok(())
    }

    fn export_lvgl(&self, w: &Widget, _ctx: &LvglContext) -> Option<LvglWidget> {
        // A large radius turns the obj into a circle.
        Some(obj_lvgl(w, w.width.min(w.height).max(1) as i64))
    }
}

pub struct LinePlugin;

impl WidgetPlugin for LinePlugin {
    fn kind(&self) -> &'static str {
        "line"
    }

    fn export(&self, w: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError> {
        let stroke = int_prop_or(w, "stroke_width", 3);
        let color_prop = str_prop_or(w, "color", "theme_auto").to_string();
        let color = ctx.color_const(&color_prop);
        let orientation = str_prop_or(w, "orientation", "horizontal").to_string();
        let vertical = orientation == "vertical";

        let (x, y) = (w.x, w.y);
        let rw = if vertical { stroke as i32 } else { w.width };
        let rh = if vertical { w.height } else { stroke as i32 };

        ctx.push(format!(
            "        // widget:line id:{} type:line x:{x} y:{y} w:{rw} h:{rh} stroke:{stroke} color:{color_prop} orientation:{orientation}{}",
            w.id,
            condition_props(w)
        ));

        let cond = compile_condition(w);
        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.open()));
        }

        ctx.push(format!(
            "        it.filled_rectangle({x}, {y}, {rw}, {rh}, {color});"
        ));

        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.close()));
        }
        Ok(())
    }

    fn export_lvgl(&self, w: &Widget, _ctx: &LvglContext) -> Option<LvglWidget> {
        let vertical = str_prop_or(w, "orientation", "horizontal") == "vertical";
        let (ex, ey) = if vertical { (0, w.height.max(10)) } else { (w.width.max(100), 0) };
        let point = |x: i32, y: i32| {
            let mut m = crate::lvgl::Attrs::new();
            m.insert("x".into(), x.into());
            m.insert("y".into(), y.into());
            LvglValue::Map(m)
        };
        let mut attrs = common_attrs(w);
        attrs.insert("points".into(), LvglValue::List(vec![point(0, 0), point(ex, ey)]));
        attrs.insert("line_width".into(), int_prop_or(w, "stroke_width", 3).into());
        attrs.insert(
            "line_color".into(),
            convert_color(str_prop_or(w, "color", "")).into(),
        );
        attrs.insert("line_rounded".into(), true.into());
        attrs.insert(
            "opa".into(),
            format_opacity(Some(int_prop_or(w, "opa", 255))).into(),
        );
        Some(LvglWidget::new("line", attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DrawContext;
    use crate::FontRegistry;

    fn widget(json: serde_json::Value) -> Widget {
        serde_json::from_value(json).unwrap()
    }

    fn export(plugin: &dyn WidgetPlugin, w: &Widget, epaper: bool) -> Vec<String> {
        let mut fonts = FontRegistry::new();
        let mut ctx = DrawContext::new(&mut fonts, epaper, false);
        plugin.export(w, &mut ctx).unwrap();
        ctx.lines
    }

    #[test]
    fn rect_border_loops() {
        let w = widget(serde_json::json!({
            "id": "r1", "type": "shape_rect", "x": 5, "y": 5, "width": 50, "height": 30,
            "props": { "border_width": 2 }
        }));
        let lines = export(&RectPlugin, &w, false);
        assert!(lines.iter().any(|l| l.contains("for (int i = 0; i < 2; i++)")));
        assert!(lines
            .iter()
            .any(|l| l.contains("it.rectangle(5 + i, 5 + i, 50 - 2 * i, 30 - 2 * i, color_on);")));
    }

    #[test]
    fn gray_filled_rect_on_epaper_only_dithers() {
        let w = widget(serde_json::json!({
            "id": "r2", "type": "shape_rect", "x": 0, "y": 0, "width": 40, "height": 40,
            "props": { "fill": true, "color": "gray", "border_width": 0 }
        }));
        let lines = export(&RectPlugin, &w, true);
        assert!(lines.iter().any(|l| l.contains("apply_grey_dither_mask(0, 0, 40, 40);")));
        assert!(!lines.iter().any(|l| l.contains("it.filled_rectangle")));
    }

    #[test]
    fn rounded_rect_filled_with_border_insets() {
        let w = widget(serde_json::json!({
            "id": "rr1", "type": "rounded_rect", "x": 10, "y": 10, "width": 100, "height": 60,
            "props": { "fill": true, "radius": 10, "border_width": 4, "border_color": "black", "color": "white" }
        }));
        let lines = export(&RoundedRectPlugin, &w, false);
        assert!(lines.iter().any(|l| l.contains("auto draw_filled_rrect")));
        assert!(lines
            .iter()
            .any(|l| l.contains("draw_filled_rrect(10, 10, 100, 60, 10, COLOR_BLACK);")));
        assert!(lines
            .iter()
            .any(|l| l.contains("draw_filled_rrect(14, 14, 92, 52, 6, COLOR_WHITE);")));
    }

    #[test]
    fn rounded_rect_outline_uses_pixel_border() {
        let w = widget(serde_json::json!({
            "id": "rr2", "type": "rounded_rect", "x": 0, "y": 0, "width": 80, "height": 40,
            "props": {}
        }));
        let lines = export(&RoundedRectPlugin, &w, false);
        assert!(lines.iter().any(|l| l.contains("auto draw_rrect_border")));
        assert!(lines
            .iter()
            .any(|l| l.contains("draw_rrect_border(0, 0, 80, 40, 10, 4, color_on);")));
    }

    #[test]
    fn circle_centers_and_shrinks_border() {
        let w = widget(serde_json::json!({
            "id": "c1", "type": "shape_circle", "x": 0, "y": 0, "width": 60, "height": 60,
            "props": { "fill": true, "border_width": 2 }
        }));
        let lines = export(&CirclePlugin, &w, false);
        assert!(lines.iter().any(|l| l.contains("it.filled_circle(30, 30, 30, color_on);")));
        assert!(lines.iter().any(|l| l.contains("it.circle(30, 30, 30 - i, color_on);")));
    }

    #[test]
    fn vertical_line_swaps_dimensions() {
        let w = widget(serde_json::json!({
            "id": "l1", "type": "line", "x": 20, "y": 0, "width": 100, "height": 80,
            "props": { "orientation": "vertical", "stroke_width": 4 }
        }));
        let lines = export(&LinePlugin, &w, false);
        assert!(lines
            .iter()
            .any(|l| l.contains("it.filled_rectangle(20, 0, 4, 80, color_on);")));
    }
}
