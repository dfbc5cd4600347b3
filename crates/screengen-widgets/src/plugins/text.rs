//! Static text widget.

use screengen_core::{compile_condition, condition_props, Widget};

use crate::context::DrawContext;
use crate::lvgl::{common_attrs, convert_color, format_opacity, lvgl_font, LvglContext, LvglWidget};
use crate::plugins::{int_prop_or, round_mid, str_prop_or};
use crate::wrap::word_wrap;
use crate::{ExportError, FontRegistry, WidgetPlugin};

pub struct TextPlugin;

impl TextPlugin {
    fn font_size(w: &Widget) -> i64 {
        int_prop_or(w, "font_size", int_prop_or(w, "value_font_size", 20))
    }
}

impl WidgetPlugin for TextPlugin {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn collect_requirements(&self, w: &Widget, fonts: &mut FontRegistry) {
        let family = str_prop_or(w, "font_family", "Roboto");
        let weight = int_prop_or(w, "font_weight", 400) as u32;
        let italic = w.prop_bool("italic").unwrap_or(false);
        fonts.add_font(family, weight, Self::font_size(w) as u32, italic);
    }

    fn export(&self, w: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError> {
        let color_prop = str_prop_or(w, "color", "theme_auto").to_string();
        let font_size = Self::font_size(w);
        let family = str_prop_or(w, "font_family", "Roboto").to_string();
        let weight = int_prop_or(w, "font_weight", 400) as u32;
        let italic = w.prop_bool("italic").unwrap_or(false);
        let font_id = ctx.add_font(&family, weight, font_size as u32, italic);
        let text = match w.prop_str("text") {
            Some(t) if !t.is_empty() => t.to_string(),
            _ if !w.title_text().is_empty() => w.title_text().to_string(),
            _ => "Text".to_string(),
        };
        let text_align = str_prop_or(w, "text_align", "TOP_LEFT").to_string();

        // Gray text on e-paper renders black under a dither mask.
        let gray_on_epaper = ctx.is_gray_on_epaper(&color_prop);
        let color = if gray_on_epaper {
            "COLOR_BLACK".to_string()
        } else {
            ctx.color_const(&color_prop)
        };

        // Keep the marker comment one line.
        let safe_text: String = text
            .replace('\r', "\\n")
            .replace('\n', "\\n")
            .replace("\\n\\n", "\\n");
        let shown: String = safe_text.chars().take(50).collect();
        let ellipsis = if safe_text.chars().count() > 50 { "..." } else { "" };
        ctx.push(format!(
            "        // widget:text id:{} type:text x:{} y:{} w:{} h:{} align:{} text:\"{}{}\"{}",
            w.id,
            w.x,
            w.y,
            w.width,
            w.height,
            text_align,
            shown,
            ellipsis,
            condition_props(w)
        ));

        let cond = compile_condition(w);
        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.open()));
        }

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

        let mut x = w.x;
        let mut y = w.y;
        let mut align_h = "LEFT";
        if text_align.contains("RIGHT") {
            x = w.x + w.width;
            align_h = "RIGHT";
        } else if text_align.ends_with("CENTER") || text_align == "CENTER" {
            x = round_mid(w.x, w.width);
            align_h = "CENTER";
        }
        let mut align_v = "TOP";
        if text_align.contains("BOTTOM") {
            y = w.y + w.height;
            align_v = "BOTTOM";
        } else if text_align.starts_with("CENTER") || text_align == "CENTER" {
            y = round_mid(w.y, w.height);
            align_v = "CENTER";
        }
        let mut esphome_align = format!("TextAlign::{align_v}_{align_h}");
        if esphome_align == "TextAlign::CENTER_CENTER" {
            esphome_align = "TextAlign::CENTER".to_string();
        }

        let wrap_width = if w.width != 0 { w.width } else { 200 };
        let wrapped = word_wrap(&text, wrap_width, font_size as i32, &family);
        let line_height = font_size + 4;

        let mut current_y = y;
        for line in &wrapped {
            let escaped = line.replace('"', "\\\"").replace('%', "%%");
            ctx.push(format!(
                "        it.printf({x}, {current_y}, id({font_id}), {color}, {esphome_align}, \"{escaped}\");"
            ));
            current_y += line_height as i32;
        }

        if gray_on_epaper {
            ctx.push(format!(
                "        apply_grey_dither_to_text({}, {}, {}, {});",
                w.x, w.y, w.width, w.height
            ));
        }

        let border_width = int_prop_or(w, "border_width", 0);
        if border_width > 0 {
            let border_color = ctx.color_const(str_prop_or(w, "border_color", "black"));
            for i in 0..border_width {
                ctx.push(format!(
                    "        it.rectangle({} + {i}, {} + {i}, {} - 2 * {i}, {} - 2 * {i}, {});",
                    w.x, w.y, w.width, w.height, border_color
                ));
            }
        }

        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.close()));
        }
        Ok(())
    }

    fn export_lvgl(&self, w: &Widget, _ctx: &LvglContext) -> Option<LvglWidget> {
        let raw_align = str_prop_or(w, "text_align", "TOP_LEFT");
        let text_align = if raw_align.contains("RIGHT") {
            "right"
        } else if raw_align.contains("CENTER") && !raw_align.contains("LEFT") {
            "center"
        } else {
            "left"
        };

        let mut attrs = common_attrs(w);
        let text = str_prop_or(w, "text", "Text");
        attrs.insert("text".into(), format!("\"{text}\"").into());
        attrs.insert(
            "text_font".into(),
            lvgl_font(
                str_prop_or(w, "font_family", "Roboto"),
                int_prop_or(w, "font_weight", 400) as u32,
                Self::font_size(w) as u32,
                w.prop_bool("italic").unwrap_or(false),
            )
            .into(),
        );
        let color = match w.prop_str("color").filter(|s| !s.is_empty()) {
            Some(c) => c,
            None => str_prop_or(w, "text_color", ""),
        };
        attrs.insert("text_color".into(), convert_color(color).into());
        attrs.insert("text_align".into(), text_align.into());
        let bg = w.prop_str("bg_color").unwrap_or("");
        if bg != "transparent" {
            attrs.insert("bg_color".into(), convert_color(bg).into());
        }
        attrs.insert("opa".into(), format_opacity(w.prop_i64("opa")).into());
        let border_width = int_prop_or(w, "border_width", 0);
        attrs.insert("border_width".into(), border_width.into());
        attrs.insert(
            "border_color".into(),
            convert_color(str_prop_or(w, "border_color", "black")).into(),
        );
        attrs.insert(
            "border_side".into(),
            if border_width > 0 { "full" } else { "none" }.into(),
        );
        attrs.insert("radius".into(), int_prop_or(w, "border_radius", 0).into());
        Some(LvglWidget::new("label", attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DrawContext;

    fn widget(json: serde_json::Value) -> Widget {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn plain_text_prints_with_alignment() {
        let w = widget(serde_json::json!({
            "id": "t1", "type": "text", "x": 10, "y": 20, "width": 200, "height": 40,
            "props": { "text": "Hello", "text_align": "CENTER" }
        }));
        let mut fonts = FontRegistry::new();
        let mut ctx = DrawContext::new(&mut fonts, false, false);
        TextPlugin.export(&w, &mut ctx).unwrap();
        assert!(ctx.lines[0].contains("// widget:text id:t1"));
        assert!(ctx
            .lines
            .iter()
            .any(|l| l.contains("it.printf(110, 40, id(font_roboto_400_20), color_on, TextAlign::CENTER, \"Hello\");")));
    }

    #[test]
    fn condition_wraps_output() {
        let w = widget(serde_json::json!({
            "id": "t2", "type": "text", "x": 0, "y": 0, "width": 100, "height": 20,
            "condition_entity": "switch.fan", "condition_operator": "==", "condition_state": "on",
            "props": { "text": "Fan" }
        }));
        let mut fonts = FontRegistry::new();
        let mut ctx = DrawContext::new(&mut fonts, false, false);
        TextPlugin.export(&w, &mut ctx).unwrap();
        assert!(ctx
            .lines
            .iter()
            .any(|l| l.trim() == "if (id(switch_fan).state) {"));
        assert_eq!(ctx.lines.last().map(|l| l.trim()), Some("}"));
    }

    #[test]
    fn long_text_wraps_and_escapes() {
        let w = widget(serde_json::json!({
            "id": "t3", "type": "text", "x": 0, "y": 0, "width": 100, "height": 60,
            "props": { "text": "100% of these words will wrap here", "font_size": 20 }
        }));
        let mut fonts = FontRegistry::new();
        let mut ctx = DrawContext::new(&mut fonts, false, false);
        TextPlugin.export(&w, &mut ctx).unwrap();
        let printfs: Vec<&String> = ctx.lines.iter().filter(|l| l.contains("it.printf")).collect();
        assert!(printfs.len() > 1);
        assert!(printfs[0].contains("100%%"));
    }

    #[test]
    fn gray_on_epaper_dithers() {
        let w = widget(serde_json::json!({
            "id": "t4", "type": "text", "x": 0, "y": 0, "width": 100, "height": 20,
            "props": { "text": "Dim", "color": "gray" }
        }));
        let mut fonts = FontRegistry::new();
        let mut ctx = DrawContext::new(&mut fonts, true, false);
        TextPlugin.export(&w, &mut ctx).unwrap();
        assert!(ctx.lines.iter().any(|l| l.contains("COLOR_BLACK")));
        assert!(ctx
            .lines
            .iter()
            .any(|l| l.contains("apply_grey_dither_to_text(0, 0, 100, 20);")));
    }

    #[test]
    fn lvgl_label_descriptor() {
        let w = widget(serde_json::json!({
            "id": "t5", "type": "text", "x": 5, "y": 6, "width": 80, "height": 30,
            "props": { "text": "Hi", "text_align": "TOP_CENTER", "color": "#FF0000" }
        }));
        let lw = TextPlugin.export_lvgl(&w, &LvglContext { has_touch: false }).unwrap();
        assert_eq!(lw.kind, "label");
        assert_eq!(lw.attrs.get("text"), Some(&"\"Hi\"".into()));
        assert_eq!(lw.attrs.get("text_align"), Some(&"center".into()));
        assert_eq!(lw.attrs.get("text_color"), Some(&"\"0xFF0000\"".into()));
    }
}
