//! Material Design icon widget.

use screengen_core::{compile_condition, condition_props, Widget};

use crate::context::DrawContext;
use crate::fonts::font_id;
use crate::lvgl::{common_attrs, convert_color, LvglContext, LvglWidget};
use crate::plugins::{int_prop_or, round_mid, str_prop_or};
use crate::{ExportError, FontRegistry, WidgetPlugin};

const ICON_FONT: &str = "Material Design Icons";
const DEFAULT_CODE: &str = "F0595";

fn icon_code(w: &Widget) -> String {
    let code = str_prop_or(w, "code", DEFAULT_CODE);
    let code = code.strip_prefix("0x").or_else(|| code.strip_prefix("0X")).unwrap_or(code);
    code.to_string()
}

pub struct IconPlugin;

impl WidgetPlugin for IconPlugin {
    fn kind(&self) -> &'static str {
        "icon"
    }

    fn collect_requirements(&self, w: &Widget, fonts: &mut FontRegistry) {
        let size = int_prop_or(w, "size", 48) as u32;
        if let Some(code) = w.prop_str("code").filter(|c| !c.is_empty()) {
            fonts.track_icon(code, size);
        }
        fonts.add_font(ICON_FONT, 400, size, false);
    }

    fn export(&self, w: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError> {
        let code = icon_code(w);
        let size = int_prop_or(w, "size", 48);
        let color_prop = str_prop_or(w, "color", "theme_auto").to_string();
        let color = ctx.color_const(&color_prop);
        let font_ref = ctx.add_font(ICON_FONT, 400, size as u32, false);

        ctx.push(format!(
            "        // widget:icon id:{} type:icon x:{} y:{} w:{} h:{} code:{code} size:{size} color:{color_prop}{}",
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

        let cx = round_mid(w.x, w.width);
        let cy = round_mid(w.y, w.height);
        // printf keeps the unicode escape out of the YAML parser's way.
        ctx.push(format!(
            "        it.printf({cx}, {cy}, id({font_ref}), {color}, TextAlign::CENTER, \"%s\", \"\\U000{code}\");"
        ));

        ctx.dither_mask(&color_prop, w.x, w.y, size as i32, size as i32);

        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.close()));
        }
        Ok(())
    }

    fn export_lvgl(&self, w: &Widget, _ctx: &LvglContext) -> Option<LvglWidget> {
        let code = icon_code(w);
        let size = int_prop_or(w, "size", 48) as u32;
        let mut attrs = common_attrs(w);
        attrs.insert("text".into(), format!("\"\\U000{code}\"").into());
        attrs.insert("text_font".into(), font_id(ICON_FONT, 400, size, false).into());
        attrs.insert(
            "text_color".into(),
            convert_color(str_prop_or(w, "color", "theme_auto")).into(),
        );
        attrs.insert("text_align".into(), "center".into());
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
    fn centers_icon_and_registers_font() {
        let w = widget(serde_json::json!({
            "id": "i1", "type": "icon", "x": 10, "y": 10, "width": 60, "height": 60,
            "props": { "code": "F0599", "size": 48 }
        }));
        let mut fonts = FontRegistry::new();
        IconPlugin.collect_requirements(&w, &mut fonts);
        let mut ctx = DrawContext::new(&mut fonts, false, false);
        IconPlugin.export(&w, &mut ctx).unwrap();
        assert!(ctx.lines.iter().any(|l| l.contains(
            "it.printf(40, 40, id(font_material_design_icons_400_48), color_on, TextAlign::CENTER, \"%s\", \"\\U000F0599\");"
        )));
    }

    #[test]
    fn default_code_applies() {
        let w = widget(serde_json::json!({
            "id": "i2", "type": "icon", "x": 0, "y": 0, "width": 40, "height": 40,
            "props": {}
        }));
        let mut fonts = FontRegistry::new();
        let mut ctx = DrawContext::new(&mut fonts, false, false);
        IconPlugin.export(&w, &mut ctx).unwrap();
        assert!(ctx.lines.iter().any(|l| l.contains("\\U000F0595")));
    }

    #[test]
    fn lvgl_label_uses_icon_font() {
        let w = widget(serde_json::json!({
            "id": "i3", "type": "icon", "x": 0, "y": 0, "width": 40, "height": 40,
            "props": { "code": "F0238", "size": 24 }
        }));
        let lw = IconPlugin.export_lvgl(&w, &LvglContext { has_touch: false }).unwrap();
        assert_eq!(lw.attrs.get("text"), Some(&"\"\\U000F0238\"".into()));
        assert_eq!(
            lw.attrs.get("text_font"),
            Some(&"font_material_design_icons_400_24".into())
        );
    }
}
