//! The `lvgl:` section for touch-LCD profiles: one LVGL page per
//! layout page, widgets transpiled by their plugins, with marker
//! comments so a re-import can recover the layout.

use screengen_core::Project;
use screengen_widgets::lvgl::{serialize_attrs, widget_marker, LvglContext};
use screengen_widgets::PluginRegistry;

use crate::profiles::DeviceProfile;

const BANNER: &str =
    "# ============================================================================";

pub fn lvgl_section(
    profile: &DeviceProfile,
    project: &Project,
    registry: &PluginRegistry,
) -> Vec<String> {
    let ctx = LvglContext {
        has_touch: profile.features.touch,
    };

    let mut lines = vec![
        BANNER.to_string(),
        "# LVGL Configuration".to_string(),
        BANNER.to_string(),
        String::new(),
        "lvgl:".to_string(),
        "  id: my_lvgl".to_string(),
        "  log_level: WARN".to_string(),
        "  bg_color: \"0xFFFFFF\"".to_string(),
        "  displays:".to_string(),
        format!("    - {}", profile.display_id()),
    ];
    if profile.features.touch {
        lines.push("  touchscreens:".to_string());
        lines.push("    - my_touchscreen".to_string());
    }
    lines.push(String::new());
    lines.push("  pages:".to_string());

    for (page_index, page) in project.pages.iter().enumerate() {
        lines.push(format!("    - id: page_{page_index}"));
        lines.push("      widgets:".to_string());

        let visible: Vec<_> = page
            .widgets
            .iter()
            .filter(|w| !w.hidden && w.kind != "group")
            .collect();
        if visible.is_empty() {
            lines.push("        []".to_string());
            continue;
        }

        for widget in visible {
            lines.push(format!("        {}", widget_marker(widget)));
            let transpiled = registry
                .get(&widget.kind)
                .and_then(|p| p.export_lvgl(widget, &ctx));
            if let Some(lw) = transpiled {
                lines.push(format!("        - {}:", lw.kind));
                serialize_attrs(&lw.attrs, &mut lines, 12);
            }
        }
    }
    lines.push(String::new());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::builtin;

    fn lcd_project(widgets: serde_json::Value) -> Project {
        serde_json::from_value(serde_json::json!({
            "device_model": "waveshare_esp32_s3_touch_lcd_7",
            "pages": [{ "name": "Main", "widgets": widgets }]
        }))
        .unwrap()
    }

    #[test]
    fn touch_profiles_list_the_touchscreen() {
        let profile = builtin("waveshare_esp32_s3_touch_lcd_7").unwrap();
        let registry = PluginRegistry::with_builtins();
        let text = lvgl_section(&profile, &lcd_project(serde_json::json!([])), &registry).join("\n");
        assert!(text.contains("lvgl:"));
        assert!(text.contains("  displays:\n    - my_display"));
        assert!(text.contains("  touchscreens:\n    - my_touchscreen"));
        assert!(text.contains("    - id: page_0"));
        assert!(text.contains("        []"));
    }

    #[test]
    fn widgets_get_marker_and_transpiled_body() {
        let profile = builtin("waveshare_esp32_s3_touch_lcd_7").unwrap();
        let registry = PluginRegistry::with_builtins();
        let p = lcd_project(serde_json::json!([
            { "id": "t1", "type": "text", "x": 10, "y": 20, "width": 100, "height": 30,
              "props": { "text": "Hello" } }
        ]));
        let lines = lvgl_section(&profile, &p, &registry);
        let marker = lines
            .iter()
            .position(|l| l.trim_start().starts_with("# widget:text id:t1"))
            .unwrap();
        assert!(lines[marker].starts_with("        #"));
        assert!(lines[marker + 1].starts_with("        - label:"));
    }

    #[test]
    fn hidden_widgets_keep_page_but_not_body() {
        let profile = builtin("waveshare_esp32_s3_touch_lcd_7").unwrap();
        let registry = PluginRegistry::with_builtins();
        let p = lcd_project(serde_json::json!([
            { "id": "t1", "type": "text", "x": 0, "y": 0, "width": 10, "height": 10,
              "hidden": true, "props": { "text": "secret" } }
        ]));
        let text = lvgl_section(&profile, &p, &registry).join("\n");
        assert!(text.contains("        []"));
        assert!(!text.contains("secret"));
    }
}
