//! Drawing-lambda generation: the C++ body handed to the display
//! component, built page by page from the widget plugins.

use screengen_core::{PageTheme, Project, Widget};
use screengen_widgets::lvgl::widget_marker;
use screengen_widgets::{DrawContext, FontRegistry, PluginRegistry};
use tracing::warn;

use crate::profiles::DeviceProfile;

fn page_banner() -> String {
    format!("// {}", "\u{2550}".repeat(63))
}

fn widget_separator() -> String {
    format!("  // {}", "\u{2500}".repeat(40))
}

/// Color constants and the wrap/dither helper lambdas every page body
/// relies on.
fn push_preamble(lines: &mut Vec<String>, profile: &DeviceProfile) {
    if profile.features.inverted_colors {
        lines.push("const auto COLOR_WHITE = Color(0, 0, 0); // Inverted for e-ink".into());
        lines.push("const auto COLOR_BLACK = Color(255, 255, 255); // Inverted for e-ink".into());
    } else {
        lines.push("const auto COLOR_WHITE = Color(255, 255, 255);".into());
        lines.push("const auto COLOR_BLACK = Color(0, 0, 0);".into());
    }

    // The PhotoPainter's 6-color panel uses a remapped palette; orange
    // does not exist there and falls back to red.
    if profile.id == "esp32_s3_photopainter" {
        lines.push("const auto COLOR_RED = Color(0, 0, 255);".into());
        lines.push("const auto COLOR_GREEN = Color(255, 128, 0);".into());
        lines.push("const auto COLOR_BLUE = Color(255, 255, 0);".into());
        lines.push("const auto COLOR_YELLOW = Color(0, 255, 0);".into());
        lines.push("const auto COLOR_ORANGE = Color(0, 0, 255); // Fallback to Red".into());
    } else {
        lines.push("const auto COLOR_RED = Color(255, 0, 0);".into());
        lines.push("const auto COLOR_GREEN = Color(0, 255, 0);".into());
        lines.push("const auto COLOR_BLUE = Color(0, 0, 255);".into());
        lines.push("const auto COLOR_YELLOW = Color(255, 255, 0);".into());
        lines.push("const auto COLOR_ORANGE = Color(255, 165, 0);".into());
    }

    lines.push("auto color_off = COLOR_WHITE;".into());
    lines.push("auto color_on = COLOR_BLACK;".into());
    lines.push(String::new());

    lines.push("// Helper to print text with word-wrap at widget boundary".into());
    lines.push("auto print_wrapped_text = [&](int x, int y, int max_w, int line_h, esphome::font::Font *font, Color color, TextAlign align, const char* text) {".into());
    lines.push("  if (!text || max_w <= 0) return;".into());
    lines.push("  int cx = x;".into());
    lines.push("  int cy = y;".into());
    lines.push("  std::string line;".into());
    lines.push("  std::string word;".into());
    lines.push("  const char* p = text;".into());
    lines.push("  while (*p) {".into());
    lines.push("    // Newlines, carriage returns and tabs flow like spaces".into());
    lines.push("    bool is_space = (*p == ' ' || *p == '\\n' || *p == '\\r' || *p == '\\t');".into());
    lines.push("    if (is_space) {".into());
    lines.push("      if (!word.empty()) {".into());
    lines.push("        int ww, wh, wbl, wx;".into());
    lines.push("        font->measure(word.c_str(), &ww, &wx, &wbl, &wh);".into());
    lines.push("        int lw = 0, lx;".into());
    lines.push("        if (!line.empty()) { font->measure(line.c_str(), &lw, &lx, &wbl, &wh); int sw, sx, sbl, sh; font->measure(\" \", &sw, &sx, &sbl, &sh); lw += sw; }".into());
    lines.push("        if (lw + ww > max_w && !line.empty()) {".into());
    lines.push("          it.print(cx, cy, font, color, align, line.c_str());".into());
    lines.push("          cy += line_h;".into());
    lines.push("          line = word;".into());
    lines.push("        } else {".into());
    lines.push("          if (!line.empty()) line += \" \";".into());
    lines.push("          line += word;".into());
    lines.push("        }".into());
    lines.push("        word.clear();".into());
    lines.push("      }".into());
    lines.push("    } else {".into());
    lines.push("      word += *p;".into());
    lines.push("    }".into());
    lines.push("    p++;".into());
    lines.push("  }".into());
    lines.push("  if (!word.empty()) {".into());
    lines.push("    int ww, wh, wbl, wx;".into());
    lines.push("    font->measure(word.c_str(), &ww, &wx, &wbl, &wh);".into());
    lines.push("    int lw = 0, lx;".into());
    lines.push("    if (!line.empty()) { font->measure(line.c_str(), &lw, &lx, &wbl, &wh); int sw, sx, sbl, sh; font->measure(\" \", &sw, &sx, &sbl, &sh); lw += sw; }".into());
    lines.push("    if (lw + ww > max_w && !line.empty()) {".into());
    lines.push("      it.print(cx, cy, font, color, align, line.c_str());".into());
    lines.push("      cy += line_h;".into());
    lines.push("      line = word;".into());
    lines.push("    } else {".into());
    lines.push("      if (!line.empty()) line += \" \";".into());
    lines.push("      line += word;".into());
    lines.push("    }".into());
    lines.push("  }".into());
    lines.push("  if (!line.empty()) {".into());
    lines.push("    it.print(cx, cy, font, color, align, line.c_str());".into());
    lines.push("  }".into());
    lines.push("};".into());
    lines.push(String::new());

    if profile.is_epaper() {
        lines.push("// Helper to apply a simple grey dither mask for e-paper (checkerboard)".into());
        lines.push("auto apply_grey_dither_mask = [&](int x_start, int y_start, int w, int h) {".into());
        lines.push("  for (int y = y_start; y < y_start + h; y++) {".into());
        lines.push("    for (int x = x_start; x < x_start + w; x++) {".into());
        lines.push("      if ((x + y) % 2 == 0) it.draw_pixel_at(x, y, COLOR_WHITE);".into());
        lines.push("      else it.draw_pixel_at(x, y, COLOR_BLACK);".into());
        lines.push("    }".into());
        lines.push("  }".into());
        lines.push("};".into());
        lines.push(String::new());
        lines.push("// Helper to apply grey dither to text (subtractive - erases every other black pixel)".into());
        lines.push("auto apply_grey_dither_to_text = [&](int x_start, int y_start, int w, int h) {".into());
        lines.push("  for (int y = y_start; y < y_start + h; y++) {".into());
        lines.push("    for (int x = x_start; x < x_start + w; x++) {".into());
        lines.push("      if ((x + y) % 2 == 0) it.draw_pixel_at(x, y, COLOR_WHITE);".into());
        lines.push("    }".into());
        lines.push("  }".into());
        lines.push("};".into());
    }
}

/// Lines for one widget: the plugin's drawing code, or a marker when
/// the type is unknown. A failing plugin degrades to an error comment
/// so one bad widget never loses the rest of the page.
pub fn generate_widget(
    registry: &PluginRegistry,
    widget: &Widget,
    fonts: &mut FontRegistry,
    is_epaper: bool,
    is_dark: bool,
) -> Vec<String> {
    if widget.kind == "group" {
        return Vec::new();
    }
    if let Some(plugin) = registry.get(&widget.kind) {
        let mut ctx = DrawContext::new(fonts, is_epaper, is_dark);
        match plugin.export(widget, &mut ctx) {
            Ok(()) => ctx.lines,
            Err(e) => {
                warn!(widget = %widget.id, error = %e, "widget export failed");
                vec![
                    format!("// widget:{} id:{} status:error", widget.kind, widget.id),
                    format!("        // Export failed: {e}"),
                ]
            }
        }
    } else if widget.kind.starts_with("lvgl_") {
        // Keep the marker so a re-import does not lose the widget.
        vec![widget_marker(widget)]
    } else {
        vec![
            format!("// widget:{} id:{} status:unsupported", widget.kind, widget.id),
            format!("        // Unsupported widget type: {}", widget.kind),
        ]
    }
}

fn theme_str(theme: PageTheme) -> &'static str {
    match theme {
        PageTheme::Inherit => "inherit",
        PageTheme::Light => "light",
        PageTheme::Dark => "dark",
    }
}

/// The full lambda body: preamble, helper hook output, then one
/// `if (currentPage == N)` block per page.
pub fn generate_display_lambda(
    profile: &DeviceProfile,
    project: &Project,
    helper_lines: &[String],
    registry: &PluginRegistry,
    fonts: &mut FontRegistry,
) -> Vec<String> {
    let is_epaper = profile.is_epaper();
    let mut lines = Vec::new();
    push_preamble(&mut lines, profile);
    lines.extend(helper_lines.iter().cloned());

    lines.push("int currentPage = id(display_page);".into());
    if !is_epaper {
        // LCDs re-render continuously; track page flips to pick the
        // clear strategy below.
        lines.push("static int last_rendered_page = -1;".into());
        lines.push("bool page_changed = (last_rendered_page != currentPage);".into());
        lines.push("if (page_changed) last_rendered_page = currentPage;".into());
    }

    for (index, page) in project.pages.iter().enumerate() {
        let page_name = if page.name.is_empty() {
            format!("Page {}", index + 1)
        } else {
            page.name.clone()
        };
        lines.push(page_banner());
        lines.push(format!("// \u{25b8} PAGE: {page_name}"));
        lines.push(page_banner());
        lines.push(format!("if (currentPage == {index}) {{"));

        lines.push(format!("  // page:name \"{page_name}\""));
        lines.push(format!("  // page:dark_mode \"{}\"", theme_str(page.theme)));
        lines.push("  // page:refresh_type \"interval\"".into());
        lines.push(format!(
            "  // page:refresh_time \"{}\"",
            page.refresh_time.map(|t| t.to_string()).unwrap_or_default()
        ));

        let is_dark = page.dark_mode(project.dark_mode);
        let bg = if is_dark { "COLOR_BLACK" } else { "COLOR_WHITE" };
        lines.push("  // Clear screen for this page".into());
        if !is_epaper {
            lines.push("  if (page_changed) {".into());
            lines.push("    // Full clear on page change (prevents black artifacts)".into());
            lines.push(format!(
                "    it.filled_rectangle(0, 0, it.get_width(), it.get_height(), {bg});"
            ));
            lines.push("  } else {".into());
            lines.push("    // Fast clear for same-page updates".into());
            lines.push(format!("    it.fill({bg});"));
            lines.push("  }".into());
        } else {
            lines.push(format!("  it.fill({bg});"));
        }
        lines.push(format!(
            "  color_off = {};",
            if is_dark { "COLOR_BLACK" } else { "COLOR_WHITE" }
        ));
        lines.push(format!(
            "  color_on = {};",
            if is_dark { "COLOR_WHITE" } else { "COLOR_BLACK" }
        ));

        let visible: Vec<&Widget> = page
            .widgets
            .iter()
            .filter(|w| !w.hidden && w.kind != "group")
            .collect();
        let count = visible.len();
        for (wi, widget) in visible.into_iter().enumerate() {
            let widget_lines = generate_widget(registry, widget, fonts, is_epaper, is_dark);
            if widget_lines.is_empty() {
                continue;
            }
            // De-indent to the shallowest line, then re-indent into the
            // page block so relative offsets survive.
            let min_indent = widget_lines
                .iter()
                .filter(|l| !l.trim().is_empty())
                .map(|l| l.len() - l.trim_start().len())
                .min()
                .unwrap_or(0);
            for l in &widget_lines {
                if l.trim().is_empty() {
                    lines.push(String::new());
                } else {
                    lines.push(format!("  {}", &l[min_indent..]));
                }
            }
            if wi < count - 1 {
                lines.push(widget_separator());
            }
        }
        lines.push("}".into());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::builtin;

    fn project(json: serde_json::Value) -> Project {
        serde_json::from_value(json).unwrap()
    }

    fn trmnl_project(widgets: serde_json::Value) -> Project {
        project(serde_json::json!({
            "device_model": "trmnl",
            "pages": [{ "name": "Main", "widgets": widgets }]
        }))
    }

    #[test]
    fn preamble_inverts_colors_for_eink() {
        let profile = builtin("trmnl").unwrap();
        let p = trmnl_project(serde_json::json!([]));
        let registry = PluginRegistry::with_builtins();
        let mut fonts = FontRegistry::new();
        let text = generate_display_lambda(&profile, &p, &[], &registry, &mut fonts).join("\n");
        assert!(text.contains("const auto COLOR_WHITE = Color(0, 0, 0); // Inverted for e-ink"));
        assert!(text.contains("apply_grey_dither_mask"));
        assert!(text.contains("if (currentPage == 0) {"));
        assert!(!text.contains("page_changed"));
    }

    #[test]
    fn photopainter_palette_remaps_orange_to_red() {
        let profile = builtin("esp32_s3_photopainter").unwrap();
        let p = project(serde_json::json!({
            "device_model": "esp32_s3_photopainter",
            "pages": [{ "name": "A", "widgets": [] }]
        }));
        let registry = PluginRegistry::with_builtins();
        let mut fonts = FontRegistry::new();
        let text = generate_display_lambda(&profile, &p, &[], &registry, &mut fonts).join("\n");
        assert!(text.contains("const auto COLOR_ORANGE = Color(0, 0, 255); // Fallback to Red"));
    }

    #[test]
    fn hidden_widgets_are_excluded() {
        let profile = builtin("trmnl").unwrap();
        let p = trmnl_project(serde_json::json!([
            { "id": "w1", "type": "text", "x": 0, "y": 0, "width": 100, "height": 20,
              "props": { "text": "shown" } },
            { "id": "w2", "type": "text", "x": 0, "y": 30, "width": 100, "height": 20,
              "hidden": true, "props": { "text": "hidden" } }
        ]));
        let registry = PluginRegistry::with_builtins();
        let mut fonts = FontRegistry::new();
        let text = generate_display_lambda(&profile, &p, &[], &registry, &mut fonts).join("\n");
        assert!(text.contains("shown"));
        assert!(!text.contains("hidden\""));
        assert!(!text.contains("id:w2"));
    }

    #[test]
    fn unknown_widget_degrades_to_marker() {
        let registry = PluginRegistry::with_builtins();
        let mut fonts = FontRegistry::new();
        let w: Widget = serde_json::from_value(serde_json::json!({
            "id": "w9", "type": "crystal_ball", "x": 0, "y": 0,
            "width": 10, "height": 10
        }))
        .unwrap();
        let lines = generate_widget(&registry, &w, &mut fonts, true, false);
        assert_eq!(lines[0], "// widget:crystal_ball id:w9 status:unsupported");
        assert!(lines[1].contains("Unsupported widget type: crystal_ball"));
    }

    #[test]
    fn lvgl_widget_keeps_marker_in_direct_mode() {
        let registry = PluginRegistry::with_builtins();
        let mut fonts = FontRegistry::new();
        let w: Widget = serde_json::from_value(serde_json::json!({
            "id": "b1", "type": "lvgl_button", "x": 5, "y": 5,
            "width": 60, "height": 30
        }))
        .unwrap();
        let lines = generate_widget(&registry, &w, &mut fonts, true, false);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("# widget:lvgl_button id:b1"));
    }

    #[test]
    fn dark_page_swaps_fill_and_pens() {
        let profile = builtin("trmnl").unwrap();
        let p = project(serde_json::json!({
            "device_model": "trmnl",
            "pages": [{ "name": "Night", "theme": "dark", "widgets": [] }]
        }));
        let registry = PluginRegistry::with_builtins();
        let mut fonts = FontRegistry::new();
        let text = generate_display_lambda(&profile, &p, &[], &registry, &mut fonts).join("\n");
        assert!(text.contains("  it.fill(COLOR_BLACK);"));
        assert!(text.contains("  color_on = COLOR_WHITE;"));
        assert!(text.contains("// page:dark_mode \"dark\""));
    }

    #[test]
    fn separators_only_between_widgets() {
        let profile = builtin("trmnl").unwrap();
        let p = trmnl_project(serde_json::json!([
            { "id": "a", "type": "text", "x": 0, "y": 0, "width": 50, "height": 20,
              "props": { "text": "one" } },
            { "id": "b", "type": "text", "x": 0, "y": 30, "width": 50, "height": 20,
              "props": { "text": "two" } }
        ]));
        let registry = PluginRegistry::with_builtins();
        let mut fonts = FontRegistry::new();
        let lines = generate_display_lambda(&profile, &p, &[], &registry, &mut fonts);
        let separators = lines.iter().filter(|l| l.contains("\u{2500}")).count();
        assert_eq!(separators, 1);
    }
}
