//! Sensor-backed text widget: formats one or two entity states with a
//! label, unit and printf-style precision.

use indexmap::IndexSet;
use screengen_core::condition::fmt_num;
use screengen_core::{compile_condition, condition_props, Widget};

use crate::context::{DrawContext, HookContext};
use crate::lvgl::{common_attrs, convert_color, format_opacity, lvgl_font, LvglContext, LvglWidget};
use crate::plugins::{escape_fmt, int_prop_or, round_mid, str_prop_or};
use crate::{ExportError, FontRegistry, WidgetPlugin};

/// ESPHome id derived from an entity id, truncated so the suffix still
/// fits the 63-char component id limit.
fn make_safe_id(eid: &str, suffix: &str) -> String {
    let mut safe: String = eid
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    safe.truncate(63usize.saturating_sub(suffix.len()));
    safe.push_str(suffix);
    safe
}

/// Guess a display unit from the entity id when none is configured.
fn infer_unit(eid: &str) -> &'static str {
    let e = eid.to_ascii_lowercase();
    if e.contains("_power") || e.contains("_watt") {
        "W"
    } else if e.contains("_energy") || e.contains("_kwh") {
        "kWh"
    } else if e.contains("_temperature") || e.contains("_temp") {
        "°C"
    } else if e.contains("_humidity") {
        "%"
    } else if e.contains("_voltage") || e.contains("_volt") {
        "V"
    } else if e.contains("_current") || e.contains("_amp") {
        "A"
    } else if e.contains("_battery") {
        "%"
    } else if e.contains("_pressure") || e.contains("_hpa") {
        "hPa"
    } else if e.contains("_speed") || e.contains("_kmh") {
        "km/h"
    } else if e.contains("_percent") || e.contains("_pct") {
        "%"
    } else {
        ""
    }
}

fn resolved(entity: &str, local: bool) -> String {
    if !entity.is_empty() && !local && !entity.contains('.') && !entity.starts_with("text_sensor.") {
        format!("sensor.{entity}")
    } else {
        entity.to_string()
    }
}

fn is_text_entity(w: &Widget, entity: &str) -> bool {
    w.prop_bool("is_text_sensor").unwrap_or(false)
        || entity.starts_with("text_sensor.")
        || entity.starts_with("weather.")
}

fn precision(w: &Widget) -> i64 {
    match w.prop_i64("precision") {
        Some(v) if v >= 0 => v,
        _ => 2,
    }
}

fn effective_title(w: &Widget, entity: &str, format: &str) -> String {
    let mut title = w.title_text().trim().to_string();
    if title.is_empty() {
        title = str_prop_or(w, "title", "").trim().to_string();
    }
    if title.is_empty() && format.starts_with("label_") {
        title = entity
            .rsplit('.')
            .next()
            .unwrap_or("")
            .replace('_', " ");
    }
    title
}

fn text_align_enum(a: &str) -> String {
    if a == "CENTER" {
        "TextAlign::CENTER".to_string()
    } else {
        format!("TextAlign::{a}")
    }
}

pub struct SensorTextPlugin;

impl WidgetPlugin for SensorTextPlugin {
    fn kind(&self) -> &'static str {
        "sensor_text"
    }

    fn collect_requirements(&self, w: &Widget, fonts: &mut FontRegistry) {
        let family = str_prop_or(w, "font_family", "Roboto");
        let weight = int_prop_or(w, "font_weight", 400) as u32;
        let italic = w.prop_bool("italic").unwrap_or(false);
        fonts.add_font(family, weight, int_prop_or(w, "label_font_size", 14) as u32, italic);
        fonts.add_font(family, weight, int_prop_or(w, "value_font_size", 20) as u32, italic);
    }

    fn export(&self, w: &Widget, ctx: &mut DrawContext<'_>) -> Result<(), ExportError> {
        let local = w.prop_bool("is_local_sensor").unwrap_or(false);
        let entity = resolved(w.entity(), local);
        let entity2 = resolved(w.entity2(), local);
        let format = str_prop_or(w, "value_format", "label_value").to_string();
        let hide_unit = w.prop_bool("hide_unit").unwrap_or(false);
        let no_unit = format.ends_with("_no_unit");

        let mut unit = str_prop_or(w, "unit", "").trim().to_string();
        if unit.is_empty() && !hide_unit && !no_unit && !entity.is_empty() {
            unit = infer_unit(&entity).to_string();
        }

        let label_fs = int_prop_or(w, "label_font_size", 14);
        let value_fs = int_prop_or(w, "value_font_size", 20);
        let family = str_prop_or(w, "font_family", "Roboto").to_string();
        let weight = int_prop_or(w, "font_weight", 400) as u32;
        let italic = w.prop_bool("italic").unwrap_or(false);
        let color_prop = str_prop_or(w, "color", "theme_auto").to_string();
        let color = ctx.color_const(&color_prop);
        let text_align = str_prop_or(w, "text_align", "TOP_LEFT").to_string();
        let separator = str_prop_or(w, "separator", " ~ ").to_string();
        let prec = precision(w);

        ctx.push(format!(
            "        // widget:sensor_text id:{} type:sensor_text x:{} y:{} w:{} h:{} align:{text_align} entity:\"{entity}\" format:\"{format}\"{}",
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

        let border_width = int_prop_or(w, "border_width", 0);
        if border_width > 0 {
            let border_color = ctx.color_const(str_prop_or(w, "border_color", "theme_auto"));
            for i in 0..border_width {
                ctx.push(format!(
                    "        it.rectangle({} + {i}, {} + {i}, {} - 2 * {i}, {} - 2 * {i}, {});",
                    w.x, w.y, w.width, w.height, border_color
                ));
            }
        }

        if entity.is_empty() && !local {
            ctx.push("        // Sensor ID missing for this widget".to_string());
            return Ok(());
        }

        let label_font = ctx.add_font(&family, weight, label_fs as u32, italic);
        let value_font = ctx.add_font(&family, weight, value_fs as u32, italic);

        let cond = compile_condition(w);
        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.open()));
        }

        let is_text1 = is_text_entity(w, &entity);
        let is_text2 = !entity2.is_empty() && is_text_entity(w, &entity2);

        let var_name = |eid: &str, is_text: bool| {
            if local {
                format!("id({})", if eid.is_empty() { "battery_level" } else { eid })
            } else if is_text {
                format!("id({})", make_safe_id(eid, "_txt"))
            } else {
                format!("id({})", make_safe_id(eid, ""))
            }
        };
        let v1 = var_name(&entity, is_text1);
        let v2 = if entity2.is_empty() { None } else { Some(var_name(&entity2, is_text2)) };

        let val_fmt1 = if is_text1 { "%s".to_string() } else { format!("%.{prec}f") };
        let val_fmt2 = if is_text2 { "%s".to_string() } else { format!("%.{prec}f") };

        let title = effective_title(w, &entity, &format);
        let display_unit = if hide_unit || no_unit { String::new() } else { escape_fmt(&unit) };
        let prefix = escape_fmt(str_prop_or(w, "prefix", ""));
        let postfix = escape_fmt(str_prop_or(w, "postfix", ""));
        let sep = escape_fmt(&separator);

        let label_align = text_align_enum(str_prop_or(w, "label_align", &text_align));
        let value_align = text_align_enum(str_prop_or(w, "value_align", &text_align));

        let mut x_val = w.x;
        let mut y_val = w.y;
        let is_right = text_align.contains("RIGHT");
        let is_left = text_align.contains("LEFT");
        if is_right {
            x_val = w.x + w.width;
        } else if !is_left {
            x_val = round_mid(w.x, w.width);
        }
        if text_align.contains("BOTTOM") {
            y_val = w.y + w.height;
        } else if !text_align.contains("TOP") {
            y_val = round_mid(w.y, w.height);
        }

        let mut final_fmt = format!("{prefix}{val_fmt1}");
        if v2.is_some() {
            final_fmt.push_str(&sep);
            final_fmt.push_str(&val_fmt2);
        }
        if !display_unit.is_empty() {
            final_fmt.push(' ');
            final_fmt.push_str(&display_unit);
        }
        final_fmt.push_str(&postfix);

        let state_of = |v: &str, text: bool| {
            if text { format!("{v}.state.c_str()") } else { format!("{v}.state") }
        };
        let arg1 = state_of(&v1, is_text1);
        let args = match &v2 {
            Some(v2) => format!("{arg1}, {}", state_of(v2, is_text2)),
            None => arg1,
        };

        let use_wrapping = w.width > 50;
        if format == "label_only" {
            ctx.push(format!(
                "        it.printf({x_val}, {y_val}, id({label_font}), {color}, {label_align}, \"{title}\");"
            ));
        } else if format == "value_only" || format == "value_only_no_unit" || title.is_empty() {
            if use_wrapping {
                let line_height = value_fs + 4;
                ctx.push("        {".to_string());
                ctx.push("          char wrap_buf[512];".to_string());
                ctx.push(format!("          sprintf(wrap_buf, \"{final_fmt}\", {args});"));
                ctx.push(format!(
                    "          print_wrapped_text({x_val}, {y_val}, {}, {line_height}, id({value_font}), {color}, {value_align}, wrap_buf);",
                    w.width
                ));
                ctx.push("        }".to_string());
            } else {
                ctx.push(format!(
                    "        it.printf({x_val}, {y_val}, id({value_font}), {color}, {value_align}, \"{final_fmt}\", {args});"
                ));
            }
        } else if format == "label_value" || format == "label_value_no_unit" {
            let label_str = if title.ends_with(':') {
                format!("{title} ")
            } else {
                format!("{title}: ")
            };
            if (label_fs != value_fs && text_align.contains("LEFT")) || use_wrapping {
                let align = text_align_enum(&text_align);
                ctx.push("        {".to_string());
                ctx.push("          int w1, h1, xoff1, bl1;".to_string());
                ctx.push("          int w2, h2, xoff2, bl2;".to_string());
                ctx.push("          char value_buf[512];".to_string());
                ctx.push(format!("          sprintf(value_buf, \"{final_fmt}\", {args});"));
                ctx.push(format!(
                    "          id({label_font})->measure(\"{label_str}\", &w1, &xoff1, &bl1, &h1);"
                ));
                if use_wrapping {
                    let line_height = value_fs + 4;
                    let baseline_est = (value_fs as f64 * 0.8).round() as i64;
                    ctx.push(format!(
                        "          it.printf({x_val}, {y_val}, id({label_font}), {color}, {align}, \"{label_str}\");"
                    ));
                    ctx.push(format!("          int val_max_w = {} - w1;", w.width));
                    ctx.push(format!(
                        "          print_wrapped_text({x_val} + w1, {y_val} + (bl1 - {baseline_est}), val_max_w, {line_height}, id({value_font}), {color}, {align}, value_buf);"
                    ));
                } else {
                    ctx.push(format!(
                        "          id({value_font})->measure(value_buf, &w2, &xoff2, &bl2, &h2);"
                    ));
                    // Shift the value down so both baselines line up.
                    ctx.push(format!(
                        "          it.printf({x_val}, {y_val}, id({label_font}), {color}, {align}, \"{label_str}\");"
                    ));
                    ctx.push(format!(
                        "          it.printf({x_val} + w1, {y_val} + (bl1 - bl2), id({value_font}), {color}, {align}, \"%s\", value_buf);"
                    ));
                }
                ctx.push("        }".to_string());
            } else {
                ctx.push(format!(
                    "        it.printf({x_val}, {y_val}, id({value_font}), {color}, {value_align}, \"{label_str}{final_fmt}\", {args});"
                ));
            }
        } else if format == "label_newline_value" || format == "label_newline_value_no_unit" {
            let line_dist = label_fs + 4;
            let y_off = if text_align.contains("BOTTOM") {
                -(line_dist as f64)
            } else if !text_align.contains("TOP") {
                -(line_dist as f64) / 2.0
            } else {
                0.0
            };
            let y_off = fmt_num(y_off);
            ctx.push(format!(
                "        it.printf({x_val}, {y_val} + {y_off}, id({label_font}), {color}, {label_align}, \"{title}\");"
            ));
            ctx.push(format!(
                "        it.printf({x_val}, {y_val} + {y_off} + {line_dist}, id({value_font}), {color}, {value_align}, \"{final_fmt}\", {args});"
            ));
        } else if format == "value_label" {
            ctx.push(format!(
                "        it.printf({x_val}, {y_val}, id({value_font}), {color}, {value_align}, \"{final_fmt}\", {args});"
            ));
            // Approximate value width to place the trailing label.
            let offset = (value_fs as f64 * 0.6 * 6.0).round() as i64 + 10;
            ctx.push(format!(
                "        it.printf({x_val} + {offset}, {y_val}, id({label_font}), {color}, {label_align}, \"{title}\");"
            ));
        }

        if let Some(c) = &cond {
            ctx.push(format!("        {}", c.close()));
        }
        Ok(())
    }

    fn export_lvgl(&self, w: &Widget, _ctx: &LvglContext) -> Option<LvglWidget> {
        let local = w.prop_bool("is_local_sensor").unwrap_or(false);
        let entity = resolved(w.entity(), local);
        let entity2 = resolved(w.entity2(), local);
        let format = str_prop_or(w, "value_format", "label_value").to_string();
        let hide_unit = w.prop_bool("hide_unit").unwrap_or(false);
        let no_unit = format.ends_with("_no_unit");
        let mut unit = str_prop_or(w, "unit", "").trim().to_string();
        if unit.is_empty() && !hide_unit && !no_unit && !entity.is_empty() {
            unit = infer_unit(&entity).to_string();
        }

        let esc = |s: &str| s.replace('"', "\\\"").replace('%', "%%");
        let prec = precision(w);
        let is_text1 = is_text_entity(w, &entity);
        let is_text2 = !entity2.is_empty() && is_text_entity(w, &entity2);

        let var_of = |eid: &str, text: bool| {
            if local {
                format!("id({}).state", if eid.is_empty() { "battery_level" } else { eid })
            } else if text {
                format!("id({}).state.c_str()", make_safe_id(eid, "_txt"))
            } else {
                format!("id({}).state", make_safe_id(eid, ""))
            }
        };
        let v1 = var_of(&entity, is_text1);
        let v2 = if entity2.is_empty() { None } else { Some(var_of(&entity2, is_text2)) };

        let val_fmt1 = if is_text1 { "%s".to_string() } else { format!("%.{prec}f") };
        let val_fmt2 = if is_text2 { "%s".to_string() } else { format!("%.{prec}f") };
        let display_unit = if hide_unit || no_unit { String::new() } else { esc(&unit) };
        let prefix = esc(str_prop_or(w, "prefix", ""));
        let postfix = esc(str_prop_or(w, "postfix", ""));
        let sep = esc(str_prop_or(w, "separator", " ~ "));
        let title = esc(&effective_title(w, &entity, &format));

        let mut value_fmt = format!("{prefix}{val_fmt1}");
        if v2.is_some() {
            value_fmt.push_str(&sep);
            value_fmt.push_str(&val_fmt2);
        }
        if !display_unit.is_empty() {
            value_fmt.push(' ');
            value_fmt.push_str(&display_unit);
        }
        value_fmt.push_str(&postfix);

        let value_args = match &v2 {
            Some(v2) => format!("{v1}, {v2}"),
            None => v1.clone(),
        };
        let (fmt, args) = match format.as_str() {
            "label_only" => (title.clone(), String::new()),
            "label_value" | "label_value_no_unit" => {
                (format!("{title}: {value_fmt}"), value_args)
            }
            "value_label" => (format!("{value_fmt} {title}"), value_args),
            "label_newline_value" | "label_newline_value_no_unit" => {
                (format!("{title}\\n{value_fmt}"), value_args)
            }
            _ => (value_fmt.clone(), value_args),
        };

        let text = if entity.is_empty() && !local {
            format!("\"{title}\"")
        } else if !args.is_empty() {
            format!("!lambda |-\n  return str_sprintf(\"{fmt}\", {args}).c_str();")
        } else {
            format!("\"{fmt}\"")
        };

        let raw_align = {
            let a = str_prop_or(w, "text_align", "");
            if a.is_empty() { str_prop_or(w, "value_align", "TOP_LEFT") } else { a }
        };
        let text_align = if raw_align.contains("LEFT") {
            "LEFT"
        } else if raw_align.contains("RIGHT") {
            "RIGHT"
        } else {
            "CENTER"
        };

        let font_size = if format == "label_only" {
            int_prop_or(w, "label_font_size", 14)
        } else {
            int_prop_or(w, "value_font_size", 20)
        };

        let mut attrs = common_attrs(w);
        attrs.insert("text".into(), text.into());
        attrs.insert(
            "text_font".into(),
            lvgl_font(
                str_prop_or(w, "font_family", "Roboto"),
                int_prop_or(w, "font_weight", 400) as u32,
                font_size as u32,
                w.prop_bool("italic").unwrap_or(false),
            )
            .into(),
        );
        attrs.insert(
            "text_color".into(),
            convert_color(str_prop_or(w, "color", "")).into(),
        );
        attrs.insert("text_align".into(), text_align.into());
        let bg = w.prop_str("bg_color").unwrap_or("");
        if bg != "transparent" {
            attrs.insert("bg_color".into(), convert_color(bg).into());
        }
        attrs.insert("opa".into(), format_opacity(w.prop_i64("opa")).into());
        Some(LvglWidget::new("label", attrs))
    }

    /// Weather and text entities referenced by sensor_text widgets get
    /// homeassistant text sensors; numeric ones ride the shared
    /// safety-net pass instead.
    fn on_export_text_sensors(&self, ctx: &mut HookContext<'_>) {
        let mut weather_entities: IndexSet<String> = IndexSet::new();
        let mut text_entities: IndexSet<String> = IndexSet::new();

        for placed in ctx.widgets {
            let w = placed.widget;
            if w.kind != "sensor_text" {
                continue;
            }
            let explicit = w.prop_bool("is_text_sensor").unwrap_or(false);
            for entity in [w.entity(), w.entity2()] {
                if entity.is_empty() {
                    continue;
                }
                if entity.starts_with("weather.") {
                    weather_entities.insert(entity.to_string());
                } else if explicit || entity.starts_with("text_sensor.") {
                    text_entities.insert(entity.to_string());
                }
            }
        }

        let mut emit = |ctx: &mut HookContext<'_>, entities: &IndexSet<String>, header: &str| {
            let mut header_added = false;
            for entity in entities {
                let safe = make_safe_id(entity, "_txt");
                if ctx.seen_sensor_ids.contains(&safe)
                    || ctx.seen_text_entity_ids.contains(entity.as_str())
                {
                    continue;
                }
                if !header_added {
                    ctx.push(header.to_string());
                    header_added = true;
                }
                ctx.seen_sensor_ids.insert(safe.clone());
                ctx.seen_text_entity_ids.insert(entity.clone());
                ctx.push("- platform: homeassistant");
                ctx.push(format!("  id: {safe}"));
                ctx.push(format!("  entity_id: {entity}"));
                ctx.push("  internal: true");
            }
        };

        emit(
            ctx,
            &weather_entities,
            "# Weather Entity Sensors (Detected from Sensor Text)",
        );
        emit(ctx, &text_entities, "# Text Sensors (Detected from Sensor Text)");
    }

    fn on_export_numeric_sensors(&self, ctx: &mut HookContext<'_>) {
        if !ctx.is_lvgl {
            return;
        }
        let mut refreshes = Vec::new();
        for placed in ctx.widgets {
            let w = placed.widget;
            if w.kind != "sensor_text" || w.prop_bool("is_local_sensor").unwrap_or(false) {
                continue;
            }
            let explicit = w.prop_bool("is_text_sensor").unwrap_or(false);
            for entity in [w.entity(), w.entity2()] {
                if entity.is_empty()
                    || explicit
                    || entity.starts_with("weather.")
                    || entity.starts_with("text_sensor.")
                {
                    continue;
                }
                let eid = if entity.contains('.') {
                    entity.to_string()
                } else {
                    format!("sensor.{entity}")
                };
                refreshes.push((eid, format!("- lvgl.widget.refresh: {}", w.id)));
            }
        }
        for (eid, action) in refreshes {
            ctx.defer_trigger(&eid, action);
        }
    }
}
