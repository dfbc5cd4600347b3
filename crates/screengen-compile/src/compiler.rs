//! The generation pipeline: resolves the device profile, runs the
//! plugin hooks in section order, and assembles the final document.

use indexmap::IndexSet;
use regex::Regex;
use tracing::{info, warn};

use screengen_core::entity::{is_binary_entity, safe_id, with_domain};
use screengen_core::Project;
use screengen_emit::{comment_out_system_sections, inject_triggers, merge_sections, substitute_placeholders};
use screengen_widgets::context::PendingTriggers;
use screengen_widgets::{FontRegistry, HookContext, PlacedWidget, PluginRegistry};

use crate::package::{apply_package_overrides, PackageSource};
use crate::profiles::{builtin, from_custom, DeviceProfile};
use crate::{hardware, header, lambda, lvgl, scripts, CompileError};

/// Widget kinds whose bare entity ids default to the `sensor.` domain.
const NUMERIC_KINDS: [&str; 7] = [
    "progress_bar",
    "sensor_text",
    "graph",
    "battery_icon",
    "wifi_signal",
    "ondevice_temperature",
    "ondevice_humidity",
];

/// Domains the numeric safety net must not register numeric sensors for.
const NUMERIC_SKIP_DOMAINS: [&str; 6] = [
    "switch.",
    "light.",
    "fan.",
    "input_boolean.",
    "cover.",
    "lock.",
];

pub struct Compiler {
    registry: PluginRegistry,
    source: Box<dyn PackageSource>,
}

impl Compiler {
    pub fn new(source: Box<dyn PackageSource>) -> Self {
        Compiler {
            registry: PluginRegistry::with_builtins(),
            source,
        }
    }

    pub fn with_registry(source: Box<dyn PackageSource>, registry: PluginRegistry) -> Self {
        Compiler { registry, source }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Generate the full YAML document for a project.
    pub async fn generate(&self, project: &Project) -> Result<String, CompileError> {
        project.validate()?;
        let profile = resolve_profile(project)?;
        let display_id = profile.display_id();
        let is_lvgl = resolve_lvgl(&profile, project);
        info!(
            model = %profile.id,
            pages = project.pages.len(),
            lvgl = is_lvgl,
            "generating configuration"
        );

        // Pre-pass: plugins record the fonts and glyphs they will draw
        // with, before any section references them.
        let mut fonts = FontRegistry::new();
        for page in &project.pages {
            for w in page.widgets.iter().filter(|w| !w.hidden && w.kind != "group") {
                if let Some(plugin) = self.registry.get(&w.kind) {
                    plugin.collect_requirements(w, &mut fonts);
                }
            }
        }

        let mut lines: Vec<String> = header::instruction_header(&profile, project);

        let mut package_content: Option<String> = None;
        if let Some(path) = profile.hardware_package {
            match self.source.fetch(path).await {
                Ok(content) => package_content = Some(content),
                Err(e) => {
                    warn!(error = %e, package = path, "hardware package fetch failed");
                    lines.push(format!("# ERROR LOADING PROFILE: {e}"));
                }
            }
        }

        let placed: Vec<PlacedWidget<'_>> = project
            .pages
            .iter()
            .enumerate()
            .flat_map(|(page_index, page)| {
                page.widgets
                    .iter()
                    .filter(|w| !w.hidden)
                    .map(move |widget| PlacedWidget { page_index, widget })
            })
            .collect();

        let mut seen_entity_ids: IndexSet<String> = IndexSet::new();
        let mut seen_sensor_ids: IndexSet<String> = IndexSet::new();
        let mut seen_text_entity_ids: IndexSet<String> = IndexSet::new();
        let mut pending_triggers = PendingTriggers::new();

        macro_rules! hook {
            ($method:ident) => {{
                let mut ctx = HookContext {
                    lines: Vec::new(),
                    widgets: &placed,
                    is_lvgl,
                    has_touch: profile.features.touch,
                    seen_entity_ids: &mut seen_entity_ids,
                    seen_sensor_ids: &mut seen_sensor_ids,
                    seen_text_entity_ids: &mut seen_text_entity_ids,
                    pending_triggers: &mut pending_triggers,
                };
                self.registry.$method(&mut ctx);
                ctx.lines
            }};
        }

        // Globals: page state plus whatever plugins need persisted.
        let default_refresh = if project.refresh_interval > 0 {
            project.refresh_interval
        } else if profile.is_lcd() {
            60
        } else {
            600
        };
        let mut global_lines: Vec<String> = [
            "- id: display_page",
            "  type: int",
            "  restore_value: true",
            "  initial_value: '0'",
            "- id: page_refresh_default_s",
            "  type: int",
            "  restore_value: true",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        global_lines.push(format!("  initial_value: '{default_refresh}'"));
        global_lines.extend(
            [
                "- id: page_refresh_current_s",
                "  type: int",
                "  restore_value: false",
                "  initial_value: '60'",
                "- id: last_page_switch_time",
                "  type: uint32_t",
                "  restore_value: false",
                "  initial_value: '0'",
            ]
            .into_iter()
            .map(String::from),
        );
        global_lines.extend(hook!(on_export_globals));
        lines.push("globals:".into());
        lines.extend(global_lines.iter().map(|l| format!("  {l}")));

        let package_has_psram = package_content
            .as_deref()
            .is_some_and(|c| c.contains("psram:"));
        if !package_has_psram && profile.features.psram {
            lines.extend(hardware::psram_section(&profile));
        }

        if !profile.is_package_based() {
            lines.extend(
                [
                    "http_request:",
                    "  verify_ssl: false",
                    "  timeout: 20s",
                    "  buffer_size_rx: 4096",
                ]
                .into_iter()
                .map(String::from),
            );
            lines.extend(hardware::i2c_section(&profile));
            lines.extend(hardware::spi_section(&profile));
            lines.extend(hardware::output_section(&profile));
            lines.extend(hardware::rtttl_section(&profile));
        }
        if !lines.iter().any(|l| l.trim() == "time:") {
            lines.push("time:".into());
            lines.push("  - platform: homeassistant".into());
            lines.push("    id: ha_time".into());
            seen_sensor_ids.insert("ha_time".into());
        }

        // Onboard sensor ids are taken before any widget registers one.
        if profile.pins.battery_adc.is_some() {
            seen_sensor_ids.insert("battery_voltage".into());
            seen_sensor_ids.insert("battery_level".into());
        }
        if profile.features.sht4x {
            for id in ["sht4x_sensor", "sht4x_temperature", "sht4x_humidity"] {
                seen_sensor_ids.insert(id.into());
            }
        }
        if profile.features.shtc3 {
            for id in ["shtc3_sensor", "shtc3_temperature", "shtc3_humidity"] {
                seen_sensor_ids.insert(id.into());
            }
        }

        lines.extend(hardware::sensor_section(&profile));

        // Numeric sensors from plugins, then the safety net for entities
        // no plugin claimed.
        let numeric = hook!(on_export_numeric_sensors);
        let numeric = maybe_inject(numeric, &pending_triggers, is_lvgl, "on_value");
        if !numeric.is_empty() {
            ensure_section(&mut lines, "sensor:");
            push_indented(&mut lines, &numeric);
        }

        let mut numeric_extra: Vec<String> = Vec::new();
        for pw in &placed {
            let w = pw.widget;
            let mut entity = w.entity().to_string();
            if entity.is_empty() || w.prop_bool("is_local_sensor").unwrap_or(false) {
                continue;
            }
            if NUMERIC_KINDS.contains(&w.kind.as_str()) {
                entity = with_domain(&entity, "sensor");
            }
            if w.kind == "sensor_text" && w.prop_bool("is_text_sensor").unwrap_or(false) {
                continue;
            }
            if w.kind == "calendar" {
                continue;
            }
            let is_ha_sensor = entity.contains('.')
                && !entity.starts_with("weather.")
                && !entity.starts_with("text_sensor.")
                && !entity.starts_with("binary_sensor.");
            let is_binary_domain = NUMERIC_SKIP_DOMAINS.iter().any(|d| entity.starts_with(d));
            if is_ha_sensor && !is_binary_domain && !seen_entity_ids.contains(&entity) {
                let sid = safe_id(&entity);
                if !seen_sensor_ids.contains(&sid) {
                    seen_entity_ids.insert(entity.clone());
                    seen_sensor_ids.insert(sid.clone());
                    numeric_extra.push("- platform: homeassistant".into());
                    numeric_extra.push(format!("  id: {sid}"));
                    numeric_extra.push(format!("  entity_id: {entity}"));
                    numeric_extra.push("  internal: true".into());
                }
            }
        }
        if !numeric_extra.is_empty() {
            ensure_section(&mut lines, "sensor:");
            let merged = maybe_inject(numeric_extra, &pending_triggers, is_lvgl, "on_value");
            push_indented(&mut lines, &merged);
        }

        let text_sensors = hook!(on_export_text_sensors);
        let text_sensors = maybe_inject(text_sensors, &pending_triggers, is_lvgl, "on_value");
        if !text_sensors.is_empty() {
            lines.push("text_sensor:".into());
            push_indented(&mut lines, &text_sensors);
        }

        // Binary sensors: hardware buttons, then plugin-provided ones
        // (touch areas). Package profiles route the latter into the
        // package's touch placeholder instead of a fresh section.
        let mut binary_orig: Vec<String> = Vec::new();
        if !profile.is_package_based() {
            let hw = hardware::binary_sensor_section(&profile, project.pages.len(), display_id);
            if hw.first().map(|l| l.trim()) == Some("binary_sensor:") {
                binary_orig.extend(
                    hw[1..]
                        .iter()
                        .map(|l| l.strip_prefix("  ").unwrap_or(l).to_string()),
                );
            } else {
                binary_orig.extend(hw);
            }
        }
        let hook_binary = hook!(on_export_binary_sensors);
        let mut pending_touch: Vec<String> = Vec::new();
        if profile.is_package_based() {
            pending_touch = hook_binary;
        } else {
            binary_orig.extend(hook_binary);
        }
        let binary = maybe_inject(binary_orig, &pending_triggers, is_lvgl, "on_state");
        if !binary.is_empty() && !profile.is_package_based() {
            lines.push("binary_sensor:".into());
            push_indented(&mut lines, &binary);
        }

        // Safety net: binary entities referenced by conditions or linked
        // directly to widgets.
        let mut binary_extra: Vec<String> = Vec::new();
        for pw in &placed {
            let w = pw.widget;
            let cond = w.condition_entity.as_deref().unwrap_or("").trim();
            for ent in [cond, w.entity()] {
                if ent.is_empty() || !is_binary_entity(ent) || seen_entity_ids.contains(ent) {
                    continue;
                }
                let sid = safe_id(ent);
                if seen_sensor_ids.contains(&sid) {
                    continue;
                }
                seen_entity_ids.insert(ent.to_string());
                seen_sensor_ids.insert(sid.clone());
                binary_extra.push("- platform: homeassistant".into());
                binary_extra.push(format!("  id: {sid}"));
                binary_extra.push(format!("  entity_id: {ent}"));
                binary_extra.push("  internal: true".into());
            }
        }
        if !binary_extra.is_empty() {
            ensure_section(&mut lines, "binary_sensor:");
            let merged = maybe_inject(binary_extra, &pending_triggers, is_lvgl, "on_state");
            push_indented(&mut lines, &merged);
        }

        if !profile.is_package_based() {
            lines.extend(hardware::button_section(&profile, project.pages.len(), display_id));
        }

        lines.extend(hook!(on_export_components));

        // Lambda generation runs before font rendering so every font it
        // needs is registered first.
        let helper_lines = hook!(on_export_helpers);
        let lambda_body =
            lambda::generate_display_lambda(&profile, project, &helper_lines, &self.registry, &mut fonts);

        lines.extend(fonts.render(&project.glyphsets, project.extended_latin_glyphs));
        lines.extend(scripts::script_section(&profile, project));

        if is_lvgl {
            lines.extend(lvgl::lvgl_section(&profile, project, &self.registry));
        }

        if !profile.is_package_based() {
            lines.extend(hardware::display_section(&profile, project, is_lvgl));
            if !is_lvgl {
                splice_lambda(&mut lines, &lambda_body);
            }
            return Ok(finish(lines));
        }

        let Some(content) = package_content else {
            return Ok(finish(lines));
        };

        let lambda_insert = package_lambda_lines(&content, &lambda_body, is_lvgl);
        let content = substitute_placeholders(&content, &lambda_insert, &pending_touch);
        let content = apply_package_overrides(&content, &profile, project.orientation, is_lvgl);
        let sanitized = comment_out_system_sections(&content);
        let merged = merge_sections(&sanitized, &lines.join("\n"));
        Ok(finish(merged.lines().map(String::from).collect()))
    }
}

fn resolve_profile(project: &Project) -> Result<DeviceProfile, CompileError> {
    if project.device_model == "custom" {
        if let Some(ch) = &project.custom_hardware {
            return Ok(from_custom(ch));
        }
    }
    builtin(&project.device_model)
        .ok_or_else(|| CompileError::UnknownModel(project.device_model.clone()))
}

/// LVGL mode: profile feature, overridden by the project's explicit
/// rendering mode, else inferred from any visible `lvgl_` widget.
fn resolve_lvgl(profile: &DeviceProfile, project: &Project) -> bool {
    use screengen_core::RenderingMode;
    let mut is_lvgl = profile.features.lvgl;
    match project.rendering_mode {
        RenderingMode::Direct => return false,
        RenderingMode::Lvgl => return true,
        RenderingMode::Auto => {}
    }
    if !is_lvgl {
        is_lvgl = project.pages.iter().any(|p| {
            p.widgets
                .iter()
                .any(|w| !w.hidden && w.kind.starts_with("lvgl_"))
        });
    }
    is_lvgl
}

fn maybe_inject(
    lines: Vec<String>,
    pending: &PendingTriggers,
    is_lvgl: bool,
    trigger: &str,
) -> Vec<String> {
    if is_lvgl {
        inject_triggers(&lines, pending, trigger)
    } else {
        lines
    }
}

fn ensure_section(lines: &mut Vec<String>, header: &str) {
    if !lines.iter().any(|l| l == header) {
        lines.push(header.to_string());
    }
}

/// Indent hook output under a section header. Hook lines may carry
/// embedded newlines; every physical line gets the two-space prefix.
fn push_indented(lines: &mut Vec<String>, content: &[String]) {
    for entry in content {
        for sub in entry.split('\n') {
            lines.push(format!("  {sub}"));
        }
    }
}

/// Insert the drawing lambda right after the emitted `display:` entry.
fn splice_lambda(lines: &mut Vec<String>, lambda_body: &[String]) {
    let Some(i) = lines.iter().position(|l| l.trim() == "display:") else {
        return;
    };
    let mut j = i + 1;
    while j < lines.len() && (lines[j].starts_with("  ") || lines[j].trim().is_empty()) {
        j += 1;
    }
    let mut splice = vec!["    lambda: |-".to_string()];
    splice.extend(lambda_body.iter().map(|l| {
        if l.trim().is_empty() {
            String::new()
        } else {
            format!("      {l}")
        }
    }));
    lines.splice(j..j, splice);
}

/// Lambda lines destined for a package's placeholder. Adds the
/// `lambda: |-` header unless the package already carries one directly
/// above the placeholder; empty in LVGL mode so the placeholder just
/// disappears.
fn package_lambda_lines(package: &str, lambda_body: &[String], is_lvgl: bool) -> Vec<String> {
    if is_lvgl {
        return Vec::new();
    }
    let has_header = Regex::new(r"lambda:\s*\|-\s*\r?\n\s*# __LAMBDA_PLACEHOLDER__")
        .map(|re| re.is_match(package))
        .unwrap_or(false);
    let mut out = Vec::new();
    if !has_header {
        out.push("lambda: |-".to_string());
    }
    out.extend(lambda_body.iter().map(|l| {
        if l.trim().is_empty() {
            String::new()
        } else {
            format!("  {l}")
        }
    }));
    out
}

fn finish(lines: Vec<String>) -> String {
    let mut out = lines
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    while out.ends_with('\n') {
        out.pop();
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_lands_after_display_block() {
        let mut lines = vec![
            "display:".to_string(),
            "  - platform: waveshare_epaper".to_string(),
            "    id: epaper_display".to_string(),
            String::new(),
        ];
        splice_lambda(&mut lines, &["it.fill(COLOR_WHITE);".to_string()]);
        assert_eq!(lines[4], "    lambda: |-");
        assert_eq!(lines[5], "      it.fill(COLOR_WHITE);");
    }

    #[test]
    fn package_lambda_respects_existing_header() {
        let with_header = "    lambda: |-\n      # __LAMBDA_PLACEHOLDER__\n";
        let body = vec!["it.fill(COLOR_WHITE);".to_string()];
        let out = package_lambda_lines(with_header, &body, false);
        assert_eq!(out, vec!["  it.fill(COLOR_WHITE);"]);

        let without = "    # __LAMBDA_PLACEHOLDER__\n";
        let out = package_lambda_lines(without, &body, false);
        assert_eq!(out[0], "lambda: |-");

        assert!(package_lambda_lines(with_header, &body, true).is_empty());
    }

    #[test]
    fn finish_normalizes_trailing_whitespace() {
        let out = finish(vec!["a:  ".to_string(), String::new(), "b:".to_string()]);
        assert_eq!(out, "a:\n\nb:\n");
    }
}
