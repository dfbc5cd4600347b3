//! Hardware YAML section generators, driven by a [`DeviceProfile`].
//! Each function returns the lines of one top-level section (or
//! nothing when the profile lacks the hardware).

use screengen_core::{Orientation, Project};

use crate::profiles::{DeviceProfile, Pin};

/// e-paper models that need a periodic full refresh to clear ghosting.
const MODELS_WITH_FULL_UPDATE: [&str; 19] = [
    "1.54in",
    "1.54inv2",
    "2.13in",
    "2.13in-ttgo",
    "2.13in-ttgo-b1",
    "2.13in-ttgo-b73",
    "2.13in-ttgo-b74",
    "2.13in-ttgo-dke",
    "2.13inv2",
    "2.13inv3",
    "2.90in",
    "2.90in-dke",
    "2.90inv2",
    "2.90inv2-r2",
    "7.50inv2p",
    "gdew029t5",
    "gdey029t94",
    "gdey042t81",
    "gdey0583t81",
];

fn push_pin(lines: &mut Vec<String>, key: &str, pin: &Pin, indent: &str) {
    match pin {
        Pin::Simple(n) => lines.push(format!("{indent}{key}: {n}")),
        Pin::Detailed {
            number,
            mode,
            inverted,
            ignore_strapping_warning,
        } => {
            lines.push(format!("{indent}{key}:"));
            lines.push(format!("{indent}  number: {number}"));
            if let Some(mode) = mode {
                lines.push(format!("{indent}  mode: {mode}"));
            }
            if *ignore_strapping_warning {
                lines.push(format!("{indent}  ignore_strapping_warning: true"));
            }
            if let Some(inv) = inverted {
                lines.push(format!("{indent}  inverted: {inv}"));
            }
        }
    }
}

pub fn psram_section(profile: &DeviceProfile) -> Vec<String> {
    if !profile.features.psram {
        return Vec::new();
    }
    let mut lines = vec!["psram:".to_string()];
    if let Some(mode) = profile.psram_mode {
        lines.push(format!("  mode: {mode}"));
        lines.push("  speed: 80MHz".to_string());
    }
    lines.push(String::new());
    lines
}

pub fn i2c_section(profile: &DeviceProfile) -> Vec<String> {
    let (sda, scl) = match &profile.pins.i2c {
        Some(i2c) => (i2c.sda.to_string(), i2c.scl.to_string()),
        None => {
            match (
                profile.custom_pins.get("sda"),
                profile.custom_pins.get("scl"),
            ) {
                (Some(sda), Some(scl)) => (sda.clone(), scl.clone()),
                _ => return Vec::new(),
            }
        }
    };
    let mut lines = vec![
        "i2c:".to_string(),
        format!("  - sda: {sda}"),
        format!("    scl: {scl}"),
        format!("    scan: {}", profile.i2c_scan),
        "    id: bus_a".to_string(),
    ];
    if let Some(freq) = profile.i2c_frequency {
        lines.push(format!("    frequency: {freq}"));
    }
    lines.push(String::new());
    lines
}

pub fn spi_section(profile: &DeviceProfile) -> Vec<String> {
    let (clk, mosi) = match &profile.pins.spi {
        Some(spi) => (spi.clk.to_string(), spi.mosi.to_string()),
        None => {
            match (
                profile.custom_pins.get("clk"),
                profile.custom_pins.get("mosi"),
            ) {
                (Some(clk), Some(mosi)) => (clk.clone(), mosi.clone()),
                _ => return Vec::new(),
            }
        }
    };
    vec![
        "spi:".to_string(),
        "  - id: spi_bus".to_string(),
        format!("    clk_pin: {clk}"),
        format!("    mosi_pin: {mosi}"),
        String::new(),
    ]
}

/// `output:` entries for the battery-enable and buzzer pins.
pub fn output_section(profile: &DeviceProfile) -> Vec<String> {
    let pins = &profile.pins;
    if pins.battery_enable.is_none() && pins.buzzer.is_none() {
        return Vec::new();
    }
    let mut lines = vec!["output:".to_string()];
    if let Some(enable) = &pins.battery_enable {
        lines.push("  - platform: gpio".to_string());
        push_pin(&mut lines, "pin", enable, "    ");
        lines.push("    id: bsp_battery_enable".to_string());
    }
    if let Some(buzzer) = pins.buzzer {
        if pins.battery_enable.is_some() {
            lines.push(String::new());
        }
        lines.push("  - platform: ledc".to_string());
        lines.push(format!("    pin: {buzzer}"));
        lines.push("    id: buzzer_output".to_string());
    }
    lines.push(String::new());
    lines
}

pub fn rtttl_section(profile: &DeviceProfile) -> Vec<String> {
    if !profile.features.buzzer {
        return Vec::new();
    }
    vec![
        "rtttl:".to_string(),
        "  id: device_buzzer".to_string(),
        "  output: buzzer_output".to_string(),
        String::new(),
    ]
}

/// Battery ADC, onboard temperature/humidity sensors, and the battery
/// percentage template.
pub fn sensor_section(profile: &DeviceProfile) -> Vec<String> {
    let pins = &profile.pins;
    let has_battery = pins.battery_adc.is_some();
    if !has_battery && !profile.features.sht4x && !profile.features.shtc3 {
        return Vec::new();
    }

    let mut lines = vec!["sensor:".to_string()];

    if let (Some(adc), Some(battery)) = (pins.battery_adc, &profile.battery) {
        lines.push("  - platform: adc".to_string());
        lines.push(format!("    pin: {adc}"));
        lines.push("    name: \"Battery Voltage\"".to_string());
        lines.push("    unit_of_measurement: \"V\"".to_string());
        lines.push("    device_class: voltage".to_string());
        lines.push("    state_class: measurement".to_string());
        lines.push("    id: battery_voltage".to_string());
        lines.push("    update_interval: 60s".to_string());
        lines.push(format!("    attenuation: {}", battery.attenuation));
        lines.push("    filters:".to_string());
        lines.push(format!("      - multiply: {}", battery.multiplier));
    }

    if profile.features.sht4x {
        lines.push("  - platform: sht4x".to_string());
        lines.push("    id: sht4x_sensor".to_string());
        lines.push("    temperature:".to_string());
        lines.push("      name: \"Temperature\"".to_string());
        lines.push("      id: sht4x_temperature".to_string());
        lines.push("    humidity:".to_string());
        lines.push("      name: \"Humidity\"".to_string());
        lines.push("      id: sht4x_humidity".to_string());
        lines.push("    address: 0x44".to_string());
        lines.push("    update_interval: 60s".to_string());
    }

    if profile.features.shtc3 {
        lines.push("  - platform: shtcx".to_string());
        lines.push("    id: shtc3_sensor".to_string());
        lines.push("    i2c_id: bus_a".to_string());
        lines.push("    address: 0x70".to_string());
        lines.push("    temperature:".to_string());
        lines.push("      name: \"Temperature\"".to_string());
        lines.push("      id: shtc3_temperature".to_string());
        lines.push("    humidity:".to_string());
        lines.push("      name: \"Humidity\"".to_string());
        lines.push("      id: shtc3_humidity".to_string());
        lines.push("    update_interval: 60s".to_string());
    }

    if let (Some(_), Some(battery)) = (pins.battery_adc, &profile.battery) {
        let min_v = battery.calibration_min;
        let max_v = battery.calibration_max;
        lines.push(String::new());
        lines.push("  - platform: template".to_string());
        lines.push("    name: \"Battery Level\"".to_string());
        lines.push("    id: battery_level".to_string());
        lines.push("    unit_of_measurement: \"%\"".to_string());
        lines.push("    icon: \"mdi:battery\"".to_string());
        lines.push("    device_class: battery".to_string());
        lines.push("    state_class: measurement".to_string());
        lines.push("    lambda: |-".to_string());
        lines.push(format!(
            "      if (id(battery_voltage).state > {max_v}) return 100;"
        ));
        lines.push(format!(
            "      if (id(battery_voltage).state < {min_v}) return 0;"
        ));
        lines.push(format!(
            "      return (id(battery_voltage).state - {min_v}) / ({max_v} - {min_v}) * 100.0;"
        ));
    }

    lines.push(String::new());
    lines
}

fn button_sensor(
    lines: &mut Vec<String>,
    pin: &Pin,
    name: &str,
    id: &str,
    actions: &[String],
) {
    lines.push("  - platform: gpio".to_string());
    match pin {
        Pin::Simple(n) => {
            lines.push("    pin:".to_string());
            lines.push(format!("      number: {n}"));
            lines.push("      mode: INPUT_PULLUP".to_string());
            lines.push("      inverted: true".to_string());
        }
        Pin::Detailed {
            number,
            mode,
            inverted,
            ..
        } => {
            lines.push("    pin:".to_string());
            lines.push(format!("      number: {number}"));
            lines.push(format!("      mode: {}", mode.unwrap_or("INPUT_PULLUP")));
            lines.push(format!("      inverted: {}", inverted.unwrap_or(true)));
        }
    }
    lines.push(format!("    name: \"{name}\""));
    lines.push(format!("    id: {id}"));
    lines.push("    on_press:".to_string());
    lines.push("      then:".to_string());
    for action in actions {
        lines.push(format!("        {action}"));
    }
}

/// Physical page-navigation buttons. Touch-area sensors are emitted by
/// the touch plugin, not here.
pub fn binary_sensor_section(
    profile: &DeviceProfile,
    num_pages: usize,
    display_id: &str,
) -> Vec<String> {
    if !profile.features.buttons || !profile.pins.buttons.any() {
        return Vec::new();
    }
    let last = num_pages.saturating_sub(1);
    let mut lines = vec!["binary_sensor:".to_string()];
    let buttons = &profile.pins.buttons;

    if let Some(pin) = &buttons.left {
        button_sensor(
            &mut lines,
            pin,
            "Left Button",
            "button_left",
            &[
                "- script.execute:".to_string(),
                "    id: change_page_to".to_string(),
                format!(
                    "    target_page: !lambda 'return id(display_page) > 0 ? id(display_page) - 1 : {last};'"
                ),
            ],
        );
    }
    if let Some(pin) = &buttons.right {
        button_sensor(
            &mut lines,
            pin,
            "Right Button",
            "button_right",
            &[
                "- script.execute:".to_string(),
                "    id: change_page_to".to_string(),
                format!(
                    "    target_page: !lambda 'return id(display_page) < {last} ? id(display_page) + 1 : 0;'"
                ),
            ],
        );
    }
    if let Some(pin) = &buttons.refresh {
        button_sensor(
            &mut lines,
            pin,
            "Refresh Button",
            "button_refresh",
            &[format!("- component.update: {display_id}")],
        );
    }
    if let Some(pin) = &buttons.home {
        button_sensor(
            &mut lines,
            pin,
            "Home Button",
            "button_home",
            &[
                "- script.execute:".to_string(),
                "    id: change_page_to".to_string(),
                "    target_page: 0".to_string(),
                "- script.execute: manage_run_and_sleep".to_string(),
            ],
        );
    }
    lines
}

/// Template buttons exposed to the frontend: page navigation, manual
/// refresh, per-page jumps and (with a buzzer) a few sounds.
pub fn button_section(
    profile: &DeviceProfile,
    num_pages: usize,
    display_id: &str,
) -> Vec<String> {
    let mut lines = vec!["button:".to_string()];
    lines.push("  - platform: template".to_string());
    lines.push("    name: \"Next Page\"".to_string());
    lines.push("    on_press:".to_string());
    lines.push("      then:".to_string());
    lines.push("        - script.execute:".to_string());
    lines.push("            id: change_page_to".to_string());
    lines.push("            target_page: !lambda 'return id(display_page) + 1;'".to_string());

    lines.push("  - platform: template".to_string());
    lines.push("    name: \"Previous Page\"".to_string());
    lines.push("    on_press:".to_string());
    lines.push("      then:".to_string());
    lines.push("        - script.execute:".to_string());
    lines.push("            id: change_page_to".to_string());
    lines.push("            target_page: !lambda 'return id(display_page) - 1;'".to_string());

    lines.push("  - platform: template".to_string());
    lines.push("    name: \"Refresh Display\"".to_string());
    lines.push("    on_press:".to_string());
    lines.push("      then:".to_string());
    lines.push(format!("        - component.update: {display_id}"));

    for i in 0..num_pages {
        lines.push("  - platform: template".to_string());
        lines.push(format!("    name: \"Go to Page {}\"", i + 1));
        lines.push("    on_press:".to_string());
        lines.push("      then:".to_string());
        lines.push("        - script.execute:".to_string());
        lines.push("            id: change_page_to".to_string());
        lines.push(format!("            target_page: {i}"));
    }

    if profile.features.buzzer {
        lines.push("  # Buzzer Sounds".to_string());
        lines.push("  - platform: template".to_string());
        lines.push("    name: \"Play Beep Short\"".to_string());
        lines.push("    icon: \"mdi:bell-ring\"".to_string());
        lines.push("    on_press:".to_string());
        lines.push("      - rtttl.play: \"beep:d=32,o=5,b=200:16e6\"".to_string());
        lines.push(String::new());
        lines.push("  - platform: template".to_string());
        lines.push("    name: \"Play Beep OK\"".to_string());
        lines.push("    icon: \"mdi:check-circle-outline\"".to_string());
        lines.push("    on_press:".to_string());
        lines.push("      - rtttl.play: \"ok:d=16,o=5,b=200:e6\"".to_string());
        lines.push(String::new());
        lines.push("  - platform: template".to_string());
        lines.push("    name: \"Play Beep Error\"".to_string());
        lines.push("    icon: \"mdi:alert-circle-outline\"".to_string());
        lines.push("    on_press:".to_string());
        lines.push("      - rtttl.play: \"error:d=16,o=5,b=200:c6\"".to_string());
    }

    lines.push(String::new());
    lines
}

/// Effective display rotation for the requested orientation, given the
/// panel's native aspect.
pub fn display_rotation(profile: &DeviceProfile, orientation: Orientation) -> u32 {
    let native_portrait = profile.resolution.height > profile.resolution.width;
    let wants_portrait = orientation == Orientation::Portrait;
    if native_portrait {
        if wants_portrait {
            0
        } else {
            90
        }
    } else if wants_portrait {
        90
    } else {
        0
    }
}

fn custom_pin<'a>(profile: &'a DeviceProfile, role: &str) -> Option<&'a str> {
    profile.custom_pins.get(role).map(String::as_str)
}

/// The `display:` section for non-package profiles. The drawing lambda
/// is spliced in afterwards by the compiler.
pub fn display_section(profile: &DeviceProfile, project: &Project, is_lvgl: bool) -> Vec<String> {
    let rotation = display_rotation(profile, project.orientation);
    let is_lcd = profile.features.lcd;

    let mut lines = vec!["display:".to_string()];
    lines.push(format!("  - platform: {}", profile.display_platform));
    lines.push(format!("    id: {}", profile.display_id()));
    if is_lvgl {
        lines.push("    auto_clear_enabled: false".to_string());
    }

    let d = &profile.pins.display;
    let roles: [(&str, &Option<Pin>, &str); 4] = [
        ("cs_pin", &d.cs, "cs"),
        ("dc_pin", &d.dc, "dc"),
        ("reset_pin", &d.reset, "reset"),
        ("busy_pin", &d.busy, "busy"),
    ];
    for (key, pin, role) in roles {
        if let Some(pin) = pin {
            push_pin(&mut lines, key, pin, "    ");
        } else if let Some(custom) = custom_pin(profile, role) {
            lines.push(format!("    {key}: {custom}"));
        }
    }

    if profile.display_platform == "waveshare_epaper" {
        if let Some(model) = &profile.display_model {
            lines.push(format!("    model: \"{model}\""));
        }
    } else if let Some(model) = &profile.display_model {
        lines.push(format!("    model: \"{model}\""));
    }

    lines.push(format!("    rotation: {rotation}"));

    let refresh = if project.refresh_interval > 0 {
        project.refresh_interval
    } else {
        1
    };
    if is_lcd {
        lines.push(format!("    update_interval: {refresh}s"));
    } else {
        lines.push("    update_interval: never".to_string());
    }

    if let Some(model) = &profile.display_model {
        if MODELS_WITH_FULL_UPDATE.contains(&model.as_str()) {
            lines.push("    full_update_every: 30".to_string());
        }
    }
    lines.push(String::new());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::builtin;

    fn project(model: &str, orientation: &str) -> Project {
        serde_json::from_value(serde_json::json!({
            "device_model": model,
            "orientation": orientation,
            "pages": [{ "name": "Home", "widgets": [] }]
        }))
        .unwrap()
    }

    #[test]
    fn display_section_for_reterminal() {
        let profile = builtin("reterminal_e1001").unwrap();
        let lines = display_section(&profile, &project("reterminal_e1001", "landscape"), false);
        let text = lines.join("\n");
        assert!(text.contains("- platform: waveshare_epaper"));
        assert!(text.contains("id: epaper_display"));
        assert!(text.contains("cs_pin: GPIO10"));
        assert!(text.contains("busy_pin:\n      number: GPIO13\n      inverted: true"));
        assert!(text.contains("model: \"7.50inv2p\""));
        assert!(text.contains("rotation: 0"));
        assert!(text.contains("update_interval: never"));
        assert!(text.contains("full_update_every: 30"));
    }

    #[test]
    fn portrait_rotates_landscape_native_panels() {
        let profile = builtin("trmnl").unwrap();
        assert_eq!(display_rotation(&profile, Orientation::Portrait), 90);
        assert_eq!(display_rotation(&profile, Orientation::Landscape), 0);
    }

    #[test]
    fn battery_sensor_and_level_template() {
        let profile = builtin("trmnl").unwrap();
        let lines = sensor_section(&profile);
        let text = lines.join("\n");
        assert!(text.contains("- platform: adc"));
        assert!(text.contains("pin: GPIO0"));
        assert!(text.contains("attenuation: 12db"));
        assert!(text.contains("- multiply: 2"));
        assert!(text.contains("id: battery_level"));
        assert!(text.contains("if (id(battery_voltage).state > 4.15) return 100;"));
    }

    #[test]
    fn coreink_buttons_use_plain_input_mode() {
        let profile = builtin("m5stack_coreink").unwrap();
        let lines = binary_sensor_section(&profile, 3, "epaper_display");
        let text = lines.join("\n");
        assert!(text.contains("number: GPIO39\n      mode: INPUT\n      inverted: true"));
        assert!(text.contains("target_page: !lambda 'return id(display_page) > 0 ? id(display_page) - 1 : 2;'"));
        assert!(text.contains("id: button_refresh"));
        assert!(!text.contains("button_home"));
    }

    #[test]
    fn no_buttons_no_binary_section() {
        let profile = builtin("trmnl").unwrap();
        assert!(binary_sensor_section(&profile, 2, "epaper_display").is_empty());
    }

    #[test]
    fn buzzer_gets_outputs_and_sounds() {
        let profile = builtin("reterminal_e1001").unwrap();
        let output = output_section(&profile).join("\n");
        assert!(output.contains("id: bsp_battery_enable"));
        assert!(output.contains("- platform: ledc"));
        assert!(output.contains("id: buzzer_output"));
        let rtttl = rtttl_section(&profile).join("\n");
        assert!(rtttl.contains("output: buzzer_output"));
        let buttons = button_section(&profile, 2, "epaper_display").join("\n");
        assert!(buttons.contains("rtttl.play: \"beep:d=32,o=5,b=200:16e6\""));
        assert!(buttons.contains("name: \"Go to Page 2\""));
    }

    #[test]
    fn photopainter_i2c_config() {
        let profile = builtin("esp32_s3_photopainter").unwrap();
        let text = i2c_section(&profile).join("\n");
        assert!(text.contains("- sda: GPIO47"));
        assert!(text.contains("scan: false"));
        assert!(text.contains("frequency: 10kHz"));
    }
}
