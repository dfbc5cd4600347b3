//! Comment header placed at the top of every generated configuration:
//! a device summary, setup instructions, and the project settings so a
//! round-trip import can recover them.

use screengen_core::{Orientation, Project, RenderingMode};

use crate::profiles::DeviceProfile;

const BANNER: &str =
    "# =============================================================================";

pub fn instruction_header(profile: &DeviceProfile, project: &Project) -> Vec<String> {
    let mut lines = vec![BANNER.to_string()];
    lines.push(format!("# {} - Generated ESPHome Configuration", profile.name));
    lines.push(BANNER.to_string());
    lines.push("#".to_string());

    let res = &profile.resolution;
    if let Some(model) = &profile.display_model {
        lines.push(format!(
            "# Display: {} ({}) {}x{}",
            model, profile.display_platform, res.width, res.height
        ));
    } else {
        lines.push(format!(
            "# Display: {} {}x{}",
            profile.display_platform, res.width, res.height
        ));
    }
    if profile.pins.battery_adc.is_some() {
        lines.push("# Battery: voltage monitoring enabled".to_string());
    }
    if profile.features.buttons {
        lines.push("# Buttons: physical page navigation".to_string());
    }
    if profile.features.buzzer {
        lines.push("# Buzzer: RTTTL sound support".to_string());
    }
    lines.push("#".to_string());
    lines.push("# SETUP INSTRUCTIONS".to_string());
    lines.push("#".to_string());
    lines.push("# STEP 1: Copy materialdesignicons-webfont.ttf into".to_string());
    lines.push("#         /config/esphome/fonts/ on your Home Assistant host.".to_string());
    lines.push("#".to_string());
    lines.push(format!(
        "# STEP 2: Create a new ESPHome device for the {} chip.",
        profile.chip
    ));
    lines.push("#".to_string());
    lines.push("# STEP 3: Keep the generated on_boot hook so the first render".to_string());
    lines.push("#         happens right after the device connects:".to_string());
    lines.push("#".to_string());
    lines.push("#   esphome:".to_string());
    lines.push("#     on_boot:".to_string());
    lines.push("#       priority: 600".to_string());
    lines.push("#       then:".to_string());
    if profile.pins.battery_enable.is_some() {
        lines.push("#         - output.turn_on: bsp_battery_enable".to_string());
    }
    lines.push("#         - delay: 2s".to_string());
    lines.push(format!("#         - component.update: {}", profile.display_id()));
    lines.push("#         - script.execute: manage_run_and_sleep".to_string());
    lines.push("#".to_string());
    lines.push("# STEP 4: Paste everything below after the `captive_portal:` line".to_string());
    lines.push("#         of your device configuration.".to_string());
    lines.push("#".to_string());
    lines.push(BANNER.to_string());
    lines.push(String::new());

    lines.push("# Device Settings".to_string());
    lines.push(format!(
        "# Orientation: {}",
        match project.orientation {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        }
    ));
    lines.push(format!(
        "# Dark Mode: {}",
        if project.dark_mode { "on" } else { "off" }
    ));
    lines.push(format!("# Refresh Interval: {}s", project.refresh_interval));
    lines.push(format!(
        "# Rendering Mode: {}",
        match project.rendering_mode {
            RenderingMode::Auto => "auto",
            RenderingMode::Direct => "direct",
            RenderingMode::Lvgl => "lvgl",
        }
    ));
    lines.push(String::new());
    lines
}
