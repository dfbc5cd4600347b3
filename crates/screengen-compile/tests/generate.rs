//! End-to-end generation over the builtin profiles, including the
//! package-based composition path.

use screengen_compile::{Compiler, FsPackageSource};
use screengen_core::Project;
use tempfile::TempDir;

fn compiler_with_empty_root() -> (Compiler, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Compiler::new(Box::new(FsPackageSource::new(dir.path())));
    (compiler, dir)
}

fn project(json: serde_json::Value) -> Project {
    serde_json::from_value(json).unwrap()
}

fn trmnl_with(widgets: serde_json::Value) -> Project {
    project(serde_json::json!({
        "device_model": "trmnl",
        "pages": [{ "name": "Home", "widgets": widgets }]
    }))
}

const TOUCH_LCD_PACKAGE: &str = "\
esp32:
  board: esp32-s3-devkitc-1

wifi:
  ssid: !secret wifi_ssid

display:
  - platform: rpi_dpi_rgb
    id: my_display
    auto_clear_enabled: true
    rotation: 0
    lambda: |-
      # __LAMBDA_PLACEHOLDER__

touchscreen:
  - platform: gt911
    id: my_touchscreen

binary_sensor:
  # __TOUCH_SENSORS_PLACEHOLDER__
";

fn write_package(dir: &TempDir) {
    let hw = dir.path().join("hardware");
    std::fs::create_dir_all(&hw).unwrap();
    std::fs::write(hw.join("waveshare-esp32-s3-touch-lcd-7.yaml"), TOUCH_LCD_PACKAGE).unwrap();
}

#[tokio::test]
async fn generation_is_deterministic() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = trmnl_with(serde_json::json!([
        { "id": "w1", "type": "sensor_text", "x": 10, "y": 10, "width": 200, "height": 40,
          "entity_id": "sensor.temp", "title": "Temp" },
        { "id": "w2", "type": "icon", "x": 10, "y": 60, "width": 48, "height": 48,
          "props": { "icon": "thermometer", "size": 48 } }
    ]));
    let a = compiler.generate(&p).await.unwrap();
    let b = compiler.generate(&p).await.unwrap();
    assert_eq!(a, b);
    assert!(a.ends_with('\n'));
}

#[tokio::test]
async fn direct_mode_document_structure() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = trmnl_with(serde_json::json!([
        { "id": "w1", "type": "text", "x": 0, "y": 0, "width": 100, "height": 20,
          "props": { "text": "Hello" } }
    ]));
    let out = compiler.generate(&p).await.unwrap();

    let globals = out.find("globals:").unwrap();
    let display = out.find("display:").unwrap();
    assert!(globals < display);
    assert!(out.contains("  - id: display_page"));
    assert!(out.contains("http_request:"));
    assert!(out.contains("time:\n  - platform: homeassistant\n    id: ha_time"));
    assert!(out.contains("id: battery_voltage"));
    assert!(out.contains("script:"));
    assert!(out.contains("  - id: manage_run_and_sleep"));
    assert!(out.contains("    lambda: |-"));
    assert!(out.contains("      const auto COLOR_WHITE = Color(0, 0, 0); // Inverted for e-ink"));
    assert!(out.contains("Hello"));
    assert!(!out.contains("lvgl:"));
    // Lambda body sits under the display entry.
    assert!(display < out.find("    lambda: |-").unwrap());
}

#[tokio::test]
async fn shared_entity_registers_once_across_pages() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = project(serde_json::json!({
        "device_model": "trmnl",
        "pages": [
            { "name": "A", "widgets": [
                { "id": "a1", "type": "sensor_text", "x": 0, "y": 0, "width": 100, "height": 30,
                  "entity_id": "sensor.temp" }
            ]},
            { "name": "B", "widgets": [
                { "id": "b1", "type": "sensor_text", "x": 0, "y": 0, "width": 100, "height": 30,
                  "entity_id": "sensor.temp" }
            ]}
        ]
    }));
    let out = compiler.generate(&p).await.unwrap();
    assert_eq!(out.matches("entity_id: sensor.temp").count(), 1);
    assert!(out.contains("id: sensor_temp"));
    assert!(out.contains("internal: true"));
}

#[tokio::test]
async fn bare_entity_gets_sensor_domain_prefix() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = trmnl_with(serde_json::json!([
        { "id": "p1", "type": "progress_bar", "x": 0, "y": 0, "width": 200, "height": 20,
          "entity_id": "kitchen_temp" }
    ]));
    let out = compiler.generate(&p).await.unwrap();
    assert!(out.contains("entity_id: sensor.kitchen_temp"));
}

#[tokio::test]
async fn condition_entities_become_binary_sensors() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = trmnl_with(serde_json::json!([
        { "id": "w1", "type": "text", "x": 0, "y": 0, "width": 100, "height": 20,
          "condition_entity": "binary_sensor.front_door",
          "condition_operator": "==", "condition_state": "on",
          "props": { "text": "Open" } }
    ]));
    let out = compiler.generate(&p).await.unwrap();
    assert!(out.contains("binary_sensor:"));
    assert!(out.contains("entity_id: binary_sensor.front_door"));
    assert!(out.contains("id: binary_sensor_front_door"));
}

#[tokio::test]
async fn hidden_widgets_leave_no_trace() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = trmnl_with(serde_json::json!([
        { "id": "w1", "type": "sensor_text", "x": 0, "y": 0, "width": 100, "height": 30,
          "entity_id": "sensor.secret_reading", "hidden": true }
    ]));
    let out = compiler.generate(&p).await.unwrap();
    assert!(!out.contains("secret_reading"));
}

#[tokio::test]
async fn unknown_widget_degrades_without_losing_neighbors() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = trmnl_with(serde_json::json!([
        { "id": "w1", "type": "hologram", "x": 0, "y": 0, "width": 10, "height": 10 },
        { "id": "w2", "type": "text", "x": 0, "y": 20, "width": 100, "height": 20,
          "props": { "text": "still here" } }
    ]));
    let out = compiler.generate(&p).await.unwrap();
    assert!(out.contains("// widget:hologram id:w1 status:unsupported"));
    assert!(out.contains("still here"));
}

#[tokio::test]
async fn buttons_and_buzzer_sections_for_reterminal() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = project(serde_json::json!({
        "device_model": "reterminal_e1001",
        "pages": [
            { "name": "A", "widgets": [] },
            { "name": "B", "refresh_time": 300, "widgets": [] }
        ]
    }));
    let out = compiler.generate(&p).await.unwrap();
    assert!(out.contains("psram:"));
    assert!(out.contains("rtttl:"));
    assert!(out.contains("id: button_left"));
    assert!(out.contains("name: \"Go to Page 2\""));
    assert!(out.contains("case 1: interval = 300; break;"));
    assert!(out.contains("- platform: sht4x"));
}

#[tokio::test]
async fn package_profile_merges_and_substitutes() {
    let dir = tempfile::tempdir().unwrap();
    write_package(&dir);
    let compiler = Compiler::new(Box::new(FsPackageSource::new(dir.path())));
    let p = project(serde_json::json!({
        "device_model": "waveshare_esp32_s3_touch_lcd_7",
        "rendering_mode": "direct",
        "orientation": "portrait",
        "pages": [{ "name": "Main", "widgets": [
            { "id": "t1", "type": "text", "x": 0, "y": 0, "width": 100, "height": 20,
              "props": { "text": "LCD" } }
        ]}]
    }));
    let out = compiler.generate(&p).await.unwrap();

    assert!(!out.contains("__LAMBDA_PLACEHOLDER__"));
    assert!(!out.contains("__TOUCH_SENSORS_PLACEHOLDER__"));
    // Direct mode: lambda body injected under the package's header.
    assert!(out.contains("lambda: |-"));
    assert!(out.contains("int currentPage = id(display_page);"));
    // System blocks from the package are disarmed.
    assert!(out.contains("# wifi: # (Auto-commented)"));
    assert!(out.contains("# esp32: # (Auto-commented)"));
    // Orientation override reached the package display and touch.
    assert!(out.contains("rotation: 90"));
    assert!(out.contains("swap_xy: true"));
    // Our own sections merged after the package content.
    assert!(out.contains("globals:"));
    assert!(out.contains("  - id: display_page"));
    assert!(!out.contains("http_request:"));
}

#[tokio::test]
async fn package_profile_lvgl_mode() {
    let dir = tempfile::tempdir().unwrap();
    write_package(&dir);
    let compiler = Compiler::new(Box::new(FsPackageSource::new(dir.path())));
    let p = project(serde_json::json!({
        "device_model": "waveshare_esp32_s3_touch_lcd_7",
        "pages": [{ "name": "Main", "widgets": [
            { "id": "t1", "type": "text", "x": 0, "y": 0, "width": 100, "height": 20,
              "props": { "text": "LCD" } }
        ]}]
    }));
    let out = compiler.generate(&p).await.unwrap();

    assert!(out.contains("lvgl:"));
    assert!(out.contains("  displays:\n    - my_display"));
    assert!(out.contains("auto_clear_enabled: false"));
    assert!(!out.contains("auto_clear_enabled: true"));
    assert!(!out.contains("__LAMBDA_PLACEHOLDER__"));
    assert!(!out.contains("int currentPage"));
    assert!(out.contains("# widget:text id:t1"));
}

#[tokio::test]
async fn missing_package_reports_error_comment() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = project(serde_json::json!({
        "device_model": "waveshare_esp32_s3_touch_lcd_7",
        "pages": [{ "name": "Main", "widgets": [] }]
    }));
    let out = compiler.generate(&p).await.unwrap();
    assert!(out.contains("# ERROR LOADING PROFILE:"));
    assert!(out.contains("globals:"));
}

#[tokio::test]
async fn unknown_model_is_an_error() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = project(serde_json::json!({
        "device_model": "toaster_9000",
        "pages": [{ "name": "Main", "widgets": [] }]
    }));
    let err = compiler.generate(&p).await.unwrap_err();
    assert!(err.to_string().contains("toaster_9000"));
}

#[tokio::test]
async fn lvgl_widgets_force_lvgl_on_nonlvgl_profile() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = trmnl_with(serde_json::json!([
        { "id": "b1", "type": "lvgl_button", "x": 0, "y": 0, "width": 60, "height": 30 }
    ]));
    let out = compiler.generate(&p).await.unwrap();
    assert!(out.contains("lvgl:"));
    assert!(out.contains("  displays:\n    - epaper_display"));
    // Display hardware stays, but without the drawing lambda.
    assert!(out.contains("display:"));
    assert!(!out.contains("    lambda: |-"));
}

#[tokio::test]
async fn custom_hardware_synthesizes_a_profile() {
    let (compiler, _dir) = compiler_with_empty_root();
    let p = project(serde_json::json!({
        "device_model": "custom",
        "custom_hardware": {
            "chip": "esp32-s3",
            "display_platform": "waveshare_epaper",
            "display_model": "7.50inv2",
            "width": 800,
            "height": 480,
            "pins": { "cs": "GPIO10", "dc": "GPIO11", "sda": "GPIO1", "scl": "GPIO2" }
        },
        "pages": [{ "name": "Main", "widgets": [] }]
    }));
    let out = compiler.generate(&p).await.unwrap();
    assert!(out.contains("cs_pin: GPIO10"));
    assert!(out.contains("- sda: GPIO1"));
    assert!(out.contains("model: \"7.50inv2\""));
    assert!(out.contains("update_interval: never"));
}
