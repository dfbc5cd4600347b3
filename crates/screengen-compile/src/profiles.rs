//! Builtin device profiles and synthesis of profiles from custom
//! hardware settings. A profile describes everything the hardware
//! generators need: chip, display driver, pins, battery curve and
//! feature flags.

use screengen_core::CustomHardware;

/// A GPIO assignment. Most pins are plain names; a few need extra
/// per-pin keys (inversion, input mode, strapping-warning suppression).
#[derive(Debug, Clone)]
pub enum Pin {
    Simple(&'static str),
    Detailed {
        number: &'static str,
        mode: Option<&'static str>,
        inverted: Option<bool>,
        ignore_strapping_warning: bool,
    },
}

impl Pin {
    pub const fn simple(number: &'static str) -> Self {
        Pin::Simple(number)
    }

    pub const fn inverted(number: &'static str) -> Self {
        Pin::Detailed {
            number,
            mode: None,
            inverted: Some(true),
            ignore_strapping_warning: false,
        }
    }

    pub const fn non_inverted(number: &'static str) -> Self {
        Pin::Detailed {
            number,
            mode: None,
            inverted: Some(false),
            ignore_strapping_warning: false,
        }
    }

    pub const fn input(number: &'static str) -> Self {
        Pin::Detailed {
            number,
            mode: Some("INPUT"),
            inverted: None,
            ignore_strapping_warning: false,
        }
    }

    pub fn number(&self) -> &str {
        match self {
            Pin::Simple(n) => n,
            Pin::Detailed { number, .. } => number,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DisplayPins {
    pub cs: Option<Pin>,
    pub dc: Option<Pin>,
    pub reset: Option<Pin>,
    pub busy: Option<Pin>,
}

#[derive(Debug, Clone)]
pub struct I2cPins {
    pub sda: &'static str,
    pub scl: &'static str,
}

#[derive(Debug, Clone)]
pub struct SpiPins {
    pub clk: &'static str,
    pub mosi: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct ButtonPins {
    pub left: Option<Pin>,
    pub right: Option<Pin>,
    pub refresh: Option<Pin>,
    pub home: Option<Pin>,
}

impl ButtonPins {
    pub fn any(&self) -> bool {
        self.left.is_some() || self.right.is_some() || self.refresh.is_some() || self.home.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pins {
    pub display: DisplayPins,
    pub i2c: Option<I2cPins>,
    pub spi: Option<SpiPins>,
    pub battery_enable: Option<Pin>,
    pub battery_adc: Option<&'static str>,
    pub buzzer: Option<&'static str>,
    pub buttons: ButtonPins,
}

/// ADC-to-percent mapping for the battery level template sensor.
#[derive(Debug, Clone)]
pub struct Battery {
    pub attenuation: &'static str,
    pub multiplier: f64,
    pub calibration_min: f64,
    pub calibration_max: f64,
}

/// Touch controller wiring for touchscreen-capable profiles.
#[derive(Debug, Clone, Default)]
pub struct Touch {
    pub platform: &'static str,
    pub swap_xy: bool,
    pub mirror_x: bool,
    pub mirror_y: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Features {
    pub psram: bool,
    pub buzzer: bool,
    pub buttons: bool,
    pub sht4x: bool,
    pub shtc3: bool,
    pub epaper: bool,
    pub lcd: bool,
    pub lvgl: bool,
    pub touch: bool,
    pub inverted_colors: bool,
}

#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub id: String,
    pub name: String,
    pub chip: String,
    pub board: String,
    pub display_platform: String,
    pub display_model: Option<String>,
    pub resolution: Resolution,
    pub psram_mode: Option<&'static str>,
    pub pins: Pins,
    pub battery: Option<Battery>,
    pub features: Features,
    pub i2c_scan: bool,
    pub i2c_frequency: Option<&'static str>,
    pub touch: Option<Touch>,
    /// Path of a pre-authored hardware package; set for package-based
    /// profiles, which skip the generated hardware sections entirely.
    pub hardware_package: Option<&'static str>,
    /// Custom pin overrides carried over from `custom_hardware` input;
    /// keyed by role (`cs`, `dc`, `sda`, ...).
    pub custom_pins: indexmap::IndexMap<String, String>,
}

impl DeviceProfile {
    pub fn is_package_based(&self) -> bool {
        self.hardware_package.is_some()
    }

    pub fn is_epaper(&self) -> bool {
        self.features.epaper
    }

    pub fn is_lcd(&self) -> bool {
        self.features.lcd || !self.features.epaper
    }

    /// Id of the display component the rest of the document refers to.
    pub fn display_id(&self) -> &'static str {
        if self.features.lcd {
            "my_display"
        } else {
            "epaper_display"
        }
    }

    fn base(id: &str, name: &str) -> Self {
        DeviceProfile {
            id: id.to_string(),
            name: name.to_string(),
            chip: "esp32-s3".to_string(),
            board: "esp32-s3-devkitc-1".to_string(),
            display_platform: "waveshare_epaper".to_string(),
            display_model: None,
            resolution: Resolution {
                width: 800,
                height: 480,
            },
            psram_mode: None,
            pins: Pins::default(),
            battery: None,
            features: Features::default(),
            i2c_scan: true,
            i2c_frequency: None,
            touch: None,
            hardware_package: None,
            custom_pins: indexmap::IndexMap::new(),
        }
    }
}

/// Look up one of the builtin profiles.
pub fn builtin(model: &str) -> Option<DeviceProfile> {
    match model {
        "reterminal_e1001" => Some(reterminal_e1001()),
        "trmnl" => Some(trmnl()),
        "m5stack_coreink" => Some(m5stack_coreink()),
        "esp32_s3_photopainter" => Some(photopainter()),
        "waveshare_esp32_s3_touch_lcd_7" => Some(waveshare_touch_lcd_7()),
        _ => None,
    }
}

fn reterminal_e1001() -> DeviceProfile {
    let mut p = DeviceProfile::base("reterminal_e1001", "Seeedstudio reTerminal E1001 (Monochrome)");
    p.display_model = Some("7.50inv2p".to_string());
    p.psram_mode = Some("octal");
    p.pins = Pins {
        display: DisplayPins {
            cs: Some(Pin::simple("GPIO10")),
            dc: Some(Pin::simple("GPIO11")),
            reset: Some(Pin::non_inverted("GPIO12")),
            busy: Some(Pin::inverted("GPIO13")),
        },
        i2c: Some(I2cPins {
            sda: "GPIO19",
            scl: "GPIO20",
        }),
        spi: Some(SpiPins {
            clk: "GPIO7",
            mosi: "GPIO9",
        }),
        battery_enable: Some(Pin::simple("GPIO21")),
        battery_adc: Some("GPIO1"),
        buzzer: Some("GPIO45"),
        buttons: ButtonPins {
            left: Some(Pin::simple("GPIO5")),
            right: Some(Pin::simple("GPIO4")),
            refresh: Some(Pin::simple("GPIO3")),
            home: Some(Pin::simple("GPIO2")),
        },
    };
    p.battery = Some(Battery {
        attenuation: "12db",
        multiplier: 2.0,
        calibration_min: 3.27,
        calibration_max: 4.15,
    });
    p.features = Features {
        psram: true,
        buzzer: true,
        buttons: true,
        sht4x: true,
        epaper: true,
        inverted_colors: true,
        ..Features::default()
    };
    p
}

fn trmnl() -> DeviceProfile {
    let mut p = DeviceProfile::base("trmnl", "TRMNL (ESP32-C3)");
    p.chip = "esp32-c3".to_string();
    p.board = "esp32-c3-devkitm-1".to_string();
    p.display_model = Some("7.50inv2".to_string());
    p.pins = Pins {
        display: DisplayPins {
            cs: Some(Pin::simple("GPIO6")),
            dc: Some(Pin::simple("GPIO5")),
            reset: Some(Pin::non_inverted("GPIO10")),
            busy: Some(Pin::inverted("GPIO4")),
        },
        i2c: Some(I2cPins {
            sda: "GPIO1",
            scl: "GPIO2",
        }),
        spi: Some(SpiPins {
            clk: "GPIO7",
            mosi: "GPIO8",
        }),
        battery_adc: Some("GPIO0"),
        ..Pins::default()
    };
    p.battery = Some(Battery {
        attenuation: "12db",
        multiplier: 2.0,
        calibration_min: 3.30,
        calibration_max: 4.15,
    });
    p.features = Features {
        epaper: true,
        inverted_colors: true,
        ..Features::default()
    };
    p
}

fn m5stack_coreink() -> DeviceProfile {
    let mut p = DeviceProfile::base("m5stack_coreink", "M5Stack M5Core Ink (200x200)");
    p.chip = "esp32".to_string();
    p.board = "m5stack-coreink".to_string();
    p.display_model = Some("1.54inv2".to_string());
    p.resolution = Resolution {
        width: 200,
        height: 200,
    };
    p.pins = Pins {
        // Busy pin omitted: times out on some units.
        display: DisplayPins {
            cs: Some(Pin::simple("GPIO9")),
            dc: Some(Pin::simple("GPIO15")),
            reset: Some(Pin::simple("GPIO0")),
            busy: None,
        },
        i2c: Some(I2cPins {
            sda: "GPIO21",
            scl: "GPIO22",
        }),
        spi: Some(SpiPins {
            clk: "GPIO18",
            mosi: "GPIO23",
        }),
        // Power hold pin.
        battery_enable: Some(Pin::Detailed {
            number: "GPIO12",
            mode: None,
            inverted: None,
            ignore_strapping_warning: true,
        }),
        battery_adc: Some("GPIO35"),
        buzzer: Some("GPIO2"),
        buttons: ButtonPins {
            left: Some(Pin::input("GPIO39")),
            right: Some(Pin::input("GPIO37")),
            refresh: Some(Pin::input("GPIO38")),
            home: None,
        },
    };
    p.battery = Some(Battery {
        attenuation: "12db",
        multiplier: 2.0,
        calibration_min: 3.27,
        calibration_max: 4.15,
    });
    p.features = Features {
        buzzer: true,
        buttons: true,
        epaper: true,
        inverted_colors: true,
        ..Features::default()
    };
    p
}

fn photopainter() -> DeviceProfile {
    let mut p = DeviceProfile::base("esp32_s3_photopainter", "Waveshare PhotoPainter (6-Color)");
    p.display_model = Some("7.30in-f".to_string());
    p.psram_mode = Some("octal");
    p.pins = Pins {
        display: DisplayPins {
            cs: Some(Pin::simple("GPIO9")),
            dc: Some(Pin::simple("GPIO8")),
            reset: Some(Pin::simple("GPIO12")),
            busy: Some(Pin::inverted("GPIO13")),
        },
        i2c: Some(I2cPins {
            sda: "GPIO47",
            scl: "GPIO48",
        }),
        spi: Some(SpiPins {
            clk: "GPIO10",
            mosi: "GPIO11",
        }),
        buttons: ButtonPins {
            left: Some(Pin::simple("GPIO0")),
            right: Some(Pin::simple("GPIO4")),
            ..ButtonPins::default()
        },
        ..Pins::default()
    };
    p.features = Features {
        psram: true,
        buttons: true,
        shtc3: true,
        epaper: true,
        ..Features::default()
    };
    p.i2c_scan = false;
    p.i2c_frequency = Some("10kHz");
    p
}

fn waveshare_touch_lcd_7() -> DeviceProfile {
    let mut p = DeviceProfile::base(
        "waveshare_esp32_s3_touch_lcd_7",
        "Waveshare Touch LCD 7 7.0\" 800x480",
    );
    p.hardware_package = Some("hardware/waveshare-esp32-s3-touch-lcd-7.yaml");
    p.features = Features {
        psram: true,
        lcd: true,
        lvgl: true,
        touch: true,
        ..Features::default()
    };
    p.touch = Some(Touch {
        platform: "gt911",
        swap_xy: true,
        ..Touch::default()
    });
    p
}

/// Build a profile from user-supplied custom hardware settings. Pin
/// roles come through the open pin map; missing entries simply leave
/// the matching section out of the output.
pub fn from_custom(ch: &CustomHardware) -> DeviceProfile {
    let mut p = DeviceProfile::base("custom", "Custom Device");
    if !ch.chip.is_empty() {
        p.chip = ch.chip.clone();
    }
    if !ch.board.is_empty() {
        p.board = ch.board.clone();
    }
    if !ch.display_platform.is_empty() {
        p.display_platform = ch.display_platform.clone();
    }
    p.display_model = ch.display_model.clone();
    if ch.width > 0 && ch.height > 0 {
        p.resolution = Resolution {
            width: ch.width,
            height: ch.height,
        };
    }
    let epaper = p.display_platform.contains("epaper") || p.display_platform.contains("epd");
    p.features.epaper = epaper;
    p.features.lcd = !epaper;
    for (role, pin) in &ch.pins {
        p.custom_pins.insert(role.clone(), pin.clone());
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_the_supported_models() {
        for model in [
            "reterminal_e1001",
            "trmnl",
            "m5stack_coreink",
            "esp32_s3_photopainter",
            "waveshare_esp32_s3_touch_lcd_7",
        ] {
            assert!(builtin(model).is_some(), "missing profile for {model}");
        }
        assert!(builtin("nonexistent_device").is_none());
    }

    #[test]
    fn package_profile_has_no_generated_display() {
        let p = builtin("waveshare_esp32_s3_touch_lcd_7").unwrap();
        assert!(p.is_package_based());
        assert!(p.features.lvgl);
        assert_eq!(p.display_id(), "my_display");
    }

    #[test]
    fn epaper_profiles_use_epaper_display_id() {
        let p = builtin("reterminal_e1001").unwrap();
        assert!(!p.is_package_based());
        assert_eq!(p.display_id(), "epaper_display");
        assert!(p.features.inverted_colors);
    }

    #[test]
    fn custom_synthesis_detects_display_tech() {
        let ch: CustomHardware = serde_json::from_value(serde_json::json!({
            "chip": "esp32-s3",
            "display_platform": "waveshare_epaper",
            "display_model": "7.50inv2",
            "width": 640,
            "height": 384,
            "pins": { "cs": "GPIO10", "dc": "GPIO11" }
        }))
        .unwrap();
        let p = from_custom(&ch);
        assert!(p.features.epaper);
        assert!(!p.features.lcd);
        assert_eq!(p.resolution.width, 640);
        assert_eq!(p.custom_pins.get("cs").map(String::as_str), Some("GPIO10"));
    }
}
