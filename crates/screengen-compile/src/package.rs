//! Hardware package loading for package-based profiles: a source
//! abstraction (filesystem or HTTP) plus the device-specific fixups
//! applied to the fetched YAML before merging.

use std::path::PathBuf;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use screengen_core::Orientation;

use crate::profiles::DeviceProfile;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("package '{0}' not found")]
    NotFound(String),
    #[error("reading package: {0}")]
    Io(#[from] std::io::Error),
    #[error("fetching package: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where hardware package YAML comes from.
#[async_trait]
pub trait PackageSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<String, PackageError>;
}

/// Packages shipped on disk, resolved relative to a root directory.
pub struct FsPackageSource {
    root: PathBuf,
}

impl FsPackageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsPackageSource { root: root.into() }
    }
}

#[async_trait]
impl PackageSource for FsPackageSource {
    async fn fetch(&self, path: &str) -> Result<String, PackageError> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(PackageError::NotFound(path.to_string()));
        }
        Ok(std::fs::read_to_string(full)?)
    }
}

/// Packages served over HTTP, e.g. from the add-on's static assets.
pub struct HttpPackageSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPackageSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpPackageSource {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PackageSource for HttpPackageSource {
    async fn fetch(&self, path: &str) -> Result<String, PackageError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!(%url, "fetching hardware package");
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}

/// Device-specific fixups on the raw package before merging: LVGL
/// clear-mode compatibility, display rotation for the requested
/// orientation, and the matching GT911 touch transform.
pub fn apply_package_overrides(
    yaml: &str,
    profile: &DeviceProfile,
    orientation: Orientation,
    is_lvgl: bool,
) -> String {
    let mut yaml = yaml.to_string();

    if is_lvgl {
        // LVGL owns the framebuffer; auto-clearing fights it.
        if let Ok(re) = Regex::new(r"auto_clear_enabled:\s*true") {
            yaml = re
                .replace_all(&yaml, "auto_clear_enabled: false")
                .into_owned();
        }
    }

    let Some(touch) = &profile.touch else {
        return yaml;
    };

    // Landscape-native panel: rotate only for portrait layouts.
    let rotation = match orientation {
        Orientation::Portrait => 90,
        Orientation::Landscape => 0,
    };

    if let Ok(re) = Regex::new(r"(?s)(display:.*?rotation:\s*)\d+") {
        yaml = re
            .replace_all(&yaml, |caps: &regex::Captures<'_>| {
                format!("{}{}", &caps[1], rotation)
            })
            .into_owned();
    }

    if touch.platform == "gt911" {
        yaml = gt911_transform(&yaml, rotation);
    }
    yaml
}

/// The GT911 panel needs its axes swapped in step with the display
/// rotation. Replaces an existing transform block or injects one after
/// the touchscreen id.
fn gt911_transform(yaml: &str, rotation: u32) -> String {
    let Ok(id_re) = Regex::new(r"(?m)^(\s*)id:\s*my_touchscreen") else {
        return yaml.to_string();
    };
    let Some(caps) = id_re.captures(yaml) else {
        return yaml.to_string();
    };
    let indent = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let id_line = caps.get(0).map(|m| m.as_str()).unwrap_or("");

    let (swap_xy, mirror_x, mirror_y) = match rotation {
        90 => (true, false, true),
        180 => (false, true, true),
        270 => (true, true, false),
        _ => (false, false, false),
    };
    let transform = format!(
        "transform:\n{indent}  swap_xy: {swap_xy}\n{indent}  mirror_x: {mirror_x}\n{indent}  mirror_y: {mirror_y}"
    );

    let existing = Regex::new(&format!(
        "(?ms)^{}transform:.*?swap_xy: true",
        regex::escape(indent)
    ));
    if let Ok(re) = &existing {
        if re.is_match(yaml) {
            return re
                .replace(yaml, format!("{indent}{transform}"))
                .into_owned();
        }
    }
    yaml.replacen(id_line, &format!("{id_line}\n{indent}{transform}"), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::builtin;

    const PACKAGE: &str = "display:\n  - platform: rpi_dpi_rgb\n    id: my_display\n    auto_clear_enabled: true\n    rotation: 0\ntouchscreen:\n  - platform: gt911\n    id: my_touchscreen\n";

    #[test]
    fn lvgl_disables_auto_clear() {
        let profile = builtin("waveshare_esp32_s3_touch_lcd_7").unwrap();
        let out = apply_package_overrides(PACKAGE, &profile, Orientation::Landscape, true);
        assert!(out.contains("auto_clear_enabled: false"));
        assert!(!out.contains("auto_clear_enabled: true"));
    }

    #[test]
    fn portrait_rotates_display_and_swaps_touch_axes() {
        let profile = builtin("waveshare_esp32_s3_touch_lcd_7").unwrap();
        let out = apply_package_overrides(PACKAGE, &profile, Orientation::Portrait, false);
        assert!(out.contains("rotation: 90"));
        assert!(out.contains("id: my_touchscreen\n    transform:"));
        assert!(out.contains("      swap_xy: true"));
        assert!(out.contains("      mirror_y: true"));
    }

    #[test]
    fn landscape_injects_identity_transform() {
        let profile = builtin("waveshare_esp32_s3_touch_lcd_7").unwrap();
        let out = apply_package_overrides(PACKAGE, &profile, Orientation::Landscape, false);
        assert!(out.contains("rotation: 0"));
        assert!(out.contains("      swap_xy: false"));
    }

    #[test]
    fn existing_transform_block_is_replaced_not_duplicated() {
        let profile = builtin("waveshare_esp32_s3_touch_lcd_7").unwrap();
        let package = "touchscreen:\n  - platform: gt911\n    id: my_touchscreen\n    transform:\n      swap_xy: true\n";
        let out = apply_package_overrides(package, &profile, Orientation::Landscape, false);
        assert_eq!(out.matches("transform:").count(), 1);
        assert!(out.contains("swap_xy: false"));
    }

    #[test]
    fn profiles_without_touch_pass_through() {
        let profile = builtin("trmnl").unwrap();
        let out = apply_package_overrides(PACKAGE, &profile, Orientation::Portrait, false);
        assert!(out.contains("rotation: 0"));
    }

    #[tokio::test]
    async fn fs_source_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let hw = dir.path().join("hardware");
        std::fs::create_dir(&hw).unwrap();
        std::fs::write(hw.join("panel.yaml"), "display:\n").unwrap();
        let source = FsPackageSource::new(dir.path());
        let text = source.fetch("hardware/panel.yaml").await.unwrap();
        assert_eq!(text, "display:\n");
        assert!(matches!(
            source.fetch("hardware/missing.yaml").await,
            Err(PackageError::NotFound(_))
        ));
    }
}
