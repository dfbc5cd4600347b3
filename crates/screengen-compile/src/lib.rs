//! Turns a layout project into a single ESPHome YAML document: device
//! profile resolution, hardware sections, the drawing lambda (or LVGL
//! tree), fonts, scripts, and hardware-package merging.

pub mod compiler;
pub mod hardware;
pub mod header;
pub mod lambda;
pub mod lvgl;
pub mod package;
pub mod profiles;
pub mod scripts;

pub use compiler::Compiler;
pub use package::{FsPackageSource, HttpPackageSource, PackageError, PackageSource};
pub use profiles::DeviceProfile;

use screengen_core::ProjectError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unknown device model '{0}'")]
    UnknownModel(String),
    #[error(transparent)]
    Project(#[from] ProjectError),
}
