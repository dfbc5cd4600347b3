//! Line-oriented tooling for assembling the final YAML document: section
//! merging, deferred trigger injection and hardware-package cleanup.
//!
//! Everything here works on lines of text rather than a parsed YAML
//! tree, so byte-level formatting of untouched input is preserved.

pub mod package;
pub mod section;
pub mod triggers;

pub use package::{comment_out_system_sections, substitute_placeholders};
pub use section::merge_sections;
pub use triggers::{inject_triggers, PendingTriggers};
