//! Data model for screen layout projects and the pure helpers shared by
//! every stage of the compiler: entity-id handling and the visibility
//! condition compiler.

pub mod condition;
pub mod entity;
pub mod project;

pub use condition::{compile_condition, condition_props, CompiledCondition};
pub use project::{
    escape_quotes, CustomHardware, Orientation, Page, PageTheme, Project, ProjectError,
    RenderingMode, Widget,
};
