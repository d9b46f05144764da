//! Immediate-mode inspector UI built on egui.

pub mod inspector;
pub mod ui_system;

pub use ui_system::UiSystem;
