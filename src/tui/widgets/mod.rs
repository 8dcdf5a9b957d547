//! TUI widgets for DataWhisperer.

pub mod chat;
pub mod header;
pub mod help;
pub mod input;
pub mod settings;
