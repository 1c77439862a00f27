// src/cli/handlers/mod.rs

// One module per top-level action, plus the helpers they share.

pub mod commons;
pub mod create;
pub mod environment;
pub mod operate;
pub mod restore;
