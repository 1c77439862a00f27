// src/core/mod.rs

pub mod config_store;
pub mod detector;
pub mod expression;
pub mod logging;
pub mod paths;
pub mod project;
pub mod style;
pub mod template_manager;
pub mod template_schema;
pub mod versioning;
