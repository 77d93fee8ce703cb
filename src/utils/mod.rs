/// TOML configuration (`playground.toml`) and its validation.
pub mod toml_config;
