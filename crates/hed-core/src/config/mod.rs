//! Configuration system for HED validation
//!
//! Validation options are read from JSON, TOML or YAML files. When no explicit
//! path is given, the loader searches from the start directory upwards for
//! `.hedrc.json`, `.hedrc.toml`, `hed.yaml`, `hed.yml` or `hed.json`.
//!
//! ## Example Configuration
//!
//! ```jsonc
//! {
//!   "checkWarnings": true,
//!   "limitErrors": false,
//!   "validateDefinitionValues": true,
//!   "allowPlaceholders": false,
//!   "reportUnusedDefinitions": true
//! }
//! ```

mod loader;
mod validator_config;

pub use loader::ConfigLoader;
pub use validator_config::ValidatorConfig;
