//! Schema-driven semantics
//!
//! - [`resolver`]: tag resolution against the schema
//! - [`value_class`]: value-class and unit checking for `#` values
//! - [`definitions`]: the definition registry and `Def`/`Def-expand` evaluation

pub mod definitions;
pub mod resolver;
pub mod value_class;

pub use definitions::{
    Definition, DefinitionEvaluation, DefinitionManager, RegistryState, is_definition_group,
};
pub use resolver::{Resolution, TagResolver};
pub use value_class::{ValueCheck, ValueClassMatcher};
