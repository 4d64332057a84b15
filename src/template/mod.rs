//! Template statistics precomputed once per trigger.

pub(crate) mod plan;

pub use plan::TemplatePlan;
