//! Resolution of per-type priorities and before/after directives into a single execution order.

pub mod descriptor;
pub mod index;
pub mod resolver;
