//! Export core modules shared across renderers.

pub mod report_core;
