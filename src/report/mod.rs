//! Report rendering.

pub mod chart;
pub mod generator;

pub use generator::render_report;
