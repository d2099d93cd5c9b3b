//! Pipeline steps that talk to external services.
//!
//! The researcher gathers news, the analyst turns it into a validated
//! analysis, and the visualizer renders the optional sentiment chart.

pub mod analyst;
pub mod researcher;
pub mod visualizer;

pub use analyst::Analyst;
pub use researcher::Researcher;
pub use visualizer::Visualizer;
