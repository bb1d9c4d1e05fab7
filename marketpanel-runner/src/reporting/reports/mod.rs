//! Report generators.

mod markdown;
mod narrative;
mod trailing;

pub use markdown::{
    render_analysis_markdown, write_analysis_json, write_analysis_markdown, AnalysisRecord,
};
pub use narrative::{buffett_zone, spread_position, NarrativeGenerator, SnapshotDigest};
pub use trailing::TrailingWindow;
