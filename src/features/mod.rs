//! Feature extraction and encoding
//!
//! Turns stored matches into per-team rows with standings and form.

pub mod encoding;
pub mod match_repr;
pub mod team_stats;
pub mod temporal;

pub use encoding::TeamEncoding;
pub use match_repr::TeamMatchRow;
pub use team_stats::RankingRow;
