//! Data storage and dataset assembly
//!
//! SQLite match store, season scopes and the model-ready fixture table.

pub mod database;
pub mod dataset;
pub mod season;

pub use database::Database;
pub use dataset::QuinielaDataset;
pub use season::SeasonScope;
