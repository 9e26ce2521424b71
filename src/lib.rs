pub mod app;
pub mod catalogue;
pub mod discovery;
pub mod enrichment;
pub mod error;
pub mod favorites;
pub mod genres;
pub mod models;
