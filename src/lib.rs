pub mod api;
pub mod config;
pub mod error;
pub mod labels;
pub mod logging;
pub mod models;
pub mod predict;
pub mod preprocess;
pub mod state;
