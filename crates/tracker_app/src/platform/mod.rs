mod app;
pub mod cli;
mod effects;
mod ui;

pub use app::run_app;
