pub mod app;
pub mod engine;
pub mod reading;
pub mod ui;
