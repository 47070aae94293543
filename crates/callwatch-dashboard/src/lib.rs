pub mod app;
pub mod composer;
pub mod config;
pub mod panels;
pub mod ui;
