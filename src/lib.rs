pub mod app;
pub mod assets;
pub mod braille;
pub mod config;
pub mod data;
pub mod map;
pub mod tooltip;
pub mod ui;
