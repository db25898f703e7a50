pub mod catalog;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
