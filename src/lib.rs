pub mod compare;
pub mod config;
pub mod data;
pub mod error;
pub mod legend;
pub mod logging;
pub mod map;
pub mod model;
pub mod output;
pub mod scoring;
pub mod search;
pub mod stderr_buffer;
pub mod tui;
