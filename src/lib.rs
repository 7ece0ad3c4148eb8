pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod feed;
pub mod indicator;
pub mod input;
pub mod logging;
pub mod model;
pub mod series;
pub mod simulator;
pub mod ui;
