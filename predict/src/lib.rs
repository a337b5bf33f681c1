pub mod backend;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod inference;
pub mod labels;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod ranking;
pub mod response;
