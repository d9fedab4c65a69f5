pub mod config;
pub mod distance;
pub mod emissions;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod outing;
pub mod output;
pub mod processor;
pub mod segmenter;
pub mod transport;
