pub mod config;
pub mod data;
pub mod error;
pub mod matrix;
pub mod models;
pub mod nn;
pub mod pipeline;
pub mod weights;
