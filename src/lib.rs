pub mod batch;
pub mod config;
pub mod docx;
pub mod engine;
pub mod engines;
pub mod error;
pub mod files;
pub mod language;
pub mod processor;
pub mod rasterizer;
pub mod server;
pub mod text;
