//! Emotion timeline command-line tool.
//!
//! This crate provides:
//! - `live`: sample frames, classify them over HTTP, chart and annotate
//! - `segments`: merge a pre-computed emotion/sentiment analysis and annotate
//! - Environment configuration and tracing setup

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::{Cli, Command};
pub use config::PipelineConfig;
