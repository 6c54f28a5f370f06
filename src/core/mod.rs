//! Core translation module: data model, errors, configuration and the
//! orchestrator that drives an engine over a split document

pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod prompts;
pub mod translator;
