//! sftcheck - scientific feature tests for epidemiological simulation output
//!
//! This library reads the artifacts a simulator run leaves behind (config,
//! campaign, stdout log, inset chart, property report, event recorder CSV and
//! event database), derives what the configured model should have produced,
//! and writes a plain-text report of GOOD, BAD and WARNING findings ending in
//! a `SUMMARY: Success=True|False` line.

pub mod campaign;
pub mod cli;
pub mod context;
pub mod debug_dump;
pub mod features;
pub mod json_tree;
pub mod output;
pub mod plot;
pub mod report;
pub mod sft;
pub mod sim_config;
