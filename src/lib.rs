//! need-info: asks issue authors for the information a report is missing.

pub mod config;
pub mod error;
pub mod tracker;
pub mod triage;
pub mod webhook;
