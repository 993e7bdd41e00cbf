//! Logs into cuLearn (Moodle) and collects the grade report of every enrolled course.

pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod utils;
