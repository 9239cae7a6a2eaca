//! Command handlers shared by the flags and the interactive menu
//!
//! Each handler takes fully gathered arguments, runs one core operation and
//! reports the outcome through `Output`.

pub mod backup;
pub mod config;
pub mod label;
pub mod link;
pub mod search;
pub mod transfer;
