//! Butler Library
//!
//! Core modules for the Butler voice butler daemon.

pub mod audio;
pub mod bus;
pub mod button;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod navigator;
pub mod orchestrator;
pub mod process;
pub mod tts;
