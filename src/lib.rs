#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod cli;
pub mod config;
pub mod derive;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod poller;
pub mod tui;
