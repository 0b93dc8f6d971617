pub mod api;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod prompt;
pub mod services;
pub mod storage;
