pub mod catalog;
pub mod config;
pub mod leads;
pub mod output;
pub mod profile;
pub mod report;
pub mod server;
pub mod triage;
