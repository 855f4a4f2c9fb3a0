pub mod batch;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod report;
pub mod selection;
