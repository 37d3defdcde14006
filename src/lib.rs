pub mod batch;
pub mod capture;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod scan;
pub mod session;
pub mod shell;
pub mod store;
