pub mod agent;
pub mod config;
pub mod runner;
pub mod session;
pub mod sweep;
pub mod telemetry;
pub mod util;
