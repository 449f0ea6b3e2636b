// fhir2spine - FHIR Patient search to Spine PDS bridging gateway
// Author: kelexine (https://github.com/kelexine)

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod queue;
pub mod server;
pub mod spine;
pub mod translation;
pub mod utils;
