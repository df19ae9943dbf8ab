pub mod authentication;
pub mod bucket_client;
pub mod configuration;
pub mod domain;
pub mod middleware;
pub mod routes;
pub mod routing;
pub mod startup;
pub mod storage;
pub mod telemetry;
pub mod utils;
