pub mod aggregation;
pub mod app;
pub mod broker;
pub mod error;
pub mod ingest;
pub mod rate_limit;
pub mod routes;
pub mod state;
