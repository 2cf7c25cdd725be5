pub mod analytics;
pub mod chart;
pub mod config;
pub mod domain;
pub mod error;
pub mod event;
pub mod user_agent;
pub mod visitor;
