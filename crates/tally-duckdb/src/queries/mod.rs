pub mod chart;
pub mod events;
pub mod stats;
