pub mod agent;
pub mod priority;
