pub mod collaborators;
pub mod config;
pub mod customer;
pub mod errors;
pub mod event_scheduler;
pub mod queue_manager;
pub mod recipes;
pub mod reward;
pub mod stats;
pub mod types;

#[cfg(test)]
mod tests;
