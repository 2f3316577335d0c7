//! Core domain types and logic: indicators, allocation strategies, history
//! replay, and the workflows that drive them through the ports.

pub mod allocation;
pub mod budget;
pub mod error;
pub mod history;
pub mod holding;
pub mod indicator;
pub mod log_review;
pub mod price;
pub mod settings;
pub mod workflow;
