//! Core bridge logic

pub mod bridge;
pub mod error;
pub mod events;
pub mod options;
pub mod registration;
pub mod serializer;
pub mod types;
