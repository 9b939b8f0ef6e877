pub mod anchor;
pub mod categorize;
pub mod domain;
pub mod error;
