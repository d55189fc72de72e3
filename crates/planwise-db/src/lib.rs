//! PostgreSQL persistence for learning plans: configuration, pool setup,
//! embedded migrations, row models and per-table query functions.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
