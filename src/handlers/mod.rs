//! HTTP handlers

pub mod health;
pub mod transactions;
pub mod predict;
