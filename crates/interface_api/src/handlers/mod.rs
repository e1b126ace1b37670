//! Request handlers

pub mod health;
pub mod payment_plans;
pub mod payments;
