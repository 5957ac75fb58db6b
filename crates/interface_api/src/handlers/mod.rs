//! Request handlers

pub mod health;
pub mod ledger;
pub mod production;
