//! Request and response bodies

pub mod ledger;
pub mod production;
