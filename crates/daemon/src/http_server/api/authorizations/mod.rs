//! Delegated capability endpoints. Storing or removing a delegation is
//! itself a capability-protected operation, and only root delegators of
//! the hub may do either.

pub mod get;
pub mod insert;
pub mod remove;
