//! Document endpoints. Every route here is capability-protected: the
//! handler derives the invocation target from the path and hands the raw
//! request to the verifier before touching the store.

pub mod get;
pub mod insert;
pub mod query;
pub mod remove;
pub mod update;
