//! Chunk endpoints. A capability over the parent document authorizes its
//! chunks; the routes share the document's invocation target.

pub mod get;
pub mod remove;
pub mod update;
