//! Application services

mod document;

pub use document::{parse_assignments, parse_predicate, Document, DocumentService, Placement};
