//! Document-grounded question answering: upload documents, index their
//! segments, and answer questions strictly from retrieved passages.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_support;
