//! Load balancing: smooth weighted round robin selection and weight feedback.

pub mod feedback;
pub mod selector;
