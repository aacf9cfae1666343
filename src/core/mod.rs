// Core modules implementing the graph registry, hook loading, and linking.
pub mod error;
pub mod graph;
pub mod hooks;
pub mod link;
pub mod script;
