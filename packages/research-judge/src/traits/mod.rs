//! Core trait abstractions for the research judge.
//!
//! These traits define the interfaces that applications implement
//! to provide evidence sources and judgment capabilities.

pub mod ai;
pub mod connector;
