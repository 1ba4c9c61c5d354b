//! Capability implementations for the research judge.
//!
//! This module provides a reference implementation of the stance
//! classifier, conflict identifier and judgment synthesizer traits.
//! Users can use it directly or implement their own.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAI;
