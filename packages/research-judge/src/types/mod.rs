//! Data types shared by every pipeline stage.

pub mod config;
pub mod evidence;
pub mod query;
pub mod run;
