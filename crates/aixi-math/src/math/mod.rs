//! Core math modules.

pub mod kt;
pub mod stable;
