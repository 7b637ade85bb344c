//! Core library for the roster-reconcile command line application.
//!
//! The library checks a list of names against an authoritative master list
//! by reducing every name to a normalized key and joining on that key. The
//! modules keep responsibilities narrow and composable: column label parsing
//! lives in [`column`], the key reduction in [`normalize`], the join and its
//! summary in [`matcher`], the report layout in [`report`], spreadsheet IO
//! adapters under [`io`] and the end-to-end run in [`sync`].

pub mod column;
pub mod error;
pub mod io;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod report;
pub mod sync;

pub use error::{Result, ToolError};
