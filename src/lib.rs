//! Functional coverage evaluation over VCD simulation traces.
//!
//! The crate parses the declaration and value-change subset of a Value Change
//! Dump (VCD) file into an in-memory time series, loads a JSON coverage
//! specification (covergroups of coverpoints with value bins, plus
//! cross-coverage definitions), and evaluates which bins were exercised and
//! when. The populated model serializes to JSON for external report
//! generators.

#![recursion_limit = "128"] // needed for error_chain.

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;
extern crate num_traits; // required for shawshank
#[cfg_attr(test, macro_use)]
extern crate serde_json;
extern crate shawshank;

#[macro_use]
mod intern;
mod utils;
pub mod annotated;
pub mod error;
pub mod eval;
pub mod model;
pub mod reader;
pub mod values;
pub mod vcd;

pub use annotated::AnnotatedFile;
pub use error::{ErrorKind, Result};
pub use intern::{Interner, Symbol};
pub use model::CoverDb;
pub use reader::Reader;
pub use values::Values;
pub use vcd::Vcd;
