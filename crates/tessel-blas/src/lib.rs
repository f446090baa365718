#![warn(missing_docs)]

//! Tessel BLAS crate: operation descriptors, the execution context driving a device queue,
//! tile-based launchers and the backend dispatcher selecting their configuration.

#[macro_use]
extern crate derive_new;

mod element;
mod error;

/// Compile-fixed launch configurations.
pub mod config;
/// Operation descriptors.
pub mod operation;
/// Backend dispatcher and tuning tables.
pub mod backend;
/// Tile-based launchers.
pub mod launcher;
/// BLAS-style entry points.
pub mod interface;

mod context;
mod kernels;

#[cfg(any(test, feature = "export_tests"))]
#[allow(missing_docs)]
pub mod tests;

pub use context::*;
pub use element::*;
pub use error::*;
pub use interface::*;
pub use operation::{Operation, Transpose};
