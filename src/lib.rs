//! Grindtree turns the Cachegrind-format profiles written by PHP's xdebug profiler into an
//! in-memory [call tree], prunes and aggregates that tree, and renders it as a [Graphviz] graph
//! (DOT, SVG or PNG) or as a hierarchical XML cost report.
//!
//! Like most profile post-processors, it works in stages:
//!
//!  1. **Parsing.** The [`parse`] module reads the line-oriented profile into a flat list of
//!     [`parse::Record`]s, one per function block, each with its own costs and the number of
//!     calls it made.
//!  2. **Building.** The [`tree::build`] module reconstructs the call nesting from that flat
//!     list. Xdebug writes a function's block when the function returns, so reading the blocks
//!     backwards yields a pre-order walk of the call tree; together with the per-block call
//!     counts that walk is enough to restore the tree exactly.
//!  3. **Filtering and merging.** The [`tree::CallTree`] owns every structural operation:
//!     merging repeated profiling runs into one aggregate tree, combining duplicate call
//!     sites, and collapsing nodes into their callers. The [`filter`] module builds the
//!     user-facing pruning policies on top of that.
//!  4. **Rendering.** The [`render`] module writes the finished tree as DOT, XML, or (through
//!     the external `dot` tool) as an image.
//!
//! # Command-line use
//!
//! ```console
//! $ grindtree --in cachegrind.out.1234 --out profile.svg --format svg \
//!       --filter nophp --filter timethreshold=0.01
//! ```
//!
//! # Programmatic access
//!
//! ```
//! use grindtree::convert::{self, Options};
//! use grindtree::render::Format;
//!
//! let input = "\
//! version: 1
//! cmd: index.php
//! part: 1
//!
//! events: Time Memory Cycles Peakmemory
//!
//! fl=index.php
//! fn={main}
//!
//! summary: 21 30 0 70
//!
//! 0 21 30 0 70
//! ";
//!
//! let tree = convert::aggregate(input, &Options::default()).unwrap();
//! let mut dot = Vec::new();
//! grindtree::render::write(Format::Dot, &tree, &mut dot).unwrap();
//! assert!(String::from_utf8(dot).unwrap().starts_with("digraph {"));
//! ```
//!
//!   [call tree]: https://en.wikipedia.org/wiki/Call_graph
//!   [Graphviz]: https://graphviz.org/

#![deny(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

#[macro_use]
extern crate log;

/// The cost vector attached to every call, and the rules for combining costs.
pub mod costs;

/// The pipeline that turns a whole (possibly multi-part) profile into one filtered tree.
pub mod convert;

mod error;

/// Pruning policies that collapse uninteresting calls into their callers.
pub mod filter;

/// Parsing of Cachegrind-format profiles into flat call records.
///
/// See the [crate-level documentation] for details.
///
///   [crate-level documentation]: ../index.html
pub mod parse;

/// DOT, XML and image output.
pub mod render;

/// The call tree and every operation that changes its shape.
pub mod tree;

pub use crate::error::{Error, FormatError};
