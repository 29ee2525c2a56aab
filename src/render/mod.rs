/// Graphviz DOT output.
pub mod dot;

/// Hierarchical XML cost reports.
pub mod xml;

mod image;

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::tree::{CallTree, Node};
use crate::Error;

/// The output formats grindtree can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// An XML cost report, see [`xml::write`].
    Xml,
    /// A Graphviz graph, see [`dot::write`].
    Dot,
    /// The DOT graph laid out by Graphviz as SVG. Needs `dot` on the `PATH`.
    Svg,
    /// The DOT graph laid out by Graphviz as PNG. Needs `dot` on the `PATH`.
    Png,
}

impl Default for Format {
    fn default() -> Self {
        Format::Svg
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(Format::Xml),
            "dot" => Ok(Format::Dot),
            "svg" => Ok(Format::Svg),
            "png" => Ok(Format::Png),
            unknown => Err(format!("unknown output format: {}", unknown)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Xml => "xml",
            Format::Dot => "dot",
            Format::Svg => "svg",
            Format::Png => "png",
        })
    }
}

/// Render `tree` to `writer` in the given format.
///
/// Rendering never changes the tree. Nodes without [cost ratings](crate::tree::rating) are
/// rated on the fly where the output needs them.
pub fn write<W>(format: Format, tree: &CallTree, writer: W) -> Result<(), Error>
where
    W: io::Write,
{
    match format {
        Format::Xml => xml::write(tree, writer)?,
        Format::Dot => dot::write(tree, writer)?,
        Format::Svg | Format::Png => image::write(format, tree, writer)?,
    }
    Ok(())
}

/// A stable identifier for a node, derived from its identity path.
///
/// The same call site gets the same identifier in every rendering of every tree.
pub fn node_id(node: &Node) -> String {
    format!("n{}", blake3::hash(node.path().as_bytes()).to_hex())
}
