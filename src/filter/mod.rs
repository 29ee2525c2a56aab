mod depth;
mod include;
mod nophp;
mod threshold;

use std::fmt;
use std::str::FromStr;

use crate::tree::{CallTree, NodeId};

/// The file name the profiler gives to functions built into the runtime.
pub const INTERNAL_FILENAME: &str = "php:internal";

/// Function name prefixes of the pseudo-calls the profiler records for file inclusion.
pub const INCLUDE_PREFIXES: [&str; 4] = ["include::", "require::", "include_once::", "require_once::"];

/// A structural filter over a [`CallTree`].
///
/// Filters never drop cost. Every node a filter removes is folded into its parent with
/// [`CallTree::merge_into_parent`], so its cost shows up as own cost of the nearest surviving
/// caller and the inclusive cost of the root stays the same.
///
/// Filters parse from the strings accepted by the `--filter` flag:
///
/// ```
/// use grindtree::filter::Filter;
///
/// assert_eq!("nophp".parse(), Ok(Filter::NoPhp));
/// assert_eq!("depth=3".parse(), Ok(Filter::Depth(3)));
/// assert_eq!("timethreshold=0.05".parse(), Ok(Filter::TimeThreshold(0.05)));
/// assert!("depth=0".parse::<Filter>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Filter {
    /// Fold calls of runtime built-ins (file name [`INTERNAL_FILENAME`]) into their callers.
    NoPhp,
    /// Fold `include`/`require` pseudo-calls (see [`INCLUDE_PREFIXES`]) into their callers.
    Include,
    /// Fold everything at this depth or deeper into its ancestor one level up. The root is at
    /// depth 0, so `Depth(1)` leaves nothing but the root.
    Depth(usize),
    /// Fold calls whose inclusive time is below this fraction of the total time into their
    /// callers.
    TimeThreshold(f64),
}

impl Filter {
    /// Run the filter over `tree`.
    pub fn apply(&self, tree: &mut CallTree) {
        match *self {
            Filter::NoPhp => nophp::apply(tree),
            Filter::Include => include::apply(tree),
            Filter::Depth(max_depth) => depth::apply(tree, max_depth),
            Filter::TimeThreshold(fraction) => threshold::apply(tree, fraction),
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };

        match (name, arg) {
            ("nophp", None) => Ok(Filter::NoPhp),
            ("include", None) => Ok(Filter::Include),
            ("depth", Some(arg)) => match arg.parse::<usize>() {
                Ok(depth) if depth > 0 => Ok(Filter::Depth(depth)),
                _ => Err(format!("depth must be a positive integer, got {:?}", arg)),
            },
            ("timethreshold", Some(arg)) => match arg.parse::<f64>() {
                Ok(fraction) if (0.0..=1.0).contains(&fraction) => {
                    Ok(Filter::TimeThreshold(fraction))
                }
                _ => Err(format!(
                    "time threshold must be a number between 0 and 1, got {:?}",
                    arg
                )),
            },
            _ => Err(format!("unknown filter: {}", s)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::NoPhp => f.write_str("nophp"),
            Filter::Include => f.write_str("include"),
            Filter::Depth(depth) => write!(f, "depth={}", depth),
            Filter::TimeThreshold(fraction) => write!(f, "timethreshold={}", fraction),
        }
    }
}

/// Walk the tree from the root and fold every node for which `drop` returns true into its
/// parent. The subtree of a folded node is not visited.
fn merge_where<F>(tree: &mut CallTree, drop: F)
where
    F: Fn(&CallTree, NodeId) -> bool,
{
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        for child in tree.children(id).to_vec() {
            if drop(tree, child) {
                tree.merge_into_parent(child);
            } else {
                stack.push(child);
            }
        }
    }
}
