use super::{CallTree, NodeId};
use crate::costs::Costs;
use crate::error::FormatError;
use crate::parse::Profile;

/// The totals assumed for a profile that has no `summary:` line.
///
/// Anything non-zero works; it only keeps the relative filters and ratings away from a division
/// by zero.
pub const DEFAULT_SUMMARY: Costs = Costs::new(1, 1, 1, 1);

/// Rebuild the call tree from the records of a profile.
///
/// A profile lists every invocation after the invocations it made, so read backwards the records
/// are a pre-order walk of the call tree. Together with the number of calls each record declares
/// that walk is enough to restore the nesting: every record becomes a child of the most recent
/// record that still has calls outstanding, or of the root if there is none.
///
/// Children end up in the reverse of their order in the profile.
pub fn build(profile: Profile) -> Result<CallTree, FormatError> {
    let mut tree = CallTree::new(profile.summary.unwrap_or(DEFAULT_SUMMARY));
    let root = tree.root();

    // (node, calls that have not been attached yet)
    let mut stack: Vec<(NodeId, u64)> = Vec::new();
    for record in profile.records.into_iter().rev() {
        let subcalls = record.subcalls;
        let node = tree.add_node(record.filename, record.function, record.costs);

        match stack.last_mut() {
            Some((parent, remaining)) => {
                tree.add_child(*parent, node);
                *remaining -= 1;
                if *remaining == 0 {
                    stack.pop();
                }
            }
            None => tree.add_child(root, node),
        }

        if subcalls > 0 {
            stack.push((node, subcalls));
        }
    }

    if let Some(&(node, missing)) = stack.last() {
        return Err(FormatError::MissingChildren {
            function: tree.node(node).function().to_owned(),
            missing,
        });
    }

    debug!(
        "built call tree with {} top-level call(s)",
        tree.children(root).len()
    );
    Ok(tree)
}
