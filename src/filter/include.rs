use super::{merge_where, INCLUDE_PREFIXES};
use crate::tree::CallTree;

pub(super) fn apply(tree: &mut CallTree) {
    merge_where(tree, |tree, id| {
        let function = tree.node(id).function();
        INCLUDE_PREFIXES.iter().any(|p| function.starts_with(p))
    });
}
