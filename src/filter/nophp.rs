use super::{merge_where, INTERNAL_FILENAME};
use crate::tree::CallTree;

pub(super) fn apply(tree: &mut CallTree) {
    merge_where(tree, |tree, id| tree.node(id).filename() == INTERNAL_FILENAME);
}
