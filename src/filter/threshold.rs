use crate::tree::CallTree;

/// Fold every node whose inclusive time is below `fraction` of the profile's total time into its
/// parent. Children are only looked at when their parent stays.
pub(super) fn apply(tree: &mut CallTree, fraction: f64) {
    let min = fraction * tree.summary().time as f64;
    let mut stack = tree.children(tree.root()).to_vec();
    while let Some(id) = stack.pop() {
        if (tree.inclusive_costs(id).time as f64) < min {
            tree.merge_into_parent(id);
        } else {
            stack.extend_from_slice(tree.children(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::Costs;

    #[test]
    fn cheap_calls_are_folded() {
        let mut tree = CallTree::new(Costs::new(1001, 0, 0, 0));
        let root = tree.root();
        let main = tree.add_node("index.php", "{main}", Costs::new(900, 0, 0, 0));
        let cheap = tree.add_node("a.php", "cheap", Costs::new(10, 0, 0, 0));
        let enough = tree.add_node("a.php", "enough", Costs::new(11, 0, 0, 0));
        let below = tree.add_node("a.php", "below", Costs::new(3, 0, 0, 0));
        let shutdown = tree.add_node("a.php", "shutdown", Costs::new(9, 0, 0, 0));
        tree.add_child(root, main);
        tree.add_child(main, cheap);
        tree.add_child(main, enough);
        tree.add_child(enough, below);
        tree.add_child(root, shutdown);
        let total = tree.inclusive_costs(root);

        apply(&mut tree, 0.01);
        assert_eq!(tree.children(root), &[main]);
        assert_eq!(tree.children(main), &[enough]);
        assert!(tree.children(enough).is_empty());
        assert_eq!(tree.node(root).costs().time, 9);
        assert_eq!(tree.node(main).costs().time, 910);
        assert_eq!(tree.node(enough).costs().time, 14);
        assert_eq!(tree.inclusive_costs(root), total);
    }

    #[test]
    fn zero_keeps_everything() {
        let mut tree = CallTree::new(Costs::new(10, 0, 0, 0));
        let a = tree.add_node("a.php", "a", Costs::ZERO);
        tree.add_child(tree.root(), a);
        apply(&mut tree, 0.0);
        assert_eq!(tree.children(tree.root()), &[a]);
    }
}
