use std::collections::VecDeque;

use crate::tree::CallTree;

/// Fold every node at `max_depth` or deeper into the node above it, level by level from the root.
pub(super) fn apply(tree: &mut CallTree, max_depth: usize) {
    let mut queue = VecDeque::from(vec![(tree.root(), 0)]);
    while let Some((id, depth)) = queue.pop_front() {
        for child in tree.children(id).to_vec() {
            if depth + 1 >= max_depth {
                tree.merge_into_parent(child);
            } else {
                queue.push_back((child, depth + 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::Costs;
    use crate::tree::NodeId;

    /// root -> a -> b -> c, plus root -> d
    fn chain() -> (CallTree, [NodeId; 4]) {
        let mut tree = CallTree::new(Costs::ZERO);
        let a = tree.add_node("a.php", "a", Costs::new(1, 1, 1, 1));
        let b = tree.add_node("b.php", "b", Costs::new(2, 2, 2, 2));
        let c = tree.add_node("c.php", "c", Costs::new(4, 4, 4, 4));
        let d = tree.add_node("d.php", "d", Costs::new(8, 8, 8, 8));
        tree.add_child(tree.root(), a);
        tree.add_child(a, b);
        tree.add_child(b, c);
        tree.add_child(tree.root(), d);
        (tree, [a, b, c, d])
    }

    #[test]
    fn deep_calls_collapse_into_the_boundary() {
        let (mut tree, [a, b, c, _]) = chain();
        let total = tree.inclusive_costs(tree.root());

        apply(&mut tree, 2);
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.node(b).parent(), None);
        assert_eq!(tree.node(c).parent(), Some(b));
        assert_eq!(tree.node(a).costs(), Costs::new(7, 4, 7, 4));
        assert_eq!(tree.inclusive_costs(tree.root()), total);
    }

    #[test]
    fn depth_one_keeps_only_the_root() {
        let (mut tree, _) = chain();
        let total = tree.inclusive_costs(tree.root());

        apply(&mut tree, 1);
        assert!(tree.is_empty());
        assert_eq!(tree.node(tree.root()).costs(), total);
    }

    #[test]
    fn shallow_trees_are_untouched() {
        let (mut tree, [a, b, c, d]) = chain();
        apply(&mut tree, 4);
        assert_eq!(tree.children(tree.root()), &[a, d]);
        assert_eq!(tree.children(b), &[c]);
    }
}
