use super::CallTree;
use crate::costs::CostRatings;

/// Rate the own costs of every node below the root against the tree's summary.
///
/// Run this last: ratings are not kept up to date by later changes to the tree.
pub fn rate_costs(tree: &mut CallTree) {
    let summary = tree.summary();
    let nodes: Vec<_> = tree.preorder().skip(1).collect();
    for &id in &nodes {
        let ratings = CostRatings::rate(&tree.node(id).costs(), &summary);
        tree.set_cost_ratings(id, ratings);
    }
    debug!("rated {} node(s)", nodes.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::Costs;

    #[test]
    fn every_node_but_the_root_is_rated() {
        let mut tree = CallTree::new(Costs::new(100, 100, 100, 100));
        let a = tree.add_node("a.php", "a", Costs::new(50, 1, 0, 0));
        let b = tree.add_node("b.php", "b", Costs::new(1, 0, 0, 0));
        tree.add_child(tree.root(), a);
        tree.add_child(a, b);

        rate_costs(&mut tree);
        assert!(tree.node(tree.root()).cost_ratings().is_none());

        let a = tree.node(a).cost_ratings().unwrap();
        assert_eq!(a.time, 1.0);
        assert!((a.memory - 0.2).abs() < 1e-9);
        assert_eq!(a.cycles, 0.0);

        let b = tree.node(b).cost_ratings().unwrap();
        assert!((b.time - 0.2).abs() < 1e-9);
    }
}
