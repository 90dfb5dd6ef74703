//! Leaf-node lookup on violation paths.

use gatecheck_validate::{ConstraintViolation, ElementKind, PathNode, PropertyPath};

/// The last node of `path`, or `None` for an empty path.
///
/// Engines are expected to always produce at least the leaf node; callers
/// treat `None` as a broken engine invariant rather than skipping the
/// violation.
pub fn leaf_node(path: &PropertyPath) -> Option<&PathNode> {
    path.into_iter().last()
}

/// Kind of the violation's leaf node.
pub fn leaf_kind(violation: &ConstraintViolation) -> Option<ElementKind> {
    leaf_node(&violation.property_path).map(PathNode::kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_is_last_node() {
        let path = PropertyPath::from_nodes(vec![
            PathNode::method("place"),
            PathNode::parameter("order", 0),
            PathNode::property("sku").at_index(1),
        ]);
        let leaf = leaf_node(&path).unwrap();
        assert_eq!(leaf.name(), "sku");
        assert_eq!(leaf.kind(), ElementKind::Property);
    }

    #[test]
    fn single_node_path() {
        let path = PropertyPath::from_nodes(vec![PathNode::return_value()]);
        assert_eq!(leaf_node(&path).unwrap().kind(), ElementKind::ReturnValue);
    }

    #[test]
    fn empty_path_has_no_leaf() {
        assert!(leaf_node(&PropertyPath::new()).is_none());
    }
}
