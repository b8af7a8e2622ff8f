//! Navigation projection: the menu a user gets to see.
//!
//! Advisory only. A node shown here may still be denied by
//! [`AuthorizationService`](crate::AuthorizationService), and a hidden node may
//! still be reachable by direct link if the grant allows it. This module must
//! not be used to make access decisions.

use std::collections::HashMap;

use serde::Serialize;

use coursedesk_core::ResourceNodeId;

use crate::{Grant, ResourceNode, ResourceTree};

/// One entry of the projected menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavNode {
    pub id: ResourceNodeId,
    pub url_path: String,
    pub label: String,
    pub icon: Option<String>,
    /// `false` for grouping entries kept only because a descendant is visible.
    pub clickable: bool,
    pub children: Vec<NavNode>,
}

/// Prune `tree` down to what the viewer may see.
///
/// Post-order: a node survives iff its own view grant is `true` or at least
/// one child survives. Sibling order is preserved.
pub fn project(tree: &ResourceTree, view_grants: &HashMap<ResourceNodeId, bool>) -> Vec<NavNode> {
    tree.roots()
        .filter_map(|root| project_node(tree, root, view_grants))
        .collect()
}

fn project_node(
    tree: &ResourceTree,
    node: &ResourceNode,
    view_grants: &HashMap<ResourceNodeId, bool>,
) -> Option<NavNode> {
    let children: Vec<NavNode> = tree
        .children(node.id)
        .filter_map(|child| project_node(tree, child, view_grants))
        .collect();

    let viewable = view_grants.get(&node.id).copied().unwrap_or(false);
    if !viewable && children.is_empty() {
        return None;
    }

    Some(NavNode {
        id: node.id,
        url_path: node.url_path.to_string(),
        label: node.label.clone(),
        icon: node.icon.clone(),
        clickable: viewable,
        children,
    })
}

/// The `view` column of a group's matrix row.
pub fn view_grants(grants: &[Grant]) -> HashMap<ResourceNodeId, bool> {
    grants
        .iter()
        .map(|g| (g.resource_id, g.flags.view))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UrlPath;
    use proptest::prelude::*;

    fn node(path: &str, parent: Option<ResourceNodeId>) -> ResourceNode {
        ResourceNode::new(ResourceNodeId::new(), UrlPath::new(path).unwrap(), parent, path)
    }

    /// A -> B -> C
    fn chain() -> (ResourceTree, [ResourceNodeId; 3]) {
        let a = node("a", None);
        let b = node("a/b", Some(a.id));
        let c = node("a/b/c", Some(b.id));
        let ids = [a.id, b.id, c.id];
        (ResourceTree::new(vec![a, b, c]).unwrap(), ids)
    }

    fn ids(nodes: &[NavNode]) -> Vec<ResourceNodeId> {
        let mut out = Vec::new();
        for n in nodes {
            out.push(n.id);
            out.extend(ids(&n.children));
        }
        out
    }

    #[test]
    fn visible_leaf_keeps_its_ancestors() {
        let (tree, [a, b, c]) = chain();
        let grants = HashMap::from([(c, true)]);

        let menu = project(&tree, &grants);
        assert_eq!(ids(&menu), vec![a, b, c]);
        assert!(!menu[0].clickable);
        assert!(!menu[0].children[0].clickable);
        assert!(menu[0].children[0].children[0].clickable);
    }

    #[test]
    fn visible_root_alone_drops_hidden_descendants() {
        let (tree, [a, b, c]) = chain();
        let grants = HashMap::from([(a, true), (b, false), (c, false)]);

        let menu = project(&tree, &grants);
        assert_eq!(ids(&menu), vec![a]);
        assert!(menu[0].children.is_empty());
    }

    #[test]
    fn nothing_granted_projects_to_empty() {
        let (tree, _) = chain();
        assert!(project(&tree, &HashMap::new()).is_empty());
    }

    #[test]
    fn sibling_order_is_preserved() {
        let root = node("root", None);
        let kids: Vec<_> = ["z", "a", "m"]
            .iter()
            .map(|p| node(&format!("root/{p}"), Some(root.id)))
            .collect();
        let mut nodes = vec![root];
        nodes.extend(kids.iter().cloned());
        let tree = ResourceTree::new(nodes).unwrap();
        let grants: HashMap<_, _> = kids.iter().map(|k| (k.id, true)).collect();

        let menu = project(&tree, &grants);
        let labels: Vec<_> = menu[0].children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["root/z", "root/a", "root/m"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: projection is a pure function of (tree, grants), and every
        /// surviving node is either viewable or has a surviving child.
        #[test]
        fn projection_is_idempotent_and_minimal(
            parents in prop::collection::vec(any::<prop::sample::Index>(), 1..24),
            views in prop::collection::vec(any::<bool>(), 24),
        ) {
            // Node i picks a parent among 0..i, or none; always a forest.
            let mut nodes: Vec<ResourceNode> = Vec::new();
            for (i, pick) in parents.iter().enumerate() {
                let choice = pick.index(i + 1);
                let parent = if choice == i { None } else { Some(nodes[choice].id) };
                nodes.push(node(&format!("n{i}"), parent));
            }
            let grants: HashMap<_, _> = nodes
                .iter()
                .zip(views.iter())
                .map(|(n, v)| (n.id, *v))
                .collect();
            let tree = ResourceTree::new(nodes).unwrap();

            let first = project(&tree, &grants);
            let second = project(&tree, &grants);
            prop_assert_eq!(&first, &second);

            fn check(nodes: &[NavNode], grants: &HashMap<ResourceNodeId, bool>) -> bool {
                nodes.iter().all(|n| {
                    let own = grants.get(&n.id).copied().unwrap_or(false);
                    n.clickable == own && (own || !n.children.is_empty()) && check(&n.children, grants)
                })
            }
            prop_assert!(check(&first, &grants));

            for (id, visible) in &grants {
                if *visible {
                    prop_assert!(ids(&first).contains(id));
                }
            }
        }
    }
}
