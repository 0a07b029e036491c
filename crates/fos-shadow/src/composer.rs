//! Tree composition
//!
//! Resolves every insertion point of one host, across all of its shadow
//! roots. The newest root distributes first; a `<shadow>` point in it hands
//! the leftover pool to the next older root, which distributes what is left.

use crate::distributor::{insertion_points, Distributions, Distributor, Pool};
use crate::{AttributeSet, SelectorCache, ShadowError, ShadowResult};
use fos_dom::{DomTree, NodeId, NodeKind};

/// Drives distribution for one host at a time
pub struct Composer<'a> {
    tree: &'a DomTree,
    distributions: &'a mut Distributions,
    selectors: &'a mut SelectorCache,
}

impl<'a> Composer<'a> {
    pub fn new(
        tree: &'a DomTree,
        distributions: &'a mut Distributions,
        selectors: &'a mut SelectorCache,
    ) -> Self {
        Self {
            tree,
            distributions,
            selectors,
        }
    }

    /// Build the host's pool and distribute it through the shadow-root chain.
    ///
    /// Attribute names read by `select` predicates are added to `attributes`.
    pub fn tree_composition(
        &mut self,
        host: NodeId,
        attributes: &mut AttributeSet,
    ) -> ShadowResult<()> {
        let tree = self.tree;
        let mut roots = tree.shadow_roots(host);
        let mut subject = roots.next().ok_or(ShadowError::NotAHost(host))?;
        let reached = tree
            .shadow_roots(host)
            .flat_map(|root| insertion_points(tree, root))
            .collect();
        self.distributions.set_scope(host, reached);
        let mut pool = Pool::new(self.initial_pool(host));

        loop {
            let shadow_point = insertion_points(tree, subject)
                .into_iter()
                .find(|&point| tree.kind(point) == NodeKind::Shadow);

            Distributor::new(tree, self.distributions, self.selectors, attributes)
                .distribute(subject, &mut pool);

            let (Some(point), Some(older)) = (shadow_point, roots.next()) else {
                break;
            };
            self.distributions.bind(point, older);
            self.distributions.set(point, pool.remaining());
            subject = older;
        }

        tracing::trace!(%host, dropped = pool.remaining_count(), "composed");
        Ok(())
    }

    /// Host children, with insertion points of an enclosing shadow tree
    /// replaced by what they currently resolve to
    fn initial_pool(&self, host: NodeId) -> Vec<NodeId> {
        let mut pool = Vec::new();
        for (child, _) in self.tree.children(host) {
            if self.tree.is_insertion_point(child) {
                let record = self.distributions.get(child);
                if record.is_empty() {
                    pool.extend(self.tree.children(child).map(|(id, _)| id));
                } else {
                    pool.extend_from_slice(record);
                }
            } else {
                pool.push(child);
            }
        }
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(tree: &DomTree, host: NodeId, distributions: &mut Distributions) {
        let mut selectors = SelectorCache::new();
        let mut attributes = AttributeSet::new();
        Composer::new(tree, distributions, &mut selectors)
            .tree_composition(host, &mut attributes)
            .unwrap();
    }

    #[test]
    fn test_not_a_host() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let mut distributions = Distributions::new();
        let mut selectors = SelectorCache::new();
        let result = Composer::new(&tree, &mut distributions, &mut selectors)
            .tree_composition(div, &mut AttributeSet::new());
        assert_eq!(result, Err(ShadowError::NotAHost(div)));
    }

    #[test]
    fn test_shadow_point_hands_leftovers_to_older_root() {
        let mut tree = DomTree::new();
        let host = tree.create_element("x-host");
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        tree.append_child(host, a).unwrap();
        tree.append_child(host, b).unwrap();

        let older = tree.attach_shadow(host).unwrap();
        let old_content = tree.create_element("content");
        tree.append_child(older, old_content).unwrap();

        let newer = tree.attach_shadow(host).unwrap();
        let new_content = tree.create_element("content");
        tree.set_attribute(new_content, "select", "b").unwrap();
        let shadow = tree.create_element("shadow");
        tree.append_child(newer, new_content).unwrap();
        tree.append_child(newer, shadow).unwrap();

        let mut distributions = Distributions::new();
        compose(&tree, host, &mut distributions);

        assert_eq!(distributions.get(new_content), &[b]);
        assert_eq!(distributions.binding(shadow), Some(older));
        assert_eq!(distributions.get(shadow), &[a]);
        assert_eq!(distributions.get(old_content), &[a]);
    }

    #[test]
    fn test_shadow_point_in_oldest_root_takes_pool() {
        let mut tree = DomTree::new();
        let host = tree.create_element("x-host");
        let a = tree.create_element("a");
        tree.append_child(host, a).unwrap();
        let root = tree.attach_shadow(host).unwrap();
        let shadow = tree.create_element("shadow");
        tree.append_child(root, shadow).unwrap();

        let mut distributions = Distributions::new();
        compose(&tree, host, &mut distributions);

        assert_eq!(distributions.binding(shadow), None);
        assert_eq!(distributions.get(shadow), &[a]);
    }

    #[test]
    fn test_detached_point_loses_its_record() {
        let mut tree = DomTree::new();
        let host = tree.create_element("x-host");
        let a = tree.create_element("a");
        tree.append_child(host, a).unwrap();
        let root = tree.attach_shadow(host).unwrap();
        let first = tree.create_element("content");
        let second = tree.create_element("content");
        tree.append_child(root, first).unwrap();
        tree.append_child(root, second).unwrap();

        let mut distributions = Distributions::new();
        compose(&tree, host, &mut distributions);
        assert_eq!(distributions.get(first), &[a]);

        tree.remove_child(root, first).unwrap();
        compose(&tree, host, &mut distributions);
        assert!(distributions.get(first).is_empty());
        assert_eq!(distributions.get(second), &[a]);
        assert_eq!(distributions.len(), 1);
    }

    #[test]
    fn test_pool_substitutes_outer_insertion_points() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("x-outer");
        let x = tree.create_element("span");
        tree.append_child(outer, x).unwrap();
        let outer_root = tree.attach_shadow(outer).unwrap();

        // Nested host whose light children are an insertion point of the
        // outer tree
        let inner = tree.create_element("x-inner");
        let reprojected = tree.create_element("content");
        let fallback = tree.create_element("content");
        tree.set_attribute(fallback, "select", "p").unwrap();
        let fallback_child = tree.create_text("none");
        tree.append_child(fallback, fallback_child).unwrap();
        tree.append_child(inner, reprojected).unwrap();
        tree.append_child(inner, fallback).unwrap();
        tree.append_child(outer_root, inner).unwrap();

        let inner_root = tree.attach_shadow(inner).unwrap();
        let sink = tree.create_element("content");
        tree.append_child(inner_root, sink).unwrap();

        let mut distributions = Distributions::new();
        compose(&tree, outer, &mut distributions);
        assert_eq!(distributions.get(reprojected), &[x]);
        assert!(distributions.get(fallback).is_empty());

        compose(&tree, inner, &mut distributions);
        assert_eq!(distributions.get(sink), &[x, fallback_child]);
    }
}
