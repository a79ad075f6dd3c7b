//! Relationship sets shared by networks and domains.
//!
//! A [`RelationshipSet`] views the ordered edge collection of a Domain or
//! Network object (plus any objects extending it through
//! `extendTargetName`) and answers from/to, root and traversal queries. The
//! from/to indices are built once per owner and memoized on the object.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use crate::model::{ObjectId, ObjectKind, QName, TaxonomyModel, TaxonomyObject};

/// From/to multimaps over a relationship collection, children sorted by
/// `order` with ties kept in source order.
#[derive(Debug, Default)]
pub struct RelationshipIndex {
    all: Vec<ObjectId>,
    from: HashMap<QName, Vec<ObjectId>>,
    to: HashMap<QName, Vec<ObjectId>>,
}

/// One visited node of a depth-first traversal.
#[derive(Clone, Debug)]
pub struct TraversalStep<'a> {
    pub node: QName,
    pub depth: usize,
    /// The edge that led here; `None` for the start node.
    pub relationship: Option<&'a TaxonomyObject>,
    /// The node was already on the current path; traversal stopped here.
    pub is_loop: bool,
}

pub fn edge_source(rel: &TaxonomyObject) -> Option<&QName> {
    rel.qname("source")
}

pub fn edge_target(rel: &TaxonomyObject) -> Option<&QName> {
    rel.qname("target")
}

fn edge_order(rel: &TaxonomyObject) -> f64 {
    rel.number("order").unwrap_or(0.0)
}

/// Query view over the relationships owned by one Domain or Network.
pub struct RelationshipSet<'a> {
    model: &'a TaxonomyModel,
    owner: &'a TaxonomyObject,
    index: &'a RelationshipIndex,
}

impl<'a> RelationshipSet<'a> {
    pub fn new(model: &'a TaxonomyModel, owner: &'a TaxonomyObject) -> Self {
        let index = owner
            .cache
            .relationships
            .get_or_init(|| build_index(model, owner));
        Self {
            model,
            owner,
            index,
        }
    }

    pub fn owner(&self) -> &'a TaxonomyObject {
        self.owner
    }

    /// All edges in source order, the owner's first, then extensions.
    pub fn relationships(&self) -> impl Iterator<Item = &'a TaxonomyObject> + '_ {
        self.index.all.iter().map(|id| self.model.object(*id))
    }

    pub fn len(&self) -> usize {
        self.index.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.all.is_empty()
    }

    pub fn relationships_from(&self, node: &QName) -> Vec<&'a TaxonomyObject> {
        self.resolve(self.index.from.get(node))
    }

    pub fn relationships_to(&self, node: &QName) -> Vec<&'a TaxonomyObject> {
        self.resolve(self.index.to.get(node))
    }

    fn resolve(&self, ids: Option<&Vec<ObjectId>>) -> Vec<&'a TaxonomyObject> {
        let model = self.model;
        ids.map(|ids| ids.iter().map(|id| model.object(*id)).collect())
            .unwrap_or_default()
    }

    /// Explicitly declared roots (`roots` on a network, `root` on a domain).
    pub fn declared_roots(&self) -> Vec<QName> {
        match self.owner.kind() {
            ObjectKind::Domain => self.owner.qname("root").cloned().into_iter().collect(),
            _ => self.owner.qnames("roots").to_vec(),
        }
    }

    /// Declared roots when present, otherwise [`inferred_roots`](Self::inferred_roots).
    pub fn roots(&self) -> Vec<QName> {
        let declared = self.declared_roots();
        if declared.is_empty() {
            self.inferred_roots()
        } else {
            declared
        }
    }

    /// Sources with no incoming edge, in first-appearance order. A node
    /// whose only incoming edges are self-loops still counts as a root.
    pub fn inferred_roots(&self) -> Vec<QName> {
        let mut seen = HashSet::new();
        let mut roots = Vec::new();
        for rel in self.relationships() {
            let Some(source) = edge_source(rel) else {
                continue;
            };
            if !seen.insert(source.clone()) {
                continue;
            }
            let has_incoming = self
                .relationships_to(source)
                .iter()
                .any(|r| edge_source(r) != Some(source));
            if !has_incoming {
                roots.push(source.clone());
            }
        }
        roots
    }

    /// Depth-first walk from `start`. The visited set is per path, so a node
    /// reachable through several branches is listed under each of them; a
    /// node already on the current path is emitted with `is_loop` and not
    /// expanded.
    pub fn traverse(&self, start: &QName) -> Vec<TraversalStep<'a>> {
        let mut steps = vec![TraversalStep {
            node: start.clone(),
            depth: 0,
            relationship: None,
            is_loop: false,
        }];
        let mut path = HashSet::new();
        path.insert(start.clone());
        self.walk(start, 1, &mut path, &mut steps);
        steps
    }

    fn walk(
        &self,
        node: &QName,
        depth: usize,
        path: &mut HashSet<QName>,
        steps: &mut Vec<TraversalStep<'a>>,
    ) {
        for rel in self.relationships_from(node) {
            let Some(target) = edge_target(rel) else {
                continue;
            };
            if path.contains(target) {
                steps.push(TraversalStep {
                    node: target.clone(),
                    depth,
                    relationship: Some(rel),
                    is_loop: true,
                });
                continue;
            }
            steps.push(TraversalStep {
                node: target.clone(),
                depth,
                relationship: Some(rel),
                is_loop: false,
            });
            path.insert(target.clone());
            self.walk(target, depth + 1, path, steps);
            path.remove(target);
        }
    }

    /// Traversal from every root, concatenated.
    pub fn traverse_all(&self) -> Vec<TraversalStep<'a>> {
        self.roots()
            .iter()
            .flat_map(|root| self.traverse(root))
            .collect()
    }

    /// Indented text rendering of [`traverse_all`](Self::traverse_all).
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        for step in self.traverse_all() {
            let _ = write!(out, "{}{}", "  ".repeat(step.depth), step.node);
            if step.is_loop {
                out.push_str(" (loop)");
            }
            out.push('\n');
        }
        out
    }

    /// A node on some directed cycle, if any.
    pub fn find_cycle(&self) -> Option<QName> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        fn visit(
            set: &RelationshipSet<'_>,
            node: &QName,
            marks: &mut HashMap<QName, Mark>,
        ) -> Option<QName> {
            marks.insert(node.clone(), Mark::Active);
            for rel in set.relationships_from(node) {
                let Some(target) = edge_target(rel) else {
                    continue;
                };
                match marks.get(target) {
                    Some(Mark::Active) => return Some(target.clone()),
                    Some(Mark::Done) => {}
                    None => {
                        if let Some(found) = visit(set, target, marks) {
                            return Some(found);
                        }
                    }
                }
            }
            marks.insert(node.clone(), Mark::Done);
            None
        }

        let mut marks = HashMap::new();
        for rel in self.relationships() {
            let Some(source) = edge_source(rel) else {
                continue;
            };
            if marks.contains_key(source) {
                continue;
            }
            if let Some(found) = visit(self, source, &mut marks) {
                return Some(found);
            }
        }
        None
    }

    /// A node on some cycle when edge direction is ignored, if any.
    pub fn find_undirected_cycle(&self) -> Option<QName> {
        let mut ids: HashMap<&QName, usize> = HashMap::new();
        let mut parent: Vec<usize> = Vec::new();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        for rel in self.relationships() {
            let (Some(source), Some(target)) = (edge_source(rel), edge_target(rel)) else {
                continue;
            };
            let mut slot = |q: &'a QName| {
                *ids.entry(q).or_insert_with(|| {
                    parent.push(parent.len());
                    parent.len() - 1
                })
            };
            let a = slot(source);
            let b = slot(target);
            let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
            if ra == rb {
                return Some(target.clone());
            }
            parent[ra] = rb;
        }
        None
    }
}

/// Objects of the owner's kind that extend it by name.
pub fn extensions<'a>(
    model: &'a TaxonomyModel,
    owner: &'a TaxonomyObject,
) -> impl Iterator<Item = &'a TaxonomyObject> + 'a {
    let name = owner.name();
    model.objects_of_kind(owner.kind()).filter(move |o| {
        o.id() != owner.id() && name.is_some() && o.qname("extendTargetName") == name
    })
}

fn build_index(model: &TaxonomyModel, owner: &TaxonomyObject) -> RelationshipIndex {
    let mut index = RelationshipIndex::default();
    let owned = owner.children("relationships").iter().copied();
    let extended = extensions(model, owner).flat_map(|ext| ext.children("relationships").iter().copied());
    index.all = owned
        .chain(extended)
        .filter(|id| model.get(*id).is_some())
        .collect();

    for id in &index.all {
        let rel = model.object(*id);
        if let Some(source) = edge_source(rel) {
            index.from.entry(source.clone()).or_default().push(*id);
        }
        if let Some(target) = edge_target(rel) {
            index.to.entry(target.clone()).or_default().push(*id);
        }
    }
    for ids in index.from.values_mut() {
        ids.sort_by(|a, b| edge_order(model.object(*a)).total_cmp(&edge_order(model.object(*b))));
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{NoImports, TaxonomyBuilder};
    use serde_json::json;

    fn network(relationships: serde_json::Value, roots: Option<Vec<&str>>) -> TaxonomyModel {
        let mut network = json!({
            "name": "ex:Net",
            "relationshipTypeName": "xbrl:parent-child",
            "relationships": relationships,
        });
        if let Some(roots) = roots {
            network["roots"] = json!(roots);
        }
        let doc = json!({
            "documentInfo": {
                "documentType": "https://xbrl.org/2025/taxonomy",
                "namespaces": {"ex": "http://example.com/ex", "xbrl": "https://xbrl.org/2025"}
            },
            "taxonomy": {"name": "ex:T", "networks": [network]}
        });
        TaxonomyBuilder::new(&NoImports)
            .build(&doc, "test.json")
            .unwrap()
            .model
    }

    fn q(local: &str) -> QName {
        QName::new("http://example.com/ex", local)
    }

    fn set(model: &TaxonomyModel) -> RelationshipSet<'_> {
        let owner = model.lookup(&q("Net")).unwrap();
        RelationshipSet::new(model, owner)
    }

    fn edge(s: &str, t: &str) -> serde_json::Value {
        json!({"source": format!("ex:{s}"), "target": format!("ex:{t}")})
    }

    #[test]
    fn test_cycle_traversal_terminates() {
        let model = network(json!([edge("A", "B"), edge("B", "A")]), None);
        let rels = set(&model);
        let steps = rels.traverse(&q("A"));
        let visited: Vec<_> = steps
            .iter()
            .map(|s| (s.node.local_name().to_string(), s.is_loop))
            .collect();
        assert_eq!(
            visited,
            vec![
                ("A".to_string(), false),
                ("B".to_string(), false),
                ("A".to_string(), true)
            ]
        );
        assert!(rels.find_cycle().is_some());
    }

    #[test]
    fn test_per_path_visited_allows_shared_children() {
        let model = network(
            json!([edge("R", "A"), edge("R", "B"), edge("A", "C"), edge("B", "C")]),
            None,
        );
        let rels = set(&model);
        let steps = rels.traverse(&q("R"));
        let c_count = steps.iter().filter(|s| s.node == q("C")).count();
        assert_eq!(c_count, 2);
        assert!(steps.iter().all(|s| !s.is_loop));
        assert!(rels.find_cycle().is_none());
        assert!(rels.find_undirected_cycle().is_some());
    }

    #[test]
    fn test_inferred_roots_and_self_loop() {
        let model = network(json!([edge("S", "S"), edge("R", "A")]), None);
        let rels = set(&model);
        assert_eq!(rels.inferred_roots(), vec![q("S"), q("R")]);
    }

    #[test]
    fn test_declared_roots_win() {
        let model = network(json!([edge("R", "A"), edge("A", "B")]), Some(vec!["ex:X"]));
        let rels = set(&model);
        assert_eq!(rels.roots(), vec![q("X")]);
        assert_eq!(rels.inferred_roots(), vec![q("R")]);
    }

    #[test]
    fn test_children_sorted_by_order() {
        let model = network(
            json!([
                {"source": "ex:R", "target": "ex:Second", "order": 2},
                {"source": "ex:R", "target": "ex:First", "order": 1},
                {"source": "ex:R", "target": "ex:Third", "order": 2}
            ]),
            None,
        );
        let rels = set(&model);
        let targets: Vec<_> = rels
            .relationships_from(&q("R"))
            .iter()
            .filter_map(|r| edge_target(r).map(|t| t.local_name().to_string()))
            .collect();
        assert_eq!(targets, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_render_tree_marks_loops() {
        let model = network(json!([edge("A", "B"), edge("B", "A")]), None);
        let rendered = set(&model).render_tree();
        // A is both source and target, so there is no inferred root.
        assert_eq!(rendered, "");

        let rels = set(&model);
        let steps = rels.traverse(&q("A"));
        assert!(steps.last().is_some_and(|s| s.is_loop && s.depth == 2));
    }
}
