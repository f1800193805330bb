//! Lazily loaded variable tree of a stack frame
//!
//! Back-ends address variables by path strings. Nodes live in an arena; the
//! path index and the parent/child edges are plain indices, so walking the
//! tree never re-parses paths.

use std::collections::HashMap;

use crate::backend::{Variable, VariableMap};

#[derive(Debug, Clone, PartialEq)]
struct Node {
    path: String,
    variable: Variable,
    parent: Option<usize>,
    /// Sorted by path
    children: Vec<usize>,
}

/// Arena of variable nodes indexed by path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTree {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    /// Top-level nodes (empty parent path), sorted by path
    roots: Vec<usize>,
}

impl VariableTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a flat map
    pub fn from_map(variables: VariableMap) -> Self {
        let mut tree = Self::new();
        tree.insert_all(variables);
        tree
    }

    /// Return a copy with `variables` merged in and the node at `loaded_path`
    /// marked as loaded
    ///
    /// Nodes already present are replaced. A node whose parent is not known
    /// yet is kept and linked once the parent arrives.
    pub fn merged(&self, variables: VariableMap, loaded_path: Option<&str>) -> Self {
        let mut tree = self.clone();
        tree.insert_all(variables);
        if let Some(path) = loaded_path {
            if let Some(&idx) = tree.index.get(path) {
                tree.nodes[idx].variable.loaded = true;
            }
        }
        tree
    }

    fn insert_all(&mut self, variables: VariableMap) {
        if variables.is_empty() {
            return;
        }
        for (path, variable) in variables {
            match self.index.get(&path) {
                Some(&idx) => self.nodes[idx].variable = variable,
                None => {
                    self.index.insert(path.clone(), self.nodes.len());
                    self.nodes.push(Node {
                        path,
                        variable,
                        parent: None,
                        children: Vec::new(),
                    });
                }
            }
        }
        self.relink();
    }

    fn relink(&mut self) {
        for node in &mut self.nodes {
            node.parent = None;
            node.children.clear();
        }
        self.roots.clear();

        for idx in 0..self.nodes.len() {
            let parent_path = self.nodes[idx].variable.parent_path.as_str();
            if parent_path.is_empty() {
                self.roots.push(idx);
                continue;
            }
            let parent = self.index.get(parent_path).copied();
            if let Some(parent) = parent {
                if parent != idx {
                    self.nodes[idx].parent = Some(parent);
                    self.nodes[parent].children.push(idx);
                }
            }
        }

        let nodes = &self.nodes;
        self.roots.sort_by(|a, b| nodes[*a].path.cmp(&nodes[*b].path));
        let mut children: Vec<Vec<usize>> =
            nodes.iter().map(|node| node.children.clone()).collect();
        for list in &mut children {
            list.sort_by(|a, b| nodes[*a].path.cmp(&nodes[*b].path));
        }
        for (node, list) in self.nodes.iter_mut().zip(children) {
            node.children = list;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Variable at `path`
    pub fn get(&self, path: &str) -> Option<&Variable> {
        self.index.get(path).map(|&idx| &self.nodes[idx].variable)
    }

    /// Path of the parent node, if the parent is present in the tree
    pub fn parent(&self, path: &str) -> Option<&str> {
        let idx = *self.index.get(path)?;
        self.nodes[idx]
            .parent
            .map(|parent| self.nodes[parent].path.as_str())
    }

    /// Top-level variables as `(path, variable)` in path order
    pub fn roots(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.roots.iter().map(|&idx| self.entry(idx))
    }

    /// Children of the node at `path` in path order
    pub fn children(&self, path: &str) -> Vec<(&str, &Variable)> {
        match self.index.get(path) {
            Some(&idx) => self.nodes[idx]
                .children
                .iter()
                .map(|&child| self.entry(child))
                .collect(),
            None => Vec::new(),
        }
    }

    fn entry(&self, idx: usize) -> (&str, &Variable) {
        let node = &self.nodes[idx];
        (node.path.as_str(), &node.variable)
    }
}
