//! vane-router: Zero-dependency Radix Trie path matcher
//!
//! The matcher behind vane-core's dispatch. It maps `(method, pattern)`
//! bindings to an arbitrary value and resolves `(method, path)` lookups
//! to the bound value plus the captured path parameters.
//!
//! ## Features
//! - O(k) path lookup where k = path length
//! - Static paths: `/users`, `/api/v1/health`
//! - Parameters: `/users/:id`, `/posts/:postId/comments/:commentId`
//! - Wildcards: `/files/*path`, `/static/*`
//! - Dynamic add and remove of bindings
//! - Zero external dependencies
//!
//! ## Path Syntax
//! - `:name` - Named parameter (captures one segment)
//! - `*` or `*name` - Wildcard (captures remaining path)
//!
//! ## Priority
//! 1. Exact static match (highest)
//! 2. Parameter match
//! 3. Wildcard match (lowest)
//!
//! ## Example
//! ```
//! use vane_router::PathMatcher;
//!
//! let mut matcher = PathMatcher::new();
//! matcher.insert("GET", "/users", "list");
//! matcher.insert("GET", "/users/:id", "show");
//! matcher.insert("GET", "/files/*path", "files");
//!
//! let m = matcher.find("GET", "/users/123").unwrap();
//! assert_eq!(*m.value, "show");
//! assert_eq!(m.params, vec![("id".to_string(), "123".to_string())]);
//!
//! assert_eq!(matcher.remove("GET", "/users/:id"), Some("show"));
//! assert!(matcher.find("GET", "/users/123").is_none());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Route match result
#[derive(Debug, Clone, PartialEq)]
pub struct Match<V> {
    /// The bound value
    pub value: V,
    /// Captured path parameters as (name, value) pairs, in path order
    pub params: Vec<(String, String)>,
}

impl<V> Match<V> {
    /// Get params as HashMap for convenient access
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params.iter().cloned().collect()
    }
}

/// A bound value plus the parameter names of the pattern that bound it
///
/// Names live here rather than on the trie nodes, so sibling patterns such
/// as `/users/:id` and `/users/:userId/posts` keep their own names.
#[derive(Debug, Clone)]
struct Leaf<T> {
    /// Parameter names in path order, wildcard name last
    names: Vec<String>,
    value: T,
}

impl<T> Leaf<T> {
    fn to_match(&self, captured: &[String]) -> Match<&T> {
        Match {
            value: &self.value,
            params: self
                .names
                .iter()
                .cloned()
                .zip(captured.iter().cloned())
                .collect(),
        }
    }
}

/// Trie node for path segment matching
#[derive(Debug, Clone)]
struct Node<T> {
    /// Static children (key = path segment)
    children: HashMap<String, Node<T>>,
    /// Parameter child (:id)
    param_child: Option<Box<Node<T>>>,
    /// Wildcard child (*path), always terminal
    wildcard_child: Option<Box<Leaf<T>>>,
    /// Binding ending at this node
    leaf: Option<Leaf<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            param_child: None,
            wildcard_child: None,
            leaf: None,
        }
    }
}

impl<T> Node<T> {
    fn is_empty(&self) -> bool {
        self.leaf.is_none()
            && self.children.is_empty()
            && self.param_child.is_none()
            && self.wildcard_child.is_none()
    }

    /// Collect the name each binding below gives to the parameter at `position`
    fn param_names_at(&self, position: usize, out: &mut BTreeSet<String>) {
        let leaves = self.leaf.iter().chain(self.wildcard_child.as_deref());
        for leaf in leaves {
            if let Some(name) = leaf.names.get(position) {
                out.insert(name.clone());
            }
        }
        for child in self.children.values() {
            child.param_names_at(position, out);
        }
        if let Some(param) = self.param_child.as_deref() {
            param.param_names_at(position, out);
        }
    }
}

/// Zero-dependency Radix Trie path matcher
///
/// Bindings are organized by HTTP method for O(1) method dispatch,
/// then matched using a radix trie for O(k) path matching.
#[derive(Debug, Clone)]
pub struct PathMatcher<T> {
    /// Method -> Trie root
    trees: HashMap<String, Node<T>>,
    /// Number of bindings across all methods
    len: usize,
}

impl<T> Default for PathMatcher<T> {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
            len: 0,
        }
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Parameter names of a pattern, in path order; a bare `*` is named `*`
fn pattern_names(segments: &[&str]) -> Vec<String> {
    let mut names = Vec::new();
    for segment in segments {
        if let Some(name) = segment.strip_prefix(':') {
            names.push(name.to_string());
        } else if let Some(name) = segment.strip_prefix('*') {
            names.push(if name.is_empty() { "*" } else { name }.to_string());
            break;
        }
    }
    names
}

impl<T> PathMatcher<T> {
    /// Create an empty matcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value to a method and path pattern
    ///
    /// Returns the previously bound value when the same `(method, pattern)`
    /// pair was already bound. Parameter names do not take part in that
    /// comparison; the new pattern's names replace the old ones.
    ///
    /// # Example
    /// ```
    /// use vane_router::PathMatcher;
    ///
    /// let mut matcher = PathMatcher::new();
    /// assert_eq!(matcher.insert("GET", "/users/:id", 0), None);
    /// assert_eq!(matcher.insert("GET", "/users/:id", 1), Some(0));
    /// ```
    pub fn insert(&mut self, method: &str, pattern: &str, value: T) -> Option<T> {
        let tree = self.trees.entry(method.to_uppercase()).or_default();
        let segments = split_segments(pattern);
        let leaf = Leaf {
            names: pattern_names(&segments),
            value,
        };
        let replaced = Self::insert_node(tree, &segments, leaf);
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    fn insert_node(node: &mut Node<T>, segments: &[&str], leaf: Leaf<T>) -> Option<T> {
        let Some((&segment, rest)) = segments.split_first() else {
            return node.leaf.replace(leaf).map(|old| old.value);
        };

        if segment.starts_with(':') {
            // Parameter segment (:id, :userId, etc.)
            let param = node.param_child.get_or_insert_with(Box::default);
            Self::insert_node(param, rest, leaf)
        } else if segment.starts_with('*') {
            // Wildcard segment (*path or bare *), swallows the rest of the pattern
            node.wildcard_child
                .replace(Box::new(leaf))
                .map(|old| old.value)
        } else {
            // Static segment
            let child = node.children.entry(segment.to_string()).or_default();
            Self::insert_node(child, rest, leaf)
        }
    }

    /// Remove the binding for an exact method and path pattern
    ///
    /// Returns the removed value, or `None` if nothing was bound there.
    /// Nodes left without bindings are pruned.
    pub fn remove(&mut self, method: &str, pattern: &str) -> Option<T> {
        let key = method.to_uppercase();
        let tree = self.trees.get_mut(&key)?;
        let segments = split_segments(pattern);
        let removed = Self::remove_node(tree, &segments);
        if removed.is_some() {
            self.len -= 1;
            if tree.is_empty() {
                self.trees.remove(&key);
            }
        }
        removed
    }

    fn remove_node(node: &mut Node<T>, segments: &[&str]) -> Option<T> {
        let Some((&segment, rest)) = segments.split_first() else {
            return node.leaf.take().map(|leaf| leaf.value);
        };

        if segment.starts_with(':') {
            let param = node.param_child.as_mut()?;
            let removed = Self::remove_node(param, rest);
            if param.is_empty() {
                node.param_child = None;
            }
            removed
        } else if segment.starts_with('*') {
            node.wildcard_child.take().map(|leaf| leaf.value)
        } else {
            let child = node.children.get_mut(segment)?;
            let removed = Self::remove_node(child, rest);
            if child.is_empty() {
                node.children.remove(segment);
            }
            removed
        }
    }

    /// Look up the value bound to an exact method and path pattern
    ///
    /// Unlike [`find`](Self::find) this compares pattern structure, so
    /// `/users/:id` and `/users/:user` name the same binding.
    pub fn get(&self, method: &str, pattern: &str) -> Option<&T> {
        let mut node = self.trees.get(&method.to_uppercase())?;
        for segment in split_segments(pattern) {
            if segment.starts_with(':') {
                node = node.param_child.as_deref()?;
            } else if segment.starts_with('*') {
                return node.wildcard_child.as_ref().map(|leaf| &leaf.value);
            } else {
                node = node.children.get(segment)?;
            }
        }
        node.leaf.as_ref().map(|leaf| &leaf.value)
    }

    /// Find a matching binding
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - URL path to match
    ///
    /// # Returns
    /// `Some(Match)` with the bound value and captured params, or `None` if no match
    ///
    /// # Example
    /// ```
    /// use vane_router::PathMatcher;
    ///
    /// let mut matcher = PathMatcher::new();
    /// matcher.insert("GET", "/users/:id", 0);
    ///
    /// let m = matcher.find("GET", "/users/42").unwrap();
    /// assert_eq!(*m.value, 0);
    /// assert_eq!(m.params[0], ("id".to_string(), "42".to_string()));
    /// ```
    pub fn find(&self, method: &str, path: &str) -> Option<Match<&T>> {
        let tree = self.trees.get(&method.to_uppercase())?;
        let segments = split_segments(path);
        let mut captured = Vec::new();
        Self::find_node(tree, &segments, &mut captured)
    }

    fn find_node<'a>(
        node: &'a Node<T>,
        segments: &[&str],
        captured: &mut Vec<String>,
    ) -> Option<Match<&'a T>> {
        let Some((&segment, rest)) = segments.split_first() else {
            return node.leaf.as_ref().map(|leaf| leaf.to_match(captured));
        };

        // Priority 1: Try exact static match (highest priority)
        if let Some(child) = node.children.get(segment) {
            if let Some(m) = Self::find_node(child, rest, captured) {
                return Some(m);
            }
        }

        // Priority 2: Try parameter match
        if let Some(param) = node.param_child.as_deref() {
            captured.push(segment.to_string());
            if let Some(m) = Self::find_node(param, rest, captured) {
                return Some(m);
            }
            captured.pop();
        }

        // Priority 3: Try wildcard match (lowest priority, captures everything)
        if let Some(wildcard) = node.wildcard_child.as_deref() {
            captured.push(segments.join("/"));
            return Some(wildcard.to_match(captured));
        }

        None
    }

    /// Check if a method has any bindings
    pub fn has_method(&self, method: &str) -> bool {
        self.trees.contains_key(&method.to_uppercase())
    }

    /// Get all methods with bindings, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.trees.keys().cloned().collect();
        methods.sort();
        methods
    }

    /// Number of bindings across all methods
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `position` counts the parameters above `node`
    fn fmt_node(
        f: &mut fmt::Formatter<'_>,
        node: &Node<T>,
        depth: usize,
        position: usize,
    ) -> fmt::Result {
        let indent = "  ".repeat(depth);

        let mut keys: Vec<&String> = node.children.keys().collect();
        keys.sort();
        for key in keys {
            let child = &node.children[key];
            writeln!(f, "{indent}{key}{}", bound_marker(child.leaf.is_some()))?;
            Self::fmt_node(f, child, depth + 1, position)?;
        }

        if let Some(param) = node.param_child.as_deref() {
            let mut names = BTreeSet::new();
            param.param_names_at(position, &mut names);
            let names: Vec<String> = names.into_iter().collect();
            writeln!(
                f,
                "{indent}:{}{}",
                names.join("|"),
                bound_marker(param.leaf.is_some())
            )?;
            Self::fmt_node(f, param, depth + 1, position + 1)?;
        }

        if let Some(wildcard) = node.wildcard_child.as_deref() {
            match wildcard.names.last().map(String::as_str) {
                Some("*") | None => writeln!(f, "{indent}*{}", bound_marker(true))?,
                Some(name) => writeln!(f, "{indent}*{name}{}", bound_marker(true))?,
            }
        }

        Ok(())
    }
}

fn bound_marker(bound: bool) -> &'static str {
    if bound {
        " [bound]"
    } else {
        ""
    }
}

/// Deterministic dump of the trie: methods sorted, then one line per node
/// with children indented under their parent. A parameter node lists every
/// name the bindings below it use, joined by `|`.
impl<T> fmt::Display for PathMatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for method in self.methods() {
            let tree = &self.trees[&method];
            writeln!(f, "{method} /{}", bound_marker(tree.leaf.is_some()))?;
            Self::fmt_node(f, tree, 1, 0)?;
        }
        Ok(())
    }
}
