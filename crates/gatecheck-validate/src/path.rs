//! Violation location paths.
//!
//! A [`PropertyPath`] is the ordered list of [`PathNode`]s leading from the
//! validated root (a method, a constructor, or a bean) down to the element
//! that failed a constraint. The last node is the *leaf*: its
//! [`ElementKind`] tells where in the call signature the violation occurred.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of program element a path node designates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementKind {
    /// A whole bean (class-level constraint)
    Bean,
    /// A property of a bean
    Property,
    /// A method
    Method,
    /// A constructor
    Constructor,
    /// A single method or constructor parameter
    Parameter,
    /// All parameters of an executable taken together
    CrossParameter,
    /// The return value of a method or constructor
    ReturnValue,
    /// An element of a container (list item, map value)
    ContainerElement,
}

impl ElementKind {
    /// Name used in diagnostics, e.g. `RETURN_VALUE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Bean => "BEAN",
            ElementKind::Property => "PROPERTY",
            ElementKind::Method => "METHOD",
            ElementKind::Constructor => "CONSTRUCTOR",
            ElementKind::Parameter => "PARAMETER",
            ElementKind::CrossParameter => "CROSS_PARAMETER",
            ElementKind::ReturnValue => "RETURN_VALUE",
            ElementKind::ContainerElement => "CONTAINER_ELEMENT",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a node inside the container held by the preceding node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerPosition {
    /// Index into a list
    Index(usize),
    /// Key into a map
    Key(String),
}

impl fmt::Display for ContainerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerPosition::Index(i) => write!(f, "[{}]", i),
            ContainerPosition::Key(k) => write!(f, "[{}]", k),
        }
    }
}

/// One segment of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathNode {
    name: String,
    kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameter_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<ContainerPosition>,
}

impl PathNode {
    fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parameter_index: None,
            position: None,
        }
    }

    /// Root node for a bean; renders as an empty segment.
    pub fn bean() -> Self {
        Self::new("", ElementKind::Bean)
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Property)
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Method)
    }

    pub fn constructor(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Constructor)
    }

    /// A parameter node. This is the only kind carrying a parameter index.
    pub fn parameter(name: impl Into<String>, index: usize) -> Self {
        Self {
            parameter_index: Some(index),
            ..Self::new(name, ElementKind::Parameter)
        }
    }

    pub fn cross_parameter() -> Self {
        Self::new("<cross-parameter>", ElementKind::CrossParameter)
    }

    pub fn return_value() -> Self {
        Self::new("<return value>", ElementKind::ReturnValue)
    }

    pub fn container_element() -> Self {
        Self::new("<list element>", ElementKind::ContainerElement)
    }

    /// Place this node at `position` inside the preceding node's container.
    pub fn at(mut self, position: ContainerPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn at_index(self, index: usize) -> Self {
        self.at(ContainerPosition::Index(index))
    }

    pub fn at_key(self, key: impl Into<String>) -> Self {
        self.at(ContainerPosition::Key(key.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Index of the parameter, `Some` only for [`ElementKind::Parameter`].
    pub fn parameter_index(&self) -> Option<usize> {
        self.parameter_index
    }

    pub fn position(&self) -> Option<&ContainerPosition> {
        self.position.as_ref()
    }
}

/// Ordered location of a violation, from root to leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyPath {
    nodes: Vec<PathNode>,
}

impl PropertyPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<PathNode>) -> Self {
        Self { nodes }
    }

    /// Return a copy of this path extended by `node`.
    pub fn child(&self, node: PathNode) -> Self {
        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        nodes.extend(self.nodes.iter().cloned());
        nodes.push(node);
        Self { nodes }
    }

    pub fn push(&mut self, node: PathNode) {
        self.nodes.push(node);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertyPath {
    type Item = &'a PathNode;
    type IntoIter = std::slice::Iter<'a, PathNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl FromIterator<PathNode> for PropertyPath {
    fn from_iter<I: IntoIterator<Item = PathNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in &self.nodes {
            if let Some(position) = &node.position {
                write!(f, "{}", position)?;
            }
            if node.name.is_empty() {
                continue;
            }
            if !first {
                f.write_str(".")?;
            }
            f.write_str(&node.name)?;
            first = false;
        }
        Ok(())
    }
}
