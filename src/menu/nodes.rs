use serde::{
    Deserialize,
    Serialize
};

/// Index of a node in a `NodeGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(pub usize);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub title: String,
    pub description: String,
    pub properties: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub handle: NodeHandle,
    pub info: NodeInfo,
}

/// Arena owning every graph node; menus refer to nodes by handle.
#[derive(Debug, Default)]
pub struct NodeGraph {
    nodes: Vec<Node>,
}

impl NodeInfo {
    pub fn new<S: AsRef<str>>(title: S, description: S) -> Self {
        Self {
            title: title.as_ref().to_string(),
            description: description.as_ref().to_string(),
            properties: vec![],
        }
    }

    pub fn with_property<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        self.properties.push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, info: NodeInfo) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(Node { handle, info });
        handle
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}

#[test]
fn test_node_handles_are_indices() {
    let mut graph = NodeGraph::new();
    let a = graph.add(NodeInfo::new("Host", "Compromised host"));
    let b = graph.add(NodeInfo::new("User", "Affected account").with_property("risk", "high"));

    assert_eq!(a, NodeHandle(0));
    assert_eq!(b, NodeHandle(1));
    assert_eq!(graph.get(b).unwrap().info.properties, vec![("risk".to_string(), "high".to_string())]);
    assert!(graph.get(NodeHandle(2)).is_none());
}
