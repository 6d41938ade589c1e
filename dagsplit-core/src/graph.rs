//! Arena for native values whose containers may be shared or cyclic.
//!
//! An owned [`Node`] tree can never reference an ancestor, but values coming
//! from outside (object graphs, language bindings, `$ref`-style documents) can.
//! `NodeGraph` holds such values as containers addressed by [`ContainerId`],
//! so the circularity guard can inspect them before anything is encoded.

use indexmap::IndexMap;

use crate::node::Node;

/// Index of a container inside a [`NodeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub(crate) usize);

impl ContainerId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A child entry: either an inline value or a reference to another container.
#[derive(Debug, Clone)]
pub enum Slot {
    Node(Node),
    Container(ContainerId),
}

impl From<Node> for Slot {
    fn from(node: Node) -> Self {
        Slot::Node(node)
    }
}

impl From<ContainerId> for Slot {
    fn from(id: ContainerId) -> Self {
        Slot::Container(id)
    }
}

#[derive(Debug, Clone)]
pub enum Container {
    List(Vec<Slot>),
    Map(IndexMap<String, Slot>),
}

impl Container {
    /// Returns the child at position `index`, in insertion order.
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        match self {
            Container::List(items) => items.get(index),
            Container::Map(map) => map.get_index(index).map(|(_, slot)| slot),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown container {0:?}")]
    UnknownContainer(ContainerId),
    #[error("container {0:?} is not a list")]
    NotAList(ContainerId),
    #[error("container {0:?} is not a map")]
    NotAMap(ContainerId),
    #[error("container {0:?} is its own ancestor")]
    Cycle(ContainerId),
}

#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    containers: Vec<Container>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty list container.
    pub fn add_list(&mut self) -> ContainerId {
        self.add(Container::List(Vec::new()))
    }

    /// Adds an empty map container.
    pub fn add_map(&mut self) -> ContainerId {
        self.add(Container::Map(IndexMap::new()))
    }

    fn add(&mut self, container: Container) -> ContainerId {
        self.containers.push(container);
        ContainerId(self.containers.len() - 1)
    }

    /// Appends a child to a list container.
    pub fn push(&mut self, list: ContainerId, slot: impl Into<Slot>) -> Result<(), GraphError> {
        match self.containers.get_mut(list.0) {
            Some(Container::List(items)) => {
                items.push(slot.into());
                Ok(())
            }
            Some(Container::Map(_)) => Err(GraphError::NotAList(list)),
            None => Err(GraphError::UnknownContainer(list)),
        }
    }

    /// Sets a field of a map container.
    pub fn insert(
        &mut self,
        map: ContainerId,
        key: impl Into<String>,
        slot: impl Into<Slot>,
    ) -> Result<(), GraphError> {
        match self.containers.get_mut(map.0) {
            Some(Container::Map(fields)) => {
                fields.insert(key.into(), slot.into());
                Ok(())
            }
            Some(Container::List(_)) => Err(GraphError::NotAMap(map)),
            None => Err(GraphError::UnknownContainer(map)),
        }
    }

    pub fn container(&self, id: ContainerId) -> Result<&Container, GraphError> {
        self.containers
            .get(id.0)
            .ok_or(GraphError::UnknownContainer(id))
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Materializes the value rooted at `root` as an owned tree.
    ///
    /// Shared containers are copied at every place they are referenced.
    /// Map containers go through [`Node::map`], so `{"/": "<cid>"}` becomes a link.
    pub fn to_node(&self, root: ContainerId) -> Result<Node, crate::CodecError> {
        let mut open = vec![false; self.containers.len()];
        self.materialize(root, &mut open)
    }

    fn materialize(&self, id: ContainerId, open: &mut [bool]) -> Result<Node, crate::CodecError> {
        let container = self.container(id)?;
        if open[id.0] {
            return Err(GraphError::Cycle(id).into());
        }
        open[id.0] = true;

        let node = match container {
            Container::List(items) => Node::List(
                items
                    .iter()
                    .map(|slot| self.materialize_slot(slot, open))
                    .collect::<Result<_, _>>()?,
            ),
            Container::Map(fields) => {
                let entries = fields
                    .iter()
                    .map(|(k, slot)| Ok((k.clone(), self.materialize_slot(slot, open)?)))
                    .collect::<Result<Vec<_>, crate::CodecError>>()?;
                Node::map(entries)?
            }
        };

        open[id.0] = false;
        Ok(node)
    }

    fn materialize_slot(&self, slot: &Slot, open: &mut [bool]) -> Result<Node, crate::CodecError> {
        match slot {
            Slot::Node(node) => Ok(node.clone()),
            Slot::Container(child) => self.materialize(*child, open),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodecError;

    #[test]
    fn build_and_materialize() {
        let mut graph = NodeGraph::new();
        let root = graph.add_map();
        let list = graph.add_list();
        graph.push(list, Node::from(1i64)).unwrap();
        graph.push(list, Node::from("two")).unwrap();
        graph.insert(root, "items", list).unwrap();
        graph.insert(root, "flag", Node::Bool(true)).unwrap();

        let node = graph.to_node(root).unwrap();
        assert_eq!(
            node.get("items"),
            Some(&Node::List(vec![Node::from(1i64), Node::from("two")]))
        );
        assert_eq!(node.get("flag"), Some(&Node::Bool(true)));
    }

    #[test]
    fn shared_container_is_duplicated() {
        let mut graph = NodeGraph::new();
        let root = graph.add_list();
        let shared = graph.add_map();
        graph.insert(shared, "x", Node::Null).unwrap();
        graph.push(root, shared).unwrap();
        graph.push(root, shared).unwrap();

        let node = graph.to_node(root).unwrap();
        assert_eq!(node.get("0"), node.get("1"));
        assert!(node.get("0").is_some());
    }

    #[test]
    fn wrong_container_kind() {
        let mut graph = NodeGraph::new();
        let list = graph.add_list();
        let map = graph.add_map();
        assert!(matches!(
            graph.insert(list, "k", Node::Null),
            Err(GraphError::NotAMap(_))
        ));
        assert!(matches!(graph.push(map, Node::Null), Err(GraphError::NotAList(_))));
        assert!(matches!(
            graph.push(ContainerId(9), Node::Null),
            Err(GraphError::UnknownContainer(_))
        ));
    }

    #[test]
    fn materialize_refuses_cycles() {
        let mut graph = NodeGraph::new();
        let a = graph.add_map();
        let b = graph.add_list();
        graph.insert(a, "b", b).unwrap();
        graph.push(b, a).unwrap();

        let err = graph.to_node(a).unwrap_err();
        assert!(matches!(err, CodecError::Graph(GraphError::Cycle(_))));
    }

    #[test]
    fn materialize_refuses_dangling_ids() {
        let mut graph = NodeGraph::new();
        let root = graph.add_list();
        graph.push(root, ContainerId(42)).unwrap();

        let err = graph.to_node(root).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Graph(GraphError::UnknownContainer(ContainerId(42)))
        ));
    }
}
