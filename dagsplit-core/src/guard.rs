//! Circularity guard, run before a native graph is tagged and encoded.

use log::warn;

use crate::error::CodecError;
use crate::graph::{ContainerId, GraphError, NodeGraph, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unseen,
    Open,
    Closed,
}

/// Fails with [`CodecError::CircularReference`] if a container reachable from
/// `root` is its own ancestor.
///
/// Containers reached twice through different parents are fine. If the check
/// itself cannot complete (a dangling container id), the graph is treated as
/// acyclic and the problem is left for materialization to report.
pub fn check(graph: &NodeGraph, root: ContainerId) -> Result<(), CodecError> {
    match find_cycle(graph, root) {
        Ok(false) => Ok(()),
        Ok(true) => Err(CodecError::CircularReference),
        Err(e) => {
            warn!("circularity check could not complete, assuming no cycle: {e}");
            Ok(())
        }
    }
}

/// Depth-first walk with an explicit stack of `(container, next child index)`.
fn find_cycle(graph: &NodeGraph, root: ContainerId) -> Result<bool, GraphError> {
    graph.container(root)?;

    let mut marks = vec![Mark::Unseen; graph.len()];
    let mut stack = vec![(root, 0usize)];
    marks[root.index()] = Mark::Open;

    while let Some(&(id, next)) = stack.last() {
        let Some(slot) = graph.container(id)?.slot(next) else {
            marks[id.index()] = Mark::Closed;
            stack.pop();
            continue;
        };

        let top = stack.len() - 1;
        stack[top].1 += 1;

        let Slot::Container(child) = slot else {
            continue;
        };
        graph.container(*child)?;

        match marks[child.index()] {
            Mark::Open => return Ok(true),
            Mark::Closed => {}
            Mark::Unseen => {
                marks[child.index()] = Mark::Open;
                stack.push((*child, 0));
            }
        }
    }

    Ok(false)
}
