//! Render tree diffing.
//!
//! [`diff`] compares the previous and next children of the content mount and
//! emits the smallest set of path-addressed [`Patch`]es it can find cheaply:
//! matching siblings at the start and end are skipped, nodes in between are
//! compared pairwise, and the remainder is removed or inserted. Identical
//! trees produce no patches.

use crate::error::{PlaygroundError, Result};
use crate::tree::RenderNode;

/// Child indices from the content mount down to a node.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    /// Insert `node` so it ends up at `index` among the children of `parent`.
    Insert {
        parent: NodePath,
        index: usize,
        node: RenderNode,
    },
    /// Remove the child at `index` of `parent`.
    Remove { parent: NodePath, index: usize },
    /// Replace the node at `path` wholesale.
    Replace { path: NodePath, node: RenderNode },
    /// Replace the data of the text node at `path`.
    SetText { path: NodePath, text: String },
    SetAttribute {
        path: NodePath,
        name: String,
        value: String,
    },
    RemoveAttribute { path: NodePath, name: String },
}

/// Patches turning `old` into `new`, in application order.
pub fn diff(old: &[RenderNode], new: &[RenderNode]) -> Vec<Patch> {
    let mut patches = Vec::new();
    let mut path = Vec::new();
    diff_children(old, new, &mut path, &mut patches);
    patches
}

fn diff_children(
    old: &[RenderNode],
    new: &[RenderNode],
    parent: &mut NodePath,
    patches: &mut Vec<Patch>,
) {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    let paired = old_mid.len().min(new_mid.len());

    for (offset, (a, b)) in old_mid.iter().zip(new_mid).enumerate() {
        parent.push(prefix + offset);
        diff_node(a, b, parent, patches);
        parent.pop();
    }

    // Highest index first so earlier removals don't shift later ones.
    for offset in (paired..old_mid.len()).rev() {
        patches.push(Patch::Remove {
            parent: parent.clone(),
            index: prefix + offset,
        });
    }

    for (offset, node) in new_mid.iter().enumerate().skip(paired) {
        patches.push(Patch::Insert {
            parent: parent.clone(),
            index: prefix + offset,
            node: node.clone(),
        });
    }
}

fn diff_node(old: &RenderNode, new: &RenderNode, path: &mut NodePath, patches: &mut Vec<Patch>) {
    match (old, new) {
        (RenderNode::Text(a), RenderNode::Text(b)) => {
            if a != b {
                patches.push(Patch::SetText {
                    path: path.clone(),
                    text: b.clone(),
                });
            }
        }
        (RenderNode::Element(a), RenderNode::Element(b)) if a.tag == b.tag => {
            for (name, value) in &b.attrs {
                if a.attr(name) != Some(value.as_str()) {
                    patches.push(Patch::SetAttribute {
                        path: path.clone(),
                        name: name.clone(),
                        value: value.clone(),
                    });
                }
            }
            for (name, _) in &a.attrs {
                if b.attr(name).is_none() {
                    patches.push(Patch::RemoveAttribute {
                        path: path.clone(),
                        name: name.clone(),
                    });
                }
            }
            diff_children(&a.children, &b.children, path, patches);
        }
        _ => patches.push(Patch::Replace {
            path: path.clone(),
            node: new.clone(),
        }),
    }
}

/// Apply patches to an in-memory child list.
pub fn apply(root: &mut Vec<RenderNode>, patches: &[Patch]) -> Result<()> {
    for patch in patches {
        match patch {
            Patch::Insert {
                parent,
                index,
                node,
            } => {
                let children = children_at(root, parent)?;
                if *index > children.len() {
                    return Err(bad_path(parent, *index));
                }
                children.insert(*index, node.clone());
            }
            Patch::Remove { parent, index } => {
                let children = children_at(root, parent)?;
                if *index >= children.len() {
                    return Err(bad_path(parent, *index));
                }
                children.remove(*index);
            }
            Patch::Replace { path, node } => *node_at(root, path)? = node.clone(),
            Patch::SetText { path, text } => match node_at(root, path)? {
                RenderNode::Text(existing) => *existing = text.clone(),
                RenderNode::Element(_) => {
                    return Err(PlaygroundError::Patch(format!(
                        "expected text node at {path:?}"
                    )));
                }
            },
            Patch::SetAttribute { path, name, value } => match node_at(root, path)? {
                RenderNode::Element(el) => el.set_attr(name.as_str(), value.as_str()),
                RenderNode::Text(_) => {
                    return Err(PlaygroundError::Patch(format!(
                        "expected element at {path:?}"
                    )));
                }
            },
            Patch::RemoveAttribute { path, name } => match node_at(root, path)? {
                RenderNode::Element(el) => el.remove_attr(name),
                RenderNode::Text(_) => {
                    return Err(PlaygroundError::Patch(format!(
                        "expected element at {path:?}"
                    )));
                }
            },
        }
    }
    Ok(())
}

fn bad_path(parent: &[usize], index: usize) -> PlaygroundError {
    PlaygroundError::Patch(format!("no child {index} under {parent:?}"))
}

fn children_at<'a>(root: &'a mut Vec<RenderNode>, path: &[usize]) -> Result<&'a mut Vec<RenderNode>> {
    let mut children = root;
    for (depth, &index) in path.iter().enumerate() {
        children = match children.get_mut(index) {
            Some(RenderNode::Element(el)) => &mut el.children,
            _ => return Err(bad_path(&path[..depth], index)),
        };
    }
    Ok(children)
}

fn node_at<'a>(root: &'a mut Vec<RenderNode>, path: &[usize]) -> Result<&'a mut RenderNode> {
    let Some((&last, parent)) = path.split_last() else {
        return Err(PlaygroundError::Patch("empty node path".into()));
    };
    children_at(root, parent)?
        .get_mut(last)
        .ok_or_else(|| bad_path(parent, last))
}
