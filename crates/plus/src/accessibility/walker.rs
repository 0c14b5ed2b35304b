//! Bounded traversal of the accessibility tree.

use super::{Accessible, Rect, Role, State};

/// Children are fetched from the host in pages of this size.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Visit direct children that are visible. No recursion.
    Visible,
    /// Visit every descendant, deepest first, regardless of visibility.
    Raw,
}

/// Visitor decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow<T> {
    Continue,
    Stop(T),
}

/// Walk the children of `node`, stopping at the first [`Flow::Stop`].
///
/// In [`Mode::Raw`] a node's subtree is walked before the node itself is visited,
/// and a stop anywhere below ends the whole walk. Each page of children is released
/// before the next one is fetched, and on early exit.
pub fn traverse<A, T>(node: &A, mode: Mode, mut visit: impl FnMut(&A) -> Flow<T>) -> Option<T>
where
    A: Accessible,
{
    walk(node, mode, &mut visit)
}

fn walk<A, T, F>(node: &A, mode: Mode, visit: &mut F) -> Option<T>
where
    A: Accessible,
    F: FnMut(&A) -> Flow<T>,
{
    let count = node.child_count()?;

    let mut start = 0;
    while start < count {
        let page = node.children(start, PAGE_SIZE.min(count - start))?;
        if page.is_empty() {
            break;
        }
        start += page.len();

        for child in &page {
            match mode {
                Mode::Visible => {
                    if !is_visible(child) {
                        continue;
                    }
                }

                Mode::Raw => {
                    if let Some(res) = walk(child, mode, visit) {
                        return Some(res);
                    }
                }
            }

            if let Flow::Stop(res) = visit(child) {
                return Some(res);
            }
        }
    }

    None
}

/// Nodes whose state cannot be read count as visible.
pub fn is_visible<A: Accessible>(node: &A) -> bool {
    node.state()
        .is_none_or(|state| !state.contains(State::INVISIBLE))
}

#[inline]
pub fn has_state<A: Accessible>(node: &A, state: State) -> bool {
    node.state().is_some_and(|s| s.contains(state))
}

/// First visible descendant with `role`, searched depth first.
pub fn find_element_with_role<A: Accessible>(node: &A, role: Role) -> Option<A> {
    traverse(node, Mode::Visible, |child| {
        if child.role() == Some(role) {
            return Flow::Stop(child.clone());
        }

        match find_element_with_role(child, role) {
            Some(found) => Flow::Stop(found),
            None => Flow::Continue,
        }
    })
}

#[inline]
pub fn parent<A: Accessible>(node: &A) -> Option<A> {
    node.parent()
}

pub fn bounding_box<A: Accessible>(node: &A) -> Option<Rect> {
    node.location().map(Rect::from)
}
