//! Reference counted in-memory accessibility graph for tests.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use super::{Accessible, Location, Rect, Role, State};

struct NodeData {
    name: String,
    role: Role,
    state: Cell<Option<State>>,
    description: RefCell<Option<String>>,
    value: RefCell<Option<String>>,
    location: Cell<Option<Location>>,
    children: RefCell<Vec<Rc<NodeData>>>,
    parent: RefCell<Weak<NodeData>>,
    fail_children: Cell<bool>,
    max_page: Cell<usize>,
    refs: Cell<isize>,
}

/// Owner of every node created for a test; tracks outstanding references.
#[derive(Default)]
pub struct MockTree {
    nodes: RefCell<Vec<Rc<NodeData>>>,
}

impl MockTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, name: &str, role: Role) -> MockNode {
        let data = Rc::new(NodeData {
            name: name.to_owned(),
            role,
            state: Cell::new(Some(State::empty())),
            description: RefCell::new(None),
            value: RefCell::new(None),
            location: Cell::new(None),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            fail_children: Cell::new(false),
            max_page: Cell::new(0),
            refs: Cell::new(0),
        });
        self.nodes.borrow_mut().push(data.clone());

        MockNode::acquire(data)
    }

    /// Sum of references currently held through [`MockNode`] handles.
    pub fn live_refs(&self) -> isize {
        self.nodes
            .borrow()
            .iter()
            .map(|node| {
                let refs = node.refs.get();
                assert!(refs >= 0, "node {} released too often", node.name);
                refs
            })
            .sum()
    }
}

/// One reference to a mock node.
pub struct MockNode(Rc<NodeData>);

impl MockNode {
    fn acquire(data: Rc<NodeData>) -> Self {
        data.refs.set(data.refs.get() + 1);
        MockNode(data)
    }

    pub fn append(&self, child: &MockNode) {
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.0.clone());
    }

    pub fn with_state(self, state: State) -> Self {
        self.0.state.set(Some(state));
        self
    }

    pub fn without_state(self) -> Self {
        self.0.state.set(None);
        self
    }

    pub fn with_description(self, description: &str) -> Self {
        *self.0.description.borrow_mut() = Some(description.to_owned());
        self
    }

    pub fn with_value(self, value: &str) -> Self {
        *self.0.value.borrow_mut() = Some(value.to_owned());
        self
    }

    pub fn at(self, rect: Rect) -> Self {
        self.0.location.set(Some(Location {
            x: rect.left,
            y: rect.top,
            width: rect.right - rect.left,
            height: rect.bottom - rect.top,
        }));
        self
    }

    pub fn failing_children(self) -> Self {
        self.0.fail_children.set(true);
        self
    }

    pub fn set_state(&self, state: State) {
        self.0.state.set(Some(state));
    }

    /// Largest page of children requested so far.
    pub fn max_page(&self) -> usize {
        self.0.max_page.get()
    }

    pub fn same_node(&self, other: &MockNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Clone for MockNode {
    fn clone(&self) -> Self {
        MockNode::acquire(self.0.clone())
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.0.refs.set(self.0.refs.get() - 1);
    }
}

impl Accessible for MockNode {
    fn child_count(&self) -> Option<usize> {
        Some(self.0.children.borrow().len())
    }

    fn children(&self, start: usize, count: usize) -> Option<Vec<Self>> {
        if self.0.fail_children.get() {
            return None;
        }
        self.0.max_page.set(self.0.max_page.get().max(count));

        let children = self.0.children.borrow();
        let end = (start + count).min(children.len());
        Some(
            children
                .get(start..end)
                .unwrap_or_default()
                .iter()
                .cloned()
                .map(MockNode::acquire)
                .collect(),
        )
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent.borrow().upgrade().map(MockNode::acquire)
    }

    fn role(&self) -> Option<Role> {
        Some(self.0.role)
    }

    fn state(&self) -> Option<State> {
        self.0.state.get()
    }

    fn name(&self) -> Option<String> {
        Some(self.0.name.clone())
    }

    fn description(&self) -> Option<String> {
        self.0.description.borrow().clone()
    }

    fn value(&self) -> Option<String> {
        self.0.value.borrow().clone()
    }

    fn location(&self) -> Option<Location> {
        self.0.location.get()
    }
}
