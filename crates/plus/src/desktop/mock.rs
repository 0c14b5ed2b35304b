//! Recording [`Desktop`] over a mock accessibility graph, with a browser window fixture.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    ops::Deref,
    rc::Rc,
};

use browser_plus_event::{input::InputPosition, key::Key};

use super::{BrowserCommand, Desktop, ObjectId, Stroke, WindowId};
use crate::accessibility::{
    Rect, Role, State,
    mock::{MockNode, MockTree},
};

pub const BROWSER_WINDOW: WindowId = 1;
pub const FOLDER_POPUP: WindowId = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Command(WindowId, BrowserCommand),
    Input(Vec<Stroke>),
}

struct MockWindow {
    class: String,
    window: MockNode,
    client: MockNode,
}

/// Shared handle; clones observe the same windows, keys and recorded actions.
#[derive(Clone)]
pub struct MockDesktop(Rc<MockState>);

pub struct MockState {
    pub tree: MockTree,
    windows: RefCell<HashMap<WindowId, MockWindow>>,
    pub foreground: Cell<Option<WindowId>>,
    pub focus: Cell<Option<WindowId>>,
    pub pointed: Cell<Option<WindowId>>,
    keys_down: RefCell<HashSet<Key>>,
    tick: Cell<u64>,
    actions: RefCell<Vec<Action>>,
}

impl MockDesktop {
    pub fn new() -> Self {
        MockDesktop(Rc::new(MockState {
            tree: MockTree::new(),
            windows: RefCell::new(HashMap::new()),
            foreground: Cell::new(None),
            focus: Cell::new(None),
            pointed: Cell::new(None),
            keys_down: RefCell::new(HashSet::new()),
            tick: Cell::new(1_000),
            actions: RefCell::new(Vec::new()),
        }))
    }
}

impl Deref for MockDesktop {
    type Target = MockState;

    fn deref(&self) -> &MockState {
        &self.0
    }
}

impl MockState {
    pub fn add_window(&self, id: WindowId, class: &str, window: MockNode, client: MockNode) {
        self.windows.borrow_mut().insert(
            id,
            MockWindow {
                class: class.to_owned(),
                window,
                client,
            },
        );
    }

    pub fn press(&self, key: Key) {
        self.keys_down.borrow_mut().insert(key);
    }

    pub fn release(&self, key: Key) {
        self.keys_down.borrow_mut().remove(&key);
    }

    pub fn advance(&self, ms: u64) {
        self.tick.set(self.tick.get() + ms);
    }

    pub fn take_actions(&self) -> Vec<Action> {
        self.actions.take()
    }

    /// Node references alive outside the window table.
    pub fn leaked_refs(&self) -> isize {
        self.tree.live_refs() - self.windows.borrow().len() as isize * 2
    }
}

impl Desktop for MockDesktop {
    type Node = MockNode;

    fn accessible_object(&self, window: WindowId, object: ObjectId) -> Option<MockNode> {
        let windows = self.windows.borrow();
        let window = windows.get(&window)?;
        Some(match object {
            ObjectId::Window => window.window.clone(),
            ObjectId::Client => window.client.clone(),
        })
    }

    fn class_name(&self, window: WindowId) -> Option<String> {
        self.windows.borrow().get(&window).map(|w| w.class.clone())
    }

    fn foreground_window(&self) -> Option<WindowId> {
        self.foreground.get()
    }

    fn focus_window(&self) -> Option<WindowId> {
        self.focus.get()
    }

    fn window_from_point(&self, _: InputPosition) -> Option<WindowId> {
        self.pointed.get()
    }

    fn root_window(&self, window: WindowId) -> WindowId {
        window
    }

    fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.borrow().contains(&key)
    }

    fn tick_count(&self) -> u64 {
        self.tick.get()
    }

    fn drag_threshold(&self) -> (i32, i32) {
        (4, 4)
    }

    fn execute_command(&self, window: WindowId, command: BrowserCommand) {
        self.actions
            .borrow_mut()
            .push(Action::Command(window, command));
    }

    fn send_input(&self, strokes: &[Stroke]) {
        self.actions
            .borrow_mut()
            .push(Action::Input(strokes.to_vec()));
    }
}

pub const TAB_WIDTH: i32 = 100;
pub const TAB_BAR: Rect = Rect::new(0, 0, 800, 40);
pub const OMNIBOX: Rect = Rect::new(100, 45, 700, 75);
pub const BOOKMARK: Rect = Rect::new(0, 80, 100, 110);
pub const FIND_BAR: Rect = Rect::new(500, 110, 800, 150);
pub const FOLDER_LINK: Rect = Rect::new(0, 110, 200, 130);
pub const FOLDER_SUBFOLDER: Rect = Rect::new(0, 130, 200, 150);

/// Center of the tab at `index`.
pub fn tab_point(index: usize) -> InputPosition {
    InputPosition::new(index as i32 * TAB_WIDTH + TAB_WIDTH / 2, 20)
}

pub fn center(rect: Rect) -> InputPosition {
    InputPosition::new((rect.left + rect.right) / 2, (rect.top + rect.bottom) / 2)
}

/// A browser window laid out like the real tab strip, toolbar and bookmark bar.
///
/// ```text
/// window > client > view(pane) > top(grouping) > tab strip(page tab list) > tabs, new tab
///                                              > toolbar > omnibox(text)
///                                              > bookmark bar(toolbar) > bookmark
///                              > contents(pane) > document
/// ```
pub struct BrowserFixture {
    pub desktop: MockDesktop,
    pub tab_strip: MockNode,
    pub tabs: Vec<MockNode>,
    pub omnibox: MockNode,
    pub bookmark: MockNode,
    pub document: MockNode,
    pub contents: MockNode,
}

impl BrowserFixture {
    pub fn new(tab_names: &[&str]) -> Self {
        let desktop = MockDesktop::new();
        let tree = &desktop.tree;

        let window = tree.node("window", Role(0x09));
        let client = tree.node("client", Role(0x0A));
        let view = tree.node("view", Role::PANE);
        let top = tree.node("top", Role::GROUPING);
        let tab_strip = tree.node("Tab strip", Role::PAGE_TAB_LIST).at(TAB_BAR);

        let mut tabs = Vec::new();
        for (i, name) in tab_names.iter().enumerate() {
            let left = i as i32 * TAB_WIDTH;
            let state = if i == 0 {
                State::SELECTED
            } else {
                State::empty()
            };
            let tab = tree
                .node(name, Role::PAGE_TAB)
                .with_state(state)
                .at(Rect::new(left, 0, left + TAB_WIDTH, 40));
            tab_strip.append(&tab);
            tabs.push(tab);
        }
        let new_tab_left = tab_names.len() as i32 * TAB_WIDTH;
        let new_tab = tree
            .node("New Tab", Role::PUSH_BUTTON)
            .at(Rect::new(new_tab_left, 5, new_tab_left + 30, 35));
        tab_strip.append(&new_tab);

        let toolbar = tree.node("toolbar", Role::TOOLBAR).at(Rect::new(0, 40, 800, 80));
        let omnibox = tree.node("Address and search bar", Role::TEXT).at(OMNIBOX);
        toolbar.append(&omnibox);

        let bookmark_bar = tree
            .node("Bookmarks", Role::TOOLBAR)
            .at(Rect::new(0, 80, 800, 110));
        let bookmark = tree
            .node("Example", Role::PUSH_BUTTON)
            .with_description("Example\nhttps://example.com/")
            .at(BOOKMARK);
        let script = tree
            .node("Bookmarklet", Role::PUSH_BUTTON)
            .with_description("javascript:alert(1)")
            .at(Rect::new(100, 80, 200, 110));
        bookmark_bar.append(&bookmark);
        bookmark_bar.append(&script);

        top.append(&tab_strip);
        top.append(&toolbar);
        top.append(&bookmark_bar);

        let contents = tree.node("contents", Role::PANE).at(Rect::new(0, 110, 800, 600));
        let document = tree
            .node("page", Role::DOCUMENT)
            .with_value("https://example.com/");
        contents.append(&document);

        view.append(&top);
        view.append(&contents);
        client.append(&view);
        window.append(&client);

        desktop.add_window(BROWSER_WINDOW, "Chrome_WidgetWin_1", window, client);
        desktop.foreground.set(Some(BROWSER_WINDOW));
        desktop.focus.set(Some(BROWSER_WINDOW));
        desktop.pointed.set(Some(BROWSER_WINDOW));

        Self {
            desktop,
            tab_strip,
            tabs,
            omnibox,
            bookmark,
            document,
            contents,
        }
    }

    /// Focus the omnibox.
    pub fn focus_omnibox(&self) {
        self.omnibox.set_state(State::FOCUSED);
    }

    /// Open the find bar pane with a focused text field.
    pub fn open_find_bar(&self) {
        let tree = &self.desktop.tree;
        let pane = tree.node("Find", Role::PANE).at(FIND_BAR);
        let field = tree
            .node("Find in page", Role::TEXT)
            .with_state(State::FOCUSED)
            .at(Rect::new(510, 115, 700, 145));
        pane.append(&field);
        self.contents.append(&pane);
    }

    /// Expand a bookmark folder into its own popup window under the cursor.
    pub fn open_folder(&self) {
        let tree = &self.desktop.tree;
        let window = tree.node("popup", Role(0x09));
        let client = tree.node("popup client", Role(0x0A));
        let list = tree.node("Folder", Role::PANE).at(Rect::new(0, 110, 200, 150));
        list.append(
            &tree
                .node("Docs", Role::PUSH_BUTTON)
                .with_description("Docs\nhttps://docs.example.com/")
                .at(FOLDER_LINK),
        );
        list.append(
            &tree
                .node("Nested", Role::PUSH_BUTTON)
                .at(FOLDER_SUBFOLDER),
        );
        client.append(&list);
        window.append(&client);

        self.desktop
            .add_window(FOLDER_POPUP, "Chrome_WidgetWin_2", window, client);
        self.desktop.pointed.set(Some(FOLDER_POPUP));
    }

    /// Node references held beyond the fixture's own handles.
    pub fn leaked_refs(&self) -> isize {
        self.desktop.leaked_refs() - (self.tabs.len() as isize + 5)
    }
}
