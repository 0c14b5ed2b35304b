//! Structural questions about the browser UI.
//!
//! Every query starts from a freshly resolved node and only reads the tree. A query
//! that cannot find what it expects answers `None` or `false`, which callers treat
//! as "not applicable".

use browser_plus_event::input::InputPosition;
use tracing::{debug, trace};

use crate::{
    accessibility::{
        Accessible, Flow, Mode, Role, State, bounding_box, find_element_with_role, has_state,
        parent, traverse,
    },
    desktop::{Desktop, ObjectId, WindowId},
};

/// Class name prefix of browser frame and popup windows.
pub const BROWSER_WINDOW_CLASS_PREFIX: &str = "Chrome_WidgetWin_";

/// Lower bound of the window in which a tab count of two still counts as the last tab.
pub const KEEP_LAST_TAB_DEBOUNCE_MIN_MS: u64 = 50;
/// Upper bound of the same window.
pub const KEEP_LAST_TAB_DEBOUNCE_MAX_MS: u64 = 250;

const NEW_TAB_URL_MARKERS: [&str; 3] = ["://newtab", "chrome-search://local-ntp", "://new-tab-page"];

/// Parent of the first tab list of a browser window.
pub fn top_container_view<D: Desktop>(desktop: &D, window: WindowId) -> Option<D::Node> {
    let class = desktop.class_name(window)?;
    if !class.starts_with(BROWSER_WINDOW_CLASS_PREFIX) {
        trace!("window {window:#x} of class {class} is not a browser window");
        return None;
    }

    let Some(root) = desktop.accessible_object(window, ObjectId::Window) else {
        debug!("no accessible object for window {window:#x}");
        return None;
    };
    let Some(tab_list) = find_element_with_role(&root, Role::PAGE_TAB_LIST) else {
        debug!("no tab list in window {window:#x}");
        return None;
    };

    parent(&tab_list)
}

/// Pane holding the tabs: parent of the first tab of the tab list.
pub fn tab_strip<A: Accessible>(top: &A) -> Option<A> {
    let tab_list = find_element_with_role(top, Role::PAGE_TAB_LIST)?;
    let tab = find_element_with_role(&tab_list, Role::PAGE_TAB)?;
    parent(&tab)
}

/// Plain tabs plus collapsed tab groups.
pub fn tab_count<A: Accessible>(top: &A) -> Option<usize> {
    let strip = tab_strip(top)?;

    let mut count = 0;
    traverse(&strip, Mode::Visible, |child| {
        match child.role() {
            Some(Role::PAGE_TAB) => count += 1,
            Some(Role::PAGE_TAB_LIST) if has_state(child, State::COLLAPSED) => count += 1,
            _ => {}
        }
        Flow::<()>::Continue
    });

    Some(count)
}

/// Whether `point` lies inside a tab.
pub fn is_on_one_tab<A: Accessible>(top: &A, point: InputPosition) -> bool {
    let Some(strip) = tab_strip(top) else {
        return false;
    };

    traverse(&strip, Mode::Visible, |child| {
        if child.role() == Some(Role::PAGE_TAB)
            && bounding_box(child).is_some_and(|rect| rect.contains(point))
        {
            Flow::Stop(())
        } else {
            Flow::Continue
        }
    })
    .is_some()
}

/// Whether `point` lies inside the tab list.
pub fn is_on_the_tab_bar<A: Accessible>(top: &A, point: InputPosition) -> bool {
    find_element_with_role(top, Role::PAGE_TAB_LIST)
        .and_then(|tab_list| bounding_box(&tab_list))
        .is_some_and(|rect| rect.contains(point))
}

/// Label of the new tab button next to the tabs.
pub fn new_tab_button_name<A: Accessible>(top: &A) -> Option<String> {
    let strip = tab_strip(top)?;
    traverse(&strip, Mode::Visible, |child| {
        if child.role() == Some(Role::PUSH_BUTTON) {
            if let Some(name) = child.name() {
                return Flow::Stop(name);
            }
        }
        Flow::Continue
    })
}

pub fn selected_tab_name<A: Accessible>(top: &A) -> Option<String> {
    let strip = tab_strip(top)?;
    traverse(&strip, Mode::Visible, |child| {
        if child.role() == Some(Role::PAGE_TAB) && has_state(child, State::SELECTED) {
            if let Some(name) = child.name() {
                return Flow::Stop(name);
            }
        }
        Flow::Continue
    })
}

/// Whether the selected tab is titled like a new tab page.
///
/// Matches the new tab button label exactly, or any non-empty entry of `deny` as a
/// substring.
pub fn is_name_new_tab<A: Accessible, S: AsRef<str>>(top: &A, deny: &[S]) -> bool {
    let Some(selected) = selected_tab_name(top) else {
        return false;
    };

    if new_tab_button_name(top).is_some_and(|button| button == selected) {
        return true;
    }

    deny.iter()
        .map(AsRef::as_ref)
        .any(|name| !name.is_empty() && selected.contains(name))
}

/// Whether the document under `root` shows a new tab page.
///
/// The document value is only exposed when renderer accessibility is on.
pub fn is_doc_new_tab<A: Accessible>(root: &A) -> bool {
    find_element_with_role(root, Role::DOCUMENT)
        .and_then(|document| document.value())
        .is_some_and(|url| NEW_TAB_URL_MARKERS.iter().any(|marker| url.contains(marker)))
}

fn is_link_description(description: &str) -> bool {
    let is_script = description
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"));

    !is_script && description.contains(['.', ':'])
}

fn is_on_link_with_role<A: Accessible>(root: &A, point: InputPosition, role: Role) -> bool {
    traverse(root, Mode::Raw, |child| {
        if child.role() != Some(role) {
            return Flow::Continue;
        }

        let on_link = bounding_box(child).is_some_and(|rect| rect.contains(point))
            && child
                .description()
                .is_some_and(|description| is_link_description(&description));
        if on_link {
            Flow::Stop(())
        } else {
            Flow::Continue
        }
    })
    .is_some()
}

/// Whether `point` is on a bookmark bar button that opens a link.
pub fn is_on_bookmark<A: Accessible>(top: &A, point: InputPosition) -> bool {
    is_on_link_with_role(top, point, Role::PUSH_BUTTON)
}

/// Whether `point` is on a link inside an expanded bookmark folder popup.
pub fn is_on_expanded_list<A: Accessible>(root: &A, point: InputPosition) -> bool {
    is_on_link_with_role(root, point, Role::PUSH_BUTTON)
}

/// Whether `point` is on a bookmark inside a menu.
pub fn is_on_menu_bookmark<A: Accessible>(root: &A, point: InputPosition) -> bool {
    is_on_link_with_role(root, point, Role::MENU_ITEM)
}

/// Whether the omnibox has keyboard focus.
pub fn is_omnibox_focus<A: Accessible>(top: &A) -> bool {
    find_element_with_role(top, Role::TOOLBAR)
        .and_then(|toolbar| find_element_with_role(&toolbar, Role::TEXT))
        .is_some_and(|text| has_state(&text, State::FOCUSED))
}

/// Whether `point` lies in the pane around the focused text field of the focus window.
///
/// Assumes the find bar field sits directly inside one pane.
pub fn is_on_find_bar_pane<D: Desktop>(desktop: &D, point: InputPosition) -> bool {
    let Some(root) = desktop
        .focus_window()
        .and_then(|window| desktop.accessible_object(window, ObjectId::Client))
    else {
        return false;
    };

    let Some(field) = traverse(&root, Mode::Raw, |child| {
        if child.role() == Some(Role::TEXT) && has_state(child, State::FOCUSED) {
            Flow::Stop(child.clone())
        } else {
            Flow::Continue
        }
    }) else {
        return false;
    };

    parent(&field)
        .filter(|pane| pane.role() == Some(Role::PANE))
        .and_then(|pane| bounding_box(&pane))
        .is_some_and(|rect| rect.contains(point))
}

/// Tick-based tolerance for the tab count lagging behind a close.
#[derive(Debug, Clone, Default)]
pub struct CloseDebounce {
    last_check: Option<u64>,
}

impl CloseDebounce {
    pub const fn new() -> Self {
        Self { last_check: None }
    }

    /// Whether `tab_count` tabs at `now` should be treated as the last tab.
    ///
    /// Two tabs count as the last one if the previous check happened within the
    /// debounce window, since the host updates its count asynchronously after a close.
    pub fn is_last_tab(&mut self, tab_count: usize, now: u64) -> bool {
        let elapsed = self
            .last_check
            .map_or(0, |last| now.saturating_sub(last));
        self.last_check = Some(now);

        if tab_count == 2
            && elapsed > KEEP_LAST_TAB_DEBOUNCE_MIN_MS
            && elapsed <= KEEP_LAST_TAB_DEBOUNCE_MAX_MS
        {
            return true;
        }

        tab_count <= 1
    }
}

/// Whether closing a tab of `top` would close the window.
///
/// Always `false` unless `keep_last_tab` is on. A failed count is not the last tab.
pub fn is_only_one_tab<A: Accessible>(
    top: &A,
    keep_last_tab: bool,
    debounce: &mut CloseDebounce,
    now: u64,
) -> bool {
    if !keep_last_tab {
        return false;
    }

    match tab_count(top) {
        Some(count) => debounce.is_last_tab(count, now),
        None => false,
    }
}
