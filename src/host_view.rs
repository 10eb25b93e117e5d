use crate::visibility_core::{
    AppSettings, ALL_PANEL_CLASS, OVERVIEW_HIDDEN_CLASS, OVERVIEW_ITEM_CLASS, OVERVIEW_KEY_ATTR,
    STYLE_ELEMENT_ID, TABLE_ACTIVE_CLASS, TABLE_CONTAINER_CLASS,
};
use leptos::prelude::document;
use wasm_bindgen::JsCast;

/// How long focus may sit outside the properties table before the active class
/// comes off. Moving between two inputs inside the table fires focusout then
/// focusin back to back; the grace window keeps that from flickering.
pub const FOCUS_GRACE_MS: u64 = 150;

/// The few DOM touch points the visibility logic needs. Everything else stays
/// pure so it can run against a recording fake in tests.
pub trait PanelView {
    fn panel_has_focus(&self) -> bool;
    fn set_table_active(&self, active: bool);
    fn replace_stylesheet(&self, css: &str);
    fn overview_keys(&self) -> Vec<String>;
    fn set_overview_item_hidden(&self, key: &str, hidden: bool);
}

/// Mirrors whether interaction focus is inside the properties table onto the
/// container's active class. Focus loss is only committed after the grace
/// window passes with focus still elsewhere; each arm hands out a token, and a
/// timer presenting a stale token is ignored.
#[derive(Debug, Default)]
pub struct FocusMirror {
    active: bool,
    pending: u64,
}

impl FocusMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn focus_gained(&mut self, view: &impl PanelView) {
        self.pending += 1;
        self.active = true;
        // Re-assert on every gain: the container may have been rebuilt since
        // the class was last applied, and the class-list add is idempotent.
        view.set_table_active(true);
    }

    pub fn focus_lost(&mut self) -> u64 {
        self.pending += 1;
        self.pending
    }

    pub fn grace_elapsed(&mut self, token: u64, view: &impl PanelView) {
        if token != self.pending {
            return;
        }
        if view.panel_has_focus() {
            return;
        }
        if self.active {
            self.active = false;
            view.set_table_active(false);
        }
    }
}

/// Re-marks every overview item against the current rules. Items whose key no
/// longer matches a hiding rule get their marker removed rather than left
/// behind.
pub fn apply_overview_markers(view: &impl PanelView, settings: &AppSettings) {
    for key in view.overview_keys() {
        view.set_overview_item_hidden(&key, settings.is_hidden_in_overview(&key));
    }
}

/// Live implementation over the document. Every operation tolerates missing
/// elements by doing nothing; the panels may not have rendered yet.
pub struct DomView;

impl DomView {
    fn table_root(&self) -> Option<web_sys::Element> {
        document()
            .query_selector(&format!(".{TABLE_CONTAINER_CLASS}"))
            .ok()
            .flatten()
    }
}

impl PanelView for DomView {
    fn panel_has_focus(&self) -> bool {
        let Some(root) = self.table_root() else {
            return false;
        };
        let Some(active) = document().active_element() else {
            return false;
        };
        root.contains(Some(active.as_ref()))
    }

    fn set_table_active(&self, active: bool) {
        let Some(root) = self.table_root() else {
            return;
        };
        let classes = root.class_list();
        let _ = if active {
            classes.add_1(TABLE_ACTIVE_CLASS)
        } else {
            classes.remove_1(TABLE_ACTIVE_CLASS)
        };
    }

    fn replace_stylesheet(&self, css: &str) {
        let doc = document();
        if let Some(existing) = doc.get_element_by_id(STYLE_ELEMENT_ID) {
            existing.set_text_content(Some(css));
            return;
        }
        let Some(head) = doc.head() else {
            return;
        };
        let Ok(style) = doc.create_element("style") else {
            return;
        };
        style.set_id(STYLE_ELEMENT_ID);
        style.set_text_content(Some(css));
        let _ = head.append_child(&style);
    }

    fn overview_keys(&self) -> Vec<String> {
        let selector = format!(".{ALL_PANEL_CLASS} .{OVERVIEW_ITEM_CLASS}[{OVERVIEW_KEY_ATTR}]");
        let Ok(items) = document().query_selector_all(&selector) else {
            return Vec::new();
        };
        let mut keys = Vec::new();
        for index in 0..items.length() {
            let Some(node) = items.item(index) else {
                continue;
            };
            let Ok(element) = node.dyn_into::<web_sys::Element>() else {
                continue;
            };
            if let Some(key) = element.get_attribute(OVERVIEW_KEY_ATTR) {
                keys.push(key);
            }
        }
        keys
    }

    fn set_overview_item_hidden(&self, key: &str, hidden: bool) {
        let selector = format!(
            ".{ALL_PANEL_CLASS} .{OVERVIEW_ITEM_CLASS}[{OVERVIEW_KEY_ATTR}=\"{}\"]",
            crate::visibility_core::escape_attr_value(key)
        );
        let Ok(item) = document().query_selector(&selector) else {
            return;
        };
        let Some(element) = item else {
            return;
        };
        let classes = element.class_list();
        let _ = if hidden {
            classes.add_1(OVERVIEW_HIDDEN_CLASS)
        } else {
            classes.remove_1(OVERVIEW_HIDDEN_CLASS)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility_core::PropertyRule;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingView {
        focused: RefCell<bool>,
        active_calls: RefCell<Vec<bool>>,
        stylesheets: RefCell<Vec<String>>,
        keys: Vec<String>,
        marker_calls: RefCell<Vec<(String, bool)>>,
    }

    impl RecordingView {
        fn with_keys(keys: &[&str]) -> Self {
            Self {
                keys: keys.iter().map(|k| k.to_string()).collect(),
                ..Self::default()
            }
        }

        fn set_focused(&self, focused: bool) {
            *self.focused.borrow_mut() = focused;
        }
    }

    impl PanelView for RecordingView {
        fn panel_has_focus(&self) -> bool {
            *self.focused.borrow()
        }

        fn set_table_active(&self, active: bool) {
            self.active_calls.borrow_mut().push(active);
        }

        fn replace_stylesheet(&self, css: &str) {
            self.stylesheets.borrow_mut().push(css.to_string());
        }

        fn overview_keys(&self) -> Vec<String> {
            self.keys.clone()
        }

        fn set_overview_item_hidden(&self, key: &str, hidden: bool) {
            self.marker_calls.borrow_mut().push((key.to_string(), hidden));
        }
    }

    #[test]
    fn reasserts_the_class_on_each_focus_gain() {
        let view = RecordingView::default();
        let mut mirror = FocusMirror::new();
        mirror.focus_gained(&view);
        mirror.focus_gained(&view);
        assert!(mirror.is_active());
        assert_eq!(*view.active_calls.borrow(), vec![true, true]);
    }

    #[test]
    fn deactivates_after_grace_when_focus_stays_outside() {
        let view = RecordingView::default();
        let mut mirror = FocusMirror::new();
        mirror.focus_gained(&view);
        let token = mirror.focus_lost();
        mirror.grace_elapsed(token, &view);
        assert!(!mirror.is_active());
        assert_eq!(*view.active_calls.borrow(), vec![true, false]);
    }

    #[test]
    fn regained_focus_voids_the_armed_timer() {
        let view = RecordingView::default();
        let mut mirror = FocusMirror::new();
        mirror.focus_gained(&view);
        let token = mirror.focus_lost();
        mirror.focus_gained(&view);
        mirror.grace_elapsed(token, &view);
        assert!(mirror.is_active());
        assert_eq!(*view.active_calls.borrow(), vec![true, true]);
    }

    #[test]
    fn rearming_invalidates_the_older_token() {
        let view = RecordingView::default();
        let mut mirror = FocusMirror::new();
        mirror.focus_gained(&view);
        let first = mirror.focus_lost();
        let second = mirror.focus_lost();
        mirror.grace_elapsed(first, &view);
        assert!(mirror.is_active());
        mirror.grace_elapsed(second, &view);
        assert!(!mirror.is_active());
    }

    #[test]
    fn keeps_the_class_while_focus_is_back_inside() {
        let view = RecordingView::default();
        let mut mirror = FocusMirror::new();
        mirror.focus_gained(&view);
        let token = mirror.focus_lost();
        view.set_focused(true);
        mirror.grace_elapsed(token, &view);
        assert!(mirror.is_active());
        assert_eq!(*view.active_calls.borrow(), vec![true]);
    }

    #[test]
    fn grace_without_prior_focus_stays_inactive() {
        let view = RecordingView::default();
        let mut mirror = FocusMirror::new();
        let token = mirror.focus_lost();
        mirror.grace_elapsed(token, &view);
        assert!(!mirror.is_active());
        assert!(view.active_calls.borrow().is_empty());
    }

    #[test]
    fn marks_only_matching_overview_items() {
        let view = RecordingView::with_keys(&["tags", "secret", "status"]);
        let mut rule = PropertyRule::named("secret");
        rule.all_properties = true;
        let settings = AppSettings {
            rules: vec![rule],
            ..AppSettings::default()
        };
        apply_overview_markers(&view, &settings);
        assert_eq!(
            *view.marker_calls.borrow(),
            vec![
                ("tags".to_string(), false),
                ("secret".to_string(), true),
                ("status".to_string(), false),
            ]
        );
    }

    #[test]
    fn unmarks_items_when_rules_are_cleared() {
        let view = RecordingView::with_keys(&["secret"]);
        apply_overview_markers(&view, &AppSettings::default());
        assert_eq!(*view.marker_calls.borrow(), vec![("secret".to_string(), false)]);
    }
}
