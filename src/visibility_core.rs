use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// Markup contract shared with the panel views. The generated stylesheet and the
// class toggling both address elements through these names, so they live in one
// place.
pub const STYLE_ELEMENT_ID: &str = "veilstone-style";
pub const TABLE_CONTAINER_CLASS: &str = "metadata-container";
pub const FILE_PANEL_CLASS: &str = "file-properties-panel";
pub const ALL_PANEL_CLASS: &str = "all-properties-panel";
pub const OVERVIEW_ITEM_CLASS: &str = "property-list-item";
pub const OVERVIEW_KEY_ATTR: &str = "data-key";
pub const PROPERTY_ROW_CLASS: &str = "metadata-property";
pub const PROPERTY_KEY_ATTR: &str = "data-property-key";
pub const PROPERTY_VALUE_CLASS: &str = "metadata-property-value";
pub const EMPTY_VALUE_CLASS: &str = "mod-empty";
pub const CHECKBOX_INPUT_CLASS: &str = "metadata-input-checkbox";
pub const TABLE_ACTIVE_CLASS: &str = "veilstone-active";
pub const OVERVIEW_HIDDEN_CLASS: &str = "veilstone-hidden";

const SNIPPET_HEADER: &str =
    "/* Generated by Veilstone. Do not edit: every settings change rewrites this file. */\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HideScope {
    TableInactive,
    TableActive,
    FileProperties,
    AllProperties,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyRule {
    pub name: String,
    pub table_inactive: bool,
    pub table_active: bool,
    pub file_properties: bool,
    pub all_properties: bool,
}

impl PropertyRule {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn hides_in(&self, scope: HideScope) -> bool {
        match scope {
            HideScope::TableInactive => self.table_inactive,
            HideScope::TableActive => self.table_active,
            HideScope::FileProperties => self.file_properties,
            HideScope::AllProperties => self.all_properties,
        }
    }

    // The settings UI couples the two table scopes: "always hide" only makes
    // sense for a property that is also hidden while the table is inactive.
    pub fn set_table_active(&mut self, on: bool) {
        self.table_active = on;
        if on {
            self.table_inactive = true;
        }
    }

    pub fn set_table_inactive(&mut self, on: bool) {
        self.table_inactive = on;
        if !on {
            self.table_active = false;
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub enable_snippet: bool,
    pub hide_empty_properties: bool,
    pub hide_empty_in_side_panel: bool,
    pub auto_fold: bool,
    pub properties_visible: String,
    pub properties_invisible: String,
    pub properties_invisible_always: String,
    pub table_hide_property: String,
    pub rules: Vec<PropertyRule>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            enable_snippet: true,
            hide_empty_properties: false,
            hide_empty_in_side_panel: false,
            auto_fold: false,
            properties_visible: String::new(),
            properties_invisible: String::new(),
            properties_invisible_always: String::new(),
            table_hide_property: String::new(),
            rules: Vec::new(),
        }
    }
}

impl AppSettings {
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn is_hidden_in_overview(&self, key: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.hides_in(HideScope::AllProperties) && rule.name.trim() == key)
    }
}

/// Splits a comma/newline separated name list into trimmed names. Runs of
/// separators collapse, and empty segments are dropped so a selector for an
/// empty name can never be generated downstream.
pub fn parse_name_list(raw: &str) -> Vec<String> {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[,\n]+").expect("valid separator regex"));

    separators
        .split(raw)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Escapes a property name for interpolation into a double-quoted attribute
/// selector.
pub fn escape_attr_value(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

fn key_selector(scope: &str, name: &str) -> String {
    format!(
        "{scope} .{PROPERTY_ROW_CLASS}[{PROPERTY_KEY_ATTR}=\"{}\"]",
        escape_attr_value(name)
    )
}

fn key_selectors(scope: &str, names: &[String]) -> Vec<String> {
    names.iter().map(|name| key_selector(scope, name)).collect()
}

fn rule_block(comment: &str, selectors: &[String], body: &str) -> String {
    format!("/* {comment} */\n{}\n{body}\n\n", selectors.join(",\n"))
}

fn scope_names(rules: &[PropertyRule], scope: HideScope) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| rule.hides_in(scope))
        .map(|rule| rule.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Renders the whole stylesheet from the settings record. Every category whose
/// input is empty or disabled is omitted entirely; identical settings always
/// produce byte-identical text. The caller replaces the previous stylesheet
/// wholesale, so there is no diffing here.
pub fn render_snippet(settings: &AppSettings) -> String {
    let mut out = String::from(SNIPPET_HEADER);
    out.push('\n');

    let table = format!(".{TABLE_CONTAINER_CLASS}");
    let table_inactive = format!(".{TABLE_CONTAINER_CLASS}:not(.{TABLE_ACTIVE_CLASS})");
    let file_panel = format!(".{FILE_PANEL_CLASS}");
    let hide = "{ display: none !important; }";

    // A checkbox is never "empty", so empty-value hiding skips rows holding a
    // checkbox input.
    let empty_row = format!(
        ".{PROPERTY_ROW_CLASS}:has(.{PROPERTY_VALUE_CLASS}.{EMPTY_VALUE_CLASS}):not(:has(input.{CHECKBOX_INPUT_CLASS}))"
    );

    if settings.hide_empty_properties {
        out.push_str(&rule_block(
            "Hide empty properties (main table)",
            &[format!("{table_inactive} {empty_row}")],
            hide,
        ));
    }
    if settings.hide_empty_in_side_panel {
        out.push_str(&rule_block(
            "Hide empty properties (file properties)",
            &[format!("{file_panel} {empty_row}")],
            hide,
        ));
    }

    let visible = parse_name_list(&settings.properties_visible);
    if !visible.is_empty() {
        out.push_str(&rule_block(
            "Force visible",
            &key_selectors(&table, &visible),
            "{ display: flex !important; }",
        ));
    }

    let invisible = parse_name_list(&settings.properties_invisible);
    if !invisible.is_empty() {
        out.push_str(&rule_block(
            "Force invisible (inactive table)",
            &key_selectors(&table_inactive, &invisible),
            hide,
        ));
    }

    let invisible_always = parse_name_list(&settings.properties_invisible_always);
    if !invisible_always.is_empty() {
        out.push_str(&rule_block(
            "Force invisible (always)",
            &key_selectors(&table, &invisible_always),
            hide,
        ));
    }

    let trigger = settings.table_hide_property.trim();
    if !trigger.is_empty() {
        out.push_str(&rule_block(
            "Hide the whole table when the trigger property is present",
            &[format!(
                "{table}:has(.{PROPERTY_ROW_CLASS}[{PROPERTY_KEY_ATTR}=\"{}\"])",
                escape_attr_value(trigger)
            )],
            hide,
        ));
    }

    let rule_inactive = scope_names(&settings.rules, HideScope::TableInactive);
    if !rule_inactive.is_empty() {
        out.push_str(&rule_block(
            "Rules: hide in inactive table",
            &key_selectors(&table_inactive, &rule_inactive),
            hide,
        ));
    }
    let rule_always = scope_names(&settings.rules, HideScope::TableActive);
    if !rule_always.is_empty() {
        out.push_str(&rule_block(
            "Rules: always hide in table",
            &key_selectors(&table, &rule_always),
            hide,
        ));
    }
    let rule_file = scope_names(&settings.rules, HideScope::FileProperties);
    if !rule_file.is_empty() {
        out.push_str(&rule_block(
            "Rules: hide in file properties",
            &key_selectors(&file_panel, &rule_file),
            hide,
        ));
    }
    // The all-properties scope is applied by toggling a marker class on the
    // overview items, not by generated CSS.

    out
}

/// One-time upgrade from the two legacy invisible lists to per-property rules.
/// Names in both lists get both table scopes; names in one list get that
/// list's scope only. Output order is first appearance scanning the inactive
/// list then the always list, duplicates collapse, and both legacy fields are
/// cleared so the renderer cannot emit the same rule twice. Returns whether
/// anything changed; a populated rule list makes this a no-op.
pub fn upgrade_legacy_lists(settings: &mut AppSettings) -> bool {
    if !settings.rules.is_empty() {
        return false;
    }

    let inactive = parse_name_list(&settings.properties_invisible);
    let always = parse_name_list(&settings.properties_invisible_always);
    if inactive.is_empty() && always.is_empty() {
        return false;
    }

    let mut rules: Vec<PropertyRule> = Vec::new();
    for name in inactive.iter().chain(always.iter()) {
        if rules.iter().any(|rule| &rule.name == name) {
            continue;
        }
        let mut rule = PropertyRule::named(name.clone());
        rule.table_inactive = inactive.contains(name);
        rule.table_active = always.contains(name);
        rules.push(rule);
    }

    settings.rules = rules;
    settings.properties_invisible.clear();
    settings.properties_invisible_always.clear();
    true
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    Text(String),
    Checkbox(bool),
    List(Vec<String>),
    Empty,
}

impl PropertyValue {
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Text(text) => text.trim().is_empty(),
            PropertyValue::Checkbox(_) => false,
            PropertyValue::List(items) => items.is_empty(),
            PropertyValue::Empty => true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NoteProperty {
    pub key: String,
    pub value: PropertyValue,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PropertyCount {
    pub key: String,
    pub count: usize,
}
