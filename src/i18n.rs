use leptos::prelude::window;

pub struct Locale {
    pub app_title: &'static str,
    pub new_note: &'static str,
    pub open_settings: &'static str,
    pub choose_vault: &'static str,
    pub select_hint: &'static str,
    pub properties_header: &'static str,
    pub file_properties_header: &'static str,
    pub all_properties_header: &'static str,
    pub empty_value_placeholder: &'static str,
    pub settings_title: &'static str,
    pub enable_snippet: &'static str,
    pub enable_snippet_desc: &'static str,
    pub hide_empty: &'static str,
    pub hide_empty_side: &'static str,
    pub auto_fold: &'static str,
    pub properties_visible: &'static str,
    pub comma_separated: &'static str,
    pub table_hide_property: &'static str,
    pub table_hide_property_desc: &'static str,
    pub rules_header: &'static str,
    pub rules_desc: &'static str,
    pub add_rule: &'static str,
    pub remove_rule: &'static str,
    pub rule_name_placeholder: &'static str,
    pub hide_table_inactive: &'static str,
    pub hide_table_active: &'static str,
    pub hide_file_properties: &'static str,
    pub hide_all_properties: &'static str,
    pub notice_empty_rule_name: &'static str,
    pub reveal_snippet: &'static str,
}

pub const EN: Locale = Locale {
    app_title: "Veilstone",
    new_note: "New note",
    open_settings: "Settings",
    choose_vault: "Choose vault",
    select_hint: "Select a note from the sidebar.",
    properties_header: "Properties",
    file_properties_header: "File properties",
    all_properties_header: "All properties",
    empty_value_placeholder: "Empty",
    settings_title: "Veilstone settings",
    enable_snippet: "Enable style snippet",
    enable_snippet_desc: "Apply the generated hiding rules to the property panels.",
    hide_empty: "Hide empty properties",
    hide_empty_side: "Hide empty properties in file properties (side dock)",
    auto_fold: "Fold the property table when opening a note",
    properties_visible: "Always visible properties",
    comma_separated: "Separate names with a comma (,)",
    table_hide_property: "Property that hides the whole table",
    table_hide_property_desc: "Notes carrying this property hide their property table entirely.",
    rules_header: "Property rules",
    rules_desc: "Per-property hiding, one scope per view.",
    add_rule: "Add rule",
    remove_rule: "Remove",
    rule_name_placeholder: "Property name",
    hide_table_inactive: "Hide in property table",
    hide_table_active: "Always hide in property table",
    hide_file_properties: "Hide in file properties (side dock)",
    hide_all_properties: "Hide in all properties (side dock)",
    notice_empty_rule_name: "A rule with an empty name already exists. Name it first.",
    reveal_snippet: "Reveal snippet file",
};

pub const ZH: Locale = Locale {
    app_title: "Veilstone",
    new_note: "新建笔记",
    open_settings: "设置",
    choose_vault: "选择仓库",
    select_hint: "从侧边栏选择一个笔记。",
    properties_header: "属性",
    file_properties_header: "文件属性",
    all_properties_header: "所有属性",
    empty_value_placeholder: "空",
    settings_title: "Veilstone 设置",
    enable_snippet: "启用样式片段",
    enable_snippet_desc: "将生成的隐藏规则应用到属性面板。",
    hide_empty: "隐藏空属性",
    hide_empty_side: "隐藏文件属性中的空属性（侧边栏）",
    auto_fold: "打开笔记时折叠属性表格",
    properties_visible: "总是显示的属性",
    comma_separated: "以逗号（,）分隔",
    table_hide_property: "隐藏整个表格的触发属性",
    table_hide_property_desc: "包含该属性的笔记会隐藏整个属性表格。",
    rules_header: "属性规则",
    rules_desc: "按属性名配置各视图中的隐藏行为。",
    add_rule: "添加规则",
    remove_rule: "删除",
    rule_name_placeholder: "属性名",
    hide_table_inactive: "隐藏在属性表格中",
    hide_table_active: "总是隐藏在属性表格中",
    hide_file_properties: "隐藏在文件属性中（侧边栏）",
    hide_all_properties: "隐藏在所有属性中（侧边栏）",
    notice_empty_rule_name: "已存在名称为空的规则，请先填写名称。",
    reveal_snippet: "显示生成的样式片段",
};

impl Locale {
    /// Picks the locale the host stored under the `language` key, the same key
    /// note apps write. Anything other than Chinese falls back to English.
    pub fn current() -> &'static Locale {
        let language = window()
            .local_storage()
            .ok()
            .flatten()
            .and_then(|storage| storage.get_item("language").ok().flatten())
            .unwrap_or_default();
        match language.as_str() {
            "zh" | "zh-tw" => &ZH,
            _ => &EN,
        }
    }
}
