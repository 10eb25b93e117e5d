use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tauri::{AppHandle, Emitter, Manager, WebviewUrl, WebviewWindowBuilder};

const PLUGINS_DIR: &str = ".plugins";
const SETTINGS_FILE: &str = "settings.json";
const SNIPPET_FILE_NAME: &str = "veilstone-auto.css";

const WELCOME_NOTE: &str = "---\ntitle: Welcome\ntags: [getting-started]\nstatus: draft\npublished: false\nrating:\ninternal-id: vlt-0001\n---\n\n# Welcome to Veilstone\n\nVeilstone keeps noisy frontmatter out of sight.\n\n- Open **Settings** to hide properties per view.\n- Empty properties such as `rating` stay hidden until the table gains focus.\n- The generated stylesheet is mirrored to `.plugins/veilstone-auto.css`.\n";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
enum PropertyValue {
    Text(String),
    Checkbox(bool),
    List(Vec<String>),
    Empty,
}

#[derive(Serialize, Debug, PartialEq)]
struct NoteProperty {
    key: String,
    value: PropertyValue,
}

#[derive(Serialize)]
struct NotePayload {
    properties: Vec<NoteProperty>,
    body: String,
}

#[derive(Serialize, Debug, PartialEq)]
struct PropertyCount {
    key: String,
    count: usize,
}

/// Where the settings blob lives. The commands go through this seam so the
/// persistence rules can be exercised without a vault on disk.
trait SettingsStore {
    fn read(&self) -> Result<Option<String>, String>;
    fn write(&self, raw: &str) -> Result<(), String>;
}

struct VaultStore {
    vault_path: PathBuf,
}

impl VaultStore {
    fn new(vault_path: &str) -> Self {
        Self {
            vault_path: PathBuf::from(vault_path),
        }
    }

    fn settings_path(&self) -> PathBuf {
        self.vault_path.join(SETTINGS_FILE)
    }
}

impl SettingsStore for VaultStore {
    fn read(&self) -> Result<Option<String>, String> {
        match fs::read_to_string(self.settings_path()) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.to_string()),
        }
    }

    fn write(&self, raw: &str) -> Result<(), String> {
        fs::write(self.settings_path(), raw).map_err(|e| e.to_string())
    }
}

fn normalize_rel_path(path: &str) -> String {
    path.trim().replace('\\', "/").trim_matches('/').to_string()
}

fn ensure_markdown_extension(path: &str) -> String {
    let normalized = normalize_rel_path(path);
    if normalized.to_ascii_lowercase().ends_with(".md") {
        normalized
    } else {
        format!("{normalized}.md")
    }
}

fn collect_markdown_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), String> {
    let read_dir = fs::read_dir(dir).map_err(|e| e.to_string())?;
    for entry in read_dir {
        let entry = entry.map_err(|e| e.to_string())?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            collect_markdown_files(root, &path, out)?;
            continue;
        }
        if !path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        {
            continue;
        }
        let rel = path
            .strip_prefix(root)
            .map_err(|e| e.to_string())?
            .to_string_lossy()
            .replace('\\', "/");
        out.push(rel);
    }
    Ok(())
}

fn collect_note_paths(vault_path: &str) -> Result<Vec<String>, String> {
    let root = Path::new(vault_path);
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    collect_markdown_files(root, root, &mut entries)?;
    entries.sort();
    Ok(entries)
}

fn property_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^\s:#-][^:]*):\s*(.*)$").expect("valid property line regex"))
}

fn strip_quotes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

fn classify_value(raw: &str) -> PropertyValue {
    match raw {
        "true" => return PropertyValue::Checkbox(true),
        "false" => return PropertyValue::Checkbox(false),
        _ => {}
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        let items: Vec<String> = inner
            .split(',')
            .map(|item| strip_quotes(item.trim()).to_string())
            .filter(|item| !item.is_empty())
            .collect();
        return PropertyValue::List(items);
    }
    PropertyValue::Text(strip_quotes(raw).to_string())
}

fn serialize_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Text(text) => text.clone(),
        PropertyValue::Checkbox(checked) => checked.to_string(),
        PropertyValue::List(items) => format!("[{}]", items.join(", ")),
        PropertyValue::Empty => String::new(),
    }
}

fn is_block_item(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed == "-" || trimmed.starts_with("- ")
}

/// Splits a note into its frontmatter properties and the remaining body.
/// Anything that is not a well-formed `---` block at the very top counts as
/// body. Only top-level `key: value` lines become properties; a bare key
/// followed by `- item` lines becomes a list.
fn parse_frontmatter(content: &str) -> (Vec<NoteProperty>, String) {
    let lines: Vec<&str> = content.lines().collect();
    if lines.first().map(|line| line.trim_end()) != Some("---") {
        return (Vec::new(), content.to_string());
    }
    let Some(offset) = lines.iter().skip(1).position(|line| line.trim_end() == "---") else {
        return (Vec::new(), content.to_string());
    };
    let close = offset + 1;

    let mut properties = Vec::new();
    let mut index = 1;
    while index < close {
        let Some(caps) = property_line_re().captures(lines[index]) else {
            index += 1;
            continue;
        };
        let key = caps[1].trim().to_string();
        let raw_value = caps[2].trim().to_string();
        index += 1;

        if raw_value.is_empty() {
            let mut items = Vec::new();
            while index < close && is_block_item(lines[index]) {
                let item = lines[index].trim_start().trim_start_matches('-').trim();
                let item = strip_quotes(item);
                if !item.is_empty() {
                    items.push(item.to_string());
                }
                index += 1;
            }
            let value = if items.is_empty() {
                PropertyValue::Empty
            } else {
                PropertyValue::List(items)
            };
            properties.push(NoteProperty { key, value });
        } else {
            properties.push(NoteProperty {
                key,
                value: classify_value(&raw_value),
            });
        }
    }

    let body = if close + 1 < lines.len() {
        lines[close + 1..].join("\n")
    } else {
        String::new()
    };
    (properties, body)
}

/// Replaces one property's value inside the frontmatter block, swallowing any
/// block-list items that belonged to the old value. Returns None when the note
/// has no frontmatter or the key is absent; the caller treats that as a no-op.
fn rewrite_property_value(content: &str, key: &str, value: &PropertyValue) -> Option<String> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.first().map(|line| line.trim_end()) != Some("---") {
        return None;
    }
    let close = lines
        .iter()
        .skip(1)
        .position(|line| line.trim_end() == "---")?
        + 1;

    let mut out: Vec<String> = Vec::new();
    let mut replaced = false;
    let mut index = 0;
    while index < lines.len() {
        if index > 0 && index < close && !replaced {
            if let Some(caps) = property_line_re().captures(lines[index]) {
                if caps[1].trim() == key {
                    let serialized = serialize_value(value);
                    if serialized.is_empty() {
                        out.push(format!("{key}:"));
                    } else {
                        out.push(format!("{key}: {serialized}"));
                    }
                    replaced = true;
                    index += 1;
                    while index < close && is_block_item(lines[index]) {
                        index += 1;
                    }
                    continue;
                }
            }
        }
        out.push(lines[index].to_string());
        index += 1;
    }

    if !replaced {
        return None;
    }
    let mut rebuilt = out.join("\n");
    if content.ends_with('\n') {
        rebuilt.push('\n');
    }
    Some(rebuilt)
}

#[tauri::command]
fn read_dir(path: &str) -> Result<Vec<String>, String> {
    collect_note_paths(path)
}

#[tauri::command]
fn read_note(vault_path: &str, path: &str) -> Result<NotePayload, String> {
    let abs = Path::new(vault_path).join(path);
    let content = fs::read_to_string(abs).map_err(|e| e.to_string())?;
    let (properties, body) = parse_frontmatter(&content);
    Ok(NotePayload { properties, body })
}

#[tauri::command]
fn write_note_property(
    vault_path: &str,
    path: &str,
    key: &str,
    value: PropertyValue,
) -> Result<(), String> {
    let abs = Path::new(vault_path).join(path);
    let content = fs::read_to_string(&abs).map_err(|e| e.to_string())?;
    match rewrite_property_value(&content, key, &value) {
        Some(rewritten) => fs::write(&abs, rewritten).map_err(|e| e.to_string()),
        None => {
            warn!("property {key:?} not found in {path}, write skipped");
            Ok(())
        }
    }
}

#[tauri::command]
fn create_note(vault_path: &str, name: &str) -> Result<String, String> {
    let rel = ensure_markdown_extension(name);
    if rel == ".md" {
        return Err("Note name cannot be empty".to_string());
    }
    let abs = Path::new(vault_path).join(&rel);
    if abs.exists() {
        return Err(format!("Note already exists: {rel}"));
    }
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let stem = Path::new(&rel)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled");
    let content = format!(
        "---\ntitle: {stem}\ntags: []\nstatus: draft\npublished: false\n---\n\n# {stem}\n"
    );
    fs::write(&abs, content).map_err(|e| e.to_string())?;
    info!("created note {rel}");
    Ok(rel)
}

#[tauri::command]
fn collect_all_properties(vault_path: &str) -> Result<Vec<PropertyCount>, String> {
    let root = PathBuf::from(vault_path);
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for rel_path in collect_note_paths(vault_path)? {
        let content = fs::read_to_string(root.join(&rel_path)).unwrap_or_default();
        let (properties, _) = parse_frontmatter(&content);
        for prop in properties {
            *counts.entry(prop.key).or_insert(0) += 1;
        }
    }
    Ok(counts
        .into_iter()
        .map(|(key, count)| PropertyCount { key, count })
        .collect())
}

#[tauri::command]
fn init_vault(app_handle: AppHandle) -> Result<String, String> {
    let docs = app_handle
        .path()
        .document_dir()
        .map_err(|e| e.to_string())?;
    let vault_path = docs.join("VeilstoneVault");

    if !vault_path.exists() {
        fs::create_dir_all(&vault_path).map_err(|e| e.to_string())?;
        let welcome_path = vault_path.join("Welcome.md");
        fs::write(&welcome_path, WELCOME_NOTE).map_err(|e| e.to_string())?;
        info!("seeded vault at {}", vault_path.display());
    }

    let plugins_path = vault_path.join(PLUGINS_DIR);
    if !plugins_path.exists() {
        fs::create_dir_all(&plugins_path).map_err(|e| e.to_string())?;
        let theme_stub = plugins_path.join("theme.css");
        fs::write(&theme_stub, "/* Put custom plugin CSS here to override default CSS variables */\n/* :root { --accent-color: #7c3aed; } */\n").map_err(|e| e.to_string())?;
    }

    // Veilstone config space for future app state.
    let config_path = vault_path.join(".veilstone");
    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| e.to_string())?;
    }

    let store = VaultStore::new(&vault_path.to_string_lossy());
    if store.read()?.is_none() {
        store.write("{}")?;
    }

    Ok(vault_path.to_string_lossy().into_owned())
}

#[tauri::command]
fn choose_vault() -> Option<String> {
    rfd::FileDialog::new()
        .set_title("Choose a vault folder")
        .pick_folder()
        .map(|path| path.to_string_lossy().into_owned())
}

#[tauri::command]
fn load_plugins_css(vault_path: &str) -> Result<String, String> {
    let mut compiled_css = String::new();
    let plugins_dir = Path::new(vault_path).join(PLUGINS_DIR);
    if let Ok(entries) = fs::read_dir(plugins_dir) {
        for entry in entries.flatten() {
            let p = entry.path();
            if !p.extension().is_some_and(|ext| ext == "css") {
                continue;
            }
            // The generated snippet is applied live by the frontend; loading
            // it here as well would shadow the enable toggle with stale rules.
            if p.file_name().is_some_and(|name| name == SNIPPET_FILE_NAME) {
                continue;
            }
            if let Ok(css_content) = fs::read_to_string(&p) {
                compiled_css.push_str(&css_content);
                compiled_css.push('\n');
            }
        }
    }
    Ok(compiled_css)
}

#[tauri::command]
fn write_snippet(vault_path: &str, css: &str) -> Result<(), String> {
    let plugins_dir = Path::new(vault_path).join(PLUGINS_DIR);
    fs::create_dir_all(&plugins_dir).map_err(|e| e.to_string())?;
    let snippet_path = plugins_dir.join(SNIPPET_FILE_NAME);
    fs::write(&snippet_path, css).map_err(|e| e.to_string())?;
    info!("snippet rewritten ({} bytes)", css.len());
    Ok(())
}

#[tauri::command]
fn save_settings(app: AppHandle, vault_path: &str, settings: &str) -> Result<(), String> {
    // Refuse to persist a blob load_settings could not hand back out.
    serde_json::from_str::<serde_json::Value>(settings).map_err(|e| e.to_string())?;
    let store = VaultStore::new(vault_path);
    store.write(settings)?;
    info!("settings saved ({} bytes)", settings.len());
    let _ = app.emit("settings-updated", settings);
    Ok(())
}

#[tauri::command]
fn load_settings(vault_path: &str) -> Result<String, String> {
    let store = VaultStore::new(vault_path);
    Ok(store.read()?.unwrap_or_else(|| "{}".to_string()))
}

#[tauri::command]
fn open_settings_window(app: AppHandle) -> Result<(), String> {
    if let Some(window) = app.get_webview_window("settings") {
        let _ = window.set_focus();
    } else {
        WebviewWindowBuilder::new(
            &app,
            "settings",
            WebviewUrl::App("index.html?settings=true".into()),
        )
        .title("Veilstone Settings")
        .inner_size(800.0, 700.0)
        .build()
        .map_err(|e| e.to_string())?;
    }
    Ok(())
}

#[tauri::command]
fn reveal_snippet(vault_path: &str) -> Result<(), String> {
    let snippet_path = Path::new(vault_path)
        .join(PLUGINS_DIR)
        .join(SNIPPET_FILE_NAME);
    tauri_plugin_opener::reveal_item_in_dir(&snippet_path).map_err(|e| e.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            read_dir,
            read_note,
            write_note_property,
            create_note,
            collect_all_properties,
            init_vault,
            choose_vault,
            load_plugins_css,
            write_snippet,
            save_settings,
            load_settings,
            open_settings_window,
            reveal_snippet
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct MemStore {
        raw: RefCell<Option<String>>,
    }

    impl MemStore {
        fn new(raw: Option<&str>) -> Self {
            Self {
                raw: RefCell::new(raw.map(str::to_string)),
            }
        }
    }

    impl SettingsStore for MemStore {
        fn read(&self) -> Result<Option<String>, String> {
            Ok(self.raw.borrow().clone())
        }

        fn write(&self, raw: &str) -> Result<(), String> {
            *self.raw.borrow_mut() = Some(raw.to_string());
            Ok(())
        }
    }

    fn temp_vault(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("veilstone-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp vault");
        dir
    }

    const NOTE: &str = "---\ntitle: Demo\ntags: [a, b]\nstatus: draft\npublished: false\nrating:\nlinks:\n- one\n- two\n---\n\n# Demo\n\nBody text.\n";

    #[test]
    fn parses_each_value_kind() {
        let (props, body) = parse_frontmatter(NOTE);
        let keys: Vec<&str> = props.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["title", "tags", "status", "published", "rating", "links"]
        );
        assert_eq!(props[0].value, PropertyValue::Text("Demo".to_string()));
        assert_eq!(
            props[1].value,
            PropertyValue::List(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(props[3].value, PropertyValue::Checkbox(false));
        assert_eq!(props[4].value, PropertyValue::Empty);
        assert_eq!(
            props[5].value,
            PropertyValue::List(vec!["one".to_string(), "two".to_string()])
        );
        assert!(body.contains("# Demo"));
        assert!(!body.contains("---"));
    }

    #[test]
    fn content_without_frontmatter_has_no_properties() {
        let (props, body) = parse_frontmatter("# Just a note\n");
        assert!(props.is_empty());
        assert_eq!(body, "# Just a note\n");
    }

    #[test]
    fn unclosed_frontmatter_is_not_frontmatter() {
        let content = "---\ntitle: Broken\n\n# Body\n";
        let (props, body) = parse_frontmatter(content);
        assert!(props.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn strips_matching_quotes_only() {
        assert_eq!(strip_quotes("\"quoted\""), "quoted");
        assert_eq!(strip_quotes("'quoted'"), "quoted");
        assert_eq!(strip_quotes("\"mismatched'"), "\"mismatched'");
        assert_eq!(strip_quotes("plain"), "plain");
    }

    #[test]
    fn empty_inline_list_parses_as_empty_list() {
        let (props, _) = parse_frontmatter("---\ntags: []\n---\n");
        assert_eq!(props[0].value, PropertyValue::List(Vec::new()));
    }

    #[test]
    fn rewrites_a_text_value_in_place() {
        let rewritten =
            rewrite_property_value(NOTE, "status", &PropertyValue::Text("done".to_string()))
                .unwrap();
        assert!(rewritten.contains("status: done"));
        assert!(!rewritten.contains("status: draft"));
        assert!(rewritten.contains("Body text."));
    }

    #[test]
    fn rewriting_a_block_list_swallows_its_items() {
        let rewritten =
            rewrite_property_value(NOTE, "links", &PropertyValue::Text("n/a".to_string()))
                .unwrap();
        assert!(rewritten.contains("links: n/a"));
        assert!(!rewritten.contains("- one"));
        assert!(!rewritten.contains("- two"));
    }

    #[test]
    fn clearing_a_value_leaves_a_bare_key() {
        let rewritten = rewrite_property_value(NOTE, "status", &PropertyValue::Empty).unwrap();
        assert!(rewritten.contains("\nstatus:\n"));
    }

    #[test]
    fn missing_key_leaves_the_note_untouched() {
        assert!(rewrite_property_value(NOTE, "unknown", &PropertyValue::Checkbox(true)).is_none());
        assert!(
            rewrite_property_value("# No frontmatter\n", "title", &PropertyValue::Empty).is_none()
        );
    }

    #[test]
    fn round_trips_through_parse_after_rewrite() {
        let rewritten =
            rewrite_property_value(NOTE, "published", &PropertyValue::Checkbox(true)).unwrap();
        let (props, _) = parse_frontmatter(&rewritten);
        let published = props.iter().find(|p| p.key == "published").unwrap();
        assert_eq!(published.value, PropertyValue::Checkbox(true));
    }

    #[test]
    fn collects_note_paths_recursively_and_skips_dotfiles() {
        let dir = temp_vault("paths");
        fs::write(dir.join("b.md"), "b").unwrap();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/a.md"), "a").unwrap();
        fs::write(dir.join("notes.txt"), "skip").unwrap();
        fs::create_dir_all(dir.join(".plugins")).unwrap();
        fs::write(dir.join(".plugins/x.md"), "skip").unwrap();

        let paths = collect_note_paths(&dir.to_string_lossy()).unwrap();
        assert_eq!(paths, vec!["b.md".to_string(), "nested/a.md".to_string()]);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn counts_properties_across_the_vault() {
        let dir = temp_vault("counts");
        fs::write(dir.join("one.md"), "---\ntags: [x]\nstatus: a\n---\n").unwrap();
        fs::write(dir.join("two.md"), "---\nstatus: b\n---\n").unwrap();

        let counts = collect_all_properties(&dir.to_string_lossy()).unwrap();
        assert_eq!(
            counts,
            vec![
                PropertyCount {
                    key: "status".to_string(),
                    count: 2
                },
                PropertyCount {
                    key: "tags".to_string(),
                    count: 1
                },
            ]
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn vault_store_reads_back_what_it_wrote() {
        let dir = temp_vault("store");
        let store = VaultStore::new(&dir.to_string_lossy());
        assert_eq!(store.read().unwrap(), None);
        store.write("{\"enableSnippet\":false}").unwrap();
        assert_eq!(
            store.read().unwrap().as_deref(),
            Some("{\"enableSnippet\":false}")
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_settings_fall_back_to_an_empty_object() {
        let store = MemStore::new(None);
        let raw = store.read().unwrap().unwrap_or_else(|| "{}".to_string());
        assert_eq!(raw, "{}");
        store.write("{\"autoFold\":true}").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("{\"autoFold\":true}"));
    }

    #[test]
    fn snippet_write_creates_the_plugins_dir_and_overwrites() {
        let dir = temp_vault("snippet");
        write_snippet(&dir.to_string_lossy(), "/* css */").unwrap();
        let snippet_path = dir.join(PLUGINS_DIR).join(SNIPPET_FILE_NAME);
        assert_eq!(fs::read_to_string(&snippet_path).unwrap(), "/* css */");

        write_snippet(&dir.to_string_lossy(), "/* newer */").unwrap();
        assert_eq!(fs::read_to_string(&snippet_path).unwrap(), "/* newer */");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn plugin_css_skips_the_generated_snippet() {
        let dir = temp_vault("plugins");
        fs::create_dir_all(dir.join(PLUGINS_DIR)).unwrap();
        fs::write(dir.join(PLUGINS_DIR).join("theme.css"), ":root {}").unwrap();
        fs::write(
            dir.join(PLUGINS_DIR).join(SNIPPET_FILE_NAME),
            "/* generated */",
        )
        .unwrap();

        let css = load_plugins_css(&dir.to_string_lossy()).unwrap();
        assert!(css.contains(":root {}"));
        assert!(!css.contains("generated"));
        let _ = fs::remove_dir_all(dir);
    }
}
