use leptos::leptos_dom::helpers::set_timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wasm_bindgen::{prelude::*, JsCast};

use crate::host_view::{apply_overview_markers, DomView, FocusMirror, PanelView, FOCUS_GRACE_MS};
use crate::i18n::Locale;
use crate::visibility_core::{
    render_snippet, upgrade_legacy_lists, AppSettings, NoteProperty, PropertyCount, PropertyRule,
    PropertyValue,
};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"])]
    async fn invoke(cmd: &str, args: JsValue) -> JsValue;
}

const SNIPPET_DEBOUNCE_MS: u64 = 1000;
const NOTICE_MS: u64 = 2500;

// Commands resolve each argument by the lower-camel form of its Rust name,
// so the arg structs serialize camelCase.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VaultArgs<'a> {
    vault_path: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadDirArgs<'a> {
    path: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadNoteArgs<'a> {
    vault_path: &'a str,
    path: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WritePropertyArgs<'a> {
    vault_path: &'a str,
    path: &'a str,
    key: &'a str,
    value: &'a PropertyValue,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateNoteArgs<'a> {
    vault_path: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveSettingsArgs<'a> {
    vault_path: &'a str,
    settings: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteSnippetArgs<'a> {
    vault_path: &'a str,
    css: &'a str,
}

#[derive(Deserialize)]
struct NotePayload {
    properties: Vec<NoteProperty>,
    body: String,
}

async fn fetch_files(vault: &str) -> Vec<String> {
    let args = serde_wasm_bindgen::to_value(&ReadDirArgs { path: vault }).unwrap();
    serde_wasm_bindgen::from_value(invoke("read_dir", args).await).unwrap_or_default()
}

async fn fetch_note(vault: &str, path: &str) -> Option<NotePayload> {
    let args = serde_wasm_bindgen::to_value(&ReadNoteArgs { vault_path: vault, path }).unwrap();
    serde_wasm_bindgen::from_value(invoke("read_note", args).await).ok()
}

async fn fetch_all_properties(vault: &str) -> Vec<PropertyCount> {
    let args = serde_wasm_bindgen::to_value(&VaultArgs { vault_path: vault }).unwrap();
    serde_wasm_bindgen::from_value(invoke("collect_all_properties", args).await).unwrap_or_default()
}

async fn fetch_plugin_css(vault: &str) -> String {
    let args = serde_wasm_bindgen::to_value(&VaultArgs { vault_path: vault }).unwrap();
    invoke("load_plugins_css", args).await.as_string().unwrap_or_default()
}

async fn fetch_settings(vault: &str) -> AppSettings {
    let args = serde_wasm_bindgen::to_value(&VaultArgs { vault_path: vault }).unwrap();
    let raw = invoke("load_settings", args)
        .await
        .as_string()
        .unwrap_or_else(|| "{}".to_string());
    AppSettings::from_json(&raw)
}

async fn persist_settings(vault: &str, settings: &AppSettings) {
    let json = settings.to_json();
    let args = serde_wasm_bindgen::to_value(&SaveSettingsArgs {
        vault_path: vault,
        settings: &json,
    })
    .unwrap();
    invoke("save_settings", args).await;
}

fn markdown_to_html(source: &str) -> String {
    let parser = pulldown_cmark::Parser::new(source);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

fn text_value(raw: &str) -> PropertyValue {
    if raw.trim().is_empty() {
        PropertyValue::Empty
    } else {
        PropertyValue::Text(raw.to_string())
    }
}

#[component]
pub fn App() -> impl IntoView {
    let i18n = Locale::current();

    let (vault_path, set_vault_path) = signal(String::new());
    let (files, set_files) = signal(Vec::<String>::new());
    let (current_file, set_current_file) = signal(None::<String>);
    let (properties, set_properties) = signal(Vec::<NoteProperty>::new());
    let (body_html, set_body_html) = signal(String::new());
    let (all_properties, set_all_properties) = signal(Vec::<PropertyCount>::new());
    let (settings, set_settings) = signal(AppSettings::default());
    let (plugin_css, set_plugin_css) = signal(String::new());
    let (folded, set_folded) = signal(false);
    let (notice, set_notice) = signal(None::<String>);

    let is_settings_window = window()
        .location()
        .search()
        .unwrap_or_default()
        .contains("settings=true");

    // Settings saved in either window come back through a backend event that
    // the page glue re-broadcasts as a DOM CustomEvent.
    {
        let closure =
            Closure::<dyn FnMut(web_sys::CustomEvent)>::new(move |event: web_sys::CustomEvent| {
                if let Some(raw) = event.detail().as_string() {
                    set_settings.set(AppSettings::from_json(&raw));
                }
            });
        let _ = window()
            .add_event_listener_with_callback("veilstone-settings", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    Effect::new(move |_| {
        spawn_local(async move {
            let vault = invoke("init_vault", JsValue::NULL)
                .await
                .as_string()
                .unwrap_or_default();
            if vault.is_empty() {
                return;
            }
            set_vault_path.set(vault.clone());
            set_files.set(fetch_files(&vault).await);
            set_plugin_css.set(fetch_plugin_css(&vault).await);
            set_all_properties.set(fetch_all_properties(&vault).await);

            // The main window owns the one-time upgrade of the legacy lists;
            // the settings window just consumes the result.
            let mut loaded = fetch_settings(&vault).await;
            if !is_settings_window && upgrade_legacy_lists(&mut loaded) {
                leptos::logging::log!("migrated {} legacy visibility entries", loaded.rules.len());
                persist_settings(&vault, &loaded).await;
            }
            set_settings.set(loaded);
        });
    });

    // Apply the generated stylesheet and the overview markers whenever the
    // settings change or the overview list re-renders.
    Effect::new(move |_| {
        if is_settings_window {
            return;
        }
        let current = settings.get();
        let _ = all_properties.get();
        let view = DomView;
        let css = if current.enable_snippet {
            render_snippet(&current)
        } else {
            String::new()
        };
        view.replace_stylesheet(&css);
        apply_overview_markers(&view, &current);
    });

    // Mirror the stylesheet into the vault's snippet file, coalescing rapid
    // edits. A stale generation means a newer edit superseded this one.
    let write_generation = StoredValue::new(0u64);
    Effect::new(move |_| {
        if is_settings_window {
            return;
        }
        let current = settings.get();
        let vault = vault_path.get();
        if vault.is_empty() {
            return;
        }
        let css = render_snippet(&current);
        let mut generation = 0;
        write_generation.update_value(|g| {
            *g += 1;
            generation = *g;
        });
        set_timeout(
            move || {
                let mut stale = false;
                write_generation.update_value(|g| stale = *g != generation);
                if stale {
                    return;
                }
                spawn_local(async move {
                    let args = serde_wasm_bindgen::to_value(&WriteSnippetArgs {
                        vault_path: &vault,
                        css: &css,
                    })
                    .unwrap();
                    invoke("write_snippet", args).await;
                });
            },
            Duration::from_millis(SNIPPET_DEBOUNCE_MS),
        );
    });

    let focus_mirror = StoredValue::new(FocusMirror::new());
    let on_focus_in = move |_| {
        focus_mirror.update_value(|mirror| mirror.focus_gained(&DomView));
    };
    let on_focus_out = move |_| {
        let mut token = 0;
        focus_mirror.update_value(|mirror| token = mirror.focus_lost());
        set_timeout(
            move || {
                focus_mirror.update_value(|mirror| mirror.grace_elapsed(token, &DomView));
            },
            Duration::from_millis(FOCUS_GRACE_MS),
        );
    };

    let notice_generation = StoredValue::new(0u64);
    let show_notice = move |message: String| {
        set_notice.set(Some(message));
        let mut generation = 0;
        notice_generation.update_value(|g| {
            *g += 1;
            generation = *g;
        });
        set_timeout(
            move || {
                let mut stale = false;
                notice_generation.update_value(|g| stale = *g != generation);
                if !stale {
                    set_notice.set(None);
                }
            },
            Duration::from_millis(NOTICE_MS),
        );
    };

    let save_settings_to_disk = move |current: AppSettings| {
        let vault = vault_path.get_untracked();
        if vault.is_empty() {
            return;
        }
        spawn_local(async move {
            persist_settings(&vault, &current).await;
        });
    };

    let open_note = move |path: String| {
        let vault = vault_path.get_untracked();
        if vault.is_empty() {
            return;
        }
        set_current_file.set(Some(path.clone()));
        set_folded.set(settings.get_untracked().auto_fold);
        spawn_local(async move {
            if let Some(note) = fetch_note(&vault, &path).await {
                set_properties.set(note.properties);
                set_body_html.set(markdown_to_html(&note.body));
            }
        });
    };

    let write_property = move |key: String, value: PropertyValue| {
        let vault = vault_path.get_untracked();
        let Some(path) = current_file.get_untracked() else {
            return;
        };
        spawn_local(async move {
            let args = serde_wasm_bindgen::to_value(&WritePropertyArgs {
                vault_path: &vault,
                path: &path,
                key: &key,
                value: &value,
            })
            .unwrap();
            invoke("write_note_property", args).await;
            if let Some(note) = fetch_note(&vault, &path).await {
                set_properties.set(note.properties);
                set_body_html.set(markdown_to_html(&note.body));
            }
        });
    };

    let create_note = move |_| {
        let vault = vault_path.get_untracked();
        if vault.is_empty() {
            return;
        }
        let Ok(Some(name)) = window().prompt_with_message("Note name:") else {
            return;
        };
        let name = name.trim().to_string();
        if name.is_empty() {
            return;
        }
        spawn_local(async move {
            let args =
                serde_wasm_bindgen::to_value(&CreateNoteArgs { vault_path: &vault, name: &name })
                    .unwrap();
            let created = invoke("create_note", args).await.as_string();
            set_files.set(fetch_files(&vault).await);
            set_all_properties.set(fetch_all_properties(&vault).await);
            if let Some(path) = created {
                open_note(path);
            }
        });
    };

    let choose_vault = move |_| {
        spawn_local(async move {
            let Some(vault) = invoke("choose_vault", JsValue::NULL).await.as_string() else {
                return;
            };
            set_vault_path.set(vault.clone());
            set_current_file.set(None);
            set_properties.set(Vec::new());
            set_body_html.set(String::new());
            set_files.set(fetch_files(&vault).await);
            set_plugin_css.set(fetch_plugin_css(&vault).await);
            set_all_properties.set(fetch_all_properties(&vault).await);
            let mut loaded = fetch_settings(&vault).await;
            if upgrade_legacy_lists(&mut loaded) {
                leptos::logging::log!("migrated {} legacy visibility entries", loaded.rules.len());
                persist_settings(&vault, &loaded).await;
            }
            set_settings.set(loaded);
        });
    };

    let open_settings = move |_| {
        spawn_local(async move {
            invoke("open_settings_window", JsValue::NULL).await;
        });
    };

    let reveal_snippet = move |_| {
        let vault = vault_path.get_untracked();
        if vault.is_empty() {
            return;
        }
        spawn_local(async move {
            let args = serde_wasm_bindgen::to_value(&VaultArgs { vault_path: &vault }).unwrap();
            invoke("reveal_snippet", args).await;
        });
    };

    let add_rule = move |_| {
        let mut current = settings.get_untracked();
        if current.rules.iter().any(|rule| rule.name.trim().is_empty()) {
            show_notice(i18n.notice_empty_rule_name.to_string());
            return;
        }
        current.rules.push(PropertyRule::default());
        set_settings.set(current.clone());
        save_settings_to_disk(current);
    };

    let body = if is_settings_window {
        view! {
            <div style="flex: 1; overflow-y: auto; padding: 24px 28px;">
                <div style="max-width: 640px; margin: 0 auto;">
                    <div style="display: flex; align-items: center; justify-content: space-between; margin-bottom: 18px;">
                        <h2 style="margin: 0; font-size: 18px;">{i18n.settings_title}</h2>
                        <button
                            on:click=reveal_snippet
                            style="padding: 4px 10px; border: 1px solid var(--border-color); border-radius: var(--radius-md); background: var(--bg-secondary); color: var(--text-secondary); cursor: pointer; font-size: 12px;"
                        >
                            {i18n.reveal_snippet}
                        </button>
                    </div>

                    {toggle_row(
                        i18n.enable_snippet,
                        Some(i18n.enable_snippet_desc),
                        settings,
                        set_settings,
                        save_settings_to_disk,
                        |s| s.enable_snippet,
                        |s, on| s.enable_snippet = on,
                    )}
                    {toggle_row(
                        i18n.hide_empty,
                        None,
                        settings,
                        set_settings,
                        save_settings_to_disk,
                        |s| s.hide_empty_properties,
                        |s, on| s.hide_empty_properties = on,
                    )}
                    {toggle_row(
                        i18n.hide_empty_side,
                        None,
                        settings,
                        set_settings,
                        save_settings_to_disk,
                        |s| s.hide_empty_in_side_panel,
                        |s, on| s.hide_empty_in_side_panel = on,
                    )}
                    {toggle_row(
                        i18n.auto_fold,
                        None,
                        settings,
                        set_settings,
                        save_settings_to_disk,
                        |s| s.auto_fold,
                        |s, on| s.auto_fold = on,
                    )}

                    <div style="padding: 12px 0; border-bottom: 1px solid var(--border-color);">
                        <div>{i18n.properties_visible}</div>
                        <div style="font-size: 12px; color: var(--text-muted); margin: 2px 0 8px 0;">
                            {i18n.comma_separated}
                        </div>
                        <textarea
                            prop:value=move || settings.get().properties_visible
                            on:input=move |e| {
                                let mut current = settings.get_untracked();
                                current.properties_visible = event_target_value(&e);
                                set_settings.set(current.clone());
                                save_settings_to_disk(current);
                            }
                            style="width: 100%; min-height: 56px; box-sizing: border-box; padding: 6px 8px; border: 1px solid var(--border-color); border-radius: var(--radius-md); background: var(--bg-primary); color: var(--text-primary); font-family: var(--font-editor); font-size: 13px; resize: vertical;"
                        ></textarea>
                    </div>

                    <div style="padding: 12px 0; border-bottom: 1px solid var(--border-color);">
                        <div>{i18n.table_hide_property}</div>
                        <div style="font-size: 12px; color: var(--text-muted); margin: 2px 0 8px 0;">
                            {i18n.table_hide_property_desc}
                        </div>
                        <input
                            type="text"
                            prop:value=move || settings.get().table_hide_property
                            on:input=move |e| {
                                let mut current = settings.get_untracked();
                                current.table_hide_property = event_target_value(&e);
                                set_settings.set(current.clone());
                                save_settings_to_disk(current);
                            }
                            style="width: 100%; box-sizing: border-box; padding: 6px 8px; border: 1px solid var(--border-color); border-radius: var(--radius-md); background: var(--bg-primary); color: var(--text-primary); font-size: 13px;"
                        />
                    </div>

                    <div style="padding: 12px 0;">
                        <div style="display: flex; align-items: center; justify-content: space-between;">
                            <span>{i18n.rules_header}</span>
                            <button
                                on:click=add_rule
                                style="padding: 4px 10px; border: 1px solid var(--border-color); border-radius: var(--radius-md); background: var(--accent-color); color: white; cursor: pointer; font-size: 12px;"
                            >
                                {i18n.add_rule}
                            </button>
                        </div>
                        <div style="font-size: 12px; color: var(--text-muted); margin: 2px 0 10px 0;">
                            {i18n.rules_desc}
                        </div>
                        {move || {
                            settings
                                .get()
                                .rules
                                .into_iter()
                                .enumerate()
                                .map(|(index, rule)| {
                                    rule_editor(
                                        index,
                                        rule,
                                        i18n,
                                        settings,
                                        set_settings,
                                        save_settings_to_disk,
                                    )
                                })
                                .collect::<Vec<_>>()
                        }}
                    </div>
                </div>
            </div>
        }
        .into_any()
    } else {
        view! {
            <nav style="width: var(--sidebar-width); min-width: var(--sidebar-width); border-right: 1px solid var(--border-color); background: var(--bg-secondary); display: flex; flex-direction: column;">
                <div style="height: var(--topbar-height); display: flex; align-items: center; justify-content: space-between; padding: 0 12px; border-bottom: 1px solid var(--border-color);">
                    <span style="font-weight: 600;">{i18n.app_title}</span>
                    <div style="display: flex; gap: 6px;">
                        <button
                            title=i18n.new_note
                            on:click=create_note
                            style="width: 24px; height: 24px; border: none; border-radius: var(--radius-md); background: transparent; color: var(--text-secondary); cursor: pointer; font-size: 15px;"
                        >
                            "+"
                        </button>
                        <button
                            title=i18n.choose_vault
                            on:click=choose_vault
                            style="width: 24px; height: 24px; border: none; border-radius: var(--radius-md); background: transparent; color: var(--text-secondary); cursor: pointer; font-size: 13px;"
                        >
                            "\u{25a4}"
                        </button>
                        <button
                            title=i18n.open_settings
                            on:click=open_settings
                            style="width: 24px; height: 24px; border: none; border-radius: var(--radius-md); background: transparent; color: var(--text-secondary); cursor: pointer; font-size: 13px;"
                        >
                            "\u{2699}"
                        </button>
                    </div>
                </div>
                <div style="flex: 1; overflow-y: auto; padding: 8px;">
                    {move || {
                        let selected = current_file.get();
                        files
                            .get()
                            .into_iter()
                            .map(|file| {
                                let is_selected = selected.as_deref() == Some(file.as_str());
                                let label = file.trim_end_matches(".md").to_string();
                                let row_style = if is_selected {
                                    "padding: 6px 10px; border-radius: var(--radius-md); cursor: pointer; font-size: 13px; margin-bottom: 2px; background: var(--accent-color); color: white;"
                                } else {
                                    "padding: 6px 10px; border-radius: var(--radius-md); cursor: pointer; font-size: 13px; margin-bottom: 2px;"
                                };
                                let path = file;
                                view! {
                                    <div on:click=move |_| open_note(path.clone()) style=row_style>
                                        {label}
                                    </div>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </div>
            </nav>
            <section style="flex: 1; display: flex; flex-direction: column; overflow: hidden;">
                {move || match current_file.get() {
                    None => view! {
                        <div style="flex: 1; display: flex; align-items: center; justify-content: center; color: var(--text-muted);">
                            {i18n.select_hint}
                        </div>
                    }
                    .into_any(),
                    Some(file) => view! {
                        <div style="height: var(--topbar-height); min-height: var(--topbar-height); display: flex; align-items: center; padding: 0 16px; border-bottom: 1px solid var(--border-color); font-weight: 600;">
                            {file.trim_end_matches(".md").to_string()}
                        </div>
                        <div style="flex: 1; overflow-y: auto; padding: 16px;">
                            <div
                                class="metadata-container"
                                class=("is-folded", move || folded.get())
                                tabindex="-1"
                                on:focusin=on_focus_in
                                on:focusout=on_focus_out
                                style="border: 1px solid var(--border-color); border-radius: var(--radius-md); margin-bottom: 16px; outline: none;"
                            >
                                <div
                                    on:click=move |_| set_folded.update(|folded| *folded = !*folded)
                                    style="display: flex; align-items: center; justify-content: space-between; padding: 8px 12px; cursor: pointer; color: var(--text-secondary); font-size: 12px; text-transform: uppercase; letter-spacing: 0.05em;"
                                >
                                    <span>{i18n.properties_header}</span>
                                    <span>{move || if folded.get() { "\u{25b8}" } else { "\u{25be}" }}</span>
                                </div>
                                {move || {
                                    properties
                                        .get()
                                        .into_iter()
                                        .map(|prop| {
                                            property_row(prop, i18n.empty_value_placeholder, write_property)
                                        })
                                        .collect::<Vec<_>>()
                                }}
                            </div>
                            <div
                                class="note-preview"
                                inner_html=move || body_html.get()
                                style="line-height: 1.6;"
                            ></div>
                        </div>
                    }
                    .into_any(),
                }}
            </section>
            <aside style="width: 260px; min-width: 260px; border-left: 1px solid var(--border-color); background: var(--bg-secondary); overflow-y: auto;">
                <div class="file-properties-panel" style="padding: 12px; border-bottom: 1px solid var(--border-color);">
                    <div style="font-size: 12px; text-transform: uppercase; letter-spacing: 0.05em; color: var(--text-secondary); margin-bottom: 8px;">
                        {i18n.file_properties_header}
                    </div>
                    {move || {
                        properties
                            .get()
                            .into_iter()
                            .map(|prop| {
                                let value_class = if prop.value.is_empty() {
                                    "metadata-property-value mod-empty"
                                } else {
                                    "metadata-property-value"
                                };
                                let rendered = match &prop.value {
                                    PropertyValue::Text(text) => text.clone(),
                                    PropertyValue::Checkbox(checked) => checked.to_string(),
                                    PropertyValue::List(items) => items.join(", "),
                                    PropertyValue::Empty => String::new(),
                                };
                                view! {
                                    <div
                                        class="metadata-property"
                                        data-property-key=prop.key.clone()
                                        style="display: flex; gap: 6px; padding: 3px 0; font-size: 13px;"
                                    >
                                        <span
                                            class="metadata-property-key"
                                            style="color: var(--text-secondary); min-width: 90px;"
                                        >
                                            {prop.key.clone()}
                                        </span>
                                        <span class=value_class>{rendered}</span>
                                    </div>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </div>
                <div class="all-properties-panel" style="padding: 12px;">
                    <div style="font-size: 12px; text-transform: uppercase; letter-spacing: 0.05em; color: var(--text-secondary); margin-bottom: 8px;">
                        {i18n.all_properties_header}
                    </div>
                    {move || {
                        all_properties
                            .get()
                            .into_iter()
                            .map(|entry| {
                                view! {
                                    <div
                                        class="property-list-item"
                                        data-key=entry.key.clone()
                                        style="display: flex; justify-content: space-between; padding: 3px 0; font-size: 13px;"
                                    >
                                        <span>{entry.key.clone()}</span>
                                        <span style="color: var(--text-muted);">{entry.count}</span>
                                    </div>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </div>
            </aside>
        }
        .into_any()
    };

    view! {
        <main style="display: flex; height: 100vh; overflow: hidden; background: var(--bg-primary); color: var(--text-primary);">
            {body}
            {move || {
                notice.get().map(|message| {
                    view! {
                        <div style="position: fixed; right: 16px; bottom: 16px; padding: 10px 14px; background: var(--bg-secondary); border: 1px solid var(--border-color); border-radius: var(--radius-md); box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15); font-size: 13px; z-index: 10;">
                            {message}
                        </div>
                    }
                })
            }}
            <style>{move || plugin_css.get()}</style>
        </main>
    }
}

fn property_row(
    prop: NoteProperty,
    empty_placeholder: &'static str,
    write_property: impl Fn(String, PropertyValue) + Copy + 'static,
) -> impl IntoView {
    let NoteProperty { key, value } = prop;
    let value_class = if value.is_empty() {
        "metadata-property-value mod-empty"
    } else {
        "metadata-property-value"
    };
    let row_key = key.clone();
    let label = key.clone();

    let widget = match value {
        PropertyValue::Checkbox(checked) => {
            let key = key.clone();
            view! {
                <input
                    type="checkbox"
                    class="metadata-input-checkbox"
                    prop:checked=checked
                    on:change=move |e| {
                        write_property(key.clone(), PropertyValue::Checkbox(event_target_checked(&e)))
                    }
                />
            }
            .into_any()
        }
        PropertyValue::List(items) => view! {
            <div style="display: flex; flex-wrap: wrap; gap: 4px;">
                {items
                    .into_iter()
                    .map(|item| {
                        view! {
                            <span style="background: var(--bg-secondary); border: 1px solid var(--border-color); border-radius: 10px; padding: 1px 8px; font-size: 12px;">
                                {item}
                            </span>
                        }
                    })
                    .collect::<Vec<_>>()}
            </div>
        }
        .into_any(),
        PropertyValue::Text(text) => {
            let key = key.clone();
            view! {
                <input
                    type="text"
                    prop:value=text
                    on:change=move |e| {
                        write_property(key.clone(), text_value(&event_target_value(&e)))
                    }
                    style="flex: 1; border: none; background: transparent; color: var(--text-primary); font-size: 13px; outline: none; padding: 2px 0;"
                />
            }
            .into_any()
        }
        PropertyValue::Empty => {
            let key = key.clone();
            view! {
                <input
                    type="text"
                    prop:value=""
                    placeholder=empty_placeholder
                    on:change=move |e| {
                        write_property(key.clone(), text_value(&event_target_value(&e)))
                    }
                    style="flex: 1; border: none; background: transparent; color: var(--text-primary); font-size: 13px; outline: none; padding: 2px 0;"
                />
            }
            .into_any()
        }
    };

    view! {
        <div
            class="metadata-property"
            data-property-key=row_key
            style="display: flex; align-items: center; gap: 8px; padding: 4px 12px; border-top: 1px solid var(--border-color);"
        >
            <span
                class="metadata-property-key"
                style="width: 140px; min-width: 140px; color: var(--text-secondary); font-size: 13px;"
            >
                {label}
            </span>
            <div class=value_class style="flex: 1; display: flex; align-items: center;">
                {widget}
            </div>
        </div>
    }
}

fn toggle_row(
    label: &'static str,
    description: Option<&'static str>,
    settings: ReadSignal<AppSettings>,
    set_settings: WriteSignal<AppSettings>,
    save: impl Fn(AppSettings) + Copy + 'static,
    read: fn(&AppSettings) -> bool,
    write: fn(&mut AppSettings, bool),
) -> impl IntoView {
    view! {
        <label style="display: flex; align-items: flex-start; gap: 10px; padding: 10px 0; border-bottom: 1px solid var(--border-color); cursor: pointer;">
            <input
                type="checkbox"
                prop:checked=move || read(&settings.get())
                on:change=move |e| {
                    let mut current = settings.get_untracked();
                    write(&mut current, event_target_checked(&e));
                    set_settings.set(current.clone());
                    save(current);
                }
                style="margin-top: 3px;"
            />
            <span style="display: flex; flex-direction: column; gap: 2px;">
                <span>{label}</span>
                {description
                    .map(|text| {
                        view! { <span style="font-size: 12px; color: var(--text-muted);">{text}</span> }
                    })}
            </span>
        </label>
    }
}

fn rule_editor(
    index: usize,
    rule: PropertyRule,
    i18n: &'static Locale,
    settings: ReadSignal<AppSettings>,
    set_settings: WriteSignal<AppSettings>,
    save: impl Fn(AppSettings) + Copy + 'static,
) -> impl IntoView {
    let update = move |apply: &dyn Fn(&mut PropertyRule)| {
        let mut current = settings.get_untracked();
        if let Some(rule) = current.rules.get_mut(index) {
            apply(rule);
        }
        set_settings.set(current.clone());
        save(current);
    };

    view! {
        <div style="display: flex; flex-direction: column; gap: 6px; padding: 10px; border: 1px solid var(--border-color); border-radius: var(--radius-md); margin-bottom: 8px;">
            <div style="display: flex; gap: 8px; align-items: center;">
                <input
                    type="text"
                    placeholder=i18n.rule_name_placeholder
                    prop:value=rule.name.clone()
                    on:change=move |e| {
                        let name = event_target_value(&e);
                        update(&move |rule: &mut PropertyRule| rule.name = name.clone());
                    }
                    style="flex: 1; box-sizing: border-box; padding: 6px 8px; border: 1px solid var(--border-color); border-radius: var(--radius-md); background: var(--bg-primary); color: var(--text-primary); font-size: 13px;"
                />
                <button
                    on:click=move |_| {
                        let mut current = settings.get_untracked();
                        if index < current.rules.len() {
                            current.rules.remove(index);
                        }
                        set_settings.set(current.clone());
                        save(current);
                    }
                    style="padding: 4px 10px; border: 1px solid var(--border-color); border-radius: var(--radius-md); background: transparent; color: var(--text-secondary); cursor: pointer; font-size: 12px;"
                >
                    {i18n.remove_rule}
                </button>
            </div>
            <div style="display: grid; grid-template-columns: 1fr 1fr; gap: 4px 12px; font-size: 13px;">
                {scope_toggle(i18n.hide_table_inactive, rule.table_inactive, move |on| {
                    update(&move |rule: &mut PropertyRule| rule.set_table_inactive(on));
                })}
                {scope_toggle(i18n.hide_table_active, rule.table_active, move |on| {
                    update(&move |rule: &mut PropertyRule| rule.set_table_active(on));
                })}
                {scope_toggle(i18n.hide_file_properties, rule.file_properties, move |on| {
                    update(&move |rule: &mut PropertyRule| rule.file_properties = on);
                })}
                {scope_toggle(i18n.hide_all_properties, rule.all_properties, move |on| {
                    update(&move |rule: &mut PropertyRule| rule.all_properties = on);
                })}
            </div>
        </div>
    }
}

fn scope_toggle(
    label: &'static str,
    checked: bool,
    on_toggle: impl Fn(bool) + 'static,
) -> impl IntoView {
    view! {
        <label style="display: flex; align-items: center; gap: 6px; cursor: pointer;">
            <input
                type="checkbox"
                prop:checked=checked
                on:change=move |e| on_toggle(event_target_checked(&e))
            />
            <span>{label}</span>
        </label>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_args_serialize_with_the_keys_commands_expect() {
        let args = serde_json::to_value(VaultArgs { vault_path: "/v" }).unwrap();
        let obj = args.as_object().unwrap();
        assert!(obj.contains_key("vaultPath"));
        assert!(!obj.contains_key("vault_path"));

        let args = serde_json::to_value(ReadDirArgs { path: "/v" }).unwrap();
        assert!(args.as_object().unwrap().contains_key("path"));

        let args = serde_json::to_value(ReadNoteArgs {
            vault_path: "/v",
            path: "a.md",
        })
        .unwrap();
        let obj = args.as_object().unwrap();
        assert!(obj.contains_key("vaultPath"));
        assert!(obj.contains_key("path"));

        let args = serde_json::to_value(CreateNoteArgs {
            vault_path: "/v",
            name: "daily",
        })
        .unwrap();
        assert!(args.as_object().unwrap().contains_key("vaultPath"));

        let args = serde_json::to_value(SaveSettingsArgs {
            vault_path: "/v",
            settings: "{}",
        })
        .unwrap();
        assert!(args.as_object().unwrap().contains_key("vaultPath"));

        let args = serde_json::to_value(WriteSnippetArgs {
            vault_path: "/v",
            css: "",
        })
        .unwrap();
        assert!(args.as_object().unwrap().contains_key("vaultPath"));
    }

    #[test]
    fn property_value_payload_keeps_its_tagged_shape() {
        let args = serde_json::to_value(WritePropertyArgs {
            vault_path: "/v",
            path: "a.md",
            key: "done",
            value: &PropertyValue::Checkbox(true),
        })
        .unwrap();
        let obj = args.as_object().unwrap();
        assert!(obj.contains_key("vaultPath"));
        assert!(!obj.contains_key("vault_path"));
        assert_eq!(args["value"]["kind"], "checkbox");
        assert_eq!(args["value"]["value"], true);
    }
}
