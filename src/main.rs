mod app;
mod host_view;
mod i18n;
mod visibility_core;

use app::App;

fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
