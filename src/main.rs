use dioxus::prelude::*;

mod components;
mod config;
mod error;
mod filesystem;
mod services;

use components::GalleryScreen;

fn main() {
    init_logging(&services::app_config().log_level);
    dioxus::launch(App);
}

#[cfg(target_os = "android")]
fn init_logging(level: &str) {
    let filter = level.parse().unwrap_or(log::LevelFilter::Info);
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(filter)
            .with_tag("photo-diary"),
    );
}

#[cfg(not(target_os = "android"))]
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env).try_init();
}

#[component]
fn App() -> Element {
    rsx! {
        div { style: "display: flex; flex-direction: column; height: 100vh; font-family: sans-serif;",
            div { style: "flex: 1; overflow-y: auto;",
                GalleryScreen {}
            }
        }
    }
}
