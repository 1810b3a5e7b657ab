use crate::error::AppError;
use crate::services;
use dioxus::prelude::*;
use dioxus_gallery::{FullscreenViewer, Gallery, GalleryItem};
use photo_gallery::UserPhoto;

fn gallery_items(photos: &[UserPhoto]) -> Vec<GalleryItem> {
    photos
        .iter()
        .map(|photo| GalleryItem {
            id: photo.filepath.clone(),
            src: photo.webview_path.clone(),
        })
        .collect()
}

#[component]
pub fn GalleryScreen() -> Element {
    let mut photos = use_signal(Vec::<UserPhoto>::new);
    let mut error = use_signal(String::new);
    let mut capturing = use_signal(|| false);
    let mut viewing = use_signal(|| None::<usize>);

    // Load the saved gallery on mount
    use_future(move || async move {
        let result = match services::init_gallery_service() {
            Ok(service) => service.load_saved().await.map_err(AppError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(list) => photos.set(list),
            Err(e) => {
                log::error!("Loading gallery failed: {}", e);
                error.set(e.user_message());
            }
        }
    });

    let items = gallery_items(&photos());

    rsx! {
        div { style: "padding: 16px; max-width: 800px; margin: 0 auto; min-height: 100vh; background: #f5f5f5;",
            h1 { style: "color: #0066cc; text-align: center; margin-bottom: 24px; margin-top: 48px; font-size: 28px; font-weight: 700;",
                "📷 Photo Gallery"
            }

            if !error().is_empty() {
                div { style: "background: #fee; border: 1px solid #fcc; color: #c33; padding: 12px; margin-bottom: 16px; border-radius: 8px; font-size: 14px;",
                    "⚠️ {error}"
                }
            }

            Gallery {
                items: items.clone(),
                on_view_fullscreen: move |id: String| {
                    let index = photos().iter().position(|p| p.filepath == id);
                    viewing.set(index);
                },
            }

            // Capture button, disabled while a capture is in flight
            button {
                class: "btn-primary",
                style: "position: fixed; bottom: 24px; right: 24px; width: 64px; height: 64px; border-radius: 50%; font-size: 28px; display: flex; align-items: center; justify-content: center;",
                disabled: capturing(),
                onclick: move |_| {
                    capturing.set(true);
                    error.set(String::new());
                    spawn(async move {
                        let result = match services::init_gallery_service() {
                            Ok(service) => service
                                .capture()
                                .await
                                .map(|_| service.photos())
                                .map_err(AppError::from),
                            Err(e) => Err(e),
                        };
                        match result {
                            Ok(list) => photos.set(list),
                            Err(AppError::Gallery(e)) if e.is_capture_failure() => {
                                log::info!("No photo captured: {}", e);
                                error.set(AppError::Gallery(e).user_message());
                            }
                            Err(e) => {
                                log::error!("Capture failed: {}", e);
                                error.set(e.user_message());
                            }
                        }
                        capturing.set(false);
                    });
                },
                if capturing() { "…" } else { "📸" }
            }

            if let Some(index) = viewing() {
                FullscreenViewer {
                    index,
                    items,
                    on_close: move |_| viewing.set(None),
                    on_navigate: move |next| viewing.set(Some(next)),
                }
            }
        }
    }
}
