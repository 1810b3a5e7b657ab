use dioxus::prelude::*;

/// Represents a single photo tile in the gallery
#[derive(Clone, PartialEq, Debug)]
pub struct GalleryItem {
    /// Unique identifier for the item (the photo's storage key)
    pub id: String,
    /// Renderable source; `None` when the photo could not be loaded
    pub src: Option<String>,
}

/// A photo grid for Dioxus, newest photo first.
///
/// Tiles without a source render a placeholder instead of a broken image.
///
/// # Example
/// ```rust,ignore
/// Gallery {
///     items: vec![
///         GalleryItem {
///             id: "1700000000000.jpeg".to_string(),
///             src: Some("data:image/jpeg;base64,...".to_string()),
///         }
///     ],
///     on_view_fullscreen: move |id| {
///         // Open the viewer in parent
///     },
/// }
/// ```
#[component]
pub fn Gallery(
    /// List of gallery items to display
    items: Vec<GalleryItem>,
    /// Text shown while the gallery is empty
    #[props(default = "No photos yet".to_string())]
    empty_text: String,
    /// Callback when user wants to view an item in fullscreen
    #[props(default)]
    on_view_fullscreen: Option<EventHandler<String>>,
) -> Element {
    if items.is_empty() {
        return rsx! {
            div {
                style: "padding: 24px; text-align: center; background: #f5f5f5; border-radius: 8px; color: #999;",
                "{empty_text}"
            }
        };
    }

    rsx! {
        div {
            style: "display: grid; grid-template-columns: repeat(auto-fill, minmax(120px, 1fr)); gap: 12px;",
            for item in items {
                GalleryTile {
                    key: "{item.id}",
                    item: item.clone(),
                    on_view_fullscreen: on_view_fullscreen.clone(),
                }
            }
        }
    }
}

#[component]
fn GalleryTile(item: GalleryItem, on_view_fullscreen: Option<EventHandler<String>>) -> Element {
    let item_id = item.id.clone();

    rsx! {
        div {
            style: "position: relative; aspect-ratio: 1/1; border-radius: 8px; overflow: hidden; border: 2px solid #e0e0e0; background: #f0f0f0; cursor: pointer;",
            onclick: move |_| {
                if let Some(handler) = &on_view_fullscreen {
                    handler.call(item_id.clone());
                }
            },
            if let Some(src) = item.src.clone() {
                img {
                    src: "{src}",
                    style: "width: 100%; height: 100%; object-fit: cover;",
                }
            } else {
                div {
                    style: "width: 100%; height: 100%; display: flex; align-items: center; justify-content: center; color: #999; font-size: 32px;",
                    "📷"
                }
            }
        }
    }
}

/// A fullscreen photo viewer with previous/next navigation
#[component]
pub fn FullscreenViewer(
    /// Index of the photo being viewed
    index: usize,
    /// All items in the gallery for navigation
    items: Vec<GalleryItem>,
    /// Callback when user closes the viewer
    on_close: EventHandler<()>,
    /// Callback with the index to show next
    on_navigate: EventHandler<usize>,
) -> Element {
    let Some(current) = items.get(index).cloned() else {
        return rsx! {};
    };

    let has_prev = index > 0;
    let has_next = index + 1 < items.len();
    let position = format!("{} / {}", index + 1, items.len());

    rsx! {
        div {
            style: "position: fixed; top: 0; left: 0; right: 0; bottom: 0; background: rgba(0, 0, 0, 0.95); z-index: 1000; display: flex; flex-direction: column;",
            div {
                style: "display: flex; justify-content: space-between; align-items: center; padding: 16px; background: rgba(0, 0, 0, 0.7);",
                div { style: "color: white; font-size: 16px;", "{position}" }
                button {
                    style: "width: 40px; height: 40px; background: rgba(255, 255, 255, 0.2); color: white; border-radius: 50%; font-size: 24px; cursor: pointer; border: none;",
                    onclick: move |_| on_close.call(()),
                    "×"
                }
            }
            div {
                style: "flex: 1; display: flex; align-items: center; justify-content: center; padding: 20px; position: relative;",
                if has_prev {
                    button {
                        style: "position: absolute; left: 20px; width: 50px; height: 50px; background: rgba(255, 255, 255, 0.3); color: white; border-radius: 50%; font-size: 24px; cursor: pointer; border: none;",
                        onclick: move |_| on_navigate.call(index - 1),
                        "‹"
                    }
                }
                if let Some(src) = current.src.clone() {
                    img {
                        src: "{src}",
                        style: "max-width: 100%; max-height: 100%; object-fit: contain;",
                    }
                } else {
                    div { style: "color: #999; font-size: 16px;", "Photo could not be loaded" }
                }
                if has_next {
                    button {
                        style: "position: absolute; right: 20px; width: 50px; height: 50px; background: rgba(255, 255, 255, 0.3); color: white; border-radius: 50%; font-size: 24px; cursor: pointer; border: none;",
                        onclick: move |_| on_navigate.call(index + 1),
                        "›"
                    }
                }
            }
        }
    }
}
