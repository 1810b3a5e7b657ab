mod gallery;

pub use gallery::GalleryScreen;
