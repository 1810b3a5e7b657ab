// Platform detection
//
// A native shell has a filesystem/camera bridge and a webview that can load
// local files through a rewritten URL. Everything else is treated like a
// browser sandbox.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Native,
    Web,
}

pub trait PlatformDetector {
    fn is_native_shell(&self) -> bool;

    fn platform(&self) -> Platform {
        if self.is_native_shell() {
            Platform::Native
        } else {
            Platform::Web
        }
    }
}

/// Detects the platform from the compilation target.
///
/// Only Android ships a camera and file bridge, so it is the one native shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetPlatform;

impl PlatformDetector for TargetPlatform {
    fn is_native_shell(&self) -> bool {
        cfg!(target_os = "android")
    }
}

/// Pins the platform, e.g. from configuration or in tests
#[derive(Debug, Clone, Copy)]
pub struct FixedPlatform(pub Platform);

impl PlatformDetector for FixedPlatform {
    fn is_native_shell(&self) -> bool {
        self.0 == Platform::Native
    }
}

/// Rewrites a native file URI or absolute path so the webview can load it
/// through `local_file_url`. Other URLs are returned unchanged.
pub fn convert_file_src(uri: &str, local_file_url: &str) -> String {
    let path = if let Some(rest) = uri.strip_prefix("file://") {
        rest
    } else if uri.starts_with('/') {
        uri
    } else {
        return uri.to_string();
    };

    let base = local_file_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
