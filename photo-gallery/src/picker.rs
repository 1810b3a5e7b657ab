// Camera capture provider
//
// On Android the camera is launched through JNI on the app's MainActivity and
// the result is polled from its static fields. Other targets have no camera
// bridge and report the platform as unsupported; desktop builds can use the
// `FilePicker` (feature `file-picker`) instead.

use crate::models::{CaptureOptions, PhotoRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerError {
    PermissionDenied(String),
    Timeout(String),
    Cancelled(String),
    PlatformNotSupported(String),
    Other(String),
}

impl std::fmt::Display for PickerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickerError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            PickerError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            PickerError::Cancelled(msg) => write!(f, "Cancelled: {}", msg),
            PickerError::PlatformNotSupported(msg) => write!(f, "Platform not supported: {}", msg),
            PickerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for PickerError {}

/// Presents a capture UI and hands back one image.
///
/// Suspends until the user confirms or cancels.
#[allow(async_fn_in_trait)]
pub trait CaptureProvider {
    async fn request_photo(&self, options: CaptureOptions) -> Result<PhotoRef, PickerError>;
}

const DEFAULT_MAIN_ACTIVITY_CLASS: &str = "dev/dioxus/main/MainActivity";

/// Configuration for the device camera on Android
#[derive(Debug, Clone)]
pub struct DeviceCameraConfig {
    /// Fully qualified class name in slash format (e.g., "com/example/myapp/MainActivity")
    pub main_activity_class: String,
    /// How long to wait for the user before giving up
    pub timeout: std::time::Duration,
}

impl Default for DeviceCameraConfig {
    fn default() -> Self {
        Self {
            main_activity_class: DEFAULT_MAIN_ACTIVITY_CLASS.to_string(),
            timeout: std::time::Duration::from_secs(60),
        }
    }
}

/// The platform camera
#[derive(Debug, Clone, Default)]
pub struct DeviceCamera {
    config: DeviceCameraConfig,
}

impl DeviceCamera {
    pub fn new(config: DeviceCameraConfig) -> Self {
        Self { config }
    }
}

impl CaptureProvider for DeviceCamera {
    async fn request_photo(&self, options: CaptureOptions) -> Result<PhotoRef, PickerError> {
        log::debug!(
            "Requesting photo (quality {}, source {:?})",
            options.quality,
            options.source
        );
        let config = self.config.clone();
        let path = tokio::task::spawn_blocking(move || android::capture_photo(&config))
            .await
            .map_err(|e| PickerError::Other(format!("Task join error: {}", e)))??;

        Ok(PhotoRef {
            format: photo_format(&path),
            path: Some(path),
            web_path: None,
        })
    }
}

fn photo_format(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "jpeg".to_string())
}

/// Reference to an image file chosen from disk, usable by both strategies
#[cfg_attr(not(feature = "file-picker"), allow(dead_code))]
fn picked_file(path: &std::path::Path) -> PhotoRef {
    let path = path.to_string_lossy().to_string();
    PhotoRef {
        format: photo_format(&path),
        web_path: Some(format!("file://{}", path)),
        path: Some(path),
    }
}

/// Desktop stand-in for a camera: lets the user pick an existing image
#[cfg(feature = "file-picker")]
#[derive(Debug, Clone, Default)]
pub struct FilePicker;

#[cfg(feature = "file-picker")]
impl CaptureProvider for FilePicker {
    async fn request_photo(&self, options: CaptureOptions) -> Result<PhotoRef, PickerError> {
        log::debug!("Picking image file (source {:?})", options.source);
        let picked = rfd::AsyncFileDialog::new()
            .set_title("Add photo")
            .add_filter("Images", &["jpg", "jpeg", "png", "webp", "heic"])
            .pick_file()
            .await
            .ok_or_else(|| PickerError::Cancelled("No file selected".to_string()))?;
        Ok(picked_file(picked.path()))
    }
}

/// Maps the message left in the activity's `getLastError` to a picker error
#[cfg_attr(not(target_os = "android"), allow(dead_code))]
fn activity_error(message: String) -> PickerError {
    let lower = message.to_lowercase();
    if lower.contains("permission") {
        PickerError::PermissionDenied(message)
    } else if lower.contains("cancel") {
        PickerError::Cancelled(message)
    } else {
        PickerError::Other(message)
    }
}

#[cfg(target_os = "android")]
mod android {
    use super::{DeviceCameraConfig, PickerError};
    use jni::objects::{JClass, JObject, JString, JValue};
    use ndk_context::android_context;

    const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);

    fn jni_err(context: &str) -> impl Fn(jni::errors::Error) -> PickerError + '_ {
        move |e| PickerError::Other(format!("{}: {}", context, e))
    }

    fn app_class_loader<'a>(env: &mut jni::JNIEnv<'a>) -> Result<JObject<'a>, PickerError> {
        let at_cls = env
            .find_class("android/app/ActivityThread")
            .map_err(jni_err("ActivityThread not found"))?;
        let at = env
            .call_static_method(
                &at_cls,
                "currentActivityThread",
                "()Landroid/app/ActivityThread;",
                &[],
            )
            .map_err(jni_err("currentActivityThread failed"))?
            .l()
            .map_err(jni_err("currentActivityThread invalid"))?;
        let app = env
            .call_method(&at, "getApplication", "()Landroid/app/Application;", &[])
            .map_err(jni_err("getApplication failed"))?
            .l()
            .map_err(jni_err("getApplication invalid"))?;
        if app.is_null() {
            return Err(PickerError::Other("Application not initialized".to_string()));
        }
        env.call_method(&app, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
            .map_err(jni_err("getClassLoader failed"))?
            .l()
            .map_err(jni_err("getClassLoader invalid"))
    }

    fn activity<'a>(
        env: &mut jni::JNIEnv<'a>,
        config: &DeviceCameraConfig,
    ) -> Result<(JObject<'a>, JClass<'a>), PickerError> {
        let loader = app_class_loader(env)?;
        let name: JString = env
            .new_string(config.main_activity_class.replace('/', "."))
            .map_err(jni_err("new_string failed"))?;
        let cls = env
            .call_method(
                &loader,
                "loadClass",
                "(Ljava/lang/String;)Ljava/lang/Class;",
                &[JValue::Object(&JObject::from(name))],
            )
            .map_err(jni_err("loadClass failed"))?
            .l()
            .map_err(jni_err("loadClass invalid"))?;
        let cls = JClass::from(cls);

        let signature = format!("()L{};", config.main_activity_class);
        let instance = env
            .call_static_method(&cls, "getInstance", &signature, &[])
            .map_err(jni_err("getInstance failed"))?
            .l()
            .map_err(jni_err("getInstance invalid"))?;
        if instance.is_null() {
            return Err(PickerError::Other(
                "MainActivity instance is null - Activity not initialized?".to_string(),
            ));
        }
        Ok((instance, cls))
    }

    fn static_string(
        env: &mut jni::JNIEnv<'_>,
        cls: &JClass<'_>,
        method: &str,
    ) -> Result<Option<String>, PickerError> {
        let result = env
            .call_static_method(cls, method, "()Ljava/lang/String;", &[])
            .and_then(|v| v.l());
        let obj = match result {
            Ok(obj) => obj,
            Err(e) => {
                // Clear any pending Java exception so the next poll can run
                if env.exception_check().unwrap_or(false) {
                    let _ = env.exception_clear();
                }
                log::debug!("{} unavailable: {}", method, e);
                return Ok(None);
            }
        };
        if obj.is_null() {
            return Ok(None);
        }
        let value: String = env
            .get_string((&obj).into())
            .map_err(jni_err("String conversion failed"))?
            .into();
        Ok(Some(value))
    }

    /// Launches the camera and blocks until a photo path, an error or the timeout
    pub fn capture_photo(config: &DeviceCameraConfig) -> Result<String, PickerError> {
        let vm_ptr = android_context().vm() as *mut *const jni::sys::JNIInvokeInterface_;
        let vm = unsafe { jni::JavaVM::from_raw(vm_ptr) }.map_err(jni_err("JavaVM failed"))?;
        let mut env = vm
            .attach_current_thread()
            .map_err(jni_err("JNI attach failed"))?;

        let (activity, main_cls) = activity(&mut env, config)?;

        env.call_static_method(&main_cls, "clearLastError", "()V", &[])
            .map_err(jni_err("clearLastError failed"))?;
        env.call_method(&activity, "launchCamera", "()V", &[])
            .map_err(jni_err("launchCamera failed"))?;

        let started = std::time::Instant::now();
        while started.elapsed() < config.timeout {
            std::thread::sleep(POLL_INTERVAL);

            if let Some(path) = static_string(&mut env, &main_cls, "getLastPhotoPath")? {
                return Ok(path);
            }
            // Permission refusals are reported here by the activity
            if let Some(err) = static_string(&mut env, &main_cls, "getLastError")? {
                return Err(super::activity_error(err));
            }
        }

        Err(PickerError::Timeout("Camera timeout - no photo taken".to_string()))
    }
}

#[cfg(not(target_os = "android"))]
mod android {
    use super::{DeviceCameraConfig, PickerError};

    pub fn capture_photo(_config: &DeviceCameraConfig) -> Result<String, PickerError> {
        Err(PickerError::PlatformNotSupported(
            "Camera not available on this platform".to_string(),
        ))
    }
}
