//! C ABI for native hosts (Android/iOS UI layers).
//!
//! The host owns the helper pointer and every returned string; release
//! them with [`asclepius_classifier_free`] and [`asclepius_string_free`].
//! All functions tolerate null pointers.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use log::error;

use crate::assets::AssetManager;
use crate::classifier::{format_error, ClassifierError, ImageClassifierHelper, ImageReference};
use crate::models::BundledModel;

/// Loads the bundled model from `assets_dir` (or the default assets
/// directory when null). Returns null when the model cannot be loaded, in
/// which case the host must not offer classification.
///
/// # Safety
/// `assets_dir` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn asclepius_classifier_new(
    assets_dir: *const c_char,
) -> *mut ImageClassifierHelper {
    let assets = if assets_dir.is_null() {
        AssetManager::new_default()
    } else {
        match CStr::from_ptr(assets_dir).to_str() {
            Ok(dir) => AssetManager::new(dir),
            Err(e) => {
                error!("Assets directory is not valid UTF-8: {}", e);
                return ptr::null_mut();
            }
        }
    };

    match ImageClassifierHelper::builder()
        .with_bundled_model(BundledModel::CancerClassification, &assets)
        .and_then(|builder| builder.build())
    {
        Ok(helper) => Box::into_raw(Box::new(helper)),
        Err(e) => {
            error!("Model loading failed: {}", e);
            ptr::null_mut()
        }
    }
}

/// Classifies the image behind `reference` and returns the display string.
///
/// # Safety
/// `helper` must be null or a pointer from [`asclepius_classifier_new`]
/// that has not been freed; `reference` must be null or a valid
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn asclepius_classify(
    helper: *const ImageClassifierHelper,
    reference: *const c_char,
) -> *mut c_char {
    let text = match (helper.as_ref(), reference.is_null()) {
        (None, _) => format_error(&ClassifierError::ModelLoad("Model is not initialized".into())),
        (Some(_), true) => format_error(&ClassifierError::ImageAcquisition(
            "Image reference is null".into(),
        )),
        (Some(helper), false) => {
            let reference = CStr::from_ptr(reference).to_string_lossy();
            helper.classify_static_image(&ImageReference::new(reference.as_ref()))
        }
    };
    into_c_string(text)
}

/// Releases the model but keeps the helper allocated. Returns `true` if
/// this call released it.
///
/// # Safety
/// `helper` must be null or a live pointer from [`asclepius_classifier_new`].
#[no_mangle]
pub unsafe extern "C" fn asclepius_classifier_close(helper: *const ImageClassifierHelper) -> bool {
    helper.as_ref().map_or(false, |helper| helper.close())
}

/// # Safety
/// `helper` must be null or a pointer from [`asclepius_classifier_new`]
/// not already freed.
#[no_mangle]
pub unsafe extern "C" fn asclepius_classifier_free(helper: *mut ImageClassifierHelper) {
    if !helper.is_null() {
        drop(Box::from_raw(helper));
    }
}

/// # Safety
/// `text` must be null or a string returned by [`asclepius_classify`]
/// not already freed.
#[no_mangle]
pub unsafe extern "C" fn asclepius_string_free(text: *mut c_char) {
    if !text.is_null() {
        drop(CString::from_raw(text));
    }
}

fn into_c_string(text: String) -> *mut c_char {
    CString::new(text.replace('\0', ""))
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}
