//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Path of the stylesheet, content-hashed when the build produced a hash.
///
/// Usage in templates: `{{ ""|css_path }}`
#[askama::filter_fn]
pub fn css_path(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(asset_path("css", "main", "css", env!("CSS_HASH")))
}

/// Path of the storefront script, content-hashed when available.
///
/// Usage in templates: `{{ ""|js_path }}`
#[askama::filter_fn]
pub fn js_path(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(asset_path("js", "storefront", "js", env!("JS_HASH")))
}

fn asset_path(dir: &str, stem: &str, ext: &str, hash: &str) -> String {
    if hash.is_empty() {
        format!("/static/{dir}/{stem}.{ext}")
    } else {
        format!("/static/{dir}/derived/{stem}.{hash}.{ext}")
    }
}
