//! Build script for storefront crate.
//!
//! Generates content-based hashes for the stylesheet and the storefront
//! script so both can be served with immutable caching.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let static_dir = Path::new(&manifest_dir).join("static");

    hash_asset(&static_dir, "css", "main", "css", "CSS_HASH");
    hash_asset(&static_dir, "js", "storefront", "js", "JS_HASH");
}

/// Hash `static/<dir>/<stem>.<ext>` and copy it to
/// `static/<dir>/derived/<stem>.<hash>.<ext>`.
///
/// Sets `env_var` for use with `env!(..)`; it is empty when the asset is
/// missing so templates fall back to the unhashed file.
fn hash_asset(static_dir: &Path, dir: &str, stem: &str, ext: &str, env_var: &str) {
    let source = static_dir.join(dir).join(format!("{stem}.{ext}"));
    println!("cargo:rerun-if-changed={}", source.display());

    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", source.display());
            println!("cargo:rustc-env={env_var}=");
            return;
        }
    };

    // First 8 hex chars of SHA-256
    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash = &hash[..8];

    let derived_dir = static_dir.join(dir).join("derived");
    let copied = fs::create_dir_all(&derived_dir)
        .and_then(|()| fs::copy(&source, derived_dir.join(format!("{stem}.{short_hash}.{ext}"))));

    match copied {
        Ok(_) => println!("cargo:rustc-env={env_var}={short_hash}"),
        Err(e) => {
            println!("cargo:warning=Could not write derived {stem}.{ext}: {e}");
            println!("cargo:rustc-env={env_var}=");
        }
    }
}
