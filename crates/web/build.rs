//! Build script for the web crate.
//!
//! Hashes `static/css/main.css` so templates can cache-bust the stylesheet
//! with `?v={{ ""|css_hash }}`.

use std::env;
use std::fmt::Write;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Number of hex characters of the digest kept in URLs.
const HASH_LEN: usize = 8;

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set; skipping asset hashing");
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };

    let css_path = Path::new(&manifest_dir).join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());

    let hash = match fs::read(&css_path) {
        Ok(content) => short_hash(&content),
        Err(e) => {
            println!("cargo:warning=Could not read main.css: {e}");
            String::new()
        }
    };

    println!("cargo:rustc-env=CSS_HASH={hash}");
}

/// First [`HASH_LEN`] hex characters of the SHA-256 of `content`.
fn short_hash(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut hex = String::with_capacity(HASH_LEN);
    for byte in digest.iter().take(HASH_LEN / 2) {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}
