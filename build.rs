//! Generates `GENERATED_FUND_ENV_ALLOWLIST`: every `FUND_*` key quoted as a
//! string literal somewhere under `src/`.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn rust_sources(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut pending = vec![root.to_path_buf()];
    let mut found = Vec::new();
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                found.push(path);
            }
        }
    }
    Ok(found)
}

// `FUND_WARN` is a log marker and `FUND_INCOME_`-style prefixes are file
// names, not settings.
fn is_env_key(segment: &str) -> bool {
    let Some(rest) = segment.strip_prefix("FUND_") else {
        return false;
    };
    segment != "FUND_WARN"
        && !rest.is_empty()
        && !rest.ends_with('_')
        && rest
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src");

    let mut keys = BTreeSet::new();
    for file in rust_sources(Path::new("src"))? {
        let text = fs::read_to_string(&file)?;
        // Whole quoted segments only, so prose mentioning a key is ignored.
        keys.extend(text.split('"').filter(|s| is_env_key(s)).map(str::to_string));
    }

    let out_dir = env::var_os("OUT_DIR").ok_or_else(|| io::Error::other("OUT_DIR is not set"))?;
    let entries: String = keys.iter().map(|key| format!("    \"{key}\",\n")).collect();
    fs::write(
        Path::new(&out_dir).join("fund_env_allowlist.rs"),
        format!("pub const GENERATED_FUND_ENV_ALLOWLIST: &[&str] = &[\n{entries}];\n"),
    )
}
