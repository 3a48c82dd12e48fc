use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const TEMPLATE_DIR: &str = "templates";

fn main() {
    // Template edits change the rendered screen without touching any .rs file.
    watch_templates(Path::new(TEMPLATE_DIR));

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "dev".to_string());
    println!(
        "cargo:rustc-env=ROSTER_BUILD_ID={}-{}",
        env!("CARGO_PKG_VERSION"),
        stamp
    );
}

fn watch_templates(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    println!("cargo:rerun-if-changed={}", dir.display());
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            watch_templates(&path);
        } else if is_template(&path) {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
}

fn is_template(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("txt" | "html")
    )
}
