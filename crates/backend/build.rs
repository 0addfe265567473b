use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// `target/<profile>`, found by walking up from OUT_DIR
/// (`target/<profile>/build/backend-xxx/out`).
fn target_profile_dir() -> Option<PathBuf> {
    let out_dir = env::var("OUT_DIR").ok()?;
    let profile = env::var("PROFILE").ok()?;
    Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
        .map(Path::to_path_buf)
}

fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    let source_config = workspace_root.join("config.toml");
    if !source_config.exists() {
        println!("cargo:warning=config.toml not found at {:?}, the embedded defaults apply", source_config);
        return;
    }

    let Some(target_dir) = target_profile_dir() else {
        println!("cargo:warning=Could not locate the target directory, config.toml not copied");
        return;
    };

    let dest_config = target_dir.join("config.toml");
    match fs::copy(&source_config, &dest_config) {
        Ok(_) => println!("cargo:warning=Copied config.toml to {:?}", dest_config),
        Err(e) => println!("cargo:warning=Failed to copy config.toml: {}", e),
    }
}
