use std::process::Command;

// Embeds `git describe` output as COORDAI_VERSION, falling back to the crate version.
fn main() {
    let described = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty());

    let version = match described {
        Some(s) => s.strip_prefix('v').map(str::to_string).unwrap_or(s),
        None => env!("CARGO_PKG_VERSION").to_string(),
    };

    println!("cargo:rustc-env=COORDAI_VERSION={version}");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
