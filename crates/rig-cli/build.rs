//! Sets `RIG_VERSION` for `rig --version`.
//!
//! A release tag (`v1.2.3`) wins; untagged builds report the crate version.

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=RIG_VERSION_OVERRIDE");

    let version = std::env::var("RIG_VERSION_OVERRIDE")
        .ok()
        .or_else(git_tag)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=RIG_VERSION={version}");
}

fn git_tag() -> Option<String> {
    let out = std::process::Command::new("git")
        .args(["describe", "--tags", "--match", "v[0-9]*", "--dirty=-dev"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let tag = String::from_utf8(out.stdout).ok()?;
    let tag = tag.trim().trim_start_matches('v');
    (!tag.is_empty()).then(|| tag.to_string())
}
