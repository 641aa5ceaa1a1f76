use std::process::Command;

fn main() {
    // Short commit hash for the banner and the index page. Outside a git
    // checkout (release tarballs, container builds) GIT_SHA can be passed
    // in; otherwise we stamp "unknown".
    let from_git = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string());

    let sha = match from_git {
        Some(sha) => sha,
        None => std::env::var("GIT_SHA").unwrap_or_else(|_| "unknown".to_string()),
    };

    println!("cargo:rustc-env=GIT_SHA={sha}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=GIT_SHA");
}
