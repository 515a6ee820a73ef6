use once_cell::sync::Lazy;

static LONG_VERSION: Lazy<String> = Lazy::new(|| match git_sha() {
    Some(sha) => format!(
        "{} ({})",
        env!("CARGO_PKG_VERSION"),
        &sha[..sha.len().min(12)]
    ),
    None => env!("CARGO_PKG_VERSION").to_string(),
});

/// Build-time git commit SHA stamped by build.rs when available.
pub fn git_sha() -> Option<&'static str> {
    option_env!("GTD_BUILD_GIT_SHA")
}

/// Version line shown by `gtd --version`.
pub fn long_version() -> &'static str {
    LONG_VERSION.as_str()
}
