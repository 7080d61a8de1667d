/// Get the version string for syncd and libsync
pub fn get_version_string() -> String {
    format!(
        "syncd {}\nlibsync {}",
        env!("CARGO_PKG_VERSION"),
        libsync::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_contains_both_crate_names() {
        let version = get_version_string();
        assert!(version.contains("syncd"));
        assert!(version.contains("libsync"));
    }
}
