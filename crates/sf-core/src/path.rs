//! Regularized simulation-local paths.
//!
//! A regularized path uses `/` separators and starts with `./` (or with some
//! other `.`-prefixed component such as `../`). Directory paths additionally
//! end with `/`; that suffix is added by [`record_path`], never by
//! [`regularize`] itself.

/// The regularized path of the tree root.
pub const ROOT_PATH: &str = "./";

/// Regularize a simulation-local path.
///
/// - every `\` becomes `/`
/// - a single leading `/` is dropped
/// - `.` becomes `./`
/// - anything not starting with `.` gets a `./` prefix
///
/// The function is idempotent.
pub fn regularize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.strip_prefix('/').unwrap_or(&path);

    if path == "." {
        ROOT_PATH.to_string()
    } else if path.starts_with('.') {
        path.to_string()
    } else {
        format!("./{path}")
    }
}

/// Build the regularized path of a record from its directory part and basename.
///
/// Directory records get a trailing `/`.
pub fn record_path(path_from_root: &str, friendly_name: &str, is_directory: bool) -> String {
    let mut path = regularize(&format!("{path_from_root}/{friendly_name}"));
    if is_directory && !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// True if the path names a directory (trailing `/`).
pub fn is_directory_path(path: &str) -> bool {
    path.ends_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn regularize_basic_forms() {
        assert_eq!(regularize("output/InsetChart.json"), "./output/InsetChart.json");
        assert_eq!(regularize("/output/InsetChart.json"), "./output/InsetChart.json");
        assert_eq!(regularize("./config.json"), "./config.json");
        assert_eq!(regularize("output\\sub\\x.bin"), "./output/sub/x.bin");
        assert_eq!(regularize("."), "./");
        assert_eq!(regularize("/."), "./");
        assert_eq!(regularize(""), "./");
        assert_eq!(regularize("/"), "./");
    }

    #[test]
    fn only_one_leading_slash_is_stripped() {
        assert_eq!(regularize("//x"), ".//x");
    }

    #[test]
    fn record_paths() {
        assert_eq!(record_path("", "config.json", false), "./config.json");
        assert_eq!(record_path(".", "config.json", false), "./config.json");
        assert_eq!(record_path("output", "InsetChart.json", false), "./output/InsetChart.json");
        assert_eq!(record_path("", "Assets", true), "./Assets/");
        assert_eq!(record_path("Assets", "sub", true), "./Assets/sub/");
        assert_eq!(record_path("Assets\\sub", "leaf.txt", false), "./Assets/sub/leaf.txt");
    }

    proptest! {
        #[test]
        fn regularize_is_idempotent(path in "[a-z./\\\\]{0,24}") {
            let once = regularize(&path);
            prop_assert_eq!(regularize(&once), once.clone());
            prop_assert!(!once.contains('\\'));
            prop_assert!(once.starts_with('.'));
        }
    }
}
