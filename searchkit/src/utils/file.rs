//! Path helpers

use std::path::{Path, PathBuf};

/// Replace a leading `~` with the home directory
///
/// Anything else, including relative paths, is returned as given. If the
/// home directory cannot be resolved the path is left untouched.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_passthrough() {
        assert_eq!(expand_home(Path::new("/etc/searchkit.json")), PathBuf::from("/etc/searchkit.json"));
        assert_eq!(expand_home(Path::new("conf/searchkit.json")), PathBuf::from("conf/searchkit.json"));
        assert_eq!(expand_home(Path::new("~user/x")), PathBuf::from("~user/x"));
    }

    #[test]
    fn test_expand_home_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home(Path::new("~")), home);
        assert_eq!(expand_home(Path::new("~/.searchkit/searchkit.json")), home.join(".searchkit/searchkit.json"));
    }
}
