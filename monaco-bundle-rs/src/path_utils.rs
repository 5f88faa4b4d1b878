use std::path::{Component, Path, PathBuf};

/// Resolves `.` and `..` components lexically, without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    normalize_components(path).into_iter().collect()
}

fn normalize_components(path: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Path of `to` relative to `from`, with `..` segments where `to` is outside `from`.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize_components(from);
    let to = normalize_components(to);
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &to[common..] {
        out.push(component.as_os_str());
    }
    out
}
