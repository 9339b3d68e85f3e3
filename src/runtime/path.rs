//! Module path arithmetic

/// Resolve `path` against `current_dir`.
///
/// Only paths starting with `.` or `..` are relative; anything else is taken
/// from the root, its first segment being a package name.
pub fn resolve(path: &str, current_dir: &str) -> String {
    let mut parts = path.split('/').peekable();
    let relative = matches!(parts.peek(), Some(&".") | Some(&".."));

    let mut stack: Vec<&str> = if relative {
        current_dir.split('/').filter(|s| !s.is_empty()).collect()
    } else {
        Vec::new()
    };

    for part in parts {
        match part {
            ".." => {
                stack.pop();
            }
            "." | "" => {}
            _ => stack.push(part),
        }
    }
    stack.join("/")
}

/// Directory of a module id, used as the base of its relative requires
pub fn dirname(id: &str) -> &str {
    id.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Package part of a resolved module id
pub fn package_of(id: &str) -> &str {
    id.split('/').next().unwrap_or(id)
}
