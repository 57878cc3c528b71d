/// The root of a filesystem view.
pub const ROOT: &str = ".";

/// Report whether `path` is a valid logical path.
///
/// Valid paths are unrooted, slash-separated sequences of non-empty elements,
/// none of which is `.` or `..`. The single exception is the root, `"."`.
/// Backslashes are ordinary characters.
pub fn is_valid(path: &str) -> bool {
    if path == ROOT {
        return true;
    }
    !path.is_empty()
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Normalize a user-supplied path into a logical path.
///
/// - Replaces backslashes with forward slashes
/// - Collapses redundant separators (`a///b` → `a/b`)
/// - Drops `.` segments
/// - Strips leading and trailing slashes
/// - Maps an empty result to the root, `"."`
///
/// Returns `None` if the path contains a `..` segment.
pub fn normalize(path: &str) -> Option<String> {
    let replaced = path.replace('\\', "/");
    let mut segments = Vec::new();

    for segment in replaced.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return None;
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        return Some(ROOT.to_owned());
    }
    Some(segments.join("/"))
}

/// Final element of a logical path (`"a/b/c.txt"` → `"c.txt"`).
///
/// A trailing slash is ignored and the root's base name is `"."`.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return ROOT;
    }
    match trimmed.rfind('/') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// File-name extension of a logical path, including the leading dot.
///
/// Mirrors the usual "suffix from the last dot of the final element" rule:
/// `"a/b.tar.gz"` → `".gz"`, `".profile"` → `".profile"`, `"a/b"` → `None`.
/// The root has no extension.
pub fn extension(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    let base = base_name(path);
    base.rfind('.').map(|pos| &base[pos..])
}

/// Listing prefix selecting the immediate children of a directory path.
///
/// The root maps to `""`, everything else gets exactly one trailing slash.
pub fn dir_prefix(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == ROOT {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Build the bucket key prefix that roots a filesystem view.
///
/// Joins `version` and `prefix` (trailing slashes stripped) and appends a
/// single slash; empty parts are skipped, so two empty parts yield `""`.
/// Returns `None` if the combined prefix contains an invalid segment
/// (such as `..`, `.`, or an empty element in the middle).
pub fn root_prefix(version: &str, prefix: &str) -> Option<String> {
    let parts: Vec<&str> = [version, prefix]
        .into_iter()
        .map(|part| part.trim_end_matches('/'))
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        return Some(String::new());
    }
    let joined = parts.join("/");
    is_valid(&joined).then(|| format!("{joined}/"))
}
