//! Path dialect detection and normalization for the shells the gateway
//! fronts: Windows drive paths, UNC shares, Git Bash `/c/...` forms, and
//! WSL/POSIX paths. Everything here is lexical: the filesystem is never
//! touched, so confinement decisions cannot be sidetracked by symlinks or
//! non-existent paths.

use regex::Regex;
use std::sync::LazyLock;

/// The dialect a raw path string is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathForm {
    /// `\\host\share\...`
    Unc,
    /// `/c/...`, a drive letter mounted at the POSIX root
    Gitbash,
    /// Any other absolute POSIX path, including WSL `/mnt/c/...`
    Posix,
    /// `C:\...`, `C:/...`, or drive-relative `C:foo`
    Windows,
    /// Bare relative path or a single leading backslash
    Relative,
    Empty,
}

fn gitbash_re() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^/[a-zA-Z](/|$)").expect("Failed to compile gitbash path regex")
    });
    &RE
}

fn drive_re() -> &'static Regex {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[a-zA-Z]:").expect("Failed to compile drive path regex"));
    &RE
}

pub fn detect_form(raw: &str) -> PathForm {
    if raw.is_empty() {
        PathForm::Empty
    } else if raw.starts_with("\\\\") {
        PathForm::Unc
    } else if gitbash_re().is_match(raw) {
        PathForm::Gitbash
    } else if raw.starts_with('/') {
        PathForm::Posix
    } else if drive_re().is_match(raw) {
        PathForm::Windows
    } else {
        PathForm::Relative
    }
}

/// Map a raw path into its canonical shape for its dialect.
///
/// Idempotent: `normalize_path(normalize_path(x)) == normalize_path(x)`.
pub fn normalize_path(raw: &str) -> String {
    match detect_form(raw) {
        PathForm::Empty => String::new(),
        PathForm::Unc => normalize_unc(raw),
        PathForm::Gitbash => {
            let drive = raw.as_bytes()[1] as char;
            normalize_windows(&format!("{}:{}", drive, &raw[2..]))
        }
        PathForm::Posix => {
            let collapsed = normalize_posix(raw);
            // "//c/..." collapses into Git Bash shape; route it through that
            // dialect so repeated normalization is stable
            if detect_form(&collapsed) == PathForm::Gitbash {
                normalize_path(&collapsed)
            } else {
                collapsed
            }
        }
        PathForm::Windows => normalize_windows(raw),
        PathForm::Relative => {
            // No drive: anchor at C:\ before applying Windows rules
            if raw.starts_with('\\') {
                normalize_windows(&format!("C:{raw}"))
            } else {
                normalize_windows(&format!("C:\\{raw}"))
            }
        }
    }
}

fn normalize_windows(raw: &str) -> String {
    let drive = raw.as_bytes()[0].to_ascii_uppercase() as char;
    let rest = raw[2..].replace('/', "\\");
    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('\\') {
        match segment {
            "" | "." => {}
            // never ascend above the drive root
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        format!("{drive}:\\")
    } else {
        format!("{}:\\{}", drive, segments.join("\\"))
    }
}

fn normalize_posix(raw: &str) -> String {
    let had_trailing = raw.len() > 1 && raw.ends_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut out = format!("/{}", segments.join("/"));
    if had_trailing && out != "/" {
        out.push('/');
    }
    out
}

fn normalize_unc(raw: &str) -> String {
    let body = raw.trim_start_matches('\\');
    let mut segments: Vec<&str> = Vec::new();
    for segment in body.split('\\') {
        match segment {
            "" | "." => {}
            // host + share form the root of a UNC path
            ".." => {
                if segments.len() > 2 {
                    segments.pop();
                }
            }
            s => segments.push(s),
        }
    }
    format!("\\\\{}", segments.join("\\"))
}

/// Whether a normalized path is in a Windows dialect (drive or UNC), i.e.
/// compared case-insensitively.
pub fn is_windows_form(path: &str) -> bool {
    drive_re().is_match(path) || path.starts_with("\\\\")
}

/// Whether the raw input denotes an absolute location in some dialect.
/// Drive-relative (`C:foo`) and bare relative inputs do not qualify, even
/// though `normalize_path` anchors them.
pub fn is_absolute_input(raw: &str) -> bool {
    match detect_form(raw) {
        PathForm::Unc | PathForm::Gitbash | PathForm::Posix => true,
        PathForm::Windows => matches!(raw.as_bytes().get(2), Some(b'\\' | b'/')),
        PathForm::Relative | PathForm::Empty => false,
    }
}

/// Translate a drive path into its WSL mount form:
/// `C:\Users\test` → `/mnt/c/Users/test`. UNC paths have no mount form.
pub fn windows_to_wsl(path: &str, mount_point: &str) -> Option<String> {
    let norm = normalize_path(path);
    if !drive_re().is_match(&norm) {
        return None;
    }
    let drive = norm.as_bytes()[0].to_ascii_lowercase() as char;
    let rest = norm[2..].trim_start_matches('\\').replace('\\', "/");
    let mount = mount_point.trim_end_matches('/');
    Some(if rest.is_empty() {
        format!("{mount}/{drive}")
    } else {
        format!("{mount}/{drive}/{rest}")
    })
}

/// Canonical WSL-side form of an allowed-path entry, whatever dialect it was
/// configured in. Entries with no WSL equivalent (UNC shares) map to `None`.
pub fn wsl_allowed_form(entry: &str, mount_point: &str) -> Option<String> {
    let norm = normalize_path(entry);
    if drive_re().is_match(&norm) {
        windows_to_wsl(&norm, mount_point)
    } else if norm.starts_with('/') {
        Some(norm)
    } else {
        None
    }
}

/// Normalize a configured allowed-path list into validator form: canonical
/// shapes, Windows dialects lowercased, duplicates and nested entries
/// collapsed to their shortest covering prefix, sorted.
pub fn normalize_allowed_paths(entries: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = entries
        .iter()
        .map(|entry| {
            let mut n = normalize_path(entry);
            if is_windows_form(&n) {
                n = n.to_lowercase();
            } else if n.len() > 1 && n.ends_with('/') {
                // a trailing slash must not change membership
                n.truncate(n.len() - 1);
            }
            n
        })
        .filter(|n| !n.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();

    let mut collapsed: Vec<String> = Vec::new();
    for entry in normalized {
        if !collapsed.iter().any(|kept| is_within(&entry, kept)) {
            collapsed.push(entry);
        }
    }
    collapsed
}

/// Whether `dir` equals `allowed` or sits below it, with the component
/// boundary at the dialect separator. Windows forms compare
/// case-insensitively, POSIX forms case-sensitively. Both sides are expected
/// in normalized form.
pub fn is_within(dir: &str, allowed: &str) -> bool {
    if dir.is_empty() || allowed.is_empty() {
        return false;
    }
    let windows = is_windows_form(allowed);
    let sep = if windows { '\\' } else { '/' };
    let (dir_cmp, allowed_cmp) = if windows {
        (dir.to_lowercase(), allowed.to_lowercase())
    } else {
        (dir.to_string(), allowed.to_string())
    };
    let trimmed = if allowed_cmp.len() > 1 {
        allowed_cmp.trim_end_matches(sep)
    } else {
        allowed_cmp.as_str()
    };
    if dir_cmp == trimmed || dir_cmp == allowed_cmp {
        return true;
    }
    let mut prefix = trimmed.to_string();
    if !prefix.ends_with(sep) {
        prefix.push(sep);
    }
    dir_cmp.starts_with(&prefix)
}

/// Append a relative segment to a Windows-dialect base. The result is raw;
/// run it through `normalize_path` before using it.
pub fn join_windows(base: &str, rel: &str) -> String {
    format!("{}\\{}", base.trim_end_matches('\\'), rel)
}

/// Append a relative segment to a POSIX-dialect base. The result is raw;
/// run it through `normalize_path` before using it.
pub fn join_posix(base: &str, rel: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), rel)
}
