//! Statement hashing for the revision store. Hashes are stable across
//! whitespace and comment edits: the statement is comment-stripped and
//! whitespace-collapsed before SHA-256, and the digest carries a scheme
//! tag so the format can evolve.

use sha2::{Digest, Sha256};

pub const HASH_SCHEME: &str = "h1:";

/// Strip comments (outside string literals) and collapse whitespace runs
/// to single spaces.
pub fn normalize(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0usize;
    let mut in_string = false;
    let mut pending_space = false;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1] as char);
                i += 2;
                continue;
            }
            if c == '\'' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '\'' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }
        if c == '-' && bytes.get(i + 1) == Some(&b'-') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            pending_space = true;
            continue;
        }
        if c == '/' && bytes.get(i + 1) == Some(&b'*') {
            i += 2;
            let mut depth = 1usize;
            while i < bytes.len() && depth > 0 {
                if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
                    depth += 1;
                    i += 2;
                } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    depth -= 1;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            pending_space = true;
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            i += 1;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
        i += 1;
    }
    out.trim().to_string()
}

pub fn statement_hash(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(sql).as_bytes());
    format!("{HASH_SCHEME}{:x}", hasher.finalize())
}

/// Split a migration file into statements on top-level `;`, dropping
/// empty and comment-only fragments.
pub fn split_statements(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut i = 0usize;
    let mut in_string = false;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            buf.push(c);
            if c == '\\' && i + 1 < bytes.len() {
                buf.push(bytes[i + 1] as char);
                i += 2;
                continue;
            }
            if c == '\'' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' => {
                in_string = true;
                buf.push(c);
                i += 1;
            }
            '-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    buf.push(bytes[i] as char);
                    i += 1;
                }
            }
            '/' if bytes.get(i + 1) == Some(&b'*') => {
                buf.push_str("/*");
                i += 2;
                let mut depth = 1usize;
                while i < bytes.len() && depth > 0 {
                    if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
                        depth += 1;
                        buf.push_str("/*");
                        i += 2;
                    } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        depth -= 1;
                        buf.push_str("*/");
                        i += 2;
                    } else {
                        buf.push(bytes[i] as char);
                        i += 1;
                    }
                }
            }
            ';' => {
                out.push(std::mem::take(&mut buf));
                i += 1;
            }
            _ => {
                buf.push(c);
                i += 1;
            }
        }
    }
    out.push(buf);
    out.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !normalize(s).is_empty())
        .collect()
}
