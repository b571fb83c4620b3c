//! Name derivations shared by declarations and exceptions.

/// Split on uppercase letters, keeping each uppercase letter at the start of
/// its chunk: `RuntimeError` → `["Runtime", "Error"]`.
fn split_uppercase(name: &str) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in name.chars() {
        if c.is_uppercase() && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Upper-snake error name for a type: `RuntimeError` → `RUNTIME_ERROR`.
///
/// Accepts a full `std::any::type_name` and keeps only the last path segment
/// without generic arguments.
#[must_use]
pub fn error_name_from_type(type_name: &str) -> String {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    let short = without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .trim_start_matches('&');
    split_uppercase(short)
        .iter()
        .map(|chunk| chunk.trim_matches('_'))
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// Stable identifier: lowercase ASCII alphanumerics of `name`.
#[must_use]
pub fn identifier(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Derive an endpoint path from a handler's module path and name.
///
/// The crate name (first `::` segment) is dropped so the path is project
/// relative. Then:
/// - `_`, `.` and `::` separate segments;
/// - uppercase transitions become `-` (`helloWorld` → `hello-world`);
/// - a `__name__` pair becomes a `<name>` dynamic segment;
/// - the result is lowercased, `/` are deduplicated and it is prefixed by `/`.
#[must_use]
pub fn derive_path(module_path: &str, handler_name: &str) -> String {
    let relative = module_path
        .split_once("::")
        .map_or("", |(_, rest)| rest)
        .replace("::", ".");
    let full = if relative.is_empty() {
        handler_name.to_string()
    } else {
        format!("{relative}.{handler_name}")
    };

    let chars: Vec<char> = full.chars().collect();
    let mut out = String::from("/");
    let mut in_dynamic = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '_' && chars.get(i + 1) == Some(&'_') {
            if in_dynamic {
                out.push('>');
            } else {
                out.push_str("/<");
            }
            in_dynamic = !in_dynamic;
            i += 2;
            continue;
        }
        if in_dynamic {
            out.push(c.to_ascii_lowercase());
        } else if c == '_' || c == '.' {
            out.push('/');
        } else if c.is_uppercase() {
            let previous = if i > 0 { Some(chars[i - 1]) } else { None };
            if previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        i += 1;
    }
    if in_dynamic {
        out.push('>');
    }

    let mut deduped = String::with_capacity(out.len());
    for c in out.chars() {
        if c == '/' && deduped.ends_with('/') {
            continue;
        }
        deduped.push(c);
    }
    if deduped.len() > 1 {
        while deduped.ends_with('/') {
            deduped.pop();
        }
    }
    deduped
}
