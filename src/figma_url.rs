//! Accept Figma share links where a file key or node id is expected.

/// Extract the file key from `https://www.figma.com/design/<key>/...` or
/// `.../file/<key>/...`. Plain keys are returned unchanged.
pub fn file_key(input: &str) -> String {
    let input = input.trim();
    if !(input.contains("/file/") || input.contains("/design/") || input.contains("/board/")) {
        return input.to_string();
    }

    let mut segments = input.split('/');
    while let Some(segment) = segments.next() {
        if matches!(segment, "file" | "design" | "board") {
            if let Some(key) = segments.next() {
                let key = key.split(['?', '#']).next().unwrap_or(key);
                if !key.is_empty() {
                    return key.to_string();
                }
            }
        }
    }
    input.to_string()
}

/// Normalize a node id.
///
/// Share links carry `node-id=12-34`; the API expects `12:34`.
pub fn node_id(input: &str) -> String {
    let input = input.trim();
    let raw = match input.split_once("node-id=") {
        Some((_, rest)) => rest.split(['&', '#']).next().unwrap_or(rest),
        None => input,
    };
    raw.replace("%3A", ":").replace("%3a", ":").replace('-', ":")
}
