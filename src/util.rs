//! Small pure helpers shared across the core.

/// Derive a capitalized organization name from an email address's domain.
///
/// Uses the second-to-last dot-separated label, or the whole label when the
/// domain has only one segment.
///
/// Example: "jane@sub.example.com" → "Example", "a@b" → "B"
///
/// Returns `None` for missing or malformed input (no `@`, empty domain).
pub fn derive_company(email: &str) -> Option<String> {
    let (_, domain) = email.split_once('@')?;
    let labels: Vec<&str> = domain.split('.').filter(|s| !s.is_empty()).collect();
    let label = match labels.len() {
        0 => return None,
        1 => labels[0],
        n => labels[n - 2],
    };
    Some(capitalize(label))
}

/// Derive a display name from an email address (best-effort).
///
/// Example: "sarah.chen@acme.com" → "Sarah Chen"
pub fn name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    local
        .split(|c: char| c == '.' || c == '_' || c == '-' || c == '+')
        .filter(|s| !s.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
