/// Build the public slug for a proposal: `{proposer}-{partner}-{millis}`.
///
/// Names are lowercased, whitespace runs become a single `-`, and anything
/// outside `[a-z0-9-]` is dropped so the result is always URL-safe.
pub fn generate_slug(proposer_name: &str, partner_name: &str, unix_millis: i64) -> String {
    let mut parts: Vec<String> = [proposer_name, partner_name]
        .iter()
        .map(|name| slug_part(name))
        .filter(|part| !part.is_empty())
        .collect();
    parts.push(unix_millis.to_string());
    parts.join("-")
}

fn slug_part(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// True if `slug` only contains characters [`generate_slug`] can produce.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 200
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
