//! Input line hygiene.

/// Strip control characters from a submitted line and collapse tabs to
/// spaces. Printable Unicode passes through untouched.
pub fn sanitize_line(input: &str) -> String {
    input
        .chars()
        .filter_map(|ch| match ch {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect::<String>()
        .trim()
        .to_string()
}
