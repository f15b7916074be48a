//! Header token to SQL identifier conversion

/// Reduce a raw header token to lowercase ASCII alphanumerics.
///
/// A token with no alphanumeric characters sanitizes to the empty string; the
/// resolver rejects that rather than emitting an unnamed column.
pub fn sanitize_column_name(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
