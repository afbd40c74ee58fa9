/// Accented French letters that survive normalization.
pub const ACCENTED_ALLOW_LIST: [char; 13] = [
    'à', 'â', 'ç', 'é', 'è', 'ê', 'ë', 'î', 'ï', 'ô', 'û', 'ù', 'ÿ',
];

/// Whitespace as the trained artifacts see it: Unicode `White_Space` plus
/// the information separators `U+001C..=U+001F`, which Python's `str.isspace`
/// and `\s` also match.
pub fn is_message_whitespace(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Returns true when `c` may appear in normalized text.
pub fn is_allowed(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || is_message_whitespace(c)
        || ACCENTED_ALLOW_LIST.contains(&c)
}

/// Prepares a raw message for vectorization.
///
/// The whole string is lowercased, then every character outside
/// `[a-z0-9]`, whitespace and [`ACCENTED_ALLOW_LIST`] is deleted. Whitespace
/// runs are kept as-is and nothing is trimmed.
///
/// No Unicode composition is applied: a decomposed `e\u{301}` keeps its `e`
/// and loses the combining accent.
///
/// # Example
/// ```
/// use spam_detector::normalize;
///
/// assert_eq!(normalize("Gagnez 100€ MAINTENANT !"), "gagnez 100 maintenant ");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().chars().filter(|&c| is_allowed(c)).collect()
}
