//! Value escaping for DNs (RFC 4514) and search filters (RFC 4515).

/// Escape special characters in a search filter assertion value.
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

/// Escape special characters in an RDN attribute value.
///
/// - Leading or trailing SPACE becomes `\20`
/// - Leading `#` becomes `\23`
/// - `, + " \ < > ; =` are backslash-prefixed
/// - NUL becomes `\00`
pub fn escape_dn_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut result = String::with_capacity(value.len() * 2);

    for (i, ch) in value.chars().enumerate() {
        let is_first = i == 0;
        let is_last = i == last;

        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(ch);
            }
            '\0' => result.push_str("\\00"),
            ' ' if is_first || is_last => result.push_str("\\20"),
            '#' if is_first => result.push_str("\\23"),
            _ => result.push(ch),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("John Doe"), "John Doe");
        assert_eq!(escape_filter_value("John*"), "John\\2a");
        assert_eq!(escape_filter_value("(admin)"), "\\28admin\\29");
        assert_eq!(escape_filter_value("a\\b"), "a\\5cb");
    }

    #[test]
    fn test_escape_dn_value_simple() {
        assert_eq!(escape_dn_value("asilva"), "asilva");
        assert_eq!(escape_dn_value("Ana Silva"), "Ana Silva");
        assert_eq!(escape_dn_value(""), "");
    }

    #[test]
    fn test_escape_dn_value_special_chars() {
        assert_eq!(escape_dn_value("a,b"), "a\\,b");
        assert_eq!(escape_dn_value("a+b"), "a\\+b");
        assert_eq!(escape_dn_value("a;b"), "a\\;b");
        assert_eq!(escape_dn_value("a=b"), "a\\=b");
        assert_eq!(escape_dn_value("a\0b"), "a\\00b");
    }

    #[test]
    fn test_escape_dn_value_edges() {
        assert_eq!(escape_dn_value(" admin "), "\\20admin\\20");
        assert_eq!(escape_dn_value("#admin"), "\\23admin");
        assert_eq!(escape_dn_value("admin#1"), "admin#1");
        // multi-byte characters do not shift the trailing-space check
        assert_eq!(escape_dn_value("jõ "), "jõ\\20");
    }

    #[test]
    fn test_escape_dn_value_injection_attempt() {
        let escaped = escape_dn_value("admin,dc=evil,dc=com");
        assert_eq!(escaped, "admin\\,dc\\=evil\\,dc\\=com");
    }
}
