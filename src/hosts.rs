//! Host list handling.
//!
//! The packaged host list is a single comma-separated string that usually
//! carries line breaks and padding from being edited by hand.

/// Removes every newline and space character from a host entry.
///
/// Characters are dropped wherever they appear, not only at the ends, and
/// everything else keeps its relative order.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| *c != '\n' && *c != ' ').collect()
}

/// Splits a comma-separated host list and normalizes each entry.
///
/// Empty entries are kept so every token of the list gets exactly one
/// report line.
pub fn split_hosts(list: &str) -> Vec<String> {
    list.split(',').map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_inner_whitespace() {
        assert_eq!(normalize(" a.exa mple.com\n"), "a.example.com");
        assert_eq!(normalize("\nb.example.com"), "b.example.com");
    }

    #[test]
    fn test_normalize_keeps_other_characters() {
        // tabs and carriage returns are not stripped
        assert_eq!(normalize("a\tb\rc-d_e.f"), "a\tb\rc-d_e.f");
        assert_eq!(normalize("ünï.example"), "ünï.example");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n \n"), "");
    }

    #[test]
    fn test_split_hosts() {
        assert_eq!(
            split_hosts("a.example.com, b.example.com"),
            vec!["a.example.com".to_string(), "b.example.com".to_string()]
        );
    }

    #[test]
    fn test_split_hosts_keeps_empty_entries() {
        let hosts = split_hosts("a.example.com,\nb.example.com,\n");
        assert_eq!(hosts, vec!["a.example.com", "b.example.com", ""]);
    }
}
