//! C1 Slugger: heading title -> normalized slug, plus the FNV-1a hash used
//! to mint a stable 6-hex-character collision suffix.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// 6-hex-character suffix from the low 24 bits of a stable hash of
/// `(parent_sid, slug, sibling_index)`.
pub fn collision_suffix(parent_sid: &str, slug: &str, sibling_index: usize) -> String {
    let key = format!("{parent_sid}\u{0}{slug}\u{0}{sibling_index}");
    let hash = fnv1a64(key.as_bytes());
    let low24 = (hash & 0x00FF_FFFF) as u32;
    format!("{low24:06x}")
}

/// `^\d+(\.\d+)*\s*` stripped from the front, ASCII-digit only.
fn strip_leading_digits(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut idx = 0;
    let mut any_digits = false;
    loop {
        let seg_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx == seg_start {
            break;
        }
        any_digits = true;
        if idx < bytes.len() && bytes[idx] == b'.' && bytes.get(idx + 1).is_some_and(u8::is_ascii_digit) {
            idx += 1;
            continue;
        }
        break;
    }
    if !any_digits {
        return s;
    }
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    &s[idx..]
}

fn strip_bold_markers(s: &str) -> String {
    s.replace("**", "")
}

fn is_combining_mark(ch: char) -> bool {
    matches!(ch as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

fn is_slug_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || is_combining_mark(ch)
}

fn collapse_dashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_dash = false;
    for ch in s.chars() {
        if ch == '-' {
            if !prev_dash {
                out.push('-');
            }
            prev_dash = true;
        } else {
            out.push(ch);
            prev_dash = false;
        }
    }
    out
}

/// Slug grammar: `[\p{L}\p{N}\p{M}_-]+`. Steps: strip a leading ordinal
/// prefix, strip `**` emphasis markers, lowercase, collapse whitespace runs
/// to a single `-`, drop every other non-word character, collapse repeated
/// `-`, trim leading/trailing `-`. An empty result falls back to `"section"`.
pub fn slugify(title: &str) -> String {
    let stripped = strip_leading_digits(title);
    let stripped = strip_bold_markers(stripped);
    let lowered = stripped.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut pending_dash = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() {
                pending_dash = true;
            }
            continue;
        }
        if is_slug_word_char(ch) {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.push(ch);
        }
        // any other punctuation is dropped silently
    }

    let collapsed = collapse_dashes(&out);
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        "section".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ordinal_prefix() {
        assert_eq!(slugify("1.2 Getting Started"), "getting-started");
        assert_eq!(slugify("3. Overview"), "overview");
    }

    #[test]
    fn strips_bold_markers_and_collapses_whitespace() {
        assert_eq!(slugify("**Important**  Notes"), "important-notes");
    }

    #[test]
    fn drops_punctuation_without_introducing_dashes() {
        assert_eq!(slugify("API (v2) Reference!"), "api-v2-reference");
    }

    #[test]
    fn empty_title_falls_back_to_section() {
        assert_eq!(slugify("***"), "section");
        assert_eq!(slugify(""), "section");
    }

    #[test]
    fn collision_suffix_is_stable_and_distinct_per_sibling_index() {
        let a = collision_suffix("/intro", "details", 1);
        let b = collision_suffix("/intro", "details", 2);
        assert_ne!(a, b);
        assert_eq!(a.len(), 6);
        assert_eq!(a, collision_suffix("/intro", "details", 1));
    }
}
