//! Character entity decoding (§4.E `CharEntity`). Named entities use a
//! `phf` static map the way the teacher's `linguist_data.rs` ships its own
//! static language tables (same crate, same build-time-map idiom); numeric
//! entities are decoded per CommonMark §2.5 straight from the codepoint.
//!
//! Covers the common prose entities rather than the full ~2000-name HTML5
//! table: an unrecognized name falls back to leaving the entity as literal
//! text, which is the behavior CommonMark specifies for unknown entities.

static NAMED_ENTITIES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "amp" => "&",
    "lt" => "<",
    "gt" => ">",
    "quot" => "\"",
    "apos" => "'",
    "nbsp" => "\u{00A0}",
    "copy" => "\u{00A9}",
    "reg" => "\u{00AE}",
    "trade" => "\u{2122}",
    "hellip" => "\u{2026}",
    "mdash" => "\u{2014}",
    "ndash" => "\u{2013}",
    "lsquo" => "\u{2018}",
    "rsquo" => "\u{2019}",
    "ldquo" => "\u{201C}",
    "rdquo" => "\u{201D}",
    "middot" => "\u{00B7}",
    "deg" => "\u{00B0}",
    "plusmn" => "\u{00B1}",
    "times" => "\u{00D7}",
    "divide" => "\u{00F7}",
    "frac12" => "\u{00BD}",
    "frac14" => "\u{00BC}",
    "frac34" => "\u{00BE}",
    "euro" => "\u{20AC}",
    "pound" => "\u{00A3}",
    "cent" => "\u{00A2}",
    "yen" => "\u{00A5}",
    "sect" => "\u{00A7}",
    "para" => "\u{00B6}",
    "larr" => "\u{2190}",
    "rarr" => "\u{2192}",
    "uarr" => "\u{2191}",
    "darr" => "\u{2193}",
    "bull" => "\u{2022}",
    "dagger" => "\u{2020}",
    "Dagger" => "\u{2021}",
};

/// Attempts to decode the body of `&NAME;` (without the `&`/`;`). Returns
/// `None` for unrecognized names, in which case the caller should keep the
/// `&...;` run as literal text.
pub fn decode_named(name: &str) -> Option<&'static str> {
    NAMED_ENTITIES.get(name).copied()
}

/// Decodes a decimal (`#123`) or hex (`#x1F600`) numeric entity body
/// (without `&`/`;`). Invalid or out-of-range codepoints fall back to the
/// Unicode replacement character, per CommonMark §2.5.
pub fn decode_numeric(body: &str) -> Option<String> {
    let digits = body.strip_prefix('#')?;
    let codepoint = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    let ch = if codepoint == 0 {
        '\u{FFFD}'
    } else {
        char::from_u32(codepoint).unwrap_or('\u{FFFD}')
    };
    Some(ch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_named_entities() {
        assert_eq!(decode_named("amp"), Some("&"));
        assert_eq!(decode_named("mdash"), Some("\u{2014}"));
    }

    #[test]
    fn unknown_named_entity_is_none() {
        assert_eq!(decode_named("notarealentity"), None);
    }

    #[test]
    fn decodes_decimal_and_hex_numeric_entities() {
        assert_eq!(decode_numeric("#65"), Some("A".to_string()));
        assert_eq!(decode_numeric("#x41"), Some("A".to_string()));
    }

    #[test]
    fn invalid_codepoint_falls_back_to_replacement_char() {
        assert_eq!(decode_numeric("#0"), Some("\u{FFFD}".to_string()));
    }
}
