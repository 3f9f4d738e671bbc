/// Decode the small set of character references AI-produced markup actually uses.
///
/// Contract:
/// - Named references: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// - Numeric references only when semicolon-terminated: `&#215;`, `&#xD7;`.
/// - Anything else (unknown names, missing `;`, invalid scalars, overlong digit
///   runs) is copied through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    let Some(first) = memchr::memchr(b'&', s.as_bytes()) else {
        return s.to_string();
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut rest = &s[first..];

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_reference(rest) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

const NAMED: &[(&str, char)] = &[
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&apos;", '\''),
    ("&nbsp;", '\u{00A0}'),
];

// 0x10FFFF and 1114111 respectively.
const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

/// `input` starts with `&`. Returns the decoded char and the bytes consumed.
fn decode_reference(input: &str) -> Option<(char, usize)> {
    for (name, ch) in NAMED {
        if input.starts_with(name) {
            return Some((*ch, name.len()));
        }
    }

    let numeric = input.strip_prefix("&#")?;
    let (digits_start, radix, max_digits) = match numeric.as_bytes().first() {
        Some(b'x' | b'X') => (3, 16, MAX_HEX_DIGITS),
        _ => (2, 10, MAX_DEC_DIGITS),
    };
    let body = &input[digits_start..];
    let end = body.find(';')?;
    let digits = &body[..end];
    if digits.is_empty()
        || digits.len() > max_digits
        || !digits.bytes().all(|b| (b as char).is_digit(radix))
    {
        return None;
    }
    let ch = u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)?;
    Some((ch, digits_start + end + 1))
}
