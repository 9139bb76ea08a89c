/// Decode the small entity subset legacy widget forms emit.
///
/// Contract:
/// - Named entities decoded: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&#39;`-style
///   numerics, `&nbsp;`.
/// - Numeric entities decode only when well-formed and semicolon-terminated.
/// - Invalid scalars, unknown names and missing semicolons pass through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    const NAMED: &[(&[u8], char)] = &[
        (b"&amp;", '&'),
        (b"&lt;", '<'),
        (b"&gt;", '>'),
        (b"&quot;", '"'),
        (b"&apos;", '\''),
        (b"&nbsp;", '\u{00A0}'),
    ];
    const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
    const MAX_DEC_DIGITS: usize = 7; // 1114111

    // Bounded scan to avoid quadratic behavior on adversarial input.
    fn scan_numeric(bytes: &[u8], start: usize, max_digits: usize, is_hex: bool) -> Option<usize> {
        let mut j = start;
        while j < bytes.len() && j - start <= max_digits {
            let b = bytes[j];
            if b == b';' {
                return (j > start).then_some(j);
            }
            let ok = if is_hex {
                b.is_ascii_hexdigit()
            } else {
                b.is_ascii_digit()
            };
            if !ok {
                return None;
            }
            j += 1;
        }
        None
    }

    let Some(first) = memchr::memchr(b'&', s.as_bytes()) else {
        return s.to_string();
    };

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;
    let mut copy_start = first;

    'scan: while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }
        out.push_str(&s[copy_start..i]);

        for (pat, ch) in NAMED {
            if bytes[i..].starts_with(pat) {
                out.push(*ch);
                i += pat.len();
                copy_start = i;
                continue 'scan;
            }
        }

        let numeric = if bytes[i..].starts_with(b"&#x") || bytes[i..].starts_with(b"&#X") {
            Some((i + 3, MAX_HEX_DIGITS, 16))
        } else if bytes[i..].starts_with(b"&#") {
            Some((i + 2, MAX_DEC_DIGITS, 10))
        } else {
            None
        };
        if let Some((digits_start, max, radix)) = numeric
            && let Some(end) = scan_numeric(bytes, digits_start, max, radix == 16)
            && let Some(ch) = u32::from_str_radix(&s[digits_start..end], radix)
                .ok()
                .and_then(char::from_u32)
        {
            out.push(ch);
            i = end + 1;
            copy_start = i;
            continue;
        }

        // keep '&' as-is
        out.push('&');
        i += 1;
        copy_start = i;
    }

    if copy_start < bytes.len() {
        out.push_str(&s[copy_start..]);
    }
    out
}

/// Escape text content for serialization.
pub fn escape_text(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Escape a double-quoted attribute value for serialization.
pub fn escape_attr(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
