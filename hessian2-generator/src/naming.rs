//! Go naming conventions used when deriving identifiers from proto names.
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `Outer.inner_msg` | [`go_camel_case`] | `Outer_InnerMsg` |
//! | `my-pkg` | [`go_sanitized`] | `my_pkg` |
//! | `a"b` | [`go_quote`] | `"a\"b"` |
//! | `[0xff, b'z']` | [`go_quote_bytes`] | `"\xffz"` |

/// Converts a dotted proto name into a Go identifier the way protoc-gen-go
/// does: dots become underscores, `_x` becomes `X`, and every lower-case run
/// after a non-letter starts with a capital.
///
/// ```
/// use hessian2_generator::naming::go_camel_case;
///
/// assert_eq!(go_camel_case("point"), "Point");
/// assert_eq!(go_camel_case("Order.Address"), "Order_Address");
/// assert_eq!(go_camel_case("shipping_address"), "ShippingAddress");
/// assert_eq!(go_camel_case("_private"), "XPrivate");
/// ```
pub fn go_camel_case(s: &str) -> String {
    let b = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < b.len() {
        let c = b[i];
        match c {
            b'.' if i + 1 < b.len() && b[i + 1].is_ascii_lowercase() => {}
            b'.' => out.push('_'),
            b'_' if i == 0 || b[i - 1] == b'.' => out.push('X'),
            b'_' if i + 1 < b.len() && b[i + 1].is_ascii_lowercase() => {}
            c if c.is_ascii_digit() => out.push(c as char),
            _ => {
                out.push(c.to_ascii_uppercase() as char);
                while i + 1 < b.len() && b[i + 1].is_ascii_lowercase() {
                    i += 1;
                    out.push(b[i] as char);
                }
            }
        }
        i += 1;
    }
    out
}

const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return",
    "select", "struct", "switch", "type", "var",
];

/// Makes `s` usable as a Go package name.
pub fn go_sanitized(s: &str) -> String {
    let mut out: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    if GO_KEYWORDS.contains(&out.as_str()) {
        out.insert(0, '_');
    }
    out
}

/// Renders `s` as a Go interpreted string literal.
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\u{0b}' => out.push_str("\\v"),
            c if c.is_control() => {
                let n = c as u32;
                if n < 0x80 {
                    out.push_str(&format!("\\x{n:02x}"));
                } else {
                    out.push_str(&format!("\\u{n:04x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Renders raw bytes as a Go interpreted string literal. Anything outside
/// printable ASCII is written as a `\xNN` escape so the literal holds
/// exactly these bytes.
pub fn go_quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(char::from(b)),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('"');
    out
}
