// /src/custom_strings.rs
/// Returns the substring after `delimiter`, if present.
pub fn extract_after_delimiter<'a>(input: &'a str, delimiter: &str) -> Option<&'a str> {
    input.split_once(delimiter).map(|(_, suffix)| suffix)
}

/// Outcome of looking for the first double-quoted field of a modem line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoted<'a> {
    Found(&'a str),
    /// The line carries no quote at all.
    Missing,
    /// An opening quote with the line ending (CR) or the input ending before
    /// the closing one.
    Unterminated,
}

/// Returns the first double-quoted field of a modem reply line.
///
/// The returned slice borrows `input`; callers copy it out because the parser
/// buffer is reused for the next line.
pub fn find_quoted(input: &str) -> Quoted<'_> {
    let Some(open) = input.find('"') else {
        return Quoted::Missing;
    };
    let rest = &input[open + 1..];
    for (idx, ch) in rest.char_indices() {
        match ch {
            '"' => return Quoted::Found(&rest[..idx]),
            '\r' => return Quoted::Unterminated,
            _ => {}
        }
    }
    Quoted::Unterminated
}

/// Parses the leading decimal digits of `input` after optional spaces, the way
/// `atoi` does: no digits gives 0, trailing text is ignored.
pub fn parse_leading_u32(input: &str) -> u32 {
    input
        .trim_start_matches(' ')
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u32::from(digit - b'0'))
        })
}
