use std::collections::HashMap;

use super::diagnostics::{Decoded, Diagnostic};

/// Raw `key=value` pairs read from one block. Keys are case-sensitive and the
/// last occurrence of a key wins.
pub type PropertyMap = HashMap<String, String>;

/// Iterator adapter that pairs each line with its 1-based line number.
pub struct NumberedLines<I> {
    inner: I,
    line: usize,
}

impl<I> NumberedLines<I> {
    pub fn new(inner: I) -> Self {
        Self { inner, line: 0 }
    }

    /// Number of the last line handed out, 0 before the first one.
    pub fn current_line(&self) -> usize {
        self.line
    }
}

impl<I: Iterator> Iterator for NumberedLines<I> {
    type Item = (usize, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.line += 1;
        Some((self.line, item))
    }
}

/// Wraps any sequence of lines so it can be fed to [`read_properties`].
pub fn numbered<I>(lines: I) -> NumberedLines<I::IntoIter>
where
    I: IntoIterator,
{
    NumberedLines::new(lines.into_iter())
}

/// Reads `key=value` lines until a line satisfies `is_terminator`.
///
/// Every line is trimmed before it is looked at. The terminator line is
/// consumed but not stored. A line is only accepted when it contains exactly
/// one `=`; everything else is skipped with a [`Diagnostic::MalformedProperty`].
/// Key and value keep any whitespace around the `=`.
///
/// If the lines run out before a terminator shows up, whatever was read so far
/// is returned along with a [`Diagnostic::UnterminatedBlock`].
pub fn read_properties<I, S, F>(lines: &mut NumberedLines<I>, is_terminator: F) -> Decoded<PropertyMap>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let start_line = lines.current_line();
    let mut decoded = Decoded::new(PropertyMap::new());

    for (line_no, raw) in lines.by_ref() {
        let line = raw.as_ref().trim();
        if is_terminator(line) {
            return decoded;
        }

        match split_property(line) {
            Some((key, value)) => {
                decoded.value.insert(key.to_string(), value.to_string());
            }
            None => decoded.push(Diagnostic::MalformedProperty {
                line: line_no,
                text: line.to_string(),
            }),
        }
    }

    decoded.push(Diagnostic::UnterminatedBlock { line: start_line });
    decoded
}

/// Splits `line` into key and value if it holds exactly one `=`.
fn split_property(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    if value.contains('=') {
        return None;
    }
    Some((key, value))
}
