//! Dotted path parsing and formatting.
//!
//! A path string joins segments with a separator (normally `.`). A segment may
//! be wrapped in `"` or `'` to contain the separator or to be empty:
//!
//! ```text
//! server.port          -> ["server", "port"]
//! a."b.c".d            -> ["a", "b.c", "d"]
//! tables.''.name       -> ["tables", "", "name"]
//! ```
//!
//! Inside a quoted segment, `\\`, `\"` and `\'` are the only escapes. Outside
//! quotes every character except the separator is literal, so `it's` is a
//! single ordinary segment.

use crate::error::PathError;

/// Split a path string into its segments.
///
/// The empty string yields one empty segment, never zero segments.
pub fn split(text: &str, separator: char) -> Result<Vec<String>, PathError> {
    let mut segments = Vec::new();
    let mut chars = text.char_indices().peekable();

    loop {
        let mut segment = String::new();

        match chars.peek().copied() {
            Some((start, quote @ ('"' | '\''))) => {
                chars.next();
                let mut closed = false;
                while let Some((offset, c)) = chars.next() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    if c == '\\' {
                        match chars.next() {
                            Some((_, escaped @ ('\\' | '"' | '\''))) => segment.push(escaped),
                            Some((_, found)) => {
                                return Err(PathError::InvalidEscape {
                                    path: text.to_string(),
                                    offset,
                                    found,
                                });
                            }
                            None => break,
                        }
                    } else {
                        segment.push(c);
                    }
                }
                if !closed {
                    return Err(PathError::UnterminatedQuote {
                        path: text.to_string(),
                        offset: start,
                    });
                }
                // Only a separator (or the end) may follow a closing quote
                match chars.peek().copied() {
                    None => {}
                    Some((_, c)) if c == separator => {}
                    Some((offset, found)) => {
                        return Err(PathError::UnexpectedCharacter {
                            path: text.to_string(),
                            offset,
                            found,
                        });
                    }
                }
            }
            _ => {
                while let Some(&(_, c)) = chars.peek() {
                    if c == separator {
                        break;
                    }
                    segment.push(c);
                    chars.next();
                }
            }
        }

        segments.push(segment);

        // Either we stopped on a separator or we ran out of input
        match chars.next() {
            Some(_) => continue,
            None => break,
        }
    }

    Ok(segments)
}

/// Join segments into a path string that [`split`] parses back to the same
/// segments.
///
/// Segments that are empty, contain the separator, or start with a quote are
/// written in double quotes.
pub fn join<S: AsRef<str>>(segments: &[S], separator: char) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        let segment = segment.as_ref();
        if needs_quotes(segment, separator) {
            out.push('"');
            for c in segment.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        } else {
            out.push_str(segment);
        }
    }
    out
}

fn needs_quotes(segment: &str, separator: char) -> bool {
    segment.is_empty() || segment.starts_with(['"', '\'']) || segment.contains(separator)
}

/// Something that names a location in a config tree.
///
/// String types are parsed as dotted paths. Slices, arrays and vectors are
/// taken as explicit segment lists and never parsed, so `["a.b"]` names a
/// single key containing a dot.
pub trait IntoPath {
    /// Convert into path segments.
    fn into_path(self) -> Result<Vec<String>, PathError>;
}

impl IntoPath for &str {
    fn into_path(self) -> Result<Vec<String>, PathError> {
        split(self, '.')
    }
}

impl IntoPath for &String {
    fn into_path(self) -> Result<Vec<String>, PathError> {
        split(self, '.')
    }
}

impl IntoPath for String {
    fn into_path(self) -> Result<Vec<String>, PathError> {
        split(&self, '.')
    }
}

impl IntoPath for Vec<String> {
    fn into_path(self) -> Result<Vec<String>, PathError> {
        Ok(self)
    }
}

impl IntoPath for &[String] {
    fn into_path(self) -> Result<Vec<String>, PathError> {
        Ok(self.to_vec())
    }
}

impl IntoPath for &Vec<String> {
    fn into_path(self) -> Result<Vec<String>, PathError> {
        Ok(self.clone())
    }
}

impl IntoPath for &[&str] {
    fn into_path(self) -> Result<Vec<String>, PathError> {
        Ok(self.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> IntoPath for [&str; N] {
    fn into_path(self) -> Result<Vec<String>, PathError> {
        Ok(self.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> IntoPath for &[&str; N] {
    fn into_path(self) -> Result<Vec<String>, PathError> {
        Ok(self.iter().map(|s| s.to_string()).collect())
    }
}
