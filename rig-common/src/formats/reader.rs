//! Line-oriented reader shared by the mesh and animation parsers.
//!
//! Blank lines only separate records, so every read skips them. Names are read
//! as whole lines because joint names may contain spaces.

use std::str::{FromStr, Lines};

use super::FormatError;

pub(crate) struct LineReader<'a> {
    lines: Lines<'a>,
    line: usize,
}

impl<'a> LineReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line: 0,
        }
    }

    /// Next non-blank line with its 1-based line number
    pub fn next_line(&mut self, what: &'static str) -> Result<(usize, &'a str), FormatError> {
        for line in self.lines.by_ref() {
            self.line += 1;
            if !line.trim().is_empty() {
                return Ok((self.line, line));
            }
        }
        Err(FormatError::UnexpectedEof(what))
    }

    /// Read the `[N]` version line and check it against the supported version
    pub fn expect_version(&mut self, version: u32) -> Result<(), FormatError> {
        let (_, line) = self.next_line("version header")?;
        let found = line.trim();
        if found != format!("[{}]", version) {
            return Err(FormatError::UnsupportedVersion(found.to_string()));
        }
        Ok(())
    }

    /// Read a line that must equal `literal`
    pub fn expect_literal(&mut self, literal: &'static str) -> Result<(), FormatError> {
        let (line, text) = self.next_line(literal)?;
        if text.trim() != literal {
            return Err(FormatError::Unexpected {
                line,
                expected: literal,
                found: text.to_string(),
            });
        }
        Ok(())
    }

    /// Read a `key value` line
    pub fn read_field<T: FromStr>(&mut self, key: &'static str) -> Result<T, FormatError> {
        let (line, text) = self.next_line(key)?;
        let mut tokens = text.split_whitespace();
        if tokens.next() != Some(key) {
            return Err(FormatError::Unexpected {
                line,
                expected: key,
                found: text.to_string(),
            });
        }
        let [value] = collect_array::<T, 1>(line, key, tokens)?;
        Ok(value)
    }

    /// Read a line of exactly `N` whitespace separated values
    pub fn read_values<T: FromStr, const N: usize>(
        &mut self,
        field: &'static str,
    ) -> Result<[T; N], FormatError> {
        let (line, text) = self.next_line(field)?;
        collect_array(line, field, text.split_whitespace())
    }

    /// Read a whole line as a name (trailing `\r` is already stripped by `lines`)
    pub fn read_name(&mut self, field: &'static str) -> Result<String, FormatError> {
        let (_, text) = self.next_line(field)?;
        Ok(text.to_string())
    }

    /// Ensure nothing but blank lines remain
    pub fn finish(mut self) -> Result<(), FormatError> {
        match self.next_line("end of file") {
            Ok((line, _)) => Err(FormatError::TrailingData(line)),
            Err(_) => Ok(()),
        }
    }
}

fn collect_array<'t, T: FromStr, const N: usize>(
    line: usize,
    field: &'static str,
    tokens: impl Iterator<Item = &'t str>,
) -> Result<[T; N], FormatError> {
    let values = tokens
        .map(|token| {
            token.parse::<T>().map_err(|_| FormatError::InvalidNumber {
                line,
                field,
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<T>, _>>()?;
    let found = values.len();
    values.try_into().map_err(|_| FormatError::WrongArity {
        line,
        field,
        expected: N,
        found,
    })
}
