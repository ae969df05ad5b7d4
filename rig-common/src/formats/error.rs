/// Error returned when reading a `.mesh` or `.anim` file
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unsupported format version {0:?} (expected [1])")]
    UnsupportedVersion(String),

    #[error("line {line}: expected {expected}, found {found:?}")]
    Unexpected {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: invalid number {token:?} in {field}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        token: String,
    },

    #[error("line {line}: expected {expected} values for {field}, found {found}")]
    WrongArity {
        line: usize,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("line {0}: unexpected content after the last record")]
    TrailingData(usize),
}
