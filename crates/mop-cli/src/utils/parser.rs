use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid index '{value}' in list '{list}'. Expected non-negative integers separated by commas.")]
    InvalidIndex { list: String, value: String },

    #[error("Invalid number '{value}' in '{list}'.")]
    InvalidNumber { list: String, value: String },

    #[error("Expected {expected} comma-separated values in '{list}', found {found}.")]
    WrongCount {
        list: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid assignment '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Parses `"0, 5,17"` into `[0, 5, 17]`.
pub fn parse_index_list(list: &str) -> Result<Vec<usize>, ParseError> {
    split_list(list)
        .map(|value| {
            value.parse().map_err(|_| ParseError::InvalidIndex {
                list: list.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Parses an `"oxygen,carbon"` index pair.
pub fn parse_index_pair(list: &str) -> Result<(usize, usize), ParseError> {
    match parse_index_list(list)?.as_slice() {
        &[first, second] => Ok((first, second)),
        other => Err(ParseError::WrongCount {
            list: list.to_string(),
            expected: 2,
            found: other.len(),
        }),
    }
}

/// Parses `"x,y,z"` into three floats.
pub fn parse_vector3(list: &str) -> Result<[f64; 3], ParseError> {
    let values = split_list(list)
        .map(|value| {
            value.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                list: list.to_string(),
                value: value.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        &[x, y, z] => Ok([x, y, z]),
        other => Err(ParseError::WrongCount {
            list: list.to_string(),
            expected: 3,
            found: other.len(),
        }),
    }
}

/// Splits a `KEY=VALUE` assignment, trimming both sides.
pub fn parse_assignment(assignment: &str) -> Result<(&str, &str), ParseError> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidAssignment(assignment.to_string())),
    }
}
