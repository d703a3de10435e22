use std::collections::HashMap;

/// Why a message body was not accepted as a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("message has {found} lines, at least {expected} are needed")]
    TooFewLines { found: usize, expected: usize },
    #[error("message has no \"{0}\" line")]
    MissingKey(&'static str),
    #[error("\"{key}\" should be an integer, got \"{value}\"")]
    NotAnInteger { key: &'static str, value: String },
}

/// The shape a submission message must have.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    /// Messages with fewer lines than this are not even looked at.
    pub min_lines: usize,
    /// Keys that must all be present, lower-case.
    pub required: &'static [&'static str],
    /// Subset of `required` whose values must parse as integers.
    pub numeric: &'static [&'static str],
}

impl FieldSchema {
    /// Parse a message body made of `key: value` lines.
    ///
    /// Lines are split on their first colon, keys are trimmed and lower-cased,
    /// values are trimmed. Lines without a colon are skipped, and a repeated
    /// key overwrites the earlier one.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the body is too short, if any required key is
    /// missing, or if a numeric field doesn't parse. Nothing partial is returned.
    pub fn parse(&self, text: &str) -> Result<ParsedFields, ParseError> {
        let lines: Vec<&str> = text.trim().lines().collect();
        if lines.len() < self.min_lines {
            return Err(ParseError::TooFewLines {
                found: lines.len(),
                expected: self.min_lines,
            });
        }

        let mut values = HashMap::with_capacity(lines.len());
        for line in lines {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            values.insert(key.trim().to_lowercase(), value.trim().to_string());
        }

        let fields = ParsedFields { values };

        for key in self.required {
            if !fields.values.contains_key(*key) {
                return Err(ParseError::MissingKey(*key));
            }
        }

        for key in self.numeric {
            fields.integer(*key)?;
        }

        Ok(fields)
    }
}

/// Values of a message that passed [`FieldSchema::parse`].
#[derive(Debug, Clone, Default)]
pub struct ParsedFields {
    values: HashMap<String, String>,
}

impl ParsedFields {
    /// Text value of a key. Empty if the key wasn't in the message, which can't
    /// happen for keys the schema requires.
    #[must_use]
    pub fn text(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Integer value of a key.
    ///
    /// # Errors
    ///
    /// Errors if the key is absent or its value is not an integer.
    pub fn integer(&self, key: &'static str) -> Result<i64, ParseError> {
        let value = self.values.get(key).ok_or(ParseError::MissingKey(key))?;
        value.parse().map_err(|_| ParseError::NotAnInteger {
            key,
            value: value.clone(),
        })
    }
}
