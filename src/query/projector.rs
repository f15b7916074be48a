//! Conversion of result rows into JSON records

use serde_json::{Map, Number, Value};

use crate::sqlite::QueryResult;

/// One result row as a JSON object keyed by column name.
pub type Record = Map<String, Value>;

/// Largest integer magnitude an f64 represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Turns text cells into JSON values.
#[derive(Debug, Clone, Copy)]
pub struct ResultProjector {
    parse_numbers: bool,
}

impl Default for ResultProjector {
    fn default() -> Self {
        Self {
            parse_numbers: true,
        }
    }
}

impl ResultProjector {
    pub fn new(parse_numbers: bool) -> Self {
        Self { parse_numbers }
    }

    /// Project every row of `result`, in order.
    pub fn project(&self, result: &QueryResult) -> Vec<Record> {
        result
            .rows
            .iter()
            .map(|row| {
                result
                    .columns
                    .iter()
                    .zip(&row.values)
                    .map(|(column, raw)| (column.clone(), self.project_value(raw)))
                    .collect()
            })
            .collect()
    }

    /// Number if the comma-stripped cell parses as one, else the cell as-is.
    ///
    /// Commas are removed only for the parse attempt: `"1,234"` becomes
    /// `1234`, while `"Smith, Jr."` comes back unchanged.
    pub fn project_value(&self, raw: &str) -> Value {
        if self.parse_numbers {
            if let Some(number) = parse_number(raw) {
                return Value::Number(number);
            }
        }
        Value::String(raw.to_string())
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    let stripped = raw.replace(',', "");
    let parsed: f64 = stripped.parse().ok()?;
    if parsed.fract() == 0.0 && parsed.abs() <= MAX_EXACT_INTEGER {
        return Some(Number::from(parsed as i64));
    }
    // None for NaN and infinities, which JSON cannot carry.
    Number::from_f64(parsed)
}
