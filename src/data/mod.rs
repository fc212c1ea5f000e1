use serde::{Deserialize, Serialize};
use std::io::BufRead;

pub mod gen;

/// Reads a JSON document from the reader.
///
/// # Errors
/// - If the reader fails or the document does not match the type.
pub fn deserialize<T: for<'de> Deserialize<'de>>(reader: &mut impl BufRead) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(reader)?)
}

/// Serializes the value as pretty-printed JSON.
///
/// # Errors
/// - If the value cannot be represented as JSON.
pub fn to_string<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{Machine, Order, Problem, Product, ProductTask, SetupTimes};

    #[test]
    fn problem_survives_json() -> anyhow::Result<()> {
        let problem = Problem::new(
            vec![Machine::new("A", ["cut", "drill"])],
            vec![Product::new("P1", vec![ProductTask::new("cut", 2)])],
            SetupTimes::new().with("P1", "P1", 1),
            vec![Order::new("P1", 3, 12)],
        );

        let text = to_string(&problem)?;
        let read: Problem = deserialize(&mut text.as_bytes())?;
        assert_eq!(read, problem);
        Ok(())
    }

    #[test]
    fn malformed_input_is_an_error() {
        let read: anyhow::Result<Problem> = deserialize(&mut r#"{"machines": 3}"#.as_bytes());
        assert!(read.is_err());
    }
}
