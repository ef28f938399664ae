use std::path::{Path, PathBuf};

use anyhow::bail;
use itertools::Itertools;
use serde::{de::{Error, Visitor}, Deserialize};

/// What a scenario line is expected to produce. Strings are compared against
/// the printed form of the value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TestOutput {
    Bool(bool),
    Number(f64),
    Printed(String),
    List(Vec<TestOutput>),
}

/// Either an expected output or the name of an expected error kind.
#[derive(Debug, Clone)]
pub struct ExpectedResult(Result<TestOutput, String>);

impl ExpectedResult {
    pub fn as_result(&self) -> Result<&TestOutput, &str> {
        self.0.as_ref().map_err(String::as_str)
    }
}

struct ExpectedResultVisitor {}

impl<'de> Deserialize<'de> for ExpectedResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de> {

        deserializer.deserialize_map(ExpectedResultVisitor {})
    }
}

const ERROR_KINDS: &[&str] = &[
    "SyntaxError",
    "UnboundSymbol",
    "ArityMismatch",
    "TypeMismatch",
    "DivisionByZero",
    "ArithmeticOverflow",
    "RecursionLimit",
];

impl<'de> Visitor<'de> for ExpectedResultVisitor {
    type Value = ExpectedResult;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "A structure containing the boolean key 'ok'. If it's okay, contains the key 'output', otherwise the key 'type'")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>, {

        if map.next_key::<String>()?.as_deref() != Some("ok") {
            return Err(A::Error::custom("First key should be 'ok'"))
        }

        let ok: bool = map.next_value()?;
        let second_key = map.next_key::<String>()?
            .ok_or(A::Error::custom("Must have two keys"))?;

        let result = if ok {
            if second_key != "output" {
                return Err(A::Error::custom("Second key of a success should be 'output'"))
            }
            ExpectedResult(Ok(map.next_value::<TestOutput>()?))
        } else {
            if second_key != "type" {
                return Err(A::Error::custom("Second key of a failure should be 'type'"))
            }
            let kind: String = map.next_value()?;
            if !ERROR_KINDS.contains(&kind.as_str()) {
                return Err(A::Error::custom(format!("Unrecognized error kind: {}", kind)))
            }
            ExpectedResult(Err(kind))
        };

        if map.next_key::<String>()?.is_some() {
            return Err(A::Error::custom("Only two keys should be present"));
        }

        Ok(result)
    }
}

fn load_input_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<String>> {
    let source = std::fs::read_to_string(path)?;
    Ok(source.lines().map(str::to_owned).collect_vec())
}

fn load_output_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<ExpectedResult>> {
    let source = std::fs::read(path)?;
    let result: Vec<ExpectedResult> = serde_json::from_slice(&source)?;
    Ok(result)
}

pub fn load_test_pair(testcase: usize) -> anyhow::Result<Vec<(String, ExpectedResult)>> {
    if !all_testcases().any(|case| case == testcase) { bail!("Testcase out of bounds"); }

    let base_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let input = load_input_file(base_path.join("test_inputs").join(format!("{}.yuso", testcase)))?;
    let output = load_output_file(base_path.join("test_outputs").join(format!("{}.json", testcase)))?;

    if input.len() != output.len() { bail!("Input and output of testcase {} do not match", testcase); }
    Ok(input.into_iter().zip(output).collect_vec())
}

pub fn all_testcases() -> impl Iterator<Item = usize> {
    1..=7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_results_deserialize() -> anyhow::Result<()> {
        let parsed: Vec<ExpectedResult> = serde_json::from_str(
            r#"[{"ok": true, "output": 3}, {"ok": true, "output": "3.0"}, {"ok": false, "type": "TypeMismatch"}]"#
        )?;

        assert!(matches!(parsed[0].as_result(), Ok(TestOutput::Number(n)) if *n == 3.0));
        assert!(matches!(parsed[1].as_result(), Ok(TestOutput::Printed(s)) if s == "3.0"));
        assert_eq!(parsed[2].as_result().err(), Some("TypeMismatch"));
        Ok(())
    }

    #[test]
    fn unknown_error_kinds_are_rejected() {
        let parsed: Result<Vec<ExpectedResult>, _> = serde_json::from_str(r#"[{"ok": false, "type": "Oops"}]"#);
        assert!(parsed.is_err());
    }
}
