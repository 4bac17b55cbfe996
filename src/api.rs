use crate::ast::Program;
use crate::environment::Environment;
use crate::error::CfglError;
use crate::evaluator::Evaluator;
use crate::parser::Parser;
use crate::value::Value;
use serde::{Serialize, Serializer};

/// The result of a successful analysis of a source text.
/// Holds the evaluated value tree together with the parsed program and the
/// constants that were in scope when evaluation finished.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub value: Value,
    pub program: Program,
    pub constants: Environment,
}

impl Serialize for AnalysisResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl AnalysisResult {
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.value.clone()
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Serializes the value tree into JSON with two-space indentation.
    /// Key order is preserved and non-ASCII text is written as is.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the value tree into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Lexes, parses and evaluates a source text.
///
/// Every call starts from an empty constant table; nothing carries over
/// between calls.
///
/// # Arguments
///
/// * `source` - The configuration text.
/// * `file_name` - Name shown in diagnostics.
///
/// # Errors
///
/// Returns a `CfglError` for the first lexical, syntax or evaluation error.
pub fn analyze(source: &str, file_name: &str) -> Result<AnalysisResult, CfglError> {
    let mut parser = Parser::new_with_name(source, file_name.to_string())?;
    let program = parser.parse_program()?;

    let mut evaluator = Evaluator::new_with_name(source, file_name.to_string());
    let value = evaluator.evaluate(&program)?;

    Ok(AnalysisResult {
        value,
        program,
        constants: evaluator.environment,
    })
}

/// Turns a source text into its value tree.
///
/// # Errors
///
/// Returns a `CfglError` for the first lexical, syntax or evaluation error.
pub fn parse(text: &str) -> Result<Value, CfglError> {
    analyze(text, "<input>").map(AnalysisResult::into_value)
}
