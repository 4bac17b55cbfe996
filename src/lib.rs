pub mod api;
pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod utils;
pub mod value;

pub use api::{analyze, parse, AnalysisResult};
pub use error::{CfglError, ErrorKind};
pub use value::{Mapping, Value};
