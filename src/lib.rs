pub mod ast;
pub mod data_type;
pub mod error;
pub mod eval;
pub mod parser;
pub mod printer;
pub mod row;
pub mod schema;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use ast::{BinaryOp, RelExpr, ScalarExpr, SetOpKind};
pub use data_type::DataType;
pub use error::{Error, Result};
pub use eval::{EvaluationContext, Evaluator};
pub use parser::Parser;
pub use row::Row;
pub use schema::{Attribute, Schema};
pub use table::Table;
pub use tokenizer::{Token, Tokenizer};
pub use value::Value;
