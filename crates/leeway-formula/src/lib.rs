//! # leeway-formula
//!
//! Parser and interpreter for the leeway formula language: small programs
//! with declared inputs, declared outputs, and C-like function bodies
//! over double-precision numbers.
//!
//! This crate provides:
//! - Formula parsing (text → [`Program`])
//! - Formula execution ([`Program`] + input values → output values)
//! - A scoped variable table with function-call frames
//! - Builtin math functions
//!
//! ## Example
//!
//! ```rust
//! use leeway_formula::Interpreter;
//!
//! let mut interp = Interpreter::load(
//!     r#"
//!     input x "X";
//!     output y "Y" "%.1f";
//!     main() { y = x * 2; }
//!     "#,
//! )?;
//!
//! interp.declare_variable("y");
//! interp.set_variable("x", 3.0);
//! interp.run()?;
//! assert_eq!(interp.get_variable("y"), Some(6.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod error;
pub mod functions;
pub mod interpreter;
pub mod parser;
pub mod scope;

pub use ast::{
    BinaryOperator, Expr, Fixity, Function, InputDecl, LocalDecl, OutputDecl, Program,
    StepOperator, Stmt, UnaryOperator,
};
pub use error::{EvalError, EvalResult, ParseError, ParseResult};
pub use functions::BuiltinRegistry;
pub use interpreter::Interpreter;
pub use parser::parse_program;
pub use scope::ScopeStack;
