//! Formula interpreter
//!
//! Walks a parsed [`Program`], executing statements and evaluating
//! expressions against a scoped variable table. The caller injects input
//! values and declares output variables before [`Interpreter::run`], then
//! reads outputs back afterwards.

use crate::ast::{
    BinaryOperator, Expr, Fixity, Function, Program, StepOperator, Stmt, UnaryOperator,
    ENTRY_POINT,
};
use crate::error::{EvalError, EvalResult, ParseResult};
use crate::functions::BuiltinRegistry;
use crate::parser::parse_program;
use crate::scope::ScopeStack;

/// Control-flow outcome of executing a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlFlow {
    /// Execution ran off the end of the statement
    Normal,
    /// A `break` is unwinding to the nearest enclosing loop
    Break,
    /// A `return` is unwinding to the enclosing function call
    Return,
}

/// A loaded formula plus its variable table
///
/// One instance owns one [`Program`] and one [`ScopeStack`] at a time and
/// assumes exclusive single-threaded use; concurrent callers each need
/// their own instance.
pub struct Interpreter {
    program: Program,
    scopes: ScopeStack,
    builtins: BuiltinRegistry,
}

impl Interpreter {
    /// Parse `source` and construct an interpreter with a fresh variable
    /// table
    pub fn load(source: &str) -> ParseResult<Self> {
        let program = parse_program(source)?;
        log::debug!(
            "loaded formula: {} inputs, {} outputs, {} functions",
            program.inputs().len(),
            program.outputs().len(),
            program.functions().count()
        );
        Ok(Self {
            program,
            scopes: ScopeStack::new(),
            builtins: BuiltinRegistry::new(),
        })
    }

    /// Check `source` for syntax errors without touching any interpreter
    ///
    /// For any text this accepts, [`Interpreter::load`] succeeds; for any
    /// text it rejects, `load` fails with the same error.
    pub fn validate(source: &str) -> ParseResult<()> {
        parse_program(source).map(|_| ())
    }

    /// Replace the program with a reparse of `source` and clear the
    /// variable table back to its initial state
    ///
    /// On a parse error the old program and table are kept untouched.
    pub fn reload(&mut self, source: &str) -> ParseResult<()> {
        let program = parse_program(source)?;
        log::debug!("reloaded formula, clearing variable table");
        self.program = program;
        self.scopes.reset();
        Ok(())
    }

    /// The loaded program, for introspecting declared inputs and outputs
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Declare `name` in the global scope without a value
    ///
    /// Callers declare every output variable before running so that
    /// assignments inside the formula bind to this shared slot instead of
    /// vivifying a frame-local that vanishes when the call returns.
    pub fn declare_variable(&mut self, name: &str) {
        self.scopes.declare(name);
    }

    /// Assign `name` in the global scope, used to inject input values
    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.scopes.set(name, value);
    }

    /// Read a variable's value, `None` if undeclared or unset
    pub fn get_variable(&self, name: &str) -> Option<f64> {
        self.scopes.get(name).flatten()
    }

    /// Remove `name` from the global scope, making the formula see it as
    /// genuinely absent
    pub fn delete_variable(&mut self, name: &str) {
        self.scopes.delete(name);
    }

    /// Execute the program's `main` function with zero arguments
    ///
    /// Any semantic error aborts the whole run; pending frames are popped
    /// on the way out.
    pub fn run(&mut self) -> EvalResult<()> {
        let mut eval = Evaluator {
            program: &self.program,
            builtins: &self.builtins,
            scopes: &mut self.scopes,
        };
        eval.call(ENTRY_POINT, &[])?;
        Ok(())
    }
}

/// Tree-walking evaluator over one call's worth of borrowed state
struct Evaluator<'a> {
    program: &'a Program,
    builtins: &'a BuiltinRegistry,
    scopes: &'a mut ScopeStack,
}

impl<'a> Evaluator<'a> {
    /// Call a function by name: user-defined functions first, builtins as
    /// fallback
    fn call(&mut self, callee: &str, args: &[Expr]) -> EvalResult<f64> {
        let Some(func) = self.program.function(callee) else {
            return self.call_builtin(callee, args);
        };

        if args.len() != func.params.len() {
            return Err(EvalError::ArgumentCount {
                function: callee.to_string(),
                expected: func.params.len().to_string(),
                actual: args.len(),
            });
        }

        self.scopes.push();
        let result = self.call_in_frame(func, args);
        self.scopes.pop();
        result
    }

    /// Body of [`call`](Self::call) between push and the guaranteed pop
    fn call_in_frame(&mut self, func: &Function, args: &[Expr]) -> EvalResult<f64> {
        // Actuals are evaluated left-to-right, each bound to its formal
        // before the next is evaluated
        for (param, arg) in func.params.iter().zip(args) {
            let value = self.eval(arg)?;
            self.scopes.local(param, value);
        }

        match self.exec(&func.body)? {
            // A break that unwound all the way out of the body never met
            // an enclosing loop
            ControlFlow::Break => return Err(EvalError::BreakOutsideLoop),
            ControlFlow::Normal | ControlFlow::Return => {}
        }

        Ok(self.scopes.return_value().unwrap_or(0.0))
    }

    fn call_builtin(&mut self, callee: &str, args: &[Expr]) -> EvalResult<f64> {
        let def = self
            .builtins
            .get(callee)
            .ok_or_else(|| EvalError::UnknownFunction(callee.to_string()))?;

        if args.len() < def.min_args || def.max_args.is_some_and(|max| args.len() > max) {
            let expected = match def.max_args {
                Some(max) if max == def.min_args => max.to_string(),
                Some(max) => format!("{} to {}", def.min_args, max),
                None => format!("at least {}", def.min_args),
            };
            return Err(EvalError::ArgumentCount {
                function: callee.to_string(),
                expected,
                actual: args.len(),
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }
        Ok((def.implementation)(&values))
    }

    /// Execute a statement, producing its control-flow signal
    fn exec(&mut self, stmt: &Stmt) -> EvalResult<ControlFlow> {
        match stmt {
            Stmt::Declare(decls) => {
                for decl in decls {
                    match &decl.init {
                        Some(init) => {
                            let value = self.eval(init)?;
                            self.scopes.local(&decl.name, value);
                        }
                        None => self.scopes.declare(&decl.name),
                    }
                }
                Ok(ControlFlow::Normal)
            }

            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Assign { target, value } => {
                let value = self.eval(value)?;
                self.scopes.set(target, value);
                Ok(ControlFlow::Normal)
            }

            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)? != 0.0 {
                    self.exec(then)
                } else if let Some(otherwise) = otherwise {
                    self.exec(otherwise)
                } else {
                    Ok(ControlFlow::Normal)
                }
            }

            Stmt::While { cond, body } => {
                while self.eval(cond)? != 0.0 {
                    match self.exec(body)? {
                        ControlFlow::Normal => {}
                        // The loop absorbs the break; it does not
                        // propagate further
                        ControlFlow::Break => break,
                        ControlFlow::Return => return Ok(ControlFlow::Return),
                    }
                }
                Ok(ControlFlow::Normal)
            }

            Stmt::Break => Ok(ControlFlow::Break),

            Stmt::Return(value) => {
                if let Some(value) = value {
                    let value = self.eval(value)?;
                    self.scopes.set_return(value);
                }
                Ok(ControlFlow::Return)
            }

            Stmt::Block(stmts) => {
                for stmt in stmts {
                    let signal = self.exec(stmt)?;
                    if signal != ControlFlow::Normal {
                        return Ok(signal);
                    }
                }
                Ok(ControlFlow::Normal)
            }
        }
    }

    /// Evaluate an expression to a double
    fn eval(&mut self, expr: &Expr) -> EvalResult<f64> {
        match expr {
            Expr::Number(n) => Ok(*n),

            // Reading an undeclared or unset variable always fails rather
            // than yielding a default
            Expr::Ident(name) => self
                .scopes
                .get(name)
                .flatten()
                .ok_or_else(|| EvalError::UnsetVariable(name.clone())),

            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOperator::Negate => -value,
                    UnaryOperator::Not => {
                        if value == 0.0 {
                            1.0
                        } else {
                            0.0
                        }
                    }
                })
            }

            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(apply_binary(*op, left, right))
            }

            // Short-circuiting: the untaken branch is never evaluated
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)? != 0.0 {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }

            Expr::Step { op, fixity, target } => {
                let old = self
                    .scopes
                    .get(target)
                    .flatten()
                    .ok_or_else(|| EvalError::UnsetVariable(target.clone()))?;
                let new = match op {
                    StepOperator::Increment => old + 1.0,
                    StepOperator::Decrement => old - 1.0,
                };
                self.scopes.set(target, new);
                Ok(match fixity {
                    Fixity::Prefix => new,
                    Fixity::Postfix => old,
                })
            }

            Expr::Call { callee, args } => self.call(callee, args),
        }
    }
}

/// Apply a binary operator to two evaluated operands
///
/// Division and modulo have no zero guard: IEEE semantics produce
/// infinity or NaN, which propagate silently through later arithmetic.
fn apply_binary(op: BinaryOperator, left: f64, right: f64) -> f64 {
    match op {
        BinaryOperator::Equal => bool_to_num(left == right),
        BinaryOperator::NotEqual => bool_to_num(left != right),
        BinaryOperator::LessThan => bool_to_num(left < right),
        BinaryOperator::LessEqual => bool_to_num(left <= right),
        BinaryOperator::GreaterThan => bool_to_num(left > right),
        BinaryOperator::GreaterEqual => bool_to_num(left >= right),

        BinaryOperator::Add => left + right,
        BinaryOperator::Subtract => left - right,

        // Both operands truncate toward zero before the integer shift;
        // the shift amount is masked so it cannot panic
        BinaryOperator::ShiftLeft => {
            ((left.trunc() as i64).wrapping_shl(right.trunc() as i64 as u32)) as f64
        }
        BinaryOperator::ShiftRight => {
            ((left.trunc() as i64).wrapping_shr(right.trunc() as i64 as u32)) as f64
        }

        BinaryOperator::Multiply => left * right,
        BinaryOperator::Divide => left / right,
        BinaryOperator::Modulo => left % right,
    }
}

fn bool_to_num(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
