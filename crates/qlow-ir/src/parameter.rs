//! Gate parameters: plain numbers or symbolic expressions awaiting evaluation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

use crate::error::{IrError, IrResult};

/// Unary functions allowed inside a symbolic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterFunction {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
}

impl ParameterFunction {
    /// Look up a function by its source name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(ParameterFunction::Sin),
            "cos" => Some(ParameterFunction::Cos),
            "tan" => Some(ParameterFunction::Tan),
            "exp" => Some(ParameterFunction::Exp),
            "log" => Some(ParameterFunction::Log),
            "sqrt" => Some(ParameterFunction::Sqrt),
            _ => None,
        }
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            ParameterFunction::Sin => x.sin(),
            ParameterFunction::Cos => x.cos(),
            ParameterFunction::Tan => x.tan(),
            ParameterFunction::Exp => x.exp(),
            ParameterFunction::Log => x.ln(),
            ParameterFunction::Sqrt => x.sqrt(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ParameterFunction::Sin => "sin",
            ParameterFunction::Cos => "cos",
            ParameterFunction::Tan => "tan",
            ParameterFunction::Exp => "exp",
            ParameterFunction::Log => "log",
            ParameterFunction::Sqrt => "sqrt",
        }
    }
}

/// A symbolic parameter expression over free (input) parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// A free parameter, bound at evaluation time.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Exponentiation.
    Pow(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Function application.
    Call(ParameterFunction, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a free parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// Whether the expression mentions any free parameter.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) | ParameterExpression::Call(_, e) => e.is_symbolic(),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b)
            | ParameterExpression::Pow(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Names of all free parameters, sorted.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        self.collect_symbols(&mut set);
        set
    }

    fn collect_symbols(&self, set: &mut BTreeSet<String>) {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Symbol(name) => {
                set.insert(name.clone());
            }
            ParameterExpression::Neg(e) | ParameterExpression::Call(_, e) => e.collect_symbols(set),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b)
            | ParameterExpression::Pow(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    /// Reduce the expression to a number, resolving free parameters through `lookup`.
    ///
    /// Fails with [`IrError::UnboundParameter`] for a symbol `lookup` cannot
    /// resolve, and with [`IrError::Evaluation`] when the result is not finite.
    pub fn evaluate(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> IrResult<f64> {
        let value = self.eval_inner(lookup)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(IrError::Evaluation(format!("{self} evaluates to {value}")))
        }
    }

    fn eval_inner(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> IrResult<f64> {
        Ok(match self {
            ParameterExpression::Constant(v) => *v,
            ParameterExpression::Pi => PI,
            ParameterExpression::Symbol(name) => {
                lookup(name).ok_or_else(|| IrError::UnboundParameter(name.clone()))?
            }
            ParameterExpression::Neg(e) => -e.eval_inner(lookup)?,
            ParameterExpression::Add(a, b) => a.eval_inner(lookup)? + b.eval_inner(lookup)?,
            ParameterExpression::Sub(a, b) => a.eval_inner(lookup)? - b.eval_inner(lookup)?,
            ParameterExpression::Mul(a, b) => a.eval_inner(lookup)? * b.eval_inner(lookup)?,
            ParameterExpression::Div(a, b) => {
                let divisor = b.eval_inner(lookup)?;
                if divisor == 0.0 {
                    return Err(IrError::Evaluation(format!("division by zero in {self}")));
                }
                a.eval_inner(lookup)? / divisor
            }
            ParameterExpression::Pow(a, b) => a.eval_inner(lookup)?.powf(b.eval_inner(lookup)?),
            ParameterExpression::Call(f, e) => f.apply(e.eval_inner(lookup)?),
        })
    }

    /// Substitute a value for one free parameter.
    #[must_use]
    pub fn bind(&self, name: &str, value: f64) -> Self {
        let rebind = |e: &ParameterExpression| Box::new(e.bind(name, value));
        match self {
            ParameterExpression::Symbol(n) if n == name => ParameterExpression::Constant(value),
            ParameterExpression::Constant(_)
            | ParameterExpression::Pi
            | ParameterExpression::Symbol(_) => self.clone(),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(rebind(e)),
            ParameterExpression::Call(f, e) => ParameterExpression::Call(*f, rebind(e)),
            ParameterExpression::Add(a, b) => ParameterExpression::Add(rebind(a), rebind(b)),
            ParameterExpression::Sub(a, b) => ParameterExpression::Sub(rebind(a), rebind(b)),
            ParameterExpression::Mul(a, b) => ParameterExpression::Mul(rebind(a), rebind(b)),
            ParameterExpression::Div(a, b) => ParameterExpression::Div(rebind(a), rebind(b)),
            ParameterExpression::Pow(a, b) => ParameterExpression::Pow(rebind(a), rebind(b)),
        }
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "pi"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
            ParameterExpression::Pow(a, b) => write!(f, "({a} ** {b})"),
            ParameterExpression::Call(func, e) => write!(f, "{}({e})", func.name()),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl std::ops::$trait for ParameterExpression {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                ParameterExpression::$variant(Box::new(self), Box::new(rhs))
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);
impl_binary_op!(Div, div, Div);

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}

/// A gate parameter as handed to the lowering step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateParameter {
    /// Already a plain number; passed through unchanged.
    Number(f64),
    /// Symbolic expression; evaluated exactly once when lowered.
    Expression(ParameterExpression),
}

impl From<f64> for GateParameter {
    fn from(value: f64) -> Self {
        GateParameter::Number(value)
    }
}

impl From<ParameterExpression> for GateParameter {
    fn from(expr: ParameterExpression) -> Self {
        GateParameter::Expression(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_inputs(_: &str) -> Option<f64> {
        None
    }

    #[test]
    fn test_constant_evaluates() {
        let p = ParameterExpression::Constant(1.5);
        assert!(!p.is_symbolic());
        assert_eq!(p.evaluate(&no_inputs).unwrap(), 1.5);
    }

    #[test]
    fn test_symbol_requires_binding() {
        let p = ParameterExpression::symbol("theta");
        assert!(p.is_symbolic());
        assert!(p.symbols().contains("theta"));
        assert!(matches!(
            p.evaluate(&no_inputs),
            Err(IrError::UnboundParameter(name)) if name == "theta"
        ));

        let lookup = |name: &str| (name == "theta").then_some(0.25);
        assert_eq!(p.evaluate(&lookup).unwrap(), 0.25);
    }

    #[test]
    fn test_arithmetic_and_functions() {
        let expr = ParameterExpression::Call(
            ParameterFunction::Cos,
            Box::new(ParameterExpression::Pi * ParameterExpression::symbol("t")),
        );
        let lookup = |_: &str| Some(1.0);
        assert!((expr.evaluate(&lookup).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_division_by_zero() {
        let expr = ParameterExpression::Constant(1.0) / ParameterExpression::Constant(0.0);
        assert!(matches!(expr.evaluate(&no_inputs), Err(IrError::Evaluation(_))));
    }

    #[test]
    fn test_bind() {
        let expr = ParameterExpression::symbol("a") + ParameterExpression::symbol("b");
        let bound = expr.bind("a", 2.0);
        assert_eq!(bound.symbols().len(), 1);
        assert_eq!(bound.bind("b", 3.0).evaluate(&no_inputs).unwrap(), 5.0);
    }
}
