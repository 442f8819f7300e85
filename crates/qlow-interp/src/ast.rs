//! Abstract syntax tree consumed by the interpreter.
//!
//! Produced by an external OpenQASM 3 parser; every field is already
//! syntactically validated. Index expressions stay unevaluated here and are
//! reduced to [`crate::identifier::Identifier`]s during the walk.

use serde::{Deserialize, Serialize};

/// A complete program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    /// Version from the `OPENQASM` header, if present.
    pub version: Option<String>,
    /// Top-level statements.
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            version: Some("3.0".into()),
            statements,
        }
    }
}

/// A statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// `include "file";`
    Include(String),

    /// `qubit[n] name;` or `qubit name;`
    QubitDecl {
        name: String,
        size: Option<Expression>,
    },

    /// `type name;` or `type name = init;`
    ClassicalDecl {
        ty: TypeExpr,
        name: String,
        init: Option<Expression>,
    },

    /// `const type name = value;`
    ConstDecl {
        ty: TypeExpr,
        name: String,
        value: Expression,
    },

    /// `input type name;`
    InputDecl { ty: TypeExpr, name: String },

    /// `let name = target;`
    Alias { name: String, target: Operand },

    /// `target op= value;`
    Assignment {
        target: Operand,
        op: AssignOp,
        value: Expression,
    },

    /// `gate name(params) qubits { body }`
    GateDef(GateDefinition),

    /// `def name(args) -> type { body }`
    SubroutineDef(SubroutineDefinition),

    /// Gate application.
    Gate(GateCall),

    /// `modifiers gphase(phase) qubits;`
    GPhase {
        modifiers: Vec<GateModifier>,
        phase: Expression,
        qubits: Vec<Operand>,
    },

    /// `measure q -> c;` or bare `measure q;`
    Measure {
        qubits: Operand,
        target: Option<Operand>,
    },

    /// `reset q;`
    Reset { qubits: Vec<Operand> },

    /// `barrier q;`
    Barrier { qubits: Vec<Operand> },

    /// `{ ... }`
    Block(Vec<Statement>),

    /// If statement.
    If {
        condition: Expression,
        then_body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
    },

    /// `for type variable in iterable { body }`
    For {
        ty: TypeExpr,
        variable: String,
        iterable: ForIterable,
        body: Vec<Statement>,
    },

    /// While loop.
    While {
        condition: Expression,
        body: Vec<Statement>,
    },

    Break,
    Continue,

    /// `return;` or `return value;`
    Return(Option<Expression>),

    /// Expression evaluated for its effect, such as a subroutine call.
    Expression(Expression),

    /// `#pragma body` with the leading keyword stripped.
    Pragma(String),
}

/// A gate definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDefinition {
    pub name: String,
    /// Formal angle parameters.
    pub params: Vec<String>,
    /// Formal qubit arguments.
    pub qubits: Vec<String>,
    pub body: Vec<Statement>,
}

/// A subroutine argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubroutineArg {
    /// Classical argument, passed by value.
    Classical { ty: TypeExpr, name: String },
    /// Qubit argument, passed by alias.
    Qubit {
        name: String,
        size: Option<Expression>,
    },
}

impl SubroutineArg {
    pub fn name(&self) -> &str {
        match self {
            SubroutineArg::Classical { name, .. } | SubroutineArg::Qubit { name, .. } => name,
        }
    }
}

/// A subroutine definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubroutineDefinition {
    pub name: String,
    pub args: Vec<SubroutineArg>,
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Statement>,
}

/// A gate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCall {
    /// Gate name.
    pub name: String,
    /// Gate parameters (angles, etc.).
    pub params: Vec<Expression>,
    /// Qubit operands.
    pub qubits: Vec<Operand>,
    /// Modifiers in written order.
    pub modifiers: Vec<GateModifier>,
}

impl GateCall {
    pub fn new(name: impl Into<String>, qubits: Vec<Operand>) -> Self {
        Self {
            name: name.into(),
            params: vec![],
            qubits,
            modifiers: vec![],
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<Expression>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Vec<GateModifier>) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Gate modifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GateModifier {
    /// `inv @`
    Inv,
    /// `pow(k) @`
    Pow(Expression),
    /// `ctrl(n) @`
    Ctrl(Option<Expression>),
    /// `negctrl(n) @`
    NegCtrl(Option<Expression>),
}

/// A name with optional index expressions, such as `q`, `q[1]`, `q[0:2][1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operand {
    pub name: String,
    pub indices: Vec<IndexElement>,
}

impl Operand {
    /// A bare name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indices: vec![],
        }
    }

    /// A name with a single integer index.
    pub fn indexed(name: impl Into<String>, index: i64) -> Self {
        Self {
            name: name.into(),
            indices: vec![IndexElement::Single(Expression::Int(index))],
        }
    }

    /// Append an index level.
    #[must_use]
    pub fn with_index(mut self, index: IndexElement) -> Self {
        self.indices.push(index);
        self
    }
}

/// One index level in source form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexElement {
    /// `[expr]`
    Single(Expression),
    /// `[start:step:end]`
    Range(RangeExpr),
    /// `[{a, b, c}]`
    Set(Vec<Expression>),
}

/// A range as written in source. The end bound is inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeExpr {
    pub start: Option<Box<Expression>>,
    pub end: Option<Box<Expression>>,
    pub step: Option<Box<Expression>>,
}

impl RangeExpr {
    pub fn new(start: Expression, end: Expression) -> Self {
        Self {
            start: Some(Box::new(start)),
            end: Some(Box::new(end)),
            step: None,
        }
    }

    #[must_use]
    pub fn with_step(mut self, step: Expression) -> Self {
        self.step = Some(Box::new(step));
        self
    }
}

/// What a `for` loop iterates over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ForIterable {
    Range(RangeExpr),
    Set(Vec<Expression>),
    /// An array or bit-string valued expression.
    Expression(Expression),
}

/// A type as written in a declaration; widths and dimensions are
/// const expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeExpr {
    Bool,
    Int(Option<Expression>),
    Uint(Option<Expression>),
    Float(Option<Expression>),
    Angle(Option<Expression>),
    Bit(Option<Expression>),
    Array {
        element: Box<TypeExpr>,
        dims: Vec<Expression>,
    },
}

/// Compound assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// Binary operator applied before storing, if any.
    pub fn binary(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
        }
    }
}

/// An expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// Bit-string literal without quotes, such as `0101`.
    BitString(String),
    /// Identifier.
    Identifier(String),
    /// Pi constant.
    Pi,
    /// Tau constant (2π).
    Tau,
    /// Euler's number.
    Euler,
    /// Unary operation.
    Unary { op: UnaryOp, expr: Box<Expression> },
    /// Binary operation.
    BinOp {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
    /// Function or subroutine call.
    FnCall { name: String, args: Vec<Expression> },
    /// Index expression: `arr[i]`, `arr[1:3]`, `arr[{0, 2}]`.
    Index {
        target: Box<Expression>,
        index: Vec<IndexElement>,
    },
    /// Cast: `float(x)`, `int[8](y)`.
    Cast {
        ty: Box<TypeExpr>,
        expr: Box<Expression>,
    },
    /// Array literal: `{1, 2, 3}`.
    Array(Vec<Expression>),
    /// `measure q` used as a value.
    Measure(Operand),
}

impl Expression {
    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier(name.into())
    }

    pub fn binary(left: Expression, op: BinOp, right: Expression) -> Self {
        Expression::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FnCall {
            name: name.into(),
            args,
        }
    }

    /// Try to evaluate as a constant f64 without any context.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Expression::Int(v) => Some(*v as f64),
            Expression::Float(v) => Some(*v),
            Expression::Pi => Some(std::f64::consts::PI),
            Expression::Tau => Some(std::f64::consts::TAU),
            Expression::Euler => Some(std::f64::consts::E),
            Expression::Unary {
                op: UnaryOp::Neg,
                expr,
            } => expr.as_f64().map(|v| -v),
            Expression::BinOp { left, op, right } => {
                let l = left.as_f64()?;
                let r = right.as_f64()?;
                Some(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                    _ => return None,
                })
            }
            _ => None,
        }
    }

    /// Names of identifiers read by this expression.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expression::Identifier(name) => names.push(name),
            Expression::Unary { expr, .. } | Expression::Cast { expr, .. } => {
                expr.collect_identifiers(names);
            }
            Expression::BinOp { left, right, .. } => {
                left.collect_identifiers(names);
                right.collect_identifiers(names);
            }
            Expression::FnCall { args, .. } | Expression::Array(args) => {
                for arg in args {
                    arg.collect_identifiers(names);
                }
            }
            Expression::Index { target, .. } => target.collect_identifiers(names),
            _ => {}
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_expression_eval() {
        let expr = Expression::binary(Expression::Pi, BinOp::Div, Expression::Int(2));
        let result = expr.as_f64().unwrap();
        assert!((result - PI / 2.0).abs() < 1e-10);
        assert!(Expression::ident("x").as_f64().is_none());
    }

    #[test]
    fn test_identifiers_collected() {
        let expr = Expression::binary(
            Expression::call("sin", vec![Expression::ident("theta")]),
            BinOp::Mul,
            Expression::ident("scale"),
        );
        assert_eq!(expr.identifiers(), vec!["theta", "scale"]);
    }

    #[test]
    fn test_assign_op_binary() {
        assert_eq!(AssignOp::Assign.binary(), None);
        assert_eq!(AssignOp::Div.binary(), Some(BinOp::Div));
    }

    #[test]
    fn test_operand_builders() {
        let op = Operand::name("q").with_index(IndexElement::Range(RangeExpr::new(
            Expression::Int(0),
            Expression::Int(1),
        )));
        assert_eq!(op.indices.len(), 1);
        assert_eq!(Operand::indexed("q", 2).indices.len(), 1);
    }
}
