//! Classical expression evaluation and gate parameter lowering.

use std::cmp::Ordering;
use std::f64::consts::{E, PI, TAU};

use qlow_ir::{GateParameter, ParameterExpression, ParameterFunction};

use super::Interpreter;
use crate::ast::{BinOp, Expression, IndexElement, Operand, TypeExpr, UnaryOp};
use crate::error::{InterpError, InterpResult};
use crate::identifier::{Identifier, IndexLevel, SliceRange};
use crate::table::SymbolType;
use crate::types::{ArrayValue, BitString, ClassicalType, Value};

impl Interpreter {
    /// Evaluate a classical expression.
    ///
    /// `measure` inside an expression appends measurements and yields
    /// zeros, since outcomes are unknown while lowering.
    pub(crate) fn evaluate(&mut self, expr: &Expression) -> InterpResult<Value> {
        match expr {
            Expression::Int(v) => Ok(Value::Int(*v)),
            Expression::Float(v) => Ok(Value::Float(*v)),
            Expression::Bool(b) => Ok(Value::Bool(*b)),
            Expression::BitString(literal) => BitString::parse(literal)
                .map(Value::BitString)
                .ok_or_else(|| InterpError::Evaluation(format!("invalid bit string \"{literal}\""))),
            Expression::Pi => Ok(Value::Float(PI)),
            Expression::Tau => Ok(Value::Float(TAU)),
            Expression::Euler => Ok(Value::Float(E)),
            Expression::Identifier(name) => self.read(&Identifier::plain(name.clone())),
            Expression::Unary { op, expr } => {
                let value = self.evaluate(expr)?;
                unary(*op, value)
            }
            Expression::BinOp { left, op, right } => {
                let lhs = self.evaluate(left)?;
                match op {
                    BinOp::And if !truthy(&lhs)? => return Ok(Value::Bool(false)),
                    BinOp::Or if truthy(&lhs)? => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let rhs = self.evaluate(right)?;
                self.binary(*op, lhs, rhs)
            }
            Expression::FnCall { name, args } => self.call(name, args),
            Expression::Index { target, index } => {
                let levels = self.index_levels(index)?;
                match target.as_ref() {
                    Expression::Identifier(name) => {
                        self.read(&Identifier::indexed(name.clone(), levels))
                    }
                    other => self.evaluate(other)?.get_indexed("<expression>", &levels),
                }
            }
            Expression::Cast { ty, expr } => {
                let ty = self.resolve_type(ty)?;
                self.evaluate(expr)?.coerce(&ty)
            }
            Expression::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<InterpResult<Vec<_>>>()?;
                Ok(Value::Array(ArrayValue::from_elements(values)?))
            }
            Expression::Measure(operand) => {
                let qubits = self.resolve_operand(operand)?;
                self.context.add_measure(&qubits, &[])?;
                Ok(Value::BitString(BitString::zeros(qubits.len())))
            }
        }
    }

    fn read(&self, identifier: &Identifier) -> InterpResult<Value> {
        if let SymbolType::Qubit = self.context.get_type(identifier.name())? {
            return Err(InterpError::type_mismatch("classical value", "qubit"));
        }
        self.context.get_value_by_identifier(identifier)
    }

    /// User subroutines shadow the built-in functions.
    fn call(&mut self, name: &str, args: &[Expression]) -> InterpResult<Value> {
        if self.context.is_user_defined_subroutine(name) {
            let def = self.context.get_subroutine_definition(name)?;
            return self.call_subroutine(&def, args);
        }
        let values = args
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<InterpResult<Vec<_>>>()?;
        builtin_function(name, &values)
    }

    /// Apply a binary operator to two evaluated operands.
    pub(crate) fn binary(&self, op: BinOp, lhs: Value, rhs: Value) -> InterpResult<Value> {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Pow => {
                arithmetic(op, &lhs, &rhs)
            }
            BinOp::Eq => Ok(Value::Bool(equal(&lhs, &rhs)?)),
            BinOp::NotEq => Ok(Value::Bool(!equal(&lhs, &rhs)?)),
            BinOp::Lt => Ok(Value::Bool(compare(&lhs, &rhs)? == Ordering::Less)),
            BinOp::LtEq => Ok(Value::Bool(compare(&lhs, &rhs)? != Ordering::Greater)),
            BinOp::Gt => Ok(Value::Bool(compare(&lhs, &rhs)? == Ordering::Greater)),
            BinOp::GtEq => Ok(Value::Bool(compare(&lhs, &rhs)? != Ordering::Less)),
            BinOp::And => Ok(Value::Bool(truthy(&lhs)? && truthy(&rhs)?)),
            BinOp::Or => Ok(Value::Bool(truthy(&lhs)? || truthy(&rhs)?)),
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => bitwise(op, &lhs, &rhs),
            BinOp::LShift | BinOp::RShift => shift(op, &lhs, &rhs),
        }
    }

    // ---- conversions ----

    pub(crate) fn eval_i64(&mut self, expr: &Expression) -> InterpResult<i64> {
        let value = self.evaluate(expr)?;
        value
            .as_i64()
            .ok_or_else(|| InterpError::type_mismatch("int", value.type_name()))
    }

    pub(crate) fn eval_u32(&mut self, expr: &Expression, what: &str) -> InterpResult<u32> {
        let value = self.eval_i64(expr)?;
        u32::try_from(value).map_err(|_| {
            InterpError::Evaluation(format!("{what} must be a non-negative integer, got {value}"))
        })
    }

    pub(crate) fn eval_f64(&mut self, expr: &Expression) -> InterpResult<f64> {
        let value = self.evaluate(expr)?;
        value
            .as_f64()
            .ok_or_else(|| InterpError::type_mismatch("numeric value", value.type_name()))
    }

    /// Reduce a declared type, evaluating widths and array dimensions.
    pub(crate) fn resolve_type(&mut self, ty: &TypeExpr) -> InterpResult<ClassicalType> {
        let width = |this: &mut Self, w: &Option<Expression>| {
            w.as_ref()
                .map(|w| this.eval_u32(w, "type width"))
                .transpose()
        };
        Ok(match ty {
            TypeExpr::Bool => ClassicalType::Bool,
            TypeExpr::Int(w) => ClassicalType::Int(width(self, w)?),
            TypeExpr::Uint(w) => ClassicalType::Uint(width(self, w)?),
            TypeExpr::Float(w) => ClassicalType::Float(width(self, w)?),
            TypeExpr::Angle(w) => ClassicalType::Angle(width(self, w)?),
            TypeExpr::Bit(w) => ClassicalType::Bit(width(self, w)?),
            TypeExpr::Array { element, dims } => {
                let element = Box::new(self.resolve_type(element)?);
                let dims = dims
                    .iter()
                    .map(|d| self.eval_u32(d, "array dimension").map(|d| d as usize))
                    .collect::<InterpResult<Vec<_>>>()?;
                ClassicalType::Array { element, dims }
            }
        })
    }

    /// Evaluate source index elements to literal levels.
    ///
    /// Source ranges include their end bound.
    pub(crate) fn index_levels(&mut self, index: &[IndexElement]) -> InterpResult<Vec<IndexLevel>> {
        index
            .iter()
            .map(|element| {
                Ok(match element {
                    IndexElement::Single(e) => IndexLevel::Single(self.eval_i64(e)?),
                    IndexElement::Range(range) => {
                        let mut bound = |b: &Option<Box<Expression>>| {
                            b.as_deref().map(|e| self.eval_i64(e)).transpose()
                        };
                        let start = bound(&range.start)?;
                        let end = bound(&range.end)?;
                        let step = bound(&range.step)?;
                        IndexLevel::Range(SliceRange::inclusive(start, end, step))
                    }
                    IndexElement::Set(items) => IndexLevel::Set(
                        items
                            .iter()
                            .map(|e| self.eval_i64(e))
                            .collect::<InterpResult<Vec<_>>>()?,
                    ),
                })
            })
            .collect()
    }

    pub(crate) fn operand(&mut self, operand: &Operand) -> InterpResult<Identifier> {
        let levels = self.index_levels(&operand.indices)?;
        Ok(Identifier::indexed(operand.name.clone(), levels))
    }

    // ---- gate parameters ----

    /// A built-in gate argument. Expressions over program inputs stay
    /// symbolic until the instruction is appended; the rest are numbers.
    pub(crate) fn gate_parameter(&mut self, expr: &Expression) -> InterpResult<GateParameter> {
        if expr.identifiers().iter().any(|name| self.context.is_input(name)) {
            return Ok(GateParameter::Expression(self.parameter_expression(expr)?));
        }
        Ok(GateParameter::Number(self.eval_f64(expr)?))
    }

    /// Mirror `expr` as a symbolic parameter, with program inputs as free
    /// symbols and every other subexpression folded to a constant.
    fn parameter_expression(&mut self, expr: &Expression) -> InterpResult<ParameterExpression> {
        match expr {
            Expression::Pi => Ok(ParameterExpression::Pi),
            Expression::Identifier(name) if self.context.is_input(name) => {
                Ok(ParameterExpression::symbol(name.clone()))
            }
            Expression::Unary {
                op: UnaryOp::Neg,
                expr,
            } => Ok(-self.parameter_expression(expr)?),
            Expression::BinOp { left, op, right }
                if matches!(op, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Pow) =>
            {
                let l = self.parameter_expression(left)?;
                let r = self.parameter_expression(right)?;
                Ok(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    _ => ParameterExpression::Pow(Box::new(l), Box::new(r)),
                })
            }
            Expression::FnCall { name, args }
                if !self.context.is_user_defined_subroutine(name) && args.len() == 1 =>
            {
                match ParameterFunction::from_name(name) {
                    Some(function) => Ok(ParameterExpression::Call(
                        function,
                        Box::new(self.parameter_expression(&args[0])?),
                    )),
                    None => self.constant_parameter(expr),
                }
            }
            _ => self.constant_parameter(expr),
        }
    }

    fn constant_parameter(&mut self, expr: &Expression) -> InterpResult<ParameterExpression> {
        if expr.identifiers().iter().any(|name| self.context.is_input(name)) {
            return Err(InterpError::Evaluation(
                "Unsupported operator in parameter".into(),
            ));
        }
        Ok(ParameterExpression::Constant(self.eval_f64(expr)?))
    }
}

// ---- operators ----

fn truthy(value: &Value) -> InterpResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| InterpError::type_mismatch("bool", value.type_name()))
}

fn integral(value: &Value) -> Option<i64> {
    match value {
        Value::Int(_) | Value::Uint(_) | Value::Bool(_) | Value::BitString(_) => value.as_i64(),
        _ => None,
    }
}

fn numeric(value: &Value) -> InterpResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| InterpError::type_mismatch("numeric value", value.type_name()))
}

fn overflow(op: BinOp) -> InterpError {
    InterpError::Evaluation(format!("integer overflow in {op:?}"))
}

fn unary(op: UnaryOp, value: Value) -> InterpResult<Value> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| InterpError::Evaluation("integer overflow in negation".into())),
        (UnaryOp::Neg, Value::Uint(u)) => i64::try_from(u)
            .map(|i| Value::Int(-i))
            .map_err(|_| InterpError::Evaluation("integer overflow in negation".into())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, Value::Angle(x)) => Value::Float(-x).coerce(&ClassicalType::Angle(None)),
        (UnaryOp::Not, value) => Ok(Value::Bool(!truthy(&value)?)),
        (UnaryOp::BitNot, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::BitNot, Value::Int(i)) => Ok(Value::Int(!i)),
        (UnaryOp::BitNot, Value::Uint(u)) => Ok(Value::Uint(!u)),
        (UnaryOp::BitNot, Value::BitString(bits)) => {
            Ok(Value::BitString(bits.bits().iter().map(|b| !b).collect()))
        }
        (op, value) => Err(InterpError::type_mismatch(
            format!("operand of {op:?}"),
            value.type_name(),
        )),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn arithmetic(op: BinOp, lhs: &Value, rhs: &Value) -> InterpResult<Value> {
    if let (Some(a), Some(b)) = (integral(lhs), integral(rhs)) {
        if matches!(op, BinOp::Div | BinOp::Mod) && b == 0 {
            return Err(InterpError::Evaluation("division by zero".into()));
        }
        let result = match op {
            BinOp::Add => a.checked_add(b),
            BinOp::Sub => a.checked_sub(b),
            BinOp::Mul => a.checked_mul(b),
            BinOp::Div => a.checked_div(b),
            BinOp::Mod => a.checked_rem(b),
            BinOp::Pow if b >= 0 => u32::try_from(b).ok().and_then(|b| a.checked_pow(b)),
            #[allow(clippy::cast_precision_loss)]
            BinOp::Pow => return Ok(Value::Float((a as f64).powf(b as f64))),
            _ => None,
        }
        .ok_or_else(|| overflow(op))?;
        return Ok(match (lhs, rhs) {
            (Value::Uint(_), Value::Uint(_)) if result >= 0 => Value::Uint(result as u64),
            _ => Value::Int(result),
        });
    }

    let (a, b) = (numeric(lhs)?, numeric(rhs)?);
    if matches!(op, BinOp::Div | BinOp::Mod) && b == 0.0 {
        return Err(InterpError::Evaluation("division by zero".into()));
    }
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        _ => a.powf(b),
    };
    match (lhs, rhs) {
        (Value::Angle(_), _) | (_, Value::Angle(_)) if matches!(op, BinOp::Add | BinOp::Sub) => {
            Value::Float(result).coerce(&ClassicalType::Angle(None))
        }
        _ => Ok(Value::Float(result)),
    }
}

fn equal(lhs: &Value, rhs: &Value) -> InterpResult<bool> {
    match (lhs, rhs) {
        (Value::BitString(a), Value::BitString(b)) => Ok(a == b),
        (Value::Array(a), Value::Array(b)) => Ok(a == b),
        _ => compare(lhs, rhs).map(|o| o == Ordering::Equal),
    }
}

fn compare(lhs: &Value, rhs: &Value) -> InterpResult<Ordering> {
    if let (Some(a), Some(b)) = (integral(lhs), integral(rhs)) {
        return Ok(a.cmp(&b));
    }
    let (a, b) = (numeric(lhs)?, numeric(rhs)?);
    a.partial_cmp(&b)
        .ok_or_else(|| InterpError::Evaluation(format!("cannot compare {a} and {b}")))
}

fn bitwise(op: BinOp, lhs: &Value, rhs: &Value) -> InterpResult<Value> {
    let apply = |a: bool, b: bool| match op {
        BinOp::BitAnd => a & b,
        BinOp::BitOr => a | b,
        _ => a ^ b,
    };
    match (lhs, rhs) {
        (Value::BitString(a), Value::BitString(b)) => {
            if a.len() != b.len() {
                return Err(InterpError::type_mismatch(
                    format!("bit[{}]", a.len()),
                    format!("bit[{}]", b.len()),
                ));
            }
            Ok(Value::BitString(
                a.bits().iter().zip(b.bits()).map(|(x, y)| apply(*x, *y)).collect(),
            ))
        }
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(apply(*a, *b))),
        (Value::Uint(a), Value::Uint(b)) => Ok(Value::Uint(match op {
            BinOp::BitAnd => a & b,
            BinOp::BitOr => a | b,
            _ => a ^ b,
        })),
        _ => {
            let (Some(a), Some(b)) = (integral(lhs), integral(rhs)) else {
                return Err(InterpError::type_mismatch(
                    "integer or bit operands",
                    format!("{} and {}", lhs.type_name(), rhs.type_name()),
                ));
            };
            Ok(Value::Int(match op {
                BinOp::BitAnd => a & b,
                BinOp::BitOr => a | b,
                _ => a ^ b,
            }))
        }
    }
}

fn shift(op: BinOp, lhs: &Value, rhs: &Value) -> InterpResult<Value> {
    let amount = integral(rhs)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| InterpError::type_mismatch("non-negative shift amount", rhs.type_name()))?;
    let left = op == BinOp::LShift;
    match lhs {
        Value::BitString(bits) => {
            let len = bits.len();
            let n = (amount as usize).min(len);
            let mut shifted = vec![false; len];
            if left {
                shifted[..len - n].copy_from_slice(&bits.bits()[n..]);
            } else {
                shifted[n..].copy_from_slice(&bits.bits()[..len - n]);
            }
            Ok(Value::BitString(BitString::from(shifted)))
        }
        Value::Int(i) => {
            let shifted = if left { i.checked_shl(amount) } else { i.checked_shr(amount) };
            shifted.map(Value::Int).ok_or_else(|| overflow(op))
        }
        Value::Uint(u) => {
            let shifted = if left { u.checked_shl(amount) } else { u.checked_shr(amount) };
            shifted.map(Value::Uint).ok_or_else(|| overflow(op))
        }
        other => Err(InterpError::type_mismatch("int, uint or bit register", other.type_name())),
    }
}

// ---- built-in functions ----

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn builtin_function(name: &str, args: &[Value]) -> InterpResult<Value> {
    let arity = |expected: usize| {
        if args.len() == expected {
            Ok(())
        } else {
            Err(InterpError::WrongParameterCount {
                gate: name.to_string(),
                expected,
                got: args.len(),
            })
        }
    };
    let float = |f: fn(f64) -> f64| -> InterpResult<Value> {
        arity(1)?;
        Ok(Value::Float(f(numeric(&args[0])?)))
    };
    match name {
        "sin" => float(f64::sin),
        "cos" => float(f64::cos),
        "tan" => float(f64::tan),
        "arcsin" => float(f64::asin),
        "arccos" => float(f64::acos),
        "arctan" => float(f64::atan),
        "exp" => float(f64::exp),
        "log" => float(f64::ln),
        "sqrt" => float(f64::sqrt),
        "ceil" | "floor" => {
            arity(1)?;
            let x = numeric(&args[0])?;
            let rounded = if name == "ceil" { x.ceil() } else { x.floor() };
            if !rounded.is_finite() {
                return Err(InterpError::Evaluation(format!("{name}({x}) is not finite")));
            }
            Ok(Value::Int(rounded as i64))
        }
        "mod" => {
            arity(2)?;
            if let (Some(a), Some(b)) = (integral(&args[0]), integral(&args[1])) {
                if b == 0 {
                    return Err(InterpError::Evaluation("division by zero".into()));
                }
                return Ok(Value::Int(a.rem_euclid(b)));
            }
            let (a, b) = (numeric(&args[0])?, numeric(&args[1])?);
            if b == 0.0 {
                return Err(InterpError::Evaluation("division by zero".into()));
            }
            Ok(Value::Float(a.rem_euclid(b)))
        }
        "popcount" => {
            arity(1)?;
            match &args[0] {
                Value::BitString(bits) => Ok(Value::Int(bits.count_ones() as i64)),
                Value::Int(i) => Ok(Value::Int(i64::from(i.count_ones()))),
                Value::Uint(u) => Ok(Value::Int(i64::from(u.count_ones()))),
                other => Err(InterpError::type_mismatch("int or bit register", other.type_name())),
            }
        }
        _ => Err(InterpError::UnknownSubroutine(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &Expression) -> InterpResult<Value> {
        Interpreter::default().evaluate(expr)
    }

    fn bits(literal: &str) -> Value {
        Value::BitString(BitString::parse(literal).unwrap())
    }

    #[test]
    fn test_integer_arithmetic() {
        let expr = Expression::binary(
            Expression::binary(Expression::Int(7), BinOp::Div, Expression::Int(2)),
            BinOp::Mul,
            Expression::Int(3),
        );
        assert_eq!(eval(&expr).unwrap(), Value::Int(9));
        let pow = Expression::binary(Expression::Int(2), BinOp::Pow, Expression::Int(10));
        assert_eq!(eval(&pow).unwrap(), Value::Int(1024));
    }

    #[test]
    fn test_overflow_and_division_by_zero() {
        let overflow = Expression::binary(Expression::Int(i64::MAX), BinOp::Add, Expression::Int(1));
        assert!(matches!(eval(&overflow), Err(InterpError::Evaluation(_))));
        let div = Expression::binary(Expression::Int(1), BinOp::Div, Expression::Int(0));
        assert!(matches!(eval(&div), Err(InterpError::Evaluation(_))));
    }

    #[test]
    fn test_mixed_arithmetic_is_float() {
        let expr = Expression::binary(Expression::Pi, BinOp::Div, Expression::Int(2));
        let Value::Float(x) = eval(&expr).unwrap() else { panic!("expected float") };
        assert!((x - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_comparisons_and_logic() {
        let lt = Expression::binary(Expression::Int(1), BinOp::Lt, Expression::Float(1.5));
        assert_eq!(eval(&lt).unwrap(), Value::Bool(true));
        let and = Expression::binary(Expression::Bool(false), BinOp::And, Expression::ident("nope"));
        assert_eq!(eval(&and).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_bitwise_on_bit_strings() {
        let interp = Interpreter::default();
        assert_eq!(interp.binary(BinOp::BitAnd, bits("1100"), bits("1010")).unwrap(), bits("1000"));
        assert_eq!(interp.binary(BinOp::BitXor, bits("1100"), bits("1010")).unwrap(), bits("0110"));
        assert_eq!(interp.binary(BinOp::LShift, bits("0011"), Value::Int(1)).unwrap(), bits("0110"));
        assert_eq!(interp.binary(BinOp::RShift, bits("1000"), Value::Int(3)).unwrap(), bits("0001"));
        assert!(interp.binary(BinOp::BitOr, bits("1"), bits("10")).is_err());
    }

    #[test]
    fn test_builtin_functions() {
        assert_eq!(builtin_function("popcount", &[bits("1011")]).unwrap(), Value::Int(3));
        assert_eq!(
            builtin_function("mod", &[Value::Int(-1), Value::Int(3)]).unwrap(),
            Value::Int(2)
        );
        assert_eq!(builtin_function("ceil", &[Value::Float(1.2)]).unwrap(), Value::Int(2));
        assert!(matches!(
            builtin_function("sin", &[]),
            Err(InterpError::WrongParameterCount { expected: 1, got: 0, .. })
        ));
        assert!(matches!(
            builtin_function("nope", &[]),
            Err(InterpError::UnknownSubroutine(_))
        ));
    }

    #[test]
    fn test_cast_wraps() {
        let expr = Expression::Cast {
            ty: Box::new(TypeExpr::Uint(Some(Expression::Int(4)))),
            expr: Box::new(Expression::Int(17)),
        };
        assert_eq!(eval(&expr).unwrap(), Value::Uint(1));
    }

    #[test]
    fn test_inclusive_index_levels() {
        let mut interp = Interpreter::default();
        let levels = interp
            .index_levels(&[IndexElement::Range(crate::ast::RangeExpr::new(
                Expression::Int(0),
                Expression::Int(2),
            ))])
            .unwrap();
        assert_eq!(levels, vec![IndexLevel::Range(SliceRange::new(0, 3))]);
    }

    #[test]
    fn test_parameter_without_inputs_is_number() {
        let mut interp = Interpreter::default();
        let param = interp
            .gate_parameter(&Expression::binary(Expression::Pi, BinOp::Mul, Expression::Int(2)))
            .unwrap();
        assert_eq!(param, GateParameter::Number(TAU));
    }
}
