//! Classical types and runtime values.
//!
//! Values are stored in the variable table already coerced to their
//! declared [`ClassicalType`]. Arrays are kept flat in row-major order so
//! that partial updates address a contiguous block.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

use crate::error::{InterpError, InterpResult};
use crate::identifier::{Identifier, IndexLevel, SliceError};

/// A classical type with its optional bit width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassicalType {
    Bool,
    Int(Option<u32>),
    Uint(Option<u32>),
    Float(Option<u32>),
    Angle(Option<u32>),
    /// `bit` when `None`, `bit[n]` otherwise.
    Bit(Option<u32>),
    Array {
        element: Box<ClassicalType>,
        dims: Vec<usize>,
    },
}

impl ClassicalType {
    /// Value a freshly declared variable holds when no initializer is given.
    ///
    /// Scalars stay uninitialized; bit registers and arrays are zero-filled
    /// so that element-wise updates are possible.
    pub fn initial_value(&self) -> Value {
        match self {
            ClassicalType::Bit(Some(n)) => Value::BitString(BitString::zeros(*n as usize)),
            ClassicalType::Array { element, dims } => {
                let len = dims.iter().product();
                Value::Array(ArrayValue {
                    element: (**element).clone(),
                    dims: dims.clone(),
                    values: vec![element.zero_value(); len],
                })
            }
            _ => Value::Uninitialized,
        }
    }

    fn zero_value(&self) -> Value {
        match self {
            ClassicalType::Bool | ClassicalType::Bit(None) => Value::Bool(false),
            ClassicalType::Int(_) => Value::Int(0),
            ClassicalType::Uint(_) => Value::Uint(0),
            ClassicalType::Float(_) => Value::Float(0.0),
            ClassicalType::Angle(_) => Value::Angle(0.0),
            ClassicalType::Bit(Some(_)) | ClassicalType::Array { .. } => self.initial_value(),
        }
    }

    /// Whether this is a numeric scalar that can stand in for a gate angle.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ClassicalType::Int(_)
                | ClassicalType::Uint(_)
                | ClassicalType::Float(_)
                | ClassicalType::Angle(_)
        )
    }
}

impl fmt::Display for ClassicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sized = |f: &mut fmt::Formatter<'_>, name: &str, width: &Option<u32>| match width {
            Some(w) => write!(f, "{name}[{w}]"),
            None => write!(f, "{name}"),
        };
        match self {
            ClassicalType::Bool => write!(f, "bool"),
            ClassicalType::Int(w) => sized(f, "int", w),
            ClassicalType::Uint(w) => sized(f, "uint", w),
            ClassicalType::Float(w) => sized(f, "float", w),
            ClassicalType::Angle(w) => sized(f, "angle", w),
            ClassicalType::Bit(w) => sized(f, "bit", w),
            ClassicalType::Array { element, dims } => {
                write!(f, "array[{element}")?;
                for d in dims {
                    write!(f, ", {d}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// An ordered bit string; position 0 is the leftmost (most significant) bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitString(Vec<bool>);

impl BitString {
    /// All-zero bit string of length `len`.
    pub fn zeros(len: usize) -> Self {
        Self(vec![false; len])
    }

    /// Parse a literal such as `"0110"`; underscores are ignored.
    pub fn parse(literal: &str) -> Option<Self> {
        literal
            .chars()
            .filter(|c| *c != '_')
            .map(|c| match c {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// The low `width` bits of `value`, most significant first.
    pub fn from_u64(value: u64, width: usize) -> Self {
        Self(
            (0..width)
                .map(|i| {
                    let shift = width - 1 - i;
                    shift < 64 && (value >> shift) & 1 == 1
                })
                .collect(),
        )
    }

    /// Unsigned integer value; bits above 64 are dropped.
    pub fn to_u64(&self) -> u64 {
        self.0
            .iter()
            .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }
}

impl From<Vec<bool>> for BitString {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// A dense, row-major array of classical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    element: ClassicalType,
    dims: Vec<usize>,
    values: Vec<Value>,
}

/// Where an index list lands inside an array.
struct Block {
    offset: usize,
    positions: Vec<usize>,
    stride: usize,
    rest: Vec<usize>,
    single: bool,
}

impl ArrayValue {
    /// Build an array from an array literal.
    ///
    /// Elements are either all scalars (one dimension) or all arrays of the
    /// same shape (one more dimension than the sub-arrays).
    pub fn from_elements(elements: Vec<Value>) -> InterpResult<Self> {
        let Some(first) = elements.first() else {
            return Ok(Self {
                element: ClassicalType::Int(None),
                dims: vec![0],
                values: vec![],
            });
        };
        if let Value::Array(head) = first {
            let (element, sub_dims) = (head.element.clone(), head.dims.clone());
            let mut dims = vec![elements.len()];
            dims.extend_from_slice(&sub_dims);
            let mut values = Vec::new();
            for item in elements {
                match item {
                    Value::Array(sub) if sub.dims == sub_dims => values.extend(sub.values),
                    other => {
                        return Err(InterpError::type_mismatch(
                            format!("array of shape {sub_dims:?}"),
                            other.type_name(),
                        ));
                    }
                }
            }
            return Ok(Self {
                element,
                dims,
                values,
            });
        }

        let element = first.natural_type().ok_or_else(|| {
            InterpError::type_mismatch("classical array element", first.type_name())
        })?;
        if let Some(bad) = elements.iter().find(|v| matches!(v, Value::Array(_))) {
            return Err(InterpError::type_mismatch("scalar element", bad.type_name()));
        }
        Ok(Self {
            element,
            dims: vec![elements.len()],
            values: elements,
        })
    }

    pub fn element(&self) -> &ClassicalType {
        &self.element
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Elements in row-major order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Length of the outermost dimension.
    pub fn len(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn stride(&self, depth: usize) -> usize {
        self.dims[depth + 1..].iter().product()
    }

    fn locate(&self, name: &str, levels: &[IndexLevel]) -> InterpResult<Block> {
        if levels.len() > self.dims.len() {
            return Err(InterpError::type_mismatch(
                format!("at most {} index levels on '{name}'", self.dims.len()),
                format!("{} index levels", levels.len()),
            ));
        }
        let Some((last, leading)) = levels.split_last() else {
            return Err(InterpError::Evaluation(format!("empty index on '{name}'")));
        };
        let mut offset = 0;
        for (depth, level) in leading.iter().enumerate() {
            if !level.is_single() {
                return Err(InterpError::Evaluation(format!(
                    "only the last index of '{name}' may select several elements"
                )));
            }
            let positions = level
                .positions(self.dims[depth])
                .map_err(slice_error(name, self.dims[depth]))?;
            offset += positions[0] * self.stride(depth);
        }
        let depth = leading.len();
        let positions = last
            .positions(self.dims[depth])
            .map_err(slice_error(name, self.dims[depth]))?;
        Ok(Block {
            offset,
            positions,
            stride: self.stride(depth),
            rest: self.dims[depth + 1..].to_vec(),
            single: last.is_single(),
        })
    }

    fn get(&self, name: &str, levels: &[IndexLevel]) -> InterpResult<Value> {
        let block = self.locate(name, levels)?;
        if block.single && block.rest.is_empty() {
            return Ok(self.values[block.offset + block.positions[0] * block.stride].clone());
        }
        let mut values = Vec::with_capacity(block.positions.len() * block.stride);
        for p in &block.positions {
            let start = block.offset + p * block.stride;
            values.extend_from_slice(&self.values[start..start + block.stride]);
        }
        let dims = if block.single {
            block.rest
        } else {
            let mut dims = vec![block.positions.len()];
            dims.extend(block.rest);
            dims
        };
        Ok(Value::Array(ArrayValue {
            element: self.element.clone(),
            dims,
            values,
        }))
    }

    fn set(&mut self, name: &str, levels: &[IndexLevel], value: Value) -> InterpResult<()> {
        let block = self.locate(name, levels)?;
        if block.single && block.rest.is_empty() {
            let slot = block.offset + block.positions[0] * block.stride;
            self.values[slot] = value.coerce(&self.element)?;
            return Ok(());
        }

        let expected = if block.single {
            block.rest.clone()
        } else {
            let mut dims = vec![block.positions.len()];
            dims.extend_from_slice(&block.rest);
            dims
        };
        let source = match value {
            Value::Array(source) if source.dims == expected => source,
            other => {
                return Err(InterpError::type_mismatch(
                    format!("array of shape {expected:?}"),
                    other.type_name(),
                ));
            }
        };
        let coerced = source
            .values
            .into_iter()
            .map(|v| v.coerce(&self.element))
            .collect::<InterpResult<Vec<_>>>()?;
        for (k, p) in block.positions.iter().enumerate() {
            let start = block.offset + p * block.stride;
            self.values[start..start + block.stride]
                .clone_from_slice(&coerced[k * block.stride..(k + 1) * block.stride]);
        }
        Ok(())
    }

    fn fmt_level(&self, f: &mut fmt::Formatter<'_>, depth: usize, offset: usize) -> fmt::Result {
        f.write_str("{")?;
        let stride = self.stride(depth);
        for i in 0..self.dims[depth] {
            if i > 0 {
                f.write_str(", ")?;
            }
            let start = offset + i * stride;
            if depth + 1 == self.dims.len() {
                write!(f, "{}", self.values[start])?;
            } else {
                self.fmt_level(f, depth + 1, start)?;
            }
        }
        f.write_str("}")
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dims.is_empty() {
            return f.write_str("{}");
        }
        self.fmt_level(f, 0, 0)
    }
}

fn slice_error(name: &str, size: usize) -> impl Fn(SliceError) -> InterpError + '_ {
    move |err| match err {
        SliceError::OutOfBounds(index) => InterpError::IndexOutOfRange {
            name: name.to_string(),
            index,
            size,
        },
        SliceError::ZeroStep => InterpError::Evaluation("range step cannot be zero".into()),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn wrap_signed(value: i64, width: Option<u32>) -> i64 {
    match width {
        Some(w) if w > 0 && w < 64 => {
            let modulus = 1i128 << w;
            let r = i128::from(value).rem_euclid(modulus);
            if r >= modulus / 2 {
                (r - modulus) as i64
            } else {
                r as i64
            }
        }
        _ => value,
    }
}

fn wrap_unsigned(value: u64, width: Option<u32>) -> u64 {
    match width {
        Some(w) if w < 64 => value & ((1u64 << w) - 1),
        _ => value,
    }
}

/// A runtime value held by the variable table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    /// Angle in radians, normalized to `[0, 2π)`.
    Angle(f64),
    BitString(BitString),
    Array(ArrayValue),
    /// Qubit alias: a reference to a register, never a copy of its indices.
    Qubit(Identifier),
    /// Declared but never assigned.
    Uninitialized,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Angle(_) => "angle",
            Value::BitString(_) => "bit[]",
            Value::Array(_) => "array",
            Value::Qubit(_) => "qubit",
            Value::Uninitialized => "uninitialized",
        }
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self, Value::Uninitialized)
    }

    /// Type this value has when it appears without a declared type.
    #[allow(clippy::cast_possible_truncation)]
    pub fn natural_type(&self) -> Option<ClassicalType> {
        match self {
            Value::Bool(_) => Some(ClassicalType::Bool),
            Value::Int(_) => Some(ClassicalType::Int(None)),
            Value::Uint(_) => Some(ClassicalType::Uint(None)),
            Value::Float(_) => Some(ClassicalType::Float(None)),
            Value::Angle(_) => Some(ClassicalType::Angle(None)),
            Value::BitString(bits) => Some(ClassicalType::Bit(Some(bits.len() as u32))),
            Value::Array(array) => Some(ClassicalType::Array {
                element: Box::new(array.element.clone()),
                dims: array.dims.clone(),
            }),
            Value::Qubit(_) | Value::Uninitialized => None,
        }
    }

    /// Numeric view of a scalar.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            Value::Float(x) | Value::Angle(x) => Some(*x),
            Value::BitString(bits) => Some(bits.to_u64() as f64),
            _ => None,
        }
    }

    /// Integer view of a scalar; floats are not silently truncated.
    #[allow(clippy::cast_possible_wrap)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            Value::Uint(u) => Some(*u as i64),
            Value::BitString(bits) => Some(bits.to_u64() as i64),
            _ => None,
        }
    }

    /// Truthiness of a scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Uint(u) => Some(*u != 0),
            Value::Float(x) | Value::Angle(x) => Some(*x != 0.0),
            Value::BitString(bits) => Some(bits.count_ones() > 0),
            _ => None,
        }
    }

    /// Convert to `ty`, wrapping integers to their width and normalizing
    /// angles. Uninitialized values pass through unchanged.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn coerce(self, ty: &ClassicalType) -> InterpResult<Value> {
        if !self.is_initialized() {
            return Ok(self);
        }
        let mismatch = |v: &Value| InterpError::type_mismatch(ty, v.type_name());
        match ty {
            ClassicalType::Bool => self.as_bool().map(Value::Bool).ok_or_else(|| mismatch(&self)),
            ClassicalType::Int(width) => {
                let raw = match &self {
                    Value::Float(x) | Value::Angle(x) if x.is_finite() => x.trunc() as i64,
                    other => other.as_i64().ok_or_else(|| mismatch(other))?,
                };
                Ok(Value::Int(wrap_signed(raw, *width)))
            }
            ClassicalType::Uint(width) => {
                let raw = match &self {
                    Value::Float(x) | Value::Angle(x) if x.is_finite() => x.trunc() as i64,
                    other => other.as_i64().ok_or_else(|| mismatch(other))?,
                };
                Ok(Value::Uint(wrap_unsigned(raw as u64, *width)))
            }
            ClassicalType::Float(_) => self.as_f64().map(Value::Float).ok_or_else(|| mismatch(&self)),
            ClassicalType::Angle(_) => self
                .as_f64()
                .map(|x| Value::Angle(x.rem_euclid(TAU)))
                .ok_or_else(|| mismatch(&self)),
            ClassicalType::Bit(None) => match &self {
                Value::BitString(bits) if bits.len() == 1 => Ok(Value::Bool(bits.bits()[0])),
                Value::BitString(_) | Value::Float(_) | Value::Angle(_) => Err(mismatch(&self)),
                other => other.as_bool().map(Value::Bool).ok_or_else(|| mismatch(other)),
            },
            ClassicalType::Bit(Some(n)) => {
                let n = *n as usize;
                match self {
                    Value::BitString(bits) if bits.len() == n => Ok(Value::BitString(bits)),
                    Value::Bool(b) => Ok(Value::BitString(BitString::from_u64(u64::from(b), n))),
                    Value::Int(i) => Ok(Value::BitString(BitString::from_u64(i as u64, n))),
                    Value::Uint(u) => Ok(Value::BitString(BitString::from_u64(u, n))),
                    other => Err(InterpError::type_mismatch(
                        ty,
                        match &other {
                            Value::BitString(bits) => format!("bit[{}]", bits.len()),
                            v => v.type_name().to_string(),
                        },
                    )),
                }
            }
            ClassicalType::Array { element, dims } => match self {
                Value::Array(array) if &array.dims == dims => {
                    let values = array
                        .values
                        .into_iter()
                        .map(|v| v.coerce(element))
                        .collect::<InterpResult<Vec<_>>>()?;
                    Ok(Value::Array(ArrayValue {
                        element: (**element).clone(),
                        dims: dims.clone(),
                        values,
                    }))
                }
                other => Err(mismatch(&other)),
            },
        }
    }

    /// Read the element or sub-block selected by `levels`.
    pub fn get_indexed(&self, name: &str, levels: &[IndexLevel]) -> InterpResult<Value> {
        if levels.is_empty() {
            return Ok(self.clone());
        }
        match self {
            Value::Array(array) => array.get(name, levels),
            Value::BitString(bits) => {
                let [level] = levels else {
                    return Err(InterpError::type_mismatch(
                        format!("a single index on '{name}'"),
                        format!("{} index levels", levels.len()),
                    ));
                };
                let positions = level
                    .positions(bits.len())
                    .map_err(slice_error(name, bits.len()))?;
                if level.is_single() {
                    Ok(Value::Bool(bits.0[positions[0]]))
                } else {
                    Ok(Value::BitString(positions.iter().map(|&p| bits.0[p]).collect()))
                }
            }
            Value::Uninitialized => Err(InterpError::Uninitialized(name.to_string())),
            other => Err(InterpError::type_mismatch("array or bit register", other.type_name())),
        }
    }

    /// Overwrite the element or sub-block selected by `levels`, coercing
    /// `value` to the element type.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_indexed(&mut self, name: &str, levels: &[IndexLevel], value: Value) -> InterpResult<()> {
        match self {
            Value::Array(array) => array.set(name, levels, value),
            Value::BitString(bits) => {
                let [level] = levels else {
                    return Err(InterpError::type_mismatch(
                        format!("a single index on '{name}'"),
                        format!("{} index levels", levels.len()),
                    ));
                };
                let positions = level
                    .positions(bits.len())
                    .map_err(slice_error(name, bits.len()))?;
                if level.is_single() {
                    if let Value::Bool(b) = value.coerce(&ClassicalType::Bit(None))? {
                        bits.0[positions[0]] = b;
                    }
                    return Ok(());
                }
                let width = ClassicalType::Bit(Some(positions.len() as u32));
                if let Value::BitString(source) = value.coerce(&width)? {
                    for (p, b) in positions.iter().zip(source.0) {
                        bits.0[*p] = b;
                    }
                }
                Ok(())
            }
            Value::Uninitialized => Err(InterpError::Uninitialized(name.to_string())),
            other => Err(InterpError::type_mismatch("array or bit register", other.type_name())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) | Value::Angle(x) => write!(f, "{x}"),
            Value::BitString(bits) => write!(f, "\"{bits}\""),
            Value::Array(array) => write!(f, "{array}"),
            Value::Qubit(target) => write!(f, "{target}"),
            Value::Uninitialized => write!(f, "<uninitialized>"),
        }
    }
}
