//! Statement lowering.

use std::sync::Arc;

use tracing::{debug, trace};

use qlow_ir::{BuiltinGate, ClbitId, QubitId};

use super::{Flow, Frame, Interpreter, MAX_CALL_DEPTH};
use crate::ast::{
    Expression, ForIterable, GateCall, GateDefinition, GateModifier, Operand, Statement,
    SubroutineArg, SubroutineDefinition, TypeExpr,
};
use crate::context::{GateResolution, check_controls};
use crate::error::{InterpError, InterpResult};
use crate::identifier::{Identifier, IndexLevel, SliceError};
use crate::modifier::{Modifier, ModifierSummary, control_count, ensure_controls_fit};
use crate::table::SymbolType;
use crate::types::{BitString, ClassicalType, Value};

impl Interpreter {
    /// Lower one statement, reporting how control leaves it.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn lower_statement(&mut self, stmt: &Statement) -> InterpResult<Flow> {
        match stmt {
            Statement::Include(path) => {
                debug!("Ignoring include \"{path}\"");
            }

            Statement::QubitDecl { name, size } => {
                let count = match size {
                    Some(size) => self.eval_u32(size, "qubit register size")?,
                    None => 1,
                };
                self.context.add_qubits(name, count)?;
            }

            Statement::ClassicalDecl { ty, name, init } => {
                let ty = self.resolve_type(ty)?;
                match init {
                    Some(Expression::Measure(qubits)) => {
                        self.context.declare_variable(name, ty, None, false)?;
                        self.measure_into(qubits, &Identifier::plain(name))?;
                    }
                    Some(init) => {
                        let value = self.evaluate(init)?;
                        self.context.declare_variable(name, ty, Some(value), false)?;
                    }
                    None => self.context.declare_variable(name, ty, None, false)?,
                }
            }

            Statement::ConstDecl { ty, name, value } => {
                let ty = self.resolve_type(ty)?;
                let value = self.evaluate(value)?;
                self.context.declare_variable(name, ty, Some(value), true)?;
            }

            Statement::InputDecl { ty, name } => {
                let ty = self.resolve_type(ty)?;
                self.context.declare_input(name, ty)?;
            }

            Statement::Alias { name, target } => {
                let target = self.operand(target)?;
                self.context.declare_qubit_alias(name, &target)?;
            }

            Statement::Assignment { target, op, value } => {
                let target = self.operand(target)?;
                match (op.binary(), value) {
                    (None, Expression::Measure(qubits)) => self.measure_into(qubits, &target)?,
                    (None, _) => {
                        let value = self.evaluate(value)?;
                        self.context.update_value(&target, value)?;
                    }
                    (Some(bin), _) => {
                        let current = self.context.get_value_by_identifier(&target)?;
                        let rhs = self.evaluate(value)?;
                        let value = self.binary(bin, current, rhs)?;
                        self.context.update_value(&target, value)?;
                    }
                }
            }

            Statement::GateDef(def) => self.context.add_gate(def.clone())?,

            Statement::SubroutineDef(def) => self.context.add_subroutine(def.clone())?,

            Statement::Gate(call) => self.lower_gate_call(call)?,

            Statement::GPhase {
                modifiers,
                phase,
                qubits,
            } => {
                let modifiers = self.eval_modifiers(modifiers)?;
                let qubits = self.resolve_all(qubits)?;
                self.apply_phase(phase, &qubits, &modifiers)?;
            }

            Statement::Measure { qubits, target } => match target {
                Some(target) => {
                    let target = self.operand(target)?;
                    self.measure_into(qubits, &target)?;
                }
                None => {
                    let qubits = self.resolve_operand(qubits)?;
                    self.context.add_measure(&qubits, &[])?;
                }
            },

            Statement::Reset { qubits } => {
                let qubits = self.resolve_all(qubits)?;
                trace!("reset {qubits:?}");
            }

            Statement::Barrier { qubits } => {
                let qubits = self.resolve_all(qubits)?;
                trace!("barrier {qubits:?}");
            }

            Statement::Block(body) => return self.in_scope(|this| this.block(body)),

            Statement::If {
                condition,
                then_body,
                else_body,
            } => {
                if self.condition(condition)? {
                    return self.in_scope(|this| this.block(then_body));
                }
                if let Some(else_body) = else_body {
                    return self.in_scope(|this| this.block(else_body));
                }
            }

            Statement::For {
                ty,
                variable,
                iterable,
                body,
            } => return self.lower_for(ty, variable, iterable, body),

            Statement::While { condition, body } => {
                if self.frame.invert {
                    return Err(InterpError::InvalidModifier(
                        "inv cannot be applied to a gate body containing a while loop".into(),
                    ));
                }
                let limit = self.context.config().max_loop_iterations;
                let mut iterations = 0;
                while self.condition(condition)? {
                    if iterations == limit {
                        return Err(InterpError::LoopLimitExceeded(limit));
                    }
                    iterations += 1;
                    match self.in_scope(|this| this.block(body))? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }

            Statement::Break => return Ok(Flow::Break),
            Statement::Continue => return Ok(Flow::Continue),

            Statement::Return(value) => {
                let value = value.as_ref().map(|v| self.evaluate(v)).transpose()?;
                return Ok(Flow::Return(value));
            }

            Statement::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Statement::Pragma(body) => self.context.add_pragma(body)?,
        }
        Ok(Flow::Normal)
    }

    /// Lower statements in order, stopping at the first that does not
    /// complete normally.
    ///
    /// Inside an inverted gate body the order is reversed at every nesting
    /// level, so nested blocks, branches and loops invert as a whole.
    pub(crate) fn block(&mut self, body: &[Statement]) -> InterpResult<Flow> {
        let ordered: Vec<&Statement> = if self.frame.invert {
            body.iter().rev().collect()
        } else {
            body.iter().collect()
        };
        for stmt in ordered {
            let flow = self.lower_statement(stmt)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn condition(&mut self, expr: &Expression) -> InterpResult<bool> {
        let value = self.evaluate(expr)?;
        value
            .as_bool()
            .ok_or_else(|| InterpError::type_mismatch("bool", value.type_name()))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn lower_for(
        &mut self,
        ty: &TypeExpr,
        variable: &str,
        iterable: &ForIterable,
        body: &[Statement],
    ) -> InterpResult<Flow> {
        let ty = self.resolve_type(ty)?;
        let mut values = match iterable {
            ForIterable::Range(range) => {
                let (Some(start), Some(end)) = (range.start.as_deref(), range.end.as_deref()) else {
                    return Err(InterpError::Evaluation(
                        "for-loop range needs both bounds".into(),
                    ));
                };
                let start = self.eval_i64(start)?;
                let end = self.eval_i64(end)?;
                let step = match &range.step {
                    Some(step) => self.eval_i64(step)?,
                    None => 1,
                };
                inclusive_range(start, end, step)?
            }
            ForIterable::Set(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<InterpResult<Vec<_>>>()?,
            ForIterable::Expression(expr) => match self.evaluate(expr)? {
                Value::Array(array) if array.dims().len() == 1 => array.values().to_vec(),
                Value::Array(array) => {
                    let rows = array.len();
                    let whole = Value::Array(array);
                    (0..rows)
                        .map(|i| whole.get_indexed(variable, &[IndexLevel::Single(i as i64)]))
                        .collect::<InterpResult<Vec<_>>>()?
                }
                Value::BitString(bits) => bits.bits().iter().map(|b| Value::Bool(*b)).collect(),
                other => return Err(InterpError::type_mismatch("array or bit register", other.type_name())),
            },
        };
        if self.frame.invert {
            values.reverse();
        }

        for value in values {
            let flow = self.in_scope(|this| {
                this.context
                    .declare_variable(variable, ty.clone(), Some(value), false)?;
                this.block(body)
            })?;
            match flow {
                Flow::Break => break,
                Flow::Normal | Flow::Continue => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    // ---- gates ----

    fn lower_gate_call(&mut self, call: &GateCall) -> InterpResult<()> {
        let modifiers = self.eval_modifiers(&call.modifiers)?;
        let operands = call
            .qubits
            .iter()
            .map(|op| self.resolve_operand(op))
            .collect::<InterpResult<Vec<_>>>()?;

        match self.context.resolve_gate(&call.name)? {
            GateResolution::Builtin(BuiltinGate::GPhase) => {
                let [phase] = call.params.as_slice() else {
                    return Err(InterpError::WrongParameterCount {
                        gate: call.name.clone(),
                        expected: 1,
                        got: call.params.len(),
                    });
                };
                self.apply_phase(phase, &operands.concat(), &modifiers)
            }
            GateResolution::Builtin(gate) => {
                let params = call
                    .params
                    .iter()
                    .map(|p| self.gate_parameter(p))
                    .collect::<InterpResult<Vec<_>>>()?;
                let expected = gate.num_qubits() + control_count(&modifiers);
                for targets in broadcast(&call.name, operands, expected)? {
                    let all = self.frame.targets(&targets);
                    let mods = self.frame.modifiers(&modifiers);
                    self.context
                        .add_gate_instruction(&call.name, &all, &params, &mods)?;
                }
                Ok(())
            }
            GateResolution::UserDefined(def) => {
                let params = call
                    .params
                    .iter()
                    .map(|p| self.eval_f64(p))
                    .collect::<InterpResult<Vec<_>>>()?;
                let expected = def.qubits.len() + control_count(&modifiers);
                for targets in broadcast(&call.name, operands, expected)? {
                    self.inline(&def, &targets, &params, &modifiers)?;
                }
                Ok(())
            }
        }
    }

    /// Expand a user-defined gate in place.
    ///
    /// Integer powers repeat the body; a negative exponent runs it backwards
    /// (see [`Self::block`]) with every gate inverted. Control modifiers carry into the body
    /// through the frame.
    fn inline(
        &mut self,
        def: &Arc<GateDefinition>,
        targets: &[QubitId],
        params: &[f64],
        modifiers: &[Modifier],
    ) -> InterpResult<()> {
        if params.len() != def.params.len() {
            return Err(InterpError::WrongParameterCount {
                gate: def.name.clone(),
                expected: def.params.len(),
                got: params.len(),
            });
        }
        ensure_controls_fit(&def.name, def.qubits.len(), modifiers, targets.len())?;
        let summary = ModifierSummary::fold(modifiers)?;
        let num_controls = summary.num_controls();
        if targets.len() != def.qubits.len() + num_controls {
            return Err(InterpError::WrongQubitCount {
                gate: def.name.clone(),
                expected: def.qubits.len() + num_controls,
                got: targets.len(),
            });
        }
        check_controls(targets, num_controls)?;
        if summary.exponent.fract() != 0.0 {
            return Err(InterpError::InvalidModifier(format!(
                "pow({}) on user-defined gate '{}' must be an integer",
                summary.exponent, def.name
            )));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let repeats = summary.exponent.abs() as usize;
        let (controls, formals) = targets.split_at(num_controls);
        let frame = Frame {
            controls: self.frame.targets(controls),
            control_modifiers: self.frame.control_modifiers(modifiers),
            invert: self.frame.invert ^ (summary.exponent < 0.0),
            gate_qubits: formals.to_vec(),
        };
        debug!(
            "Inlining {}({params:?}) on {targets:?} x{repeats}{}",
            def.name,
            if frame.invert { " inverted" } else { "" }
        );

        let saved = std::mem::replace(&mut self.frame, frame);
        let result = (0..repeats).try_for_each(|_| self.expand_gate_body(def, formals, params));
        self.frame = saved;
        result
    }

    fn expand_gate_body(
        &mut self,
        def: &GateDefinition,
        formals: &[QubitId],
        params: &[f64],
    ) -> InterpResult<()> {
        self.in_scope(|this| {
            for (name, value) in def.params.iter().zip(params) {
                this.context.declare_variable(
                    name,
                    ClassicalType::Float(None),
                    Some(Value::Float(*value)),
                    true,
                )?;
            }
            for (name, qubit) in def.qubits.iter().zip(formals) {
                this.context.declare_qubit_reference(name, &[*qubit])?;
            }
            this.block(&def.body).map(|_| ())
        })
    }

    /// Global phase. Without controls it applies to `own` qubits, the
    /// operands of the gate being inlined, or the whole circuit.
    fn apply_phase(
        &mut self,
        phase: &Expression,
        own: &[QubitId],
        modifiers: &[Modifier],
    ) -> InterpResult<()> {
        let param = self.gate_parameter(phase)?;
        let modifiers = self.frame.modifiers(modifiers);
        if control_count(&modifiers) > 0 {
            let targets = self.frame.targets(own);
            return self.context.add_phase(&param, &targets, &modifiers);
        }
        let targets = if own.is_empty() {
            self.frame.gate_qubits.clone()
        } else {
            own.to_vec()
        };
        self.context.add_phase(&param, &targets, &modifiers)
    }

    fn eval_modifiers(&mut self, modifiers: &[GateModifier]) -> InterpResult<Vec<Modifier>> {
        modifiers
            .iter()
            .map(|modifier| {
                Ok(match modifier {
                    GateModifier::Inv => Modifier::Inv,
                    GateModifier::Pow(k) => Modifier::Pow(self.eval_f64(k)?),
                    GateModifier::Ctrl(n) => Modifier::Ctrl(self.control_arg(n.as_ref())?),
                    GateModifier::NegCtrl(n) => Modifier::NegCtrl(self.control_arg(n.as_ref())?),
                })
            })
            .collect()
    }

    fn control_arg(&mut self, count: Option<&Expression>) -> InterpResult<u32> {
        count.map_or(Ok(1), |n| self.eval_u32(n, "control count"))
    }

    // ---- qubits and measurement ----

    pub(crate) fn resolve_operand(&mut self, operand: &Operand) -> InterpResult<Vec<QubitId>> {
        let identifier = self.operand(operand)?;
        self.context.get_qubits(&identifier)
    }

    fn resolve_all(&mut self, operands: &[Operand]) -> InterpResult<Vec<QubitId>> {
        let mut qubits = Vec::new();
        for operand in operands {
            qubits.extend(self.resolve_operand(operand)?);
        }
        Ok(qubits)
    }

    /// Measure `qubits` into the bits `target` selects.
    ///
    /// Outcomes are unknown while lowering, so the target is set to zeros.
    pub(crate) fn measure_into(&mut self, qubits: &Operand, target: &Identifier) -> InterpResult<()> {
        let qubits = self.resolve_operand(qubits)?;
        let clbits = self.clbits(target)?;
        self.context.add_measure(&qubits, &clbits)?;
        self.context
            .update_value(target, Value::BitString(BitString::zeros(clbits.len())))
    }

    /// Classical bit indices `target` selects within its bit register.
    #[allow(clippy::cast_possible_truncation)]
    fn clbits(&self, target: &Identifier) -> InterpResult<Vec<ClbitId>> {
        let width = match self.context.get_type(target.name())? {
            SymbolType::Classical(ClassicalType::Bit(Some(n))) => *n as usize,
            SymbolType::Classical(ClassicalType::Bit(None) | ClassicalType::Bool) => 1,
            other => return Err(InterpError::type_mismatch("bit", other)),
        };
        let positions = match target.levels() {
            [] => (0..width).collect(),
            [level] => level.positions(width).map_err(|err| match err {
                SliceError::OutOfBounds(index) => InterpError::IndexOutOfRange {
                    name: target.name().to_string(),
                    index,
                    size: width,
                },
                SliceError::ZeroStep => InterpError::Evaluation("range step cannot be zero".into()),
            })?,
            levels => {
                return Err(InterpError::type_mismatch(
                    format!("a single index on '{}'", target.name()),
                    format!("{} index levels", levels.len()),
                ));
            }
        };
        Ok(positions.into_iter().map(|p| ClbitId(p as u32)).collect())
    }

    // ---- subroutines ----

    /// Call a user subroutine: classical arguments by value, qubit
    /// arguments by reference, body in a fresh scope.
    pub(crate) fn call_subroutine(
        &mut self,
        def: &Arc<SubroutineDefinition>,
        args: &[Expression],
    ) -> InterpResult<Value> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(InterpError::Evaluation(format!(
                "call depth of {MAX_CALL_DEPTH} exceeded in '{}'",
                def.name
            )));
        }
        if args.len() != def.args.len() {
            return Err(InterpError::WrongParameterCount {
                gate: def.name.clone(),
                expected: def.args.len(),
                got: args.len(),
            });
        }

        let mut bound = Vec::with_capacity(args.len());
        for (formal, arg) in def.args.iter().zip(args) {
            bound.push(match formal {
                SubroutineArg::Classical { ty, name } => {
                    let ty = self.resolve_type(ty)?;
                    let value = self.evaluate(arg)?.coerce(&ty)?;
                    Argument::Classical(name, ty, value)
                }
                SubroutineArg::Qubit { name, size } => {
                    let qubits = self.resolve_operand(&argument_operand(arg)?)?;
                    if let Some(size) = size {
                        let expected = self.eval_u32(size, "qubit argument size")? as usize;
                        if qubits.len() != expected {
                            return Err(InterpError::WrongQubitCount {
                                gate: def.name.clone(),
                                expected,
                                got: qubits.len(),
                            });
                        }
                    }
                    Argument::Qubit(name, qubits)
                }
            });
        }
        let return_type = def
            .return_type
            .as_ref()
            .map(|ty| self.resolve_type(ty))
            .transpose()?;

        debug!("Calling subroutine {}", def.name);
        self.call_depth += 1;
        // Subroutine bodies run forward and uncontrolled, even when called
        // from a parameter inside an inlined gate.
        let saved = std::mem::take(&mut self.frame);
        let flow = self.in_scope(|this| {
            for argument in bound {
                match argument {
                    Argument::Classical(name, ty, value) => {
                        this.context.declare_variable(name, ty, Some(value), false)?;
                    }
                    Argument::Qubit(name, qubits) => {
                        this.context.declare_qubit_reference(name, &qubits)?;
                    }
                }
            }
            this.block(&def.body)
        });
        self.frame = saved;
        self.call_depth -= 1;

        match (flow?, return_type) {
            (Flow::Return(Some(value)), Some(ty)) => value.coerce(&ty),
            (Flow::Return(Some(value)), None) => Ok(value),
            (Flow::Normal | Flow::Return(None), Some(ty)) => Err(InterpError::Evaluation(format!(
                "subroutine '{}' must return a value of type {ty}",
                def.name
            ))),
            (Flow::Normal | Flow::Return(None), None) => Ok(Value::Uninitialized),
            (Flow::Break | Flow::Continue, _) => Err(InterpError::Evaluation(format!(
                "'break' or 'continue' outside of a loop in '{}'",
                def.name
            ))),
        }
    }
}

impl Frame {
    fn control_modifiers(&self, own: &[Modifier]) -> Vec<Modifier> {
        let mut modifiers = self.control_modifiers.clone();
        modifiers.extend(
            own.iter()
                .filter(|m| matches!(m, Modifier::Ctrl(_) | Modifier::NegCtrl(_))),
        );
        modifiers
    }
}

/// A subroutine argument, evaluated in the caller's scope.
enum Argument<'a> {
    Classical(&'a str, ClassicalType, Value),
    Qubit(&'a str, Vec<QubitId>),
}

/// Qubit arguments are written as plain or indexed names.
fn argument_operand(arg: &Expression) -> InterpResult<Operand> {
    match arg {
        Expression::Identifier(name) => Ok(Operand::name(name.clone())),
        Expression::Index { target, index } => match target.as_ref() {
            Expression::Identifier(name) => Ok(Operand {
                name: name.clone(),
                indices: index.clone(),
            }),
            _ => Err(InterpError::type_mismatch("qubit argument", "expression")),
        },
        _ => Err(InterpError::type_mismatch("qubit argument", "expression")),
    }
}

/// Split gate operands into one target list per application.
///
/// When every operand fills one qubit slot and some are registers, the gate
/// is applied element-wise; registers must then have equal length.
fn broadcast(
    gate: &str,
    operands: Vec<Vec<QubitId>>,
    expected: usize,
) -> InterpResult<Vec<Vec<QubitId>>> {
    let width = operands.iter().map(Vec::len).max().unwrap_or(0);
    if operands.len() != expected || width <= 1 {
        return Ok(vec![operands.concat()]);
    }
    if let Some(bad) = operands.iter().find(|op| op.len() != 1 && op.len() != width) {
        return Err(InterpError::WrongQubitCount {
            gate: gate.to_string(),
            expected: width,
            got: bad.len(),
        });
    }
    Ok((0..width)
        .map(|k| {
            operands
                .iter()
                .map(|op| if op.len() == 1 { op[0] } else { op[k] })
                .collect()
        })
        .collect())
}

/// `start..=end` by `step`, as loop values.
fn inclusive_range(start: i64, end: i64, step: i64) -> InterpResult<Vec<Value>> {
    if step == 0 {
        return Err(InterpError::Evaluation("range step cannot be zero".into()));
    }
    let mut values = Vec::new();
    let mut i = start;
    while (step > 0 && i <= end) || (step < 0 && i >= end) {
        values.push(Value::Int(i));
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<QubitId> {
        raw.iter().copied().map(QubitId).collect()
    }

    #[test]
    fn test_broadcast_registers() {
        let targets = broadcast("cx", vec![ids(&[0]), ids(&[1, 2])], 2).unwrap();
        assert_eq!(targets, vec![ids(&[0, 1]), ids(&[0, 2])]);
    }

    #[test]
    fn test_broadcast_concatenates_single_slots() {
        let targets = broadcast("cx", vec![ids(&[0, 1])], 2).unwrap();
        assert_eq!(targets, vec![ids(&[0, 1])]);
        let targets = broadcast("h", vec![ids(&[3])], 1).unwrap();
        assert_eq!(targets, vec![ids(&[3])]);
    }

    #[test]
    fn test_broadcast_length_mismatch() {
        let err = broadcast("cx", vec![ids(&[0, 1]), ids(&[2, 3, 4])], 2).unwrap_err();
        assert!(matches!(err, InterpError::WrongQubitCount { expected: 3, got: 2, .. }));
    }

    #[test]
    fn test_inclusive_range() {
        let values = inclusive_range(0, 4, 2).unwrap();
        assert_eq!(values, vec![Value::Int(0), Value::Int(2), Value::Int(4)]);
        assert_eq!(inclusive_range(2, 0, -1).unwrap().len(), 3);
        assert!(inclusive_range(3, 1, 1).unwrap().is_empty());
        assert!(inclusive_range(0, 1, 0).is_err());
    }

    #[test]
    fn test_argument_operand() {
        let op = argument_operand(&Expression::ident("q")).unwrap();
        assert_eq!(op.name, "q");
        assert!(argument_operand(&Expression::Int(1)).is_err());
    }
}
