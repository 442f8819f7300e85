//! Program context: owns every table and the circuit being built.
//!
//! The AST walker calls into [`ProgramContext`] as it descends; the context
//! never walks the tree itself. Scope changes fan out to the symbol,
//! variable, gate and subroutine tables together. The qubit table and the
//! circuit are global and outlive every scope.

use std::fmt;
use std::sync::Arc;

use qlow_ir::{
    BuiltinGate, Circuit, ClbitId, Complex64, GateOperation, GateParameter, QubitId, ResultType,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::ast::{GateDefinition, SubroutineDefinition};
use crate::config::InterpreterConfig;
use crate::error::{InterpError, InterpResult};
use crate::evaluator::{InputEvaluator, ParameterEvaluator};
use crate::identifier::{Identifier, IndexLevel};
use crate::modifier::{Modifier, ModifierSummary, ensure_controls_fit};
use crate::pragma::{DefaultPragmaParser, PragmaDirective, PragmaParser};
use crate::qubit_table::QubitTable;
use crate::table::{GateTable, SubroutineTable, SymbolTable, SymbolType, VariableTable};
use crate::types::{ClassicalType, Value};

/// How a program names its qubits. A program commits to one style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Addressing {
    /// Declared registers (`qubit[4] q;`).
    Virtual,
    /// Physical `$n` qubits.
    Hardware,
}

/// What a gate name refers to at the current point of the program.
#[derive(Debug, Clone)]
pub enum GateResolution {
    /// A user definition, which shadows any built-in of the same name.
    UserDefined(Arc<GateDefinition>),
    Builtin(BuiltinGate),
}

/// Interpretation state for a single program.
pub struct ProgramContext {
    config: InterpreterConfig,
    symbols: SymbolTable,
    variables: VariableTable,
    gates: GateTable,
    subroutines: SubroutineTable,
    qubits: QubitTable,
    circuit: Circuit,
    /// Externally supplied values, coerced once their `input` is declared.
    inputs: FxHashMap<String, Value>,
    /// Declared inputs and the scope level of their declaration.
    input_scopes: FxHashMap<String, usize>,
    addressing: Option<Addressing>,
    pragma_parser: Box<dyn PragmaParser>,
    evaluator: Box<dyn ParameterEvaluator>,
}

impl ProgramContext {
    /// Create a context with the default pragma parser and input evaluator.
    pub fn new(config: InterpreterConfig) -> Self {
        let circuit = Circuit::new(config.circuit_name.clone());
        Self {
            config,
            symbols: SymbolTable::new(),
            variables: VariableTable::new(),
            gates: GateTable::new(),
            subroutines: SubroutineTable::new(),
            qubits: QubitTable::new(),
            circuit,
            inputs: FxHashMap::default(),
            input_scopes: FxHashMap::default(),
            addressing: None,
            pragma_parser: Box::new(DefaultPragmaParser),
            evaluator: Box::new(InputEvaluator),
        }
    }

    /// Replace the pragma parser.
    #[must_use]
    pub fn with_pragma_parser(mut self, parser: impl PragmaParser + 'static) -> Self {
        self.pragma_parser = Box::new(parser);
        self
    }

    /// Replace the parameter evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: impl ParameterEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    // ---- scopes ----

    /// Current nesting depth; 0 is the global scope.
    pub fn depth(&self) -> usize {
        self.symbols.depth() - 1
    }

    pub fn enter_scope(&mut self) {
        self.symbols.push_scope();
        self.variables.push_scope();
        self.gates.push_scope();
        self.subroutines.push_scope();
        trace!("Entered scope {}", self.depth());
    }

    /// Leave the innermost scope, dropping everything declared in it.
    pub fn exit_scope(&mut self) -> InterpResult<()> {
        if self.depth() == 0 {
            return Err(InterpError::ScopeUnderflow);
        }
        trace!("Leaving scope {}", self.depth());
        self.symbols.pop_scope()?;
        self.variables.pop_scope()?;
        self.gates.pop_scope()?;
        self.subroutines.pop_scope()
    }

    /// Run `f` inside a fresh scope.
    ///
    /// The scope is closed whether or not `f` succeeds; an error from `f`
    /// takes precedence over one from closing.
    pub fn with_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> InterpResult<T>,
    ) -> InterpResult<T> {
        self.enter_scope();
        let result = f(self);
        let closed = self.exit_scope();
        let value = result?;
        closed?;
        Ok(value)
    }

    // ---- inputs ----

    /// Make externally supplied values available to `input` declarations.
    pub fn load_inputs<I, K>(&mut self, inputs: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (name, value) in inputs {
            self.inputs.insert(name.into(), value);
        }
    }

    /// A supplied input value.
    pub fn input(&self, name: &str) -> InterpResult<&Value> {
        self.inputs
            .get(name)
            .ok_or_else(|| InterpError::UndefinedName(name.to_string()))
    }

    /// Declare `input ty name;`, binding the supplied value.
    pub fn declare_input(&mut self, name: &str, ty: ClassicalType) -> InterpResult<()> {
        let value = self.input(name)?.clone().coerce(&ty)?;
        self.declare_variable(name, ty, Some(value.clone()), false)?;
        self.inputs.insert(name.to_string(), value);
        self.input_scopes.insert(name.to_string(), self.depth());
        Ok(())
    }

    /// Whether `name` currently refers to a declared input.
    pub fn is_input(&self, name: &str) -> bool {
        self.input_scopes
            .get(name)
            .is_some_and(|&scope| self.symbols.scope_of(name) == Some(scope))
    }

    // ---- classical declarations ----

    /// Declare a classical variable in the current scope.
    ///
    /// Without an initializer, scalars start uninitialized while bit
    /// registers and arrays start zero-filled.
    pub fn declare_variable(
        &mut self,
        name: &str,
        ty: ClassicalType,
        value: Option<Value>,
        is_const: bool,
    ) -> InterpResult<()> {
        let value = match value {
            Some(value) => value.coerce(&ty)?,
            None => ty.initial_value(),
        };
        trace!("Declared {name}: {ty} = {value}");
        self.symbols
            .add_symbol(name, SymbolType::Classical(ty), is_const)?;
        self.variables.add_variable(name, value);
        Ok(())
    }

    pub fn get_type(&self, name: &str) -> InterpResult<&SymbolType> {
        self.symbols.get_type(name)
    }

    pub fn is_const(&self, name: &str) -> InterpResult<bool> {
        self.symbols.get_const(name)
    }

    pub fn get_value(&self, name: &str) -> InterpResult<&Value> {
        self.variables.get_value(name)
    }

    /// Value of a possibly indexed identifier; fails on uninitialized reads.
    pub fn get_value_by_identifier(&self, identifier: &Identifier) -> InterpResult<Value> {
        self.variables.get_value_by_identifier(identifier)
    }

    pub fn is_initialized(&self, name: &str) -> InterpResult<bool> {
        self.variables.is_initialized(name)
    }

    /// Assign to a classical variable or the part of it `target` selects.
    ///
    /// The innermost visible binding is updated, even when it lives in an
    /// outer scope.
    pub fn update_value(&mut self, target: &Identifier, value: Value) -> InterpResult<()> {
        let symbol = self.symbols.get_symbol(target.name())?;
        if symbol.is_const {
            return Err(InterpError::ConstAssignment(target.name().to_string()));
        }
        let ty = match &symbol.symbol_type {
            SymbolType::Classical(ty) => ty.clone(),
            SymbolType::Qubit => return Err(InterpError::type_mismatch("classical variable", "qubit")),
        };
        self.variables
            .update_value(target.name(), value, &ty, target.levels())
    }

    // ---- qubits ----

    /// Allocate register `name` of `count` qubits and bind its name.
    ///
    /// Nothing is recorded unless the whole declaration succeeds.
    pub fn add_qubits(&mut self, name: &str, count: u32) -> InterpResult<()> {
        let requested = u64::from(self.qubits.num_qubits()) + u64::from(count);
        let limit = self.config.qubit_limit();
        if requested > u64::from(limit) {
            return Err(InterpError::QubitLimitExceeded { requested, limit });
        }
        if self.symbols.contains_local(name) {
            return Err(InterpError::Redeclaration(name.to_string()));
        }
        self.set_addressing(Addressing::Virtual, name)?;

        let first = self.qubits.allocate(name, count)?.first().copied();
        self.symbols.add_symbol(name, SymbolType::Qubit, false)?;
        self.variables
            .add_variable(name, Value::Qubit(Identifier::plain(name)));
        self.circuit.extend_qubits_to(self.qubits.num_qubits());
        debug!(
            "Allocated qubit register {name}[{count}] starting at {}",
            first.map_or_else(|| "-".to_string(), |q| q.to_string())
        );
        Ok(())
    }

    /// Bind `name` to the qubits `target` names, without allocating.
    ///
    /// The stored reference always points at a register (or a hardware
    /// qubit) directly. An alias of an alias is folded into a single index
    /// set on the underlying register.
    pub fn declare_qubit_alias(&mut self, name: &str, target: &Identifier) -> InterpResult<()> {
        let expanded = self.expand(target)?;
        let qubits = self.resolve_expanded(&expanded)?;
        let canonical = if expanded.levels().len() > 1 {
            self.flatten(&expanded, &qubits)?
        } else {
            expanded
        };
        trace!("Aliased {name} -> {canonical}");
        self.symbols.add_symbol(name, SymbolType::Qubit, false)?;
        self.variables.add_variable(name, Value::Qubit(canonical));
        Ok(())
    }

    /// Bind `name` to already resolved physical qubits.
    ///
    /// Used for gate and subroutine formals, whose actual arguments are
    /// resolved in the caller's scope before the callee's scope opens.
    pub fn declare_qubit_reference(&mut self, name: &str, qubits: &[QubitId]) -> InterpResult<()> {
        let reference = self.qubit_reference(qubits)?;
        trace!("Bound {name} -> {reference}");
        self.symbols.add_symbol(name, SymbolType::Qubit, false)?;
        self.variables.add_variable(name, Value::Qubit(reference));
        Ok(())
    }

    /// An identifier naming exactly `qubits`, in order.
    ///
    /// All qubits must come from one register, or be a single hardware qubit.
    #[allow(clippy::cast_possible_wrap)]
    pub fn qubit_reference(&self, qubits: &[QubitId]) -> InterpResult<Identifier> {
        let reference_error =
            |reason: &str| InterpError::Evaluation(format!("cannot reference {qubits:?}: {reason}"));
        let Some(&first) = qubits.first() else {
            return Err(reference_error("no qubits"));
        };
        let Some((register, _)) = self.qubits.locate(first) else {
            return match qubits {
                [qubit] => Ok(Identifier::plain(qubit.to_string())),
                _ => Err(reference_error("several hardware qubits")),
            };
        };
        let mut positions = Vec::with_capacity(qubits.len());
        for &qubit in qubits {
            match self.qubits.locate(qubit) {
                Some((name, position)) if name == register => positions.push(position as i64),
                _ => return Err(reference_error("qubits span several registers")),
            }
        }
        let whole = self.qubits.get(register)?.len() == positions.len()
            && positions.iter().enumerate().all(|(i, &p)| p == i as i64);
        if whole {
            return Ok(Identifier::plain(register));
        }
        let level = if positions.len() == 1 {
            IndexLevel::Single(positions[0])
        } else {
            IndexLevel::Set(positions)
        };
        Ok(Identifier::indexed(register, vec![level]))
    }

    /// Physical qubits `identifier` names, in selection order.
    pub fn get_qubits(&mut self, identifier: &Identifier) -> InterpResult<Vec<QubitId>> {
        let expanded = self.expand(identifier)?;
        self.resolve_expanded(&expanded)
    }

    /// Number of qubits `identifier` names.
    pub fn qubit_size(&self, identifier: &Identifier) -> InterpResult<usize> {
        let expanded = self.expand(identifier)?;
        self.qubits.size_of(&expanded)
    }

    /// Size of the circuit's qubit index space.
    pub fn qubit_count(&self) -> usize {
        self.circuit.num_qubits()
    }

    pub fn qubit_table(&self) -> &QubitTable {
        &self.qubits
    }

    /// Rewrite `identifier` in terms of the register its name refers to.
    fn expand(&self, identifier: &Identifier) -> InterpResult<Identifier> {
        if identifier.is_hardware() {
            return Ok(identifier.clone());
        }
        let name = identifier.name();
        if let SymbolType::Classical(ty) = self.symbols.get_type(name)? {
            return Err(InterpError::type_mismatch("qubit", ty));
        }
        match self.variables.get_value(name)? {
            Value::Qubit(target) => Ok(target.with_levels(identifier.levels())),
            other => Err(InterpError::type_mismatch("qubit", other.type_name())),
        }
    }

    fn resolve_expanded(&mut self, expanded: &Identifier) -> InterpResult<Vec<QubitId>> {
        if expanded.is_hardware() {
            self.claim_hardware(expanded.name())?;
        }
        self.qubits.resolve(expanded)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn flatten(&self, expanded: &Identifier, qubits: &[QubitId]) -> InterpResult<Identifier> {
        if expanded.is_hardware() {
            return Ok(match qubits {
                [qubit] => Identifier::plain(qubit.to_string()),
                _ => Identifier::plain(expanded.name()),
            });
        }
        let register = self.qubits.get(expanded.name())?;
        let positions = qubits
            .iter()
            .map(|q| {
                register
                    .iter()
                    .position(|r| r == q)
                    .map(|p| p as i64)
                    .ok_or_else(|| InterpError::UndefinedName(q.to_string()))
            })
            .collect::<InterpResult<Vec<_>>>()?;
        Ok(Identifier::indexed(
            expanded.name(),
            vec![IndexLevel::Set(positions)],
        ))
    }

    /// Admit hardware qubit `name` and grow the circuit to include it.
    fn claim_hardware(&mut self, name: &str) -> InterpResult<()> {
        if !self.config.allow_hardware_qubits {
            return Err(InterpError::HardwareQubitsDisabled(name.to_string()));
        }
        let index = QubitTable::hardware_index(name)
            .ok_or_else(|| InterpError::UndefinedName(name.to_string()))?;
        let limit = self.config.qubit_limit();
        if index >= limit {
            return Err(InterpError::QubitLimitExceeded {
                requested: u64::from(index) + 1,
                limit,
            });
        }
        self.set_addressing(Addressing::Hardware, name)?;
        self.circuit.extend_qubits_to(index.saturating_add(1));
        Ok(())
    }

    fn set_addressing(&mut self, addressing: Addressing, name: &str) -> InterpResult<()> {
        match self.addressing {
            Some(current) if current != addressing => {
                Err(InterpError::MixedQubitAddressing(name.to_string()))
            }
            _ => {
                self.addressing = Some(addressing);
                Ok(())
            }
        }
    }

    // ---- definitions ----

    /// Register a user-defined gate in the current scope.
    pub fn add_gate(&mut self, definition: GateDefinition) -> InterpResult<()> {
        let name = definition.name.clone();
        debug!(
            "Defined gate {name}({}) on {} qubits",
            definition.params.join(", "),
            definition.qubits.len()
        );
        self.gates.add(&name, definition)
    }

    pub fn get_gate_definition(&self, name: &str) -> InterpResult<Arc<GateDefinition>> {
        self.gates.get(name)
    }

    pub fn is_user_defined_gate(&self, name: &str) -> bool {
        self.gates.contains(name)
    }

    pub fn is_builtin_gate(&self, name: &str) -> bool {
        BuiltinGate::from_name(name).is_some()
    }

    /// Decide what `name` refers to; user definitions win over built-ins.
    pub fn resolve_gate(&self, name: &str) -> InterpResult<GateResolution> {
        if self.gates.contains(name) {
            return Ok(GateResolution::UserDefined(self.gates.get(name)?));
        }
        BuiltinGate::from_name(name)
            .map(GateResolution::Builtin)
            .ok_or_else(|| InterpError::UnknownGate(name.to_string()))
    }

    /// Register a user-defined subroutine in the current scope.
    pub fn add_subroutine(&mut self, definition: SubroutineDefinition) -> InterpResult<()> {
        let name = definition.name.clone();
        debug!("Defined subroutine {name} with {} arguments", definition.args.len());
        self.subroutines.add(&name, definition)
    }

    pub fn get_subroutine_definition(&self, name: &str) -> InterpResult<Arc<SubroutineDefinition>> {
        self.subroutines.get(name)
    }

    pub fn is_user_defined_subroutine(&self, name: &str) -> bool {
        self.subroutines.contains(name)
    }

    // ---- delegates ----

    /// Hand a pragma body to the pragma parser.
    pub fn parse_pragma(&self, body: &str) -> InterpResult<PragmaDirective> {
        Ok(self.pragma_parser.parse(body, &self.qubits)?)
    }

    /// Parse a pragma and append whatever it asks for.
    pub fn add_pragma(&mut self, body: &str) -> InterpResult<()> {
        match self.parse_pragma(body)? {
            PragmaDirective::Result { result, targets } => {
                self.claim_pragma_targets(&targets)?;
                self.add_result(result, &targets)
            }
            PragmaDirective::Unitary { matrix, targets } => {
                self.claim_pragma_targets(&targets)?;
                self.add_unitary(matrix, &targets)
            }
            PragmaDirective::Verbatim => {
                debug!("Verbatim pragma");
                Ok(())
            }
        }
    }

    fn claim_pragma_targets(&mut self, targets: &[QubitId]) -> InterpResult<()> {
        for qubit in targets {
            if qubit.0 >= self.qubits.num_qubits() {
                self.claim_hardware(&qubit.to_string())?;
            }
        }
        Ok(())
    }

    /// Reduce a gate parameter to a number; symbolic ones go through the
    /// evaluator, with free parameters bound from the inputs.
    pub fn evaluate_parameter(&self, param: &GateParameter) -> InterpResult<f64> {
        match param {
            GateParameter::Number(value) => Ok(*value),
            GateParameter::Expression(expr) => {
                let lookup = |name: &str| self.inputs.get(name).and_then(Value::as_f64);
                Ok(self.evaluator.evaluate(expr, &lookup)?)
            }
        }
    }

    // ---- lowering ----

    /// Append one built-in gate application.
    ///
    /// `targets` holds the control qubits first, then the gate's own
    /// operands. User-defined gates must be expanded by the caller.
    pub fn add_gate_instruction(
        &mut self,
        name: &str,
        targets: &[QubitId],
        params: &[GateParameter],
        modifiers: &[Modifier],
    ) -> InterpResult<()> {
        if self.gates.contains(name) {
            return Err(InterpError::UserDefinedGate(name.to_string()));
        }
        let gate = BuiltinGate::from_name(name)
            .ok_or_else(|| InterpError::UnknownGate(name.to_string()))?;
        ensure_controls_fit(name, gate.num_qubits(), modifiers, targets.len())?;
        let summary = ModifierSummary::fold(modifiers)?;

        let expected = gate.num_qubits() + summary.num_controls();
        if targets.len() != expected {
            return Err(InterpError::WrongQubitCount {
                gate: name.to_string(),
                expected,
                got: targets.len(),
            });
        }
        if params.len() != gate.num_params() {
            return Err(InterpError::WrongParameterCount {
                gate: name.to_string(),
                expected: gate.num_params(),
                got: params.len(),
            });
        }
        check_controls(targets, summary.num_controls())?;

        let values = params
            .iter()
            .map(|p| self.evaluate_parameter(p))
            .collect::<InterpResult<Vec<_>>>()?;
        let op = GateOperation::new(gate.name(), values)
            .with_controls(summary.control_states)
            .with_exponent(summary.exponent);
        debug!(
            "Appending {} {:?} on {:?} (controls: {}, exponent: {})",
            op.name,
            op.params,
            targets,
            op.num_controls(),
            op.exponent
        );
        self.circuit.add_gate(op, targets.to_vec())?;
        Ok(())
    }

    /// Append a global phase.
    ///
    /// With control modifiers this becomes a controlled `gphase` gate on the
    /// control qubits; otherwise a phase instruction on `targets` (all
    /// qubits when empty), scaled by the modifier exponent.
    pub fn add_phase(
        &mut self,
        phase: &GateParameter,
        targets: &[QubitId],
        modifiers: &[Modifier],
    ) -> InterpResult<()> {
        ensure_controls_fit(BuiltinGate::GPhase.name(), 0, modifiers, targets.len())?;
        let summary = ModifierSummary::fold(modifiers)?;
        if summary.num_controls() > 0 {
            return self.add_gate_instruction(
                BuiltinGate::GPhase.name(),
                targets,
                std::slice::from_ref(phase),
                modifiers,
            );
        }
        let value = self.evaluate_parameter(phase)? * summary.exponent;
        debug!("Appending gphase({value}) on {targets:?}");
        self.circuit.add_phase(value, targets)?;
        Ok(())
    }

    /// Append one measurement per qubit, optionally into matching clbits.
    pub fn add_measure(&mut self, qubits: &[QubitId], clbits: &[ClbitId]) -> InterpResult<()> {
        if !clbits.is_empty() && clbits.len() != qubits.len() {
            return Err(InterpError::WrongQubitCount {
                gate: "measure".to_string(),
                expected: clbits.len(),
                got: qubits.len(),
            });
        }
        for (i, &qubit) in qubits.iter().enumerate() {
            let clbit = clbits.get(i).copied();
            debug!("Appending measure {qubit} -> {clbit:?}");
            self.circuit.add_measure(qubit, clbit)?;
        }
        Ok(())
    }

    pub fn add_unitary(
        &mut self,
        matrix: Vec<Vec<Complex64>>,
        targets: &[QubitId],
    ) -> InterpResult<()> {
        debug!("Appending unitary on {targets:?}");
        self.circuit.add_unitary(matrix, targets.to_vec())?;
        Ok(())
    }

    /// Append a result declaration; empty `targets` means all qubits.
    pub fn add_result(&mut self, result: ResultType, targets: &[QubitId]) -> InterpResult<()> {
        debug!("Appending result {} on {targets:?}", result.name());
        self.circuit.add_result(result, targets.to_vec())?;
        Ok(())
    }

    // ---- output ----

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Finish interpretation and hand off the circuit.
    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }
}

impl Default for ProgramContext {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

impl fmt::Debug for ProgramContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramContext")
            .field("config", &self.config)
            .field("depth", &self.depth())
            .field("qubits", &self.qubits)
            .field("instructions", &self.circuit.len())
            .field("addressing", &self.addressing)
            .finish_non_exhaustive()
    }
}

/// Controls must be distinct and must not reappear among the targets.
pub(crate) fn check_controls(qubits: &[QubitId], num_controls: usize) -> InterpResult<()> {
    let (controls, targets) = qubits.split_at(num_controls);
    let mut seen = FxHashSet::default();
    for &qubit in controls {
        if !seen.insert(qubit) {
            return Err(InterpError::ModifierConflict { qubit });
        }
    }
    match targets.iter().find(|q| seen.contains(*q)) {
        Some(&qubit) => Err(InterpError::ModifierConflict { qubit }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::SliceRange;
    use qlow_ir::{ControlState, InstructionKind, IrError, ParameterExpression};

    fn ids(raw: &[u32]) -> Vec<QubitId> {
        raw.iter().copied().map(QubitId).collect()
    }

    fn with_register(size: u32) -> ProgramContext {
        let mut ctx = ProgramContext::default();
        ctx.add_qubits("q", size).unwrap();
        ctx
    }

    fn q(index: i64) -> Identifier {
        Identifier::indexed("q", vec![IndexLevel::Single(index)])
    }

    #[test]
    fn test_scope_shadowing() {
        let mut ctx = ProgramContext::default();
        ctx.declare_variable("x", ClassicalType::Int(None), Some(Value::Int(1)), false)
            .unwrap();
        ctx.enter_scope();
        ctx.declare_variable("x", ClassicalType::Float(None), Some(Value::Float(2.5)), false)
            .unwrap();
        ctx.declare_variable("y", ClassicalType::Bool, Some(Value::Bool(true)), false)
            .unwrap();
        assert_eq!(ctx.get_value("x").unwrap(), &Value::Float(2.5));
        ctx.exit_scope().unwrap();

        assert_eq!(ctx.get_value("x").unwrap(), &Value::Int(1));
        assert!(matches!(ctx.get_value("y"), Err(InterpError::UndefinedName(_))));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_update_in_inner_scope_reaches_outer() {
        let mut ctx = ProgramContext::default();
        ctx.declare_variable("n", ClassicalType::Int(Some(8)), Some(Value::Int(0)), false)
            .unwrap();
        ctx.with_scope(|ctx| ctx.update_value(&Identifier::plain("n"), Value::Int(300)))
            .unwrap();
        assert_eq!(ctx.get_value("n").unwrap(), &Value::Int(44));
    }

    #[test]
    fn test_const_and_qubit_assignment_rejected() {
        let mut ctx = with_register(1);
        ctx.declare_variable("k", ClassicalType::Int(None), Some(Value::Int(3)), true)
            .unwrap();
        assert!(matches!(
            ctx.update_value(&Identifier::plain("k"), Value::Int(4)),
            Err(InterpError::ConstAssignment(_))
        ));
        assert!(matches!(
            ctx.update_value(&Identifier::plain("q"), Value::Int(4)),
            Err(InterpError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_scope_underflow() {
        let mut ctx = ProgramContext::default();
        assert!(matches!(ctx.exit_scope(), Err(InterpError::ScopeUnderflow)));
    }

    #[test]
    fn test_with_scope_closes_on_error() {
        let mut ctx = ProgramContext::default();
        let result: InterpResult<()> =
            ctx.with_scope(|_| Err(InterpError::Evaluation("boom".into())));
        assert!(matches!(result, Err(InterpError::Evaluation(_))));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_allocation_and_indexing() {
        let mut ctx = ProgramContext::default();
        ctx.add_qubits("a", 2).unwrap();
        ctx.add_qubits("q", 4).unwrap();
        assert_eq!(ctx.qubit_count(), 6);
        assert_eq!(ctx.get_type("q").unwrap(), &SymbolType::Qubit);

        let slice = Identifier::indexed("q", vec![IndexLevel::Range(SliceRange::new(1, 3))]);
        assert_eq!(ctx.get_qubits(&slice).unwrap(), ids(&[3, 4]));
        assert_eq!(ctx.qubit_size(&slice).unwrap(), 2);
        assert!(matches!(
            ctx.get_qubits(&q(4)),
            Err(InterpError::QubitIndexOutOfRange { index: 4, size: 4, .. })
        ));
        assert!(matches!(
            ctx.add_qubits("q", 1),
            Err(InterpError::Redeclaration(_))
        ));
    }

    #[test]
    fn test_qubit_limit() {
        let mut ctx = ProgramContext::new(InterpreterConfig::new().with_max_qubits(4));
        ctx.add_qubits("a", 3).unwrap();
        assert!(matches!(
            ctx.add_qubits("b", 2),
            Err(InterpError::QubitLimitExceeded { requested: 5, limit: 4 })
        ));
        assert!(matches!(ctx.get_type("b"), Err(InterpError::UndefinedName(_))));
        ctx.add_qubits("b", 1).unwrap();
        assert_eq!(ctx.qubit_count(), 4);
    }

    #[test]
    fn test_default_qubit_ceiling() {
        let mut ctx = ProgramContext::default();
        assert!(matches!(
            ctx.add_qubits("q", u32::MAX),
            Err(InterpError::QubitLimitExceeded { limit: crate::config::DEFAULT_MAX_QUBITS, .. })
        ));
        assert!(matches!(ctx.get_type("q"), Err(InterpError::UndefinedName(_))));
        assert_eq!(ctx.qubit_count(), 0);
    }

    #[test]
    fn test_failed_register_leaves_no_symbol() {
        let mut ctx = with_register(2);
        ctx.enter_scope();
        assert!(matches!(ctx.add_qubits("q", 1), Err(InterpError::Redeclaration(_))));
        assert!(!ctx.symbols.contains_local("q"));
        ctx.exit_scope().unwrap();
        assert_eq!(ctx.qubit_count(), 2);
        assert_eq!(ctx.get_qubits(&Identifier::plain("q")).unwrap(), ids(&[0, 1]));
    }

    #[test]
    fn test_alias_of_alias_is_flattened() {
        let mut ctx = with_register(5);
        let slice = Identifier::indexed("q", vec![IndexLevel::Range(SliceRange::new(1, 5))]);
        ctx.declare_qubit_alias("a", &slice).unwrap();
        let inner = Identifier::indexed(
            "a",
            vec![IndexLevel::Range(SliceRange::new(0, 4).with_step(2))],
        );
        ctx.declare_qubit_alias("b", &inner).unwrap();

        assert_eq!(
            ctx.get_value("b").unwrap(),
            &Value::Qubit(Identifier::indexed("q", vec![IndexLevel::Set(vec![1, 3])]))
        );
        let last = Identifier::indexed("b", vec![IndexLevel::Single(1)]);
        assert_eq!(ctx.get_qubits(&last).unwrap(), ids(&[3]));
    }

    #[test]
    fn test_qubit_reference() {
        let mut ctx = ProgramContext::default();
        ctx.add_qubits("a", 2).unwrap();
        ctx.add_qubits("q", 3).unwrap();
        assert_eq!(ctx.qubit_reference(&ids(&[2, 3, 4])).unwrap(), Identifier::plain("q"));
        assert_eq!(ctx.qubit_reference(&ids(&[3])).unwrap(), q(1));
        assert_eq!(
            ctx.qubit_reference(&ids(&[4, 2])).unwrap(),
            Identifier::indexed("q", vec![IndexLevel::Set(vec![2, 0])])
        );
        assert!(ctx.qubit_reference(&ids(&[1, 2])).is_err());

        ctx.enter_scope();
        ctx.declare_qubit_reference("q", &ids(&[4])).unwrap();
        ctx.declare_qubit_reference("b", &ids(&[3])).unwrap();
        assert_eq!(ctx.get_qubits(&Identifier::plain("q")).unwrap(), ids(&[4]));
        assert_eq!(ctx.get_qubits(&Identifier::plain("b")).unwrap(), ids(&[3]));
        ctx.exit_scope().unwrap();
        assert_eq!(ctx.get_qubits(&Identifier::plain("q")).unwrap(), ids(&[2, 3, 4]));
    }

    #[test]
    fn test_alias_to_classical_rejected() {
        let mut ctx = ProgramContext::default();
        ctx.declare_variable("c", ClassicalType::Bit(Some(2)), None, false)
            .unwrap();
        assert!(matches!(
            ctx.declare_qubit_alias("a", &Identifier::plain("c")),
            Err(InterpError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_hardware_qubits() {
        let mut ctx = ProgramContext::default();
        assert_eq!(ctx.get_qubits(&Identifier::plain("$3")).unwrap(), ids(&[3]));
        assert_eq!(ctx.qubit_count(), 4);
        assert!(matches!(
            ctx.add_qubits("q", 1),
            Err(InterpError::MixedQubitAddressing(_))
        ));

        let mut ctx = with_register(2);
        assert!(matches!(
            ctx.get_qubits(&Identifier::plain("$0")),
            Err(InterpError::MixedQubitAddressing(_))
        ));

        let mut ctx = ProgramContext::new(InterpreterConfig::new().with_hardware_qubits(false));
        assert!(matches!(
            ctx.get_qubits(&Identifier::plain("$0")),
            Err(InterpError::HardwareQubitsDisabled(_))
        ));
    }

    #[test]
    fn test_controlled_hadamard() {
        let mut ctx = with_register(3);
        let targets = [ctx.get_qubits(&q(0)).unwrap(), ctx.get_qubits(&q(1)).unwrap()].concat();
        ctx.add_gate_instruction("h", &targets, &[], &[Modifier::Ctrl(1)])
            .unwrap();

        let circuit = ctx.into_circuit();
        assert_eq!(circuit.len(), 1);
        let inst = &circuit.instructions()[0];
        let op = inst.as_gate().unwrap();
        assert_eq!(op.name, "h");
        assert_eq!(inst.qubits, ids(&[0, 1]));
        assert_eq!(op.control_states, vec![ControlState::One]);
        assert_eq!(op.exponent, 1.0);
    }

    #[test]
    fn test_modifier_states_precede_targets() {
        let mut ctx = with_register(4);
        ctx.add_gate_instruction(
            "x",
            &ids(&[0, 1, 2, 3]),
            &[],
            &[Modifier::Ctrl(1), Modifier::Ctrl(1), Modifier::NegCtrl(1), Modifier::Inv],
        )
        .unwrap();
        let op = ctx.circuit().instructions()[0].as_gate().unwrap().clone();
        assert_eq!(
            op.control_states,
            vec![ControlState::One, ControlState::One, ControlState::Zero]
        );
        assert_eq!(op.exponent, -1.0);
    }

    #[test]
    fn test_control_overlap() {
        let mut ctx = with_register(3);
        let err = ctx
            .add_gate_instruction("x", &ids(&[1, 1]), &[], &[Modifier::Ctrl(1)])
            .unwrap_err();
        assert!(matches!(err, InterpError::ModifierConflict { qubit: QubitId(1) }));

        let err = ctx
            .add_gate_instruction("cnot", &ids(&[0, 1, 1]), &[], &[Modifier::Ctrl(1)])
            .unwrap_err();
        assert!(matches!(err, InterpError::Circuit(IrError::DuplicateQubit { .. })));
    }

    #[test]
    fn test_gate_checks() {
        let mut ctx = with_register(2);
        assert!(matches!(
            ctx.add_gate_instruction("nope", &ids(&[0]), &[], &[]),
            Err(InterpError::UnknownGate(_))
        ));
        assert!(matches!(
            ctx.add_gate_instruction("cnot", &ids(&[0]), &[], &[]),
            Err(InterpError::WrongQubitCount { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            ctx.add_gate_instruction("rx", &ids(&[0]), &[], &[]),
            Err(InterpError::WrongParameterCount { expected: 1, got: 0, .. })
        ));
        assert!(matches!(
            ctx.add_gate_instruction("x", &ids(&[0, 1]), &[], &[Modifier::Ctrl(u32::MAX)]),
            Err(InterpError::WrongQubitCount { got: 2, .. })
        ));

        ctx.add_gate(GateDefinition {
            name: "h".into(),
            params: vec![],
            qubits: vec!["a".into()],
            body: vec![],
        })
        .unwrap();
        assert!(matches!(ctx.resolve_gate("h"), Ok(GateResolution::UserDefined(_))));
        assert!(matches!(
            ctx.add_gate_instruction("h", &ids(&[0]), &[], &[]),
            Err(InterpError::UserDefinedGate(_))
        ));
        assert!(matches!(ctx.resolve_gate("cx"), Ok(GateResolution::Builtin(BuiltinGate::CNot))));
    }

    #[test]
    fn test_alias_names_are_canonical() {
        let mut ctx = with_register(2);
        ctx.add_gate_instruction("cx", &ids(&[0, 1]), &[], &[]).unwrap();
        assert_eq!(ctx.circuit().instructions()[0].name(), "cnot");
    }

    #[test]
    fn test_phase_lowering() {
        let mut ctx = with_register(3);
        ctx.add_phase(&GateParameter::Number(0.5), &ids(&[2, 0, 2]), &[Modifier::Inv])
            .unwrap();
        let inst = &ctx.circuit().instructions()[0];
        assert!(matches!(inst.kind, InstructionKind::Phase { phase } if phase == -0.5));
        assert_eq!(inst.qubits, ids(&[2, 0]));

        ctx.add_phase(&GateParameter::Number(0.25), &ids(&[1]), &[Modifier::NegCtrl(1)])
            .unwrap();
        let op = ctx.circuit().instructions()[1].as_gate().unwrap();
        assert_eq!(op.name, "gphase");
        assert_eq!(op.params, vec![0.25]);
        assert_eq!(op.control_states, vec![ControlState::Zero]);
    }

    #[test]
    fn test_symbolic_parameters_use_inputs() {
        let mut ctx = with_register(1);
        ctx.load_inputs([("theta", Value::Float(0.75))]);
        ctx.declare_input("theta", ClassicalType::Float(None)).unwrap();
        assert!(ctx.is_input("theta"));

        let param = GateParameter::Expression(
            ParameterExpression::symbol("theta") * ParameterExpression::Constant(2.0),
        );
        ctx.add_gate_instruction("rx", &ids(&[0]), &[param], &[]).unwrap();
        assert_eq!(ctx.circuit().instructions()[0].as_gate().unwrap().params, vec![1.5]);

        assert!(matches!(
            ctx.declare_input("missing", ClassicalType::Float(None)),
            Err(InterpError::UndefinedName(_))
        ));
    }

    #[test]
    fn test_shadowed_input_is_not_an_input() {
        let mut ctx = ProgramContext::default();
        ctx.load_inputs([("n", Value::Int(2))]);
        ctx.declare_input("n", ClassicalType::Int(None)).unwrap();
        ctx.enter_scope();
        ctx.declare_variable("n", ClassicalType::Int(None), Some(Value::Int(5)), false)
            .unwrap();
        assert!(!ctx.is_input("n"));
        ctx.exit_scope().unwrap();
        assert!(ctx.is_input("n"));
        assert!(!ctx.is_input("m"));
    }

    #[test]
    fn test_measure() {
        let mut ctx = with_register(2);
        ctx.add_measure(&ids(&[1, 0]), &[ClbitId(0), ClbitId(1)]).unwrap();
        ctx.add_measure(&ids(&[1]), &[]).unwrap();
        assert_eq!(ctx.circuit().len(), 3);
        assert_eq!(ctx.circuit().measured_qubits(), ids(&[1, 0]).as_slice());
        assert!(ctx.add_measure(&ids(&[0]), &[ClbitId(0), ClbitId(1)]).is_err());
    }

    #[test]
    fn test_result_pragma() {
        let mut ctx = with_register(2);
        ctx.add_pragma("braket result expectation z(q[0]) @ x(q[1])").unwrap();
        ctx.add_pragma("braket result probability").unwrap();
        ctx.add_pragma("braket verbatim").unwrap();
        let results: Vec<_> = ctx.circuit().results().collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, ids(&[0, 1]).as_slice());
        assert!(matches!(results[1].0, ResultType::Probability));
        assert!(matches!(
            ctx.add_pragma("braket result probability r[0]"),
            Err(InterpError::Pragma(_))
        ));
    }

    #[test]
    fn test_unitary_pragma() {
        let mut ctx = with_register(1);
        ctx.add_pragma("braket unitary([[0, 1], [1, 0]]) q[0]").unwrap();
        assert_eq!(ctx.circuit().instructions()[0].name(), "unitary");
    }
}
