//! Reference AST walker.
//!
//! [`Interpreter`] drives a [`ProgramContext`] through a parsed program and
//! returns the finished circuit. User gates are inlined: their bodies run
//! in a fresh scope with the caller's modifiers carried in a [`Frame`].

mod expression;
mod statement;

use tracing::{info, instrument};

use qlow_ir::{Circuit, QubitId};

use crate::ast::Program;
use crate::config::InterpreterConfig;
use crate::context::ProgramContext;
use crate::error::{InterpError, InterpResult};
use crate::modifier::Modifier;
use crate::types::Value;

/// Nested subroutine calls allowed before the program is rejected.
const MAX_CALL_DEPTH: usize = 256;

/// How control leaves a statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Option<Value>),
}

/// Modifiers inherited from the user gates currently being inlined.
///
/// Gates inside the body are lowered with the frame's control qubits in
/// front of their own operands, and the frame's control modifiers in front
/// of their own modifiers.
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
    controls: Vec<QubitId>,
    control_modifiers: Vec<Modifier>,
    invert: bool,
    /// Operands of the innermost inlined gate; an operand-less `gphase`
    /// in its body applies to these.
    gate_qubits: Vec<QubitId>,
}

impl Frame {
    fn targets(&self, own: &[QubitId]) -> Vec<QubitId> {
        [self.controls.as_slice(), own].concat()
    }

    fn modifiers(&self, own: &[Modifier]) -> Vec<Modifier> {
        let mut modifiers = self.control_modifiers.clone();
        modifiers.extend_from_slice(own);
        if self.invert {
            modifiers.push(Modifier::Inv);
        }
        modifiers
    }
}

/// Lowers an AST [`Program`] into a [`Circuit`].
pub struct Interpreter {
    context: ProgramContext,
    frame: Frame,
    call_depth: usize,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        Self::with_context(ProgramContext::new(config))
    }

    /// Walk with a preconfigured context, such as one with a custom
    /// pragma parser or parameter evaluator.
    pub fn with_context(context: ProgramContext) -> Self {
        Self {
            context,
            frame: Frame::default(),
            call_depth: 0,
        }
    }

    /// Supply values for the program's `input` declarations.
    #[must_use]
    pub fn with_inputs<I, K>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.context.load_inputs(inputs);
        self
    }

    pub fn context(&self) -> &ProgramContext {
        &self.context
    }

    /// Interpret `program` and hand off the circuit it lowers to.
    #[instrument(skip_all)]
    pub fn run(mut self, program: &Program) -> InterpResult<Circuit> {
        for stmt in &program.statements {
            match self.lower_statement(stmt)? {
                Flow::Normal => {}
                Flow::Return(_) => break,
                Flow::Break | Flow::Continue => {
                    return Err(InterpError::Evaluation(
                        "'break' or 'continue' outside of a loop".into(),
                    ));
                }
            }
        }

        let circuit = self.context.into_circuit();
        info!(
            "Lowered program into {} instructions on {} qubits",
            circuit.len(),
            circuit.num_qubits()
        );
        Ok(circuit)
    }

    /// Run `f` inside a fresh scope, closing it even when `f` fails.
    fn in_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> InterpResult<T>) -> InterpResult<T> {
        self.context.enter_scope();
        let result = f(self);
        let closed = self.context.exit_scope();
        let value = result?;
        closed?;
        Ok(value)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}
