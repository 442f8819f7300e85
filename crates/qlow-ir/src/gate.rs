//! Built-in gate catalog and lowered gate operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gates every program may call without defining them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinGate {
    // Single-qubit Clifford and Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Si,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Ti,
    /// sqrt(X) gate.
    V,
    /// sqrt(X)-dagger gate.
    Vi,

    // Single-qubit parameterized gates
    /// Rotation around X.
    Rx,
    /// Rotation around Y.
    Ry,
    /// Rotation around Z.
    Rz,
    /// Phase shift.
    PhaseShift,
    /// Universal single-qubit gate U(θ, φ, λ).
    U,
    /// Trapped-ion GPi gate.
    GPi,
    /// Trapped-ion GPi2 gate.
    GPi2,

    // Two-qubit gates
    /// Controlled-X (CNOT).
    CNot,
    /// Controlled-Y.
    CY,
    /// Controlled-Z.
    CZ,
    /// Controlled sqrt(X).
    CV,
    /// Controlled-Hadamard.
    CH,
    /// SWAP.
    Swap,
    /// iSWAP.
    ISwap,
    /// Parametrized SWAP.
    PSwap,
    /// XY interaction.
    XY,
    /// XX rotation.
    XX,
    /// YY rotation.
    YY,
    /// ZZ rotation.
    ZZ,
    /// Echoed cross-resonance.
    Ecr,
    /// Controlled phase shift.
    CPhaseShift,
    /// Controlled phase shift on |00⟩.
    CPhaseShift00,
    /// Controlled phase shift on |01⟩.
    CPhaseShift01,
    /// Controlled phase shift on |10⟩.
    CPhaseShift10,
    /// Controlled rotation around X.
    CRx,
    /// Controlled rotation around Y.
    CRy,
    /// Controlled rotation around Z.
    CRz,
    /// Mølmer–Sørensen gate.
    MS,

    // Three-qubit gates
    /// Toffoli.
    CCNot,
    /// Fredkin.
    CSwap,

    /// Global phase; acts on no qubits of its own.
    GPhase,
}

impl BuiltinGate {
    /// Look up a built-in by any of its accepted spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "i" | "id" => BuiltinGate::I,
            "x" => BuiltinGate::X,
            "y" => BuiltinGate::Y,
            "z" => BuiltinGate::Z,
            "h" => BuiltinGate::H,
            "s" => BuiltinGate::S,
            "si" | "sdg" => BuiltinGate::Si,
            "t" => BuiltinGate::T,
            "ti" | "tdg" => BuiltinGate::Ti,
            "v" | "sx" => BuiltinGate::V,
            "vi" | "sxdg" => BuiltinGate::Vi,
            "rx" => BuiltinGate::Rx,
            "ry" => BuiltinGate::Ry,
            "rz" => BuiltinGate::Rz,
            "phaseshift" | "p" | "phase" => BuiltinGate::PhaseShift,
            "U" | "u" | "u3" => BuiltinGate::U,
            "gpi" => BuiltinGate::GPi,
            "gpi2" => BuiltinGate::GPi2,
            "cnot" | "cx" | "CX" => BuiltinGate::CNot,
            "cy" => BuiltinGate::CY,
            "cz" => BuiltinGate::CZ,
            "cv" => BuiltinGate::CV,
            "ch" => BuiltinGate::CH,
            "swap" => BuiltinGate::Swap,
            "iswap" => BuiltinGate::ISwap,
            "pswap" => BuiltinGate::PSwap,
            "xy" => BuiltinGate::XY,
            "xx" | "rxx" => BuiltinGate::XX,
            "yy" | "ryy" => BuiltinGate::YY,
            "zz" | "rzz" => BuiltinGate::ZZ,
            "ecr" => BuiltinGate::Ecr,
            "cphaseshift" | "cp" | "cphase" => BuiltinGate::CPhaseShift,
            "cphaseshift00" => BuiltinGate::CPhaseShift00,
            "cphaseshift01" => BuiltinGate::CPhaseShift01,
            "cphaseshift10" => BuiltinGate::CPhaseShift10,
            "crx" => BuiltinGate::CRx,
            "cry" => BuiltinGate::CRy,
            "crz" => BuiltinGate::CRz,
            "ms" => BuiltinGate::MS,
            "ccnot" | "ccx" | "toffoli" => BuiltinGate::CCNot,
            "cswap" | "fredkin" => BuiltinGate::CSwap,
            "gphase" => BuiltinGate::GPhase,
            _ => return None,
        })
    }

    /// Canonical name written into emitted instructions.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            BuiltinGate::I => "i",
            BuiltinGate::X => "x",
            BuiltinGate::Y => "y",
            BuiltinGate::Z => "z",
            BuiltinGate::H => "h",
            BuiltinGate::S => "s",
            BuiltinGate::Si => "si",
            BuiltinGate::T => "t",
            BuiltinGate::Ti => "ti",
            BuiltinGate::V => "v",
            BuiltinGate::Vi => "vi",
            BuiltinGate::Rx => "rx",
            BuiltinGate::Ry => "ry",
            BuiltinGate::Rz => "rz",
            BuiltinGate::PhaseShift => "phaseshift",
            BuiltinGate::U => "U",
            BuiltinGate::GPi => "gpi",
            BuiltinGate::GPi2 => "gpi2",
            BuiltinGate::CNot => "cnot",
            BuiltinGate::CY => "cy",
            BuiltinGate::CZ => "cz",
            BuiltinGate::CV => "cv",
            BuiltinGate::CH => "ch",
            BuiltinGate::Swap => "swap",
            BuiltinGate::ISwap => "iswap",
            BuiltinGate::PSwap => "pswap",
            BuiltinGate::XY => "xy",
            BuiltinGate::XX => "xx",
            BuiltinGate::YY => "yy",
            BuiltinGate::ZZ => "zz",
            BuiltinGate::Ecr => "ecr",
            BuiltinGate::CPhaseShift => "cphaseshift",
            BuiltinGate::CPhaseShift00 => "cphaseshift00",
            BuiltinGate::CPhaseShift01 => "cphaseshift01",
            BuiltinGate::CPhaseShift10 => "cphaseshift10",
            BuiltinGate::CRx => "crx",
            BuiltinGate::CRy => "cry",
            BuiltinGate::CRz => "crz",
            BuiltinGate::MS => "ms",
            BuiltinGate::CCNot => "ccnot",
            BuiltinGate::CSwap => "cswap",
            BuiltinGate::GPhase => "gphase",
        }
    }

    /// Number of qubits the bare gate acts on, before any control modifiers.
    #[inline]
    pub fn num_qubits(self) -> usize {
        match self {
            BuiltinGate::GPhase => 0,

            BuiltinGate::I
            | BuiltinGate::X
            | BuiltinGate::Y
            | BuiltinGate::Z
            | BuiltinGate::H
            | BuiltinGate::S
            | BuiltinGate::Si
            | BuiltinGate::T
            | BuiltinGate::Ti
            | BuiltinGate::V
            | BuiltinGate::Vi
            | BuiltinGate::Rx
            | BuiltinGate::Ry
            | BuiltinGate::Rz
            | BuiltinGate::PhaseShift
            | BuiltinGate::U
            | BuiltinGate::GPi
            | BuiltinGate::GPi2 => 1,

            BuiltinGate::CCNot | BuiltinGate::CSwap => 3,

            _ => 2,
        }
    }

    /// Number of angle parameters the gate takes.
    #[inline]
    pub fn num_params(self) -> usize {
        match self {
            BuiltinGate::Rx
            | BuiltinGate::Ry
            | BuiltinGate::Rz
            | BuiltinGate::PhaseShift
            | BuiltinGate::GPi
            | BuiltinGate::GPi2
            | BuiltinGate::PSwap
            | BuiltinGate::XY
            | BuiltinGate::XX
            | BuiltinGate::YY
            | BuiltinGate::ZZ
            | BuiltinGate::CPhaseShift
            | BuiltinGate::CPhaseShift00
            | BuiltinGate::CPhaseShift01
            | BuiltinGate::CPhaseShift10
            | BuiltinGate::CRx
            | BuiltinGate::CRy
            | BuiltinGate::CRz
            | BuiltinGate::GPhase => 1,
            BuiltinGate::U | BuiltinGate::MS => 3,
            _ => 0,
        }
    }
}

impl fmt::Display for BuiltinGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Required value of a control qubit for the gate to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlState {
    /// Negative control (`negctrl`): acts when the qubit is |0⟩.
    Zero,
    /// Positive control (`ctrl`): acts when the qubit is |1⟩.
    One,
}

impl ControlState {
    /// The state as a bit.
    #[inline]
    pub fn bit(self) -> u8 {
        match self {
            ControlState::Zero => 0,
            ControlState::One => 1,
        }
    }
}

/// A fully lowered gate application.
///
/// The instruction's target list starts with `control_states.len()` control
/// qubits, followed by the gate's own targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOperation {
    /// Canonical gate name.
    pub name: String,
    /// Numeric parameters, already evaluated.
    pub params: Vec<f64>,
    /// One state per control qubit, in modifier order.
    pub control_states: Vec<ControlState>,
    /// Power the gate is raised to; `-1` is the adjoint.
    pub exponent: f64,
}

impl GateOperation {
    /// An unmodified gate application.
    pub fn new(name: impl Into<String>, params: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            params,
            control_states: vec![],
            exponent: 1.0,
        }
    }

    /// Set the control states.
    #[must_use]
    pub fn with_controls(mut self, control_states: Vec<ControlState>) -> Self {
        self.control_states = control_states;
        self
    }

    /// Set the exponent.
    #[must_use]
    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    /// Number of leading control qubits in the target list.
    #[inline]
    pub fn num_controls(&self) -> usize {
        self.control_states.len()
    }

    /// Control states as bits.
    pub fn control_bits(&self) -> Vec<u8> {
        self.control_states.iter().map(|s| s.bit()).collect()
    }
}
