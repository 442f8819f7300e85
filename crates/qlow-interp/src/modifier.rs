//! Gate modifier algebra.
//!
//! Modifiers fold into a list of control states (in declaration order) and
//! a single real exponent. Inversion is the exponent `-1`, so `inv` and
//! `pow` compose by multiplication.

use qlow_ir::ControlState;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{InterpError, InterpResult};

/// A gate modifier with its argument evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    /// `inv @`
    Inv,
    /// `pow(k) @`
    Pow(f64),
    /// `ctrl(n) @`: `n` controls on `|1⟩`.
    Ctrl(u32),
    /// `negctrl(n) @`: `n` controls on `|0⟩`.
    NegCtrl(u32),
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Inv => write!(f, "inv"),
            Modifier::Pow(k) => write!(f, "pow({k})"),
            Modifier::Ctrl(n) => write!(f, "ctrl({n})"),
            Modifier::NegCtrl(n) => write!(f, "negctrl({n})"),
        }
    }
}

/// The combined effect of a modifier list.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierSummary {
    /// One entry per control qubit, in modifier order.
    pub control_states: Vec<ControlState>,
    /// `(-1)^inv_count * product(pow args)`.
    pub exponent: f64,
}

impl Default for ModifierSummary {
    fn default() -> Self {
        Self {
            control_states: Vec::new(),
            exponent: 1.0,
        }
    }
}

impl ModifierSummary {
    /// Fold `modifiers` left to right.
    pub fn fold(modifiers: &[Modifier]) -> InterpResult<Self> {
        let mut summary = Self::default();
        for modifier in modifiers {
            match *modifier {
                Modifier::Inv => summary.exponent = -summary.exponent,
                Modifier::Pow(k) => {
                    if !k.is_finite() {
                        return Err(InterpError::InvalidModifier(modifier.to_string()));
                    }
                    summary.exponent *= k;
                }
                Modifier::Ctrl(0) | Modifier::NegCtrl(0) => {
                    return Err(InterpError::InvalidModifier(format!(
                        "{modifier}: control count must be positive"
                    )));
                }
                Modifier::Ctrl(n) => summary
                    .control_states
                    .extend(std::iter::repeat_n(ControlState::One, n as usize)),
                Modifier::NegCtrl(n) => summary
                    .control_states
                    .extend(std::iter::repeat_n(ControlState::Zero, n as usize)),
            }
        }
        Ok(summary)
    }

    pub fn num_controls(&self) -> usize {
        self.control_states.len()
    }
}

/// Fail with [`InterpError::WrongQubitCount`] when `modifiers` ask for more
/// control qubits than the `available` operands could supply.
///
/// Runs before [`ModifierSummary::fold`], which materializes one state per
/// control.
pub fn ensure_controls_fit(
    gate: &str,
    arity: usize,
    modifiers: &[Modifier],
    available: usize,
) -> InterpResult<()> {
    let controls = control_count(modifiers);
    if controls > available {
        return Err(InterpError::WrongQubitCount {
            gate: gate.to_string(),
            expected: arity.saturating_add(controls),
            got: available,
        });
    }
    Ok(())
}

/// Control qubits requested by `modifiers`, before validation.
pub fn control_count(modifiers: &[Modifier]) -> usize {
    modifiers
        .iter()
        .map(|m| match m {
            Modifier::Ctrl(n) | Modifier::NegCtrl(n) => *n as usize,
            _ => 0,
        })
        .fold(0, usize::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ControlState::{One, Zero};

    #[test]
    fn test_default_exponent() {
        let summary = ModifierSummary::fold(&[]).unwrap();
        assert_eq!(summary.exponent, 1.0);
        assert!(summary.control_states.is_empty());
    }

    #[test]
    fn test_inversion_parity() {
        let once = ModifierSummary::fold(&[Modifier::Inv]).unwrap();
        assert_eq!(once.exponent, -1.0);
        let twice = ModifierSummary::fold(&[Modifier::Inv, Modifier::Inv]).unwrap();
        assert_eq!(twice.exponent, 1.0);
    }

    #[test]
    fn test_pow_and_inv_multiply() {
        let summary = ModifierSummary::fold(&[Modifier::Pow(3.0), Modifier::Inv]).unwrap();
        assert_eq!(summary.exponent, -3.0);
        let summary = ModifierSummary::fold(&[Modifier::Pow(0.5), Modifier::Pow(0.5)]).unwrap();
        assert_eq!(summary.exponent, 0.25);
    }

    #[test]
    fn test_control_states_in_order() {
        let summary = ModifierSummary::fold(&[
            Modifier::Ctrl(1),
            Modifier::Ctrl(1),
            Modifier::NegCtrl(1),
        ])
        .unwrap();
        assert_eq!(summary.control_states, vec![One, One, Zero]);

        let summary = ModifierSummary::fold(&[Modifier::NegCtrl(2), Modifier::Ctrl(1)]).unwrap();
        assert_eq!(summary.control_states, vec![Zero, Zero, One]);
        assert_eq!(control_count(&[Modifier::NegCtrl(2), Modifier::Inv, Modifier::Ctrl(1)]), 3);
    }

    #[test]
    fn test_invalid_modifiers() {
        assert!(matches!(
            ModifierSummary::fold(&[Modifier::Ctrl(0)]),
            Err(InterpError::InvalidModifier(_))
        ));
        assert!(ModifierSummary::fold(&[Modifier::Pow(f64::NAN)]).is_err());
    }

    #[test]
    fn test_controls_checked_before_folding() {
        let huge = [Modifier::Ctrl(u32::MAX), Modifier::NegCtrl(u32::MAX)];
        assert!(matches!(
            ensure_controls_fit("h", 1, &huge, 2),
            Err(InterpError::WrongQubitCount { got: 2, .. })
        ));
        assert!(ensure_controls_fit("h", 1, &[Modifier::Ctrl(1)], 2).is_ok());
    }
}
