//! Evaluation of symbolic gate parameters.

use qlow_ir::{IrResult, ParameterExpression};

/// Reduces a symbolic gate parameter to a number when its instruction is
/// appended.
///
/// `lookup` resolves free parameters; the context passes one backed by the
/// loaded program inputs.
pub trait ParameterEvaluator: Send {
    fn evaluate(
        &self,
        expr: &ParameterExpression,
        lookup: &dyn Fn(&str) -> Option<f64>,
    ) -> IrResult<f64>;
}

/// Binds every free parameter from the program inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputEvaluator;

impl ParameterEvaluator for InputEvaluator {
    fn evaluate(
        &self,
        expr: &ParameterExpression,
        lookup: &dyn Fn(&str) -> Option<f64>,
    ) -> IrResult<f64> {
        expr.evaluate(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlow_ir::IrError;

    #[test]
    fn test_input_evaluator_binds_symbols() {
        let expr = ParameterExpression::symbol("theta") * ParameterExpression::Constant(2.0);
        let lookup = |name: &str| (name == "theta").then_some(0.25);
        assert_eq!(InputEvaluator.evaluate(&expr, &lookup).unwrap(), 0.5);
    }

    #[test]
    fn test_input_evaluator_unbound() {
        let expr = ParameterExpression::symbol("phi");
        let err = InputEvaluator.evaluate(&expr, &|_| None).unwrap_err();
        assert!(matches!(err, IrError::UnboundParameter(name) if name == "phi"));
    }
}
