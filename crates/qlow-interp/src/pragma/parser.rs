//! Recursive-descent parser for Braket pragma bodies.

use qlow_ir::{Complex64, Observable, PauliFactor, QubitId, ResultType};

use super::lexer::{SpannedToken, Token, tokenize};
use super::{PragmaDirective, PragmaError, PragmaParser, PragmaResult};
use crate::identifier::{Identifier, IndexLevel, SliceRange};
use crate::qubit_table::QubitTable;

/// Parser for `braket result ...`, `braket unitary(...) ...` and
/// `braket verbatim`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPragmaParser;

impl PragmaParser for DefaultPragmaParser {
    fn parse(&self, body: &str, qubits: &QubitTable) -> PragmaResult<PragmaDirective> {
        let mut cursor = Cursor::new(body)?;
        let directive = cursor.directive(qubits)?;
        cursor.finish()?;
        Ok(directive)
    }
}

struct Cursor {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

#[allow(clippy::cast_possible_wrap)]
impl Cursor {
    fn new(source: &str) -> PragmaResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, message)) => {
                    return Err(PragmaError::Lexer {
                        position: span.start,
                        message,
                    });
                }
            }
        }
        Ok(Self { tokens, pos: 0 })
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn expect(&mut self, expected: Token) -> PragmaResult<()> {
        let found = self
            .advance()
            .ok_or_else(|| PragmaError::UnexpectedEof(format!("expected {expected}")))?;
        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(PragmaError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    fn finish(&self) -> PragmaResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(PragmaError::UnexpectedToken {
                expected: "end of pragma".into(),
                found: token.to_string(),
            }),
        }
    }

    fn identifier(&mut self, what: &str) -> PragmaResult<String> {
        match self.advance() {
            Some(Token::Identifier(name)) => Ok(name),
            Some(other) => Err(PragmaError::UnexpectedToken {
                expected: what.to_string(),
                found: other.to_string(),
            }),
            None => Err(PragmaError::UnexpectedEof(format!("expected {what}"))),
        }
    }

    fn directive(&mut self, qubits: &QubitTable) -> PragmaResult<PragmaDirective> {
        self.expect(Token::Braket)?;
        match self.advance() {
            Some(Token::Result) => self.result(qubits),
            Some(Token::Unitary) => self.unitary(qubits),
            Some(Token::Verbatim) => Ok(PragmaDirective::Verbatim),
            Some(other) => Err(PragmaError::Unsupported(format!("braket {other}"))),
            None => Err(PragmaError::UnexpectedEof("expected pragma kind".into())),
        }
    }

    fn result(&mut self, qubits: &QubitTable) -> PragmaResult<PragmaDirective> {
        let kind = self.identifier("result type")?;
        let (result, targets) = match kind.as_str() {
            "state_vector" => (ResultType::StateVector, vec![]),
            "probability" => (ResultType::Probability, self.optional_targets(qubits)?),
            "density_matrix" => (ResultType::DensityMatrix, self.optional_targets(qubits)?),
            "amplitude" => (
                ResultType::Amplitude {
                    states: self.basis_states()?,
                },
                vec![],
            ),
            "expectation" | "variance" | "sample" => {
                let (observable, targets) = self.observable(qubits)?;
                let result = match kind.as_str() {
                    "expectation" => ResultType::Expectation(observable),
                    "variance" => ResultType::Variance(observable),
                    _ => ResultType::Sample(observable),
                };
                (result, targets)
            }
            other => return Err(PragmaError::Unsupported(format!("result {other}"))),
        };
        Ok(PragmaDirective::Result { result, targets })
    }

    fn basis_states(&mut self) -> PragmaResult<Vec<String>> {
        let mut states = Vec::new();
        loop {
            match self.advance() {
                Some(Token::StringLiteral(state)) => {
                    if state.is_empty() || !state.chars().all(|c| c == '0' || c == '1') {
                        return Err(PragmaError::Unsupported(format!(
                            "amplitude state \"{state}\""
                        )));
                    }
                    states.push(state);
                }
                Some(other) => {
                    return Err(PragmaError::UnexpectedToken {
                        expected: "basis state string".into(),
                        found: other.to_string(),
                    });
                }
                None => return Err(PragmaError::UnexpectedEof("expected basis state".into())),
            }
            if !self.consume(&Token::Comma) {
                return Ok(states);
            }
        }
    }

    /// `x @ z q[0], q[1]` or `x(q[0]) @ z(q[1])`.
    fn observable(&mut self, qubits: &QubitTable) -> PragmaResult<(Observable, Vec<QubitId>)> {
        let mut factors = Vec::new();
        let mut targets = Vec::new();
        let mut inline = 0;
        loop {
            let name = self.identifier("observable")?;
            let factor = PauliFactor::from_name(&name)
                .ok_or_else(|| PragmaError::UnknownObservable(name.clone()))?;
            factors.push(factor);
            if self.consume(&Token::LParen) {
                let (text, resolved) = self.target(qubits)?;
                if resolved.len() != 1 {
                    return Err(PragmaError::Target {
                        target: text,
                        reason: format!("'{name}' acts on exactly one qubit"),
                    });
                }
                targets.extend(resolved);
                inline += 1;
                self.expect(Token::RParen)?;
            }
            if !self.consume(&Token::At) {
                break;
            }
        }

        if inline == 0 {
            targets = self.optional_targets(qubits)?;
        } else if inline != factors.len() {
            return Err(PragmaError::Target {
                target: Observable(factors).to_string(),
                reason: "either every factor or no factor names its target".into(),
            });
        }
        Ok((Observable(factors), targets))
    }

    fn optional_targets(&mut self, qubits: &QubitTable) -> PragmaResult<Vec<QubitId>> {
        if self.is_eof() || self.consume(&Token::All) {
            return Ok(vec![]);
        }
        self.targets(qubits)
    }

    fn targets(&mut self, qubits: &QubitTable) -> PragmaResult<Vec<QubitId>> {
        let mut all = Vec::new();
        loop {
            all.extend(self.target(qubits)?.1);
            if !self.consume(&Token::Comma) {
                return Ok(all);
            }
        }
    }

    /// One qubit operand, returned with its source text.
    fn target(&mut self, qubits: &QubitTable) -> PragmaResult<(String, Vec<QubitId>)> {
        let name = match self.advance() {
            Some(Token::Identifier(name) | Token::HardwareQubit(name)) => name,
            Some(other) => {
                return Err(PragmaError::UnexpectedToken {
                    expected: "qubit".into(),
                    found: other.to_string(),
                });
            }
            None => return Err(PragmaError::UnexpectedEof("expected qubit".into())),
        };
        let mut levels = Vec::new();
        while self.consume(&Token::LBracket) {
            levels.push(self.index_level()?);
            self.expect(Token::RBracket)?;
        }
        let identifier = Identifier::indexed(name, levels);
        let resolved = qubits
            .resolve(&identifier)
            .map_err(|err| PragmaError::Target {
                target: identifier.to_string(),
                reason: err.to_string(),
            })?;
        Ok((identifier.to_string(), resolved))
    }

    /// `i`, `{i, j}`, `a:b` or `a:step:b` with an inclusive end.
    fn index_level(&mut self) -> PragmaResult<IndexLevel> {
        if self.consume(&Token::LBrace) {
            let mut items = vec![self.integer()?];
            while self.consume(&Token::Comma) {
                items.push(self.integer()?);
            }
            self.expect(Token::RBrace)?;
            return Ok(IndexLevel::Set(items));
        }
        let first = self.integer()?;
        if !self.consume(&Token::Colon) {
            return Ok(IndexLevel::Single(first));
        }
        let second = self.integer()?;
        if self.consume(&Token::Colon) {
            let third = self.integer()?;
            return Ok(IndexLevel::Range(SliceRange::inclusive(
                Some(first),
                Some(third),
                Some(second),
            )));
        }
        Ok(IndexLevel::Range(SliceRange::inclusive(
            Some(first),
            Some(second),
            None,
        )))
    }

    fn integer(&mut self) -> PragmaResult<i64> {
        let negative = self.consume(&Token::Minus);
        match self.advance() {
            Some(Token::IntLiteral(v)) => {
                let v = v as i64;
                Ok(if negative { -v } else { v })
            }
            Some(other) => Err(PragmaError::UnexpectedToken {
                expected: "integer".into(),
                found: other.to_string(),
            }),
            None => Err(PragmaError::UnexpectedEof("expected integer".into())),
        }
    }

    fn unitary(&mut self, qubits: &QubitTable) -> PragmaResult<PragmaDirective> {
        self.expect(Token::LParen)?;
        let matrix = self.matrix()?;
        self.expect(Token::RParen)?;
        let targets = self.targets(qubits)?;
        Ok(PragmaDirective::Unitary { matrix, targets })
    }

    fn matrix(&mut self) -> PragmaResult<Vec<Vec<Complex64>>> {
        self.expect(Token::LBracket)?;
        let mut rows = vec![self.row()?];
        while self.consume(&Token::Comma) {
            rows.push(self.row()?);
        }
        self.expect(Token::RBracket)?;
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return Err(PragmaError::Matrix(format!(
                "expected a square matrix with {size} columns per row"
            )));
        }
        Ok(rows)
    }

    fn row(&mut self) -> PragmaResult<Vec<Complex64>> {
        self.expect(Token::LBracket)?;
        let mut row = vec![self.complex()?];
        while self.consume(&Token::Comma) {
            row.push(self.complex()?);
        }
        self.expect(Token::RBracket)?;
        Ok(row)
    }

    /// A sum of real and imaginary terms, such as `0.5 - 0.5im`.
    fn complex(&mut self) -> PragmaResult<Complex64> {
        let mut value = Complex64::new(0.0, 0.0);
        let mut sign = if self.consume(&Token::Minus) { -1.0 } else { 1.0 };
        loop {
            value += sign * self.term()?;
            if self.consume(&Token::Plus) {
                sign = 1.0;
            } else if self.consume(&Token::Minus) {
                sign = -1.0;
            } else {
                return Ok(value);
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn term(&mut self) -> PragmaResult<Complex64> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(Complex64::new(v as f64, 0.0)),
            Some(Token::FloatLiteral(v)) => Ok(Complex64::new(v, 0.0)),
            Some(Token::ImagLiteral(v)) => Ok(Complex64::new(0.0, v)),
            Some(Token::Identifier(name)) if name == "im" => Ok(Complex64::new(0.0, 1.0)),
            Some(other) => Err(PragmaError::UnexpectedToken {
                expected: "number".into(),
                found: other.to_string(),
            }),
            None => Err(PragmaError::UnexpectedEof("expected number".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qubits() -> QubitTable {
        let mut t = QubitTable::new();
        t.allocate("q", 3).unwrap();
        t
    }

    fn parse(body: &str) -> PragmaResult<PragmaDirective> {
        DefaultPragmaParser.parse(body, &qubits())
    }

    #[test]
    fn test_state_vector() {
        assert_eq!(
            parse("braket result state_vector").unwrap(),
            PragmaDirective::Result {
                result: ResultType::StateVector,
                targets: vec![],
            }
        );
    }

    #[test]
    fn test_probability_targets() {
        let PragmaDirective::Result { result, targets } =
            parse("braket result probability q[0], q[2]").unwrap()
        else {
            panic!("expected result");
        };
        assert_eq!(result, ResultType::Probability);
        assert_eq!(targets, vec![QubitId(0), QubitId(2)]);

        let PragmaDirective::Result { targets, .. } =
            parse("braket result density_matrix all").unwrap()
        else {
            panic!("expected result");
        };
        assert!(targets.is_empty());
    }

    #[test]
    fn test_inclusive_range_target() {
        let PragmaDirective::Result { targets, .. } =
            parse("braket result probability q[0:1]").unwrap()
        else {
            panic!("expected result");
        };
        assert_eq!(targets, vec![QubitId(0), QubitId(1)]);
    }

    #[test]
    fn test_amplitude() {
        let directive = parse(r#"braket result amplitude "00", "11""#).unwrap();
        assert_eq!(
            directive,
            PragmaDirective::Result {
                result: ResultType::Amplitude {
                    states: vec!["00".into(), "11".into()],
                },
                targets: vec![],
            }
        );
        assert!(parse(r#"braket result amplitude "0a""#).is_err());
    }

    #[test]
    fn test_inline_observable() {
        let PragmaDirective::Result { result, targets } =
            parse("braket result expectation x(q[0]) @ z(q[2])").unwrap()
        else {
            panic!("expected result");
        };
        assert_eq!(
            result,
            ResultType::Expectation(Observable(vec![PauliFactor::X, PauliFactor::Z]))
        );
        assert_eq!(targets, vec![QubitId(0), QubitId(2)]);
    }

    #[test]
    fn test_trailing_observable_targets() {
        let PragmaDirective::Result { result, targets } =
            parse("braket result variance z @ z q[1], q[2]").unwrap()
        else {
            panic!("expected result");
        };
        assert_eq!(result.name(), "variance");
        assert_eq!(targets, vec![QubitId(1), QubitId(2)]);
        assert!(parse("braket result sample x(q[0]) @ z").is_err());
    }

    #[test]
    fn test_unknown_observable() {
        assert!(matches!(
            parse("braket result expectation w q[0]"),
            Err(PragmaError::UnknownObservable(_))
        ));
    }

    #[test]
    fn test_unitary() {
        let directive = parse("braket unitary([[0, 1im], [-1im, 0]]) q[1]").unwrap();
        let PragmaDirective::Unitary { matrix, targets } = directive else {
            panic!("expected unitary");
        };
        assert_eq!(targets, vec![QubitId(1)]);
        assert_eq!(matrix[0][1], Complex64::new(0.0, 1.0));
        assert_eq!(matrix[1][0], Complex64::new(0.0, -1.0));
    }

    #[test]
    fn test_unitary_mixed_terms() {
        let PragmaDirective::Unitary { matrix, .. } =
            parse("braket unitary([[0.5 + 0.5im, 0.5 - 0.5im], [0.5 - 0.5im, 0.5 + 0.5im]]) q[0]")
                .unwrap()
        else {
            panic!("expected unitary");
        };
        assert_eq!(matrix[0][1], Complex64::new(0.5, -0.5));
        assert!(matches!(
            parse("braket unitary([[1, 0], [0]]) q[0]"),
            Err(PragmaError::Matrix(_))
        ));
    }

    #[test]
    fn test_verbatim_and_unsupported() {
        assert_eq!(parse("braket verbatim").unwrap(), PragmaDirective::Verbatim);
        assert!(matches!(
            parse("braket noise bit_flip(0.1) q[0]"),
            Err(PragmaError::Unsupported(_))
        ));
        assert!(matches!(
            parse("braket verbatim extra"),
            Err(PragmaError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_bad_target() {
        let err = parse("braket result probability q[5]").unwrap_err();
        assert!(matches!(err, PragmaError::Target { ref target, .. } if target == "q[5]"));
        let err = parse("braket result probability r").unwrap_err();
        assert!(matches!(err, PragmaError::Target { .. }));
    }

    #[test]
    fn test_hardware_target() {
        let PragmaDirective::Result { targets, .. } =
            parse("braket result probability $4").unwrap()
        else {
            panic!("expected result");
        };
        assert_eq!(targets, vec![QubitId(4)]);
    }
}
