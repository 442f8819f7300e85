//! Resolved identifiers: a name plus literal index levels.
//!
//! The AST carries index *expressions*; the walker reduces them to the
//! literal [`IndexLevel`]s here before calling into the program context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sigil that marks a hardware (physical) qubit name such as `$3`.
pub const HARDWARE_QUBIT_SIGIL: char = '$';

/// A half-open slice `start:end:step` over a sequence.
///
/// Missing bounds default to the whole sequence in the direction of `step`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub step: Option<i64>,
}

/// Why a slice could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceError {
    /// The offending bound or produced index.
    OutOfBounds(i64),
    /// A step of zero never terminates.
    ZeroStep,
}

impl SliceRange {
    /// Slice with both bounds given and unit step.
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            step: None,
        }
    }

    /// Convert a source-level range, whose end bound is inclusive.
    ///
    /// An end at the edge of `i64` saturates; no sequence is long enough for
    /// the lost element to matter.
    pub fn inclusive(start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Self {
        let backwards = step.is_some_and(|s| s < 0);
        Self {
            start,
            end: end.map(|e| if backwards { e.saturating_sub(1) } else { e.saturating_add(1) }),
            step,
        }
    }

    /// Set the step.
    #[must_use]
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }

    /// Positions selected from a sequence of length `len`, in slice order.
    ///
    /// Every produced position must lie inside the sequence; the bounds
    /// themselves may overshoot.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn positions(&self, len: usize) -> Result<Vec<usize>, SliceError> {
        let walk = self.walk(len)?;
        Ok((0..walk.count)
            .map(|k| (walk.start + k as i128 * walk.step) as usize)
            .collect())
    }

    /// Number of positions selected, without materializing them.
    ///
    /// Fails exactly when [`positions`](Self::positions) does.
    pub fn count(&self, len: usize) -> Result<usize, SliceError> {
        self.walk(len).map(|walk| walk.count)
    }

    /// Resolve defaults and check every produced position against `len`.
    ///
    /// The progression is monotonic, so checking the first and last
    /// positions covers all of them. Arithmetic runs in `i128`.
    fn walk(&self, len: usize) -> Result<Walk, SliceError> {
        let len = len as i128;
        let step = i128::from(self.step.unwrap_or(1));
        if step == 0 {
            return Err(SliceError::ZeroStep);
        }
        let (start, end) = if step > 0 {
            (self.start.map_or(0, i128::from), self.end.map_or(len, i128::from))
        } else {
            (self.start.map_or(len - 1, i128::from), self.end.map_or(-1, i128::from))
        };
        let span = if step > 0 { end - start } else { start - end };
        if span <= 0 {
            return Ok(Walk { start, step, count: 0 });
        }
        let count = (span + step.abs() - 1) / step.abs();
        let in_range = |i: i128| (0..len).contains(&i);
        if !in_range(start) {
            return Err(SliceError::OutOfBounds(saturate(start)));
        }
        if !in_range(start + (count - 1) * step) {
            // First position past the edge the walk is heading towards.
            let inside = if step > 0 {
                (len - 1 - start) / step + 1
            } else {
                start / -step + 1
            };
            return Err(SliceError::OutOfBounds(saturate(start + inside * step)));
        }
        let count = usize::try_from(count).map_err(|_| SliceError::OutOfBounds(saturate(end)))?;
        Ok(Walk { start, step, count })
    }
}

/// A validated arithmetic progression of positions.
struct Walk {
    start: i128,
    step: i128,
    count: usize,
}

#[allow(clippy::cast_possible_truncation)]
fn saturate(value: i128) -> i64 {
    value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

impl fmt::Display for SliceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_str(":")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

/// One level of indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexLevel {
    /// A single integer position.
    Single(i64),
    /// A slice of positions.
    Range(SliceRange),
    /// An explicit, ordered set of positions; duplicates are kept.
    Set(Vec<i64>),
}

impl IndexLevel {
    /// Whether the level selects exactly one element.
    pub fn is_single(&self) -> bool {
        matches!(self, IndexLevel::Single(_))
    }

    /// Positions selected from a sequence of length `len`.
    ///
    /// Negative positions are rejected rather than counted from the end.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn positions(&self, len: usize) -> Result<Vec<usize>, SliceError> {
        let check = |i: i64| {
            if i < 0 || i >= len as i64 {
                Err(SliceError::OutOfBounds(i))
            } else {
                Ok(i as usize)
            }
        };
        match self {
            IndexLevel::Single(i) => Ok(vec![check(*i)?]),
            IndexLevel::Range(range) => range.positions(len),
            IndexLevel::Set(items) => items.iter().map(|&i| check(i)).collect(),
        }
    }
}

impl fmt::Display for IndexLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexLevel::Single(i) => write!(f, "{i}"),
            IndexLevel::Range(r) => write!(f, "{r}"),
            IndexLevel::Set(items) => {
                let parts: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// A name, optionally with index levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identifier {
    /// A bare name.
    Plain(String),
    /// A name with one or more index levels, outermost first.
    Indexed(String, Vec<IndexLevel>),
}

impl Identifier {
    /// A bare name.
    pub fn plain(name: impl Into<String>) -> Self {
        Identifier::Plain(name.into())
    }

    /// A name with index levels; an empty level list gives a bare name.
    pub fn indexed(name: impl Into<String>, levels: Vec<IndexLevel>) -> Self {
        if levels.is_empty() {
            Identifier::Plain(name.into())
        } else {
            Identifier::Indexed(name.into(), levels)
        }
    }

    /// The base name.
    pub fn name(&self) -> &str {
        match self {
            Identifier::Plain(name) | Identifier::Indexed(name, _) => name,
        }
    }

    /// The index levels; empty for a bare name.
    pub fn levels(&self) -> &[IndexLevel] {
        match self {
            Identifier::Plain(_) => &[],
            Identifier::Indexed(_, levels) => levels,
        }
    }

    /// Whether the name uses the hardware qubit sigil.
    pub fn is_hardware(&self) -> bool {
        self.name().starts_with(HARDWARE_QUBIT_SIGIL)
    }

    /// Append further index levels to this identifier.
    #[must_use]
    pub fn with_levels(&self, extra: &[IndexLevel]) -> Self {
        let mut levels = self.levels().to_vec();
        levels.extend_from_slice(extra);
        Identifier::indexed(self.name(), levels)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        for level in self.levels() {
            write!(f, "[{level}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_positions() {
        assert_eq!(SliceRange::new(1, 3).positions(5).unwrap(), vec![1, 2]);
        assert_eq!(
            SliceRange::new(0, 5).with_step(2).positions(5).unwrap(),
            vec![0, 2, 4]
        );
        let reversed = SliceRange {
            start: None,
            end: None,
            step: Some(-1),
        };
        assert_eq!(reversed.positions(3).unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn test_slice_bounds() {
        assert_eq!(
            SliceRange::new(1, 7).positions(5),
            Err(SliceError::OutOfBounds(5))
        );
        assert_eq!(
            SliceRange::new(4, -3).with_step(-2).positions(5),
            Err(SliceError::OutOfBounds(-2))
        );
        assert_eq!(
            SliceRange::new(-1, 2).positions(5),
            Err(SliceError::OutOfBounds(-1))
        );
        assert_eq!(
            SliceRange::new(0, 2).with_step(0).positions(5),
            Err(SliceError::ZeroStep)
        );
        assert!(SliceRange::new(3, 1).positions(5).unwrap().is_empty());
    }

    #[test]
    fn test_slice_count_matches_positions() {
        let cases = [
            SliceRange::new(0, 5),
            SliceRange::new(1, 4).with_step(2),
            SliceRange::new(4, 0).with_step(-1),
            SliceRange::new(2, 2),
            SliceRange::new(0, 6).with_step(2),
            SliceRange::new(4, -2).with_step(-3),
        ];
        for case in cases {
            assert_eq!(case.count(5).unwrap(), case.positions(5).unwrap().len());
        }
    }

    #[test]
    fn test_stepped_slice_may_overshoot_end() {
        // q[0:2:5] on five qubits.
        let range = SliceRange::inclusive(Some(0), Some(5), Some(2));
        assert_eq!(range.positions(5).unwrap(), vec![0, 2, 4]);
        assert_eq!(range.count(5).unwrap(), 3);
    }

    #[test]
    fn test_slice_extremes_do_not_overflow() {
        let open_end = SliceRange::inclusive(Some(0), Some(i64::MAX), None);
        assert_eq!(open_end.positions(3), Err(SliceError::OutOfBounds(3)));
        assert_eq!(open_end.count(3), Err(SliceError::OutOfBounds(3)));

        let backwards = SliceRange::inclusive(Some(2), Some(i64::MIN), Some(-1));
        assert_eq!(backwards.positions(3), Err(SliceError::OutOfBounds(-1)));

        let huge_step = SliceRange::new(1, 3).with_step(i64::MAX);
        assert_eq!(huge_step.positions(5).unwrap(), vec![1]);
        assert_eq!(huge_step.count(5).unwrap(), 1);

        let huge_negative = SliceRange::new(4, i64::MIN).with_step(i64::MIN);
        assert_eq!(
            huge_negative.positions(5),
            Err(SliceError::OutOfBounds(i64::MIN + 4))
        );
    }

    #[test]
    fn test_level_positions() {
        assert_eq!(IndexLevel::Single(2).positions(3).unwrap(), vec![2]);
        assert_eq!(
            IndexLevel::Single(-1).positions(3),
            Err(SliceError::OutOfBounds(-1))
        );
        assert_eq!(
            IndexLevel::Set(vec![2, 0, 2]).positions(3).unwrap(),
            vec![2, 0, 2]
        );
        assert_eq!(
            IndexLevel::Set(vec![0, 3]).positions(3),
            Err(SliceError::OutOfBounds(3))
        );
    }

    #[test]
    fn test_identifier_display() {
        let id = Identifier::indexed(
            "q",
            vec![IndexLevel::Range(SliceRange::new(0, 2)), IndexLevel::Single(1)],
        );
        assert_eq!(id.to_string(), "q[0:2][1]");
        assert_eq!(Identifier::plain("$4").to_string(), "$4");
        assert!(Identifier::plain("$4").is_hardware());
    }

    #[test]
    fn test_with_levels() {
        let id = Identifier::plain("q").with_levels(&[IndexLevel::Set(vec![2, 0, 2])]);
        assert_eq!(id.levels().len(), 1);
        assert_eq!(id.to_string(), "q[{2, 0, 2}]");
        assert_eq!(Identifier::indexed("r", vec![]), Identifier::plain("r"));
    }
}
