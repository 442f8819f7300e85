//! Flat map from register names to physical qubit indices.

use qlow_ir::{QubitId, qubit_range};
use rustc_hash::FxHashMap;

use crate::error::{InterpError, InterpResult};
use crate::identifier::{HARDWARE_QUBIT_SIGIL, Identifier, IndexLevel, SliceError};

/// Deepest qubit indexing supported: a register slice, then one element of it.
pub const MAX_QUBIT_INDEX_LEVELS: usize = 2;

/// Register names and the contiguous physical indices assigned to them.
///
/// Registers are never resized or renumbered, and the table has no scopes:
/// indices stay valid for the lifetime of the program.
#[derive(Debug, Clone, Default)]
pub struct QubitTable {
    registers: FxHashMap<String, Vec<QubitId>>,
    next: u32,
}

impl QubitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `count` fresh indices for register `name`.
    pub fn allocate(&mut self, name: &str, count: u32) -> InterpResult<&[QubitId]> {
        if self.registers.contains_key(name) {
            return Err(InterpError::Redeclaration(name.to_string()));
        }
        let next = self.next.checked_add(count).ok_or(InterpError::QubitLimitExceeded {
            requested: u64::from(self.next) + u64::from(count),
            limit: u32::MAX,
        })?;
        let qubits = qubit_range(self.next, count);
        self.next = next;
        Ok(self
            .registers
            .entry(name.to_string())
            .or_insert(qubits)
            .as_slice())
    }

    /// Number of indices handed out so far.
    pub fn num_qubits(&self) -> u32 {
        self.next
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registers.contains_key(name)
    }

    /// Indices of a whole register.
    pub fn get(&self, name: &str) -> InterpResult<&[QubitId]> {
        self.registers
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| InterpError::UndefinedName(name.to_string()))
    }

    /// Registers in allocation order.
    pub fn registers(&self) -> Vec<(&str, &[QubitId])> {
        let mut registers: Vec<_> = self
            .registers
            .iter()
            .map(|(name, qubits)| (name.as_str(), qubits.as_slice()))
            .collect();
        registers.sort_by_key(|(_, qubits)| qubits.first().copied());
        registers
    }

    /// Register holding `qubit` and its position within it.
    pub fn locate(&self, qubit: QubitId) -> Option<(&str, usize)> {
        self.registers.iter().find_map(|(name, qubits)| {
            let first = qubits.first()?;
            let offset = qubit.0.checked_sub(first.0)? as usize;
            (offset < qubits.len()).then_some((name.as_str(), offset))
        })
    }

    /// Physical index named by a hardware qubit such as `$3`.
    pub fn hardware_index(name: &str) -> Option<u32> {
        name.strip_prefix(HARDWARE_QUBIT_SIGIL)?.parse().ok()
    }

    fn base(&self, identifier: &Identifier) -> InterpResult<Vec<QubitId>> {
        let name = identifier.name();
        if identifier.is_hardware() {
            return Self::hardware_index(name)
                .map(|index| vec![QubitId(index)])
                .ok_or_else(|| InterpError::UndefinedName(name.to_string()));
        }
        Ok(self.get(name)?.to_vec())
    }

    fn check_depth(identifier: &Identifier) -> InterpResult<()> {
        let levels = identifier.levels().len();
        if levels > MAX_QUBIT_INDEX_LEVELS {
            return Err(InterpError::QubitDimensionality {
                name: identifier.name().to_string(),
                levels,
            });
        }
        Ok(())
    }

    /// Physical indices named by `identifier`, in selection order.
    ///
    /// The first index level applies to the register; a second level
    /// applies to the tuple the first produced.
    pub fn resolve(&self, identifier: &Identifier) -> InterpResult<Vec<QubitId>> {
        Self::check_depth(identifier)?;
        let mut qubits = self.base(identifier)?;
        for level in identifier.levels() {
            qubits = Self::select(identifier.name(), &qubits, level)?;
        }
        Ok(qubits)
    }

    /// Number of qubits `identifier` names, without gathering them.
    pub fn size_of(&self, identifier: &Identifier) -> InterpResult<usize> {
        Self::check_depth(identifier)?;
        let name = identifier.name();
        let mut len = if identifier.is_hardware() {
            self.base(identifier)?.len()
        } else {
            self.get(name)?.len()
        };
        for level in identifier.levels() {
            len = match level {
                IndexLevel::Range(range) => {
                    range.count(len).map_err(Self::index_error(name, len))?
                }
                other => other
                    .positions(len)
                    .map_err(Self::index_error(name, len))?
                    .len(),
            };
        }
        Ok(len)
    }

    /// Apply one index level to an already resolved tuple.
    pub fn select(name: &str, qubits: &[QubitId], level: &IndexLevel) -> InterpResult<Vec<QubitId>> {
        let positions = level
            .positions(qubits.len())
            .map_err(Self::index_error(name, qubits.len()))?;
        Ok(positions.into_iter().map(|p| qubits[p]).collect())
    }

    fn index_error(name: &str, size: usize) -> impl Fn(SliceError) -> InterpError + '_ {
        move |err| match err {
            SliceError::OutOfBounds(index) => InterpError::QubitIndexOutOfRange {
                register: name.to_string(),
                index,
                size,
            },
            SliceError::ZeroStep => InterpError::Evaluation(format!(
                "range step cannot be zero when indexing '{name}'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::SliceRange;

    fn table() -> QubitTable {
        let mut t = QubitTable::new();
        t.allocate("a", 2).unwrap();
        t.allocate("q", 5).unwrap();
        t
    }

    fn slice(start: i64, end: i64) -> IndexLevel {
        IndexLevel::Range(SliceRange::new(start, end))
    }

    fn ids(raw: &[u32]) -> Vec<QubitId> {
        raw.iter().copied().map(QubitId).collect()
    }

    #[test]
    fn test_contiguous_allocation() {
        let t = table();
        assert_eq!(t.get("a").unwrap(), ids(&[0, 1]).as_slice());
        assert_eq!(t.get("q").unwrap(), ids(&[2, 3, 4, 5, 6]).as_slice());
        assert_eq!(t.num_qubits(), 7);
        let names: Vec<_> = t.registers().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "q"]);
    }

    #[test]
    fn test_duplicate_register() {
        let mut t = table();
        assert!(matches!(t.allocate("q", 1), Err(InterpError::Redeclaration(_))));
        assert_eq!(t.num_qubits(), 7);
    }

    #[test]
    fn test_resolve_single_and_slice() {
        let t = table();
        let single = Identifier::indexed("q", vec![IndexLevel::Single(0)]);
        assert_eq!(t.resolve(&single).unwrap(), ids(&[2]));
        let range = Identifier::indexed("q", vec![slice(1, 3)]);
        assert_eq!(t.resolve(&range).unwrap(), ids(&[3, 4]));
        let set = Identifier::indexed("q", vec![IndexLevel::Set(vec![4, 0, 4])]);
        assert_eq!(t.resolve(&set).unwrap(), ids(&[6, 2, 6]));
    }

    #[test]
    fn test_resolve_negative_step() {
        let t = table();
        let reversed = Identifier::indexed(
            "q",
            vec![IndexLevel::Range(SliceRange {
                start: Some(4),
                end: Some(0),
                step: Some(-2),
            })],
        );
        assert_eq!(t.resolve(&reversed).unwrap(), ids(&[6, 4]));
    }

    #[test]
    fn test_resolve_two_levels() {
        let t = table();
        let id = Identifier::indexed("q", vec![slice(1, 4), IndexLevel::Single(2)]);
        assert_eq!(t.resolve(&id).unwrap(), ids(&[5]));
        assert_eq!(t.size_of(&id).unwrap(), 1);
    }

    #[test]
    fn test_too_many_levels() {
        let t = table();
        let id = Identifier::indexed(
            "q",
            vec![
                IndexLevel::Single(0),
                IndexLevel::Single(0),
                IndexLevel::Single(0),
            ],
        );
        assert!(matches!(
            t.resolve(&id),
            Err(InterpError::QubitDimensionality { levels: 3, .. })
        ));
    }

    #[test]
    fn test_out_of_range() {
        let t = table();
        let id = Identifier::indexed("q", vec![IndexLevel::Single(5)]);
        assert!(matches!(
            t.resolve(&id),
            Err(InterpError::QubitIndexOutOfRange { index: 5, size: 5, .. })
        ));
        let id = Identifier::indexed("q", vec![slice(3, 7)]);
        assert!(t.resolve(&id).is_err());
        assert!(t.size_of(&id).is_err());
    }

    #[test]
    fn test_locate() {
        let t = table();
        assert_eq!(t.locate(QubitId(1)), Some(("a", 1)));
        assert_eq!(t.locate(QubitId(4)), Some(("q", 2)));
        assert_eq!(t.locate(QubitId(7)), None);
    }

    #[test]
    fn test_hardware_bypasses_table() {
        let t = QubitTable::new();
        assert_eq!(t.resolve(&Identifier::plain("$7")).unwrap(), ids(&[7]));
        assert!(matches!(
            t.resolve(&Identifier::plain("$x")),
            Err(InterpError::UndefinedName(_))
        ));
        assert_eq!(QubitTable::hardware_index("q"), None);
    }

    #[test]
    fn test_size_of_matches_resolve() {
        let t = table();
        let cases = [
            Identifier::plain("q"),
            Identifier::indexed("q", vec![slice(0, 5)]),
            Identifier::indexed("q", vec![IndexLevel::Set(vec![1, 1])]),
            Identifier::indexed("q", vec![slice(0, 4), slice(1, 3)]),
        ];
        for id in cases {
            assert_eq!(t.size_of(&id).unwrap(), t.resolve(&id).unwrap().len());
        }
    }
}
