//! Resolution of `TypeDef` member runs.
//!
//! `TypeDef.FieldList` and `TypeDef.MethodList` name the first row of a contiguous run that
//! ends where the next type's run starts. When a `FieldPtr`/`MethodPtr` table is present the
//! runs address that table, and each entry names the physical row.

use log::{debug, warn};

use crate::metadata::{token::Token, typesystem::Slot};

/// The declarations of one member table, handed out to the types that own them.
pub(super) struct MemberPool<T> {
    kind: &'static str,
    entries: Vec<Option<T>>,
    indirection: Option<Vec<u32>>,
}

impl<T> MemberPool<T> {
    /// Create a pool over `entries` (one per physical row), optionally addressed through an
    /// indirection table.
    pub(super) fn new(kind: &'static str, entries: Vec<T>, indirection: Option<Vec<u32>>) -> Self {
        MemberPool {
            kind,
            entries: entries.into_iter().map(Some).collect(),
            indirection,
        }
    }

    /// Number of positions a member list can address.
    pub(super) fn logical_len(&self) -> u32 {
        let len = match &self.indirection {
            Some(map) => map.len(),
            None => self.entries.len(),
        };
        u32::try_from(len).unwrap_or(u32::MAX)
    }

    /// The position just past the last one, where the run of the last type ends.
    pub(super) fn end(&self) -> u32 {
        self.logical_len().saturating_add(1)
    }

    /// Hand the run `start..end` to `owner`.
    ///
    /// Entries that resolve to no row, or to a row another run already took, come back as
    /// [`Slot::Absent`]. A run reaching past the table yields one trailing [`Slot::Absent`].
    pub(super) fn claim_run(&mut self, owner: Token, start: u32, end: u32) -> Vec<Slot<T>> {
        if start == 0 || end < start {
            if end != start {
                warn!(
                    "{owner}: invalid {} list {start}..{end}, treated as empty",
                    self.kind
                );
            }
            return Vec::new();
        }

        let past_table = self.end();
        let mut slots: Vec<Slot<T>> = (start..end.min(past_table))
            .map(|position| self.claim(owner, position))
            .collect();

        if end > past_table {
            warn!(
                "{owner}: {} list {start}..{end} runs past the last row {}",
                self.kind,
                past_table - 1
            );
            slots.push(Slot::Absent);
        }

        slots
    }

    fn claim(&mut self, owner: Token, position: u32) -> Slot<T> {
        let row = match &self.indirection {
            Some(map) => map.get(position as usize - 1).copied().unwrap_or(0),
            None => position,
        };

        if row == 0 || row as usize > self.entries.len() {
            warn!(
                "{owner}: {} entry {position} points to missing row {row}",
                self.kind
            );
            return Slot::Absent;
        }

        match self.entries[row as usize - 1].take() {
            Some(declaration) => Slot::Present(declaration),
            None => {
                warn!(
                    "{owner}: {} row {row} already belongs to another type",
                    self.kind
                );
                Slot::Absent
            }
        }
    }

    /// Log and return the number of declarations no type claimed.
    pub(super) fn report_unclaimed(&self) -> usize {
        let count = self.entries.iter().filter(|entry| entry.is_some()).count();
        if count != 0 {
            debug!("{count} {} rows belong to no type", self.kind);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::TableId;

    fn owner() -> Token {
        Token::from_parts(TableId::TypeDef, 1)
    }

    fn present(slots: &[Slot<u32>]) -> Vec<Option<u32>> {
        slots.iter().map(|slot| slot.as_ref().copied()).collect()
    }

    #[test]
    fn direct_runs() {
        let mut pool = MemberPool::new("field", vec![10, 20, 30], None);
        assert_eq!(pool.end(), 4);

        let first = pool.claim_run(owner(), 1, 3);
        let second = pool.claim_run(owner(), 3, pool.end());
        let empty = pool.claim_run(owner(), 4, 4);

        assert_eq!(present(&first), vec![Some(10), Some(20)]);
        assert_eq!(present(&second), vec![Some(30)]);
        assert!(empty.is_empty());
        assert_eq!(pool.report_unclaimed(), 0);
    }

    #[test]
    fn indirect_runs() {
        // logical order 3, 1, dangling, 2
        let mut pool = MemberPool::new("method", vec![10, 20, 30], Some(vec![3, 1, 0, 2]));
        assert_eq!(pool.logical_len(), 4);

        let slots = pool.claim_run(owner(), 1, pool.end());
        assert_eq!(present(&slots), vec![Some(30), Some(10), None, Some(20)]);
    }

    #[test]
    fn duplicate_claim_is_absent() {
        let mut pool = MemberPool::new("field", vec![10, 20], Some(vec![1, 1, 2]));

        let slots = pool.claim_run(owner(), 1, pool.end());
        assert_eq!(present(&slots), vec![Some(10), None, Some(20)]);
    }

    #[test]
    fn run_past_table() {
        let mut pool = MemberPool::new("field", vec![10, 20], None);

        let slots = pool.claim_run(owner(), 2, 9);
        assert_eq!(present(&slots), vec![Some(20), None]);
        assert_eq!(pool.report_unclaimed(), 1);
    }

    #[test]
    fn inverted_run_is_empty() {
        let mut pool = MemberPool::new("field", vec![10, 20], None);

        assert!(pool.claim_run(owner(), 3, 2).is_empty());
        assert!(pool.claim_run(owner(), 0, 2).is_empty());
        assert_eq!(pool.report_unclaimed(), 2);
    }
}
