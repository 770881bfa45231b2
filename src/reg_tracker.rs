// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT

use crate::ir::*;

use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Sparse per-register state.
///
/// Only registers with interesting state are stored, which after register
/// allocation is usually a handful of recently written registers rather than
/// the whole register file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SparseRegTracker<T> {
    regs: FxHashMap<PhysReg, T>,
}

impl<T> Default for SparseRegTracker<T> {
    fn default() -> Self {
        SparseRegTracker {
            regs: Default::default(),
        }
    }
}

impl<T> SparseRegTracker<T> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, reg: PhysReg) -> Option<&T> {
        self.regs.get(&reg)
    }

    pub fn entry(&mut self, reg: PhysReg) -> Entry<'_, PhysReg, T> {
        self.regs.entry(reg)
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    pub fn clear(&mut self) {
        self.regs.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PhysReg, &T)> {
        self.regs.iter()
    }

    pub fn retain(&mut self, mut f: impl FnMut(&mut T) -> bool) {
        self.regs.retain(|_k, v| f(v));
    }

    /// Merges `other` into `self`.  Registers missing from `self` are copied
    /// over, the rest are combined with `f`.
    ///
    /// Returns true if anything changed.  Inserting a register always counts
    /// as a change, otherwise it's whatever `f` reports.
    pub fn merge_with(
        &mut self,
        other: &Self,
        mut f: impl FnMut(&mut T, &T) -> bool,
    ) -> bool
    where
        T: Clone,
    {
        let mut changed = false;
        for (k, v) in other.regs.iter() {
            match self.regs.entry(*k) {
                Entry::Occupied(mut occupied_entry) => {
                    changed |= f(occupied_entry.get_mut(), v);
                }
                Entry::Vacant(vacant_entry) => {
                    vacant_entry.insert(v.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Calls `f` with the tracked state of every register unit read by
    /// `instr`.  Constants, undefs and untracked registers are skipped.
    pub fn for_each_operand_unit(&self, instr: &Instr, mut f: impl FnMut(&T)) {
        for op in instr.operands.iter() {
            if op.is_constant() || op.is_undefined() {
                continue;
            }

            let Some(reg) = op.as_reg() else {
                continue;
            };

            // Consecutively read registers
            for unit in reg.units() {
                if let Some(t) = self.regs.get(&unit) {
                    f(t);
                }
            }
        }
    }

    /// Calls `f` for every register unit written by `instr`, creating a
    /// default entry for any register which is not tracked yet.
    pub fn for_each_def_unit_mut(
        &mut self,
        instr: &Instr,
        mut f: impl FnMut(Entry<'_, PhysReg, T>),
    ) {
        for def in instr.defs.iter() {
            for unit in def.units() {
                f(self.regs.entry(unit));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_with() {
        let mut a = SparseRegTracker::<u32>::new();
        let mut b = SparseRegTracker::<u32>::new();
        *a.entry(PhysReg::vgpr(0)).or_default() = 3;
        *b.entry(PhysReg::vgpr(0)).or_default() = 5;
        *b.entry(PhysReg::sgpr(4)).or_default() = 1;

        let max = |x: &mut u32, y: &u32| {
            let changed = *y > *x;
            *x = (*x).max(*y);
            changed
        };

        assert!(a.merge_with(&b, max));
        assert_eq!(a.get(PhysReg::vgpr(0)), Some(&5));
        assert_eq!(a.get(PhysReg::sgpr(4)), Some(&1));

        // Merging the same thing again is a no-op
        assert!(!a.merge_with(&b, max));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_operand_units() {
        let mut t = SparseRegTracker::<u32>::new();
        *t.entry(PhysReg::vgpr(1)).or_default() = 1;
        *t.entry(PhysReg::vgpr(3)).or_default() = 3;
        *t.entry(PhysReg::sgpr(0)).or_default() = 100;

        let instr = Instr::new(
            Opcode::VAddF64,
            [RegRef::vgpr(8, 2)],
            [
                RegRef::vgpr(0, 2).into(),
                RegRef::vgpr(2, 2).into(),
                Operand::Const(0),
                Operand::Undef,
            ],
        );

        let mut seen = Vec::new();
        t.for_each_operand_unit(&instr, |x| seen.push(*x));
        assert_eq!(seen, [1, 3]);
    }

    #[test]
    fn test_def_units() {
        let mut t = SparseRegTracker::<u32>::new();
        let instr = Instr::new(
            Opcode::SLoadDwordx4,
            [RegRef::sgpr(4, 4)],
            [RegRef::sgpr(0, 2).into()],
        );
        t.for_each_def_unit_mut(&instr, |e| *e.or_default() += 1);
        assert_eq!(t.len(), 4);
        assert_eq!(t.get(PhysReg::sgpr(7)), Some(&1));
        assert_eq!(t.get(PhysReg::sgpr(0)), None);
    }
}
