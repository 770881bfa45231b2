// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT

//! ALU delay insertion
//!
//! On GFX11+ the SIMD frontend doesn't switch to issuing instructions from a
//! different wave if there is an ALU stall.  `s_delay_alu` tells the frontend
//! that the next instruction depends on a recent ALU result, so it can switch
//! to another wave and come back once the dependency is resolved.
//!
//! This only matters for ALU->ALU dependencies.  Other instructions have
//! better integration with the frontend.
//!
//! Leaving out an `s_delay_alu` never breaks anything, the wave just stalls
//! in the ALU while the ALU does nothing else.  That is why the cycle model
//! doesn't have to be exact (wave64 VALU instructions, for instance, take a
//! different number of cycles depending on the exec mask).

use crate::api::{GetDebugFlags, DEBUG};
use crate::builder::Builder;
use crate::ir::*;
use crate::reg_tracker::SparseRegTracker;

use std::cmp::{max, min};
use std::collections::hash_map::Entry;
use std::fmt;

/// Pending ALU results of a single register, or the accumulated
/// requirements of one wait
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AluDelayInfo {
    /// How many VALU instructions ago this value was written
    pub valu_instrs: i8,
    /// Cycles until the writing VALU instruction is finished
    pub valu_cycles: i8,

    /// How many transcendental instructions ago this value was written
    pub trans_instrs: i8,
    /// Cycles until the writing transcendental instruction is finished
    pub trans_cycles: i8,

    /// Cycles until the writing SALU instruction is finished
    pub salu_cycles: i8,
}

impl AluDelayInfo {
    /// One past the largest representable VALU dependency.  Waiting for
    /// something further back than this would be a no-op.
    pub const VALU_NOP: i8 = 5;

    /// One past the largest representable transcendental dependency
    pub const TRANS_NOP: i8 = 4;

    pub const EMPTY: AluDelayInfo = AluDelayInfo {
        valu_instrs: AluDelayInfo::VALU_NOP,
        valu_cycles: 0,
        trans_instrs: AluDelayInfo::TRANS_NOP,
        trans_cycles: 0,
        salu_cycles: 0,
    };

    /// Merges `other` into `self`, keeping the stricter requirement of each.
    ///
    /// Returns true if `self` changed.
    pub fn combine(&mut self, other: &AluDelayInfo) -> bool {
        let changed = other.valu_instrs < self.valu_instrs
            || other.trans_instrs < self.trans_instrs
            || other.salu_cycles > self.salu_cycles
            || other.valu_cycles > self.valu_cycles
            || other.trans_cycles > self.trans_cycles;
        self.valu_instrs = min(self.valu_instrs, other.valu_instrs);
        self.trans_instrs = min(self.trans_instrs, other.trans_instrs);
        self.salu_cycles = max(self.salu_cycles, other.salu_cycles);
        self.valu_cycles = max(self.valu_cycles, other.valu_cycles);
        self.trans_cycles = max(self.trans_cycles, other.trans_cycles);
        changed
    }

    /// Needs to be called after any change to keep the data consistent.
    ///
    /// Returns true if the result is empty.
    pub fn fixup(&mut self) -> bool {
        if self.valu_instrs >= Self::VALU_NOP || self.valu_cycles <= 0 {
            self.valu_instrs = Self::VALU_NOP;
            self.valu_cycles = 0;
        }

        if self.trans_instrs >= Self::TRANS_NOP || self.trans_cycles <= 0 {
            self.trans_instrs = Self::TRANS_NOP;
            self.trans_cycles = 0;
        }

        self.salu_cycles = max(self.salu_cycles, 0);

        self.is_empty()
    }

    /// Returns true if a wait would be a no-op
    pub fn is_empty(&self) -> bool {
        self.valu_instrs == Self::VALU_NOP
            && self.trans_instrs == Self::TRANS_NOP
            && self.salu_cycles == 0
    }

    fn max_cycles(&self) -> i8 {
        max(self.salu_cycles, max(self.valu_cycles, self.trans_cycles))
    }

    /// Advances time by `cycles` and by one VALU and/or transcendental
    /// instruction
    fn advance(&mut self, is_valu: bool, is_trans: bool, cycles: i32) {
        fn sub_cycles(c: i8, cycles: i32) -> i8 {
            let c = (i32::from(c) - cycles)
                .clamp(i8::MIN.into(), i8::MAX.into());
            c as i8
        }

        if is_valu {
            self.valu_instrs = self.valu_instrs.saturating_add(1);
        }
        if is_trans {
            self.trans_instrs = self.trans_instrs.saturating_add(1);
        }
        self.salu_cycles = sub_cycles(self.salu_cycles, cycles);
        self.valu_cycles = sub_cycles(self.valu_cycles, cycles);
        self.trans_cycles = sub_cycles(self.trans_cycles, cycles);
    }
}

impl Default for AluDelayInfo {
    fn default() -> Self {
        AluDelayInfo::EMPTY
    }
}

impl fmt::Display for AluDelayInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if self.valu_instrs != Self::VALU_NOP {
            fields.push(format!("valu_instrs: {}", self.valu_instrs));
        }
        if self.valu_cycles != 0 {
            fields.push(format!("valu_cycles: {}", self.valu_cycles));
        }
        if self.trans_instrs != Self::TRANS_NOP {
            fields.push(format!("trans_instrs: {}", self.trans_instrs));
        }
        if self.trans_cycles != 0 {
            fields.push(format!("trans_cycles: {}", self.trans_cycles));
        }
        if self.salu_cycles != 0 {
            fields.push(format!("salu_cycles: {}", self.salu_cycles));
        }
        write!(f, "{{ {} }}", fields.join(", "))
    }
}

/// Pending ALU results per register
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DelayCtx {
    gpr_map: SparseRegTracker<AluDelayInfo>,
}

impl DelayCtx {
    pub fn new() -> DelayCtx {
        Default::default()
    }

    pub fn lookup(&self, reg: PhysReg) -> Option<&AluDelayInfo> {
        self.gpr_map.get(reg)
    }

    pub fn len(&self) -> usize {
        self.gpr_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gpr_map.is_empty()
    }

    /// Records a pending write of `reg`, combining with whatever is already
    /// pending for it
    pub fn insert(&mut self, reg: PhysReg, delay: &AluDelayInfo) {
        match self.gpr_map.entry(reg) {
            Entry::Occupied(mut e) => {
                e.get_mut().combine(delay);
            }
            Entry::Vacant(e) => {
                e.insert(*delay);
            }
        }
    }

    /// Joins the state of a control-flow predecessor into this one.
    ///
    /// Returns true if anything changed.
    pub fn join(&mut self, other: &DelayCtx) -> bool {
        self.gpr_map
            .merge_with(&other.gpr_map, |entry, other| entry.combine(other))
    }

    /// Advances every tracked register by `cycles` and by one VALU and/or
    /// transcendental instruction, dropping registers which no longer need a
    /// wait.
    pub fn apply_cycles(&mut self, is_valu: bool, is_trans: bool, cycles: i32) {
        self.gpr_map.retain(|entry| {
            entry.advance(is_valu, is_trans, cycles);
            !entry.fixup()
        });
    }

    pub fn clear(&mut self) {
        self.gpr_map.clear();
    }
}

impl fmt::Display for DelayCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.gpr_map.iter().collect();
        entries.sort_by_key(|(reg, _)| **reg);
        for (reg, delay) in entries {
            writeln!(f, "gpr_map[{reg}] = {delay}")?;
        }
        Ok(())
    }
}

/// Bookkeeping for revisiting loops until the block states converge.
///
/// Blocks are walked in layout order.  Whenever a block is (re)processed the
/// progress is raised to its loop depth.  When we reach a loop exit with the
/// progress still at the depth of the loop, something inside the loop changed
/// since we last entered its header and we have to go around again.
#[derive(Default)]
pub struct LoopTracker {
    header_indices: Vec<usize>,
    progress: usize,
}

impl LoopTracker {
    pub fn new() -> LoopTracker {
        Default::default()
    }

    pub fn depth(&self) -> usize {
        self.header_indices.len()
    }

    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn enter_header(&mut self, block_idx: usize) {
        self.header_indices.push(block_idx);
    }

    /// Called on a loop exit.  Returns the header of the loop being left if
    /// it needs to be revisited.
    pub fn leave_loop(&mut self) -> Option<usize> {
        let depth = self.depth();
        let Some(header) = self.header_indices.pop() else {
            panic!("Loop exit without a matching loop header");
        };
        let repeat = self.progress == depth;
        self.progress = min(self.progress, self.depth());
        repeat.then_some(header)
    }

    /// Called whenever a block is (re)processed
    pub fn block_processed(&mut self, loop_nest_depth: u32) {
        self.progress = max(self.progress, loop_nest_depth as usize);
    }
}

fn clamp_cycles(cycles: u8) -> i8 {
    i8::try_from(cycles).unwrap_or(i8::MAX)
}

/// Accumulates the requirements of every register read by `instr`
fn check_alu(ctx: &DelayCtx, delay: &mut AluDelayInfo, instr: &Instr) {
    ctx.gpr_map.for_each_operand_unit(instr, |entry| {
        delay.combine(entry);
    });
}

/// If `instr` is an existing `s_delay_alu`, decodes it into `delay`.
///
/// Returns true if it was one.
fn parse_delay_alu(delay: &mut AluDelayInfo, instr: &Instr) -> bool {
    if !instr.is_delay_alu() {
        return false;
    }

    let valu_dep_1 = AluDelayWait::ValuDep1 as u32;
    let valu_dep_4 = AluDelayWait::ValuDep4 as u32;
    let trans_dep_1 = AluDelayWait::Trans32Dep1 as u32;
    let trans_dep_3 = AluDelayWait::Trans32Dep3 as u32;
    let salu_cycle_1 = AluDelayWait::SaluCycle1 as u32;

    let imm = [
        delay_alu_imm::instid0(instr.imm),
        delay_alu_imm::instid1(instr.imm),
    ];
    for wait in imm {
        if (valu_dep_1..=valu_dep_4).contains(&wait) {
            delay.valu_instrs = (wait - valu_dep_1 + 1) as i8;
        } else if (trans_dep_1..=trans_dep_3).contains(&wait) {
            delay.trans_instrs = (wait - trans_dep_1 + 1) as i8;
        } else if wait >= salu_cycle_1 {
            delay.salu_cycles = (wait - salu_cycle_1 + 1) as i8;
        }
    }

    delay.valu_cycles = (instr.pass_flags & 0xffff) as i8;
    delay.trans_cycles = (instr.pass_flags >> 16) as i8;

    true
}

/// Appends an `s_delay_alu` encoding `delay` and resets `delay`
fn emit_delay_alu(instrs: &mut Vec<Box<Instr>>, delay: &mut AluDelayInfo) {
    debug_assert!(delay.valu_instrs >= 0 && delay.trans_instrs >= 0);
    debug_assert!(delay.valu_cycles >= 0 && delay.trans_cycles >= 0);

    let mut imm = 0_u32;
    if delay.trans_instrs != AluDelayInfo::TRANS_NOP {
        imm |= AluDelayWait::Trans32Dep1 as u32 + delay.trans_instrs as u32
            - 1;
    }

    if delay.valu_instrs != AluDelayInfo::VALU_NOP {
        let shift = if imm != 0 {
            delay_alu_imm::INSTID1_SHIFT
        } else {
            0
        };
        imm |= (AluDelayWait::ValuDep1 as u32 + delay.valu_instrs as u32 - 1)
            << shift;
    }

    // There are only two wait slots so if all three are needed, the SALU one
    // gets dropped.  Getting this wrong only costs an ALU stall.
    if delay.salu_cycles != 0 && imm <= delay_alu_imm::INSTID0_MASK {
        let shift = if imm != 0 {
            delay_alu_imm::INSTID1_SHIFT
        } else {
            0
        };
        let cycles = min(3, delay.salu_cycles) as u32;
        imm |= (AluDelayWait::SaluCycle1 as u32 + cycles - 1) << shift;
    }

    let mut b = Builder::new(instrs);
    let instr = b.sopp(Opcode::SDelayAlu, imm);
    instr.pass_flags =
        (delay.valu_cycles as u32) | ((delay.trans_cycles as u32) << 16);

    *delay = AluDelayInfo::default();
}

struct AluDelayPass<'a> {
    sm: &'a dyn ShaderModel,
    wave_size: u8,
    num_emitted: usize,
}

impl<'a> AluDelayPass<'a> {
    fn new(sm: &'a dyn ShaderModel, wave_size: u8) -> AluDelayPass<'a> {
        AluDelayPass {
            sm,
            wave_size,
            num_emitted: 0,
        }
    }

    /// Folds the requirements of `instr` into `delay` and retires everything
    /// the resulting wait covers
    fn kill_alu(
        &self,
        delay: &mut AluDelayInfo,
        instr: &Instr,
        ctx: &mut DelayCtx,
    ) {
        if instr.is_valu() || instr.is_salu() {
            check_alu(ctx, delay, instr);
        }

        if !delay.is_empty() {
            ctx.apply_cycles(false, false, delay.max_cycles().into());

            // Anything written at least as long ago as what we wait for is
            // also covered by the wait
            ctx.gpr_map.retain(|entry| {
                if delay.valu_instrs <= entry.valu_instrs {
                    entry.valu_instrs = AluDelayInfo::VALU_NOP;
                }
                if delay.trans_instrs <= entry.trans_instrs {
                    entry.trans_instrs = AluDelayInfo::TRANS_NOP;
                }
                !entry.fixup()
            });
        }
    }

    /// Records the results produced by `instr` and lets its issue cycles pass
    fn gen_alu(&self, instr: &Instr, ctx: &mut DelayCtx) {
        if instr.is_exp()
            || instr.is_ds()
            || instr.is_mimg()
            || instr.is_flat_like()
            || instr.is_mubuf()
            || instr.is_mtbuf()
        {
            ctx.clear();
            return;
        }

        let cycle_info = self.sm.cycle_info(instr, self.wave_size);
        let is_valu = instr.is_valu();
        let is_trans = instr.is_trans();

        if is_trans || is_valu || instr.is_salu() {
            let mut delay = AluDelayInfo::default();
            let latency = clamp_cycles(cycle_info.latency);
            if is_trans {
                delay.trans_instrs = 0;
                delay.trans_cycles = latency;
            } else if is_valu {
                delay.valu_instrs = 0;
                delay.valu_cycles = latency;
            } else {
                delay.salu_cycles = latency;
            }

            ctx.gpr_map.for_each_def_unit_mut(instr, |e| match e {
                Entry::Occupied(mut e) => {
                    e.get_mut().combine(&delay);
                }
                Entry::Vacant(e) => {
                    e.insert(delay);
                }
            });
        }

        // WMMA doesn't count as a VALU instruction for the dependency
        // counters of other registers
        ctx.apply_cycles(
            is_valu && !instr.is_wmma(),
            is_trans,
            cycle_info.issue_cycles.into(),
        );
    }

    fn handle_block(&mut self, block: &mut Block, ctx: &mut DelayCtx) {
        let old_instrs = block.replace_instrs(Vec::new());
        let mut new_instrs = Vec::with_capacity(old_instrs.len());
        let mut queued_delay = AluDelayInfo::default();

        for instr in old_instrs {
            let is_delay_alu = parse_delay_alu(&mut queued_delay, &instr);

            self.kill_alu(&mut queued_delay, &instr, ctx);
            self.gen_alu(&instr, ctx);

            // An existing s_delay_alu is dropped here.  Its requirements live
            // on in queued_delay and get re-emitted before the next
            // instruction.
            if !is_delay_alu {
                if !queued_delay.is_empty() {
                    emit_delay_alu(&mut new_instrs, &mut queued_delay);
                    self.num_emitted += 1;
                }
                new_instrs.push(instr);
            }
        }

        if !queued_delay.is_empty() {
            emit_delay_alu(&mut new_instrs, &mut queued_delay);
            self.num_emitted += 1;
        }

        block.replace_instrs(new_instrs);
    }
}

/// Per-block results of delay insertion
pub struct DelayAluState {
    pub in_ctx: Vec<DelayCtx>,
    pub out_ctx: Vec<DelayCtx>,
    pub block_visits: usize,
    pub num_emitted: usize,
}

fn run_delay_alu(program: &mut Program) -> DelayAluState {
    let num_blocks = program.blocks.len();
    let mut pass = AluDelayPass::new(program.sm, program.wave_size);

    let mut done = vec![false; num_blocks];
    let mut in_ctx: Vec<DelayCtx> =
        (0..num_blocks).map(|_| DelayCtx::new()).collect();
    let mut out_ctx: Vec<DelayCtx> =
        (0..num_blocks).map(|_| DelayCtx::new()).collect();

    let mut loops = LoopTracker::new();
    let mut block_visits = 0;

    let mut i = 0;
    while i < num_blocks {
        let block = &mut program.blocks[i];
        debug_assert_eq!(block.index, i);
        i += 1;

        if block.is_discard_early_exit() {
            // The jump to the discard early exit block may happen anywhere in
            // a block, so its predecessors can't be joined this way.
            continue;
        }

        let mut ctx = in_ctx[block.index].clone();

        if block.is_loop_header() {
            loops.enter_header(block.index);
        } else if block.is_loop_exit() {
            if let Some(header) = loops.leave_loop() {
                log::trace!(
                    "BB{}: revisiting loop header BB{header}",
                    block.index
                );
                i = header;
                continue;
            }
        }

        let mut changed = false;
        for &pred in &block.linear_preds {
            changed |= ctx.join(&out_ctx[pred]);
        }

        if done[block.index] && !changed {
            in_ctx[block.index] = ctx;
            continue;
        }
        in_ctx[block.index] = ctx.clone();

        let revisit = done[block.index];
        loops.block_processed(block.loop_nest_depth);
        done[block.index] = true;
        block_visits += 1;

        let num_in = ctx.len();
        pass.handle_block(block, &mut ctx);

        log::trace!(
            "BB{}{}: {num_in} pending registers in, {} out",
            block.index,
            if revisit { " (revisited)" } else { "" },
            ctx.len()
        );

        out_ctx[block.index] = ctx;
    }

    DelayAluState {
        in_ctx,
        out_ctx,
        block_visits,
        num_emitted: pass.num_emitted,
    }
}

impl Program<'_> {
    /// Inserts `s_delay_alu` in front of every ALU instruction that reads
    /// the result of a recent ALU instruction which may not be ready yet.
    pub fn insert_delay_alu(&mut self) -> DelayAluState {
        let state = run_delay_alu(self);
        log::debug!(
            "insert_delay_alu: {} block visits for {} blocks, {} s_delay_alu",
            state.block_visits,
            self.blocks.len(),
            state.num_emitted
        );
        state
    }

    /// Merges pairs of `s_delay_alu` with a single wait each using the
    /// `instskip` field.
    ///
    /// Returns the number of instructions removed.
    pub fn combine_delay_alu(&mut self) -> usize {
        let mut num_merged = 0;
        for block in &mut self.blocks {
            let mut i = 0;
            let mut prev_delay_alu: Option<usize> = None;
            for j in 0..block.instrs.len() {
                if !block.instrs[j].is_delay_alu() {
                    block.instrs.swap(i, j);
                    i += 1;
                    continue;
                }

                let imm = block.instrs[j].imm;
                let has_instid1 = imm >> delay_alu_imm::INSTID1_SHIFT != 0;
                let prev = prev_delay_alu.filter(|prev| i - prev - 1 < 6);

                match prev {
                    Some(prev) if !has_instid1 => {
                        let skip = (i - prev - 1) as u32;
                        block.instrs[prev].imm |= (skip
                            << delay_alu_imm::INSTSKIP_SHIFT)
                            | (imm << delay_alu_imm::INSTID1_SHIFT);
                        prev_delay_alu = None;
                        num_merged += 1;
                    }
                    _ => {
                        if !has_instid1 {
                            prev_delay_alu = Some(i);
                        }
                        block.instrs.swap(i, j);
                        i += 1;
                    }
                }
            }
            block.truncate_instrs(i);
        }

        log::debug!("combine_delay_alu: merged {num_merged} s_delay_alu");
        num_merged
    }

    /// Runs delay insertion and compaction as configured by `ACO_DEBUG`.
    ///
    /// Programs for hardware without `s_delay_alu` are left untouched.
    pub fn schedule_delay_alu(&mut self) {
        if !self.gfx_level().has_delay_alu() || DEBUG.no_delay() {
            return;
        }

        if DEBUG.validate() {
            if let Err(e) = self.validate_delay_alu() {
                panic!("Invalid program before delay insertion: {e}");
            }
        }

        self.insert_delay_alu();
        if !DEBUG.no_combine() {
            self.combine_delay_alu();
        }

        if DEBUG.validate() {
            if let Err(e) = self.validate_delay_alu() {
                panic!("Invalid program after delay insertion: {e}");
            }
        }

        if DEBUG.print() {
            eprintln!("After delay ALU insertion:\n{self}");
        }
    }
}
