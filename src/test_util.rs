// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT

use crate::builder::Builder;
use crate::insert_delay_alu::DelayAluState;
use crate::ir::*;

use std::collections::BTreeMap;

/// A shader model where every VALU instruction has the same cost
pub struct FixedModel {
    gfx_level: GfxLevel,
    valu: CycleInfo,
}

impl FixedModel {
    pub fn new(latency: u8, issue_cycles: u8) -> FixedModel {
        FixedModel::with_gfx_level(GfxLevel::GFX11, latency, issue_cycles)
    }

    pub fn with_gfx_level(
        gfx_level: GfxLevel,
        latency: u8,
        issue_cycles: u8,
    ) -> FixedModel {
        FixedModel {
            gfx_level,
            valu: CycleInfo {
                latency,
                issue_cycles,
            },
        }
    }
}

impl ShaderModel for FixedModel {
    fn gfx_level(&self) -> GfxLevel {
        self.gfx_level
    }

    fn cycle_info(&self, instr: &Instr, _wave_size: u8) -> CycleInfo {
        if instr.is_valu() {
            return self.valu;
        }

        let (latency, issue_cycles) = match instr.class() {
            InstrClass::Salu => (2, 1),
            InstrClass::Waitcnt | InstrClass::Other => (0, 0),
            _ => (0, 1),
        };
        CycleInfo {
            latency,
            issue_cycles,
        }
    }
}

pub fn vgpr(idx: u16) -> RegRef {
    RegRef::vgpr(idx, 1)
}

pub fn sgpr(idx: u16) -> RegRef {
    RegRef::sgpr(idx, 1)
}

/// Appends a 32-bit VALU instruction writing `v{def}` from the given VGPRs
pub fn valu(p: &mut Program, block: usize, def: u16, srcs: &[u16]) {
    let mut b = Builder::at_block(&mut p.blocks[block]);
    match *srcs {
        [a] => {
            b.vop1(Opcode::VMovB32, vgpr(def), vgpr(a));
        }
        [a, c] => {
            b.vop2(Opcode::VAddF32, vgpr(def), vgpr(a), vgpr(c));
        }
        _ => panic!("Unsupported number of sources: {}", srcs.len()),
    }
}

pub fn logical_start(p: &mut Program, block: usize) {
    Builder::at_block(&mut p.blocks[block]).pseudo(
        Opcode::PLogicalStart,
        &[],
        &[],
    );
}

/// Asserts that joining any predecessor's final state into a block's final
/// incoming state doesn't change it anymore
pub fn assert_fixed_point(p: &Program, state: &DelayAluState) {
    for block in &p.blocks {
        if block.is_discard_early_exit() {
            continue;
        }

        for &pred in &block.linear_preds {
            let mut ctx = state.in_ctx[block.index].clone();
            assert!(
                !ctx.join(&state.out_ctx[pred]),
                "BB{} is missing state from BB{pred}:\n{}",
                block.index,
                state.out_ctx[pred]
            );
        }
    }
}

/// Decodes every `s_delay_alu` in `instrs` and returns the waits applied to
/// each non-delay instruction, keyed by its position among those.
pub fn waits_per_instr(instrs: &[Box<Instr>]) -> BTreeMap<usize, Vec<u32>> {
    let mut ordinals = Vec::with_capacity(instrs.len());
    let mut n = 0;
    for instr in instrs {
        if instr.is_delay_alu() {
            ordinals.push(None);
        } else {
            ordinals.push(Some(n));
            n += 1;
        }
    }

    let target = |ip: usize| -> usize {
        match ordinals.get(ip) {
            Some(Some(n)) => *n,
            _ => panic!("s_delay_alu targets something other than an ALU op"),
        }
    };

    let mut waits: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
    for (ip, instr) in instrs.iter().enumerate() {
        if !instr.is_delay_alu() {
            continue;
        }

        let id0 = delay_alu_imm::instid0(instr.imm);
        if id0 != 0 {
            waits.entry(target(ip + 1)).or_default().push(id0);
        }

        let id1 = delay_alu_imm::instid1(instr.imm);
        if id1 != 0 {
            let skip = delay_alu_imm::instskip(instr.imm) as usize;
            waits.entry(target(ip + 1 + skip)).or_default().push(id1);
        }
    }

    for w in waits.values_mut() {
        w.sort();
    }
    waits
}
