// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT
use crate::builder::Builder;
use crate::ir::*;
use crate::test_util::*;

#[test]
fn test_reg_ref_units() {
    let reg = RegRef::vgpr(4, 3);
    let units: Vec<_> = reg.units().collect();
    assert_eq!(
        units,
        [PhysReg::vgpr(4), PhysReg::vgpr(5), PhysReg::vgpr(6)]
    );
    assert_eq!(reg.idx_range(), 260..263);
    assert!(PhysReg::sgpr(255) < PhysReg::vgpr(0));
}

#[test]
fn test_reg_display() {
    assert_eq!(PhysReg::sgpr(3).to_string(), "s3");
    assert_eq!(PhysReg::vgpr(3).to_string(), "v3");
    assert_eq!(RegRef::vgpr(1, 2).to_string(), "v[1:2]");
    assert_eq!(RegRef::sgpr(4, 4).to_string(), "s[4:7]");
    assert_eq!(Operand::Const(0x1234).to_string(), "0x1234");
}

#[test]
fn test_delay_alu_display() {
    let d = Instr::new_sopp(Opcode::SDelayAlu, 0x9 | (5 << 4) | (0x2 << 7));
    assert_eq!(
        d.to_string(),
        "s_delay_alu instid0(SALU_CYCLE_1) | instskip(SKIP_4) \
         | instid1(VALU_DEP_2)"
    );

    let d = Instr::new_sopp(Opcode::SDelayAlu, 0x7);
    assert_eq!(d.to_string(), "s_delay_alu instid0(TRANS32_DEP_3)");
}

#[test]
fn test_instr_display() {
    let instr = Instr::new(
        Opcode::VAddF32,
        [vgpr(0)],
        [vgpr(1).into(), Operand::Const(2)],
    );
    assert_eq!(instr.to_string(), "v0 = v_add_f32 v1, 2");

    let instr = Instr::new_sopp(Opcode::SWaitcnt, 0);
    assert_eq!(instr.to_string(), "s_waitcnt imm:0");
}

#[test]
fn test_instr_predicates() {
    let instr = |op| Instr::new(op, Vec::new(), Vec::new());

    assert!(instr(Opcode::VRcpF32).is_valu());
    assert!(instr(Opcode::VRcpF32).is_trans());
    assert!(!instr(Opcode::VAddF32).is_trans());
    assert!(instr(Opcode::VWmmaF32_16x16x16F16).is_wmma());
    assert!(instr(Opcode::SDelayAlu).is_salu());
    assert!(instr(Opcode::SCmpEqU32).is_salu());
    assert!(!instr(Opcode::SLoadDword).is_salu());
    assert!(instr(Opcode::ScratchLoadDword).is_flat_like());
    assert!(instr(Opcode::GlobalStoreDword).is_flat_like());
}

#[test]
fn test_block_kind_display() {
    let kind = BlockKind::LOOP_HEADER | BlockKind::TOP_LEVEL;
    assert_eq!(kind.to_string(), "top-level, loop-header");
    assert!(BlockKind::NONE.is_empty());
}

#[test]
fn test_program_display() {
    let sm = FixedModel::new(5, 1);
    let mut p = Program::new(&sm, 32);
    let b0 = p.create_block(BlockKind::TOP_LEVEL, 0);
    let b1 = p.create_block(BlockKind::LOOP_EXIT, 0);
    p.add_linear_edge(b0, b1);
    Builder::at_block(&mut p.blocks[b1]).sopp(Opcode::SDelayAlu, 1);

    assert_eq!(
        p.to_string(),
        "BB0 /* top-level */\n\
         BB1 /* preds: BB0 */ /* loop-exit */\n\
         \ts_delay_alu instid0(VALU_DEP_1)\n"
    );
    assert_eq!(p.num_instrs(), 1);
}
