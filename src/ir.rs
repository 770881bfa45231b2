// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT

//! Post-RA ACO IR
//!
//! This is the part of the IR the delay passes operate on: instructions which
//! have been assigned physical registers, grouped into blocks which carry the
//! linear CFG edges and loop structure computed earlier in the pipeline.

pub use crate::cycle_info::{CycleInfo, GfxLevel, ShaderModel};

use std::fmt;
use std::ops::{BitOr, BitOrAssign, Range};

/// First VGPR in the physical register numbering.  SGPRs (and the special
/// scalar registers like vcc or exec) live below this.
pub const VGPR_BASE: u16 = 256;

/// One past the last addressable physical register.
pub const NUM_PHYS_REGS: u16 = 512;

/// A single dword-sized physical register
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PhysReg(u16);

impl PhysReg {
    pub fn new(reg: u16) -> PhysReg {
        assert!(reg < NUM_PHYS_REGS);
        PhysReg(reg)
    }

    pub fn sgpr(idx: u16) -> PhysReg {
        assert!(idx < VGPR_BASE);
        PhysReg(idx)
    }

    pub fn vgpr(idx: u16) -> PhysReg {
        assert!(idx < NUM_PHYS_REGS - VGPR_BASE);
        PhysReg(VGPR_BASE + idx)
    }

    pub fn reg(&self) -> u16 {
        self.0
    }

    pub fn is_vgpr(&self) -> bool {
        self.0 >= VGPR_BASE
    }

    /// Returns the register `units` dwords after this one
    pub fn advance(&self, units: u16) -> PhysReg {
        PhysReg::new(self.0 + units)
    }
}

impl fmt::Display for PhysReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_vgpr() {
            write!(f, "v{}", self.0 - VGPR_BASE)
        } else {
            write!(f, "s{}", self.0)
        }
    }
}

/// A contiguous range of dword registers
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RegRef {
    base: PhysReg,
    size: u8,
}

impl RegRef {
    pub fn new(base: PhysReg, size: u8) -> RegRef {
        assert!(size > 0);
        RegRef { base, size }
    }

    pub fn sgpr(idx: u16, size: u8) -> RegRef {
        RegRef::new(PhysReg::sgpr(idx), size)
    }

    pub fn vgpr(idx: u16, size: u8) -> RegRef {
        RegRef::new(PhysReg::vgpr(idx), size)
    }

    pub fn base(&self) -> PhysReg {
        self.base
    }

    /// Number of dword units covered by this range
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Raw register numbers covered.  This may extend past
    /// [NUM_PHYS_REGS] on malformed input, which the validator reports.
    pub fn idx_range(&self) -> Range<u32> {
        let start = u32::from(self.base.reg());
        start..(start + u32::from(self.size))
    }

    pub fn unit(&self, i: u8) -> PhysReg {
        assert!(i < self.size);
        self.base.advance(i.into())
    }

    pub fn units(&self) -> impl Iterator<Item = PhysReg> + '_ {
        (0..self.size).map(|i| self.unit(i))
    }
}

impl fmt::Display for RegRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.size == 1 {
            return write!(f, "{}", self.base);
        }

        let (prefix, first) = if self.base.is_vgpr() {
            ('v', self.base.reg() - VGPR_BASE)
        } else {
            ('s', self.base.reg())
        };
        let last = first + u16::from(self.size) - 1;
        write!(f, "{prefix}[{first}:{last}]")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operand {
    Reg(RegRef),
    Const(u32),
    Undef,
}

impl Operand {
    pub fn is_constant(&self) -> bool {
        matches!(self, Operand::Const(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Operand::Undef)
    }

    pub fn as_reg(&self) -> Option<&RegRef> {
        match self {
            Operand::Reg(reg) => Some(reg),
            _ => None,
        }
    }
}

impl From<RegRef> for Operand {
    fn from(reg: RegRef) -> Operand {
        Operand::Reg(reg)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => reg.fmt(f),
            Operand::Const(c) if *c < 64 => write!(f, "{c}"),
            Operand::Const(c) => write!(f, "{c:#x}"),
            Operand::Undef => write!(f, "undef"),
        }
    }
}

pub type Definition = RegRef;

/// Hardware encoding family of an instruction
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Pseudo,
    SOP1,
    SOP2,
    SOPK,
    SOPC,
    SOPP,
    SMEM,
    DS,
    MUBUF,
    MTBUF,
    MIMG,
    EXP,
    FLAT,
    GLOBAL,
    SCRATCH,
    VOP1,
    VOP2,
    VOPC,
    VOP3,
    VOP3P,
}

/// Performance class, used to look up cycle costs
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InstrClass {
    Valu32,
    ValuConvert32,
    ValuQuarterRate32,
    Valu64,
    ValuTranscendental32,
    ValuDoubleTranscendental,
    Wmma,
    Salu,
    Smem,
    Branch,
    Sendmsg,
    Waitcnt,
    DS,
    Exp,
    Vmem,
    Other,
}

macro_rules! opcodes {
    ($($op:ident => ($name:literal, $fmt:ident, $cls:ident),)*) => {
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Opcode {
            $($op,)*
        }

        impl Opcode {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Opcode::$op => $name,)*
                }
            }

            pub fn format(&self) -> Format {
                match self {
                    $(Opcode::$op => Format::$fmt,)*
                }
            }

            pub fn class(&self) -> InstrClass {
                match self {
                    $(Opcode::$op => InstrClass::$cls,)*
                }
            }
        }
    };
}

opcodes! {
    PParallelcopy => ("p_parallelcopy", Pseudo, Other),
    PLogicalStart => ("p_logical_start", Pseudo, Other),
    PLogicalEnd => ("p_logical_end", Pseudo, Other),

    SMovB32 => ("s_mov_b32", SOP1, Salu),
    SMovB64 => ("s_mov_b64", SOP1, Salu),
    SNotB32 => ("s_not_b32", SOP1, Salu),
    SAddU32 => ("s_add_u32", SOP2, Salu),
    SSubU32 => ("s_sub_u32", SOP2, Salu),
    SAndB32 => ("s_and_b32", SOP2, Salu),
    SOrB64 => ("s_or_b64", SOP2, Salu),
    SLshlB32 => ("s_lshl_b32", SOP2, Salu),
    SMulI32 => ("s_mul_i32", SOP2, Salu),
    SCselectB32 => ("s_cselect_b32", SOP2, Salu),
    SCmpEqU32 => ("s_cmp_eq_u32", SOPC, Salu),
    SCmpLgU32 => ("s_cmp_lg_u32", SOPC, Salu),
    SMovkI32 => ("s_movk_i32", SOPK, Salu),

    SNop => ("s_nop", SOPP, Waitcnt),
    SDelayAlu => ("s_delay_alu", SOPP, Waitcnt),
    SWaitcnt => ("s_waitcnt", SOPP, Waitcnt),
    SBranch => ("s_branch", SOPP, Branch),
    SCbranchScc0 => ("s_cbranch_scc0", SOPP, Branch),
    SCbranchExecz => ("s_cbranch_execz", SOPP, Branch),
    SSendmsg => ("s_sendmsg", SOPP, Sendmsg),
    SEndpgm => ("s_endpgm", SOPP, Other),

    SLoadDword => ("s_load_dword", SMEM, Smem),
    SLoadDwordx4 => ("s_load_dwordx4", SMEM, Smem),

    VMovB32 => ("v_mov_b32", VOP1, Valu32),
    VCvtF32U32 => ("v_cvt_f32_u32", VOP1, ValuConvert32),
    VReadfirstlaneB32 => ("v_readfirstlane_b32", VOP1, Valu32),
    VRcpF32 => ("v_rcp_f32", VOP1, ValuTranscendental32),
    VRsqF32 => ("v_rsq_f32", VOP1, ValuTranscendental32),
    VSqrtF32 => ("v_sqrt_f32", VOP1, ValuTranscendental32),
    VLogF32 => ("v_log_f32", VOP1, ValuTranscendental32),
    VExpF32 => ("v_exp_f32", VOP1, ValuTranscendental32),
    VSinF32 => ("v_sin_f32", VOP1, ValuTranscendental32),
    VCosF32 => ("v_cos_f32", VOP1, ValuTranscendental32),
    VRcpF64 => ("v_rcp_f64", VOP1, ValuDoubleTranscendental),
    VAddF32 => ("v_add_f32", VOP2, Valu32),
    VSubF32 => ("v_sub_f32", VOP2, Valu32),
    VMulF32 => ("v_mul_f32", VOP2, Valu32),
    VFmacF32 => ("v_fmac_f32", VOP2, Valu32),
    VCndmaskB32 => ("v_cndmask_b32", VOP2, Valu32),
    VCmpLtF32 => ("v_cmp_lt_f32", VOPC, Valu32),
    VFmaF32 => ("v_fma_f32", VOP3, Valu32),
    VMadU32U24 => ("v_mad_u32_u24", VOP3, Valu32),
    VMulLoU32 => ("v_mul_lo_u32", VOP3, ValuQuarterRate32),
    VAddF64 => ("v_add_f64", VOP3, Valu64),
    VMulF64 => ("v_mul_f64", VOP3, Valu64),
    VFmaF64 => ("v_fma_f64", VOP3, Valu64),
    VPkFmaF16 => ("v_pk_fma_f16", VOP3P, Valu32),
    VWmmaF32_16x16x16F16 => ("v_wmma_f32_16x16x16_f16", VOP3P, Wmma),

    DsReadB32 => ("ds_read_b32", DS, DS),
    DsWriteB32 => ("ds_write_b32", DS, DS),
    BufferLoadDword => ("buffer_load_dword", MUBUF, Vmem),
    BufferStoreDword => ("buffer_store_dword", MUBUF, Vmem),
    TbufferLoadFormatX => ("tbuffer_load_format_x", MTBUF, Vmem),
    ImageSample => ("image_sample", MIMG, Vmem),
    ImageLoad => ("image_load", MIMG, Vmem),
    Exp => ("exp", EXP, Exp),
    FlatLoadDword => ("flat_load_dword", FLAT, Vmem),
    GlobalLoadDword => ("global_load_dword", GLOBAL, Vmem),
    GlobalStoreDword => ("global_store_dword", GLOBAL, Vmem),
    ScratchLoadDword => ("scratch_load_dword", SCRATCH, Vmem),
}

/// Wait conditions which can be encoded in the `instid` fields of
/// `s_delay_alu`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum AluDelayWait {
    NoDep = 0,
    ValuDep1 = 1,
    ValuDep2 = 2,
    ValuDep3 = 3,
    ValuDep4 = 4,
    Trans32Dep1 = 5,
    Trans32Dep2 = 6,
    Trans32Dep3 = 7,
    FmaAccumCycle1 = 8,
    SaluCycle1 = 9,
    SaluCycle2 = 10,
    SaluCycle3 = 11,
}

impl AluDelayWait {
    pub fn from_bits(bits: u32) -> Option<AluDelayWait> {
        use AluDelayWait::*;
        Some(match bits {
            0 => NoDep,
            1 => ValuDep1,
            2 => ValuDep2,
            3 => ValuDep3,
            4 => ValuDep4,
            5 => Trans32Dep1,
            6 => Trans32Dep2,
            7 => Trans32Dep3,
            8 => FmaAccumCycle1,
            9 => SaluCycle1,
            10 => SaluCycle2,
            11 => SaluCycle3,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            AluDelayWait::NoDep => "NO_DEP",
            AluDelayWait::ValuDep1 => "VALU_DEP_1",
            AluDelayWait::ValuDep2 => "VALU_DEP_2",
            AluDelayWait::ValuDep3 => "VALU_DEP_3",
            AluDelayWait::ValuDep4 => "VALU_DEP_4",
            AluDelayWait::Trans32Dep1 => "TRANS32_DEP_1",
            AluDelayWait::Trans32Dep2 => "TRANS32_DEP_2",
            AluDelayWait::Trans32Dep3 => "TRANS32_DEP_3",
            AluDelayWait::FmaAccumCycle1 => "FMA_ACCUM_CYCLE_1",
            AluDelayWait::SaluCycle1 => "SALU_CYCLE_1",
            AluDelayWait::SaluCycle2 => "SALU_CYCLE_2",
            AluDelayWait::SaluCycle3 => "SALU_CYCLE_3",
        }
    }
}

/// Field layout of the `s_delay_alu` immediate
pub mod delay_alu_imm {
    pub const INSTID0_MASK: u32 = 0xf;
    pub const INSTSKIP_SHIFT: u32 = 4;
    pub const INSTSKIP_MASK: u32 = 0x7;
    pub const INSTID1_SHIFT: u32 = 7;
    pub const INSTID1_MASK: u32 = 0xf;

    /// Largest valid `instskip` value (SKIP_4)
    pub const MAX_INSTSKIP: u32 = 5;

    pub fn instid0(imm: u32) -> u32 {
        imm & INSTID0_MASK
    }

    pub fn instskip(imm: u32) -> u32 {
        (imm >> INSTSKIP_SHIFT) & INSTSKIP_MASK
    }

    pub fn instid1(imm: u32) -> u32 {
        (imm >> INSTID1_SHIFT) & INSTID1_MASK
    }
}

fn fmt_wait(f: &mut fmt::Formatter<'_>, bits: u32) -> fmt::Result {
    match AluDelayWait::from_bits(bits) {
        Some(wait) => write!(f, "{}", wait.name()),
        None => write!(f, "{bits:#x}"),
    }
}

fn fmt_delay_alu_imm(f: &mut fmt::Formatter<'_>, imm: u32) -> fmt::Result {
    let id0 = delay_alu_imm::instid0(imm);
    let skip = delay_alu_imm::instskip(imm);
    let id1 = delay_alu_imm::instid1(imm);

    write!(f, " instid0(")?;
    fmt_wait(f, id0)?;
    write!(f, ")")?;
    if skip != 0 {
        match skip {
            1 => write!(f, " | instskip(NEXT)")?,
            s => write!(f, " | instskip(SKIP_{})", s - 1)?,
        }
    }
    if id1 != 0 {
        write!(f, " | instid1(")?;
        fmt_wait(f, id1)?;
        write!(f, ")")?;
    }
    Ok(())
}

pub struct Instr {
    pub opcode: Opcode,
    pub defs: Vec<Definition>,
    pub operands: Vec<Operand>,

    /// Immediate for SOPP/SOPK instructions
    pub imm: u32,

    /// Scratch space owned by whichever pass is currently running
    pub pass_flags: u32,
}

impl Instr {
    pub fn new(
        opcode: Opcode,
        defs: impl Into<Vec<Definition>>,
        operands: impl Into<Vec<Operand>>,
    ) -> Instr {
        Instr {
            opcode,
            defs: defs.into(),
            operands: operands.into(),
            imm: 0,
            pass_flags: 0,
        }
    }

    pub fn new_boxed(
        opcode: Opcode,
        defs: impl Into<Vec<Definition>>,
        operands: impl Into<Vec<Operand>>,
    ) -> Box<Instr> {
        Box::new(Instr::new(opcode, defs, operands))
    }

    pub fn new_sopp(opcode: Opcode, imm: u32) -> Box<Instr> {
        assert!(opcode.format() == Format::SOPP);
        let mut instr = Instr::new_boxed(opcode, Vec::new(), Vec::new());
        instr.imm = imm;
        instr
    }

    pub fn format(&self) -> Format {
        self.opcode.format()
    }

    pub fn class(&self) -> InstrClass {
        self.opcode.class()
    }

    pub fn is_valu(&self) -> bool {
        matches!(
            self.format(),
            Format::VOP1
                | Format::VOP2
                | Format::VOPC
                | Format::VOP3
                | Format::VOP3P
        )
    }

    pub fn is_salu(&self) -> bool {
        matches!(
            self.format(),
            Format::SOP1
                | Format::SOP2
                | Format::SOPK
                | Format::SOPC
                | Format::SOPP
        )
    }

    pub fn is_trans(&self) -> bool {
        matches!(
            self.class(),
            InstrClass::ValuTranscendental32
                | InstrClass::ValuDoubleTranscendental
        )
    }

    pub fn is_wmma(&self) -> bool {
        self.class() == InstrClass::Wmma
    }

    pub fn is_exp(&self) -> bool {
        self.format() == Format::EXP
    }

    pub fn is_ds(&self) -> bool {
        self.format() == Format::DS
    }

    pub fn is_mimg(&self) -> bool {
        self.format() == Format::MIMG
    }

    pub fn is_mubuf(&self) -> bool {
        self.format() == Format::MUBUF
    }

    pub fn is_mtbuf(&self) -> bool {
        self.format() == Format::MTBUF
    }

    pub fn is_flat_like(&self) -> bool {
        matches!(
            self.format(),
            Format::FLAT | Format::GLOBAL | Format::SCRATCH
        )
    }

    pub fn is_delay_alu(&self) -> bool {
        self.opcode == Opcode::SDelayAlu
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, def) in self.defs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{def}")?;
        }
        if !self.defs.is_empty() {
            write!(f, " = ")?;
        }

        write!(f, "{}", self.opcode.name())?;

        if self.is_delay_alu() {
            return fmt_delay_alu_imm(f, self.imm);
        }

        for (i, op) in self.operands.iter().enumerate() {
            let sep = if i > 0 { "," } else { "" };
            write!(f, "{sep} {op}")?;
        }

        if matches!(self.format(), Format::SOPP | Format::SOPK) {
            write!(f, " imm:{}", self.imm)?;
        }
        Ok(())
    }
}

/// Block classification bits
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BlockKind(u16);

impl BlockKind {
    pub const NONE: BlockKind = BlockKind(0);
    pub const UNIFORM: BlockKind = BlockKind(1 << 0);
    pub const TOP_LEVEL: BlockKind = BlockKind(1 << 1);
    pub const LOOP_PREHEADER: BlockKind = BlockKind(1 << 2);
    pub const LOOP_HEADER: BlockKind = BlockKind(1 << 3);
    pub const LOOP_EXIT: BlockKind = BlockKind(1 << 4);
    pub const CONTINUE: BlockKind = BlockKind(1 << 5);
    pub const BREAK: BlockKind = BlockKind(1 << 6);
    pub const BRANCH: BlockKind = BlockKind(1 << 7);
    pub const MERGE: BlockKind = BlockKind(1 << 8);
    pub const INVERT: BlockKind = BlockKind(1 << 9);
    pub const DISCARD_EARLY_EXIT: BlockKind = BlockKind(1 << 10);
    pub const EXPORT_END: BlockKind = BlockKind(1 << 11);

    const NAMES: [(BlockKind, &'static str); 12] = [
        (BlockKind::UNIFORM, "uniform"),
        (BlockKind::TOP_LEVEL, "top-level"),
        (BlockKind::LOOP_PREHEADER, "loop-preheader"),
        (BlockKind::LOOP_HEADER, "loop-header"),
        (BlockKind::LOOP_EXIT, "loop-exit"),
        (BlockKind::CONTINUE, "continue"),
        (BlockKind::BREAK, "break"),
        (BlockKind::BRANCH, "branch"),
        (BlockKind::MERGE, "merge"),
        (BlockKind::INVERT, "invert"),
        (BlockKind::DISCARD_EARLY_EXIT, "discard-early-exit"),
        (BlockKind::EXPORT_END, "export-end"),
    ];

    pub fn intersects(&self, other: BlockKind) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for BlockKind {
    type Output = BlockKind;

    fn bitor(self, rhs: BlockKind) -> BlockKind {
        BlockKind(self.0 | rhs.0)
    }
}

impl BitOrAssign for BlockKind {
    fn bitor_assign(&mut self, rhs: BlockKind) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (kind, name) in BlockKind::NAMES {
            if self.intersects(kind) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

pub struct Block {
    pub index: usize,
    pub kind: BlockKind,
    pub loop_nest_depth: u32,

    /// Predecessors along which wait state is propagated.  Edges into a
    /// discard early-exit block never show up here.
    pub linear_preds: Vec<usize>,
    pub linear_succs: Vec<usize>,

    pub instrs: Vec<Box<Instr>>,
}

impl Block {
    pub fn new(index: usize, kind: BlockKind, loop_nest_depth: u32) -> Block {
        Block {
            index,
            kind,
            loop_nest_depth,
            linear_preds: Vec::new(),
            linear_succs: Vec::new(),
            instrs: Vec::new(),
        }
    }

    pub fn is_loop_header(&self) -> bool {
        self.kind.intersects(BlockKind::LOOP_HEADER)
    }

    pub fn is_loop_exit(&self) -> bool {
        self.kind.intersects(BlockKind::LOOP_EXIT)
    }

    pub fn is_discard_early_exit(&self) -> bool {
        self.kind.intersects(BlockKind::DISCARD_EARLY_EXIT)
    }

    /// Swaps in a new instruction list and returns the old one
    pub fn replace_instrs(
        &mut self,
        instrs: Vec<Box<Instr>>,
    ) -> Vec<Box<Instr>> {
        std::mem::replace(&mut self.instrs, instrs)
    }

    pub fn truncate_instrs(&mut self, len: usize) {
        self.instrs.truncate(len);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BB{}", self.index)?;
        if !self.linear_preds.is_empty() {
            write!(f, " /* preds:")?;
            for p in &self.linear_preds {
                write!(f, " BB{p}")?;
            }
            write!(f, " */")?;
        }
        if !self.kind.is_empty() {
            write!(f, " /* {} */", self.kind)?;
        }
        writeln!(f)?;
        for instr in &self.instrs {
            writeln!(f, "\t{instr}")?;
        }
        Ok(())
    }
}

pub struct Program<'a> {
    pub sm: &'a dyn ShaderModel,
    pub wave_size: u8,
    pub blocks: Vec<Block>,
}

impl<'a> Program<'a> {
    pub fn new(sm: &'a dyn ShaderModel, wave_size: u8) -> Program<'a> {
        assert!(wave_size == 32 || wave_size == 64);
        Program {
            sm,
            wave_size,
            blocks: Vec::new(),
        }
    }

    pub fn gfx_level(&self) -> GfxLevel {
        self.sm.gfx_level()
    }

    /// Appends a new block and returns its index
    pub fn create_block(
        &mut self,
        kind: BlockKind,
        loop_nest_depth: u32,
    ) -> usize {
        let index = self.blocks.len();
        self.blocks.push(Block::new(index, kind, loop_nest_depth));
        index
    }

    pub fn add_linear_edge(&mut self, pred: usize, succ: usize) {
        self.blocks[pred].linear_succs.push(succ);
        self.blocks[succ].linear_preds.push(pred);
    }

    pub fn num_instrs(&self) -> usize {
        self.blocks.iter().map(|b| b.instrs.len()).sum()
    }
}

impl fmt::Display for Program<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        Ok(())
    }
}
