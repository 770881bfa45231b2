// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT

use crate::ir::*;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum GfxLevel {
    GFX10,
    GFX10_3,
    GFX11,
    GFX11_5,
    GFX12,
}

impl GfxLevel {
    /// Whether the SIMD frontend needs `s_delay_alu` to switch waves on ALU
    /// dependencies
    pub fn has_delay_alu(&self) -> bool {
        *self >= GfxLevel::GFX11
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CycleInfo {
    /// Cycles until the result is available to a dependent instruction
    pub latency: u8,

    /// Cycles the instruction occupies the issuing pipeline
    pub issue_cycles: u8,
}

pub trait ShaderModel {
    fn gfx_level(&self) -> GfxLevel;

    fn cycle_info(&self, instr: &Instr, wave_size: u8) -> CycleInfo;
}

pub struct ShaderModel11 {
    gfx_level: GfxLevel,
}

impl ShaderModel11 {
    pub fn new(gfx_level: GfxLevel) -> ShaderModel11 {
        assert!(gfx_level.has_delay_alu());
        ShaderModel11 { gfx_level }
    }
}

/// (latency, wave32 issue cycles)
fn class_cycles(class: InstrClass) -> (u8, u8) {
    match class {
        InstrClass::Valu32 | InstrClass::ValuConvert32 => (5, 1),
        InstrClass::ValuQuarterRate32 => (8, 4),
        InstrClass::Valu64 => (6, 2),
        InstrClass::ValuTranscendental32 => (10, 1),
        InstrClass::ValuDoubleTranscendental => (24, 16),
        InstrClass::Wmma => (16, 8),
        InstrClass::Salu => (2, 1),
        InstrClass::Smem
        | InstrClass::Branch
        | InstrClass::Sendmsg
        | InstrClass::DS
        | InstrClass::Exp
        | InstrClass::Vmem => (0, 1),
        InstrClass::Waitcnt | InstrClass::Other => (0, 0),
    }
}

impl ShaderModel for ShaderModel11 {
    fn gfx_level(&self) -> GfxLevel {
        self.gfx_level
    }

    fn cycle_info(&self, instr: &Instr, wave_size: u8) -> CycleInfo {
        let (latency, mut issue_cycles) = class_cycles(instr.class());

        // Wave64 VALU instructions are issued as two wave32 halves
        if wave_size == 64 && instr.is_valu() {
            issue_cycles *= 2;
        }

        CycleInfo {
            latency,
            issue_cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycles(op: Opcode, wave_size: u8) -> CycleInfo {
        let sm = ShaderModel11::new(GfxLevel::GFX11);
        let instr = Instr::new(op, Vec::new(), Vec::new());
        sm.cycle_info(&instr, wave_size)
    }

    #[test]
    fn test_gfx11_cycles() {
        assert_eq!(
            cycles(Opcode::VAddF32, 32),
            CycleInfo {
                latency: 5,
                issue_cycles: 1
            }
        );
        assert_eq!(cycles(Opcode::VRcpF32, 32).latency, 10);
        assert_eq!(cycles(Opcode::VMulLoU32, 32).issue_cycles, 4);
        assert_eq!(cycles(Opcode::SAddU32, 32).latency, 2);
        assert_eq!(cycles(Opcode::SDelayAlu, 32), CycleInfo::default());
        assert_eq!(cycles(Opcode::Exp, 32).latency, 0);
    }

    #[test]
    fn test_wave64_doubles_valu_issue() {
        assert_eq!(cycles(Opcode::VAddF32, 64).issue_cycles, 2);
        assert_eq!(cycles(Opcode::VRcpF32, 64).issue_cycles, 2);
        assert_eq!(cycles(Opcode::VAddF32, 64).latency, 5);
        assert_eq!(cycles(Opcode::SAddU32, 64).issue_cycles, 1);
    }

    #[test]
    fn test_has_delay_alu() {
        assert!(!GfxLevel::GFX10_3.has_delay_alu());
        assert!(GfxLevel::GFX11.has_delay_alu());
        assert!(GfxLevel::GFX12.has_delay_alu());
    }
}
