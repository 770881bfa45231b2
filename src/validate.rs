// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT

use crate::ir::*;

use remain::sorted;
use thiserror::Error;

/// A structural problem found in a program handed to the delay passes
#[sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    #[error("BB{pos} has index {index}")]
    BlockIndexMismatch { pos: usize, index: usize },
    #[error("BB{block}: s_delay_alu at {ip} has operands or definitions")]
    DelayAluHasRegs { block: usize, ip: usize },
    #[error(
        "BB{block}: s_delay_alu at {ip} has immediate {imm:#x} \
         with bits above 10 set"
    )]
    DelayAluImmOutOfRange { block: usize, ip: usize, imm: u32 },
    #[error("BB{block}: s_delay_alu at {ip} has invalid instskip {skip}")]
    DelayAluInvalidSkip { block: usize, ip: usize, skip: u32 },
    #[error("BB{block}: s_delay_alu at {ip} has invalid wait {wait:#x}")]
    DelayAluInvalidWait { block: usize, ip: usize, wait: u32 },
    #[error("BB{block}: s_delay_alu at {ip} has instskip without instid1")]
    DelayAluSkipWithoutWait { block: usize, ip: usize },
    #[error("BB{block} has an edge to nonexistent BB{target}")]
    EdgeOutOfRange { block: usize, target: usize },
    #[error("BB{block}: instruction at {ip} uses out-of-range register {reg}")]
    RegOutOfRange { block: usize, ip: usize, reg: u32 },
}

fn validate_delay_alu_imm(
    block: usize,
    ip: usize,
    instr: &Instr,
) -> Result<(), ValidationError> {
    if !instr.operands.is_empty() || !instr.defs.is_empty() {
        return Err(ValidationError::DelayAluHasRegs { block, ip });
    }

    let imm = instr.imm;
    if imm >> 11 != 0 {
        return Err(ValidationError::DelayAluImmOutOfRange { block, ip, imm });
    }

    for wait in [delay_alu_imm::instid0(imm), delay_alu_imm::instid1(imm)] {
        if AluDelayWait::from_bits(wait).is_none() {
            return Err(ValidationError::DelayAluInvalidWait {
                block,
                ip,
                wait,
            });
        }
    }

    let skip = delay_alu_imm::instskip(imm);
    if skip > delay_alu_imm::MAX_INSTSKIP {
        return Err(ValidationError::DelayAluInvalidSkip { block, ip, skip });
    }
    if skip != 0 && delay_alu_imm::instid1(imm) == 0 {
        return Err(ValidationError::DelayAluSkipWithoutWait { block, ip });
    }

    Ok(())
}

impl Program<'_> {
    /// Checks the invariants the delay passes rely on
    pub fn validate_delay_alu(&self) -> Result<(), ValidationError> {
        let num_blocks = self.blocks.len();
        for (pos, block) in self.blocks.iter().enumerate() {
            if block.index != pos {
                return Err(ValidationError::BlockIndexMismatch {
                    pos,
                    index: block.index,
                });
            }

            let edges = block.linear_preds.iter().chain(&block.linear_succs);
            for &target in edges {
                if target >= num_blocks {
                    return Err(ValidationError::EdgeOutOfRange {
                        block: pos,
                        target,
                    });
                }
            }

            for (ip, instr) in block.instrs.iter().enumerate() {
                if instr.is_delay_alu() {
                    validate_delay_alu_imm(pos, ip, instr)?;
                }

                let regs = instr
                    .defs
                    .iter()
                    .chain(instr.operands.iter().filter_map(|op| op.as_reg()));
                for reg in regs {
                    let range = reg.idx_range();
                    if range.end > u32::from(NUM_PHYS_REGS) {
                        return Err(ValidationError::RegOutOfRange {
                            block: pos,
                            ip,
                            reg: range.end - 1,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::test_util::*;

    fn program_with_delay(sm: &FixedModel, imm: u32) -> Program<'_> {
        let mut p = Program::new(sm, 32);
        let b = p.create_block(BlockKind::TOP_LEVEL, 0);
        let mut bld = Builder::at_block(&mut p.blocks[b]);
        bld.vop2(Opcode::VAddF32, vgpr(0), vgpr(1), vgpr(2));
        bld.sopp(Opcode::SDelayAlu, imm);
        bld.vop2(Opcode::VAddF32, vgpr(3), vgpr(0), vgpr(2));
        p
    }

    #[test]
    fn test_valid_program() {
        let sm = FixedModel::new(5, 1);
        for imm in [
            0x1,
            0x85,
            0x1 | (1 << 4) | (0x2 << 7),
            0x9 | (5 << 4) | (0xb << 7),
        ] {
            let p = program_with_delay(&sm, imm);
            assert_eq!(p.validate_delay_alu(), Ok(()));
        }
    }

    #[test]
    fn test_invalid_delay_alu() {
        let sm = FixedModel::new(5, 1);
        let err = |imm| program_with_delay(&sm, imm).validate_delay_alu();

        assert_eq!(
            err(1 << 11),
            Err(ValidationError::DelayAluImmOutOfRange {
                block: 0,
                ip: 1,
                imm: 1 << 11
            })
        );
        assert_eq!(
            err(0xc),
            Err(ValidationError::DelayAluInvalidWait {
                block: 0,
                ip: 1,
                wait: 0xc
            })
        );
        assert_eq!(
            err(0x1 | (6 << 4) | (0x1 << 7)),
            Err(ValidationError::DelayAluInvalidSkip {
                block: 0,
                ip: 1,
                skip: 6
            })
        );
        assert_eq!(
            err(0x1 | (1 << 4)),
            Err(ValidationError::DelayAluSkipWithoutWait { block: 0, ip: 1 })
        );
    }

    #[test]
    fn test_delay_alu_with_operands() {
        let sm = FixedModel::new(5, 1);
        let mut p = program_with_delay(&sm, 1);
        p.blocks[0].instrs[1].operands.push(Operand::Const(0));
        assert_eq!(
            p.validate_delay_alu(),
            Err(ValidationError::DelayAluHasRegs { block: 0, ip: 1 })
        );
    }

    #[test]
    fn test_invalid_cfg() {
        let sm = FixedModel::new(5, 1);
        let mut p = Program::new(&sm, 32);
        let b0 = p.create_block(BlockKind::TOP_LEVEL, 0);
        p.blocks[b0].linear_succs.push(3);
        assert_eq!(
            p.validate_delay_alu(),
            Err(ValidationError::EdgeOutOfRange {
                block: 0,
                target: 3
            })
        );

        p.blocks[b0].linear_succs.clear();
        p.blocks[b0].index = 7;
        assert_eq!(
            p.validate_delay_alu(),
            Err(ValidationError::BlockIndexMismatch { pos: 0, index: 7 })
        );
    }

    #[test]
    fn test_reg_out_of_range() {
        let sm = FixedModel::new(5, 1);
        let mut p = Program::new(&sm, 32);
        let b = p.create_block(BlockKind::TOP_LEVEL, 0);
        Builder::at_block(&mut p.blocks[b]).vop3(
            Opcode::VAddF64,
            RegRef::vgpr(255, 2),
            &[vgpr(0).into(), vgpr(1).into()],
        );

        let err = p.validate_delay_alu().unwrap_err();
        assert_eq!(
            err,
            ValidationError::RegOutOfRange {
                block: 0,
                ip: 0,
                reg: 512
            }
        );
        assert_eq!(
            err.to_string(),
            "BB0: instruction at 0 uses out-of-range register 512"
        );
    }
}
