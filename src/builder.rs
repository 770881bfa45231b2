// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT

use crate::ir::*;

/// Appends instructions to the end of an instruction list
pub struct Builder<'a> {
    instrs: &'a mut Vec<Box<Instr>>,
}

impl<'a> Builder<'a> {
    pub fn new(instrs: &'a mut Vec<Box<Instr>>) -> Builder<'a> {
        Builder { instrs }
    }

    pub fn at_block(block: &'a mut Block) -> Builder<'a> {
        Builder::new(&mut block.instrs)
    }

    pub fn insert(&mut self, instr: Box<Instr>) -> &mut Instr {
        self.instrs.push(instr);
        self.instrs.last_mut().unwrap()
    }

    fn emit(
        &mut self,
        opcode: Opcode,
        defs: impl Into<Vec<Definition>>,
        operands: impl Into<Vec<Operand>>,
    ) -> &mut Instr {
        self.insert(Instr::new_boxed(opcode, defs, operands))
    }

    pub fn pseudo(
        &mut self,
        opcode: Opcode,
        defs: &[Definition],
        operands: &[Operand],
    ) -> &mut Instr {
        debug_assert_eq!(opcode.format(), Format::Pseudo);
        self.emit(opcode, defs, operands)
    }

    pub fn sop1(
        &mut self,
        opcode: Opcode,
        def: Definition,
        src: impl Into<Operand>,
    ) -> &mut Instr {
        debug_assert_eq!(opcode.format(), Format::SOP1);
        self.emit(opcode, [def], [src.into()])
    }

    pub fn sop2(
        &mut self,
        opcode: Opcode,
        def: Definition,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> &mut Instr {
        debug_assert_eq!(opcode.format(), Format::SOP2);
        self.emit(opcode, [def], [a.into(), b.into()])
    }

    pub fn sopc(
        &mut self,
        opcode: Opcode,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> &mut Instr {
        debug_assert_eq!(opcode.format(), Format::SOPC);
        self.emit(opcode, Vec::new(), [a.into(), b.into()])
    }

    pub fn sopp(&mut self, opcode: Opcode, imm: u32) -> &mut Instr {
        self.insert(Instr::new_sopp(opcode, imm))
    }

    pub fn smem(
        &mut self,
        opcode: Opcode,
        def: Definition,
        base: impl Into<Operand>,
    ) -> &mut Instr {
        debug_assert_eq!(opcode.format(), Format::SMEM);
        self.emit(opcode, [def], [base.into()])
    }

    pub fn vop1(
        &mut self,
        opcode: Opcode,
        def: Definition,
        src: impl Into<Operand>,
    ) -> &mut Instr {
        debug_assert_eq!(opcode.format(), Format::VOP1);
        self.emit(opcode, [def], [src.into()])
    }

    pub fn vop2(
        &mut self,
        opcode: Opcode,
        def: Definition,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> &mut Instr {
        debug_assert_eq!(opcode.format(), Format::VOP2);
        self.emit(opcode, [def], [a.into(), b.into()])
    }

    /// VOP3 and VOP3P instructions
    pub fn vop3(
        &mut self,
        opcode: Opcode,
        def: Definition,
        srcs: &[Operand],
    ) -> &mut Instr {
        debug_assert!(matches!(opcode.format(), Format::VOP3 | Format::VOP3P));
        self.emit(opcode, [def], srcs)
    }

    /// Memory instructions: DS, MUBUF, MTBUF, MIMG and the flat family
    pub fn mem(
        &mut self,
        opcode: Opcode,
        defs: &[Definition],
        operands: &[Operand],
    ) -> &mut Instr {
        debug_assert!(matches!(
            opcode.format(),
            Format::DS
                | Format::MUBUF
                | Format::MTBUF
                | Format::MIMG
                | Format::FLAT
                | Format::GLOBAL
                | Format::SCRATCH
        ));
        self.emit(opcode, defs, operands)
    }

    pub fn exp(&mut self, srcs: &[Operand]) -> &mut Instr {
        self.emit(Opcode::Exp, Vec::new(), srcs)
    }
}
