use crate::cursor::ByteCursor;
use crate::error::{ClassDecodeError, Result};
use crate::opcodes::{self, InsnClass};
use serde::Serialize;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocalVarIndex {
    Narrow(u8),
    /// Reached through the `wide` prefix.
    Wide(u16),
}

impl LocalVarIndex {
    pub fn get(self) -> u16 {
        match self {
            LocalVarIndex::Narrow(i) => i as u16,
            LocalVarIndex::Wide(i) => i,
        }
    }
}

/// Branch offset relative to the pc of the branching instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BranchOffset {
    Short(i16),
    Long(i32),
}

impl BranchOffset {
    pub fn get(self) -> i32 {
        match self {
            BranchOffset::Short(o) => o as i32,
            BranchOffset::Long(o) => o,
        }
    }
}

/// Immediate pushed by `bipush` or `sipush`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Literal {
    Byte(i8),
    Short(i16),
}

impl Literal {
    pub fn get(self) -> i32 {
        match self {
            Literal::Byte(v) => v as i32,
            Literal::Short(v) => v as i32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    None,
    /// Member, class and `ldc` references.
    ConstantPoolIndex(u16),
    /// `ldc_w` and `ldc2_w`.
    ConstantPoolIndexWide(u16),
    LocalVar(LocalVarIndex),
    Iinc { index: LocalVarIndex, increment: i16 },
    Branch(BranchOffset),
    Literal(Literal),
    /// Element type code of a primitive `newarray`.
    NewArray(u8),
    InvokeInterface { index: u16, count: u8 },
    InvokeDynamic { index: u16 },
    MultiANewArray { index: u16, dimensions: u8 },
    TableSwitch { default: i32, low: i32, high: i32, offsets: Vec<i32> },
    /// Pairs of (match, offset), in the order they are stored.
    LookupSwitch { default: i32, pairs: Vec<(i32, i32)> },
    Reserved,
}

/// One decoded instruction. For `wide` forms `opcode` is the modified
/// instruction and `wide` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub pc: usize,
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub wide: bool,
    pub operand: Operand,
    width: usize,
}

impl Instruction {
    /// Bytes taken up in the code array, prefix and padding included.
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn name(&self) -> Cow<'static, str> {
        if self.wide {
            Cow::Owned(format!("{}_w", self.mnemonic))
        } else {
            Cow::Borrowed(self.mnemonic)
        }
    }
    /// Absolute pc for an offset relative to this instruction.
    pub fn target(&self, offset: i32) -> i64 {
        self.pc as i64 + offset as i64
    }
    pub fn branch_target(&self) -> Option<i64> {
        match self.operand {
            Operand::Branch(offset) => Some(self.target(offset.get())),
            _ => None,
        }
    }
}

/// Decodes a method's code array in one pass.
pub fn decode(code: &[u8]) -> Result<Vec<Instruction>> {
    Decoder::new(code).collect()
}

/// Iterator over the instructions of a code array. Yields at most one error,
/// after which it is exhausted.
pub struct Decoder<'a> {
    cursor: ByteCursor<'a>,
    err: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(code: &'a [u8]) -> Decoder<'a> {
        Decoder {
            cursor: ByteCursor::new(code),
            err: false,
        }
    }

    /// Switch operands start on a multiple of four from the start of the code array.
    fn skip_padding(&mut self) -> Result<()> {
        let pad = (4 - self.cursor.position() % 4) % 4;
        self.cursor.skip(pad)
    }

    fn ensure(&mut self, count: usize, size: usize) -> Result<()> {
        match count.checked_mul(size) {
            Some(n) if n <= self.cursor.remaining() => Ok(()),
            _ => Err(ClassDecodeError::TruncatedInput { offset: self.cursor.offset() }),
        }
    }

    fn decode_insn(&mut self) -> Result<Instruction> {
        let pc = self.cursor.position();
        let mut opcode = self.cursor.read_u1()?;
        let class = opcodes::classify_insn(opcode)
            .ok_or(ClassDecodeError::UnknownOpcode { opcode, pc })?;
        let mut wide = false;
        let cursor = &mut self.cursor;
        let operand = match class {
            InsnClass::NoArg | InsnClass::ImplVar => Operand::None,
            InsnClass::Reserved => Operand::Reserved,
            InsnClass::Sbyte => Operand::Literal(Literal::Byte(cursor.read_i1()?)),
            InsnClass::Short => Operand::Literal(Literal::Short(cursor.read_i2()?)),
            InsnClass::Var => Operand::LocalVar(LocalVarIndex::Narrow(cursor.read_u1()?)),
            InsnClass::Ldc => Operand::ConstantPoolIndex(cursor.read_u1()? as u16),
            InsnClass::LdcWide => Operand::ConstantPoolIndexWide(cursor.read_u2()?),
            InsnClass::Type | InsnClass::FieldMeth => Operand::ConstantPoolIndex(cursor.read_u2()?),
            InsnClass::ItfMeth => {
                let index = cursor.read_u2()?;
                let count = cursor.read_u1()?;
                cursor.skip(1)?;
                Operand::InvokeInterface { index, count }
            },
            InsnClass::IndyMeth => {
                let index = cursor.read_u2()?;
                cursor.skip(2)?;
                Operand::InvokeDynamic { index }
            },
            InsnClass::Label => Operand::Branch(BranchOffset::Short(cursor.read_i2()?)),
            InsnClass::WideLabel => Operand::Branch(BranchOffset::Long(cursor.read_i4()?)),
            InsnClass::Iinc => Operand::Iinc {
                index: LocalVarIndex::Narrow(cursor.read_u1()?),
                increment: cursor.read_i1()? as i16,
            },
            InsnClass::NewArray => {
                let atype = cursor.read_u1()?;
                if opcodes::array_type_name(atype).is_none() {
                    return Err(ClassDecodeError::malformed("Code"));
                }
                Operand::NewArray(atype)
            },
            InsnClass::Multianew => Operand::MultiANewArray {
                index: cursor.read_u2()?,
                dimensions: cursor.read_u1()?,
            },
            InsnClass::Tableswitch => {
                self.skip_padding()?;
                let default = self.cursor.read_i4()?;
                let low = self.cursor.read_i4()?;
                let high = self.cursor.read_i4()?;
                if high < low {
                    return Err(ClassDecodeError::malformed("Code"));
                }
                let count = (high as i64 - low as i64 + 1) as usize;
                self.ensure(count, 4)?;
                let offsets = (0..count)
                    .map(|_| self.cursor.read_i4())
                    .collect::<Result<Vec<_>>>()?;
                Operand::TableSwitch { default, low, high, offsets }
            },
            InsnClass::Lookupswitch => {
                self.skip_padding()?;
                let default = self.cursor.read_i4()?;
                let npairs = self.cursor.read_i4()?;
                if npairs < 0 {
                    return Err(ClassDecodeError::malformed("Code"));
                }
                self.ensure(npairs as usize, 8)?;
                let mut pairs = Vec::with_capacity(npairs as usize);
                for _ in 0..npairs {
                    let key = self.cursor.read_i4()?;
                    let offset = self.cursor.read_i4()?;
                    pairs.push((key, offset));
                }
                Operand::LookupSwitch { default, pairs }
            },
            InsnClass::Wide => {
                let inner_pc = cursor.position();
                opcode = cursor.read_u1()?;
                wide = true;
                match opcodes::classify_insn(opcode) {
                    Some(InsnClass::Var) => Operand::LocalVar(LocalVarIndex::Wide(cursor.read_u2()?)),
                    Some(InsnClass::Iinc) => Operand::Iinc {
                        index: LocalVarIndex::Wide(cursor.read_u2()?),
                        increment: cursor.read_i2()?,
                    },
                    _ => return Err(ClassDecodeError::UnknownOpcode { opcode, pc: inner_pc }),
                }
            },
        };
        let mnemonic = opcodes::mnemonic(opcode)
            .ok_or(ClassDecodeError::UnknownOpcode { opcode, pc })?;
        Ok(Instruction {
            pc,
            opcode,
            mnemonic,
            wide,
            operand,
            width: self.cursor.position() - pc,
        })
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.err || self.cursor.is_empty() {
            return None;
        }
        let insn = self.decode_insn();
        self.err = insn.is_err();
        Some(insn)
    }
}
