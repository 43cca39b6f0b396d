use crate::constant_pool::ConstantTag;

/// Every way decoding or rendering a class file can fail.
///
/// All variants are terminal for the call that produced them: once the cursor
/// is out of step with the structure nothing after it can be trusted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassDecodeError {
    #[error("unexpected end of input at offset {offset}")]
    TruncatedInput { offset: usize },
    #[error("invalid magic 0x{found:08x}")]
    BadMagic { found: u32 },
    #[error("constant pool index {index} out of range")]
    ConstantPoolIndexOutOfRange { index: u16 },
    #[error("constant pool entry #{index} is {actual}, expected {expected}")]
    ConstantPoolTypeMismatch {
        index: u16,
        expected: ConstantTag,
        actual: ConstantTag,
    },
    #[error("unrecognized constant pool tag {tag} at offset {offset}")]
    UnrecognizedConstantPoolTag { tag: u8, offset: usize },
    #[error("unknown opcode 0x{opcode:02x} at pc {pc}")]
    UnknownOpcode { opcode: u8, pc: usize },
    #[error("malformed {name} attribute")]
    MalformedAttribute { name: String },
    #[error("invalid modified utf-8 in constant pool entry #{index}")]
    InvalidUtf8 { index: u16 },
    #[error("invalid descriptor {descriptor:?}")]
    InvalidDescriptor { descriptor: String },
    #[error("{count} unexpected trailing bytes at offset {offset}")]
    TrailingBytes { offset: usize, count: usize },
}

impl ClassDecodeError {
    pub(crate) fn malformed<S: Into<String>>(name: S) -> ClassDecodeError {
        ClassDecodeError::MalformedAttribute { name: name.into() }
    }
}

pub type Result<T> = ::std::result::Result<T, ClassDecodeError>;
