//! Reads JVM class files into a typed tree and renders them as a
//! bytecode listing.
//!
//! ```no_run
//! let bytes = std::fs::read("Hello.class").unwrap();
//! print!("{}", classfile_disassembler::disassemble(&bytes).unwrap());
//! ```
pub mod classfile;
pub mod constant_pool;
pub mod cursor;
pub mod disassembler;
pub mod error;
pub mod insn;
pub mod opcodes;
pub mod reader;
pub mod types;
#[cfg(feature = "tree")]
pub mod tree;
#[cfg(test)]
mod test_support;

use bitflags::*;
use serde::Serialize;

pub use crate::classfile::{Attribute, ClassFile, CodeAttribute, ExceptionTableEntry, FieldInfo, MethodInfo};
pub use crate::constant_pool::{ClassConstant, ConstantPool, ConstantPoolEntry, ConstantTag, MemberRef};
pub use crate::disassembler::{Disassembler, DisassemblerFlags};
pub use crate::error::{ClassDecodeError, Result};
pub use crate::insn::{Instruction, Operand};
pub use crate::reader::ClassReader;
pub use crate::types::Type;

bitflags! {
    #[derive(Serialize)]
    pub struct ClassAccess: u16 {
        const ACC_PUBLIC = 0x1;
        const ACC_FINAL = 0x10;
        const ACC_SUPER = 0x20;
        const ACC_INTERFACE = 0x200;
        const ACC_ABSTRACT = 0x400;
        const ACC_SYNTHETIC = 0x1000;
        const ACC_ANNOTATION = 0x2000;
        const ACC_ENUM = 0x4000;
        const ACC_MODULE = 0x8000;
    }
}

bitflags! {
    #[derive(Serialize)]
    pub struct FieldAccess: u16 {
        const ACC_PUBLIC = 0x1;
        const ACC_PRIVATE = 0x2;
        const ACC_PROTECTED = 0x4;
        const ACC_STATIC = 0x8;
        const ACC_FINAL = 0x10;
        const ACC_VOLATILE = 0x40;
        const ACC_TRANSIENT = 0x80;
        const ACC_SYNTHETIC = 0x1000;
        const ACC_ENUM = 0x4000;
    }
}

bitflags! {
    #[derive(Serialize)]
    pub struct MethodAccess: u16 {
        const ACC_PUBLIC = 0x1;
        const ACC_PRIVATE = 0x2;
        const ACC_PROTECTED = 0x4;
        const ACC_STATIC = 0x8;
        const ACC_FINAL = 0x10;
        const ACC_SYNCHRONIZED = 0x20;
        const ACC_BRIDGE = 0x40;
        const ACC_VARARGS = 0x80;
        const ACC_NATIVE = 0x100;
        const ACC_ABSTRACT = 0x400;
        const ACC_STRICT = 0x800;
        const ACC_SYNTHETIC = 0x1000;
    }
}

// Tables are in ascending bit order, which is also the order modifiers are printed in.
const CLASS_KEYWORDS: &[(u16, &str)] = &[(0x1, "public"), (0x10, "final"), (0x400, "abstract")];
const FIELD_KEYWORDS: &[(u16, &str)] = &[
    (0x1, "public"), (0x2, "private"), (0x4, "protected"), (0x8, "static"),
    (0x10, "final"), (0x40, "volatile"), (0x80, "transient"),
];
const METHOD_KEYWORDS: &[(u16, &str)] = &[
    (0x1, "public"), (0x2, "private"), (0x4, "protected"), (0x8, "static"),
    (0x10, "final"), (0x20, "synchronized"), (0x100, "native"), (0x400, "abstract"),
    (0x800, "strictfp"),
];

const CLASS_FLAG_NAMES: &[(u16, &str)] = &[
    (0x1, "ACC_PUBLIC"), (0x10, "ACC_FINAL"), (0x20, "ACC_SUPER"), (0x200, "ACC_INTERFACE"),
    (0x400, "ACC_ABSTRACT"), (0x1000, "ACC_SYNTHETIC"), (0x2000, "ACC_ANNOTATION"),
    (0x4000, "ACC_ENUM"), (0x8000, "ACC_MODULE"),
];
const FIELD_FLAG_NAMES: &[(u16, &str)] = &[
    (0x1, "ACC_PUBLIC"), (0x2, "ACC_PRIVATE"), (0x4, "ACC_PROTECTED"), (0x8, "ACC_STATIC"),
    (0x10, "ACC_FINAL"), (0x40, "ACC_VOLATILE"), (0x80, "ACC_TRANSIENT"),
    (0x1000, "ACC_SYNTHETIC"), (0x4000, "ACC_ENUM"),
];
const METHOD_FLAG_NAMES: &[(u16, &str)] = &[
    (0x1, "ACC_PUBLIC"), (0x2, "ACC_PRIVATE"), (0x4, "ACC_PROTECTED"), (0x8, "ACC_STATIC"),
    (0x10, "ACC_FINAL"), (0x20, "ACC_SYNCHRONIZED"), (0x40, "ACC_BRIDGE"), (0x80, "ACC_VARARGS"),
    (0x100, "ACC_NATIVE"), (0x400, "ACC_ABSTRACT"), (0x800, "ACC_STRICT"), (0x1000, "ACC_SYNTHETIC"),
];

fn select(bits: u16, table: &[(u16, &'static str)]) -> Vec<&'static str> {
    table.iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|&(_, name)| name)
        .collect()
}

impl ClassAccess {
    /// Source modifiers, `abstract` left out for interfaces.
    pub fn keywords(self) -> Vec<&'static str> {
        let mut bits = self.bits();
        if self.contains(ClassAccess::ACC_INTERFACE) {
            bits &= !ClassAccess::ACC_ABSTRACT.bits();
        }
        select(bits, CLASS_KEYWORDS)
    }
    pub fn flag_names(self) -> Vec<&'static str> {
        select(self.bits(), CLASS_FLAG_NAMES)
    }
}

impl FieldAccess {
    pub fn keywords(self) -> Vec<&'static str> {
        select(self.bits(), FIELD_KEYWORDS)
    }
    pub fn flag_names(self) -> Vec<&'static str> {
        select(self.bits(), FIELD_FLAG_NAMES)
    }
}

impl MethodAccess {
    pub fn keywords(self) -> Vec<&'static str> {
        select(self.bits(), METHOD_KEYWORDS)
    }
    pub fn flag_names(self) -> Vec<&'static str> {
        select(self.bits(), METHOD_FLAG_NAMES)
    }
}

/// Parses a class file without rendering it.
pub fn parse(bytes: &[u8]) -> Result<ClassFile> {
    ClassReader::new(bytes).read()
}

/// Parses and renders a class file with the default listing options.
pub fn disassemble(bytes: &[u8]) -> Result<String> {
    disassemble_with_flags(bytes, DisassemblerFlags::empty())
}

pub fn disassemble_with_flags(bytes: &[u8], flags: DisassemblerFlags) -> Result<String> {
    let class = parse(bytes)?;
    Disassembler::new(&class, flags).render()
}

/// Parses a class file into a fully resolved, serializable tree.
#[cfg(feature = "tree")]
pub fn parse_tree(bytes: &[u8]) -> Result<tree::ClassNode> {
    tree::ClassNode::new(&parse(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_follow_bit_order() {
        let flags = MethodAccess::ACC_FINAL | MethodAccess::ACC_STATIC | MethodAccess::ACC_PUBLIC;
        assert_eq!(flags.keywords(), vec!["public", "static", "final"]);
        assert_eq!(flags.keywords(), flags.keywords());
        let flags = MethodAccess::ACC_SYNCHRONIZED | MethodAccess::ACC_BRIDGE | MethodAccess::ACC_PRIVATE;
        assert_eq!(flags.keywords(), vec!["private", "synchronized"]);
    }

    #[test]
    fn interface_drops_abstract() {
        let flags = ClassAccess::ACC_PUBLIC | ClassAccess::ACC_INTERFACE | ClassAccess::ACC_ABSTRACT;
        assert_eq!(flags.keywords(), vec!["public"]);
        let flags = ClassAccess::ACC_PUBLIC | ClassAccess::ACC_ABSTRACT | ClassAccess::ACC_SUPER;
        assert_eq!(flags.keywords(), vec!["public", "abstract"]);
        assert_eq!(flags.flag_names(), vec!["ACC_PUBLIC", "ACC_SUPER", "ACC_ABSTRACT"]);
    }

    #[test]
    fn shared_bits_name_per_member_kind() {
        assert_eq!(FieldAccess::from_bits_truncate(0x40).keywords(), vec!["volatile"]);
        assert_eq!(MethodAccess::from_bits_truncate(0x40).flag_names(), vec!["ACC_BRIDGE"]);
        assert_eq!(FieldAccess::from_bits_truncate(0x80).flag_names(), vec!["ACC_TRANSIENT"]);
        assert_eq!(MethodAccess::from_bits_truncate(0x80).flag_names(), vec!["ACC_VARARGS"]);
    }
}
