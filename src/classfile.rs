use super::{ClassAccess, FieldAccess, MethodAccess};
use crate::constant_pool::ConstantPool;
use crate::error::Result;
use serde::Serialize;
use std::rc::Rc;

/// A parsed class file. Indices are kept raw; names are resolved through
/// [`ClassFile::constant_pool`] on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access: ClassAccess,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Display name of this class.
    pub fn name(&self) -> Result<String> {
        self.constant_pool.resolve_class_name(self.this_class)
    }
    /// Display name of the superclass, `None` for a class without one.
    pub fn super_name(&self) -> Result<Option<String>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.resolve_class_name(self.super_class).map(Some)
    }
    pub fn interface_names(&self) -> Result<Vec<String>> {
        self.interfaces.iter()
            .map(|&i| self.constant_pool.resolve_class_name(i))
            .collect()
    }
    pub fn source_file(&self) -> Result<Option<&Rc<str>>> {
        for attr in &self.attributes {
            if let Attribute::SourceFile { sourcefile_index } = attr {
                return self.constant_pool.utf8(*sourcefile_index).map(Some);
            }
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub access: FieldAccess,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl FieldInfo {
    pub fn name<'a>(&self, pool: &'a ConstantPool) -> Result<&'a Rc<str>> {
        pool.utf8(self.name_index)
    }
    pub fn descriptor<'a>(&self, pool: &'a ConstantPool) -> Result<&'a Rc<str>> {
        pool.utf8(self.descriptor_index)
    }
    pub fn constant_value_index(&self) -> Option<u16> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::ConstantValue { constantvalue_index } => Some(*constantvalue_index),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodInfo {
    pub access: MethodAccess,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl MethodInfo {
    pub fn name<'a>(&self, pool: &'a ConstantPool) -> Result<&'a Rc<str>> {
        pool.utf8(self.name_index)
    }
    pub fn descriptor<'a>(&self, pool: &'a ConstantPool) -> Result<&'a Rc<str>> {
        pool.utf8(self.descriptor_index)
    }
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }
    /// Class indices of the checked exceptions the method declares.
    pub fn exceptions(&self) -> Option<&[u16]> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::Exceptions { exception_index_table } => Some(&exception_index_table[..]),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    pub fn line_numbers(&self) -> impl Iterator<Item = &LineNumber> {
        self.attributes.iter().filter_map(|a| match a {
            Attribute::LineNumberTable(lines) => Some(lines.iter()),
            _ => None,
        }).flatten()
    }
    pub fn local_variables(&self) -> impl Iterator<Item = &LocalVariable> {
        self.attributes.iter().filter_map(|a| match a {
            Attribute::LocalVariableTable(vars) => Some(vars.iter()),
            _ => None,
        }).flatten()
    }
}

/// One row of a method's exception table. A `catch_type` of 0 catches everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

/// Attributes this crate understands, plus an opaque fallback that preserves
/// the body of anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Attribute {
    Code(CodeAttribute),
    ConstantValue { constantvalue_index: u16 },
    Exceptions { exception_index_table: Vec<u16> },
    SourceFile { sourcefile_index: u16 },
    Signature { signature_index: u16 },
    LineNumberTable(Vec<LineNumber>),
    LocalVariableTable(Vec<LocalVariable>),
    Deprecated,
    Synthetic,
    Unknown { name_index: u16, info: Vec<u8> },
}
