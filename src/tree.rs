use super::{ClassAccess, FieldAccess, MethodAccess};
use crate::classfile::{Attribute, ClassFile, CodeAttribute, FieldInfo, MethodInfo};
use crate::constant_pool::{ClassConstant, ConstantPool, NameAndType};
use crate::error::Result;
use crate::insn::{self, Instruction};
use serde::Serialize;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassVersion {
    pub major: u16,
    pub minor: u16,
}

fn signature(pool: &ConstantPool, attributes: &[Attribute]) -> Result<Option<Rc<str>>> {
    for attr in attributes {
        if let Attribute::Signature { signature_index } = attr {
            return pool.utf8(*signature_index).map(|s| Some(s.clone()));
        }
    }
    Ok(None)
}

fn is_deprecated(attributes: &[Attribute]) -> bool {
    attributes.iter().any(|a| *a == Attribute::Deprecated)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldNode {
    pub access: FieldAccess,
    pub id: NameAndType,
    pub signature: Option<Rc<str>>,
    pub value: Option<ClassConstant>,
    pub deprecated: bool,
}

impl FieldNode {
    pub fn new(pool: &ConstantPool, field: &FieldInfo) -> Result<FieldNode> {
        let value = match field.constant_value_index() {
            Some(index) => Some(pool.constant(index)?),
            None => None,
        };
        Ok(FieldNode {
            access: field.access,
            id: NameAndType {
                name: field.name(pool)?.clone(),
                descriptor: field.descriptor(pool)?.clone(),
            },
            signature: signature(pool, &field.attributes)?,
            value,
            deprecated: is_deprecated(&field.attributes),
        })
    }
}

/// One exception handler; pcs are offsets into the method's code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TryCatchBlockNode {
    pub start: u16,
    pub end: u16,
    pub handler: u16,
    pub catch_type: Option<Rc<str>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineNumberNode {
    pub line: u16,
    pub start: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalVariableNode {
    pub id: NameAndType,
    pub start: u16,
    pub length: u16,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeNode {
    pub max_stack: u16,
    pub max_locals: u16,
    pub instructions: Vec<Instruction>,
    pub try_catch_blocks: Vec<TryCatchBlockNode>,
    pub line_numbers: Vec<LineNumberNode>,
    pub local_variables: Vec<LocalVariableNode>,
}

impl CodeNode {
    pub fn new(pool: &ConstantPool, code: &CodeAttribute) -> Result<CodeNode> {
        let try_catch_blocks = code.exception_table.iter()
            .map(|e| -> Result<TryCatchBlockNode> {
                let catch_type = if e.catch_type == 0 {
                    None
                } else {
                    Some(pool.class_name(e.catch_type)?.clone())
                };
                Ok(TryCatchBlockNode {
                    start: e.start_pc,
                    end: e.end_pc,
                    handler: e.handler_pc,
                    catch_type,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let local_variables = code.local_variables()
            .map(|v| -> Result<LocalVariableNode> {
                Ok(LocalVariableNode {
                    id: NameAndType {
                        name: pool.utf8(v.name_index)?.clone(),
                        descriptor: pool.utf8(v.descriptor_index)?.clone(),
                    },
                    start: v.start_pc,
                    length: v.length,
                    index: v.index,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CodeNode {
            max_stack: code.max_stack,
            max_locals: code.max_locals,
            instructions: insn::decode(&code.code)?,
            try_catch_blocks,
            line_numbers: code.line_numbers()
                .map(|l| LineNumberNode { line: l.line_number, start: l.start_pc })
                .collect(),
            local_variables,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodNode {
    pub access: MethodAccess,
    pub id: NameAndType,
    pub exceptions: Vec<Rc<str>>,
    pub signature: Option<Rc<str>>,
    pub code: Option<CodeNode>,
    pub deprecated: bool,
}

impl MethodNode {
    pub fn new(pool: &ConstantPool, method: &MethodInfo) -> Result<MethodNode> {
        let exceptions = method.exceptions()
            .unwrap_or(&[])
            .iter()
            .map(|&i| pool.class_name(i).map(Rc::clone))
            .collect::<Result<Vec<_>>>()?;
        let code = match method.code() {
            Some(code) => Some(CodeNode::new(pool, code)?),
            None => None,
        };
        let id = NameAndType {
            name: method.name(pool)?.clone(),
            descriptor: method.descriptor(pool)?.clone(),
        };
        log::debug!("resolved method {}{}", id.name, id.descriptor);
        Ok(MethodNode {
            access: method.access,
            id,
            exceptions,
            signature: signature(pool, &method.attributes)?,
            code,
            deprecated: is_deprecated(&method.attributes),
        })
    }
}

/// A class file with every index resolved and every method body decoded.
/// Names keep their internal `/` form; the raw constant pool is carried along.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassNode {
    pub version: ClassVersion,
    pub access: ClassAccess,
    pub name: Rc<str>,
    pub super_name: Option<Rc<str>>,
    pub interfaces: Vec<Rc<str>>,
    pub signature: Option<Rc<str>>,
    pub source_name: Option<Rc<str>>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
    pub constant_pool: ConstantPool,
}

impl ClassNode {
    pub fn new(class: &ClassFile) -> Result<ClassNode> {
        let pool = &class.constant_pool;
        let super_name = if class.super_class == 0 {
            None
        } else {
            Some(pool.class_name(class.super_class)?.clone())
        };
        let interfaces = class.interfaces.iter()
            .map(|&i| pool.class_name(i).map(Rc::clone))
            .collect::<Result<Vec<_>>>()?;
        let fields = class.fields.iter()
            .map(|f| FieldNode::new(pool, f))
            .collect::<Result<Vec<_>>>()?;
        let methods = class.methods.iter()
            .map(|m| MethodNode::new(pool, m))
            .collect::<Result<Vec<_>>>()?;
        Ok(ClassNode {
            version: ClassVersion {
                major: class.major_version,
                minor: class.minor_version,
            },
            access: class.access,
            name: pool.class_name(class.this_class)?.clone(),
            super_name,
            interfaces,
            signature: signature(pool, &class.attributes)?,
            source_name: class.source_file()?.cloned(),
            fields,
            methods,
            constant_pool: pool.clone(),
        })
    }
}
