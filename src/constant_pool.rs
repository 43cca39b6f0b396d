use crate::cursor::ByteCursor;
use crate::error::{ClassDecodeError, Result};
use serde::Serialize;
use std::{fmt, rc::Rc};

/// Constant pool entry kinds, with the tag byte each is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConstantTag {
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    FieldRef,
    MethodRef,
    InterfaceMethodRef,
    NameAndType,
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic,
    Module,
    Package,
}

impl ConstantTag {
    pub fn from_u8(tag: u8) -> Option<ConstantTag> {
        let tag = match tag {
            1 => ConstantTag::Utf8,
            3 => ConstantTag::Integer,
            4 => ConstantTag::Float,
            5 => ConstantTag::Long,
            6 => ConstantTag::Double,
            7 => ConstantTag::Class,
            8 => ConstantTag::String,
            9 => ConstantTag::FieldRef,
            10 => ConstantTag::MethodRef,
            11 => ConstantTag::InterfaceMethodRef,
            12 => ConstantTag::NameAndType,
            15 => ConstantTag::MethodHandle,
            16 => ConstantTag::MethodType,
            17 => ConstantTag::Dynamic,
            18 => ConstantTag::InvokeDynamic,
            19 => ConstantTag::Module,
            20 => ConstantTag::Package,
            _ => return None,
        };
        Some(tag)
    }
    pub fn value(self) -> u8 {
        match self {
            ConstantTag::Utf8 => 1,
            ConstantTag::Integer => 3,
            ConstantTag::Float => 4,
            ConstantTag::Long => 5,
            ConstantTag::Double => 6,
            ConstantTag::Class => 7,
            ConstantTag::String => 8,
            ConstantTag::FieldRef => 9,
            ConstantTag::MethodRef => 10,
            ConstantTag::InterfaceMethodRef => 11,
            ConstantTag::NameAndType => 12,
            ConstantTag::MethodHandle => 15,
            ConstantTag::MethodType => 16,
            ConstantTag::Dynamic => 17,
            ConstantTag::InvokeDynamic => 18,
            ConstantTag::Module => 19,
            ConstantTag::Package => 20,
        }
    }
    /// The name listing tools print for this kind of entry.
    pub fn name(self) -> &'static str {
        match self {
            ConstantTag::Utf8 => "Utf8",
            ConstantTag::Integer => "Integer",
            ConstantTag::Float => "Float",
            ConstantTag::Long => "Long",
            ConstantTag::Double => "Double",
            ConstantTag::Class => "Class",
            ConstantTag::String => "String",
            ConstantTag::FieldRef => "Fieldref",
            ConstantTag::MethodRef => "Methodref",
            ConstantTag::InterfaceMethodRef => "InterfaceMethodref",
            ConstantTag::NameAndType => "NameAndType",
            ConstantTag::MethodHandle => "MethodHandle",
            ConstantTag::MethodType => "MethodType",
            ConstantTag::Dynamic => "Dynamic",
            ConstantTag::InvokeDynamic => "InvokeDynamic",
            ConstantTag::Module => "Module",
            ConstantTag::Package => "Package",
        }
    }
}

impl fmt::Display for ConstantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConstantPoolEntry {
    Utf8(Rc<str>),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl ConstantPoolEntry {
    pub fn tag(&self) -> ConstantTag {
        match self {
            ConstantPoolEntry::Utf8(_) => ConstantTag::Utf8,
            ConstantPoolEntry::Integer(_) => ConstantTag::Integer,
            ConstantPoolEntry::Float(_) => ConstantTag::Float,
            ConstantPoolEntry::Long(_) => ConstantTag::Long,
            ConstantPoolEntry::Double(_) => ConstantTag::Double,
            ConstantPoolEntry::Class { .. } => ConstantTag::Class,
            ConstantPoolEntry::String { .. } => ConstantTag::String,
            ConstantPoolEntry::FieldRef { .. } => ConstantTag::FieldRef,
            ConstantPoolEntry::MethodRef { .. } => ConstantTag::MethodRef,
            ConstantPoolEntry::InterfaceMethodRef { .. } => ConstantTag::InterfaceMethodRef,
            ConstantPoolEntry::NameAndType { .. } => ConstantTag::NameAndType,
            ConstantPoolEntry::MethodHandle { .. } => ConstantTag::MethodHandle,
            ConstantPoolEntry::MethodType { .. } => ConstantTag::MethodType,
            ConstantPoolEntry::Dynamic { .. } => ConstantTag::Dynamic,
            ConstantPoolEntry::InvokeDynamic { .. } => ConstantTag::InvokeDynamic,
            ConstantPoolEntry::Module { .. } => ConstantTag::Module,
            ConstantPoolEntry::Package { .. } => ConstantTag::Package,
        }
    }
    /// Long and Double take up two pool slots; the second is unusable.
    pub fn is_wide(&self) -> bool {
        matches!(self, ConstantPoolEntry::Long(_) | ConstantPoolEntry::Double(_))
    }
    fn read(cursor: &mut ByteCursor, index: u16) -> Result<ConstantPoolEntry> {
        let offset = cursor.offset();
        let raw_tag = cursor.read_u1()?;
        let tag = ConstantTag::from_u8(raw_tag)
            .ok_or(ClassDecodeError::UnrecognizedConstantPoolTag { tag: raw_tag, offset })?;
        let entry = match tag {
            ConstantTag::Utf8 => {
                let len = cursor.read_u2()? as usize;
                let bytes = cursor.read_bytes(len)?;
                let text = cesu8::from_java_cesu8(bytes)
                    .map_err(|_| ClassDecodeError::InvalidUtf8 { index })?;
                ConstantPoolEntry::Utf8(Rc::from(&*text))
            },
            ConstantTag::Integer => ConstantPoolEntry::Integer(cursor.read_i4()?),
            ConstantTag::Float => ConstantPoolEntry::Float(cursor.read_f4()?),
            ConstantTag::Long => ConstantPoolEntry::Long(cursor.read_i8()?),
            ConstantTag::Double => ConstantPoolEntry::Double(cursor.read_f8()?),
            ConstantTag::Class => ConstantPoolEntry::Class { name_index: cursor.read_u2()? },
            ConstantTag::String => ConstantPoolEntry::String { string_index: cursor.read_u2()? },
            ConstantTag::FieldRef => ConstantPoolEntry::FieldRef {
                class_index: cursor.read_u2()?,
                name_and_type_index: cursor.read_u2()?,
            },
            ConstantTag::MethodRef => ConstantPoolEntry::MethodRef {
                class_index: cursor.read_u2()?,
                name_and_type_index: cursor.read_u2()?,
            },
            ConstantTag::InterfaceMethodRef => ConstantPoolEntry::InterfaceMethodRef {
                class_index: cursor.read_u2()?,
                name_and_type_index: cursor.read_u2()?,
            },
            ConstantTag::NameAndType => ConstantPoolEntry::NameAndType {
                name_index: cursor.read_u2()?,
                descriptor_index: cursor.read_u2()?,
            },
            ConstantTag::MethodHandle => ConstantPoolEntry::MethodHandle {
                reference_kind: cursor.read_u1()?,
                reference_index: cursor.read_u2()?,
            },
            ConstantTag::MethodType => ConstantPoolEntry::MethodType { descriptor_index: cursor.read_u2()? },
            ConstantTag::Dynamic => ConstantPoolEntry::Dynamic {
                bootstrap_method_attr_index: cursor.read_u2()?,
                name_and_type_index: cursor.read_u2()?,
            },
            ConstantTag::InvokeDynamic => ConstantPoolEntry::InvokeDynamic {
                bootstrap_method_attr_index: cursor.read_u2()?,
                name_and_type_index: cursor.read_u2()?,
            },
            ConstantTag::Module => ConstantPoolEntry::Module { name_index: cursor.read_u2()? },
            ConstantTag::Package => ConstantPoolEntry::Package { name_index: cursor.read_u2()? },
        };
        Ok(entry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameAndType {
    pub name: Rc<str>,
    pub descriptor: Rc<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemberKind {
    Field,
    Method,
    InterfaceMethod,
}

impl MemberKind {
    pub fn label(self) -> &'static str {
        match self {
            MemberKind::Field => "Field",
            MemberKind::Method => "Method",
            MemberKind::InterfaceMethod => "InterfaceMethod",
        }
    }
}

/// A resolved field, method or interface method reference.
/// `class_name` is in display form (`java.lang.Object`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRef {
    pub kind: MemberKind,
    pub class_name: String,
    pub name: Rc<str>,
    pub descriptor: Rc<str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Handle {
    pub kind: u8,
    pub member: MemberRef,
}

impl Handle {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            1 => "REF_getField",
            2 => "REF_getStatic",
            3 => "REF_putField",
            4 => "REF_putStatic",
            5 => "REF_invokeVirtual",
            6 => "REF_invokeStatic",
            7 => "REF_invokeSpecial",
            8 => "REF_newInvokeSpecial",
            9 => "REF_invokeInterface",
            _ => "REF_unknown",
        }
    }
}

/// `Dynamic`/`InvokeDynamic` entries: a bootstrap method slot plus a name and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicRef {
    pub bootstrap_method: u16,
    pub name_and_type: NameAndType,
}

/// A constant that `ldc`, `ldc_w` and `ldc2_w` can push.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ClassConstant {
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Class(String),
    String(Rc<str>),
    MethodType(Rc<str>),
    MethodHandle(Handle),
    ConstantDynamic(DynamicRef),
}

/// Replaces the internal `/` package separator with `.`.
pub fn display_name(internal: &str) -> String {
    internal.replace('/', ".")
}

/// The constant pool, addressed by its 1-based indices.
///
/// Slot 0 and the slot after every Long/Double hold `None` and cannot be
/// resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantPool {
    entries: Vec<Option<ConstantPoolEntry>>,
}

fn mismatch(index: u16, expected: ConstantTag, actual: &ConstantPoolEntry) -> ClassDecodeError {
    ClassDecodeError::ConstantPoolTypeMismatch {
        index,
        expected,
        actual: actual.tag(),
    }
}

impl ConstantPool {
    pub(crate) fn read(cursor: &mut ByteCursor) -> Result<ConstantPool> {
        let count = cursor.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(None);
        let mut i = 1;
        while i < count {
            let offset = cursor.offset();
            let entry = ConstantPoolEntry::read(cursor, i as u16)?;
            log::trace!("constant pool #{} at offset {}: {:?}", i, offset, entry);
            let wide = entry.is_wide();
            entries.push(Some(entry));
            if wide {
                // the second slot of a Long/Double must still lie inside the pool
                if i + 1 >= count {
                    return Err(ClassDecodeError::ConstantPoolIndexOutOfRange { index: (i + 1) as u16 });
                }
                entries.push(None);
                i += 1;
            }
            i += 1;
        }
        Ok(ConstantPool { entries })
    }
    /// Number of slots including the unused slot 0, as stored in the class file.
    pub fn count(&self) -> usize {
        self.entries.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = (u16, &ConstantPoolEntry)> {
        self.entries.iter().enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (i as u16, e)))
    }
    pub fn get(&self, index: u16) -> Result<&ConstantPoolEntry> {
        self.entries.get(index as usize)
            .and_then(|c| c.as_ref())
            .ok_or(ClassDecodeError::ConstantPoolIndexOutOfRange { index })
    }
    pub fn utf8(&self, index: u16) -> Result<&Rc<str>> {
        match self.get(index)? {
            ConstantPoolEntry::Utf8(text) => Ok(text),
            other => Err(mismatch(index, ConstantTag::Utf8, other)),
        }
    }
    /// Class name in internal form (`java/lang/Object`).
    pub fn class_name(&self, index: u16) -> Result<&Rc<str>> {
        match self.get(index)? {
            ConstantPoolEntry::Class { name_index } => self.utf8(*name_index),
            other => Err(mismatch(index, ConstantTag::Class, other)),
        }
    }
    /// Class name in display form (`java.lang.Object`).
    pub fn resolve_class_name(&self, index: u16) -> Result<String> {
        self.class_name(index).map(|c| display_name(c))
    }
    pub fn name_and_type(&self, index: u16) -> Result<NameAndType> {
        match self.get(index)? {
            ConstantPoolEntry::NameAndType { name_index, descriptor_index } => Ok(NameAndType {
                name: self.utf8(*name_index)?.clone(),
                descriptor: self.utf8(*descriptor_index)?.clone(),
            }),
            other => Err(mismatch(index, ConstantTag::NameAndType, other)),
        }
    }
    fn member(&self, kind: MemberKind, class_index: u16, name_and_type_index: u16) -> Result<MemberRef> {
        let class_name = self.resolve_class_name(class_index)?;
        let nat = self.name_and_type(name_and_type_index)?;
        Ok(MemberRef {
            kind,
            class_name,
            name: nat.name,
            descriptor: nat.descriptor,
        })
    }
    pub fn field_ref(&self, index: u16) -> Result<MemberRef> {
        match self.get(index)? {
            ConstantPoolEntry::FieldRef { class_index, name_and_type_index } =>
                self.member(MemberKind::Field, *class_index, *name_and_type_index),
            other => Err(mismatch(index, ConstantTag::FieldRef, other)),
        }
    }
    pub fn method_ref(&self, index: u16) -> Result<MemberRef> {
        match self.get(index)? {
            ConstantPoolEntry::MethodRef { class_index, name_and_type_index } =>
                self.member(MemberKind::Method, *class_index, *name_and_type_index),
            other => Err(mismatch(index, ConstantTag::MethodRef, other)),
        }
    }
    pub fn interface_method_ref(&self, index: u16) -> Result<MemberRef> {
        match self.get(index)? {
            ConstantPoolEntry::InterfaceMethodRef { class_index, name_and_type_index } =>
                self.member(MemberKind::InterfaceMethod, *class_index, *name_and_type_index),
            other => Err(mismatch(index, ConstantTag::InterfaceMethodRef, other)),
        }
    }
    /// A Methodref or InterfaceMethodref, as `invokespecial` and `invokestatic` accept either.
    pub fn invocable_ref(&self, index: u16) -> Result<MemberRef> {
        match self.get(index)? {
            ConstantPoolEntry::InterfaceMethodRef { .. } => self.interface_method_ref(index),
            _ => self.method_ref(index),
        }
    }
    /// Any of the three member reference kinds.
    pub fn member_ref(&self, index: u16) -> Result<MemberRef> {
        match self.get(index)? {
            ConstantPoolEntry::FieldRef { .. } => self.field_ref(index),
            _ => self.invocable_ref(index),
        }
    }
    /// The text of a `String` constant.
    pub fn string(&self, index: u16) -> Result<&Rc<str>> {
        match self.get(index)? {
            ConstantPoolEntry::String { string_index } => self.utf8(*string_index),
            other => Err(mismatch(index, ConstantTag::String, other)),
        }
    }
    pub fn integer(&self, index: u16) -> Result<i32> {
        match self.get(index)? {
            ConstantPoolEntry::Integer(v) => Ok(*v),
            other => Err(mismatch(index, ConstantTag::Integer, other)),
        }
    }
    pub fn float(&self, index: u16) -> Result<f32> {
        match self.get(index)? {
            ConstantPoolEntry::Float(v) => Ok(*v),
            other => Err(mismatch(index, ConstantTag::Float, other)),
        }
    }
    pub fn long(&self, index: u16) -> Result<i64> {
        match self.get(index)? {
            ConstantPoolEntry::Long(v) => Ok(*v),
            other => Err(mismatch(index, ConstantTag::Long, other)),
        }
    }
    pub fn double(&self, index: u16) -> Result<f64> {
        match self.get(index)? {
            ConstantPoolEntry::Double(v) => Ok(*v),
            other => Err(mismatch(index, ConstantTag::Double, other)),
        }
    }
    pub fn method_type(&self, index: u16) -> Result<&Rc<str>> {
        match self.get(index)? {
            ConstantPoolEntry::MethodType { descriptor_index } => self.utf8(*descriptor_index),
            other => Err(mismatch(index, ConstantTag::MethodType, other)),
        }
    }
    pub fn method_handle(&self, index: u16) -> Result<Handle> {
        match self.get(index)? {
            ConstantPoolEntry::MethodHandle { reference_kind, reference_index } => Ok(Handle {
                kind: *reference_kind,
                member: self.member_ref(*reference_index)?,
            }),
            other => Err(mismatch(index, ConstantTag::MethodHandle, other)),
        }
    }
    pub fn dynamic(&self, index: u16) -> Result<DynamicRef> {
        match self.get(index)? {
            ConstantPoolEntry::Dynamic { bootstrap_method_attr_index, name_and_type_index } => Ok(DynamicRef {
                bootstrap_method: *bootstrap_method_attr_index,
                name_and_type: self.name_and_type(*name_and_type_index)?,
            }),
            other => Err(mismatch(index, ConstantTag::Dynamic, other)),
        }
    }
    pub fn invoke_dynamic(&self, index: u16) -> Result<DynamicRef> {
        match self.get(index)? {
            ConstantPoolEntry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => Ok(DynamicRef {
                bootstrap_method: *bootstrap_method_attr_index,
                name_and_type: self.name_and_type(*name_and_type_index)?,
            }),
            other => Err(mismatch(index, ConstantTag::InvokeDynamic, other)),
        }
    }
    pub fn module_name(&self, index: u16) -> Result<&Rc<str>> {
        match self.get(index)? {
            ConstantPoolEntry::Module { name_index } => self.utf8(*name_index),
            other => Err(mismatch(index, ConstantTag::Module, other)),
        }
    }
    pub fn package_name(&self, index: u16) -> Result<&Rc<str>> {
        match self.get(index)? {
            ConstantPoolEntry::Package { name_index } => self.utf8(*name_index),
            other => Err(mismatch(index, ConstantTag::Package, other)),
        }
    }
    /// Resolves an entry `ldc`-family instructions may load.
    pub fn constant(&self, index: u16) -> Result<ClassConstant> {
        let constant = match self.get(index)? {
            ConstantPoolEntry::Integer(v) => ClassConstant::Integer(*v),
            ConstantPoolEntry::Float(v) => ClassConstant::Float(*v),
            ConstantPoolEntry::Long(v) => ClassConstant::Long(*v),
            ConstantPoolEntry::Double(v) => ClassConstant::Double(*v),
            ConstantPoolEntry::String { string_index } => ClassConstant::String(self.utf8(*string_index)?.clone()),
            ConstantPoolEntry::Class { .. } => ClassConstant::Class(self.resolve_class_name(index)?),
            ConstantPoolEntry::MethodType { .. } => ClassConstant::MethodType(self.method_type(index)?.clone()),
            ConstantPoolEntry::MethodHandle { .. } => ClassConstant::MethodHandle(self.method_handle(index)?),
            ConstantPoolEntry::Dynamic { .. } => ClassConstant::ConstantDynamic(self.dynamic(index)?),
            other => return Err(mismatch(index, ConstantTag::String, other)),
        };
        Ok(constant)
    }
}
