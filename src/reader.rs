use super::{ClassAccess, FieldAccess, MethodAccess};
use crate::classfile::*;
use crate::constant_pool::ConstantPool;
use crate::cursor::ByteCursor;
use crate::error::{ClassDecodeError, Result};
use crate::opcodes::CLASS_MAGIC;

/// Single forward pass over a class file, producing a [`ClassFile`].
pub struct ClassReader<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> ClassReader<'a> {
    pub fn new(bytes: &'a [u8]) -> ClassReader<'a> {
        ClassReader {
            cursor: ByteCursor::new(bytes),
        }
    }

    pub fn read(mut self) -> Result<ClassFile> {
        let magic = self.cursor.read_u4()?;
        if magic != CLASS_MAGIC {
            return Err(ClassDecodeError::BadMagic { found: magic });
        }
        let minor_version = self.cursor.read_u2()?;
        let major_version = self.cursor.read_u2()?;
        let constant_pool = ConstantPool::read(&mut self.cursor)?;
        let access = ClassAccess::from_bits_truncate(self.cursor.read_u2()?);
        let this_class = self.cursor.read_u2()?;
        let super_class = self.cursor.read_u2()?;
        let interfaces_count = self.cursor.read_u2()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(self.cursor.read_u2()?);
        }
        let fields_count = self.cursor.read_u2()?;
        let mut fields = Vec::with_capacity(fields_count as usize);
        for _ in 0..fields_count {
            fields.push(FieldInfo {
                access: FieldAccess::from_bits_truncate(self.cursor.read_u2()?),
                name_index: self.cursor.read_u2()?,
                descriptor_index: self.cursor.read_u2()?,
                attributes: read_attributes(&mut self.cursor, &constant_pool)?,
            });
        }
        let methods_count = self.cursor.read_u2()?;
        let mut methods = Vec::with_capacity(methods_count as usize);
        for _ in 0..methods_count {
            methods.push(MethodInfo {
                access: MethodAccess::from_bits_truncate(self.cursor.read_u2()?),
                name_index: self.cursor.read_u2()?,
                descriptor_index: self.cursor.read_u2()?,
                attributes: read_attributes(&mut self.cursor, &constant_pool)?,
            });
        }
        let attributes = read_attributes(&mut self.cursor, &constant_pool)?;
        if !self.cursor.is_empty() {
            return Err(ClassDecodeError::TrailingBytes {
                offset: self.cursor.offset(),
                count: self.cursor.remaining(),
            });
        }
        log::debug!(
            "read class file v{}.{}: {} constant pool slots, {} fields, {} methods, {} attributes",
            major_version, minor_version, constant_pool.count(), fields.len(), methods.len(), attributes.len()
        );
        Ok(ClassFile {
            magic,
            minor_version,
            major_version,
            constant_pool,
            access,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }
}

fn read_attributes(cursor: &mut ByteCursor, pool: &ConstantPool) -> Result<Vec<Attribute>> {
    let count = cursor.read_u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        attributes.push(read_attribute(cursor, pool)?);
    }
    Ok(attributes)
}

/// Reads the generic `(name, length, body)` frame, then specializes the body
/// by name. The body must be consumed exactly.
fn read_attribute(cursor: &mut ByteCursor, pool: &ConstantPool) -> Result<Attribute> {
    let name_index = cursor.read_u2()?;
    let length = cursor.read_u4()? as usize;
    let offset = cursor.offset();
    let info = cursor.read_bytes(length)?;
    let name = pool.utf8(name_index)?;
    log::trace!("attribute {} ({} bytes) at offset {}", name, length, offset);
    let mut body = ByteCursor::with_base(info, offset);
    match read_known_attribute(name, &mut body, pool) {
        Ok(Some(attribute)) if body.is_empty() => Ok(attribute),
        Ok(Some(_)) | Err(ClassDecodeError::TruncatedInput { .. }) => Err(ClassDecodeError::malformed(&**name)),
        Ok(None) => Ok(Attribute::Unknown {
            name_index,
            info: info.to_vec(),
        }),
        Err(e) => Err(e),
    }
}

fn read_u2_table(body: &mut ByteCursor) -> Result<Vec<u16>> {
    let count = body.read_u2()?;
    let mut table = Vec::with_capacity(count as usize);
    for _ in 0..count {
        table.push(body.read_u2()?);
    }
    Ok(table)
}

fn read_known_attribute(name: &str, body: &mut ByteCursor, pool: &ConstantPool) -> Result<Option<Attribute>> {
    let attribute = match name {
        "Code" => Attribute::Code(read_code(body, pool)?),
        "ConstantValue" => Attribute::ConstantValue { constantvalue_index: body.read_u2()? },
        "Exceptions" => Attribute::Exceptions { exception_index_table: read_u2_table(body)? },
        "SourceFile" => Attribute::SourceFile { sourcefile_index: body.read_u2()? },
        "Signature" => Attribute::Signature { signature_index: body.read_u2()? },
        "LineNumberTable" => {
            let count = body.read_u2()?;
            let mut lines = Vec::with_capacity(count as usize);
            for _ in 0..count {
                lines.push(LineNumber {
                    start_pc: body.read_u2()?,
                    line_number: body.read_u2()?,
                });
            }
            Attribute::LineNumberTable(lines)
        },
        "LocalVariableTable" => {
            let count = body.read_u2()?;
            let mut vars = Vec::with_capacity(count as usize);
            for _ in 0..count {
                vars.push(LocalVariable {
                    start_pc: body.read_u2()?,
                    length: body.read_u2()?,
                    name_index: body.read_u2()?,
                    descriptor_index: body.read_u2()?,
                    index: body.read_u2()?,
                });
            }
            Attribute::LocalVariableTable(vars)
        },
        "Deprecated" => Attribute::Deprecated,
        "Synthetic" => Attribute::Synthetic,
        _ => return Ok(None),
    };
    Ok(Some(attribute))
}

fn read_code(body: &mut ByteCursor, pool: &ConstantPool) -> Result<CodeAttribute> {
    let max_stack = body.read_u2()?;
    let max_locals = body.read_u2()?;
    let code_length = body.read_u4()? as usize;
    if code_length == 0 || code_length >= 65536 {
        return Err(ClassDecodeError::malformed("Code"));
    }
    let code = body.read_bytes(code_length)?.to_vec();
    let table_length = body.read_u2()?;
    let mut exception_table = Vec::with_capacity(table_length as usize);
    for _ in 0..table_length {
        exception_table.push(ExceptionTableEntry {
            start_pc: body.read_u2()?,
            end_pc: body.read_u2()?,
            handler_pc: body.read_u2()?,
            catch_type: body.read_u2()?,
        });
    }
    let attributes = read_attributes(body, pool)?;
    log::trace!("code: {} bytes, max_stack {}, max_locals {}, {} handlers", code_length, max_stack, max_locals, exception_table.len());
    Ok(CodeAttribute {
        max_stack,
        max_locals,
        code,
        exception_table,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{u2, ClassBuilder};

    fn hello() -> Vec<u8> {
        let mut builder = ClassBuilder::new("Hello");
        let out = builder.field_ref("java/lang/System", "out", "Ljava/io/PrintStream;");
        let println = builder.method_ref("java/io/PrintStream", "println", "()V");
        let [o1, o2] = u2(out);
        let [p1, p2] = u2(println);
        let lines = builder.attribute("LineNumberTable", &[0, 1, 0, 0, 0, 3]);
        let code = builder.code(2, 1, &[0xb2, o1, o2, 0xb6, p1, p2, 0xb1], &[], vec![lines]);
        let thrown = builder.class("java/io/IOException");
        let exceptions = builder.attribute("Exceptions", &[0, 1, u2(thrown)[0], u2(thrown)[1]]);
        builder
            .field(0x1a, "COUNT", "I", vec![])
            .method(0x1, "run", "()V", vec![code, exceptions])
            .source_file("Hello.java");
        builder.build()
    }

    #[test]
    fn reads_members_and_attributes() {
        let class = ClassReader::new(&hello()).read().unwrap();
        assert_eq!(class.major_version, 52);
        assert_eq!(class.name(), Ok("Hello".to_string()));
        assert_eq!(class.super_name(), Ok(Some("java.lang.Object".to_string())));
        assert_eq!(class.fields.len(), 1);
        assert!(class.fields[0].access.contains(FieldAccess::ACC_STATIC | FieldAccess::ACC_FINAL));
        let method = &class.methods[0];
        assert_eq!(&**method.name(&class.constant_pool).unwrap(), "run");
        let code = method.code().unwrap();
        assert_eq!(code.code.len(), 7);
        assert_eq!(code.line_numbers().collect::<Vec<_>>(), vec![&LineNumber { start_pc: 0, line_number: 3 }]);
        let thrown = method.exceptions().unwrap();
        assert_eq!(class.constant_pool.resolve_class_name(thrown[0]), Ok("java.io.IOException".to_string()));
        assert_eq!(class.source_file().unwrap().map(|s| s.to_string()), Some("Hello.java".to_string()));
    }

    #[test]
    fn bad_magic_stops_immediately() {
        assert_eq!(
            ClassReader::new(&[0xCA, 0xFE, 0xBA, 0xBF]).read(),
            Err(ClassDecodeError::BadMagic { found: 0xCAFEBABF })
        );
    }

    #[test]
    fn every_prefix_is_truncated() {
        let bytes = hello();
        for k in 0..bytes.len() {
            match ClassReader::new(&bytes[..k]).read() {
                Err(ClassDecodeError::TruncatedInput { offset }) => assert!(offset <= k, "prefix {}", k),
                other => panic!("prefix {} gave {:?}", k, other),
            }
        }
    }

    #[test]
    fn unknown_attributes_are_kept() {
        let mut builder = ClassBuilder::new("A");
        let custom = builder.attribute("com.example.Custom", &[1, 2, 3]);
        builder.class_attribute(custom);
        let class = ClassReader::new(&builder.build()).read().unwrap();
        match &class.attributes[0] {
            Attribute::Unknown { name_index, info } => {
                assert_eq!(&**class.constant_pool.utf8(*name_index).unwrap(), "com.example.Custom");
                assert_eq!(info, &vec![1, 2, 3]);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn attribute_length_must_match_body() {
        let mut builder = ClassBuilder::new("A");
        let name = builder.utf8("A.java");
        let [n1, n2] = u2(name);
        let long = builder.attribute("SourceFile", &[n1, n2, 0]);
        builder.class_attribute(long);
        assert_eq!(ClassReader::new(&builder.build()).read(), Err(ClassDecodeError::malformed("SourceFile")));

        let mut builder = ClassBuilder::new("A");
        let short = builder.attribute("SourceFile", &[n1]);
        builder.class_attribute(short);
        assert_eq!(ClassReader::new(&builder.build()).read(), Err(ClassDecodeError::malformed("SourceFile")));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = ClassBuilder::new("A").build();
        let end = bytes.len();
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(
            ClassReader::new(&bytes).read(),
            Err(ClassDecodeError::TrailingBytes { offset: end, count: 2 })
        );
    }

    #[test]
    fn long_constants_shadow_the_next_slot() {
        let mut builder = ClassBuilder::new("A");
        let long = builder.long(1 << 40);
        let after = builder.utf8("after");
        assert_eq!(after, long + 2);
        let class = ClassReader::new(&builder.build()).read().unwrap();
        assert_eq!(class.constant_pool.long(long), Ok(1 << 40));
        assert_eq!(
            class.constant_pool.get(long + 1),
            Err(ClassDecodeError::ConstantPoolIndexOutOfRange { index: long + 1 })
        );
        assert_eq!(&**class.constant_pool.utf8(after).unwrap(), "after");
    }
}
