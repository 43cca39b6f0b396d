//! Renders a parsed class file as a bytecode listing.
use crate::classfile::{ClassFile, CodeAttribute, FieldInfo, MethodInfo};
use crate::constant_pool::{ClassConstant, ConstantPool, ConstantPoolEntry, MemberRef};
use crate::error::{ClassDecodeError, Result};
use crate::insn::{self, Instruction, Operand};
use crate::opcodes;
use crate::types::Type;
use crate::{ClassAccess, MethodAccess};
use bitflags::*;

bitflags! {
    pub struct DisassemblerFlags: u32 {
        /// Signatures only, no `Code:` sections.
        const SKIP_CODE = 1;
        const LINE_NUMBERS = 2;
        const LOCAL_VARIABLES = 4;
        /// Header block, constant pool listing and per-member detail.
        const VERBOSE = 8;
    }
}

/// Quotes and escapes text the way a Java string literal is written.
fn quote(text: &str) -> String {
    format!("\"{}\"", escape(text))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Java's `toString` layout: plain decimal for magnitudes in [10^-3, 10^7),
/// `d.dddE±n` otherwise. `decimal` and `scientific` are the shortest
/// round-trip digits of the value in each layout.
fn java_number(magnitude: f64, decimal: String, scientific: String) -> String {
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return decimal;
    }
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{}E{}", mantissa, exponent),
        Some((mantissa, exponent)) => format!("{}.0E{}", mantissa, exponent),
        None => decimal,
    }
}

fn java_double(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let name = if v > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_string()
    } else {
        java_number(v.abs(), format!("{:?}", v), format!("{:e}", v))
    }
}

fn java_float(v: f32) -> String {
    if v.is_nan() || v.is_infinite() {
        java_double(v as f64)
    } else {
        java_number((v as f64).abs(), format!("{:?}", v), format!("{:e}", v))
    }
}

/// Special method names are quoted so they read as one token.
fn member_name(name: &str) -> String {
    if name.starts_with('<') {
        quote(name)
    } else {
        name.to_string()
    }
}

fn member_comment(member: &MemberRef) -> String {
    format!("{} {}.{}:{}", member.kind.label(), member.class_name, member_name(&member.name), member.descriptor)
}

fn class_comment(name: &str) -> String {
    if name.starts_with('[') {
        format!("Class {}", quote(name))
    } else {
        format!("Class {}", name)
    }
}

fn join_keywords(keywords: Vec<&str>, rest: &str) -> String {
    let mut parts: Vec<&str> = keywords;
    parts.push(rest);
    parts.join(" ")
}

pub struct Disassembler<'a> {
    class: &'a ClassFile,
    pool: &'a ConstantPool,
    flags: DisassemblerFlags,
    out: String,
}

impl<'a> Disassembler<'a> {
    pub fn new(class: &'a ClassFile, flags: DisassemblerFlags) -> Disassembler<'a> {
        Disassembler {
            class,
            pool: &class.constant_pool,
            flags,
            out: String::new(),
        }
    }

    fn line<S: AsRef<str>>(&mut self, text: S) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn verbose(&self) -> bool {
        self.flags.contains(DisassemblerFlags::VERBOSE)
    }

    /// Produces the whole listing. Nothing is returned unless every part rendered.
    pub fn render(mut self) -> Result<String> {
        let class = self.class;
        if let Some(source) = class.source_file()? {
            self.line(format!("Compiled from {}", quote(source)));
        }
        let declaration = self.class_declaration()?;
        if self.verbose() {
            self.line(declaration);
            self.header()?;
            self.constant_pool()?;
            self.line("{");
        } else {
            self.line(format!("{} {{", declaration));
        }
        let mut first = true;
        for field in &class.fields {
            if !first {
                self.line("");
            }
            first = false;
            self.field(field)?;
        }
        for method in &class.methods {
            if !first {
                self.line("");
            }
            first = false;
            self.method(method)?;
        }
        self.line("}");
        if self.verbose() {
            if let Some(source) = class.source_file()? {
                self.line(format!("SourceFile: {}", quote(source)));
            }
        }
        Ok(self.out)
    }

    fn class_declaration(&self) -> Result<String> {
        let class = self.class;
        let is_interface = class.access.contains(ClassAccess::ACC_INTERFACE);
        let kind = if is_interface { "interface" } else { "class" };
        let mut declaration = join_keywords(class.access.keywords(), kind);
        declaration.push(' ');
        declaration.push_str(&class.name()?);
        let interfaces = class.interface_names()?;
        if is_interface {
            if !interfaces.is_empty() {
                declaration.push_str(&format!(" extends {}", interfaces.join(", ")));
            }
        } else {
            if let Some(super_name) = class.super_name()? {
                if super_name != "java.lang.Object" {
                    declaration.push_str(&format!(" extends {}", super_name));
                }
            }
            if !interfaces.is_empty() {
                declaration.push_str(&format!(" implements {}", interfaces.join(", ")));
            }
        }
        Ok(declaration)
    }

    fn header(&mut self) -> Result<()> {
        let class = self.class;
        self.line(format!("  minor version: {}", class.minor_version));
        self.line(format!("  major version: {}", class.major_version));
        self.line(format!("  flags: (0x{:04x}) {}", class.access.bits(), class.access.flag_names().join(", ")));
        let this_line = format!("  this_class: #{}", class.this_class);
        self.line(format!("{:<40}// {}", this_line, class.name()?));
        let super_line = format!("  super_class: #{}", class.super_class);
        match class.super_name()? {
            Some(name) => self.line(format!("{:<40}// {}", super_line, name)),
            None => self.line(super_line),
        }
        self.line(format!(
            "  interfaces: {}, fields: {}, methods: {}, attributes: {}",
            class.interfaces.len(), class.fields.len(), class.methods.len(), class.attributes.len()
        ));
        Ok(())
    }

    fn constant_pool(&mut self) -> Result<()> {
        self.line("Constant pool:");
        let pool = self.pool;
        for (index, entry) in pool.iter() {
            let (args, comment) = self.pool_entry(index, entry)?;
            let head = format!("{:>5} = {:<18} ", format!("#{}", index), entry.tag().name());
            match comment {
                Some(comment) => self.line(format!("{}{:<14} // {}", head, args, comment)),
                None => self.line(format!("{}{}", head, args)),
            }
        }
        Ok(())
    }

    fn pool_entry(&self, index: u16, entry: &ConstantPoolEntry) -> Result<(String, Option<String>)> {
        let pool = self.pool;
        let row = match entry {
            ConstantPoolEntry::Utf8(text) => (escape(text), None),
            ConstantPoolEntry::Integer(v) => (v.to_string(), None),
            ConstantPoolEntry::Float(v) => (format!("{}f", java_float(*v)), None),
            ConstantPoolEntry::Long(v) => (format!("{}l", v), None),
            ConstantPoolEntry::Double(v) => (format!("{}d", java_double(*v)), None),
            ConstantPoolEntry::Class { name_index } =>
                (format!("#{}", name_index), Some(pool.resolve_class_name(index)?)),
            ConstantPoolEntry::String { string_index } =>
                (format!("#{}", string_index), Some(escape(pool.string(index)?))),
            ConstantPoolEntry::FieldRef { class_index, name_and_type_index }
            | ConstantPoolEntry::MethodRef { class_index, name_and_type_index }
            | ConstantPoolEntry::InterfaceMethodRef { class_index, name_and_type_index } => {
                let member = pool.member_ref(index)?;
                let comment = format!("{}.{}:{}", member.class_name, member_name(&member.name), member.descriptor);
                (format!("#{}.#{}", class_index, name_and_type_index), Some(comment))
            },
            ConstantPoolEntry::NameAndType { name_index, descriptor_index } => {
                let nat = pool.name_and_type(index)?;
                let comment = format!("{}:{}", member_name(&nat.name), nat.descriptor);
                (format!("#{}:#{}", name_index, descriptor_index), Some(comment))
            },
            ConstantPoolEntry::MethodHandle { reference_kind, reference_index } => {
                let handle = pool.method_handle(index)?;
                let member = &handle.member;
                let comment = format!("{} {}.{}:{}", handle.kind_name(), member.class_name, member_name(&member.name), member.descriptor);
                (format!("{}:#{}", reference_kind, reference_index), Some(comment))
            },
            ConstantPoolEntry::MethodType { descriptor_index } =>
                (format!("#{}", descriptor_index), Some(pool.method_type(index)?.to_string())),
            ConstantPoolEntry::Dynamic { bootstrap_method_attr_index, name_and_type_index } => {
                let dynamic = pool.dynamic(index)?;
                let nat = &dynamic.name_and_type;
                let comment = format!("#{}:{}:{}", dynamic.bootstrap_method, nat.name, nat.descriptor);
                (format!("#{}:#{}", bootstrap_method_attr_index, name_and_type_index), Some(comment))
            },
            ConstantPoolEntry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
                let dynamic = pool.invoke_dynamic(index)?;
                let nat = &dynamic.name_and_type;
                let comment = format!("#{}:{}:{}", dynamic.bootstrap_method, nat.name, nat.descriptor);
                (format!("#{}:#{}", bootstrap_method_attr_index, name_and_type_index), Some(comment))
            },
            ConstantPoolEntry::Module { name_index } =>
                (format!("#{}", name_index), Some(pool.module_name(index)?.to_string())),
            ConstantPoolEntry::Package { name_index } =>
                (format!("#{}", name_index), Some(pool.package_name(index)?.to_string())),
        };
        Ok(row)
    }

    fn field(&mut self, field: &FieldInfo) -> Result<()> {
        let pool = self.pool;
        let descriptor = field.descriptor(pool)?;
        let declared = format!("{} {};", Type::new(descriptor.clone()).java_name()?, field.name(pool)?);
        self.line(format!("  {}", join_keywords(field.access.keywords(), &declared)));
        if self.verbose() {
            self.line(format!("    descriptor: {}", descriptor));
            self.line(format!("    flags: (0x{:04x}) {}", field.access.bits(), field.access.flag_names().join(", ")));
            if let Some(index) = field.constant_value_index() {
                self.line(format!("    ConstantValue: {}", self.constant_comment(index)?));
            }
        }
        Ok(())
    }

    fn method_signature(&self, method: &MethodInfo) -> Result<String> {
        let pool = self.pool;
        let name = method.name(pool)?;
        if &**name == "<clinit>" {
            return Ok("static {};".to_string());
        }
        let descriptor = Type::new(method.descriptor(pool)?.clone());
        let mut args = descriptor.argument_types()?
            .iter()
            .map(Type::java_name)
            .collect::<Result<Vec<_>>>()?;
        if method.access.contains(MethodAccess::ACC_VARARGS) {
            if let Some(last) = args.last_mut() {
                if last.ends_with("[]") {
                    let len = last.len();
                    last.replace_range(len - 2.., "...");
                }
            }
        }
        let head = if &**name == "<init>" {
            self.class.name()?
        } else {
            format!("{} {}", descriptor.return_type()?.java_name()?, name)
        };
        let mut signature = join_keywords(method.access.keywords(), &format!("{}({})", head, args.join(", ")));
        if let Some(thrown) = method.exceptions() {
            let thrown = thrown.iter()
                .map(|&i| pool.resolve_class_name(i))
                .collect::<Result<Vec<_>>>()?;
            if !thrown.is_empty() {
                signature.push_str(" throws ");
                signature.push_str(&thrown.join(", "));
            }
        }
        signature.push(';');
        Ok(signature)
    }

    fn method(&mut self, method: &MethodInfo) -> Result<()> {
        let pool = self.pool;
        let name = method.name(pool)?;
        let signature = self.method_signature(method)?;
        self.line(format!("  {}", signature));
        if self.verbose() {
            self.line(format!("    descriptor: {}", method.descriptor(pool)?));
            self.line(format!("    flags: (0x{:04x}) {}", method.access.bits(), method.access.flag_names().join(", ")));
        }
        let code = match method.code() {
            Some(code) => code,
            None => return Ok(()),
        };
        if !self.flags.contains(DisassemblerFlags::SKIP_CODE) {
            self.line("    Code:");
            if self.verbose() {
                let is_static = method.access.contains(MethodAccess::ACC_STATIC);
                let args_size = Type::new(method.descriptor(pool)?.clone()).argument_size(is_static)?;
                self.line(format!("      stack={}, locals={}, args_size={}", code.max_stack, code.max_locals, args_size));
            }
            let instructions = insn::decode(&code.code)?;
            log::debug!("{}: {} instructions in {} bytes", name, instructions.len(), code.code.len());
            for insn in &instructions {
                self.instruction(insn)?;
            }
            self.exception_table(code)?;
        }
        self.debug_tables(code)?;
        Ok(())
    }

    fn exception_table(&mut self, code: &CodeAttribute) -> Result<()> {
        if code.exception_table.is_empty() {
            return Ok(());
        }
        self.line("    Exception table:");
        self.line("       from    to  target type");
        for entry in &code.exception_table {
            let catch_type = if entry.catch_type == 0 {
                "any".to_string()
            } else {
                class_comment(&self.pool.resolve_class_name(entry.catch_type)?)
            };
            self.line(format!("{:>11} {:>5} {:>5}   {}", entry.start_pc, entry.end_pc, entry.handler_pc, catch_type));
        }
        Ok(())
    }

    fn debug_tables(&mut self, code: &CodeAttribute) -> Result<()> {
        let verbose = self.verbose();
        if verbose || self.flags.contains(DisassemblerFlags::LINE_NUMBERS) {
            let lines: Vec<_> = code.line_numbers().collect();
            if !lines.is_empty() {
                self.line("    LineNumberTable:");
                for line in lines {
                    self.line(format!("      line {}: {}", line.line_number, line.start_pc));
                }
            }
        }
        if verbose || self.flags.contains(DisassemblerFlags::LOCAL_VARIABLES) {
            let vars: Vec<_> = code.local_variables().collect();
            if !vars.is_empty() {
                self.line("    LocalVariableTable:");
                self.line("      Start  Length  Slot  Name   Signature");
                for var in vars {
                    let name = self.pool.utf8(var.name_index)?;
                    let descriptor = self.pool.utf8(var.descriptor_index)?;
                    self.line(format!("{:>11}{:>8}{:>6}  {:>4}   {}", var.start_pc, var.length, var.index, name, descriptor));
                }
            }
        }
        Ok(())
    }

    /// What an `ldc`-family instruction pushes.
    fn constant_comment(&self, index: u16) -> Result<String> {
        let comment = match self.pool.constant(index)? {
            ClassConstant::Integer(v) => format!("int {}", v),
            ClassConstant::Float(v) => format!("float {}f", java_float(v)),
            ClassConstant::Long(v) => format!("long {}l", v),
            ClassConstant::Double(v) => format!("double {}d", java_double(v)),
            ClassConstant::String(text) => format!("String {}", quote(&text)),
            ClassConstant::Class(name) => class_comment(&name),
            ClassConstant::MethodType(descriptor) => format!("MethodType {}", descriptor),
            ClassConstant::MethodHandle(handle) => {
                let member = &handle.member;
                format!("MethodHandle {} {}.{}:{}", handle.kind_name(), member.class_name, member_name(&member.name), member.descriptor)
            },
            ClassConstant::ConstantDynamic(dynamic) => {
                let nat = &dynamic.name_and_type;
                format!("Dynamic #{}:{}:{}", dynamic.bootstrap_method, nat.name, nat.descriptor)
            },
        };
        Ok(comment)
    }

    fn pool_comment(&self, insn: &Instruction, index: u16) -> Result<String> {
        let pool = self.pool;
        let comment = match insn.opcode {
            opcodes::LDC | opcodes::LDC_W | opcodes::LDC2_W => self.constant_comment(index)?,
            opcodes::GETSTATIC | opcodes::PUTSTATIC | opcodes::GETFIELD | opcodes::PUTFIELD =>
                member_comment(&pool.field_ref(index)?),
            opcodes::INVOKEVIRTUAL => member_comment(&pool.method_ref(index)?),
            opcodes::INVOKESPECIAL | opcodes::INVOKESTATIC => member_comment(&pool.invocable_ref(index)?),
            opcodes::NEW | opcodes::ANEWARRAY | opcodes::CHECKCAST | opcodes::INSTANCEOF =>
                class_comment(&pool.resolve_class_name(index)?),
            opcode => return Err(ClassDecodeError::UnknownOpcode { opcode, pc: insn.pc }),
        };
        Ok(comment)
    }

    fn instruction(&mut self, insn: &Instruction) -> Result<()> {
        let pool = self.pool;
        let name = insn.name();
        let (operand, comment) = match &insn.operand {
            Operand::None | Operand::Reserved => (String::new(), None),
            Operand::LocalVar(index) => (index.get().to_string(), None),
            Operand::Iinc { index, increment } => (format!("{}, {}", index.get(), increment), None),
            Operand::Branch(offset) => (insn.target(offset.get()).to_string(), None),
            Operand::Literal(value) => (value.get().to_string(), None),
            Operand::NewArray(atype) => {
                let element = opcodes::array_type_name(*atype)
                    .ok_or_else(|| ClassDecodeError::malformed("Code"))?;
                (element.to_string(), None)
            },
            Operand::ConstantPoolIndex(index) | Operand::ConstantPoolIndexWide(index) =>
                (format!("#{}", index), Some(self.pool_comment(insn, *index)?)),
            Operand::InvokeInterface { index, count } =>
                (format!("#{},  {}", index, count), Some(member_comment(&pool.interface_method_ref(*index)?))),
            Operand::InvokeDynamic { index } => {
                let dynamic = pool.invoke_dynamic(*index)?;
                let nat = &dynamic.name_and_type;
                let comment = format!("InvokeDynamic #{}:{}:{}", dynamic.bootstrap_method, nat.name, nat.descriptor);
                (format!("#{},  0", index), Some(comment))
            },
            Operand::MultiANewArray { index, dimensions } =>
                (format!("#{},  {}", index, dimensions), Some(class_comment(&pool.resolve_class_name(*index)?))),
            Operand::TableSwitch { default, low, high, offsets } => {
                self.line(format!("{:>8}: {:<13} {{ // {} to {}", insn.pc, name, low, high));
                for (key, offset) in (*low..=*high).zip(offsets) {
                    self.line(format!("{:>22}: {}", key, insn.target(*offset)));
                }
                self.switch_footer(insn, *default);
                return Ok(());
            },
            Operand::LookupSwitch { default, pairs } => {
                self.line(format!("{:>8}: {:<13} {{ // {}", insn.pc, name, pairs.len()));
                for (key, offset) in pairs {
                    self.line(format!("{:>22}: {}", key, insn.target(*offset)));
                }
                self.switch_footer(insn, *default);
                return Ok(());
            },
        };
        match comment {
            Some(comment) => self.line(format!("{:>8}: {:<13} {:<19} // {}", insn.pc, name, operand, comment)),
            None if operand.is_empty() => self.line(format!("{:>8}: {}", insn.pc, name)),
            None => self.line(format!("{:>8}: {:<13} {}", insn.pc, name, operand)),
        }
        Ok(())
    }

    fn switch_footer(&mut self, insn: &Instruction, default: i32) {
        self.line(format!("{:>22}: {}", "default", insn.target(default)));
        self.line(format!("{:>11}", "}"));
    }
}
