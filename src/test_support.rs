//! Assembles class-file bytes for tests.
use std::collections::HashMap;

pub(crate) fn u2(v: u16) -> [u8; 2] {
    v.to_be_bytes()
}

pub(crate) struct ClassBuilder {
    pool: Vec<u8>,
    next_index: u16,
    utf8_cache: HashMap<String, u16>,
    pub(crate) major_version: u16,
    access: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

impl ClassBuilder {
    /// A `public class <name> extends java.lang.Object` with nothing in it.
    pub(crate) fn new(name: &str) -> ClassBuilder {
        let mut builder = ClassBuilder::empty();
        builder.this_class = builder.class(name);
        builder.super_class = builder.class("java/lang/Object");
        builder
    }

    /// No constant pool entries at all; this and super must be set by index.
    pub(crate) fn empty() -> ClassBuilder {
        ClassBuilder {
            pool: Vec::new(),
            next_index: 1,
            utf8_cache: HashMap::new(),
            major_version: 52,
            access: 0x21,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Appends a raw entry and returns its index.
    pub(crate) fn raw(&mut self, tag: u8, payload: &[u8]) -> u16 {
        let index = self.next_index;
        self.pool.push(tag);
        self.pool.extend_from_slice(payload);
        self.next_index += if tag == 5 || tag == 6 { 2 } else { 1 };
        index
    }

    pub(crate) fn utf8(&mut self, text: &str) -> u16 {
        if let Some(&index) = self.utf8_cache.get(text) {
            return index;
        }
        let bytes = cesu8::to_java_cesu8(text);
        let mut payload = u2(bytes.len() as u16).to_vec();
        payload.extend_from_slice(&bytes);
        let index = self.raw(1, &payload);
        self.utf8_cache.insert(text.to_string(), index);
        index
    }

    pub(crate) fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.raw(7, &u2(name))
    }

    pub(crate) fn string(&mut self, text: &str) -> u16 {
        let text = self.utf8(text);
        self.raw(8, &u2(text))
    }

    pub(crate) fn integer(&mut self, v: i32) -> u16 {
        self.raw(3, &v.to_be_bytes())
    }

    pub(crate) fn float(&mut self, v: f32) -> u16 {
        self.raw(4, &v.to_bits().to_be_bytes())
    }

    pub(crate) fn long(&mut self, v: i64) -> u16 {
        self.raw(5, &v.to_be_bytes())
    }

    pub(crate) fn double(&mut self, v: f64) -> u16 {
        self.raw(6, &v.to_bits().to_be_bytes())
    }

    pub(crate) fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut payload = u2(name).to_vec();
        payload.extend_from_slice(&u2(descriptor));
        self.raw(12, &payload)
    }

    fn member(&mut self, tag: u8, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let nat = self.name_and_type(name, descriptor);
        let mut payload = u2(class).to_vec();
        payload.extend_from_slice(&u2(nat));
        self.raw(tag, &payload)
    }

    pub(crate) fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member(9, class, name, descriptor)
    }

    pub(crate) fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member(10, class, name, descriptor)
    }

    pub(crate) fn interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member(11, class, name, descriptor)
    }

    pub(crate) fn access(&mut self, access: u16) -> &mut Self {
        self.access = access;
        self
    }

    pub(crate) fn this_index(&mut self, index: u16) -> &mut Self {
        self.this_class = index;
        self
    }

    pub(crate) fn super_index(&mut self, index: u16) -> &mut Self {
        self.super_class = index;
        self
    }

    pub(crate) fn no_super(&mut self) -> &mut Self {
        self.super_class = 0;
        self
    }

    pub(crate) fn super_class(&mut self, name: &str) -> &mut Self {
        self.super_class = self.class(name);
        self
    }

    pub(crate) fn interface(&mut self, name: &str) -> &mut Self {
        let index = self.class(name);
        self.interfaces.push(index);
        self
    }

    /// Encodes a named attribute; the result goes into a member or class attribute list.
    pub(crate) fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let mut bytes = u2(self.utf8(name)).to_vec();
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    pub(crate) fn code(
        &mut self,
        max_stack: u16,
        max_locals: u16,
        code: &[u8],
        exception_table: &[[u16; 4]],
        attributes: Vec<Vec<u8>>,
    ) -> Vec<u8> {
        let mut body = u2(max_stack).to_vec();
        body.extend_from_slice(&u2(max_locals));
        body.extend_from_slice(&(code.len() as u32).to_be_bytes());
        body.extend_from_slice(code);
        body.extend_from_slice(&u2(exception_table.len() as u16));
        for row in exception_table {
            for v in row {
                body.extend_from_slice(&u2(*v));
            }
        }
        body.extend_from_slice(&u2(attributes.len() as u16));
        for attr in attributes {
            body.extend_from_slice(&attr);
        }
        self.attribute("Code", &body)
    }

    fn member_info(&mut self, access: u16, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> Vec<u8> {
        let mut bytes = u2(access).to_vec();
        bytes.extend_from_slice(&u2(self.utf8(name)));
        bytes.extend_from_slice(&u2(self.utf8(descriptor)));
        bytes.extend_from_slice(&u2(attributes.len() as u16));
        for attr in attributes {
            bytes.extend_from_slice(&attr);
        }
        bytes
    }

    pub(crate) fn field(&mut self, access: u16, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> &mut Self {
        let field = self.member_info(access, name, descriptor, attributes);
        self.fields.push(field);
        self
    }

    pub(crate) fn method(&mut self, access: u16, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> &mut Self {
        let method = self.member_info(access, name, descriptor, attributes);
        self.methods.push(method);
        self
    }

    pub(crate) fn class_attribute(&mut self, attribute: Vec<u8>) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    pub(crate) fn source_file(&mut self, name: &str) -> &mut Self {
        let index = self.utf8(name);
        let attribute = self.attribute("SourceFile", &u2(index));
        self.class_attribute(attribute)
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE];
        bytes.extend_from_slice(&u2(0));
        bytes.extend_from_slice(&u2(self.major_version));
        bytes.extend_from_slice(&u2(self.next_index));
        bytes.extend_from_slice(&self.pool);
        bytes.extend_from_slice(&u2(self.access));
        bytes.extend_from_slice(&u2(self.this_class));
        bytes.extend_from_slice(&u2(self.super_class));
        bytes.extend_from_slice(&u2(self.interfaces.len() as u16));
        for i in &self.interfaces {
            bytes.extend_from_slice(&u2(*i));
        }
        for members in &[&self.fields, &self.methods] {
            bytes.extend_from_slice(&u2(members.len() as u16));
            for m in members.iter() {
                bytes.extend_from_slice(m);
            }
        }
        bytes.extend_from_slice(&u2(self.attributes.len() as u16));
        for a in &self.attributes {
            bytes.extend_from_slice(a);
        }
        bytes
    }
}
