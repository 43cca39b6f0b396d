use crate::constant_pool::display_name;
use crate::error::{ClassDecodeError, Result};
use serde::Serialize;
use std::rc::Rc;

/// A field or method descriptor.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Type {
    desc: Rc<str>,
}

/// End of the field descriptor starting at `i`, or `None` if there isn't one.
fn field_end(bytes: &[u8], mut i: usize) -> Option<usize> {
    while bytes.get(i) == Some(&b'[') {
        i += 1;
    }
    match bytes.get(i)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(i + 1),
        b'L' => {
            let semi = bytes[i..].iter().position(|&b| b == b';')?;
            if semi == 1 {
                None
            } else {
                Some(i + semi + 1)
            }
        },
        _ => None,
    }
}

impl Type {
    pub fn new<T>(desc: T) -> Type where T: Into<Rc<str>> {
        Type {
            desc: desc.into()
        }
    }
    pub fn get_descriptor(&self) -> &str {
        &self.desc
    }
    fn invalid(&self) -> ClassDecodeError {
        ClassDecodeError::InvalidDescriptor { descriptor: self.desc.to_string() }
    }
    pub fn is_method(&self) -> bool {
        self.desc.starts_with('(')
    }
    pub fn dimensions(&self) -> usize {
        self.desc.bytes().take_while(|&b| b == b'[').count()
    }
    pub fn element_type(&self) -> Type {
        Type::new(&self.desc[self.dimensions()..])
    }
    /// Local variable slots a value of this type occupies.
    pub fn size(&self) -> usize {
        match self.desc.as_bytes().first() {
            Some(b'J') | Some(b'D') => 2,
            Some(b'V') => 0,
            _ => 1,
        }
    }
    /// Walks the argument list, returning each argument's byte range and the
    /// index of the closing `)`.
    fn arguments(&self) -> Result<(Vec<(usize, usize)>, usize)> {
        if !self.is_method() {
            return Err(self.invalid());
        }
        let bytes = self.desc.as_bytes();
        let mut args = Vec::new();
        let mut i = 1;
        loop {
            match bytes.get(i) {
                Some(b')') => return Ok((args, i)),
                Some(_) => {
                    let end = field_end(bytes, i).ok_or_else(|| self.invalid())?;
                    args.push((i, end));
                    i = end;
                },
                None => return Err(self.invalid()),
            }
        }
    }
    pub fn argument_types(&self) -> Result<Vec<Type>> {
        let (args, _) = self.arguments()?;
        Ok(args.into_iter().map(|(start, end)| Type::new(&self.desc[start..end])).collect())
    }
    pub fn return_type(&self) -> Result<Type> {
        let (_, close) = self.arguments()?;
        let ret = &self.desc[close + 1..];
        if ret == "V" || field_end(ret.as_bytes(), 0) == Some(ret.len()) {
            Ok(Type::new(ret))
        } else {
            Err(self.invalid())
        }
    }
    /// Slots taken by the arguments, plus one for the receiver unless `is_static`.
    pub fn argument_size(&self, is_static: bool) -> Result<usize> {
        let receiver = if is_static { 0 } else { 1 };
        Ok(self.argument_types()?.iter().fold(receiver, |a, e| a + e.size()))
    }
    /// Source-style name: `int`, `java.lang.String[]`, `void`.
    pub fn java_name(&self) -> Result<String> {
        if &*self.desc != "V" && field_end(self.desc.as_bytes(), 0) != Some(self.desc.len()) {
            return Err(self.invalid());
        }
        let dims = self.dimensions();
        let element = &self.desc[dims..];
        let mut name = match element.as_bytes()[0] {
            b'B' => "byte".to_string(),
            b'C' => "char".to_string(),
            b'D' => "double".to_string(),
            b'F' => "float".to_string(),
            b'I' => "int".to_string(),
            b'J' => "long".to_string(),
            b'S' => "short".to_string(),
            b'Z' => "boolean".to_string(),
            b'V' => "void".to_string(),
            _ => display_name(&element[1..element.len() - 1]),
        };
        for _ in 0..dims {
            name.push_str("[]");
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_descriptor_parts() {
        let t = Type::new("(I[Ljava/lang/String;J)V");
        let args = t.argument_types().unwrap();
        let descs: Vec<_> = args.iter().map(|a| a.get_descriptor()).collect();
        assert_eq!(descs, vec!["I", "[Ljava/lang/String;", "J"]);
        assert_eq!(t.return_type().unwrap(), Type::new("V"));
        assert_eq!(t.argument_size(false), Ok(5));
        assert_eq!(t.argument_size(true), Ok(4));
    }

    #[test]
    fn class_names_may_contain_parens() {
        let t = Type::new("(La)b;)La)b;");
        assert_eq!(t.argument_types(), Ok(vec![Type::new("La)b;")]));
        assert_eq!(t.return_type(), Ok(Type::new("La)b;")));
        assert_eq!(Type::new("(La)b;)V").return_type(), Ok(Type::new("V")));
        assert!(t.is_method());
        assert!(!Type::new("La)b;").is_method());
    }

    #[test]
    fn java_names() {
        assert_eq!(Type::new("I").java_name(), Ok("int".to_string()));
        assert_eq!(Type::new("[[Z").java_name(), Ok("boolean[][]".to_string()));
        assert_eq!(Type::new("Ljava/lang/Object;").java_name(), Ok("java.lang.Object".to_string()));
        assert_eq!(Type::new("[Ljava/util/Map$Entry;").java_name(), Ok("java.util.Map$Entry[]".to_string()));
        assert_eq!(Type::new("V").java_name(), Ok("void".to_string()));
        assert_eq!(Type::new("[[I").element_type(), Type::new("I"));
    }

    #[test]
    fn malformed_descriptors() {
        let bad = |d: &str| ClassDecodeError::InvalidDescriptor { descriptor: d.to_string() };
        assert_eq!(Type::new("Q").java_name(), Err(bad("Q")));
        assert_eq!(Type::new("Ljava/lang/String").java_name(), Err(bad("Ljava/lang/String")));
        assert_eq!(Type::new("II").java_name(), Err(bad("II")));
        assert_eq!(Type::new("(I").argument_types(), Err(bad("(I")));
        assert_eq!(Type::new("()").return_type(), Err(bad("()")));
        assert_eq!(Type::new("I").argument_types(), Err(bad("I")));
        assert_eq!(Type::new("(L;)V").argument_types(), Err(bad("(L;)V")));
    }
}
