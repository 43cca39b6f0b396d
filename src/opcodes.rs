//! Opcode values, mnemonics and the operand-shape table the decoder is driven by.

pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

pub const NOP: u8 = 0;
pub const BIPUSH: u8 = 16;
pub const SIPUSH: u8 = 17;
pub const LDC: u8 = 18;
pub const LDC_W: u8 = 19;
pub const LDC2_W: u8 = 20;
pub const ILOAD: u8 = 21;
pub const ALOAD: u8 = 25;
pub const ALOAD_0: u8 = 42;
pub const ISTORE: u8 = 54;
pub const ASTORE: u8 = 58;
pub const IINC: u8 = 132;
pub const IFEQ: u8 = 153;
pub const GOTO: u8 = 167;
pub const JSR: u8 = 168;
pub const RET: u8 = 169;
pub const TABLESWITCH: u8 = 170;
pub const LOOKUPSWITCH: u8 = 171;
pub const IRETURN: u8 = 172;
pub const RETURN: u8 = 177;
pub const GETSTATIC: u8 = 178;
pub const PUTSTATIC: u8 = 179;
pub const GETFIELD: u8 = 180;
pub const PUTFIELD: u8 = 181;
pub const INVOKEVIRTUAL: u8 = 182;
pub const INVOKESPECIAL: u8 = 183;
pub const INVOKESTATIC: u8 = 184;
pub const INVOKEINTERFACE: u8 = 185;
pub const INVOKEDYNAMIC: u8 = 186;
pub const NEW: u8 = 187;
pub const NEWARRAY: u8 = 188;
pub const ANEWARRAY: u8 = 189;
pub const ATHROW: u8 = 191;
pub const CHECKCAST: u8 = 192;
pub const INSTANCEOF: u8 = 193;
pub const WIDE: u8 = 196;
pub const MULTIANEWARRAY: u8 = 197;
pub const IFNULL: u8 = 198;
pub const GOTO_W: u8 = 200;
pub const JSR_W: u8 = 201;
pub const BREAKPOINT: u8 = 202;
pub const IMPDEP1: u8 = 254;
pub const IMPDEP2: u8 = 255;

/// How the bytes after an opcode are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsnClass {
    NoArg,
    /// `xload_n`/`xstore_n`: the slot is implied by the opcode.
    ImplVar,
    Sbyte,
    Short,
    Var,
    Type,
    FieldMeth,
    ItfMeth,
    IndyMeth,
    Label,
    WideLabel,
    Ldc,
    LdcWide,
    Iinc,
    NewArray,
    Multianew,
    Tableswitch,
    Lookupswitch,
    Wide,
    Reserved,
}

impl InsnClass {
    /// Total instruction width including the opcode byte, or `None` when the
    /// width depends on the bytes that follow.
    pub fn fixed_width(self) -> Option<usize> {
        let width = match self {
            InsnClass::NoArg | InsnClass::ImplVar | InsnClass::Reserved => 1,
            InsnClass::Sbyte | InsnClass::Var | InsnClass::Ldc | InsnClass::NewArray => 2,
            InsnClass::Short | InsnClass::LdcWide | InsnClass::FieldMeth | InsnClass::Type
            | InsnClass::Iinc | InsnClass::Label => 3,
            InsnClass::Multianew => 4,
            InsnClass::ItfMeth | InsnClass::IndyMeth | InsnClass::WideLabel => 5,
            InsnClass::Tableswitch | InsnClass::Lookupswitch | InsnClass::Wide => return None,
        };
        Some(width)
    }
}

const fn classify(opcode: u8) -> Option<InsnClass> {
    let class = match opcode {
        0..=15 => InsnClass::NoArg,
        16 => InsnClass::Sbyte,
        17 => InsnClass::Short,
        18 => InsnClass::Ldc,
        19 | 20 => InsnClass::LdcWide,
        21..=25 => InsnClass::Var,
        26..=45 => InsnClass::ImplVar,
        46..=53 => InsnClass::NoArg,
        54..=58 => InsnClass::Var,
        59..=78 => InsnClass::ImplVar,
        79..=131 => InsnClass::NoArg,
        132 => InsnClass::Iinc,
        133..=152 => InsnClass::NoArg,
        153..=168 => InsnClass::Label,
        169 => InsnClass::Var,
        170 => InsnClass::Tableswitch,
        171 => InsnClass::Lookupswitch,
        172..=177 => InsnClass::NoArg,
        178..=184 => InsnClass::FieldMeth,
        185 => InsnClass::ItfMeth,
        186 => InsnClass::IndyMeth,
        187 => InsnClass::Type,
        188 => InsnClass::NewArray,
        189 => InsnClass::Type,
        190 | 191 => InsnClass::NoArg,
        192 | 193 => InsnClass::Type,
        194 | 195 => InsnClass::NoArg,
        196 => InsnClass::Wide,
        197 => InsnClass::Multianew,
        198 | 199 => InsnClass::Label,
        200 | 201 => InsnClass::WideLabel,
        202 | 254 | 255 => InsnClass::Reserved,
        _ => return None,
    };
    Some(class)
}

pub static INSN_CLASS_TABLE: [Option<InsnClass>; 256] = {
    let mut table = [None; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = classify(i as u8);
        i += 1;
    }
    table
};

pub fn classify_insn(opcode: u8) -> Option<InsnClass> {
    INSN_CLASS_TABLE[opcode as usize]
}

static MNEMONICS: [&str; 202] = [
    // 0x00
    "nop", "aconst_null", "iconst_m1", "iconst_0", "iconst_1", "iconst_2", "iconst_3", "iconst_4",
    "iconst_5", "lconst_0", "lconst_1", "fconst_0", "fconst_1", "fconst_2", "dconst_0", "dconst_1",
    // 0x10
    "bipush", "sipush", "ldc", "ldc_w", "ldc2_w", "iload", "lload", "fload",
    "dload", "aload", "iload_0", "iload_1", "iload_2", "iload_3", "lload_0", "lload_1",
    // 0x20
    "lload_2", "lload_3", "fload_0", "fload_1", "fload_2", "fload_3", "dload_0", "dload_1",
    "dload_2", "dload_3", "aload_0", "aload_1", "aload_2", "aload_3", "iaload", "laload",
    // 0x30
    "faload", "daload", "aaload", "baload", "caload", "saload", "istore", "lstore",
    "fstore", "dstore", "astore", "istore_0", "istore_1", "istore_2", "istore_3", "lstore_0",
    // 0x40
    "lstore_1", "lstore_2", "lstore_3", "fstore_0", "fstore_1", "fstore_2", "fstore_3", "dstore_0",
    "dstore_1", "dstore_2", "dstore_3", "astore_0", "astore_1", "astore_2", "astore_3", "iastore",
    // 0x50
    "lastore", "fastore", "dastore", "aastore", "bastore", "castore", "sastore", "pop",
    "pop2", "dup", "dup_x1", "dup_x2", "dup2", "dup2_x1", "dup2_x2", "swap",
    // 0x60
    "iadd", "ladd", "fadd", "dadd", "isub", "lsub", "fsub", "dsub",
    "imul", "lmul", "fmul", "dmul", "idiv", "ldiv", "fdiv", "ddiv",
    // 0x70
    "irem", "lrem", "frem", "drem", "ineg", "lneg", "fneg", "dneg",
    "ishl", "lshl", "ishr", "lshr", "iushr", "lushr", "iand", "land",
    // 0x80
    "ior", "lor", "ixor", "lxor", "iinc", "i2l", "i2f", "i2d",
    "l2i", "l2f", "l2d", "f2i", "f2l", "f2d", "d2i", "d2l",
    // 0x90
    "d2f", "i2b", "i2c", "i2s", "lcmp", "fcmpl", "fcmpg", "dcmpl",
    "dcmpg", "ifeq", "ifne", "iflt", "ifge", "ifgt", "ifle", "if_icmpeq",
    // 0xa0
    "if_icmpne", "if_icmplt", "if_icmpge", "if_icmpgt", "if_icmple", "if_acmpeq", "if_acmpne", "goto",
    "jsr", "ret", "tableswitch", "lookupswitch", "ireturn", "lreturn", "freturn", "dreturn",
    // 0xb0
    "areturn", "return", "getstatic", "putstatic", "getfield", "putfield", "invokevirtual", "invokespecial",
    "invokestatic", "invokeinterface", "invokedynamic", "new", "newarray", "anewarray", "arraylength", "athrow",
    // 0xc0
    "checkcast", "instanceof", "monitorenter", "monitorexit", "wide", "multianewarray", "ifnull", "ifnonnull",
    "goto_w", "jsr_w",
];

pub fn mnemonic(opcode: u8) -> Option<&'static str> {
    match opcode {
        BREAKPOINT => Some("breakpoint"),
        IMPDEP1 => Some("impdep1"),
        IMPDEP2 => Some("impdep2"),
        _ => MNEMONICS.get(opcode as usize).copied(),
    }
}

/// Element type names for the `newarray` operand.
pub fn array_type_name(atype: u8) -> Option<&'static str> {
    let name = match atype {
        4 => "boolean",
        5 => "char",
        6 => "float",
        7 => "double",
        8 => "byte",
        9 => "short",
        10 => "int",
        11 => "long",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_classified_opcode_has_a_mnemonic() {
        for opcode in 0..=255u8 {
            assert_eq!(classify_insn(opcode).is_some(), mnemonic(opcode).is_some(), "opcode {}", opcode);
        }
    }

    #[test]
    fn table_spot_checks() {
        assert_eq!(mnemonic(ALOAD_0), Some("aload_0"));
        assert_eq!(mnemonic(IINC), Some("iinc"));
        assert_eq!(mnemonic(GOTO), Some("goto"));
        assert_eq!(mnemonic(RETURN), Some("return"));
        assert_eq!(mnemonic(INVOKEDYNAMIC), Some("invokedynamic"));
        assert_eq!(mnemonic(MULTIANEWARRAY), Some("multianewarray"));
        assert_eq!(mnemonic(JSR_W), Some("jsr_w"));
        assert_eq!(classify_insn(RET), Some(InsnClass::Var));
        assert_eq!(classify_insn(NEWARRAY), Some(InsnClass::NewArray));
        assert_eq!(classify_insn(IFNULL), Some(InsnClass::Label));
        assert_eq!(classify_insn(GOTO_W), Some(InsnClass::WideLabel));
        assert_eq!(classify_insn(0xCB), None);
        assert_eq!(classify_insn(IMPDEP2), Some(InsnClass::Reserved));
    }

    #[test]
    fn widths() {
        assert_eq!(classify_insn(GETSTATIC).and_then(InsnClass::fixed_width), Some(3));
        assert_eq!(classify_insn(INVOKEINTERFACE).and_then(InsnClass::fixed_width), Some(5));
        assert_eq!(classify_insn(TABLESWITCH).and_then(InsnClass::fixed_width), None);
        assert_eq!(classify_insn(NOP).and_then(InsnClass::fixed_width), Some(1));
    }
}
