use crate::op::Opcode;
use crate::reg::Reg;

use color_print::cformat;

/// A fully resolved instruction: every operand is a literal, ready to be
/// packed into one 16-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst {
    Add(Reg, Reg, Reg),
    Addi(Reg, Reg, i8),
    And(Reg, Reg, Reg),
    Andi(Reg, Reg, i8),
    Xor(Reg, Reg, Reg),
    Xori(Reg, Reg, i8),
    Not(Reg, Reg),

    /// Condition-code branch; flags are (n, z, p), offset is words from the
    /// already-advanced program counter.
    Br {
        n: bool,
        z: bool,
        p: bool,
        offset: i16,
    },
    Jmp(Reg),
    Ret,
    Jsr(i16),
    Jsrr(Reg),

    Ldb(Reg, Reg, i8),
    Ldw(Reg, Reg, i8),
    Stb(Reg, Reg, i8),
    Stw(Reg, Reg, i8),

    Lshf(Reg, Reg, u8),
    Rshfl(Reg, Reg, u8),
    Rshfa(Reg, Reg, u8),

    Lea(Reg, i16),
    Rti,
    Trap(u8),
}

/// Low `bits` of `value`, two's complement.
fn truncate(value: i32, bits: u32) -> u16 {
    (value as u16) & ((1u16 << bits) - 1)
}

/// Sign-extend the low `bits` of `value`.
fn sext(value: u16, bits: u32) -> i16 {
    let shift = 16 - bits;
    ((value << shift) as i16) >> shift
}

fn regs(a: Reg, b: Reg) -> u16 {
    (a as u16) << 9 | (b as u16) << 6
}

impl Inst {
    pub fn encode(&self) -> u16 {
        use Inst::*;
        match *self {
            Add(dr, sr1, sr2) => (Opcode::ADD as u16) << 12 | regs(dr, sr1) | sr2 as u16,
            Addi(dr, sr1, imm) => {
                (Opcode::ADD as u16) << 12 | regs(dr, sr1) | 1 << 5 | truncate(imm as i32, 5)
            }
            And(dr, sr1, sr2) => (Opcode::AND as u16) << 12 | regs(dr, sr1) | sr2 as u16,
            Andi(dr, sr1, imm) => {
                (Opcode::AND as u16) << 12 | regs(dr, sr1) | 1 << 5 | truncate(imm as i32, 5)
            }
            Xor(dr, sr1, sr2) => (Opcode::XOR as u16) << 12 | regs(dr, sr1) | sr2 as u16,
            Xori(dr, sr1, imm) => {
                (Opcode::XOR as u16) << 12 | regs(dr, sr1) | 1 << 5 | truncate(imm as i32, 5)
            }
            Not(dr, sr) => Xori(dr, sr, -1).encode(),

            Br { n, z, p, offset } => {
                (Opcode::BR as u16) << 12
                    | (n as u16) << 11
                    | (z as u16) << 10
                    | (p as u16) << 9
                    | truncate(offset as i32, 9)
            }
            Jmp(base) => (Opcode::JMP as u16) << 12 | (base as u16) << 6,
            Ret => Jmp(Reg::R7).encode(),
            Jsr(offset) => (Opcode::JSR as u16) << 12 | 1 << 11 | truncate(offset as i32, 11),
            Jsrr(base) => (Opcode::JSR as u16) << 12 | (base as u16) << 6,

            Ldb(dr, base, off) => (Opcode::LDB as u16) << 12 | regs(dr, base) | truncate(off as i32, 6),
            Ldw(dr, base, off) => (Opcode::LDW as u16) << 12 | regs(dr, base) | truncate(off as i32, 6),
            Stb(sr, base, off) => (Opcode::STB as u16) << 12 | regs(sr, base) | truncate(off as i32, 6),
            Stw(sr, base, off) => (Opcode::STW as u16) << 12 | regs(sr, base) | truncate(off as i32, 6),

            Lshf(dr, sr, amount) => {
                (Opcode::SHF as u16) << 12 | regs(dr, sr) | (amount as u16 & 0xF)
            }
            Rshfl(dr, sr, amount) => {
                (Opcode::SHF as u16) << 12 | regs(dr, sr) | 1 << 4 | (amount as u16 & 0xF)
            }
            Rshfa(dr, sr, amount) => {
                (Opcode::SHF as u16) << 12 | regs(dr, sr) | 0b11 << 4 | (amount as u16 & 0xF)
            }

            Lea(dr, offset) => {
                (Opcode::LEA as u16) << 12 | (dr as u16) << 9 | truncate(offset as i32, 9)
            }
            Rti => (Opcode::RTI as u16) << 12,
            Trap(vect) => (Opcode::TRAP as u16) << 12 | vect as u16,
        }
    }

    /// Inverse of [`encode`](Self::encode). `None` for words that are not a
    /// valid instruction (data words, the unassigned opcodes).
    pub fn decode(word: u16) -> Option<Inst> {
        use Inst::*;
        let op = Opcode::try_from((word >> 12) as u8).ok()?;
        let dr = Reg::from(((word >> 9) & 0b111) as u8);
        let sr1 = Reg::from(((word >> 6) & 0b111) as u8);
        let sr2 = Reg::from((word & 0b111) as u8);

        Some(match op {
            Opcode::ADD | Opcode::AND | Opcode::XOR => {
                if word & 1 << 5 != 0 {
                    let imm = sext(word & 0x1F, 5) as i8;
                    match op {
                        Opcode::ADD => Addi(dr, sr1, imm),
                        Opcode::AND => Andi(dr, sr1, imm),
                        _ if imm == -1 => Not(dr, sr1),
                        _ => Xori(dr, sr1, imm),
                    }
                } else {
                    if word & 0b11000 != 0 {
                        return None;
                    }
                    match op {
                        Opcode::ADD => Add(dr, sr1, sr2),
                        Opcode::AND => And(dr, sr1, sr2),
                        _ => Xor(dr, sr1, sr2),
                    }
                }
            }
            Opcode::BR => Br {
                n: word & 1 << 11 != 0,
                z: word & 1 << 10 != 0,
                p: word & 1 << 9 != 0,
                offset: sext(word & 0x1FF, 9),
            },
            Opcode::JMP if sr1 == Reg::R7 => Ret,
            Opcode::JMP => Jmp(sr1),
            Opcode::JSR => {
                if word & 1 << 11 != 0 {
                    Jsr(sext(word & 0x7FF, 11))
                } else {
                    Jsrr(sr1)
                }
            }
            Opcode::LDB => Ldb(dr, sr1, sext(word & 0x3F, 6) as i8),
            Opcode::LDW => Ldw(dr, sr1, sext(word & 0x3F, 6) as i8),
            Opcode::STB => Stb(dr, sr1, sext(word & 0x3F, 6) as i8),
            Opcode::STW => Stw(dr, sr1, sext(word & 0x3F, 6) as i8),
            Opcode::SHF => {
                let amount = (word & 0xF) as u8;
                match (word >> 4) & 0b11 {
                    0b00 => Lshf(dr, sr1, amount),
                    0b01 => Rshfl(dr, sr1, amount),
                    0b11 => Rshfa(dr, sr1, amount),
                    _ => return None,
                }
            }
            Opcode::LEA => Lea(dr, sext(word & 0x1FF, 9)),
            Opcode::RTI => Rti,
            Opcode::TRAP => Trap((word & 0xFF) as u8),
        })
    }
}

impl Inst {
    pub fn cformat(&self) -> String {
        macro_rules! rrr {
            ($name:expr, $a:expr, $b:expr, $c:expr) => {
                cformat!("<r>{:<6}</><b>{:<4}{:<4}{:<4}</>", $name, $a, $b, $c)
            };
        }
        macro_rules! rri {
            ($name:expr, $a:expr, $b:expr, $imm:expr) => {
                cformat!("<r>{:<6}</><b>{:<4}{:<4}</><y>#{}</>", $name, $a, $b, $imm)
            };
        }
        macro_rules! off {
            ($name:expr, $imm:expr) => {
                cformat!("<r>{:<6}</><y>#{}</>", $name, $imm)
            };
        }

        use Inst::*;
        match *self {
            Add(dr, sr1, sr2) => rrr!("ADD", dr, sr1, sr2),
            Addi(dr, sr1, imm) => rri!("ADD", dr, sr1, imm),
            And(dr, sr1, sr2) => rrr!("AND", dr, sr1, sr2),
            Andi(dr, sr1, imm) => rri!("AND", dr, sr1, imm),
            Xor(dr, sr1, sr2) => rrr!("XOR", dr, sr1, sr2),
            Xori(dr, sr1, imm) => rri!("XOR", dr, sr1, imm),
            Not(dr, sr) => rrr!("NOT", dr, sr, ""),
            Br { n, z, p, offset } => {
                let name = format!(
                    "BR{}{}{}",
                    if n { "n" } else { "" },
                    if z { "z" } else { "" },
                    if p { "p" } else { "" }
                );
                off!(name, offset)
            }
            Jmp(base) => rrr!("JMP", base, "", ""),
            Ret => rrr!("RET", "", "", ""),
            Jsr(offset) => off!("JSR", offset),
            Jsrr(base) => rrr!("JSRR", base, "", ""),
            Ldb(dr, base, o) => rri!("LDB", dr, base, o),
            Ldw(dr, base, o) => rri!("LDW", dr, base, o),
            Stb(sr, base, o) => rri!("STB", sr, base, o),
            Stw(sr, base, o) => rri!("STW", sr, base, o),
            Lshf(dr, sr, amount) => rri!("LSHF", dr, sr, amount),
            Rshfl(dr, sr, amount) => rri!("RSHFL", dr, sr, amount),
            Rshfa(dr, sr, amount) => rri!("RSHFA", dr, sr, amount),
            Lea(dr, offset) => rri!("LEA", dr, "", offset),
            Rti => rrr!("RTI", "", "", ""),
            Trap(vect) => cformat!("<r>{:<6}</><y>x{:02X}</>", "TRAP", vect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_inst {
        ($($name:ident: $inst:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let inst = $inst;
                    let word = inst.encode();
                    assert_eq!(Inst::decode(word), Some(inst));
                }
            )*
        }
    }

    test_inst! {
        roundtrip_add: Inst::Add(Reg::R0, Reg::R1, Reg::R2),
        roundtrip_addi: Inst::Addi(Reg::R0, Reg::R1, -16),
        roundtrip_and: Inst::And(Reg::R3, Reg::R4, Reg::R5),
        roundtrip_andi: Inst::Andi(Reg::R3, Reg::R4, 15),
        roundtrip_xor: Inst::Xor(Reg::R6, Reg::R7, Reg::R0),
        roundtrip_xori: Inst::Xori(Reg::R6, Reg::R7, 5),
        roundtrip_not: Inst::Not(Reg::R1, Reg::R2),
        roundtrip_br: Inst::Br { n: true, z: false, p: true, offset: -2 },
        roundtrip_jmp: Inst::Jmp(Reg::R5),
        roundtrip_ret: Inst::Ret,
        roundtrip_jsr: Inst::Jsr(-1024),
        roundtrip_jsrr: Inst::Jsrr(Reg::R2),
        roundtrip_ldb: Inst::Ldb(Reg::R1, Reg::R4, 10),
        roundtrip_ldw: Inst::Ldw(Reg::R3, Reg::R6, 5),
        roundtrip_stb: Inst::Stb(Reg::R0, Reg::R1, -32),
        roundtrip_stw: Inst::Stw(Reg::R2, Reg::R3, 31),
        roundtrip_lshf: Inst::Lshf(Reg::R0, Reg::R1, 15),
        roundtrip_rshfl: Inst::Rshfl(Reg::R0, Reg::R1, 1),
        roundtrip_rshfa: Inst::Rshfa(Reg::R0, Reg::R1, 8),
        roundtrip_lea: Inst::Lea(Reg::R7, 255),
        roundtrip_rti: Inst::Rti,
        roundtrip_trap: Inst::Trap(0x25),
    }

    #[allow(clippy::unusual_byte_groupings)]
    #[test]
    fn encodings() {
        assert_eq!(Inst::Addi(Reg::R0, Reg::R2, 12).encode(), 0x10ac);
        assert_eq!(
            Inst::Andi(Reg::R0, Reg::R2, 12).encode(),
            0b0101_000_010_1_01100
        );
        assert_eq!(Inst::Jmp(Reg::R5).encode(), 0b1100_000_101_000000);
        assert_eq!(
            Inst::Ldb(Reg::R1, Reg::R4, 10).encode(),
            0b0010_001_100_001010
        );
        assert_eq!(
            Inst::Ldw(Reg::R3, Reg::R6, 5).encode(),
            0b0110_011_110_000101
        );
        assert_eq!(
            Inst::Xor(Reg::R0, Reg::R3, Reg::R4).encode(),
            0b1001_000_011_0_00_100
        );
        assert_eq!(
            Inst::Br { n: true, z: false, p: true, offset: -2 }.encode(),
            0b0000_1_0_1_111111110
        );
    }

    #[test]
    fn aliases() {
        assert_eq!(Inst::Not(Reg::R0, Reg::R1).encode(), 0b1001_0000_0111_1111);
        assert_eq!(Inst::Ret.encode(), Inst::Jmp(Reg::R7).encode());
    }

    #[test]
    fn negative_fields() {
        // two's complement in the field width, never a wider value
        assert_eq!(Inst::Addi(Reg::R0, Reg::R0, -5).encode() & 0x1F, 0b11011);
        assert_eq!(
            Inst::Br { n: true, z: true, p: true, offset: -3 }.encode() & 0x1FF,
            0x1FD
        );
    }

    #[test]
    fn data_words_do_not_decode() {
        assert_eq!(Inst::decode(0b1010_0000_0000_0000), None);
        assert_eq!(Inst::decode(0b1011_0000_0000_0000), None);
    }
}
