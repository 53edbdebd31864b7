use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// 4-bit opcode patterns, bits 15..12 of every instruction word.
/// `0b1010` and `0b1011` are unassigned.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
    Display,
)]
#[repr(u8)]
pub enum Opcode {
    BR = 0b0000,
    ADD = 0b0001,
    LDB = 0b0010,
    STB = 0b0011,
    JSR = 0b0100,
    AND = 0b0101,
    LDW = 0b0110,
    STW = 0b0111,
    RTI = 0b1000,
    XOR = 0b1001,
    JMP = 0b1100,
    SHF = 0b1101,
    LEA = 0b1110,
    TRAP = 0b1111,
}

/// Reserved statement-head words: instruction mnemonics and the data
/// directives. The `BR` condition variants carry flags and are classified
/// separately by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
pub enum Mnemonic {
    ADD,
    AND,
    XOR,
    NOT,
    JMP,
    RET,
    JSR,
    JSRR,
    LEA,
    LSHF,
    RSHFL,
    RSHFA,
    LDB,
    LDW,
    STB,
    STW,
    RTI,
    TRAP,
    HALT,
    GETC,
    OUT,
    PUTS,
    IN,
    DB,
    DW,
}

impl Mnemonic {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.parse::<Self>() {
            Ok(m) => Ok(m),
            Err(_) => Err(format!("Unknown mnemonic: `{s}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Mnemonic, Opcode};

    #[test]
    fn mnemonics() {
        assert_eq!(Mnemonic::parse("ADD"), Ok(Mnemonic::ADD));
        assert_eq!(Mnemonic::parse("DW"), Ok(Mnemonic::DW));
        assert!(Mnemonic::parse("add").is_err());
        assert!(Mnemonic::parse("MUL").is_err());
    }

    #[test]
    fn opcode_bits() {
        assert_eq!(Opcode::BR as u16, 0b0000);
        assert_eq!(Opcode::AND as u16, 0b0101);
        assert_eq!(Opcode::TRAP as u16, 0b1111);
        assert!(Opcode::try_from(0b1010u8).is_err());
        assert_eq!(Opcode::try_from(0b1101u8), Ok(Opcode::SHF));
    }
}
