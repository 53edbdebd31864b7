use crate::error::Error;
use crate::unit::{DataWord, Statement, StmtBody, TranslationUnit};
use arch::inst::Inst;

/// Resolve every pending label reference in `unit` and emit the machine
/// words in statement order across the whole extension chain.
///
/// Fails fast on the first statement that cannot be resolved, in source
/// order; no partial output is ever returned. The unit itself is left
/// untouched and can be linked again or extended further.
pub fn link(unit: &TranslationUnit) -> Result<Vec<u16>, Error> {
    let mut words = Vec::with_capacity(unit.len());
    for stmt in &unit.stmts {
        emit(unit, stmt, &mut words)?;
    }
    Ok(words)
}

fn emit(unit: &TranslationUnit, stmt: &Statement, words: &mut Vec<u16>) -> Result<(), Error> {
    match &stmt.body {
        StmtBody::Word(word) => words.push(*word),
        StmtBody::Label(_) => {}
        StmtBody::Fill(count) => words.extend(std::iter::repeat(0).take(*count as usize)),
        StmtBody::Data(items) => {
            for item in items {
                match item {
                    DataWord::Lit(word) => words.push(*word),
                    // absolute addressing: the label's address is the word
                    DataWord::Label(name) => words.push(resolve(unit, name, stmt.line)?),
                }
            }
        }
        StmtBody::Branch { n, z, p, label } => {
            let offset = pc_offset(unit, label, stmt, 9)?;
            words.push(Inst::Br { n: *n, z: *z, p: *p, offset }.encode());
        }
        StmtBody::Lea(dr, label) => {
            let offset = pc_offset(unit, label, stmt, 9)?;
            words.push(Inst::Lea(*dr, offset).encode());
        }
        StmtBody::Jsr(label) => {
            let offset = pc_offset(unit, label, stmt, 11)?;
            words.push(Inst::Jsr(offset).encode());
        }
    }
    Ok(())
}

fn resolve(unit: &TranslationUnit, label: &str, line: u32) -> Result<u16, Error> {
    unit.lookup(label)
        .ok_or_else(|| Error::LabelNotResolved(label.to_string(), line))
}

/// `target - (addr + 1)`: the program counter has already advanced past
/// the current instruction when the offset applies. The result must fit
/// the instruction's signed field.
fn pc_offset(
    unit: &TranslationUnit,
    label: &str,
    stmt: &Statement,
    bits: u32,
) -> Result<i16, Error> {
    let target = resolve(unit, label, stmt.line)? as i32;
    let offset = target - (stmt.addr as i32 + 1);
    let limit = 1 << (bits - 1);
    if offset < -limit || offset >= limit {
        return Err(Error::OffsetOutOfRange(label.to_string(), stmt.line));
    }
    Ok(offset as i16)
}

#[cfg(test)]
mod tests {
    use super::link;
    use crate::error::Error;
    use crate::unit::TranslationUnit;

    fn assemble(text: &str) -> Result<Vec<u16>, Error> {
        link(&TranslationUnit::parse(text)?)
    }

    #[allow(clippy::unusual_byte_groupings)]
    #[test]
    fn single_instructions() {
        assert_eq!(assemble("ADD R0, R2, #12"), Ok(vec![0x10ac]));
        assert_eq!(assemble("AND R0, R2, #12"), Ok(vec![0b0101_000_010_1_01100]));
        assert_eq!(assemble("JMP R5"), Ok(vec![0b1100_000_101_000000]));
        assert_eq!(
            assemble("LDB R1, R4, xa\nLDW R3, R6, #5"),
            Ok(vec![0b0010_001_100_001010, 0b0110_011_110_000101])
        );
        assert_eq!(assemble("HALT"), Ok(vec![0xF025]));
    }

    #[allow(clippy::unusual_byte_groupings)]
    #[test]
    fn backward_branch() {
        assert_eq!(
            assemble("LABEL:\nXOR R0, R3, R4\nBRnp LABEL"),
            Ok(vec![0b1001_000_011_0_00_100, 0b0000_1_0_1_111111110])
        );
    }

    #[test]
    fn forward_branch() {
        // BR at 0, target at 1: offset 1 - (0 + 1) = 0
        assert_eq!(
            assemble("BR main\nmain: RTI"),
            Ok(vec![0b0000_111_000000000, 0x8000])
        );
    }

    #[test]
    fn extension_resolves_across_chunks() {
        let unit = TranslationUnit::parse("test:\nXOR R0, R3, R4").unwrap();
        let unit = TranslationUnit::parse_extend("BRnp test", unit).unwrap();
        assert_eq!(
            link(&unit),
            Ok(vec![0b1001_000_011_0_00_100, 0b0000_1_0_1_111111110])
        );
    }

    #[test]
    fn extension_preserves_prefix() {
        let first = "a:\nAND R1, R1, #0\nADD R1, R1, #3";
        let prefix = assemble(first).unwrap();

        let unit = TranslationUnit::parse(first).unwrap();
        let unit = TranslationUnit::parse_extend("BR a\nDW a", unit).unwrap();
        let full = link(&unit).unwrap();

        assert_eq!(&full[..prefix.len()], &prefix[..]);
        assert_eq!(full.len(), prefix.len() + 2);
    }

    #[test]
    fn pc_relative_offset_field() {
        // main at 0; AND, ADD at 0 and 1; BR at 2: offset 0 - (2 + 1) = -3
        let unit = TranslationUnit::parse("main:\nAND R0, R0, #0\nADD R0, R0, #10").unwrap();
        let unit = TranslationUnit::parse_extend("BR main", unit).unwrap();
        let words = link(&unit).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words[2] & 0x1FF, 0x1FD); // -3 in nine bits
        assert_eq!(words[2] >> 9, 0b0000_111);
    }

    #[test]
    fn jsr_offset_field() {
        let words = assemble("sub: RTI\nJSR sub").unwrap();
        // JSR at 1: offset 0 - (1 + 1) = -2
        assert_eq!(words[1], 0b0100_1_11111111110);
    }

    #[test]
    fn lea_resolves() {
        let words = assemble("LEA R2, msg\nHALT\nmsg: DB \"y\"").unwrap();
        // LEA at 0, msg at 2: offset 2 - 1 = 1
        assert_eq!(words[0], 0b1110_010_000000001);
    }

    #[test]
    fn absolute_word_data() {
        let words = assemble(". = x8\nmain: RTI\nDW main, #7").unwrap();
        assert_eq!(words, vec![0, 0, 0, 0, 0x8000, 0x0004, 0x0007]);
    }

    #[test]
    fn unresolved_label_fails() {
        let err = assemble("BR nowhere").unwrap_err();
        assert_eq!(err, Error::LabelNotResolved("nowhere".to_string(), 1));
        assert_eq!(err.code(), -4);

        let unit = TranslationUnit::parse("JSR missing").unwrap();
        let unit = TranslationUnit::parse_extend("RTI", unit).unwrap();
        assert_eq!(link(&unit).unwrap_err().code(), -4);
    }

    #[test]
    fn fail_fast_reports_first_in_source_order() {
        let err = assemble("BR first\nBR second").unwrap_err();
        assert_eq!(err, Error::LabelNotResolved("first".to_string(), 1));
    }

    #[test]
    fn out_of_range_branch_fails() {
        let err = assemble("start: RTI\n. = x300\nBR start").unwrap_err();
        assert_eq!(err, Error::OffsetOutOfRange("start".to_string(), 3));
        assert_eq!(err.code(), -4);
    }

    #[test]
    fn set_loc_emits_fill() {
        assert_eq!(assemble(". = x10"), Ok(vec![0x0000; 0x10 >> 1]));
        assert_eq!(
            assemble("DB \"hi\"\n. = #10"),
            Ok(vec![0x6968, 0x0000, 0x0000, 0x0000, 0x0000])
        );
    }

    #[test]
    fn relinking_is_deterministic() {
        let unit = TranslationUnit::parse("a:\nBR a\nDW a").unwrap();
        assert_eq!(link(&unit), link(&unit));
    }
}
