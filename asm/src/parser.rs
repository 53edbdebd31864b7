use crate::error::Error;
use crate::lexer::{Token, TokenKind};
use crate::unit::{DataWord, StmtBody, TranslationUnit};
use arch::inst::Inst;
use arch::op::Mnemonic;
use arch::reg::Reg;

// ----------------------------------------------------------------------------
// Statement grammar
//
// One call per logical line. A line is zero or more label definitions
// followed by at most one instruction or directive.

pub(crate) fn parse_line(unit: &mut TranslationUnit, tokens: &[Token]) -> Result<(), Error> {
    let mut tokens = tokens;
    while let [first, second, rest @ ..] = tokens {
        if second.kind != TokenKind::Colon {
            break;
        }
        define_label(unit, first)?;
        tokens = rest;
    }

    let Some(head) = tokens.first() else {
        return Ok(());
    };
    match &head.kind {
        TokenKind::Op(m) => instruction(unit, *m, head, &tokens[1..]),
        TokenKind::Br(n, z, p) => branch(unit, (*n, *z, *p), head, &tokens[1..]),
        TokenKind::Period => set_location(unit, head, &tokens[1..]),
        // a lone word can only be a label definition that lost its colon
        TokenKind::Word(w) => Err(Error::LabelSyntax(w.clone(), head.line)),
        _ => Err(Error::UnexpectedToken(head.text(), head.line, head.col)),
    }
}

fn define_label(unit: &mut TranslationUnit, token: &Token) -> Result<(), Error> {
    match &token.kind {
        TokenKind::Word(name) if legal_label(name) => unit.define(name.clone(), token.line),
        // anything else in front of a `:` — a reserved mnemonic, a register,
        // a number, an illegal name
        _ => Err(Error::LabelSyntax(token.text(), token.line)),
    }
}

pub(crate) fn legal_label(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ----------------------------------------------------------------------------
// Operand cursor

struct Operands<'a> {
    head: &'a Token,
    tokens: &'a [Token],
    at: usize,
}

impl<'a> Operands<'a> {
    fn new(head: &'a Token, tokens: &'a [Token]) -> Self {
        Self { head, tokens, at: 0 }
    }

    fn err<T>(&self) -> Result<T, Error> {
        Err(Error::StatementSyntax(self.head.text(), self.head.line))
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.at);
        self.at += 1;
        token
    }

    fn reg(&mut self) -> Result<Reg, Error> {
        match self.next().map(|t| &t.kind) {
            Some(TokenKind::Reg(r)) => Ok(*r),
            _ => self.err(),
        }
    }

    fn comma(&mut self) -> Result<(), Error> {
        match self.next().map(|t| &t.kind) {
            Some(TokenKind::Comma) => Ok(()),
            _ => self.err(),
        }
    }

    fn equals(&mut self) -> Result<(), Error> {
        match self.next().map(|t| &t.kind) {
            Some(TokenKind::Equals) => Ok(()),
            _ => self.err(),
        }
    }

    /// A numeric literal within the mnemonic's legal range. Out-of-range
    /// values are a syntax error here, never truncated downstream.
    fn num(&mut self, lo: i32, hi: i32) -> Result<i32, Error> {
        match self.next().map(|t| &t.kind) {
            Some(TokenKind::Num(v)) if (lo..=hi).contains(v) => Ok(*v),
            _ => self.err(),
        }
    }

    fn label(&mut self) -> Result<String, Error> {
        match self.next() {
            Some(token) => match &token.kind {
                TokenKind::Word(name) if legal_label(name) => Ok(name.clone()),
                TokenKind::Word(name) => Err(Error::LabelSyntax(name.clone(), token.line)),
                _ => self.err(),
            },
            None => self.err(),
        }
    }

    fn finish(&mut self) -> Result<(), Error> {
        match self.next() {
            None => Ok(()),
            Some(_) => self.err(),
        }
    }
}

// ----------------------------------------------------------------------------
// Statements

fn instruction(
    unit: &mut TranslationUnit,
    m: Mnemonic,
    head: &Token,
    rest: &[Token],
) -> Result<(), Error> {
    use Mnemonic::*;
    let line = head.line;
    let mut ops = Operands::new(head, rest);

    let inst = match m {
        ADD | AND | XOR => {
            let dr = ops.reg()?;
            ops.comma()?;
            let sr1 = ops.reg()?;
            ops.comma()?;
            match ops.next().map(|t| &t.kind) {
                Some(TokenKind::Reg(sr2)) => match m {
                    ADD => Inst::Add(dr, sr1, *sr2),
                    AND => Inst::And(dr, sr1, *sr2),
                    _ => Inst::Xor(dr, sr1, *sr2),
                },
                Some(TokenKind::Num(v)) if (-16..=15).contains(v) => match m {
                    ADD => Inst::Addi(dr, sr1, *v as i8),
                    AND => Inst::Andi(dr, sr1, *v as i8),
                    _ => Inst::Xori(dr, sr1, *v as i8),
                },
                _ => return ops.err(),
            }
        }
        NOT => {
            let dr = ops.reg()?;
            ops.comma()?;
            let sr = ops.reg()?;
            Inst::Not(dr, sr)
        }
        JMP => Inst::Jmp(ops.reg()?),
        JSRR => Inst::Jsrr(ops.reg()?),
        RET => Inst::Ret,
        RTI => Inst::Rti,
        TRAP => Inst::Trap(ops.num(0, 0xFF)? as u8),
        HALT => Inst::Trap(0x25),
        GETC => Inst::Trap(0x20),
        OUT => Inst::Trap(0x21),
        PUTS => Inst::Trap(0x22),
        IN => Inst::Trap(0x23),
        LSHF | RSHFL | RSHFA => {
            let dr = ops.reg()?;
            ops.comma()?;
            let sr = ops.reg()?;
            ops.comma()?;
            let amount = ops.num(0, 15)? as u8;
            match m {
                LSHF => Inst::Lshf(dr, sr, amount),
                RSHFL => Inst::Rshfl(dr, sr, amount),
                _ => Inst::Rshfa(dr, sr, amount),
            }
        }
        LDB | LDW | STB | STW => {
            let r = ops.reg()?;
            ops.comma()?;
            let base = ops.reg()?;
            ops.comma()?;
            let offset = ops.num(-32, 31)? as i8;
            match m {
                LDB => Inst::Ldb(r, base, offset),
                LDW => Inst::Ldw(r, base, offset),
                STB => Inst::Stb(r, base, offset),
                _ => Inst::Stw(r, base, offset),
            }
        }

        // PC-relative operands wait for the linker
        JSR => {
            let label = ops.label()?;
            ops.finish()?;
            unit.push_pending(StmtBody::Jsr(label), line);
            return Ok(());
        }
        LEA => {
            let dr = ops.reg()?;
            ops.comma()?;
            let label = ops.label()?;
            ops.finish()?;
            unit.push_pending(StmtBody::Lea(dr, label), line);
            return Ok(());
        }

        DB => return data_bytes(unit, head, rest),
        DW => return data_words(unit, head, rest),
    };

    ops.finish()?;
    unit.push_word(inst.encode(), line);
    Ok(())
}

fn branch(
    unit: &mut TranslationUnit,
    (n, z, p): (bool, bool, bool),
    head: &Token,
    rest: &[Token],
) -> Result<(), Error> {
    let mut ops = Operands::new(head, rest);
    let label = ops.label()?;
    ops.finish()?;
    unit.push_pending(StmtBody::Branch { n, z, p, label }, head.line);
    Ok(())
}

/// `DB item, item, ...` — bytes and strings, packed two bytes per word, low
/// byte first; an odd trailing byte fills the low half.
fn data_bytes(unit: &mut TranslationUnit, head: &Token, rest: &[Token]) -> Result<(), Error> {
    let mut ops = Operands::new(head, rest);
    let mut bytes: Vec<u8> = vec![];
    loop {
        match ops.next().map(|t| &t.kind) {
            Some(TokenKind::Num(v)) if (0..=0xFF).contains(v) => bytes.push(*v as u8),
            Some(TokenKind::Str(s)) => {
                for ch in s.chars() {
                    if ch as u32 > 0xFF {
                        return ops.err();
                    }
                    bytes.push(ch as u8);
                }
            }
            _ => return ops.err(),
        }
        match ops.next().map(|t| &t.kind) {
            Some(TokenKind::Comma) => continue,
            None => break,
            _ => return ops.err(),
        }
    }

    let words = bytes
        .chunks(2)
        .map(|pair| {
            let lo = pair[0] as u16;
            let hi = pair.get(1).copied().unwrap_or(0) as u16;
            DataWord::Lit(hi << 8 | lo)
        })
        .collect();
    unit.push_data(words, head.line);
    Ok(())
}

/// `DW item, item, ...` — word literals, or label names emitting the
/// label's absolute address.
fn data_words(unit: &mut TranslationUnit, head: &Token, rest: &[Token]) -> Result<(), Error> {
    let mut ops = Operands::new(head, rest);
    let mut items: Vec<DataWord> = vec![];
    loop {
        match ops.next() {
            Some(token) => match &token.kind {
                TokenKind::Num(v) if (0..=0xFFFF).contains(v) => {
                    items.push(DataWord::Lit(*v as u16))
                }
                TokenKind::Word(name) if legal_label(name) => {
                    items.push(DataWord::Label(name.clone()))
                }
                TokenKind::Word(name) => {
                    return Err(Error::LabelSyntax(name.clone(), token.line))
                }
                _ => return ops.err(),
            },
            None => return ops.err(),
        }
        match ops.next().map(|t| &t.kind) {
            Some(TokenKind::Comma) => continue,
            None => break,
            _ => return ops.err(),
        }
    }
    unit.push_data(items, head.line);
    Ok(())
}

/// `. = addr` — origin directive. The operand is a byte address; the
/// location counter is word-granular.
fn set_location(unit: &mut TranslationUnit, head: &Token, rest: &[Token]) -> Result<(), Error> {
    let mut ops = Operands::new(head, rest);
    ops.equals()?;
    let addr = ops.num(0, 0x1FFFF)?;
    ops.finish()?;
    unit.set_location((addr >> 1) as u16, head.line)
}
