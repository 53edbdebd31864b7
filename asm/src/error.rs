use color_print::cprintln;
use thiserror::Error;

/// Every failure of either phase, parse or link. One flat taxonomy; the
/// stable boundary discriminant is [`Error::code`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The statement head was recognized but the operands do not match the
    /// mnemonic's shape or range.
    #[error("cannot parse `{0}` statement")]
    StatementSyntax(String, u32),

    /// Malformed, reserved, or redefined label name.
    #[error("bad label `{0}`")]
    LabelSyntax(String, u32),

    #[error("unexpected token `{0}`")]
    UnexpectedToken(String, u32, u32),

    #[error("undefined label `{0}`")]
    LabelNotResolved(String, u32),

    /// The label resolved, but the offset does not fit the instruction's
    /// PC-relative field.
    #[error("label `{0}` is out of range for this instruction")]
    OffsetOutOfRange(String, u32),

    #[error("cannot set location")]
    CannotSetLocation(u32),
}

impl Error {
    /// Stable negative discriminant for callers outside Rust; `0` is
    /// reserved for success.
    pub fn code(&self) -> i32 {
        match self {
            Error::StatementSyntax(..) => -1,
            Error::LabelSyntax(..) => -2,
            Error::UnexpectedToken(..) => -3,
            Error::LabelNotResolved(..) | Error::OffsetOutOfRange(..) => -4,
            Error::CannotSetLocation(..) => -5,
        }
    }

    /// 1-based source line the diagnostic points at.
    pub fn line(&self) -> u32 {
        match self {
            Error::StatementSyntax(_, line)
            | Error::LabelSyntax(_, line)
            | Error::UnexpectedToken(_, line, _)
            | Error::LabelNotResolved(_, line)
            | Error::OffsetOutOfRange(_, line)
            | Error::CannotSetLocation(line) => *line,
        }
    }

    /// Print the error with file location and line content.
    pub fn print_diag(&self, file: &str, lines: &[String]) {
        cprintln!("<red,bold>error</>: {}", self);

        let line_num = self.line() as usize;
        cprintln!("     <blue>--></> <underline>{}:{}</>", file, line_num);
        cprintln!("      <blue>|</>");

        let content = lines
            .get(line_num.saturating_sub(1))
            .map(|s| s.as_str())
            .unwrap_or("");

        cprintln!(" <blue>{:>4} |</> {}", line_num, content);
        cprintln!("      <blue>|</>");
    }
}
