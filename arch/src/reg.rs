use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    EnumString,
    Display,
    Eq,
)]
#[repr(u8)]
pub enum Reg {
    #[default]
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Reg {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.parse::<Self>() {
            Ok(r) => Ok(r),
            Err(_) => Err(format!("Unknown reg name: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Reg;

    #[test]
    fn parse() {
        assert_eq!(Reg::parse("R0"), Ok(Reg::R0));
        assert_eq!(Reg::parse("R7"), Ok(Reg::R7));
        assert!(Reg::parse("R8").is_err());
        // register names are case-sensitive; `r3` can still be a label
        assert!(Reg::parse("r3").is_err());
    }

    #[test]
    fn bits() {
        assert_eq!(Reg::R5 as u16, 5);
        assert_eq!(Reg::from(3u8), Reg::R3);
    }
}
