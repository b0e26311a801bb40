//! Program Status Word helpers.
//!
//! IPCS reports PSWs either in the 128-bit z/Architecture form or in the
//! 64-bit ESA/390 form. [`psw_scrunch`] folds the former into the latter
//! and [`psw_parse`] decodes the fields of a 64-bit PSW.

use crate::error::{Error, Result};
use crate::hex::HexValue;

/// Address space control mode (PSW bits 16-17)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AscMode {
    /// Primary space mode
    Primary,
    /// Access register mode
    AccessRegister,
    /// Secondary space mode
    Secondary,
    /// Home space mode
    Home,
}

impl AscMode {
    /// Returns the name IPCS uses for the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            AscMode::Primary => "PRIMARY",
            AscMode::AccessRegister => "AR",
            AscMode::Secondary => "SECONDARY",
            AscMode::Home => "HOME",
        }
    }
}

/// Decoded fields of a PSW
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PswInfo {
    /// Enabled for I/O and external interrupts; `None` if only one of
    /// bits 6 and 7 is on
    pub enabled: Option<bool>,
    /// Storage protection key
    pub key: u8,
    /// Supervisor state (problem state bit off)
    pub privileged: bool,
    /// Address space control mode
    pub asc_mode: AscMode,
    /// Condition code
    pub cc: u8,
    /// 24, 31 or 64; `None` for the invalid bit combination
    pub amode: Option<u8>,
    /// Instruction address
    pub instr_addr: HexValue,
}

fn check_unsigned(psw: &HexValue) -> Result<()> {
    if psw.is_negative() {
        return Err(Error::invalid_argument("psw cannot be negative"));
    }
    Ok(())
}

/// Folds a 128-bit PSW into 64 bits; a 64-bit PSW is returned unchanged.
///
/// Bit 12 is turned on and the low word becomes word 1 ORed with word 3.
pub fn psw_scrunch(psw: &HexValue) -> Result<HexValue> {
    check_unsigned(psw)?;
    match psw.bit_len() {
        64 => Ok(psw.clone()),
        128 => {
            let psw = psw.turn_on_bit(12, false)?;
            let low = psw.get_word(1, false)? | psw.get_word(3, false)?;
            Ok(psw.get_word(0, false)?.concat(&low))
        }
        bits => Err(Error::invalid_argument(format!(
            "psw to be scrunched must be 64 or 128 bits, got {}",
            bits
        ))),
    }
}

/// Decodes a 64-bit or 128-bit PSW
pub fn psw_parse(psw: &HexValue) -> Result<PswInfo> {
    check_unsigned(psw)?;
    let psw = match psw.bit_len() {
        64 => psw.clone(),
        128 => psw_scrunch(psw)?,
        bits => {
            return Err(Error::invalid_argument(format!(
                "psw must be 64 or 128 bits, got {}",
                bits
            )))
        }
    };
    let bit = |position: usize| psw.check_bit(position, false);

    let enabled = match (bit(6)?, bit(7)?) {
        (true, true) => Some(true),
        (false, false) => Some(false),
        _ => None,
    };

    let key_nibble = psw.get_nibble(2, false)?;
    let key = u8::from_str_radix(key_nibble.magnitude(), 16)
        .map_err(|e| Error::invalid_format(key_nibble.to_str(), e.to_string()))?;

    let asc_mode = match (bit(16)?, bit(17)?) {
        (false, false) => AscMode::Primary,
        (false, true) => AscMode::AccessRegister,
        (true, false) => AscMode::Secondary,
        (true, true) => AscMode::Home,
    };

    let cc = (u8::from(bit(18)?) << 1) | u8::from(bit(19)?);

    let amode = match (bit(31)?, bit(32)?) {
        (false, false) => Some(24),
        (false, true) => Some(31),
        (true, true) => Some(64),
        (true, false) => None,
    };

    let instr_addr = psw.get_word(1, false)?.turn_off_bit(0, false)?;

    Ok(PswInfo {
        enabled,
        key,
        privileged: !bit(15)?,
        asc_mode,
        cc,
        amode,
        instr_addr,
    })
}
