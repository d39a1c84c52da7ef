//! Source locations for lifted IL instructions.
//!
//! An IL instruction remembers the native address it was lifted from and the
//! operand index within that native instruction. Locations built from nothing
//! are invalid and must not be used to annotate generated IL.

use serde::{Deserialize, Serialize};

/// Which intermediate representation an instruction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IlLevel {
    LowLevel,
    MediumLevel,
    HighLevel,
}

/// Minimal record of a lifted instruction: where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlInstruction {
    pub level: IlLevel,
    pub address: u64,
    pub source_operand: u32,
}

/// Native address and operand an IL instruction was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IlSourceLocation {
    pub address: u64,
    pub source_operand: u32,
    pub valid: bool,
}

impl IlSourceLocation {
    pub fn new(address: u64, source_operand: u32) -> Self {
        Self {
            address,
            source_operand,
            valid: true,
        }
    }
}

impl Default for IlSourceLocation {
    fn default() -> Self {
        Self {
            address: 0,
            source_operand: 0,
            valid: false,
        }
    }
}

impl From<&IlInstruction> for IlSourceLocation {
    fn from(instr: &IlInstruction) -> Self {
        Self::new(instr.address, instr.source_operand)
    }
}
