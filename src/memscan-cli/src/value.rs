//! Typed value encoding
//!
//! Turns user input into the little-endian byte pattern a scan looks for,
//! and decodes bytes read back from the target for display.

use anyhow::{bail, Context, Result};
use byteorder::{ByteOrder, LE};
use clap::ValueEnum;
use memscan::{Pattern, MAX_PATTERN_LEN};

/// Value types a scan understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueType {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
    /// Raw hex pairs, for patterns that are not any single typed value
    Bytes,
}

impl ValueType {
    /// Menu order for the interactive session
    pub const ALL: [ValueType; 7] = [
        ValueType::U8,
        ValueType::I16,
        ValueType::I32,
        ValueType::I64,
        ValueType::F32,
        ValueType::F64,
        ValueType::Str,
    ];

    /// Short human-readable name
    pub fn name(self) -> &'static str {
        match self {
            ValueType::U8 => "8-Bit Integer",
            ValueType::I16 => "16-Bit Integer",
            ValueType::I32 => "32-Bit Integer",
            ValueType::I64 => "64-Bit Integer",
            ValueType::F32 => "Float",
            ValueType::F64 => "Double",
            ValueType::Str => "String",
            ValueType::Bytes => "Raw Bytes",
        }
    }

    /// Human-readable label with the encoded width
    pub fn label(self) -> &'static str {
        match self {
            ValueType::U8 => "8-Bit Integer     (1 Byte)",
            ValueType::I16 => "16-Bit Integer    (2 Bytes)",
            ValueType::I32 => "32-Bit Integer    (4 Bytes)",
            ValueType::I64 => "64-Bit Integer    (8 Bytes)",
            ValueType::F32 => "Float             (4 Bytes)",
            ValueType::F64 => "Double            (8 Bytes)",
            ValueType::Str => "String            (Up to 1023 characters)",
            ValueType::Bytes => "Raw Bytes         (hex pairs)",
        }
    }

    /// Encode user input as the byte pattern to search or write.
    ///
    /// Numeric types become their little-endian representation. Strings
    /// become the raw bytes plus a trailing NUL, so a match covers the
    /// whole C string in the target.
    pub fn encode(self, input: &str) -> Result<Pattern> {
        let bytes = match self {
            ValueType::U8 => {
                let v: u8 = input
                    .trim()
                    .parse()
                    .context("Value not in 8-Bit Integer range")?;
                vec![v]
            }
            ValueType::I16 => {
                let v: i16 = input
                    .trim()
                    .parse()
                    .context("Value not in 16-Bit Integer range")?;
                let mut buf = [0u8; 2];
                LE::write_i16(&mut buf, v);
                buf.to_vec()
            }
            ValueType::I32 => {
                let v: i32 = input
                    .trim()
                    .parse()
                    .context("Value not in 32-Bit Integer range")?;
                let mut buf = [0u8; 4];
                LE::write_i32(&mut buf, v);
                buf.to_vec()
            }
            ValueType::I64 => {
                let v: i64 = input
                    .trim()
                    .parse()
                    .context("Value not in 64-Bit Integer range")?;
                let mut buf = [0u8; 8];
                LE::write_i64(&mut buf, v);
                buf.to_vec()
            }
            ValueType::F32 => {
                let v: f32 = input.trim().parse().context("Value not in Float range")?;
                let mut buf = [0u8; 4];
                LE::write_f32(&mut buf, v);
                buf.to_vec()
            }
            ValueType::F64 => {
                let v: f64 = input.trim().parse().context("Value not in Double range")?;
                let mut buf = [0u8; 8];
                LE::write_f64(&mut buf, v);
                buf.to_vec()
            }
            ValueType::Str => {
                let mut buf = input.as_bytes().to_vec();
                buf.push(0);
                if buf.len() > MAX_PATTERN_LEN {
                    bail!("String longer than {} characters", MAX_PATTERN_LEN - 1);
                }
                buf
            }
            ValueType::Bytes => {
                // Accept "de ad be ef" as well as "deadbeef"
                let cleaned: String = input.split_whitespace().collect();
                hex::decode(&cleaned).context("Invalid hex byte string")?
            }
        };

        Ok(Pattern::from_bytes(bytes)?)
    }

    /// Decode bytes read from the target back into a printable value
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            ValueType::U8 => bytes.first().map_or_else(String::new, u8::to_string),
            ValueType::I16 => LE::read_i16(bytes).to_string(),
            ValueType::I32 => LE::read_i32(bytes).to_string(),
            ValueType::I64 => LE::read_i64(bytes).to_string(),
            ValueType::F32 => LE::read_f32(bytes).to_string(),
            ValueType::F64 => LE::read_f64(bytes).to_string(),
            ValueType::Str => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                String::from_utf8_lossy(&bytes[..end]).into_owned()
            }
            ValueType::Bytes => hex::encode(bytes),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::U8 => "u8",
            ValueType::I16 => "i16",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Str => "str",
            ValueType::Bytes => "bytes",
        };
        write!(f, "{}", name)
    }
}
