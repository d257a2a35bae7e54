//! Cairo ABI description and the calldata serializer driven by it.
//!
//! Arguments are supplied as JSON, either as an object keyed by parameter
//! name or as an array in declaration order, and serialized to the felt
//! layout the Cairo ABI prescribes.

use serde::Deserialize;
use serde_json::Value;
use starknet::core::{
    codec::Encode,
    types::{ByteArray, Felt, U256},
    utils::cairo_short_string_to_felt,
};

use crate::error::CalldataError;

const FELT252: &str = "core::felt252";
const CONTRACT_ADDRESS: &str = "core::starknet::contract_address::ContractAddress";
const CLASS_HASH: &str = "core::starknet::class_hash::ClassHash";
const ETH_ADDRESS: &str = "core::starknet::eth_address::EthAddress";
const BOOL: &str = "core::bool";
const UINT256: &str = "core::integer::u256";
const BYTE_ARRAY: &str = "core::byte_array::ByteArray";
const ARRAY: &str = "core::array::Array";
const SPAN: &str = "core::array::Span";
const OPTION: &str = "core::option::Option";
const UNIT: &str = "()";

static NULL: Value = Value::Null;

/// A named, typed slot: constructor/function input, struct member or enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiMember {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbiEntry {
    Constructor {
        name: String,
        inputs: Vec<AbiMember>,
    },
    Function {
        name: String,
        inputs: Vec<AbiMember>,
    },
    Interface {
        name: String,
        items: Vec<AbiEntry>,
    },
    Struct {
        name: String,
        members: Vec<AbiMember>,
    },
    Enum {
        name: String,
        variants: Vec<AbiMember>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default)]
pub struct Abi {
    entries: Vec<AbiEntry>,
}

impl Abi {
    /// Parses the `abi` field of a Sierra contract class. Older compilers
    /// emit it as a JSON string holding the array, newer ones as the array.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let entries = match value {
            Value::String(text) => serde_json::from_str(text)?,
            other => Vec::<AbiEntry>::deserialize(other)?,
        };
        Ok(Self { entries })
    }

    pub fn constructor(&self) -> Option<&[AbiMember]> {
        self.entries.iter().find_map(|entry| match entry {
            AbiEntry::Constructor { inputs, .. } => Some(inputs.as_slice()),
            _ => None,
        })
    }

    /// Looks a function up at the top level and inside interfaces.
    pub fn function(&self, name: &str) -> Option<&[AbiMember]> {
        fn search<'a>(entries: &'a [AbiEntry], name: &str) -> Option<&'a [AbiMember]> {
            entries.iter().find_map(|entry| match entry {
                AbiEntry::Function {
                    name: function,
                    inputs,
                } if function == name => Some(inputs.as_slice()),
                AbiEntry::Interface { items, .. } => search(items, name),
                _ => None,
            })
        }
        search(&self.entries, name)
    }

    fn struct_members(&self, ty: &str) -> Option<&[AbiMember]> {
        self.entries.iter().find_map(|entry| match entry {
            AbiEntry::Struct { name, members } if name == ty => Some(members.as_slice()),
            _ => None,
        })
    }

    fn enum_variants(&self, ty: &str) -> Option<&[AbiMember]> {
        self.entries.iter().find_map(|entry| match entry {
            AbiEntry::Enum { name, variants } if name == ty => Some(variants.as_slice()),
            _ => None,
        })
    }

    pub fn encode_constructor(&self, args: &Value) -> Result<Vec<Felt>, CalldataError> {
        match self.constructor() {
            Some(inputs) => self.encode_inputs(inputs, args),
            None if is_empty_args(args) => Ok(Vec::new()),
            None => Err(CalldataError::MissingConstructor),
        }
    }

    pub fn encode_function(&self, name: &str, args: &Value) -> Result<Vec<Felt>, CalldataError> {
        let inputs = self
            .function(name)
            .ok_or_else(|| CalldataError::MissingFunction(name.to_string()))?;
        self.encode_inputs(inputs, args)
    }

    fn encode_inputs(&self, inputs: &[AbiMember], args: &Value) -> Result<Vec<Felt>, CalldataError> {
        let mut calldata = Vec::new();
        self.encode_members(inputs, args, &mut calldata)?;
        Ok(calldata)
    }

    fn encode_members(
        &self,
        members: &[AbiMember],
        value: &Value,
        out: &mut Vec<Felt>,
    ) -> Result<(), CalldataError> {
        match value {
            Value::Object(named) => {
                for member in members {
                    let value = named
                        .get(&member.name)
                        .ok_or_else(|| CalldataError::MissingArgument(member.name.clone()))?;
                    self.encode_value(&member.ty, value, out)?;
                }
            }
            Value::Array(positional) => {
                if positional.len() != members.len() {
                    return Err(CalldataError::ArgumentCount {
                        expected: members.len(),
                        actual: positional.len(),
                    });
                }
                for (member, value) in members.iter().zip(positional) {
                    self.encode_value(&member.ty, value, out)?;
                }
            }
            Value::Null if members.is_empty() => {}
            _ => return Err(CalldataError::ArgumentShape),
        }
        Ok(())
    }

    fn encode_value(&self, ty: &str, value: &Value, out: &mut Vec<Felt>) -> Result<(), CalldataError> {
        match ty {
            FELT252 => out.push(felt_from_value(ty, value, true)?),
            CONTRACT_ADDRESS | CLASS_HASH | ETH_ADDRESS => {
                out.push(felt_from_value(ty, value, false)?)
            }
            BOOL => match value {
                Value::Bool(flag) => out.push(Felt::from(u64::from(*flag))),
                _ => return Err(invalid(ty, "expected a boolean")),
            },
            UINT256 if !value.is_object() => {
                let (low, high) = u256_from_value(ty, value)?;
                encode_with(ty, &U256::from_words(low, high), out)?;
            }
            BYTE_ARRAY => match value {
                Value::String(text) => encode_with(ty, &ByteArray::from(text.as_str()), out)?,
                _ => return Err(invalid(ty, "expected a string")),
            },
            _ => {
                if let Some(bits) = unsigned_width(ty) {
                    let (low, high) = u256_from_value(ty, value)?;
                    if high != 0 || (bits < 128 && low >> bits != 0) {
                        return Err(CalldataError::Overflow(ty.to_string()));
                    }
                    out.push(Felt::from(low));
                } else if let Some(inner) = generic_arg(ty, ARRAY).or_else(|| generic_arg(ty, SPAN)) {
                    let items = value
                        .as_array()
                        .ok_or_else(|| invalid(ty, "expected an array"))?;
                    out.push(Felt::from(items.len() as u64));
                    for item in items {
                        self.encode_value(inner, item, out)?;
                    }
                } else if let Some(members) = self.struct_members(ty) {
                    self.encode_members(members, value, out)?;
                } else if let Some(variants) = self.enum_variants(ty) {
                    self.encode_enum(ty, variants, value, out)?;
                } else {
                    return Err(CalldataError::Unsupported(ty.to_string()));
                }
            }
        }
        Ok(())
    }

    fn encode_enum(
        &self,
        ty: &str,
        variants: &[AbiMember],
        value: &Value,
        out: &mut Vec<Felt>,
    ) -> Result<(), CalldataError> {
        let explicit = match value {
            Value::Object(map) if map.len() == 1 => map.iter().next(),
            _ => None,
        };
        let (variant, payload) = match (explicit, value) {
            (Some((name, payload)), _) => (name.as_str(), payload),
            (None, Value::Null) if ty.starts_with(OPTION) => ("None", &NULL),
            (None, other) if ty.starts_with(OPTION) => ("Some", other),
            (None, Value::String(name)) => (name.as_str(), &NULL),
            _ => return Err(invalid(ty, "expected a variant name or a single-key object")),
        };

        let index = variants
            .iter()
            .position(|candidate| candidate.name == variant)
            .ok_or_else(|| CalldataError::UnknownVariant {
                ty: ty.to_string(),
                variant: variant.to_string(),
            })?;
        out.push(Felt::from(index as u64));

        let variant_ty = &variants[index].ty;
        if variant_ty != UNIT {
            self.encode_value(variant_ty, payload, out)?;
        }
        Ok(())
    }
}

/// Renders calldata the way block explorers show it.
pub fn format_calldata(calldata: &[Felt]) -> String {
    let felts: Vec<String> = calldata.iter().map(|felt| format!("{felt:#x}")).collect();
    format!("[{}]", felts.join(", "))
}

fn is_empty_args(args: &Value) -> bool {
    match args {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn invalid(ty: &str, reason: impl Into<String>) -> CalldataError {
    CalldataError::InvalidValue {
        ty: ty.to_string(),
        reason: reason.into(),
    }
}

fn generic_arg<'a>(ty: &'a str, base: &str) -> Option<&'a str> {
    ty.strip_prefix(base)?.strip_prefix("::<")?.strip_suffix('>')
}

fn unsigned_width(ty: &str) -> Option<u32> {
    match ty.strip_prefix("core::integer::")? {
        "u8" => Some(8),
        "u16" => Some(16),
        "u32" | "usize" => Some(32),
        "u64" => Some(64),
        "u128" => Some(128),
        _ => None,
    }
}

fn felt_from_value(ty: &str, value: &Value, allow_short_string: bool) -> Result<Felt, CalldataError> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(Felt::from)
            .ok_or_else(|| invalid(ty, format!("{number} is not a non-negative integer"))),
        Value::String(text) => {
            let text = text.trim();
            if text.starts_with("0x") || text.starts_with("0X") {
                Felt::from_hex(text).map_err(|e| invalid(ty, e.to_string()))
            } else if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
                Felt::from_dec_str(text).map_err(|e| invalid(ty, e.to_string()))
            } else if allow_short_string {
                cairo_short_string_to_felt(text).map_err(|e| invalid(ty, e.to_string()))
            } else {
                Err(invalid(ty, format!("{text:?} is not a hex or decimal number")))
            }
        }
        _ => Err(invalid(ty, "expected a number or string")),
    }
}

/// Returns `(low, high)` 128-bit halves.
fn u256_from_value(ty: &str, value: &Value) -> Result<(u128, u128), CalldataError> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(|n| (u128::from(n), 0))
            .ok_or_else(|| invalid(ty, format!("{number} is not a non-negative integer"))),
        Value::String(text) => {
            parse_u256(text.trim()).ok_or_else(|| CalldataError::Overflow(ty.to_string()))
        }
        _ => Err(invalid(ty, "expected a number or string")),
    }
}

fn parse_u256(text: &str) -> Option<(u128, u128)> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex.is_empty() || hex.len() > 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let (high, low) = hex.split_at(hex.len().saturating_sub(32));
        let high = if high.is_empty() {
            0
        } else {
            u128::from_str_radix(high, 16).ok()?
        };
        return Some((u128::from_str_radix(low, 16).ok()?, high));
    }

    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    const MASK: u128 = u64::MAX as u128;
    let (mut low, mut high) = (0u128, 0u128);
    for digit in text.bytes().map(|b| u128::from(b - b'0')) {
        let lo = (low & MASK) * 10 + digit;
        let hi = (low >> 64) * 10 + (lo >> 64);
        low = ((hi & MASK) << 64) | (lo & MASK);
        high = high.checked_mul(10)?.checked_add(hi >> 64)?;
    }
    Some((low, high))
}

fn encode_with<T: Encode>(ty: &str, value: &T, out: &mut Vec<Felt>) -> Result<(), CalldataError> {
    value.encode(out).map_err(|e| invalid(ty, e.to_string()))
}
