//! ABI type specifications.
//!
//! A [`TypeSpec`] describes the encoding of an ABI value: its canonical
//! type string, whether its encoding length is fixed, and which stack type
//! holds it once decoded into a scratch slot.

use std::fmt;

use teal_ir::TealType;

use crate::error::AbiError;

/// An ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    /// `uintN` with N in 8..=512 and a multiple of 8.
    Uint(u16),
    Byte,
    Bool,
    /// 32-byte account address.
    Address,
    /// Length-prefixed UTF-8 bytes.
    String,
    StaticArray(Box<TypeSpec>, usize),
    DynamicArray(Box<TypeSpec>),
    Tuple(Vec<TypeSpec>),
}

impl TypeSpec {
    /// Build a `uintN` type, validating the bit width.
    pub fn uint(bits: u16) -> Result<TypeSpec, AbiError> {
        if (8..=512).contains(&bits) && bits % 8 == 0 {
            Ok(TypeSpec::Uint(bits))
        } else {
            Err(AbiError::InvalidType(format!("uint{bits}")))
        }
    }

    pub fn uint64() -> TypeSpec {
        TypeSpec::Uint(64)
    }

    pub fn static_array(elem: TypeSpec, len: usize) -> TypeSpec {
        TypeSpec::StaticArray(Box::new(elem), len)
    }

    pub fn dynamic_array(elem: TypeSpec) -> TypeSpec {
        TypeSpec::DynamicArray(Box::new(elem))
    }

    /// Whether the encoding length of this type depends on the value.
    pub fn is_dynamic(&self) -> bool {
        match self {
            TypeSpec::String | TypeSpec::DynamicArray(_) => true,
            TypeSpec::StaticArray(elem, _) => elem.is_dynamic(),
            TypeSpec::Tuple(elems) => elems.iter().any(TypeSpec::is_dynamic),
            TypeSpec::Uint(_) | TypeSpec::Byte | TypeSpec::Bool | TypeSpec::Address => false,
        }
    }

    /// Encoded length in bytes of a static type.
    ///
    /// Consecutive `bool`s in a tuple or static array share bytes, eight
    /// to a byte.
    pub fn byte_length_static(&self) -> Result<usize, AbiError> {
        match self {
            TypeSpec::Uint(bits) => Ok(usize::from(*bits) / 8),
            TypeSpec::Byte | TypeSpec::Bool => Ok(1),
            TypeSpec::Address => Ok(32),
            TypeSpec::StaticArray(elem, len) if **elem == TypeSpec::Bool => Ok(len.div_ceil(8)),
            TypeSpec::StaticArray(elem, len) => elem
                .byte_length_static()?
                .checked_mul(*len)
                .ok_or_else(|| AbiError::TooLarge(self.clone())),
            TypeSpec::Tuple(elems) if !self.is_dynamic() => {
                let mut total: usize = 0;
                let mut i = 0;
                while i < elems.len() {
                    let length = if elems[i] == TypeSpec::Bool {
                        let run = bool_run(&elems[i..]);
                        i += run;
                        run.div_ceil(8)
                    } else {
                        i += 1;
                        elems[i - 1].byte_length_static()?
                    };
                    total = total
                        .checked_add(length)
                        .ok_or_else(|| AbiError::TooLarge(self.clone()))?;
                }
                Ok(total)
            }
            _ => Err(AbiError::DynamicLength(self.clone())),
        }
    }

    /// Stack type of a decoded value of this type.
    pub fn storage_type(&self) -> TealType {
        match self {
            TypeSpec::Uint(bits) if *bits <= 64 => TealType::Uint64,
            TypeSpec::Byte | TypeSpec::Bool => TealType::Uint64,
            _ => TealType::Bytes,
        }
    }

    /// Parse a canonical ABI type string such as `(uint64,bool[3])[]`.
    pub fn parse(text: &str) -> Result<TypeSpec, AbiError> {
        let mut parser = Parser { text, pos: 0 };
        let spec = parser.parse_type()?;
        if parser.pos != text.len() {
            return Err(AbiError::InvalidType(text.to_string()));
        }
        Ok(spec)
    }
}

/// Length of the leading run of `bool`s.
pub(crate) fn bool_run(elems: &[TypeSpec]) -> usize {
    elems.iter().take_while(|e| **e == TypeSpec::Bool).count()
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Uint(bits) => write!(f, "uint{bits}"),
            TypeSpec::Byte => write!(f, "byte"),
            TypeSpec::Bool => write!(f, "bool"),
            TypeSpec::Address => write!(f, "address"),
            TypeSpec::String => write!(f, "string"),
            TypeSpec::StaticArray(elem, len) => write!(f, "{elem}[{len}]"),
            TypeSpec::DynamicArray(elem) => write!(f, "{elem}[]"),
            TypeSpec::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// ── Parser ──────────────────────────────────────────────────────────────

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self) -> AbiError {
        AbiError::InvalidType(self.text.to_string())
    }

    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn eat(&mut self, c: char) -> bool {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> Result<TypeSpec, AbiError> {
        let mut spec = self.parse_base()?;
        while self.eat('[') {
            let digits: String = self.rest().chars().take_while(char::is_ascii_digit).collect();
            self.pos += digits.len();
            if !self.eat(']') {
                return Err(self.error());
            }
            spec = if digits.is_empty() {
                TypeSpec::dynamic_array(spec)
            } else {
                let len = digits.parse().map_err(|_| self.error())?;
                TypeSpec::static_array(spec, len)
            };
        }
        Ok(spec)
    }

    fn parse_base(&mut self) -> Result<TypeSpec, AbiError> {
        if self.eat('(') {
            let mut elems = Vec::new();
            if self.eat(')') {
                return Ok(TypeSpec::Tuple(elems));
            }
            loop {
                elems.push(self.parse_type()?);
                if self.eat(')') {
                    return Ok(TypeSpec::Tuple(elems));
                }
                if !self.eat(',') {
                    return Err(self.error());
                }
            }
        }

        let word: String = self
            .rest()
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect();
        self.pos += word.len();
        match word.as_str() {
            "byte" => Ok(TypeSpec::Byte),
            "bool" => Ok(TypeSpec::Bool),
            "address" => Ok(TypeSpec::Address),
            "string" => Ok(TypeSpec::String),
            _ => {
                let bits = word
                    .strip_prefix("uint")
                    .and_then(|b| b.parse::<u16>().ok())
                    .ok_or_else(|| self.error())?;
                TypeSpec::uint(bits).map_err(|_| self.error())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        for text in [
            "uint64",
            "uint8",
            "byte",
            "bool",
            "address",
            "string",
            "uint64[3]",
            "byte[]",
            "(uint64,bool)",
            "()",
            "((uint8,string),bool[2])[]",
        ] {
            let spec = TypeSpec::parse(text).unwrap();
            assert_eq!(spec.to_string(), text);
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        for text in ["", "uint", "uint7", "uint1024", "int64", "(uint64", "uint64[", "(,)", "bool]"] {
            assert!(TypeSpec::parse(text).is_err(), "{text} should not parse");
        }
    }

    #[test]
    fn dynamic_types() {
        assert!(TypeSpec::String.is_dynamic());
        assert!(TypeSpec::dynamic_array(TypeSpec::Byte).is_dynamic());
        assert!(TypeSpec::Tuple(vec![TypeSpec::Bool, TypeSpec::String]).is_dynamic());
        assert!(TypeSpec::static_array(TypeSpec::String, 2).is_dynamic());
        assert!(!TypeSpec::static_array(TypeSpec::uint64(), 2).is_dynamic());
        assert!(!TypeSpec::Tuple(vec![]).is_dynamic());
    }

    #[test]
    fn static_lengths_pack_bools() {
        let spec = TypeSpec::parse("(bool,bool,uint16,bool)").unwrap();
        assert_eq!(spec.byte_length_static().unwrap(), 1 + 2 + 1);
        let nine = TypeSpec::static_array(TypeSpec::Bool, 9);
        assert_eq!(nine.byte_length_static().unwrap(), 2);
        assert_eq!(TypeSpec::Address.byte_length_static().unwrap(), 32);
        assert_eq!(
            TypeSpec::String.byte_length_static(),
            Err(AbiError::DynamicLength(TypeSpec::String))
        );
    }

    #[test]
    fn oversized_static_length_is_an_error() {
        let huge = TypeSpec::parse("uint512[300000000000000000]").unwrap();
        assert_eq!(huge.byte_length_static(), Err(AbiError::TooLarge(huge.clone())));

        let pair = TypeSpec::Tuple(vec![
            TypeSpec::static_array(TypeSpec::Byte, usize::MAX),
            TypeSpec::uint64(),
        ]);
        assert_eq!(pair.byte_length_static(), Err(AbiError::TooLarge(pair.clone())));
    }

    #[test]
    fn storage_types() {
        assert_eq!(TypeSpec::uint64().storage_type(), TealType::Uint64);
        assert_eq!(TypeSpec::Bool.storage_type(), TealType::Uint64);
        assert_eq!(TypeSpec::Uint(128).storage_type(), TealType::Bytes);
        assert_eq!(TypeSpec::Address.storage_type(), TealType::Bytes);
    }
}
