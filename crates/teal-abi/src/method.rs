//! Method signatures, selectors, and the contract descriptor.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

use crate::error::AbiError;
use crate::type_spec::TypeSpec;

/// The first four bytes of SHA-512/256 of `signature`.
pub fn method_selector(signature: &str) -> [u8; 4] {
    let hash = Sha512_256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodArg {
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodReturns {
    #[serde(rename = "type")]
    pub type_name: String,
}

/// One callable method as it appears in the contract descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub args: Vec<MethodArg>,
    pub returns: MethodReturns,
}

impl Method {
    pub fn new(name: &str, args: Vec<TypeSpec>, returns: Option<TypeSpec>) -> Method {
        Method {
            name: name.to_string(),
            args: args
                .iter()
                .map(|spec| MethodArg {
                    type_name: spec.to_string(),
                })
                .collect(),
            returns: MethodReturns {
                type_name: returns.map_or_else(|| "void".to_string(), |spec| spec.to_string()),
            },
        }
    }

    /// Parse `name(type,...)return_type`.
    pub fn from_signature(signature: &str) -> Result<Method, AbiError> {
        let invalid = || AbiError::InvalidSignature(signature.to_string());
        let open = signature.find('(').ok_or_else(invalid)?;
        let name = &signature[..open];
        if name.is_empty() {
            return Err(invalid());
        }

        let mut depth = 0usize;
        let mut close = None;
        for (i, c) in signature[open..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close = close.ok_or_else(invalid)?;

        // The argument list is itself a tuple type.
        let args = match TypeSpec::parse(&signature[open..=close]).map_err(|_| invalid())? {
            TypeSpec::Tuple(args) => args,
            _ => return Err(invalid()),
        };
        let returns = match &signature[close + 1..] {
            "void" => None,
            text => Some(TypeSpec::parse(text).map_err(|_| invalid())?),
        };
        Ok(Method::new(name, args, returns))
    }

    /// `name(arg,...)return`.
    pub fn signature(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(|a| a.type_name.as_str()).collect();
        format!("{}({}){}", self.name, args.join(","), self.returns.type_name)
    }

    pub fn selector(&self) -> [u8; 4] {
        method_selector(&self.signature())
    }
}

/// The externally published description of a routed application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub name: String,
    pub methods: Vec<Method>,
}

impl Contract {
    pub fn new(name: impl Into<String>, methods: Vec<Method>) -> Contract {
        Contract {
            name: name.into(),
            methods,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<Contract, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_known_vector() {
        assert_eq!(
            method_selector("add(uint64,uint64)uint128"),
            [0x8a, 0xa3, 0xb6, 0x1f]
        );
    }

    #[test]
    fn signature_round_trips_through_parser() {
        let method = Method::from_signature("swap((uint64,bool),byte[])(string,address)").unwrap();
        assert_eq!(method.name, "swap");
        assert_eq!(method.args.len(), 2);
        assert_eq!(method.args[0].type_name, "(uint64,bool)");
        assert_eq!(method.returns.type_name, "(string,address)");
        assert_eq!(method.signature(), "swap((uint64,bool),byte[])(string,address)");
    }

    #[test]
    fn void_and_empty_arguments() {
        let method = Method::from_signature("ping()void").unwrap();
        assert!(method.args.is_empty());
        assert_eq!(method.signature(), "ping()void");
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        for sig in ["()void", "f", "f(uint64", "f(uint64)", "f(uint7)void", "f(uint64)void)"] {
            assert!(Method::from_signature(sig).is_err(), "{sig} should not parse");
        }
    }

    #[test]
    fn contract_json_shape() {
        let contract = Contract::new(
            "calc",
            vec![Method::new("add", vec![TypeSpec::uint64(); 2], Some(TypeSpec::uint64()))],
        );
        let value: serde_json::Value = serde_json::from_str(&contract.to_json().unwrap()).unwrap();
        assert_eq!(value["name"], "calc");
        assert_eq!(value["methods"][0]["args"][1]["type"], "uint64");
        assert_eq!(value["methods"][0]["returns"]["type"], "uint64");
        assert_eq!(Contract::from_json(&contract.to_json().unwrap()).unwrap(), contract);
    }
}
