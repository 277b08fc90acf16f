//! Typed ABI values held in scratch slots.
//!
//! An [`AbiValue`] owns one scratch slot. Values whose type is `uintN` with
//! N <= 64, `byte`, or `bool` are stored decoded as integers; every other
//! type is stored in its ABI byte encoding.

use teal_ir::{BinaryOp, Bytes, Expr, ScratchSlot};

use crate::error::AbiError;
use crate::type_spec::{bool_run, TypeSpec};

/// Prefix of the log line that carries a method's return value.
pub const RETURN_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];

/// An ABI-typed scratch variable.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiValue {
    spec: TypeSpec,
    slot: ScratchSlot,
}

impl AbiValue {
    /// Allocate a fresh slot for a value of type `spec`.
    pub fn new(spec: TypeSpec) -> AbiValue {
        AbiValue {
            spec,
            slot: ScratchSlot::new(),
        }
    }

    pub fn type_spec(&self) -> &TypeSpec {
        &self.spec
    }

    pub fn slot(&self) -> ScratchSlot {
        self.slot
    }

    /// Load the stored value.
    pub fn get(&self) -> Expr {
        Expr::Load(self.slot, self.spec.storage_type())
    }

    /// Store a stack value of this value's storage type.
    pub fn set(&self, value: Expr) -> Result<Expr, AbiError> {
        let expected = self.spec.storage_type();
        let found = value.type_of();
        if !found.satisfies(expected) {
            return Err(AbiError::ValueType {
                spec: self.spec.clone(),
                expected,
                found,
            });
        }
        Ok(Expr::store(self.slot, value))
    }

    /// Decode `encoded` bytes and store the result.
    pub fn decode(&self, encoded: Expr) -> Expr {
        let decoded = match &self.spec {
            TypeSpec::Uint(bits) if *bits <= 64 => Expr::btoi(encoded),
            TypeSpec::Byte => Expr::btoi(encoded),
            TypeSpec::Bool => Expr::GetBit {
                source: Box::new(encoded),
                index: Box::new(Expr::Int(0)),
            },
            _ => encoded,
        };
        Expr::store(self.slot, decoded)
    }

    /// The ABI byte encoding of the stored value.
    pub fn encode(&self) -> Expr {
        match &self.spec {
            TypeSpec::Uint(64) => Expr::itob(self.get()),
            TypeSpec::Uint(bits) if *bits < 64 => {
                let width = (*bits / 8) as u8;
                Expr::Extract {
                    source: Box::new(Expr::itob(self.get())),
                    start: 8 - width,
                    length: width,
                }
            }
            TypeSpec::Byte => Expr::Extract {
                source: Box::new(Expr::itob(self.get())),
                start: 7,
                length: 1,
            },
            TypeSpec::Bool => Expr::SetBit {
                target: Box::new(Expr::Bytes(Bytes::from_raw(&[0x00]))),
                index: Box::new(Expr::Int(0)),
                value: Box::new(self.get()),
            },
            _ => self.get(),
        }
    }

    /// Copy this value into `other`, which must have the same type.
    pub fn store_into(&self, other: &AbiValue) -> Result<Expr, AbiError> {
        if self.spec != other.spec {
            return Err(AbiError::TypeMismatch {
                expected: other.spec.clone(),
                found: self.spec.clone(),
            });
        }
        Ok(Expr::store(other.slot, self.get()))
    }

    /// Build this tuple from `components`, one per element, in order.
    ///
    /// Runs of adjacent `bool`s share bytes. Dynamic components are placed
    /// after the head, each located by a two-byte offset from the start of
    /// the encoding.
    pub fn set_tuple(&self, components: &[AbiValue]) -> Result<Expr, AbiError> {
        let TypeSpec::Tuple(elems) = &self.spec else {
            return Err(AbiError::NotATuple(self.spec.clone()));
        };
        if components.len() != elems.len() {
            return Err(AbiError::TupleArity {
                spec: self.spec.clone(),
                expected: elems.len(),
                found: components.len(),
            });
        }
        for (elem, component) in elems.iter().zip(components) {
            if *elem != component.spec {
                return Err(AbiError::TypeMismatch {
                    expected: elem.clone(),
                    found: component.spec.clone(),
                });
            }
        }

        let head_len = head_length(elems)?;
        if head_len > usize::from(u16::MAX) && elems.iter().any(TypeSpec::is_dynamic) {
            return Err(AbiError::TooLarge(self.spec.clone()));
        }

        let mut head = Vec::new();
        let mut tails: Vec<Expr> = Vec::new();
        let mut i = 0;
        while i < components.len() {
            let component = &components[i];
            if component.spec == TypeSpec::Bool {
                let run = bool_run(&elems[i..]);
                let zeroed = Expr::Bytes(Bytes::from_raw(&vec![0u8; run.div_ceil(8)]));
                let packed = components[i..i + run]
                    .iter()
                    .enumerate()
                    .fold(zeroed, |bytes, (bit, b)| Expr::SetBit {
                        target: Box::new(bytes),
                        index: Box::new(Expr::Int(bit as u64)),
                        value: Box::new(b.get()),
                    });
                head.push(packed);
                i += run;
                continue;
            }
            if component.spec.is_dynamic() {
                let offset = tails.iter().fold(Expr::Int(head_len as u64), |acc, tail| {
                    Expr::binary(BinaryOp::Add, acc, Expr::len(tail.clone()))
                });
                head.push(encode_uint16(offset));
                tails.push(component.encode());
            } else {
                head.push(component.encode());
            }
            i += 1;
        }
        head.extend(tails);
        Ok(Expr::store(self.slot, concat_all(head)))
    }

    /// Number of elements of a tuple value.
    pub fn length(&self) -> Result<Expr, AbiError> {
        match &self.spec {
            TypeSpec::Tuple(elems) => Ok(Expr::Int(elems.len() as u64)),
            other => Err(AbiError::NotATuple(other.clone())),
        }
    }

    /// Element `index` of a tuple value.
    pub fn tuple_element(&self, index: usize) -> Result<TupleElement<'_>, AbiError> {
        let TypeSpec::Tuple(elems) = &self.spec else {
            return Err(AbiError::NotATuple(self.spec.clone()));
        };
        if index >= elems.len() {
            return Err(AbiError::IndexOutOfRange {
                index,
                len: elems.len(),
            });
        }
        Ok(TupleElement { tuple: self, index })
    }
}

/// A projection of one element out of a stored tuple.
#[derive(Debug, Clone, Copy)]
pub struct TupleElement<'a> {
    tuple: &'a AbiValue,
    index: usize,
}

impl TupleElement<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn type_spec(&self) -> &TypeSpec {
        match &self.tuple.spec {
            TypeSpec::Tuple(elems) => &elems[self.index],
            other => other,
        }
    }

    /// Extract the element from the tuple's encoding and store it into `output`.
    pub fn store_into(&self, output: &AbiValue) -> Result<Expr, AbiError> {
        let TypeSpec::Tuple(elems) = &self.tuple.spec else {
            return Err(AbiError::NotATuple(self.tuple.spec.clone()));
        };
        let elem = &elems[self.index];
        if *elem != output.spec {
            return Err(AbiError::TypeMismatch {
                expected: elem.clone(),
                found: output.spec.clone(),
            });
        }

        let layout = head_layout(elems)?;
        let encoded = self.tuple.encode();
        match layout[self.index] {
            HeadEntry::Bit(bit) => Ok(Expr::store(
                output.slot,
                Expr::GetBit {
                    source: Box::new(encoded),
                    index: Box::new(Expr::Int(bit as u64)),
                },
            )),
            HeadEntry::Static { offset, length } => {
                let bytes = match (u8::try_from(offset), u8::try_from(length)) {
                    (Ok(start), Ok(length)) if length > 0 => Expr::Extract {
                        source: Box::new(encoded),
                        start,
                        length,
                    },
                    _ => Expr::Extract3 {
                        source: Box::new(encoded),
                        start: Box::new(Expr::Int(offset as u64)),
                        length: Box::new(Expr::Int(length as u64)),
                    },
                };
                Ok(output.decode(bytes))
            }
            HeadEntry::Dynamic { offset } => {
                let start = Expr::ExtractUint16 {
                    source: Box::new(encoded.clone()),
                    offset: Box::new(Expr::Int(offset as u64)),
                };
                let next = layout[self.index + 1..].iter().find_map(|e| match e {
                    HeadEntry::Dynamic { offset } => Some(*offset),
                    _ => None,
                });
                let end = match next {
                    Some(next) => Expr::ExtractUint16 {
                        source: Box::new(encoded.clone()),
                        offset: Box::new(Expr::Int(next as u64)),
                    },
                    None => Expr::len(encoded.clone()),
                };
                Ok(output.decode(Expr::Substring3 {
                    source: Box::new(encoded),
                    start: Box::new(start),
                    end: Box::new(end),
                }))
            }
        }
    }
}

/// Where a tuple element lives in the tuple's head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadEntry {
    /// Bit index of a packed `bool`.
    Bit(usize),
    /// Byte range of a static element.
    Static { offset: usize, length: usize },
    /// Byte offset of the 2-byte pointer to a dynamic element's tail.
    Dynamic { offset: usize },
}

fn head_layout(elems: &[TypeSpec]) -> Result<Vec<HeadEntry>, AbiError> {
    let too_large = || AbiError::TooLarge(TypeSpec::Tuple(elems.to_vec()));
    let mut layout = Vec::with_capacity(elems.len());
    let mut offset: usize = 0;
    let mut i = 0;
    while i < elems.len() {
        let elem = &elems[i];
        let length = if *elem == TypeSpec::Bool {
            let run = bool_run(&elems[i..]);
            let first_bit = offset.checked_mul(8).ok_or_else(too_large)?;
            layout.extend((0..run).map(|b| HeadEntry::Bit(first_bit + b)));
            i += run;
            run.div_ceil(8)
        } else if elem.is_dynamic() {
            layout.push(HeadEntry::Dynamic { offset });
            i += 1;
            2
        } else {
            let length = elem.byte_length_static()?;
            layout.push(HeadEntry::Static { offset, length });
            i += 1;
            length
        };
        offset = offset.checked_add(length).ok_or_else(too_large)?;
    }
    Ok(layout)
}

/// Total head length of a tuple with these elements.
fn head_length(elems: &[TypeSpec]) -> Result<usize, AbiError> {
    let layout = head_layout(elems)?;
    let too_large = || AbiError::TooLarge(TypeSpec::Tuple(elems.to_vec()));
    let end = match layout.last() {
        None => 0,
        Some(HeadEntry::Bit(bit)) => bit / 8 + 1,
        Some(HeadEntry::Static { offset, length }) => {
            offset.checked_add(*length).ok_or_else(too_large)?
        }
        Some(HeadEntry::Dynamic { offset }) => offset.checked_add(2).ok_or_else(too_large)?,
    };
    Ok(end)
}

/// Big-endian two-byte encoding of `n`.
fn encode_uint16(n: Expr) -> Expr {
    Expr::Extract {
        source: Box::new(Expr::itob(n)),
        start: 6,
        length: 2,
    }
}

/// Concatenate `parts` left to right; no parts is the empty byte string.
fn concat_all(parts: Vec<Expr>) -> Expr {
    parts
        .into_iter()
        .reduce(Expr::concat)
        .unwrap_or_else(|| Expr::Bytes(Bytes::from_raw(&[])))
}

/// Log `value` prefixed with [`RETURN_PREFIX`].
pub fn method_return(value: &AbiValue) -> Expr {
    Expr::log(Expr::concat(
        Expr::Bytes(Bytes::from_raw(&RETURN_PREFIX)),
        value.encode(),
    ))
}
