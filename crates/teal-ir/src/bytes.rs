//! Byte-string literals.
//!
//! A literal records the base its text was written in and is validated when
//! constructed, so assembly never has to reject a literal it was handed.

use base64::Engine;

use crate::error::IrError;

/// The textual encoding of a byte literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteBase {
    Base16,
    Base32,
    Base64,
    /// A plain string, emitted as a quoted TEAL string.
    Utf8,
}

impl ByteBase {
    fn parse(base: &str) -> Result<Self, IrError> {
        match base {
            "base16" => Ok(ByteBase::Base16),
            "base32" => Ok(ByteBase::Base32),
            "base64" => Ok(ByteBase::Base64),
            other => Err(IrError::InvalidBase(other.to_string())),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ByteBase::Base16 => "base16",
            ByteBase::Base32 => "base32",
            ByteBase::Base64 => "base64",
            ByteBase::Utf8 => "utf8",
        }
    }
}

/// A validated byte literal, or a template placeholder substituted at deploy time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bytes {
    base: ByteBase,
    text: String,
    template: bool,
}

impl Bytes {
    /// Build a literal from text encoded in `base` (`base16`, `base32`, or `base64`).
    ///
    /// A `0x` prefix on base16 text is accepted and dropped.
    pub fn new(base: &str, text: &str) -> Result<Bytes, IrError> {
        let base = ByteBase::parse(base)?;
        let text = match base {
            ByteBase::Base16 => text.strip_prefix("0x").unwrap_or(text),
            _ => text,
        };
        let valid = match base {
            ByteBase::Base16 => valid_base16(text),
            ByteBase::Base32 => valid_base32(text),
            ByteBase::Base64 => valid_base64(text),
            ByteBase::Utf8 => true,
        };
        if !valid {
            return Err(IrError::InvalidBytes {
                base: base.name(),
                text: text.to_string(),
            });
        }
        Ok(Bytes {
            base,
            text: text.to_string(),
            template: false,
        })
    }

    /// A plain string literal.
    pub fn utf8(text: impl Into<String>) -> Bytes {
        Bytes {
            base: ByteBase::Utf8,
            text: text.into(),
            template: false,
        }
    }

    /// A literal from raw bytes, written as base16.
    pub fn from_raw(bytes: &[u8]) -> Bytes {
        Bytes {
            base: ByteBase::Base16,
            text: hex::encode(bytes),
            template: false,
        }
    }

    /// A template variable in the given base, e.g. `TMPL_RECEIVER`.
    pub fn template(base: &str, name: &str) -> Result<Bytes, IrError> {
        let base = ByteBase::parse(base)?;
        if !name.starts_with("TMPL_") {
            return Err(IrError::InvalidTemplate(name.to_string()));
        }
        Ok(Bytes {
            base,
            text: name.to_string(),
            template: true,
        })
    }

    pub fn base(&self) -> ByteBase {
        self.base
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_template(&self) -> bool {
        self.template
    }

    /// The operand of the `byte` instruction for this literal.
    pub fn teal_operand(&self) -> String {
        if self.template {
            return self.text.clone();
        }
        match self.base {
            ByteBase::Base16 => format!("0x{}", self.text),
            ByteBase::Base32 => format!("base32({})", self.text),
            ByteBase::Base64 => format!("base64({})", self.text),
            ByteBase::Utf8 => format!("\"{}\"", escape_string(&self.text)),
        }
    }
}

fn valid_base16(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_hexdigit())
}

fn valid_base32(text: &str) -> bool {
    let body = text.trim_end_matches('=');
    let padding = text.len() - body.len();
    if !body.chars().all(|c| matches!(c, 'A'..='Z' | '2'..='7')) {
        return false;
    }
    let tail = body.len() % 8;
    if !matches!(tail, 0 | 2 | 4 | 5 | 7) {
        return false;
    }
    if padding == 0 {
        return true;
    }
    // Padding must complete the final quantum exactly.
    tail != 0 && text.len() % 8 == 0
}

fn valid_base64(text: &str) -> bool {
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .is_ok()
}

fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base16_strips_prefix() {
        let b = Bytes::new("base16", "0xA21212EF").unwrap();
        assert_eq!(b.text(), "A21212EF");
        assert_eq!(b.teal_operand(), "0xA21212EF");
    }

    #[test]
    fn base16_rejects_non_hex() {
        let err = Bytes::new("base16", "0xZZ").unwrap_err();
        assert_eq!(
            err,
            IrError::InvalidBytes {
                base: "base16",
                text: "ZZ".into()
            }
        );
    }

    #[test]
    fn base32_padding_rules() {
        assert!(Bytes::new("base32", "7Z5PWRLXY3XAJJIOHOZCQCNCUHXSHF3Q").is_ok());
        assert!(Bytes::new("base32", "MFRGG===").is_ok());
        assert!(Bytes::new("base32", "MFRGG").is_ok());
        assert!(Bytes::new("base32", "MFRGG==").is_err());
        assert!(Bytes::new("base32", "MFR").is_err());
        assert!(Bytes::new("base32", "mfrgg").is_err());
    }

    #[test]
    fn base64_uses_standard_alphabet() {
        let b = Bytes::new("base64", "aGVsbG8=").unwrap();
        assert_eq!(b.teal_operand(), "base64(aGVsbG8=)");
        assert!(Bytes::new("base64", "aGVsbG8").is_err());
    }

    #[test]
    fn unknown_base_is_rejected() {
        assert_eq!(
            Bytes::new("base58", "abc").unwrap_err(),
            IrError::InvalidBase("base58".into())
        );
    }

    #[test]
    fn template_requires_prefix() {
        let t = Bytes::template("base32", "TMPL_RECEIVER").unwrap();
        assert!(t.is_template());
        assert_eq!(t.teal_operand(), "TMPL_RECEIVER");
        assert!(Bytes::template("base32", "RECEIVER").is_err());
    }

    #[test]
    fn utf8_is_quoted_and_escaped() {
        assert_eq!(Bytes::utf8("say \"hi\"").teal_operand(), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn raw_bytes_render_as_hex() {
        assert_eq!(Bytes::from_raw(&[0x15, 0x1f, 0x7c, 0x75]).teal_operand(), "0x151f7c75");
        assert_eq!(Bytes::from_raw(&[0x00, 0xab]).text(), "00ab");
        assert_eq!(Bytes::from_raw(&[]).teal_operand(), "0x");
    }
}
