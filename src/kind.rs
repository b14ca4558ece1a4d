//! Canonical kind strings.
//!
//! A surface type expression (`int32[]`, `Foo[4]`, `handle<message_pipe>&`, ...)
//! is encoded into a prefix-coded string that code generators can parse without
//! knowing the surface grammar:
//!
//! ```text
//! kind      := primitive | "a:" kind | "a" INT ":" kind | "r:" kind | "x:" NAME
//! primitive := "b"|"i8"|"i16"|"i32"|"i64"|"u8"|"u16"|"u32"|"u64"|"f"|"d"|"s"
//!            | "h" | "h:d:c" | "h:d:p" | "h:m" | "h:s"
//! ```
//!
//! Nesting reads outer-to-inner, so `a:a10:i32` is an array of fixed-10 arrays
//! of int32.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::error::{Result, TranslateError, UnsupportedReason};

// ------------------------------- Patterns --------------------------------- //

/// A fixed-size array marker anywhere in a surface string.
static FIXED_ARRAY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[0-9]+\]").expect("fixed array marker regex"));

/// Identifier, optionally dot-qualified.
static TYPE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("type name regex")
});

// ------------------------------- Primitives ------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Handle,
    DataPipeConsumer,
    DataPipeProducer,
    MessagePipe,
    SharedBuffer,
}

impl Primitive {
    pub const ALL: [Primitive; 17] = [
        Primitive::Bool,
        Primitive::Int8,
        Primitive::Int16,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::Uint8,
        Primitive::Uint16,
        Primitive::Uint32,
        Primitive::Uint64,
        Primitive::Float,
        Primitive::Double,
        Primitive::String,
        Primitive::Handle,
        Primitive::DataPipeConsumer,
        Primitive::DataPipeProducer,
        Primitive::MessagePipe,
        Primitive::SharedBuffer,
    ];

    /// Spelling in the IDL source.
    pub fn surface(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int8 => "int8",
            Primitive::Int16 => "int16",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::Uint8 => "uint8",
            Primitive::Uint16 => "uint16",
            Primitive::Uint32 => "uint32",
            Primitive::Uint64 => "uint64",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::String => "string",
            Primitive::Handle => "handle",
            Primitive::DataPipeConsumer => "handle<data_pipe_consumer>",
            Primitive::DataPipeProducer => "handle<data_pipe_producer>",
            Primitive::MessagePipe => "handle<message_pipe>",
            Primitive::SharedBuffer => "handle<shared_buffer>",
        }
    }

    /// Canonical code.
    pub fn code(self) -> &'static str {
        match self {
            Primitive::Bool => "b",
            Primitive::Int8 => "i8",
            Primitive::Int16 => "i16",
            Primitive::Int32 => "i32",
            Primitive::Int64 => "i64",
            Primitive::Uint8 => "u8",
            Primitive::Uint16 => "u16",
            Primitive::Uint32 => "u32",
            Primitive::Uint64 => "u64",
            Primitive::Float => "f",
            Primitive::Double => "d",
            Primitive::String => "s",
            Primitive::Handle => "h",
            Primitive::DataPipeConsumer => "h:d:c",
            Primitive::DataPipeProducer => "h:d:p",
            Primitive::MessagePipe => "h:m",
            Primitive::SharedBuffer => "h:s",
        }
    }

    pub fn from_surface(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.surface() == name)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }
}

// --------------------------------- Kind ----------------------------------- //

/// A type, as carried in the IR. `Display` renders the canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Primitive(Primitive),
    /// Variable-length array.
    Array(Box<Kind>),
    FixedArray { len: u32, elem: Box<Kind> },
    Reference(Box<Kind>),
    /// User-defined (named) type.
    User(String),
}

/// Most wrappers (`[]`, `[N]`, `&`) a single kind may stack.
pub const MAX_NESTING: usize = 64;

impl Kind {
    /// Surface syntax equivalent to this kind.
    pub fn surface(&self) -> String {
        let mut suffixes = Vec::new();
        let mut kind = self;
        let mut out = loop {
            match kind {
                Kind::Primitive(p) => break p.surface().to_string(),
                Kind::User(name) => break name.clone(),
                Kind::Array(elem) => {
                    suffixes.push("[]".to_string());
                    kind = &**elem;
                }
                Kind::FixedArray { len, elem } => {
                    suffixes.push(format!("[{len}]"));
                    kind = &**elem;
                }
                Kind::Reference(inner) => {
                    suffixes.push("&".to_string());
                    kind = &**inner;
                }
            }
        };
        // innermost wrapper is written first
        for suffix in suffixes.iter().rev() {
            out.push_str(suffix);
        }
        out
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kind = self;
        loop {
            match kind {
                Kind::Primitive(p) => return f.write_str(p.code()),
                Kind::User(name) => return write!(f, "x:{name}"),
                Kind::Array(elem) => {
                    f.write_str("a:")?;
                    kind = &**elem;
                }
                Kind::FixedArray { len, elem } => {
                    write!(f, "a{len}:")?;
                    kind = &**elem;
                }
                Kind::Reference(inner) => {
                    f.write_str("r:")?;
                    kind = &**inner;
                }
            }
        }
    }
}

// ------------------------------- Encoding --------------------------------- //

/// Encode a surface type expression. Suffixes are peeled longest-first:
/// `[]`, then `[N]`, then `&`, before the remaining name is resolved.
///
/// Besides the two nested-array shapes, this also rejects unbalanced
/// brackets, zero or non-decimal lengths, names that are not (dotted)
/// identifiers such as `handle<bogus>`, and more than [`MAX_NESTING`] wrappers.
pub fn encode(type_syntax: &str) -> Result<Kind> {
    encode_part(type_syntax, type_syntax, 0)
}

/// Shorthand for `encode(..)?.to_string()`.
pub fn encode_str(type_syntax: &str) -> Result<String> {
    encode(type_syntax).map(|kind| kind.to_string())
}

fn encode_part(whole: &str, part: &str, depth: usize) -> Result<Kind> {
    let fail = |reason| TranslateError::unsupported(whole, reason);

    if depth > MAX_NESTING {
        return Err(fail(UnsupportedReason::TooDeep));
    }
    if part.is_empty() {
        return Err(fail(UnsupportedReason::EmptyName));
    }

    if let Some(typename) = part.strip_suffix("[]") {
        if FIXED_ARRAY_MARKER.is_match(typename) {
            return Err(fail(UnsupportedReason::ArrayOfFixedArray));
        }
        return Ok(Kind::Array(Box::new(encode_part(whole, typename, depth + 1)?)));
    }

    if let Some(head) = part.strip_suffix(']') {
        let lbracket = head
            .rfind('[')
            .ok_or_else(|| fail(UnsupportedReason::UnbalancedBrackets))?;
        let typename = &head[..lbracket];
        if typename.contains('[') {
            return Err(fail(UnsupportedReason::FixedArrayOfArray));
        }
        let len = parse_fixed_len(&head[lbracket + 1..])
            .ok_or_else(|| fail(UnsupportedReason::BadFixedLength))?;
        let elem = encode_part(whole, typename, depth + 1)?;
        return Ok(Kind::FixedArray { len, elem: Box::new(elem) });
    }

    if let Some(inner) = part.strip_suffix('&') {
        return Ok(Kind::Reference(Box::new(encode_part(whole, inner, depth + 1)?)));
    }

    if let Some(primitive) = Primitive::from_surface(part) {
        return Ok(Kind::Primitive(primitive));
    }

    if !TYPE_NAME.is_match(part) {
        return Err(fail(UnsupportedReason::InvalidName));
    }
    Ok(Kind::User(part.to_string()))
}

/// Positive decimal length; leading zeros are accepted and normalized away.
fn parse_fixed_len(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|len| *len > 0)
}

// ------------------------------- Decoding --------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KindParseError {
    #[error("empty kind")]
    Empty,
    #[error("unknown kind `{0}`")]
    Unknown(String),
    #[error("bad fixed-size array length in `{0}`")]
    BadFixedLength(String),
    #[error("invalid type name `{0}`")]
    InvalidName(String),
    #[error("kind nested deeper than {} levels", MAX_NESTING)]
    TooDeep,
}

impl FromStr for Kind {
    type Err = KindParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        decode(s, 0)
    }
}

fn decode(s: &str, depth: usize) -> std::result::Result<Kind, KindParseError> {
    if depth > MAX_NESTING {
        return Err(KindParseError::TooDeep);
    }
    if s.is_empty() {
        return Err(KindParseError::Empty);
    }
    if let Some(rest) = s.strip_prefix("a:") {
        return Ok(Kind::Array(Box::new(decode(rest, depth + 1)?)));
    }
    if let Some(rest) = s.strip_prefix("r:") {
        return Ok(Kind::Reference(Box::new(decode(rest, depth + 1)?)));
    }
    if let Some(name) = s.strip_prefix("x:") {
        if !TYPE_NAME.is_match(name) {
            return Err(KindParseError::InvalidName(name.to_string()));
        }
        return Ok(Kind::User(name.to_string()));
    }
    if let Some(rest) = s.strip_prefix('a') {
        let (digits, elem) = rest
            .split_once(':')
            .ok_or_else(|| KindParseError::Unknown(s.to_string()))?;
        let len = parse_fixed_len(digits)
            .ok_or_else(|| KindParseError::BadFixedLength(s.to_string()))?;
        return Ok(Kind::FixedArray { len, elem: Box::new(decode(elem, depth + 1)?) });
    }
    Primitive::from_code(s)
        .map(Kind::Primitive)
        .ok_or_else(|| KindParseError::Unknown(s.to_string()))
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Kind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn enc(s: &str) -> String {
        encode_str(s).unwrap()
    }

    fn reason_of(s: &str) -> UnsupportedReason {
        match encode(s) {
            Err(TranslateError::UnsupportedType { reason, .. }) => reason,
            other => panic!("expected UnsupportedType for `{s}`, got {other:?}"),
        }
    }

    #[test]
    fn primitives_map_to_documented_codes() {
        let table = [
            ("bool", "b"),
            ("int8", "i8"),
            ("int16", "i16"),
            ("int32", "i32"),
            ("int64", "i64"),
            ("uint8", "u8"),
            ("uint16", "u16"),
            ("uint32", "u32"),
            ("uint64", "u64"),
            ("float", "f"),
            ("double", "d"),
            ("string", "s"),
            ("handle", "h"),
            ("handle<data_pipe_consumer>", "h:d:c"),
            ("handle<data_pipe_producer>", "h:d:p"),
            ("handle<message_pipe>", "h:m"),
            ("handle<shared_buffer>", "h:s"),
        ];
        for (surface, code) in table {
            assert_eq!(enc(surface), code, "{surface}");
        }
        assert_eq!(table.len(), Primitive::ALL.len());
    }

    #[test]
    fn primitive_codes_are_injective() {
        let codes: HashSet<_> = Primitive::ALL.iter().map(|p| p.code()).collect();
        assert_eq!(codes.len(), Primitive::ALL.len());
        let surfaces: HashSet<_> = Primitive::ALL.iter().map(|p| p.surface()).collect();
        assert_eq!(surfaces.len(), Primitive::ALL.len());
    }

    #[test]
    fn composite_kinds() {
        assert_eq!(enc("int32[]"), "a:i32");
        assert_eq!(enc("int32[10]"), "a10:i32");
        assert_eq!(enc("int32&"), "r:i32");
        assert_eq!(enc("Foo"), "x:Foo");
        assert_eq!(enc("int32[][]"), "a:a:i32");
        assert_eq!(enc("Foo&[]"), "a:r:x:Foo");
        assert_eq!(enc("string[]&"), "r:a:s");
        assert_eq!(enc("int8[16]&"), "r:a16:i8");
        assert_eq!(enc("handle<message_pipe>&[4]"), "a4:r:h:m");
        assert_eq!(enc("sample.ns.Point[]"), "a:x:sample.ns.Point");
    }

    #[test]
    fn nested_fixed_arrays_are_rejected() {
        assert_eq!(reason_of("int32[][10]"), UnsupportedReason::FixedArrayOfArray);
        assert_eq!(reason_of("int32[10][]"), UnsupportedReason::ArrayOfFixedArray);
        assert_eq!(reason_of("int32[5][10]"), UnsupportedReason::FixedArrayOfArray);
        // the marker anywhere below a `[]` counts
        assert_eq!(reason_of("int32[5]&[]"), UnsupportedReason::ArrayOfFixedArray);
    }

    #[test]
    fn malformed_surface_strings() {
        assert_eq!(reason_of(""), UnsupportedReason::EmptyName);
        assert_eq!(reason_of("[]"), UnsupportedReason::EmptyName);
        assert_eq!(reason_of("&"), UnsupportedReason::EmptyName);
        assert_eq!(reason_of("int32]"), UnsupportedReason::UnbalancedBrackets);
        assert_eq!(reason_of("int32[0]"), UnsupportedReason::BadFixedLength);
        assert_eq!(reason_of("int32[n]"), UnsupportedReason::BadFixedLength);
        assert_eq!(reason_of("int32[-1]"), UnsupportedReason::BadFixedLength);
        assert_eq!(reason_of("int32[99999999999]"), UnsupportedReason::BadFixedLength);
        assert_eq!(reason_of("handle<bogus>"), UnsupportedReason::InvalidName);
        assert_eq!(reason_of("Foo Bar"), UnsupportedReason::InvalidName);
    }

    #[test]
    fn error_reports_whole_type_expression() {
        let err = encode("Foo[3][]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported type `Foo[3][]`: array of fixed-size array unsupported"
        );
    }

    #[test]
    fn fixed_length_is_normalized() {
        assert_eq!(enc("uint8[007]"), "a7:u8");
    }

    #[test]
    fn primitive_spelling_wins_over_user_type() {
        assert_eq!(enc("bool"), "b");
        assert_eq!(enc("Bool"), "x:Bool");
    }

    #[test]
    fn encoding_is_deterministic() {
        for s in ["int32[]", "Foo&", "handle<shared_buffer>[3]", "x.Y[]&"] {
            assert_eq!(encode(s).unwrap(), encode(s).unwrap());
        }
    }

    #[test]
    fn decode_accepts_encoder_output() {
        for s in ["int32[]", "Foo&[]", "handle<data_pipe_producer>[2]", "a.B&", "double"] {
            let kind = encode(s).unwrap();
            let decoded: Kind = kind.to_string().parse().unwrap();
            assert_eq!(decoded, kind);
            assert_eq!(decoded.surface(), s);
        }
    }

    #[test]
    fn decode_rejects_malformed_kinds() {
        assert_eq!("".parse::<Kind>(), Err(KindParseError::Empty));
        assert_eq!("q".parse::<Kind>(), Err(KindParseError::Unknown("q".into())));
        assert_eq!("a:".parse::<Kind>(), Err(KindParseError::Empty));
        assert_eq!(
            "a0:i32".parse::<Kind>(),
            Err(KindParseError::BadFixedLength("a0:i32".into()))
        );
        assert_eq!("ai32".parse::<Kind>(), Err(KindParseError::Unknown("ai32".into())));
        assert_eq!(
            "x:not a name".parse::<Kind>(),
            Err(KindParseError::InvalidName("not a name".into()))
        );
        assert_eq!("h:x".parse::<Kind>(), Err(KindParseError::Unknown("h:x".into())));
    }

    #[test]
    fn kind_serializes_as_canonical_string() {
        let kind = encode("Foo[2]").unwrap();
        let v = serde_json::to_value(&kind).unwrap();
        assert_eq!(v, serde_json::json!("a2:x:Foo"));
        let back: Kind = serde_json::from_value(v).unwrap();
        assert_eq!(back, kind);
        assert!(serde_json::from_value::<Kind>(serde_json::json!("zz")).is_err());
    }

    #[test]
    fn nesting_is_capped() {
        let at_limit = format!("int32{}", "&".repeat(MAX_NESTING));
        let kind = encode(&at_limit).unwrap();
        assert_eq!(kind.surface(), at_limit);
        assert_eq!(kind.to_string().parse::<Kind>().unwrap(), kind);

        let over = format!("int32{}", "&".repeat(MAX_NESTING + 1));
        assert_eq!(reason_of(&over), UnsupportedReason::TooDeep);
        assert_eq!(
            format!("{}i32", "r:".repeat(MAX_NESTING + 1)).parse::<Kind>(),
            Err(KindParseError::TooDeep)
        );
    }

    #[test]
    fn very_deep_types_fail_on_a_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let surface = format!("int32{}", "&".repeat(100_000));
                let kind = format!("{}i32", "a:".repeat(100_000));
                (encode(&surface).map(|_| ()), kind.parse::<Kind>().map(|_| ()))
            })
            .unwrap();
        let (encoded, decoded) = handle.join().unwrap();
        assert!(matches!(
            encoded,
            Err(TranslateError::UnsupportedType { reason: UnsupportedReason::TooDeep, .. })
        ));
        assert_eq!(decoded, Err(KindParseError::TooDeep));
    }
}
