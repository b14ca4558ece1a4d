//! Typed syntax tree handed over by the parser.
//!
//! Tagged nodes (`STRUCT`, `FIELD`, `METHOD`, ...) are closed enums keyed on a
//! `"tag"` member when read from JSON. Every node carries its required members
//! by name; optional members are `Option`s.

use std::fmt;
use std::marker::PhantomData;

use serde::de::value::{MapAccessDeserializer, StringDeserializer};
use serde::de::{self, DeserializeSeed, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Root of one parsed file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mojom {
    #[serde(default)]
    pub module: Option<Module>,
    pub import_list: Vec<Import>,
    pub definition_list: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Dotted namespace, e.g. `sample.ns`.
    pub name: String,
    #[serde(default)]
    pub attribute_list: Option<AttributeList>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub import_filename: String,
}

/// Ordered `key = value` pairs, as written.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeList(pub Vec<Attribute>);

impl AttributeList {
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a AttributeList {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: Literal,
}

/// Explicit ordinal (`@3`). Anything that is not `{"value": <i64>}` is kept
/// verbatim so the translator reports it as a malformed ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ordinal {
    Explicit { value: i64 },
    Malformed(serde_json::Value),
}

// ------------------------------ Definitions ------------------------------- //

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tag", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Definition {
    Struct(Struct),
    Interface(Interface),
    Enum(Enum),
    Const(Const),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    #[serde(default)]
    pub attribute_list: Option<AttributeList>,
    pub body: Vec<StructMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tag", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StructMember {
    Field(Field),
    Enum(Enum),
    Const(Const),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default)]
    pub attribute_list: Option<AttributeList>,
    pub body: Vec<InterfaceMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tag", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterfaceMember {
    Method(Method),
    Enum(Enum),
    Const(Const),
}

// -------------------------------- Members --------------------------------- //

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub typename: String,
    pub name: String,
    #[serde(default)]
    pub ordinal: Option<Ordinal>,
    #[serde(default)]
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub parameter_list: Vec<Parameter>,
    #[serde(default)]
    pub ordinal: Option<Ordinal>,
    /// `None` when the method declares no response; `Some(vec![])` for `=> ()`.
    #[serde(default)]
    pub response_parameter_list: Option<Vec<Parameter>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub typename: String,
    pub name: String,
    #[serde(default)]
    pub ordinal: Option<Ordinal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub enum_value_list: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Const {
    pub typename: String,
    pub name: String,
    pub value: Expr,
}

// -------------------------------- Values ---------------------------------- //

/// Scalar literal, as used for attribute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.to_string())
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

/// A default or constant value. Never evaluated here, only carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expr {
    Literal(Literal),
    /// Reference to a named constant or enum value.
    Identifier { identifier: String },
    /// Unevaluated token sequence.
    Expression(Vec<String>),
}

// ------------------------------ Tag dispatch ------------------------------ //

const TAG: &str = "tag";

/// A node whose variant is named by its `"tag"` member. The variant body is
/// read straight off the live map so error paths reach into it.
trait Tagged: Sized {
    const EXPECTING: &'static str;
    const TAGS: &'static [&'static str];

    fn from_body<'de, A: MapAccess<'de>>(tag: &str, body: A) -> Result<Self, A::Error>;
}

fn body<'de, T: Deserialize<'de>, A: MapAccess<'de>>(body: A) -> Result<T, A::Error> {
    T::deserialize(MapAccessDeserializer::new(body))
}

impl Tagged for Definition {
    const EXPECTING: &'static str = "a definition node";
    const TAGS: &'static [&'static str] = &["STRUCT", "INTERFACE", "ENUM", "CONST"];

    fn from_body<'de, A: MapAccess<'de>>(tag: &str, map: A) -> Result<Self, A::Error> {
        match tag {
            "STRUCT" => body(map).map(Definition::Struct),
            "INTERFACE" => body(map).map(Definition::Interface),
            "ENUM" => body(map).map(Definition::Enum),
            "CONST" => body(map).map(Definition::Const),
            other => Err(de::Error::unknown_variant(other, Self::TAGS)),
        }
    }
}

impl Tagged for StructMember {
    const EXPECTING: &'static str = "a struct member node";
    const TAGS: &'static [&'static str] = &["FIELD", "ENUM", "CONST"];

    fn from_body<'de, A: MapAccess<'de>>(tag: &str, map: A) -> Result<Self, A::Error> {
        match tag {
            "FIELD" => body(map).map(StructMember::Field),
            "ENUM" => body(map).map(StructMember::Enum),
            "CONST" => body(map).map(StructMember::Const),
            other => Err(de::Error::unknown_variant(other, Self::TAGS)),
        }
    }
}

impl Tagged for InterfaceMember {
    const EXPECTING: &'static str = "an interface member node";
    const TAGS: &'static [&'static str] = &["METHOD", "ENUM", "CONST"];

    fn from_body<'de, A: MapAccess<'de>>(tag: &str, map: A) -> Result<Self, A::Error> {
        match tag {
            "METHOD" => body(map).map(InterfaceMember::Method),
            "ENUM" => body(map).map(InterfaceMember::Enum),
            "CONST" => body(map).map(InterfaceMember::Const),
            other => Err(de::Error::unknown_variant(other, Self::TAGS)),
        }
    }
}

macro_rules! deserialize_tagged {
    ($($ty:ty),*) => {$(
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_map(TaggedVisitor(PhantomData))
            }
        }
    )*};
}

deserialize_tagged!(Definition, StructMember, InterfaceMember);

struct TaggedVisitor<T>(PhantomData<T>);

impl<'de, T: Tagged> Visitor<'de> for TaggedVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(T::EXPECTING)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<T, A::Error> {
        // members seen before the tag are buffered and replayed ahead of the rest
        let mut before = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == TAG {
                let tag: String = map.next_value()?;
                let body = Replay { buffered: before.into_iter(), pending: None, live: map };
                return T::from_body(&tag, body);
            }
            before.push((key, map.next_value::<serde_json::Value>()?));
        }
        Err(de::Error::missing_field(TAG))
    }
}

struct Replay<I, A> {
    buffered: I,
    pending: Option<serde_json::Value>,
    live: A,
}

impl<'de, I, A> MapAccess<'de> for Replay<I, A>
where
    I: Iterator<Item = (String, serde_json::Value)>,
    A: MapAccess<'de>,
{
    type Error = A::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, A::Error> {
        match self.buffered.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(StringDeserializer::<A::Error>::new(key)).map(Some)
            }
            None => self.live.next_key_seed(seed),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, A::Error> {
        match self.pending.take() {
            Some(value) => seed.deserialize(value).map_err(de::Error::custom),
            None => self.live.next_value_seed(seed),
        }
    }
}
