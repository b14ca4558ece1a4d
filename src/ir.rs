// IR handed to code generators. Member names and nesting are the wire
// contract; field declaration order is the emitted key order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use crate::ast::{Expr, Literal};
use crate::kind::Kind;

/// Attribute key → value, in source order.
pub type Attributes = IndexMap<String, Literal>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub namespace: String,
    pub imports: Vec<Import>,
    pub attributes: Attributes,
    pub structs: Vec<Struct>,
    pub interfaces: Vec<Interface>,
    pub enums: Vec<Enum>,
    pub constants: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    pub attributes: Attributes,
    pub fields: Vec<Field>,     // source order, not ordinal order
    pub enums: Vec<Enum>,
    pub constants: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub attributes: Attributes,
    pub client: Option<Literal>, // copy of attributes["Client"]
    pub methods: Vec<Method>,
    pub enums: Vec<Enum>,
    pub constants: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: Kind,
    pub ordinal: u32,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub ordinal: u32,
    /// The key's presence, not its length, says whether a response exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_parameters: Option<Vec<Parameter>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: Kind,
    pub ordinal: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub fields: Vec<EnumField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumField {
    pub name: String,
    pub value: Option<Expr>, // None: assigned by a later stage
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub kind: Kind,
    pub value: Expr,
}
