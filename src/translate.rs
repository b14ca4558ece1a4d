//! Syntax tree → IR.
//!
//! Mapping is strictly bottom-up: the document builder dispatches each
//! definition to a container mapper (struct, interface), which collects its
//! members through the leaf mappers (field, parameter, enum value, constant).
//! Every kind goes through [`crate::kind::encode`]; every attribute list goes
//! through [`crate::attributes::normalize`]. The first error aborts the file.

use serde_json::Value;
use tracing::{debug, trace};

use crate::ast::{self, Definition, InterfaceMember, Ordinal, StructMember};
use crate::attributes::{self, CLIENT_KEY};
use crate::config::TranslateOptions;
use crate::error::{OrdinalItem, Result, TranslateError};
use crate::ir::{self, Attributes};
use crate::kind;

// ------------------------------- Front API -------------------------------- //

/// Translate one parsed file with default options.
pub fn translate(tree: &ast::Mojom, name: &str) -> Result<ir::Document> {
    Translator::default().translate(tree, name)
}

/// Read a JSON-encoded tree and translate it with default options.
pub fn translate_json(src: &str, name: &str) -> Result<ir::Document> {
    Translator::default().translate_json(src, name)
}

#[derive(Debug, Clone, Default)]
pub struct Translator {
    options: TranslateOptions,
}

impl Translator {
    pub fn new(options: TranslateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TranslateOptions {
        &self.options
    }

    pub fn translate_json(&self, src: &str, name: &str) -> Result<ir::Document> {
        let tree: ast::Mojom = crate::path_de::from_str_with_path(src)?;
        self.translate(&tree, name)
    }

    pub fn translate_value(&self, value: serde_json::Value, name: &str) -> Result<ir::Document> {
        let tree: ast::Mojom = crate::path_de::from_value_with_path(value)?;
        self.translate(&tree, name)
    }

    /// Build the IR document for `tree`, recording `name` as its logical name.
    pub fn translate(&self, tree: &ast::Mojom, name: &str) -> Result<ir::Document> {
        debug!(
            file = name,
            imports = tree.import_list.len(),
            definitions = tree.definition_list.len(),
            "translating file"
        );

        let (namespace, attributes) = match &tree.module {
            Some(module) => (module.name.clone(), self.attributes(module.attribute_list.as_ref())?),
            None => (String::new(), Attributes::new()),
        };

        let mut doc = ir::Document {
            name: name.to_string(),
            namespace,
            imports: tree
                .import_list
                .iter()
                .map(|import| ir::Import { filename: import.import_filename.clone() })
                .collect(),
            attributes,
            structs: Vec::new(),
            interfaces: Vec::new(),
            enums: Vec::new(),
            constants: Vec::new(),
        };

        for definition in &tree.definition_list {
            match definition {
                Definition::Struct(s) => doc.structs.push(self.map_struct(s)?),
                Definition::Interface(i) => doc.interfaces.push(self.map_interface(i)?),
                Definition::Enum(e) => doc.enums.push(map_enum(e)),
                Definition::Const(c) => doc.constants.push(map_constant(c)?),
            }
        }

        debug!(
            file = name,
            structs = doc.structs.len(),
            interfaces = doc.interfaces.len(),
            enums = doc.enums.len(),
            constants = doc.constants.len(),
            "translated file"
        );
        Ok(doc)
    }

    fn attributes(&self, list: Option<&ast::AttributeList>) -> Result<Attributes> {
        attributes::normalize(list, self.options.duplicate_attributes)
    }

    // -------------------------- Containers ------------------------------- //

    fn map_struct(&self, node: &ast::Struct) -> Result<ir::Struct> {
        trace!(ident = %node.name, "struct");
        let mut out = ir::Struct {
            name: node.name.clone(),
            attributes: self.attributes(node.attribute_list.as_ref())?,
            fields: Vec::new(),
            enums: Vec::new(),
            constants: Vec::new(),
        };
        for member in &node.body {
            match member {
                StructMember::Field(f) => out.fields.push(map_field(f)?),
                StructMember::Enum(e) => out.enums.push(map_enum(e)),
                StructMember::Const(c) => out.constants.push(map_constant(c)?),
            }
        }
        Ok(out)
    }

    fn map_interface(&self, node: &ast::Interface) -> Result<ir::Interface> {
        trace!(ident = %node.name, "interface");
        let attributes = self.attributes(node.attribute_list.as_ref())?;
        let mut out = ir::Interface {
            name: node.name.clone(),
            client: attributes.get(CLIENT_KEY).cloned(),
            attributes,
            methods: Vec::new(),
            enums: Vec::new(),
            constants: Vec::new(),
        };
        for member in &node.body {
            match member {
                InterfaceMember::Method(m) => out.methods.push(map_method(m)?),
                InterfaceMember::Enum(e) => out.enums.push(map_enum(e)),
                InterfaceMember::Const(c) => out.constants.push(map_constant(c)?),
            }
        }
        Ok(out)
    }
}

// ------------------------------ Mid-level --------------------------------- //

fn map_method(node: &ast::Method) -> Result<ir::Method> {
    let ordinal = explicit_ordinal(node.ordinal.as_ref(), OrdinalItem::Method, &node.name)?;
    let parameters = map_parameters(&node.parameter_list)?;
    let response_parameters = node
        .response_parameter_list
        .as_deref()
        .map(map_parameters)
        .transpose()?;
    Ok(ir::Method { name: node.name.clone(), parameters, ordinal, response_parameters })
}

fn map_parameters(list: &[ast::Parameter]) -> Result<Vec<ir::Parameter>> {
    list.iter().map(map_parameter).collect()
}

fn map_enum(node: &ast::Enum) -> ir::Enum {
    ir::Enum {
        name: node.name.clone(),
        fields: node.enum_value_list.iter().map(map_enum_value).collect(),
    }
}

// --------------------------------- Leaves --------------------------------- //

fn map_field(node: &ast::Field) -> Result<ir::Field> {
    Ok(ir::Field {
        name: node.name.clone(),
        kind: kind::encode(&node.typename)?,
        ordinal: explicit_ordinal(node.ordinal.as_ref(), OrdinalItem::Field, &node.name)?,
        default: node.default.clone(),
    })
}

fn map_parameter(node: &ast::Parameter) -> Result<ir::Parameter> {
    Ok(ir::Parameter {
        name: node.name.clone(),
        kind: kind::encode(&node.typename)?,
        ordinal: explicit_ordinal(node.ordinal.as_ref(), OrdinalItem::Parameter, &node.name)?,
    })
}

fn map_enum_value(node: &ast::EnumValue) -> ir::EnumField {
    ir::EnumField { name: node.name.clone(), value: node.value.clone() }
}

fn map_constant(node: &ast::Const) -> Result<ir::Constant> {
    Ok(ir::Constant {
        name: node.name.clone(),
        kind: kind::encode(&node.typename)?,
        value: node.value.clone(),
    })
}

fn out_of_range(value: impl std::fmt::Display) -> String {
    format!("{value} is outside 0..={}", u32::MAX)
}

/// Ordinals are authored, never inferred, and must fit the wire's `u32`.
fn explicit_ordinal(ordinal: Option<&Ordinal>, item: OrdinalItem, name: &str) -> Result<u32> {
    let malformed = |reason: String| TranslateError::MalformedOrdinal {
        item,
        name: name.to_string(),
        reason,
    };
    match ordinal {
        None => Err(malformed("missing explicit ordinal".to_string())),
        Some(Ordinal::Explicit { value }) => {
            u32::try_from(*value).map_err(|_| malformed(out_of_range(value)))
        }
        Some(Ordinal::Malformed(raw)) => Err(malformed(match raw.get("value") {
            Some(Value::Number(n)) if n.is_u64() || n.is_i64() => out_of_range(n),
            Some(Value::Number(n)) => format!("{n} is not an integer"),
            Some(other) => format!("expected an integer, got {other}"),
            None => format!("expected {{\"value\": <integer>}}, got {raw}"),
        })),
    }
}

// ------------------------------- Tests ------------------------------------ //
