//! Serializable factory entries, one per named type.
//!
//! A factory holds everything needed to construct the runtime type without
//! re-running assembly. Types refer to each other by name only.

use loomql_config::ConfigMap;
use loomql_core::{EncodedType, Result, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolver::ResolverRef;
use crate::types::{Argument, EnumType, Field, InterfaceType, NamedType, ObjectType, ScalarType, UnionType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentFactory {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: EncodedType,
    /// Constructor form of the type, e.g. `nonNull(ID())`
    pub constructor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl ArgumentFactory {
    pub fn encode(argument: &Argument) -> Result<Self> {
        let type_ref = argument.encoded_type()?;
        Ok(Self {
            name: argument.name().to_string(),
            constructor: type_ref.encode(),
            type_ref,
            description: argument.description().map(str::to_string),
            default_value: argument.default_value().cloned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFactory {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: EncodedType,
    pub constructor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgumentFactory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<ResolverRef>,
    #[serde(default, skip_serializing_if = "ConfigMap::is_empty")]
    pub resolver_context: ConfigMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<ResolverRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub afterware: Vec<ResolverRef>,
}

impl FieldFactory {
    pub fn encode(field: &Field) -> Result<Self> {
        let type_ref = field.encoded_type()?;
        let args = field
            .args()
            .values()
            .map(ArgumentFactory::encode)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: field.name().to_string(),
            constructor: type_ref.encode(),
            type_ref,
            description: field.description().map(str::to_string),
            args,
            resolver: field.resolver().cloned(),
            resolver_context: field.resolver_context().clone(),
            middleware: field.middleware().to_vec(),
            afterware: field.afterware().to_vec(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValueFactory {
    pub name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_reason: Option<String>,
}

/// Constructor entry for one named type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TypeFactory {
    Object {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default)]
        is_input: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        interfaces: Vec<String>,
        fields: Vec<FieldFactory>,
    },
    Interface {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_resolver: Option<ResolverRef>,
        fields: Vec<FieldFactory>,
    },
    Union {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_resolver: Option<ResolverRef>,
        types: Vec<String>,
    },
    Enum {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        values: Vec<EnumValueFactory>,
    },
    Scalar {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        serialiser: Option<ResolverRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_parser: Option<ResolverRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        literal_parser: Option<ResolverRef>,
    },
}

impl TypeFactory {
    pub fn name(&self) -> &str {
        match self {
            Self::Object { name, .. }
            | Self::Interface { name, .. }
            | Self::Union { name, .. }
            | Self::Enum { name, .. }
            | Self::Scalar { name, .. } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Object { is_input: true, .. } => "input",
            Self::Object { .. } => "type",
            Self::Interface { .. } => "interface",
            Self::Union { .. } => "union",
            Self::Enum { .. } => "enum",
            Self::Scalar { .. } => "scalar",
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Object { description, .. }
            | Self::Interface { description, .. }
            | Self::Union { description, .. }
            | Self::Enum { description, .. }
            | Self::Scalar { description, .. } => description.as_deref(),
        }
    }

    /// Fields of object and interface entries; empty for the rest.
    pub fn fields(&self) -> &[FieldFactory] {
        match self {
            Self::Object { fields, .. } | Self::Interface { fields, .. } => fields,
            _ => &[],
        }
    }
}

/// Turns one kind of named type into a factory entry.
pub trait TypeEncoder: Send + Sync {
    fn name(&self) -> &'static str;

    fn applies_to(&self, ty: &NamedType) -> bool;

    fn encode(&self, ty: &NamedType) -> Result<TypeFactory>;
}

fn mismatch(encoder: &dyn TypeEncoder, ty: &NamedType) -> SchemaError {
    SchemaError::config(format!(
        "{} cannot encode {} '{}'",
        encoder.name(),
        ty.kind(),
        ty.name()
    ))
}

fn encode_fields<'a>(fields: impl Iterator<Item = &'a Field>) -> Result<Vec<FieldFactory>> {
    fields.map(FieldFactory::encode).collect()
}

pub struct ObjectEncoder;

impl ObjectEncoder {
    fn encode_object(ty: &ObjectType) -> Result<TypeFactory> {
        Ok(TypeFactory::Object {
            name: ty.name().to_string(),
            description: ty.description().map(str::to_string),
            is_input: ty.is_input(),
            interfaces: ty.interfaces().to_vec(),
            fields: encode_fields(ty.fields().values())?,
        })
    }
}

impl TypeEncoder for ObjectEncoder {
    fn name(&self) -> &'static str {
        "ObjectEncoder"
    }

    fn applies_to(&self, ty: &NamedType) -> bool {
        matches!(ty, NamedType::Object(_))
    }

    fn encode(&self, ty: &NamedType) -> Result<TypeFactory> {
        match ty {
            NamedType::Object(object) => Self::encode_object(object),
            other => Err(mismatch(self, other)),
        }
    }
}

pub struct InterfaceEncoder;

impl InterfaceEncoder {
    fn encode_interface(ty: &InterfaceType) -> Result<TypeFactory> {
        Ok(TypeFactory::Interface {
            name: ty.name().to_string(),
            description: ty.description().map(str::to_string),
            type_resolver: ty.type_resolver().cloned(),
            fields: encode_fields(ty.fields().values())?,
        })
    }
}

impl TypeEncoder for InterfaceEncoder {
    fn name(&self) -> &'static str {
        "InterfaceEncoder"
    }

    fn applies_to(&self, ty: &NamedType) -> bool {
        matches!(ty, NamedType::Interface(_))
    }

    fn encode(&self, ty: &NamedType) -> Result<TypeFactory> {
        match ty {
            NamedType::Interface(interface) => Self::encode_interface(interface),
            other => Err(mismatch(self, other)),
        }
    }
}

pub struct UnionEncoder;

impl UnionEncoder {
    fn encode_union(ty: &UnionType) -> TypeFactory {
        TypeFactory::Union {
            name: ty.name().to_string(),
            description: ty.description().map(str::to_string),
            type_resolver: ty.type_resolver().cloned(),
            types: ty.types().to_vec(),
        }
    }
}

impl TypeEncoder for UnionEncoder {
    fn name(&self) -> &'static str {
        "UnionEncoder"
    }

    fn applies_to(&self, ty: &NamedType) -> bool {
        matches!(ty, NamedType::Union(_))
    }

    fn encode(&self, ty: &NamedType) -> Result<TypeFactory> {
        match ty {
            NamedType::Union(union) => Ok(Self::encode_union(union)),
            other => Err(mismatch(self, other)),
        }
    }
}

pub struct EnumEncoder;

impl EnumEncoder {
    fn encode_enum(ty: &EnumType) -> TypeFactory {
        let values = ty
            .values()
            .iter()
            .map(|(name, value)| EnumValueFactory {
                name: name.clone(),
                value: value.value.clone(),
                description: value.description.clone(),
                deprecation_reason: value.deprecation_reason.clone(),
            })
            .collect();
        TypeFactory::Enum {
            name: ty.name().to_string(),
            description: ty.description().map(str::to_string),
            values,
        }
    }
}

impl TypeEncoder for EnumEncoder {
    fn name(&self) -> &'static str {
        "EnumEncoder"
    }

    fn applies_to(&self, ty: &NamedType) -> bool {
        matches!(ty, NamedType::Enum(_))
    }

    fn encode(&self, ty: &NamedType) -> Result<TypeFactory> {
        match ty {
            NamedType::Enum(enum_type) => Ok(Self::encode_enum(enum_type)),
            other => Err(mismatch(self, other)),
        }
    }
}

pub struct ScalarEncoder;

impl ScalarEncoder {
    fn encode_scalar(ty: &ScalarType) -> TypeFactory {
        TypeFactory::Scalar {
            name: ty.name().to_string(),
            description: ty.description().map(str::to_string),
            serialiser: ty.serialiser().cloned(),
            value_parser: ty.value_parser().cloned(),
            literal_parser: ty.literal_parser().cloned(),
        }
    }
}

impl TypeEncoder for ScalarEncoder {
    fn name(&self) -> &'static str {
        "ScalarEncoder"
    }

    fn applies_to(&self, ty: &NamedType) -> bool {
        matches!(ty, NamedType::Scalar(_))
    }

    fn encode(&self, ty: &NamedType) -> Result<TypeFactory> {
        match ty {
            NamedType::Scalar(scalar) => Ok(Self::encode_scalar(scalar)),
            other => Err(mismatch(self, other)),
        }
    }
}

/// Encoders tried in registration order; the first that applies wins.
pub struct EncoderRegistry {
    encoders: Vec<Box<dyn TypeEncoder>>,
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self {
            encoders: vec![
                Box::new(ObjectEncoder),
                Box::new(InterfaceEncoder),
                Box::new(UnionEncoder),
                Box::new(EnumEncoder),
                Box::new(ScalarEncoder),
            ],
        }
    }
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `encoder` ahead of the built-in ones.
    pub fn prepend(&mut self, encoder: Box<dyn TypeEncoder>) {
        self.encoders.insert(0, encoder);
    }

    pub fn encode(&self, ty: &NamedType) -> Result<TypeFactory> {
        let encoder = self
            .encoders
            .iter()
            .find(|encoder| encoder.applies_to(ty))
            .ok_or_else(|| SchemaError::config(format!("No encoder for {} '{}'", ty.kind(), ty.name())))?;
        encoder.encode(ty)
    }

    pub fn encode_all(&self, types: &[NamedType]) -> Result<Vec<TypeFactory>> {
        types.iter().map(|ty| self.encode(ty)).collect()
    }
}

impl std::fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.encoders.iter().map(|e| e.name())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article() -> ObjectType {
        ObjectType::from_config(
            "Article",
            &json!({
                "description": "A published article",
                "fields": {
                    "title(length: Int = 20)": {"type": "String!", "resolver": "Articles::title"},
                    "tags": "[String]"
                }
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_object_factory() {
        let factory = EncoderRegistry::new().encode(&NamedType::Object(article())).unwrap();
        assert_eq!(factory.name(), "Article");
        assert_eq!(factory.kind(), "type");

        let title = &factory.fields()[0];
        assert_eq!(title.type_ref.to_string(), "String!");
        assert_eq!(title.constructor, "nonNull(String())");
        assert_eq!(title.resolver.as_ref().unwrap().to_string(), "Articles::title");
        assert_eq!(title.args[0].default_value, Some(json!(20)));
    }

    #[test]
    fn test_factory_json_shape() {
        let factory = EncoderRegistry::new()
            .encode(&NamedType::Enum(EnumType::with_values("Status", ["DRAFT", "PUBLISHED"]).unwrap()))
            .unwrap();
        let json = serde_json::to_value(&factory).unwrap();
        assert_eq!(json["kind"], json!("enum"));
        assert_eq!(json["values"][1]["name"], json!("PUBLISHED"));

        let decoded: TypeFactory = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, factory);
    }

    #[test]
    fn test_encoder_mismatch() {
        let scalar = NamedType::Scalar(ScalarType::new("Date").unwrap());
        let err = ObjectEncoder.encode(&scalar).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: ObjectEncoder cannot encode scalar 'Date'");
    }

    #[test]
    fn test_untyped_field_fails() {
        let mut ty = ObjectType::new("Broken").unwrap();
        ty.add_field(Field::named("nothing").unwrap());
        assert!(EncoderRegistry::new().encode(&NamedType::Object(ty)).is_err());
    }
}
