// Descriptor tree for .proto files.
// - A file owns its top-level enums and messages in declaration order.
// - Messages own their nested messages (including synthetic map entries),
//   nested enums and fields.
// - Field types start as `Custom` names and are resolved by the pool into
//   `Message` / `Enum` references carrying the fully-qualified name.
// - Hessian2 options are decoded at parse time and attached as `Option`s.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Syntax {
    #[default]
    Proto2,
    Proto3,
    Editions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FileDescriptor {
    /// Path of the file as it was requested (relative to its include path).
    pub name: String,
    pub package: Option<String>,
    pub syntax: Syntax,
    pub imports: Vec<String>,
    /// Raw `go_package` option, e.g. `github.com/x/y;y`.
    pub go_package: Option<String>,
    pub enums: Vec<EnumDescriptor>,
    pub messages: Vec<MessageDescriptor>,
}

// ---------------- Message & Fields ----------------

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MessageDescriptor {
    pub name: String,
    /// Dotted name including the package, without a leading dot.
    pub full_name: String,
    pub fields: Vec<FieldDescriptor>,
    pub messages: Vec<MessageDescriptor>,
    pub enums: Vec<EnumDescriptor>,
    pub oneofs: Vec<String>,
    /// Synthesized for a `map<K, V>` field; never written by users.
    pub map_entry: bool,
    pub options: Option<Hessian2MessageOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    pub label: Label,
    pub ty: FieldType,
    /// Explicit `[default = ...]`.
    pub default_value: Option<DefaultValue>,
    pub oneof: Option<String>,
    pub options: Option<Hessian2FieldOptions>,
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    /// Fully-qualified name of the referenced message, if any.
    pub fn message_type(&self) -> Option<&str> {
        match &self.ty {
            FieldType::Message(name) => Some(name),
            _ => None,
        }
    }

    /// Fully-qualified name of the referenced enum, if any.
    pub fn enum_type(&self) -> Option<&str> {
        match &self.ty {
            FieldType::Enum(name) => Some(name),
            _ => None,
        }
    }
}

/// Decoded `[default = ...]` of a proto2 field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// Unescaped `string` default.
    Text(String),
    /// Unescaped `bytes` default; not necessarily UTF-8.
    Bytes(Vec<u8>),
    /// Numbers, bools, enum value names and `inf`/`nan`, as written.
    Constant(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Optional,
    Required,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Scalar(ScalarType),
    Message(String),
    Enum(String),
    Custom(String), // type name as written, before resolution
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

// ---------------- Enum ----------------

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub full_name: String,
    pub values: Vec<EnumValue>,
    pub options: Option<Hessian2EnumOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

// ---------------- Hessian2 options ----------------

/// `(unified_idl_extend.message_extend)`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Hessian2MessageOptions {
    pub java_class_name: String,
    /// Go import path of the package that really defines this message.
    pub reference_path: String,
    pub extend_args: bool,
    pub is_inheritance: bool,
}

/// `(unified_idl_extend.field_extend)`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Hessian2FieldOptions {
    pub is_wrapper: bool,
}

/// `(unified_idl_extend.enum_extend)`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Hessian2EnumOptions {
    pub java_class_name: String,
}
