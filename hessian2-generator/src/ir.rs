//! Generation-ready IR for one proto file.
//!
//! Every node keeps a non-owning reference to the descriptor it was built
//! from (see the `desc` accessors) and adds the resolved Go/Hessian2 data
//! the emission stage needs. Nodes are built bottom-up by
//! [`Transformer`](crate::Transformer) and not modified afterwards.

use parser::{EnumDescriptor, FieldDescriptor, FileDescriptor, MessageDescriptor};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Hessian2File<'a> {
    #[serde(skip)]
    desc: &'a FileDescriptor,

    pub source: String,
    pub proto_package: String,
    pub enums: Vec<Enum<'a>>,
    pub messages: Vec<Message<'a>>,
}

impl<'a> Hessian2File<'a> {
    pub(crate) fn new(desc: &'a FileDescriptor) -> Self {
        Hessian2File {
            desc,
            source: desc.name.clone(),
            proto_package: desc.package.clone().unwrap_or_default(),
            enums: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn desc(&self) -> &'a FileDescriptor {
        self.desc
    }

    /// Pretty JSON for template engines.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Serialize)]
pub struct Enum<'a> {
    #[serde(rename = "proto")]
    desc: &'a EnumDescriptor,

    pub go_name: String,
    /// Empty when the enum carries no `enum_extend` option.
    pub java_class_name: String,
}

impl<'a> Enum<'a> {
    pub(crate) fn new(desc: &'a EnumDescriptor, go_name: String) -> Self {
        Enum {
            desc,
            go_name,
            java_class_name: String::new(),
        }
    }

    pub fn desc(&self) -> &'a EnumDescriptor {
        self.desc
    }

    pub fn name(&self) -> &'a str {
        &self.desc.name
    }
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    #[serde(rename = "proto", serialize_with = "message_name")]
    desc: &'a MessageDescriptor,

    pub go_name: String,
    pub java_class_name: String,
    pub inner_messages: Vec<Message<'a>>,
    /// Set by the enclosing message when this nested message declares
    /// `is_inheritance`; top-level messages keep `false`.
    pub is_inheritance: bool,
    pub fields: Vec<Field<'a>>,
    pub extend_args: bool,
}

impl<'a> Message<'a> {
    pub(crate) fn new(desc: &'a MessageDescriptor, go_name: String) -> Self {
        Message {
            desc,
            go_name,
            java_class_name: String::new(),
            inner_messages: Vec::new(),
            is_inheritance: false,
            fields: Vec::new(),
            extend_args: false,
        }
    }

    pub fn desc(&self) -> &'a MessageDescriptor {
        self.desc
    }

    pub fn name(&self) -> &'a str {
        &self.desc.name
    }

    pub fn full_name(&self) -> &'a str {
        &self.desc.full_name
    }

    pub fn is_map_entry(&self) -> bool {
        self.desc.map_entry
    }
}

// Nested messages and fields are serialized through the IR itself, so only
// the identity of the descriptor is written here.
fn message_name<S: serde::Serializer>(
    desc: &&MessageDescriptor,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&desc.full_name)
}

#[derive(Debug, Serialize)]
pub struct Field<'a> {
    #[serde(rename = "proto")]
    desc: &'a FieldDescriptor,

    pub go_name: String,
    /// Go type, qualified and with any pointer prefix applied.
    pub type_name: String,
    /// Go literal assigned when the field is not set.
    pub default_value: String,
}

impl<'a> Field<'a> {
    pub(crate) fn new(
        desc: &'a FieldDescriptor,
        go_name: String,
        type_name: String,
        default_value: String,
    ) -> Self {
        Field {
            desc,
            go_name,
            type_name,
            default_value,
        }
    }

    pub fn desc(&self) -> &'a FieldDescriptor {
        self.desc
    }

    pub fn name(&self) -> &'a str {
        &self.desc.name
    }

    pub fn number(&self) -> u32 {
        self.desc.number
    }
}
