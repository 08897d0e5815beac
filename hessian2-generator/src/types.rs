//! Go type and zero-value mapping for proto fields.

use parser::{DefaultValue, FieldDescriptor, FieldType, MessageDescriptor, ScalarType};

use crate::ident::{GoIdent, GoImportPath};
use crate::naming::{go_camel_case, go_quote, go_quote_bytes};
use crate::transform::Transformer;

pub(crate) fn scalar_go_type(s: ScalarType) -> &'static str {
    match s {
        ScalarType::Bool => "bool",
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => "int32",
        ScalarType::Uint32 | ScalarType::Fixed32 => "uint32",
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => "int64",
        ScalarType::Uint64 | ScalarType::Fixed64 => "uint64",
        ScalarType::Float => "float32",
        ScalarType::Double => "float64",
        ScalarType::String => "string",
        ScalarType::Bytes => "[]byte",
    }
}

impl Transformer<'_, '_> {
    /// Go type of `field` following the standard table: `[]T` for repeated
    /// fields, `map[K]V` for map fields, `*T` for message references.
    pub(crate) fn go_type(&self, field: &FieldDescriptor) -> String {
        if field.is_repeated() {
            if let Some([key, value]) = self.map_entry(field).map(|e| e.fields.as_slice()) {
                return format!("map[{}]{}", self.element_type(key), self.element_type(value));
            }
            return format!("[]{}", self.element_type(field));
        }
        self.element_type(field)
    }

    fn element_type(&self, field: &FieldDescriptor) -> String {
        match &field.ty {
            FieldType::Scalar(s) => scalar_go_type(*s).to_string(),
            FieldType::Enum(name) => self.out.qualified_go_ident(&self.packages.ident(name)),
            FieldType::Message(name) => {
                format!("*{}", self.out.qualified_go_ident(&self.packages.ident(name)))
            }
            // the pool resolves every name; fall back to the local identifier
            FieldType::Custom(name) => go_camel_case(name.trim_start_matches('.')),
        }
    }

    fn map_entry(&self, field: &FieldDescriptor) -> Option<&MessageDescriptor> {
        field
            .message_type()
            .and_then(|name| self.pool.message(name))
            .filter(|m| m.map_entry)
    }

    /// Go literal a field holds when unset: its explicit default if one was
    /// declared, otherwise the zero value of its type.
    pub(crate) fn default_value(&self, field: &FieldDescriptor) -> String {
        if field.is_repeated() {
            return "nil".to_string();
        }
        if let Some(value) = &field.default_value {
            return self.explicit_default(field, value);
        }
        if let Some(name) = field.enum_type() {
            return self
                .pool
                .enumeration(name)
                .and_then(|e| e.values.first())
                .map(|v| self.enum_value(name, &v.name))
                .unwrap_or_else(|| "0".to_string());
        }
        match &field.ty {
            FieldType::Scalar(ScalarType::Bool) => "false".to_string(),
            FieldType::Scalar(ScalarType::String) => "\"\"".to_string(),
            FieldType::Scalar(ScalarType::Bytes) => "nil".to_string(),
            FieldType::Scalar(_) => "0".to_string(),
            _ => "nil".to_string(),
        }
    }

    fn explicit_default(&self, field: &FieldDescriptor, value: &DefaultValue) -> String {
        let constant = match value {
            DefaultValue::Text(text) => return go_quote(text),
            DefaultValue::Bytes(bytes) => return format!("[]byte({})", go_quote_bytes(bytes)),
            DefaultValue::Constant(constant) => constant,
        };
        if let Some(name) = field.enum_type() {
            return self.enum_value(name, constant);
        }
        match field.ty {
            FieldType::Scalar(kind @ (ScalarType::Float | ScalarType::Double)) => {
                self.float_literal(kind, constant)
            }
            _ => constant.clone(),
        }
    }

    fn enum_value(&self, enum_name: &str, value: &str) -> String {
        self.out
            .qualified_go_ident(&self.packages.enum_value_ident(enum_name, value))
    }

    /// `math.Inf`/`math.NaN` return float64, so `float` fields get a
    /// `float32(...)` conversion around them.
    fn float_literal(&self, kind: ScalarType, value: &str) -> String {
        let math = |name: &str| {
            self.out.qualified_go_ident(&GoIdent {
                go_name: name.to_string(),
                import_path: GoImportPath::parse("math"),
            })
        };
        let call = match value {
            "inf" => format!("{}(1)", math("Inf")),
            "-inf" => format!("{}(-1)", math("Inf")),
            "nan" | "-nan" => format!("{}()", math("NaN")),
            _ => return value.to_string(),
        };
        match kind {
            ScalarType::Float => format!("float32({call})"),
            _ => call,
        }
    }
}
