mod model;
mod options;
mod pool;

use pest::Parser as _;
use pest::iterators::Pair;
use pest_derive::Parser;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use model::*;
pub use pool::DescriptorPool;

use options::ParsedOption;

#[derive(Parser)]
#[grammar = "resources/proto.pest"] // Path relative to the crate root
pub struct ProtoParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Pest(#[from] Box<pest::error::Error<Rule>>),
    #[error("{0}")]
    Message(&'static str),
    #[error("unsupported syntax {0:?}")]
    UnsupportedSyntax(String),
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error("integer literal `{0}` is out of range")]
    IntegerOutOfRange(String),
    #[error("unknown scalar type `{0}`")]
    UnknownScalarType(String),
    #[error("unresolved type `{name}` referenced from `{scope}`")]
    UnresolvedType { name: String, scope: String },
    #[error("type `{0}` is defined more than once")]
    DuplicateType(String),
    #[error("file not found: {0}")]
    FileNotFound(String),
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        Self::Pest(Box::new(e))
    }
}

// Public API: parse a single .proto file into an unresolved FileDescriptor.
// Use DescriptorPool to resolve type references across files.
pub fn parse_proto_file<P: AsRef<Path>>(path: P) -> Result<FileDescriptor, ParseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let name = path.to_string_lossy().replace('\\', "/");
    parse_proto_str(&name, &content)
}

pub fn parse_proto_str(name: &str, content: &str) -> Result<FileDescriptor, ParseError> {
    let mut pairs = ProtoParser::parse(Rule::proto, content)?;
    let proto_pair = pairs
        .next()
        .ok_or(ParseError::Message("expected proto root"))?;
    parse_proto(name, proto_pair)
}

fn parse_proto(name: &str, pair: Pair<Rule>) -> Result<FileDescriptor, ParseError> {
    let mut file = FileDescriptor {
        name: name.to_string(),
        ..Default::default()
    };
    let mut file_options: Vec<ParsedOption> = Vec::new();
    // Definitions are walked after the whole body so the package is known
    // regardless of where the package statement appears.
    let mut definitions: Vec<Pair<Rule>> = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::syntax_statement => file.syntax = parse_syntax(inner)?,
            Rule::proto_body => {
                for b in inner.into_inner() {
                    match b.as_rule() {
                        Rule::import_statement => {
                            if let Some(lit) =
                                b.into_inner().find(|p| p.as_rule() == Rule::string_lit)
                            {
                                file.imports.push(options::unquote(lit.as_str())?);
                            }
                        }
                        Rule::package_statement => {
                            // package_statement = { "package" ~ package_name ~ ";" }
                            file.package = b
                                .into_inner()
                                .find(|p| p.as_rule() == Rule::package_name)
                                .and_then(|p| {
                                    p.into_inner().find(|x| x.as_rule() == Rule::full_ident)
                                })
                                .map(|p| p.as_str().to_string());
                        }
                        Rule::option_statement => {
                            file_options.push(options::parse_option_statement(b))
                        }
                        Rule::top_level_definition => definitions.extend(b.into_inner()),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    file.go_package = options::go_package(&file_options)?;

    let package = file.package.clone();
    for def in definitions {
        match def.as_rule() {
            Rule::message_block => file.messages.push(parse_message_block(
                def,
                package.as_deref(),
                file.syntax,
            )?),
            Rule::enum_block => file
                .enums
                .push(parse_enum_block(def, package.as_deref())?),
            // services and extend blocks carry nothing the generator needs
            _ => {}
        }
    }

    Ok(file)
}

fn parse_syntax(pair: Pair<Rule>) -> Result<Syntax, ParseError> {
    let is_edition = pair.as_str().trim_start().starts_with("edition");
    let lit = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::string_lit)
        .ok_or(ParseError::Message("expected syntax string"))?;
    let value = options::unquote(lit.as_str())?;
    match value.as_str() {
        _ if is_edition => Ok(Syntax::Editions),
        "proto2" => Ok(Syntax::Proto2),
        "proto3" => Ok(Syntax::Proto3),
        _ => Err(ParseError::UnsupportedSyntax(value)),
    }
}

fn qualify(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(p) if !p.is_empty() => format!("{p}.{name}"),
        _ => name.to_string(),
    }
}

fn parse_message_block(
    block: Pair<Rule>,
    parent: Option<&str>,
    syntax: Syntax,
) -> Result<MessageDescriptor, ParseError> {
    // message_block = { "message" ~ message_name ~ message_body }
    let mut message = MessageDescriptor::default();
    let mut body_opt: Option<Pair<Rule>> = None;

    for p in block.into_inner() {
        match p.as_rule() {
            Rule::message_name => message.name = p.as_str().to_string(),
            Rule::message_body => body_opt = Some(p),
            _ => {}
        }
    }
    message.full_name = qualify(parent, &message.name);

    let mut opts: Vec<ParsedOption> = Vec::new();
    if let Some(body) = body_opt {
        for elem in body.into_inner() {
            if elem.as_rule() != Rule::message_element {
                continue;
            }
            for inner in elem.into_inner() {
                match inner.as_rule() {
                    Rule::field => message.fields.push(parse_field(inner, None, syntax)?),
                    Rule::map_field => {
                        let (field, entry) = parse_map_field(inner, &message.full_name)?;
                        message.fields.push(field);
                        message.messages.push(entry);
                    }
                    Rule::oneof => {
                        // Flatten oneof members into the message, remembering the group
                        let mut oneof_name = String::new();
                        for oneof_inner in inner.into_inner() {
                            match oneof_inner.as_rule() {
                                Rule::oneof_name => oneof_name = oneof_inner.as_str().to_string(),
                                Rule::oneof_field => {
                                    for f in oneof_inner.into_inner() {
                                        if f.as_rule() == Rule::field {
                                            message.fields.push(parse_field(
                                                f,
                                                Some(&oneof_name),
                                                syntax,
                                            )?);
                                        }
                                    }
                                }
                                _ => {}
                            }
                        }
                        message.oneofs.push(oneof_name);
                    }
                    Rule::enum_block => message
                        .enums
                        .push(parse_enum_block(inner, Some(&message.full_name))?),
                    Rule::message_block => message.messages.push(parse_message_block(
                        inner,
                        Some(&message.full_name),
                        syntax,
                    )?),
                    Rule::option_statement => opts.push(options::parse_option_statement(inner)),
                    _ => {}
                }
            }
        }
    }

    message.options = options::message_options(&opts)?;
    Ok(message)
}

fn parse_enum_block(block: Pair<Rule>, parent: Option<&str>) -> Result<EnumDescriptor, ParseError> {
    // enum_block = { "enum" ~ enum_name ~ "{" ~ enum_body* ~ "}" }
    let mut en = EnumDescriptor::default();
    let mut opts: Vec<ParsedOption> = Vec::new();

    for p in block.into_inner() {
        match p.as_rule() {
            Rule::enum_name => en.name = p.as_str().to_string(),
            Rule::enum_body => {
                for eb in p.into_inner() {
                    match eb.as_rule() {
                        Rule::enum_field => {
                            let mut val_name: Option<String> = None;
                            let mut number: Option<i32> = None;
                            for ef in eb.into_inner() {
                                match ef.as_rule() {
                                    Rule::enum_field_name => {
                                        val_name = Some(ef.as_str().to_string())
                                    }
                                    Rule::enum_field_value => {
                                        // enum_field_value = integer_value
                                        let text = ef.as_str().trim().to_string();
                                        let n = parse_integer_value(ef)?;
                                        number = Some(
                                            i32::try_from(n)
                                                .map_err(|_| ParseError::IntegerOutOfRange(text))?,
                                        );
                                    }
                                    _ => {}
                                }
                            }
                            if let (Some(name), Some(number)) = (val_name, number) {
                                en.values.push(EnumValue { name, number });
                            }
                        }
                        Rule::option_statement => opts.push(options::parse_option_statement(eb)),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    en.full_name = qualify(parent, &en.name);
    en.options = options::enum_options(&opts)?;
    Ok(en)
}

fn parse_field(
    pair: Pair<Rule>,
    oneof: Option<&str>,
    syntax: Syntax,
) -> Result<FieldDescriptor, ParseError> {
    // field = { field_modifier? ~ type_reference ~ field_name ~ "=" ~ tag ~ field_options? ~ ";" }
    let mut label = Label::Optional;
    let mut ty_opt: Option<FieldType> = None;
    let mut name_opt: Option<String> = None;
    let mut number_opt: Option<u32> = None;
    let mut opts: Vec<ParsedOption> = Vec::new();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::field_modifier => {
                label = match p.as_str() {
                    "repeated" => Label::Repeated,
                    "required" => Label::Required,
                    _ => Label::Optional,
                }
            }
            Rule::type_reference => ty_opt = Some(parse_type_reference(p)?),
            Rule::field_name => name_opt = Some(p.as_str().to_string()),
            Rule::tag => number_opt = Some(parse_tag(p)?),
            Rule::field_options => opts.extend(parse_field_options(p)),
            _ => {}
        }
    }

    let (Some(ty), Some(name), Some(number)) = (ty_opt, name_opt, number_opt) else {
        return Err(ParseError::Message("incomplete field declaration"));
    };
    let default_value = options::default_value(&opts, &ty, syntax)?;
    Ok(FieldDescriptor {
        name,
        number,
        label,
        ty,
        default_value,
        oneof: oneof.map(str::to_string),
        options: options::field_options(&opts)?,
    })
}

fn parse_field_options(pair: Pair<Rule>) -> Vec<ParsedOption> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::field_option)
        .map(options::parse_option_statement)
        .collect()
}

/// `map<K, V> name = N;` becomes a repeated field of a synthetic
/// `<Name>Entry` message with `key = 1` and `value = 2`.
fn parse_map_field(
    pair: Pair<Rule>,
    parent: &str,
) -> Result<(FieldDescriptor, MessageDescriptor), ParseError> {
    let mut key_opt: Option<ScalarType> = None;
    let mut value_opt: Option<FieldType> = None;
    let mut name_opt: Option<String> = None;
    let mut number_opt: Option<u32> = None;
    let mut opts: Vec<ParsedOption> = Vec::new();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::key_type => key_opt = Some(parse_scalar_type(p.as_str().trim())?),
            Rule::type_reference => value_opt = Some(parse_type_reference(p)?),
            Rule::field_name => name_opt = Some(p.as_str().to_string()),
            Rule::tag => number_opt = Some(parse_tag(p)?),
            Rule::field_options => opts.extend(parse_field_options(p)),
            _ => {}
        }
    }

    let (Some(key), Some(value), Some(name), Some(number)) =
        (key_opt, value_opt, name_opt, number_opt)
    else {
        return Err(ParseError::Message("incomplete map field declaration"));
    };

    let entry_name = format!("{}Entry", camel_case(&name));
    let entry = MessageDescriptor {
        full_name: qualify(Some(parent), &entry_name),
        name: entry_name,
        fields: vec![
            entry_field("key", 1, FieldType::Scalar(key)),
            entry_field("value", 2, value),
        ],
        map_entry: true,
        ..Default::default()
    };
    let field = FieldDescriptor {
        name,
        number,
        label: Label::Repeated,
        ty: FieldType::Message(entry.full_name.clone()),
        default_value: None,
        oneof: None,
        options: options::field_options(&opts)?,
    };
    Ok((field, entry))
}

fn entry_field(name: &str, number: u32, ty: FieldType) -> FieldDescriptor {
    FieldDescriptor {
        name: name.to_string(),
        number,
        label: Label::Optional,
        ty,
        default_value: None,
        oneof: None,
        options: None,
    }
}

// protoc's naming for map entry messages: `my_map` -> `MyMap`
fn camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = true;
    for c in s.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_type_reference(pair: Pair<Rule>) -> Result<FieldType, ParseError> {
    // type_reference = ${ scalar_type | "."? ~ full_ident }
    // Scalars are recognised here; names keep their leading dot so the pool
    // can tell absolute references apart.
    let mut inners = pair.clone().into_inner();
    if let Some(first) = inners.next()
        && first.as_rule() == Rule::scalar_type
    {
        return Ok(FieldType::Scalar(parse_scalar_type(first.as_str())?));
    }
    Ok(FieldType::Custom(pair.as_str().to_string()))
}

fn parse_scalar_type(s: &str) -> Result<ScalarType, ParseError> {
    let ty = match s {
        "double" => ScalarType::Double,
        "float" => ScalarType::Float,
        "int32" => ScalarType::Int32,
        "int64" => ScalarType::Int64,
        "uint32" => ScalarType::Uint32,
        "uint64" => ScalarType::Uint64,
        "sint32" => ScalarType::Sint32,
        "sint64" => ScalarType::Sint64,
        "fixed32" => ScalarType::Fixed32,
        "fixed64" => ScalarType::Fixed64,
        "sfixed32" => ScalarType::Sfixed32,
        "sfixed64" => ScalarType::Sfixed64,
        "bool" => ScalarType::Bool,
        "string" => ScalarType::String,
        "bytes" => ScalarType::Bytes,
        other => return Err(ParseError::UnknownScalarType(other.to_string())),
    };
    Ok(ty)
}

fn parse_tag(pair: Pair<Rule>) -> Result<u32, ParseError> {
    let text = pair.as_str().trim().to_string();
    u32::try_from(parse_integer_value(pair)?).map_err(|_| ParseError::IntegerOutOfRange(text))
}

fn parse_integer_value(pair: Pair<Rule>) -> Result<i128, ParseError> {
    // integer_value = dec|hex|oct with optional minus
    let s = pair.as_str().trim();
    let (neg, rest) = match s.strip_prefix('-') {
        Some(stripped) => (true, stripped),
        None => (false, s),
    };
    let parsed = if rest.starts_with("0x") || rest.starts_with("0X") {
        i128::from_str_radix(&rest[2..], 16)
    } else if rest.starts_with('0') && rest.len() > 1 {
        // Octal per grammar
        i128::from_str_radix(&rest[1..], 8)
    } else {
        rest.parse::<i128>()
    };
    let val = parsed.map_err(|_| ParseError::IntegerOutOfRange(s.to_string()))?;
    Ok(if neg { -val } else { val })
}
