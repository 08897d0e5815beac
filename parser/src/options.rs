// Option statements and their decoding into typed Hessian2 option blocks.
//
// Options are collected verbatim while walking the parse tree and decoded
// per element afterwards, so that `option (ext) = { ... }` and
// `option (ext).key = ...` forms merge into a single block the way protoc
// merges them.

use pest::iterators::Pair;

use crate::{
    DefaultValue, FieldType, Hessian2EnumOptions, Hessian2FieldOptions, Hessian2MessageOptions,
    ParseError, Rule, ScalarType, Syntax,
};

const MESSAGE_EXTEND: &str = "message_extend";
const FIELD_EXTEND: &str = "field_extend";
const ENUM_EXTEND: &str = "enum_extend";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OptionValue {
    Constant(String),
    Aggregate(Vec<(String, OptionValue)>),
    List(Vec<OptionValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedOption {
    /// Name inside the parentheses, e.g. `unified_idl_extend.message_extend`.
    pub extension: Option<String>,
    /// Dotted components after the extension (or the plain option name).
    pub path: Vec<String>,
    pub value: OptionValue,
}

impl ParsedOption {
    fn is_extension(&self, name: &str) -> bool {
        self.extension
            .as_deref()
            .and_then(|e| e.rsplit('.').next())
            .is_some_and(|last| last == name)
    }

    fn is_builtin(&self, name: &str) -> bool {
        self.extension.is_none() && self.path.len() == 1 && self.path[0] == name
    }

    /// Key/value pairs this statement assigns inside an extension block.
    fn entries(&self) -> Result<Vec<(String, OptionValue)>, ParseError> {
        match (self.path.as_slice(), &self.value) {
            ([], OptionValue::Aggregate(entries)) => Ok(entries.clone()),
            ([key], value) => Ok(vec![(key.clone(), value.clone())]),
            _ => Err(ParseError::InvalidOption(format!(
                "unsupported option form for ({})",
                self.extension.as_deref().unwrap_or_default()
            ))),
        }
    }
}

/// Parses `option_statement` and `field_option` pairs.
pub(crate) fn parse_option_statement(pair: Pair<Rule>) -> ParsedOption {
    let mut extension = None;
    let mut path = Vec::new();
    let mut value = OptionValue::List(Vec::new());

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::option_name => {
                for part in p.into_inner() {
                    match part.as_rule() {
                        Rule::extension_name => {
                            extension = part
                                .into_inner()
                                .find(|x| x.as_rule() == Rule::full_ident)
                                .map(|x| x.as_str().to_string());
                        }
                        Rule::ident => path.push(part.as_str().to_string()),
                        _ => {}
                    }
                }
            }
            Rule::option_value => value = parse_option_value(p),
            _ => {}
        }
    }

    ParsedOption {
        extension,
        path,
        value,
    }
}

fn parse_option_value(pair: Pair<Rule>) -> OptionValue {
    let Some(inner) = pair.into_inner().next() else {
        return OptionValue::List(Vec::new());
    };
    match inner.as_rule() {
        Rule::aggregate => {
            let mut entries = Vec::new();
            for entry in inner.into_inner() {
                let mut key = String::new();
                let mut value = None;
                for p in entry.into_inner() {
                    match p.as_rule() {
                        Rule::aggregate_key => key = p.as_str().to_string(),
                        Rule::option_value => value = Some(parse_option_value(p)),
                        _ => {}
                    }
                }
                if let Some(v) = value {
                    entries.push((key, v));
                }
            }
            OptionValue::Aggregate(entries)
        }
        Rule::option_list => OptionValue::List(inner.into_inner().map(parse_option_value).collect()),
        _ => OptionValue::Constant(inner.as_str().trim().to_string()),
    }
}

pub(crate) fn message_options(
    opts: &[ParsedOption],
) -> Result<Option<Hessian2MessageOptions>, ParseError> {
    let mut out: Option<Hessian2MessageOptions> = None;
    for opt in opts.iter().filter(|o| o.is_extension(MESSAGE_EXTEND)) {
        let target = out.get_or_insert_with(Default::default);
        for (key, value) in opt.entries()? {
            match key.as_str() {
                "java_class_name" => target.java_class_name = expect_string(&key, &value)?,
                "reference_path" => target.reference_path = expect_string(&key, &value)?,
                "extend_args" => target.extend_args = expect_bool(&key, &value)?,
                "is_inheritance" => target.is_inheritance = expect_bool(&key, &value)?,
                _ => return Err(unknown_field("Hessian2MessageOptions", &key)),
            }
        }
    }
    Ok(out)
}

pub(crate) fn field_options(
    opts: &[ParsedOption],
) -> Result<Option<Hessian2FieldOptions>, ParseError> {
    let mut out: Option<Hessian2FieldOptions> = None;
    for opt in opts.iter().filter(|o| o.is_extension(FIELD_EXTEND)) {
        let target = out.get_or_insert_with(Default::default);
        for (key, value) in opt.entries()? {
            match key.as_str() {
                "is_wrapper" => target.is_wrapper = expect_bool(&key, &value)?,
                _ => return Err(unknown_field("Hessian2FieldOptions", &key)),
            }
        }
    }
    Ok(out)
}

pub(crate) fn enum_options(
    opts: &[ParsedOption],
) -> Result<Option<Hessian2EnumOptions>, ParseError> {
    let mut out: Option<Hessian2EnumOptions> = None;
    for opt in opts.iter().filter(|o| o.is_extension(ENUM_EXTEND)) {
        let target = out.get_or_insert_with(Default::default);
        for (key, value) in opt.entries()? {
            match key.as_str() {
                "java_class_name" => target.java_class_name = expect_string(&key, &value)?,
                _ => return Err(unknown_field("Hessian2EnumOptions", &key)),
            }
        }
    }
    Ok(out)
}

pub(crate) fn go_package(opts: &[ParsedOption]) -> Result<Option<String>, ParseError> {
    opts.iter()
        .rfind(|o| o.is_builtin("go_package"))
        .map(|o| expect_string("go_package", &o.value))
        .transpose()
}

pub(crate) fn default_value(
    opts: &[ParsedOption],
    ty: &FieldType,
    syntax: Syntax,
) -> Result<Option<DefaultValue>, ParseError> {
    let Some(opt) = opts.iter().rfind(|o| o.is_builtin("default")) else {
        return Ok(None);
    };
    if syntax == Syntax::Proto3 {
        return Err(ParseError::InvalidOption(
            "explicit default values are not allowed in proto3".to_string(),
        ));
    }
    let value = match ty {
        FieldType::Scalar(ScalarType::String) => {
            DefaultValue::Text(expect_string("default", &opt.value)?)
        }
        FieldType::Scalar(ScalarType::Bytes) => match &opt.value {
            OptionValue::Constant(raw) if is_quoted(raw) => {
                DefaultValue::Bytes(unquote_bytes(raw)?)
            }
            _ => return Err(ParseError::InvalidOption("`default` expects a string".to_string())),
        },
        _ => match &opt.value {
            OptionValue::Constant(raw) => DefaultValue::Constant(raw.clone()),
            _ => return Err(ParseError::InvalidOption("default must be a constant".to_string())),
        },
    };
    Ok(Some(value))
}

fn unknown_field(block: &str, key: &str) -> ParseError {
    ParseError::InvalidOption(format!("unknown field `{key}` in {block}"))
}

fn expect_string(key: &str, value: &OptionValue) -> Result<String, ParseError> {
    match value {
        OptionValue::Constant(raw) if is_quoted(raw) => unquote(raw),
        _ => Err(ParseError::InvalidOption(format!("`{key}` expects a string"))),
    }
}

fn expect_bool(key: &str, value: &OptionValue) -> Result<bool, ParseError> {
    match value {
        OptionValue::Constant(raw) if raw == "true" => Ok(true),
        OptionValue::Constant(raw) if raw == "false" => Ok(false),
        _ => Err(ParseError::InvalidOption(format!("`{key}` expects a bool"))),
    }
}

fn is_quoted(raw: &str) -> bool {
    raw.starts_with('"') || raw.starts_with('\'')
}

/// Decodes a quoted proto string literal that must hold UTF-8 text.
pub(crate) fn unquote(raw: &str) -> Result<String, ParseError> {
    String::from_utf8(unquote_bytes(raw)?)
        .map_err(|_| ParseError::InvalidOption(format!("string literal {raw} is not valid UTF-8")))
}

/// Decodes a quoted proto string literal, including C-style escapes, into
/// the raw bytes it denotes.
pub(crate) fn unquote_bytes(raw: &str) -> Result<Vec<u8>, ParseError> {
    let inner = raw
        .get(1..raw.len().saturating_sub(1))
        .filter(|_| raw.len() >= 2)
        .ok_or_else(|| ParseError::InvalidOption(format!("malformed string literal {raw}")))?;

    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err(ParseError::InvalidOption(format!("dangling escape in {raw}")));
        };
        match esc {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '\\' | '\'' | '"' | '?' => out.push(esc as u8),
            'x' | 'X' => {
                let mut digits = String::new();
                while digits.len() < 2 && chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    digits.extend(chars.next());
                }
                let byte = u8::from_str_radix(&digits, 16)
                    .map_err(|_| ParseError::InvalidOption(format!("bad hex escape in {raw}")))?;
                out.push(byte);
            }
            '0'..='7' => {
                let mut digits = esc.to_string();
                while digits.len() < 3 && chars.peek().is_some_and(|c| ('0'..='7').contains(c)) {
                    digits.extend(chars.next());
                }
                let value = u32::from_str_radix(&digits, 8).unwrap_or(0);
                out.push((value & 0xff) as u8);
            }
            'u' | 'U' => {
                let len = if esc == 'u' { 4 } else { 8 };
                let digits: String = chars.by_ref().take(len).collect();
                let ch = u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        ParseError::InvalidOption(format!("bad unicode escape in {raw}"))
                    })?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            other => {
                return Err(ParseError::InvalidOption(format!(
                    "unknown escape `\\{other}` in {raw}"
                )));
            }
        }
    }
    Ok(out)
}
