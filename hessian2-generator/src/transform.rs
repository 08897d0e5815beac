//! Descriptor to IR transformation.
//!
//! Files are walked top-down (enums, then messages); messages recurse into
//! their nested messages before resolving their own fields, so nested IR
//! nodes exist by the time the parent marks inheritance on them.

use parser::{DescriptorPool, EnumDescriptor, FieldDescriptor, FileDescriptor, MessageDescriptor};
use tracing::debug;

use crate::error::GenerateError;
use crate::ident::{GeneratedFile, GoIdent, GoImportPath, GoPackages};
use crate::ir::{Enum, Field, Hessian2File, Message};
use crate::naming::go_camel_case;

/// Builds IR for descriptors of lifetime `'a` using the naming and
/// qualification helpers borrowed for `'g`.
pub struct Transformer<'a, 'g> {
    pub(crate) pool: &'a DescriptorPool,
    pub(crate) packages: &'g GoPackages<'a>,
    pub(crate) out: &'g GeneratedFile,
}

impl<'a, 'g> Transformer<'a, 'g> {
    pub fn new(
        pool: &'a DescriptorPool,
        packages: &'g GoPackages<'a>,
        out: &'g GeneratedFile,
    ) -> Self {
        Transformer {
            pool,
            packages,
            out,
        }
    }

    pub fn process_file(&self, file: &'a FileDescriptor) -> Result<Hessian2File<'a>, GenerateError> {
        let mut ir = Hessian2File::new(file);

        for e in &file.enums {
            ir.enums.push(self.process_enum(e));
        }
        for m in &file.messages {
            ir.messages.push(self.process_message(m)?);
        }

        debug!(
            file = %file.name,
            enums = ir.enums.len(),
            messages = ir.messages.len(),
            "transformed proto file"
        );
        Ok(ir)
    }

    pub fn process_enum(&self, e: &'a EnumDescriptor) -> Enum<'a> {
        let ident = self.packages.ident(&e.full_name);
        // registers the enum's package with the output file; the IR is unaffected
        self.out.qualified_go_ident(&ident);

        let mut en = Enum::new(e, ident.go_name);
        if let Some(opts) = &e.options {
            en.java_class_name = opts.java_class_name.clone();
        }
        en
    }

    pub fn process_message(&self, m: &'a MessageDescriptor) -> Result<Message<'a>, GenerateError> {
        let mut msg = Message::new(m, self.packages.ident(&m.full_name).go_name);

        if m.map_entry {
            return Ok(msg);
        }

        for inner in &m.messages {
            let mut processed = self.process_message(inner)?;
            if inner.options.as_ref().is_some_and(|o| o.is_inheritance) {
                processed.is_inheritance = true;
            }
            msg.inner_messages.push(processed);
        }

        msg.fields = m.fields.iter().map(|f| self.process_field(f)).collect();

        let Some(opts) = m
            .options
            .as_ref()
            .filter(|o| !o.java_class_name.is_empty() || o.extend_args)
        else {
            return Err(GenerateError::MissingJavaClassName {
                message: m.full_name.clone(),
            });
        };
        msg.java_class_name = opts.java_class_name.clone();
        msg.extend_args = opts.extend_args;

        debug!(
            message = %m.full_name,
            java_class_name = %msg.java_class_name,
            extend_args = msg.extend_args,
            fields = msg.fields.len(),
            "transformed message"
        );
        Ok(msg)
    }

    fn process_field(&self, field: &'a FieldDescriptor) -> Field<'a> {
        // A referenced message living in another Go module is addressed
        // through its reference_path, whatever the normal mapping says.
        let mut type_name = None;
        if let Some(referenced) = field.message_type().and_then(|n| self.pool.message(n))
            && let Some(opts) = &referenced.options
            && !opts.reference_path.is_empty()
        {
            let ident = GoIdent {
                go_name: self.packages.ident(&referenced.full_name).go_name,
                import_path: GoImportPath::parse(&opts.reference_path),
            };
            type_name = Some(format!("*{}", self.out.qualified_go_ident(&ident)));
        }

        let mut type_name = type_name.unwrap_or_else(|| self.go_type(field));
        let mut default_value = self.default_value(field);

        if field.options.as_ref().is_some_and(|o| o.is_wrapper) {
            type_name = format!("*{type_name}");
            default_value = "nil".to_string();
        }

        Field::new(field, go_camel_case(&field.name), type_name, default_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use parser::{
        FieldType, Hessian2EnumOptions, Hessian2FieldOptions, Hessian2MessageOptions, Label,
        ScalarType,
    };

    fn scalar(name: &str, number: u32, ty: ScalarType) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            number,
            label: Label::Optional,
            ty: FieldType::Scalar(ty),
            default_value: None,
            oneof: None,
            options: None,
        }
    }

    fn named(java: &str) -> Option<Hessian2MessageOptions> {
        Some(Hessian2MessageOptions {
            java_class_name: java.to_string(),
            ..Default::default()
        })
    }

    fn message(name: &str, options: Option<Hessian2MessageOptions>) -> MessageDescriptor {
        MessageDescriptor {
            name: name.to_string(),
            full_name: format!("demo.{name}"),
            options,
            ..Default::default()
        }
    }

    fn pool_of(messages: Vec<MessageDescriptor>, enums: Vec<EnumDescriptor>) -> DescriptorPool {
        DescriptorPool::new(vec![FileDescriptor {
            name: "demo/demo.proto".to_string(),
            package: Some("demo".to_string()),
            go_package: Some("example.com/demo;demo".to_string()),
            messages,
            enums,
            ..Default::default()
        }])
        .expect("pool")
    }

    fn with_transformer<'a, R>(
        pool: &'a DescriptorPool,
        f: impl FnOnce(&Transformer<'a, '_>) -> R,
    ) -> R {
        let config = GeneratorConfig::default();
        let packages = GoPackages::new(pool, &config);
        let out = GeneratedFile::new(
            "demo.hessian2.go",
            GoImportPath::parse("example.com/demo;demo"),
        );
        let t = Transformer::new(pool, &packages, &out);
        f(&t)
    }

    #[test]
    fn point_scenario() {
        let mut point = message("Point", named("com.example.Point"));
        point.fields = vec![
            scalar("x", 1, ScalarType::Int32),
            scalar("y", 2, ScalarType::Int32),
        ];
        let pool = pool_of(vec![point], vec![]);

        with_transformer(&pool, |t| {
            let ir = t.process_message(&pool.files()[0].messages[0]).expect("ok");
            assert_eq!(ir.java_class_name, "com.example.Point");
            assert_eq!(ir.go_name, "Point");
            assert!(!ir.extend_args);
            assert!(!ir.is_inheritance);
            let fields: Vec<(&str, &str, &str)> = ir
                .fields
                .iter()
                .map(|f| (f.name(), f.type_name.as_str(), f.default_value.as_str()))
                .collect();
            assert_eq!(fields, vec![("x", "int32", "0"), ("y", "int32", "0")]);
        });
    }

    #[test]
    fn missing_options_is_fatal() {
        let pool = pool_of(vec![message("Bare", None)], vec![]);
        with_transformer(&pool, |t| {
            let err = t.process_message(&pool.files()[0].messages[0]).unwrap_err();
            assert!(
                matches!(err, GenerateError::MissingJavaClassName { ref message } if message == "demo.Bare")
            );
        });
    }

    #[test]
    fn empty_class_name_without_extend_args_is_fatal() {
        let pool = pool_of(vec![message("Empty", named(""))], vec![]);
        with_transformer(&pool, |t| {
            assert!(t.process_message(&pool.files()[0].messages[0]).is_err());
        });
    }

    #[test]
    fn extend_args_exempts_class_name() {
        let opts = Some(Hessian2MessageOptions {
            extend_args: true,
            ..Default::default()
        });
        let pool = pool_of(vec![message("Args", opts)], vec![]);
        with_transformer(&pool, |t| {
            let ir = t.process_message(&pool.files()[0].messages[0]).expect("ok");
            assert!(ir.extend_args);
            assert_eq!(ir.java_class_name, "");
        });
    }

    #[test]
    fn nested_failure_aborts_parent() {
        let mut outer = message("Outer", named("com.example.Outer"));
        outer.messages = vec![MessageDescriptor {
            name: "Inner".to_string(),
            full_name: "demo.Outer.Inner".to_string(),
            ..Default::default()
        }];
        let pool = pool_of(vec![outer], vec![]);
        with_transformer(&pool, |t| {
            let err = t.process_message(&pool.files()[0].messages[0]).unwrap_err();
            assert!(
                matches!(err, GenerateError::MissingJavaClassName { ref message } if message == "demo.Outer.Inner")
            );
        });
    }

    #[test]
    fn inheritance_is_set_on_the_nested_node_only() {
        let mut outer = message("Outer", named("com.example.Outer"));
        outer.messages = vec![MessageDescriptor {
            name: "Base".to_string(),
            full_name: "demo.Outer.Base".to_string(),
            options: Some(Hessian2MessageOptions {
                java_class_name: "com.example.Base".to_string(),
                is_inheritance: true,
                ..Default::default()
            }),
            ..Default::default()
        }];
        let pool = pool_of(vec![outer], vec![]);
        with_transformer(&pool, |t| {
            let ir = t.process_message(&pool.files()[0].messages[0]).expect("ok");
            assert!(!ir.is_inheritance);
            assert_eq!(ir.inner_messages.len(), 1);
            assert!(ir.inner_messages[0].is_inheritance);
            assert_eq!(ir.inner_messages[0].go_name, "Outer_Base");
        });
    }

    #[test]
    fn top_level_inheritance_option_is_not_applied_to_itself() {
        let opts = Some(Hessian2MessageOptions {
            java_class_name: "com.example.Top".to_string(),
            is_inheritance: true,
            ..Default::default()
        });
        let pool = pool_of(vec![message("Top", opts)], vec![]);
        with_transformer(&pool, |t| {
            let ir = t.process_message(&pool.files()[0].messages[0]).expect("ok");
            assert!(!ir.is_inheritance);
        });
    }

    #[test]
    fn map_entry_is_an_empty_shell() {
        let entry = MessageDescriptor {
            name: "TagsEntry".to_string(),
            full_name: "demo.TagsEntry".to_string(),
            fields: vec![
                scalar("key", 1, ScalarType::String),
                scalar("value", 2, ScalarType::String),
            ],
            map_entry: true,
            ..Default::default()
        };
        let pool = pool_of(vec![entry], vec![]);
        with_transformer(&pool, |t| {
            let ir = t.process_message(&pool.files()[0].messages[0]).expect("never fails");
            assert!(ir.fields.is_empty());
            assert!(ir.inner_messages.is_empty());
            assert_eq!(ir.java_class_name, "");
            assert!(ir.is_map_entry());
        });
    }

    #[test]
    fn wrapper_adds_one_pointer_and_nil_default() {
        let wrapper = Some(Hessian2FieldOptions { is_wrapper: true });
        let mut msg = message("Opt", named("com.example.Opt"));
        msg.fields = vec![
            FieldDescriptor {
                options: wrapper.clone(),
                ..scalar("count", 1, ScalarType::Int64)
            },
            FieldDescriptor {
                options: wrapper.clone(),
                ..scalar("label", 2, ScalarType::String)
            },
            FieldDescriptor {
                options: wrapper,
                label: Label::Repeated,
                ..scalar("ids", 3, ScalarType::Int32)
            },
            FieldDescriptor {
                options: Some(Hessian2FieldOptions { is_wrapper: false }),
                ..scalar("plain", 4, ScalarType::Bool)
            },
        ];
        let pool = pool_of(vec![msg], vec![]);
        with_transformer(&pool, |t| {
            let ir = t.process_message(&pool.files()[0].messages[0]).expect("ok");
            let got: Vec<(&str, &str)> = ir
                .fields
                .iter()
                .map(|f| (f.type_name.as_str(), f.default_value.as_str()))
                .collect();
            assert_eq!(
                got,
                vec![
                    ("*int64", "nil"),
                    ("*string", "nil"),
                    ("*[]int32", "nil"),
                    ("bool", "false"),
                ]
            );
        });
    }

    #[test]
    fn enum_class_name_is_optional() {
        let plain = EnumDescriptor {
            name: "Plain".to_string(),
            full_name: "demo.Plain".to_string(),
            ..Default::default()
        };
        let named = EnumDescriptor {
            name: "Color".to_string(),
            full_name: "demo.Color".to_string(),
            options: Some(Hessian2EnumOptions {
                java_class_name: "com.example.Color".to_string(),
            }),
            ..Default::default()
        };
        let present_but_empty = EnumDescriptor {
            name: "Blank".to_string(),
            full_name: "demo.Blank".to_string(),
            options: Some(Hessian2EnumOptions::default()),
            ..Default::default()
        };
        let pool = pool_of(vec![], vec![plain, named, present_but_empty]);
        with_transformer(&pool, |t| {
            let enums = &pool.files()[0].enums;
            assert_eq!(t.process_enum(&enums[0]).java_class_name, "");
            assert_eq!(t.process_enum(&enums[1]).java_class_name, "com.example.Color");
            assert_eq!(t.process_enum(&enums[2]).java_class_name, "");
            assert!(t.out.imports().is_empty());
        });
    }
}
