use std::path::PathBuf;

use hessian2_generator::ir::{Hessian2File, Message};
use hessian2_generator::{GenerateError, GeneratorConfig, generate, load_pool};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> GeneratorConfig {
    GeneratorConfig {
        include_paths: vec![PathBuf::from("tests/resources")],
        ..Default::default()
    }
}

fn message<'r, 'a>(ir: &'r Hessian2File<'a>, name: &str) -> &'r Message<'a> {
    ir.messages
        .iter()
        .find(|m| m.name() == name)
        .unwrap_or_else(|| panic!("missing message {name}"))
}

fn field_row<'r>(msg: &'r Message<'_>, name: &str) -> (&'r str, &'r str) {
    let f = msg
        .fields
        .iter()
        .find(|f| f.name() == name)
        .unwrap_or_else(|| panic!("missing field {name}"));
    (f.type_name.as_str(), f.default_value.as_str())
}

#[test]
fn e2e_generate_shop_ir() {
    init_tracing();
    let config = config();
    let pool = load_pool(&config, &["shop.proto"]).expect("load should succeed");
    let report = generate(&pool, &["shop.proto"], &config);
    assert!(report.is_success(), "unexpected failures: {:?}", report.failed);
    assert_eq!(report.generated.len(), 1);

    let output = &report.generated[0];
    assert_eq!(output.file.filename(), "example.com/shop/v1/shop.hessian2.go");
    let ir = &output.ir;
    assert_eq!(ir.source, "shop.proto");
    assert_eq!(ir.proto_package, "shop.v1");

    // declaration order is preserved
    let enums: Vec<(&str, &str)> = ir
        .enums
        .iter()
        .map(|e| (e.name(), e.java_class_name.as_str()))
        .collect();
    assert_eq!(
        enums,
        vec![("OrderStatus", "com.example.shop.OrderStatus"), ("Channel", "")]
    );
    let messages: Vec<&str> = ir.messages.iter().map(|m| m.name()).collect();
    assert_eq!(messages, vec!["Point", "Order", "CreateOrderArgs"]);

    // Point scenario
    let point = message(ir, "Point");
    assert_eq!(point.java_class_name, "com.example.Point");
    assert_eq!(field_row(point, "x"), ("int32", "0"));
    assert_eq!(field_row(point, "y"), ("int32", "0"));

    let order = message(ir, "Order");
    assert_eq!(order.java_class_name, "com.example.shop.Order");
    assert!(!order.is_inheritance);
    assert!(!order.extend_args);

    let field_names: Vec<&str> = order.fields.iter().map(|f| f.name()).collect();
    assert_eq!(
        field_names,
        vec![
            "id",
            "status",
            "lines",
            "shipping",
            "billing",
            "tags",
            "total_cents",
            "channel",
            "location",
            "total"
        ]
    );
    assert_eq!(field_row(order, "id"), ("string", "\"\""));
    assert_eq!(field_row(order, "status"), ("OrderStatus", "OrderStatus_UNKNOWN"));
    assert_eq!(field_row(order, "lines"), ("[]*Order_Line", "nil"));
    // reference_path redirects the type to another Go module
    assert_eq!(field_row(order, "shipping"), ("*y.Address", "nil"));
    // and a wrapper still adds its pointer on top
    assert_eq!(field_row(order, "billing"), ("**y.Address", "nil"));
    assert_eq!(field_row(order, "tags"), ("map[string]string", "nil"));
    assert_eq!(field_row(order, "total_cents"), ("*int64", "nil"));
    assert_eq!(field_row(order, "channel"), ("Channel", "Channel_WEB"));
    assert_eq!(field_row(order, "location"), ("*Point", "nil"));
    assert_eq!(field_row(order, "total"), ("*common.Money", "nil"));

    let go_names: Vec<&str> = order.fields.iter().map(|f| f.go_name.as_str()).collect();
    assert_eq!(go_names[6], "TotalCents");

    // nested messages: inheritance marked on the nested node, map entry is a shell
    let inner: Vec<(&str, bool)> = order
        .inner_messages
        .iter()
        .map(|m| (m.name(), m.is_inheritance))
        .collect();
    assert_eq!(
        inner,
        vec![("Base", true), ("Line", false), ("TagsEntry", false)]
    );
    let line = &order.inner_messages[1];
    assert_eq!(line.go_name, "Order_Line");
    assert_eq!(line.java_class_name, "com.example.shop.Order$Line");
    assert_eq!(field_row(line, "price"), ("float64", "0"));
    let tags_entry = &order.inner_messages[2];
    assert!(tags_entry.is_map_entry());
    assert!(tags_entry.fields.is_empty());
    assert!(tags_entry.inner_messages.is_empty());
    assert_eq!(tags_entry.java_class_name, "");

    let args = message(ir, "CreateOrderArgs");
    assert!(args.extend_args);
    assert_eq!(args.java_class_name, "");
    assert_eq!(field_row(args, "order"), ("*Order", "nil"));
    assert_eq!(field_row(args, "dry_run"), ("bool", "false"));

    assert_eq!(
        output.file.imports(),
        vec![
            ("github.com/x/y".to_string(), "y".to_string()),
            ("example.com/common".to_string(), "common".to_string()),
        ]
    );
}

#[test]
fn import_mappings_override_go_package() {
    let mut config = config();
    config.import_mappings.insert(
        "common/types.proto".to_string(),
        "example.com/mapped/money;money".to_string(),
    );
    let pool = load_pool(&config, &["shop.proto"]).expect("load should succeed");
    let report = generate(&pool, &["shop.proto"], &config);
    let order = message(&report.generated[0].ir, "Order");
    assert_eq!(field_row(order, "total"), ("*money.Money", "nil"));
    // reference_path wins over any mapping
    assert_eq!(field_row(order, "shipping"), ("*y.Address", "nil"));
}

#[test]
fn failing_file_is_reported_and_others_still_generate() {
    init_tracing();
    let config = config();
    let files = ["broken.proto", "shop.proto", "missing.proto"];
    let pool = load_pool(&config, &files[..2]).expect("load should succeed");
    let report = generate(&pool, &files, &config);

    assert!(!report.is_success());
    assert_eq!(report.generated.len(), 1);
    assert_eq!(report.generated[0].ir.source, "shop.proto");

    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[0].file, "broken.proto");
    assert!(matches!(
        report.failed[0].error,
        GenerateError::MissingJavaClassName { ref message } if message == "broken.Unnamed"
    ));
    assert!(matches!(
        report.failed[1].error,
        GenerateError::UnknownFile(ref f) if f == "missing.proto"
    ));
}

#[test]
fn ir_serializes_for_templates() {
    let config = config();
    let pool = load_pool(&config, &["shop.proto"]).expect("load should succeed");
    let report = generate(&pool, &["shop.proto"], &config);
    let json = report.generated[0].ir.to_json().expect("json");

    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["proto_package"], "shop.v1");
    assert_eq!(value["messages"][1]["java_class_name"], "com.example.shop.Order");
    assert_eq!(value["messages"][1]["proto"], "shop.v1.Order");
    assert_eq!(value["messages"][1]["fields"][4]["type_name"], "**y.Address");
    assert_eq!(value["messages"][1]["fields"][4]["proto"]["number"], 5);
    assert_eq!(value["enums"][1]["java_class_name"], "");
}
