
use hbs_engine::{json, Block, Error, Helper, HelperMissing, HelperScope, Value, FUNCTION_MARKER};
use std::cell::RefCell;
use std::rc::Rc;
use support::{engine, recorder, render};

fn options_of(call: &[Value]) -> &Value {
    call.last().expect("options argument")
}

#[test]
fn rust_helpers_receive_context_params_and_options() {
    let engine = engine();
    let (helper, calls) = recorder(json!("out"));
    engine.register_helper("helper", helper).unwrap();

    let output = render(&engine, "{{helper 1 \"two\" key=who}}", json!({ "who": "Zach" }));
    assert_eq!(output, "out");

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call[0], json!({ "who": "Zach" }));
    assert_eq!(call[1], json!(1));
    assert_eq!(call[2], json!("two"));

    let options = options_of(call);
    assert_eq!(options["name"], json!("helper"));
    assert_eq!(options["hash"], json!({ "key": "Zach" }));
    assert_eq!(options["data"]["root"], json!({ "who": "Zach" }));
}

#[test]
fn block_helper_options_mark_functions() {
    let engine = engine();
    let (helper, calls) = recorder(json!(""));
    engine.register_helper("helper", helper).unwrap();

    render(&engine, "{{#helper}}yes{{else}}no{{/helper}}", json!({}));

    let calls = calls.borrow();
    let options = options_of(&calls[0]);
    assert_eq!(options["fn"], json!(FUNCTION_MARKER));
    assert_eq!(options["inverse"], json!(FUNCTION_MARKER));
}

#[test]
fn rust_block_helpers_render_their_bodies() {
    let engine = engine();
    engine
        .register_helper(
            "unless_empty",
            Helper::host(|scope, args| {
                let items = args.get(1).and_then(Value::as_array);
                let output = match items {
                    Some(items) if !items.is_empty() => {
                        let mut output = String::new();
                        for item in items {
                            output.push_str(&scope.block(Block::Main, item)?);
                        }
                        output
                    }
                    _ => scope.block(Block::Inverse, &args[0])?,
                };
                Ok(json!(output))
            }),
        )
        .unwrap();

    let template = "{{#unless_empty items}}[{{name}}]{{else}}none for {{who}}{{/unless_empty}}";
    let full = json!({ "items": [{ "name": "a" }, { "name": "b" }], "who": "Zach" });
    let empty = json!({ "items": [], "who": "Zach" });
    assert_eq!(render(&engine, template, full), "[a][b]");
    assert_eq!(render(&engine, template, empty), "none for Zach");
}

#[test]
fn rust_helper_errors_fail_the_render() {
    let engine = engine();
    engine
        .register_helper("fail", Helper::host(|_, _| Err(Error::helper("helper broke"))))
        .unwrap();

    let renderer = engine.compile("{{fail 1}}").unwrap();
    let err = renderer.render(&json!({})).unwrap_err();
    assert_eq!(err.script_message(), Some("helper broke"));
}

#[test]
fn script_helpers_see_this_and_attached_functions() {
    let engine = engine();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&seen);
    engine
        .attach("tester", move |_, args| {
            recorded.borrow_mut().push(args.to_vec());
            Ok(json!("from rust"))
        })
        .unwrap();
    engine
        .register_helper(
            "helper",
            Helper::script("function (suffix, options) { return tester(this.name, suffix) + '!'; }"),
        )
        .unwrap();

    let output = render(&engine, "{{helper \"x\"}}", json!({ "name": "Zach" }));
    assert_eq!(output, "from rust!");
    assert_eq!(*seen.borrow(), vec![vec![json!("Zach"), json!("x")]]);
}

#[test]
fn script_block_helpers_choose_a_branch() {
    let engine = engine();
    engine
        .register_helper(
            "helper",
            Helper::script(
                "function (flag, options) { return flag ? options.fn(this) : options.inverse(this); }",
            ),
        )
        .unwrap();

    let template = "{{#helper flag}}function{{else}}inverse{{/helper}}";
    assert_eq!(render(&engine, template, json!({ "flag": true })), "function");
    assert_eq!(render(&engine, template, json!({ "flag": false })), "inverse");
}

#[test]
fn latest_registration_wins() {
    let engine = engine();
    engine.register_helper("pick", Helper::host(|_, _| Ok(json!("rust")))).unwrap();
    engine.register_helper("pick", Helper::script("function () { return 'js'; }")).unwrap();
    assert_eq!(render(&engine, "{{pick 1}}", json!({})), "js");

    engine.register_helper("pick", Helper::host(|_, _| Ok(json!("rust")))).unwrap();
    assert_eq!(render(&engine, "{{pick 1}}", json!({})), "rust");
}

#[test]
fn helpers_register_in_batches() {
    let engine = engine();
    engine
        .register_helpers([
            ("upper", Helper::script("function (s) { return s.toUpperCase(); }")),
            ("exclaim", Helper::host(|_, args| Ok(json!(format!("{}!", args[1].as_str().unwrap_or_default()))))),
        ])
        .unwrap();
    let output = render(&engine, "{{upper word}} {{exclaim word}}", json!({ "word": "hi" }));
    assert_eq!(output, "HI hi!");
}

#[test]
fn unregistered_helpers_fall_back_to_defaults() {
    let engine = engine();
    engine.register_helper("helper", Helper::host(|_, _| Ok(json!("here")))).unwrap();
    assert_eq!(render(&engine, "{{helper 1}}", json!({})), "here");

    engine.unregister_helper("helper").unwrap();

    let err = engine.compile("{{helper 1}}").unwrap().render(&json!({})).unwrap_err();
    let message = err.script_message().expect("script error");
    assert!(message.contains("Missing helper: \"helper\""), "{message}");
    assert_eq!(render(&engine, "{{helper}}", json!({})), "");
}

// ============================================================================
// Missing helpers
// ============================================================================

#[test]
fn helper_missing_hook_sees_the_unresolved_name() {
    let engine = engine();
    let names = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&names);
    engine
        .register_helper_missing(HelperMissing::Basic, move |_, args| {
            let options = args.last().cloned().unwrap_or_default();
            let name = options["name"].as_str().unwrap_or_default().to_string();
            recorded.borrow_mut().push(name.clone());
            Ok(json!(format!("<{name}:{}>", args.len())))
        })
        .unwrap();

    let output = render(&engine, "{{nope}} {{gone 1 2}}", json!({}));
    assert_eq!(output, "&lt;nope:2&gt; &lt;gone:4&gt;");
    assert_eq!(*names.borrow(), vec!["nope".to_string(), "gone".to_string()]);
}

#[test]
fn helper_missing_hook_is_not_called_for_resolvable_names() {
    let engine = engine();
    let calls = Rc::new(RefCell::new(0));
    let counted = Rc::clone(&calls);
    engine
        .register_helper_missing(HelperMissing::Basic, move |_, _| {
            *counted.borrow_mut() += 1;
            Ok(Value::Null)
        })
        .unwrap();

    assert_eq!(render(&engine, "{{name}}", json!({ "name": "Zach" })), "Zach");
    assert_eq!(*calls.borrow(), 0);
}

fn counting_hook(engine: &hbs_engine::Engine, kind: HelperMissing) -> Rc<RefCell<u32>> {
    let calls = Rc::new(RefCell::new(0));
    let counted = Rc::clone(&calls);
    engine
        .register_helper_missing(kind, move |_, _| {
            *counted.borrow_mut() += 1;
            Ok(json!(""))
        })
        .unwrap();
    calls
}

#[test]
fn basic_hook_in_blocks_only_runs_for_unresolved_names() {
    let engine = engine();
    let calls = counting_hook(&engine, HelperMissing::Basic);

    render(&engine, "{{#helper}}{{/helper}}", json!({}));
    assert_eq!(*calls.borrow(), 1);

    render(&engine, "{{#helper}}{{/helper}}", json!({ "helper": "missing" }));
    assert_eq!(*calls.borrow(), 1);

    render(&engine, "{{#helper name}}{{/helper}}", json!({}));
    assert_eq!(*calls.borrow(), 2);

    let result = engine
        .compile("{{#helper name}}{{/helper}}")
        .unwrap()
        .render(&json!({ "helper": "missing" }));
    assert!(result.is_err());
}

#[test]
fn block_hook_runs_for_plain_blocks_only() {
    let engine = engine();
    let calls = counting_hook(&engine, HelperMissing::Block);

    render(&engine, "{{#helper}}{{/helper}}", json!({}));
    render(&engine, "{{#helper}}{{/helper}}", json!({ "helper": "missing" }));
    assert_eq!(*calls.borrow(), 2);

    for context in [json!({}), json!({ "helper": "missing" })] {
        let result = engine
            .compile("{{#helper name}}{{/helper}}")
            .unwrap()
            .render(&context);
        assert!(result.is_err());
    }
    assert_eq!(*calls.borrow(), 2);
}

#[test]
fn block_helper_missing_hook_handles_plain_blocks() {
    let engine = engine();
    engine
        .register_helper_missing(HelperMissing::Block, |scope, args| {
            let value = args.get(1).cloned().unwrap_or_default();
            let options = args.last().cloned().unwrap_or_default();
            let body = scope.block(Block::Main, &args[0])?;
            Ok(json!(format!("{}={value}:{body}", options["name"].as_str().unwrap_or_default())))
        })
        .unwrap();

    let output = render(&engine, "{{#section}}body {{who}}{{/section}}", json!({ "section": 3, "who": "Zach" }));
    assert_eq!(output, "section=3:body Zach");
}

#[test]
fn removing_helper_missing_restores_the_default() {
    let engine = engine();
    engine
        .register_helper_missing(HelperMissing::Basic, |_, _| Ok(json!("hooked")))
        .unwrap();
    assert_eq!(render(&engine, "{{nope 1}}", json!({})), "hooked");

    engine.unregister_helper_missing(HelperMissing::Basic).unwrap();
    let result = engine.compile("{{nope 1}}").unwrap().render(&json!({}));
    assert!(result.is_err());
    assert_eq!(render(&engine, "{{nope}}", json!({})), "");
}

#[test]
fn removing_block_helper_missing_breaks_plain_blocks() {
    let engine = engine();
    engine
        .register_helper_missing(HelperMissing::Block, |_, _| Ok(json!("hooked")))
        .unwrap();
    assert_eq!(render(&engine, "{{#flag}}on{{/flag}}", json!({ "flag": true })), "hooked");

    engine.unregister_helper_missing(HelperMissing::Block).unwrap();
    let err = engine
        .compile("{{#flag}}on{{/flag}}")
        .unwrap()
        .render(&json!({ "flag": true }))
        .unwrap_err();
    assert!(err.script_message().is_some());
}
