use std::sync::Once;

use anyhow::Result;
use declarg_argparse::{
    ArgumentOptions, DefinitionError, DefinitionRegistry, Error, FlagKind, FlagOptions,
    ParsedOutput, ParserOverrides, Registries, ValidationError,
};
use indexmap::IndexMap;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn flags(entries: &[(&str, Value)]) -> IndexMap<String, Option<Value>> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.clone())))
        .collect()
}

fn uppercase(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        Value::Array(items) => Value::Array(items.into_iter().map(uppercase).collect()),
        other => other,
    }
}

fn make_model_flags() -> Result<DefinitionRegistry> {
    let mut reg = DefinitionRegistry::new("MakeModel");
    reg.define_flag("connection", FlagOptions::string())?;
    reg.define_flag("dropAll", FlagOptions::boolean())?;
    reg.define_flag("batchSize", FlagOptions::number())?;
    reg.define_flag("files", FlagOptions::array())?;
    Ok(reg)
}

#[test]
fn parse_flags_from_all_datatypes() -> Result<()> {
    init_tracing();
    let parser = make_model_flags()?.parser();

    let output = parser.parse_str("--connection=sqlite --drop-all --batch-size=1 --files=a,b");
    assert_eq!(
        output,
        ParsedOutput {
            flags: flags(&[
                ("batch-size", json!(1)),
                ("connection", json!("sqlite")),
                ("drop-all", json!(true)),
                ("files", json!(["a,b"])),
            ]),
            ..Default::default()
        }
    );

    let output = parser.parse_str("--files=a --files=b");
    assert_eq!(
        output,
        ParsedOutput {
            flags: flags(&[("files", json!(["a", "b"]))]),
            ..Default::default()
        }
    );
    Ok(())
}

#[test]
fn use_default_value_when_argument_is_not_mentioned() -> Result<()> {
    let mut reg = DefinitionRegistry::new("MakeModel");
    reg.define_argument("name", ArgumentOptions::string())?;
    reg.define_argument(
        "connections",
        ArgumentOptions::spread().default_value(json!(["sqlite"])),
    )?;

    let output = reg.parser().parse(["user"]);
    assert_eq!(output.args, [Some(json!("user")), Some(json!(["sqlite"]))]);
    assert!(output.rest.is_empty());
    assert!(output.unknown_flags.is_empty());
    assert!(output.flags.is_empty());
    Ok(())
}

#[test]
fn explicit_empty_string_is_not_replaced_by_default() -> Result<()> {
    let mut reg = DefinitionRegistry::new("MakeModel");
    reg.define_argument("name", ArgumentOptions::string())?;
    reg.define_argument(
        "connections",
        ArgumentOptions::spread().default_value(json!(["sqlite"])),
    )?;

    let output = reg.parser().parse(["user", ""]);
    assert_eq!(output.args, [Some(json!("user")), Some(json!([""]))]);

    // Same through a quoted command line.
    let output = reg.parser().parse_str("user \"\"");
    assert_eq!(output.args, [Some(json!("user")), Some(json!([""]))]);
    Ok(())
}

#[test]
fn transforms_apply_to_values() -> Result<()> {
    let mut reg = DefinitionRegistry::new("MakeModel");
    reg.define_argument("name", ArgumentOptions::string().transform(uppercase))?;
    reg.define_argument("connections", ArgumentOptions::spread().transform(uppercase))?;

    let output = reg.parser().parse(["user", "sqlite", "pg"]);
    assert_eq!(output.args, [Some(json!("USER")), Some(json!(["SQLITE", "PG"]))]);
    Ok(())
}

#[test]
fn transforms_apply_to_defaults() -> Result<()> {
    let mut reg = DefinitionRegistry::new("MakeModel");
    reg.define_argument(
        "name",
        ArgumentOptions::string()
            .default_value("post")
            .transform(uppercase),
    )?;
    reg.define_argument(
        "connections",
        ArgumentOptions::spread()
            .default_value(json!(["sqlite"]))
            .transform(uppercase),
    )?;

    let output = reg.parser().parse(Vec::<String>::new());
    assert_eq!(output.args, [Some(json!("POST")), Some(json!(["SQLITE"]))]);
    Ok(())
}

#[test]
fn transforms_are_skipped_for_undefined_values() -> Result<()> {
    let mut reg = DefinitionRegistry::new("MakeModel");
    let never = |_: Value| -> Value { panic!("transform called on undefined value") };
    reg.define_argument("name", ArgumentOptions::string().transform(never))?;
    reg.define_argument("connections", ArgumentOptions::spread().transform(never))?;

    let output = reg.parser().parse(Vec::<String>::new());
    assert_eq!(output.args, [None, None]);
    Ok(())
}

#[test]
fn spread_scalar_default_is_wrapped() -> Result<()> {
    let mut reg = DefinitionRegistry::new("MakeModel");
    reg.define_argument("name", ArgumentOptions::string())?;
    reg.define_argument("connections", ArgumentOptions::spread().default_value(1))?;

    let output = reg.parser().parse(Vec::<String>::new());
    assert_eq!(output.args, [None, Some(json!([1]))]);
    Ok(())
}

#[test]
fn defaults_keep_their_own_type() -> Result<()> {
    let mut reg = DefinitionRegistry::new("MakeModel");
    reg.define_argument("name", ArgumentOptions::string().default_value(Value::Null))?;
    reg.define_argument("connections", ArgumentOptions::spread().default_value(1))?;

    let output = reg.parser().parse(Vec::<String>::new());
    assert_eq!(output.args, [Some(Value::Null), Some(json!([1]))]);
    Ok(())
}

#[test]
fn missing_required_argument_round_trip() -> Result<()> {
    let mut reg = DefinitionRegistry::new("Greet");
    reg.define_argument("name", ArgumentOptions::string())?;

    let output = reg.parser().parse(Vec::<String>::new());
    assert_eq!(output.args, [None]);

    let err = reg.validate(&output).unwrap_err();
    assert_eq!(
        err,
        ValidationError::MissingArgument {
            name: "name".to_string()
        }
    );

    let err = reg.parse(Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::MissingArgument { .. })));
    assert_eq!(err.code(), "E_MISSING_ARG");
    Ok(())
}

#[test]
fn leftover_tokens_become_rest() -> Result<()> {
    let mut reg = DefinitionRegistry::new("Make");
    reg.define_argument("kind", ArgumentOptions::string())?;

    let output = reg.parse(["model", "user", "--", "--force"])?;
    assert_eq!(output.args, [Some(json!("model"))]);
    assert_eq!(output.rest, ["user", "--force"]);
    Ok(())
}

#[test]
fn any_argument_after_spread_fails() -> Result<()> {
    let leading: [&[bool]; 3] = [&[], &[true], &[true, false]];
    for required in leading {
        let mut reg = DefinitionRegistry::new("Cmd");
        for (i, &req) in required.iter().enumerate() {
            reg.define_argument(format!("arg{i}"), ArgumentOptions::string().required(req))?;
        }
        reg.define_argument("tail", ArgumentOptions::spread().optional())?;

        for next in [
            ArgumentOptions::string(),
            ArgumentOptions::string().optional(),
            ArgumentOptions::spread(),
        ] {
            let err = reg.define_argument("after", next).unwrap_err();
            assert!(matches!(err, DefinitionError::InvalidOrdering { .. }), "{err:?}");
        }
    }
    Ok(())
}

#[test]
fn required_after_optional_fails_anywhere() -> Result<()> {
    for required_prefix in 0..3 {
        let mut reg = DefinitionRegistry::new("Cmd");
        for i in 0..required_prefix {
            reg.define_argument(format!("req{i}"), ArgumentOptions::string())?;
        }
        // Required right after required is fine at any position.
        reg.define_argument("more", ArgumentOptions::string())?;
        reg.define_argument("opt", ArgumentOptions::string().optional())?;

        let err = reg
            .define_argument("late", ArgumentOptions::string())
            .unwrap_err();
        assert_eq!(err.code(), "E_INVALID_ARGUMENT_ORDER");
        assert_eq!(reg.args().len(), required_prefix + 2);
    }
    Ok(())
}

#[test]
fn validation_of_full_command() -> Result<()> {
    init_tracing();
    let mut reg = make_model_flags()?;
    reg.define_argument("name", ArgumentOptions::string())?;
    reg.define_flag("env", FlagOptions::string().required(true).alias("e"))?;

    let parsed = reg.parse(["user", "-e", "dev", "--batch-size", "20"])?;
    assert_eq!(parsed.flag("env"), Some(&json!("dev")));
    assert_eq!(parsed.flag("batch-size"), Some(&json!(20)));

    let err = reg.parse(["user"]).unwrap_err();
    assert_eq!(
        err,
        Error::Validation(ValidationError::MissingFlag {
            name: "env".to_string()
        })
    );

    let err = reg.parse(["user", "--env=dev", "--batch-size=many"]).unwrap_err();
    assert_eq!(err.code(), "E_INVALID_FLAG");

    let err = reg.parse(["user", "--env=dev", "--batch-size"]).unwrap_err();
    assert_eq!(err.code(), "E_MISSING_FLAG_VALUE");

    let err = reg.parse(["user", "--env="]).unwrap_err();
    assert_eq!(err.code(), "E_MISSING_FLAG_VALUE");

    let err = reg.parse(["user", "--env=dev", "--verbose"]).unwrap_err();
    assert_eq!(
        err,
        Error::Validation(ValidationError::UnknownFlag {
            name: "--verbose".to_string()
        })
    );

    reg.allow_unknown_flags(true);
    let parsed = reg.parse(["user", "--env=dev", "--verbose", "-q"])?;
    assert_eq!(parsed.unknown_flags, ["verbose", "q"]);
    Ok(())
}

#[test]
fn flag_defaults_and_negation() -> Result<()> {
    let mut reg = DefinitionRegistry::new("Serve");
    reg.define_flag("watch", FlagOptions::boolean().default_value(true))?;
    reg.define_flag("port", FlagOptions::number().default_value(3333))?;

    let parsed = reg.parse(Vec::<String>::new())?;
    assert_eq!(parsed.flag("watch"), Some(&json!(true)));
    assert_eq!(parsed.flag("port"), Some(&json!(3333)));

    let parsed = reg.parse(["--no-watch", "--port=8080"])?;
    assert_eq!(parsed.flag("watch"), Some(&json!(false)));
    assert_eq!(parsed.flag("port"), Some(&json!(8080)));
    Ok(())
}

#[test]
fn overrides_extend_the_tokenizer_config() -> Result<()> {
    let mut reg = DefinitionRegistry::new("Serve");
    reg.define_flag("host", FlagOptions::string())?;

    let overrides = ParserOverrides {
        count: vec!["v".to_string()],
        all: vec!["v".to_string()],
        ..Default::default()
    };
    let parser = declarg_argparse::Parser::new(reg.parser_options(Some(&overrides)));
    let parsed = parser.parse(["-vv", "--host", "0.0.0.0"]);
    assert_eq!(parsed.flag("v"), Some(&json!(2)));
    assert_eq!(parsed.flag("host"), Some(&json!("0.0.0.0")));
    assert!(parsed.unknown_flags.is_empty());
    reg.validate(&parsed)?;
    Ok(())
}

#[test]
fn derived_commands_extend_their_base() -> Result<()> {
    let mut registries = Registries::new();
    {
        let base = registries.command("BaseMake");
        base.define_flag("force", FlagOptions::boolean())?;
        base.define_argument("name", ArgumentOptions::string())?;
    }
    {
        let model = registries.derive("MakeModel", "BaseMake")?;
        model.set_command_name("make:model");
        model.define_flag("migration", FlagOptions::boolean().alias("m"))?;
    }

    let model = registries.get("MakeModel").expect("derived registry");
    let parsed = model.parse(["user", "-m", "--force"])?;
    assert_eq!(parsed.arg(0), Some(&json!("user")));
    assert_eq!(parsed.flag("migration"), Some(&json!(true)));
    assert_eq!(parsed.flag("force"), Some(&json!(true)));

    let base = registries.get("BaseMake").expect("base registry");
    let err = base.parse(["user", "-m"]).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::UnknownFlag { name }) if name == "-m"));
    Ok(())
}

#[test]
fn metadata_describes_the_command() -> Result<()> {
    let mut reg = DefinitionRegistry::new("MakeModel");
    reg.set_command_name("make:model")
        .set_description("Make a new model");
    reg.define_argument("name", ArgumentOptions::string().transform(uppercase))?;
    reg.define_flag("dropAll", FlagOptions::boolean())?;

    let meta = reg.serialize()?;
    assert_eq!(meta.namespace.as_deref(), Some("make"));
    assert_eq!(meta.bare_name(), "model");

    let json = serde_json::to_value(&meta)?;
    assert_eq!(json["args"][0]["argument-name"], json!("name"));
    assert_eq!(json["flags"][0]["flag-name"], json!("drop-all"));
    assert!(json["args"][0].get("transform").is_none());
    Ok(())
}

#[test]
fn parsed_output_serializes_for_hosts() -> Result<()> {
    let mut reg = DefinitionRegistry::new("Greet");
    reg.define_argument("name", ArgumentOptions::string().optional())?;
    let parsed = reg.parser().parse(Vec::<String>::new());

    let json = serde_json::to_value(&parsed)?;
    assert_eq!(
        json,
        json!({"args": [null], "flags": {}, "unknown-flags": [], "rest": []})
    );
    Ok(())
}

#[test]
fn parsers_can_be_shared_across_threads() -> Result<()> {
    let mut reg = DefinitionRegistry::new("Greet");
    reg.define_argument("name", ArgumentOptions::string().transform(uppercase))?;
    let parser = reg.parser();

    std::thread::scope(|scope| {
        let handles: Vec<_> = ["ada", "grace", "barbara"]
            .into_iter()
            .map(|name| {
                let parser = &parser;
                scope.spawn(move || parser.parse([name]))
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(["ADA", "GRACE", "BARBARA"]) {
            let parsed = handle.join().expect("parser thread panicked");
            assert_eq!(parsed.arg(0), Some(&json!(expected)));
        }
    });
    Ok(())
}

#[test]
fn number_flags_accept_string_defaults_and_transforms() -> Result<()> {
    init_tracing();
    let mut reg = DefinitionRegistry::new("Serve");
    reg.define_flag("port", FlagOptions::number().default_value("auto"))?;
    let parsed = reg.parse(Vec::<String>::new())?;
    assert_eq!(parsed.flag("port"), Some(&json!("auto")));

    let mut reg = DefinitionRegistry::new("Serve");
    reg.define_flag(
        "port",
        FlagOptions::number().transform(|v| json!(format!(":{v}"))),
    )?;
    let parsed = reg.parse(["--port=8080"])?;
    assert_eq!(parsed.flag("port"), Some(&json!(":8080")));

    let err = reg.parse(["--port=eighty"]).unwrap_err();
    assert_eq!(
        err,
        Error::Validation(ValidationError::InvalidFlag {
            name: "port".to_string(),
            expected: FlagKind::Number,
        })
    );

    let parsed = reg.parse(["--port=eighty", "--port=80"])?;
    assert_eq!(parsed.flag("port"), Some(&json!(":80")));
    assert!(parsed.invalid_flags.is_empty());
    Ok(())
}

#[test]
fn undeclared_short_flags_take_attached_numbers() -> Result<()> {
    let mut reg = DefinitionRegistry::new("Tail");
    reg.allow_unknown_flags(true);
    let parsed = reg.parse(["-n5", "-vq"])?;
    assert_eq!(parsed.flag("n"), Some(&json!(5)));
    assert_eq!(parsed.flag("v"), Some(&json!(true)));
    assert_eq!(parsed.flag("q"), Some(&json!(true)));
    assert_eq!(parsed.unknown_flags, ["n", "v", "q"]);
    Ok(())
}

#[test]
fn nameless_flag_tokens_are_positional() -> Result<()> {
    let mut reg = DefinitionRegistry::new("Echo");
    reg.define_argument("words", ArgumentOptions::spread().optional())?;
    let err = reg.parse(["--=x", "-=y", "--name=z"]).unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::UnknownFlag { name }) if name == "--name"
    ));

    let parsed = reg.parse(["--=x", "-=y"])?;
    assert_eq!(parsed.arg(0), Some(&json!(["--=x", "-=y"])));
    assert!(parsed.flags.is_empty());
    assert!(parsed.unknown_flags.is_empty());
    Ok(())
}
