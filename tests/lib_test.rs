//! Library integration tests.

use asmgen::AsmgenError;

#[test]
fn error_types_are_public() {
    let err = AsmgenError::SetupFailure {
        package: "cpp2il".into(),
        message: "download failed".into(),
    };
    assert!(err.to_string().contains("cpp2il"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> asmgen::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use asmgen::cli::{Cli, Commands};
    use clap::Parser;

    let cli = Cli::parse_from(["asmgen", "status", "--json"]);

    if let Some(Commands::Status(args)) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected Status command");
    }
}

#[test]
fn pipeline_types_are_public() {
    use asmgen::pipeline::{RunState, Stage};

    assert_eq!(Stage::Migrate.to_string(), "migrate");
    assert!(RunState::Failed(Stage::Setup).is_terminal());
    assert!(!RunState::Regenerating.is_terminal());
}
