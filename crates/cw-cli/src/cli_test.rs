use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    Cli::command().debug_assert();
}

#[test]
fn test_run_flags() {
    let cli = Cli::try_parse_from(["cw", "run", "--replay", "20250101T000000000", "--no-audit"])
        .unwrap();
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.replay.as_deref(), Some("20250101T000000000"));
            assert!(args.no_audit);
        }
        other => panic!("unexpected command {:?}", other),
    }
    assert_eq!(cli.global.config, "campus.yml");
}

#[test]
fn test_global_args_after_subcommand() {
    let cli = Cli::try_parse_from(["cw", "audit", "-t", ":memory:", "-v", "--fail-fast"]).unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.target.as_deref(), Some(":memory:"));
    assert!(matches!(cli.command, Commands::Audit(AuditArgs { fail_fast: true })));
}

#[test]
fn test_deadlines_requires_start() {
    assert!(Cli::try_parse_from(["cw", "deadlines"]).is_err());
    let cli = Cli::try_parse_from([
        "cw",
        "deadlines",
        "--start",
        "29-08-2025",
        "--on",
        "2025-11-20",
        "--outstanding",
        "1500000",
    ])
    .unwrap();
    let Commands::Deadlines(args) = cli.command else {
        panic!("expected deadlines");
    };
    assert_eq!(args.start, "29-08-2025");
    assert_eq!(args.outstanding, 1_500_000.0);
    assert!(!args.resident);
}

#[test]
fn test_archive_ls() {
    let cli = Cli::try_parse_from(["cw", "archive", "ls"]).unwrap();
    let Commands::Archive(ArchiveArgs {
        command: ArchiveCommands::Ls(args),
    }) = cli.command
    else {
        panic!("expected archive ls");
    };
    assert!(args.stamp.is_none());
}
