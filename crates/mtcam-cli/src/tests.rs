use super::*;

#[test]
fn parses_tick_command() {
    let cli = Cli::try_parse_from(["mtcam", "tick"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Tick { dry_run: false }));
}

#[test]
fn parses_tick_dry_run() {
    let cli = Cli::try_parse_from(["mtcam", "tick", "--dry-run"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Tick { dry_run: true }));
}

#[test]
fn parses_daemon_command() {
    let cli = Cli::try_parse_from(["mtcam", "daemon"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Daemon));
}

#[test]
fn parses_db_subcommands() {
    for (arg, expected) in [
        ("ping", "Ping"),
        ("migrate", "Migrate"),
        ("seed", "Seed"),
    ] {
        let cli = Cli::try_parse_from(["mtcam", "db", arg]).expect("expected valid cli args");
        let Commands::Db { command } = cli.command else {
            panic!("expected db command for {arg}");
        };
        assert_eq!(format!("{command:?}"), expected);
    }
}

#[test]
fn parses_tz_refresh_command() {
    let cli = Cli::try_parse_from(["mtcam", "tz", "refresh"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Tz {
            command: TzCommands::Refresh
        }
    ));
}

#[test]
fn parses_catalog_check_command() {
    let cli = Cli::try_parse_from(["mtcam", "catalog", "check"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Catalog {
            command: CatalogCommands::Check
        }
    ));
}

#[test]
fn records_defaults_to_last_hour_all_cameras() {
    let cli = Cli::try_parse_from(["mtcam", "records"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Records {
            camera: None,
            hours: 1
        }
    ));
}

#[test]
fn records_accepts_camera_and_hours() {
    let cli = Cli::try_parse_from(["mtcam", "records", "--camera", "7", "--hours", "24"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Records {
            camera: Some(7),
            hours: 24
        }
    ));
}

#[test]
fn missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["mtcam"]).is_err());
}

#[test]
fn unknown_flag_is_rejected() {
    assert!(Cli::try_parse_from(["mtcam", "tick", "--force"]).is_err());
}
