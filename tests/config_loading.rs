mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::{TestResult, init_tracing};

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use nix::sys::signal::Signal;
use spiceserver::cli::CliArgs;
use spiceserver::config::{ConfigFile, load_and_validate, parse_signal, parse_str};
use spiceserver::errors::SpiceError;
use spiceserver::types::Flavour;
use spiceserver::{build_registry, load_config};
use tempfile::NamedTempFile;

fn validate(toml: &str) -> Result<ConfigFile, SpiceError> {
    ConfigFile::try_from(parse_str(toml)?)
}

#[test]
fn demo_config_loads() -> TestResult {
    init_tracing();
    let cfg = load_and_validate(Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/spiceserver.toml"))?;

    assert_eq!(cfg.server.port, 50051);
    assert!(cfg.server.find_simulators);
    assert_eq!(cfg.jobs.retention(), Duration::from_secs(86400));
    assert_eq!(cfg.jobs.sweep_interval(), Some(Duration::from_secs(600)));
    assert_eq!(cfg.cancel_signal(), Signal::SIGTERM);
    assert_eq!(cfg.simulator.len(), 2);
    assert_eq!(cfg.simulator[0].flavours, vec![Flavour::Xyce, Flavour::Xyce78]);
    assert!(cfg.netlister.is_none());
    Ok(())
}

#[test]
fn empty_file_gives_defaults() -> TestResult {
    init_tracing();
    let cfg = validate("")?;

    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 50051);
    assert_eq!(cfg.server.poll_interval(), Duration::from_secs(1));
    assert_eq!(cfg.jobs.root_dir(), std::env::temp_dir());
    assert_eq!(cfg.jobs.timeout(), None);
    assert_eq!(cfg.jobs.cancel_grace(), Duration::from_millis(2000));
    assert!(cfg.simulator.is_empty());
    Ok(())
}

#[test]
fn full_config_round_trips_every_section() -> TestResult {
    init_tracing();
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[server]
host = "127.0.0.1"
port = 6000
find_simulators = false
poll_interval_ms = 250

[jobs]
root = "/var/tmp/spice"
retention_secs = 60
sweep_interval_secs = 0
timeout_secs = 3600
cancel_signal = "int"
cancel_grace_ms = 100

[netlister]
command = "/usr/local/bin/netlist"
args = ["--quiet"]

[[simulator]]
path = "/opt/spectre/bin/spectre"
name = "Spectre"
flavours = ["spectre"]
"#
    )?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.server.host, "127.0.0.1");
    assert!(!cfg.server.find_simulators);
    assert_eq!(cfg.server.poll_interval(), Duration::from_millis(250));
    assert_eq!(cfg.jobs.root_dir(), Path::new("/var/tmp/spice"));
    assert_eq!(cfg.jobs.sweep_interval(), None);
    assert_eq!(cfg.jobs.timeout(), Some(Duration::from_secs(3600)));
    assert_eq!(cfg.cancel_signal(), Signal::SIGINT);
    let netlister = cfg.netlister.as_ref().expect("netlister section");
    assert_eq!(netlister.args, vec!["--quiet".to_string()]);
    assert_eq!(netlister.timeout(), Duration::from_secs(300));
    assert_eq!(cfg.simulator[0].version, "unknown");
    assert_eq!(cfg.simulator[0].license, "");
    Ok(())
}

#[test]
fn invalid_values_are_config_errors() {
    init_tracing();
    let cases = [
        "[server]\npoll_interval_ms = 0",
        "[server]\nhost = \"  \"",
        "[jobs]\nretention_secs = 0",
        "[jobs]\ncancel_grace_ms = 0",
        "[jobs]\ntimeout_secs = 0",
        "[jobs]\ncancel_signal = \"SIGNOPE\"",
        "[netlister]\ncommand = \"\"",
        "[netlister]\ncommand = \"/bin/netlist\"\ntimeout_secs = 0",
        "[[simulator]]\npath = \"\"\nname = \"x\"\nflavours = [\"xyce\"]",
        "[[simulator]]\npath = \"/bin/x\"\nname = \"x\"\nflavours = []",
    ];

    for toml in cases {
        match validate(toml) {
            Err(SpiceError::ConfigError(_)) => {}
            other => panic!("expected ConfigError for {toml:?}, got {other:?}"),
        }
    }
}

#[test]
fn unknown_keys_and_flavours_fail_to_parse() {
    init_tracing();
    assert!(matches!(
        parse_str("[server]\nprot = 1"),
        Err(SpiceError::TomlError(_))
    ));
    assert!(matches!(
        parse_str("[[simulator]]\npath = \"/x\"\nname = \"x\"\nflavours = [\"pspice\"]"),
        Err(SpiceError::TomlError(_))
    ));
}

#[test]
fn signal_names_accept_short_and_long_forms() -> TestResult {
    init_tracing();
    assert_eq!(parse_signal("TERM")?, Signal::SIGTERM);
    assert_eq!(parse_signal("sigkill")?, Signal::SIGKILL);
    assert_eq!(parse_signal(" SIGINT ")?, Signal::SIGINT);
    assert!(parse_signal("BOGUS").is_err());
    Ok(())
}

#[test]
fn cli_overrides_config_file() -> TestResult {
    init_tracing();
    let mut file = NamedTempFile::new()?;
    write!(file, "[server]\nport = 7000\nfind_simulators = true\n")?;
    let path = file.path().to_string_lossy().into_owned();

    let args = CliArgs::try_parse_from([
        "spiceserver",
        "--config",
        path.as_str(),
        "--port",
        "7100",
        "--find-simulators",
        "false",
    ])?;
    let cfg = load_config(&args)?;

    assert_eq!(cfg.server.port, 7100);
    assert!(!cfg.server.find_simulators);

    let args = CliArgs::try_parse_from(["spiceserver"])?;
    let cfg = load_config(&args)?;
    assert_eq!(cfg.server.port, 50051);
    assert!(cfg.server.find_simulators);
    Ok(())
}

#[test]
fn registry_without_probing_holds_only_static_installs() {
    init_tracing();
    let mut cfg = ConfigFileBuilder::new()
        .with_simulator("Xyce", Path::new("/opt/xyce/bin/Xyce"), &[Flavour::Xyce710])
        .build();
    cfg.server.find_simulators = false;

    let registry = build_registry(&cfg);

    assert_eq!(registry.len(), 1);
    assert!(registry.is_registered(Flavour::Xyce710));
}
