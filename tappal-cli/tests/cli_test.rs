//! CLI integration tests against fixture files on disk

use clap::Parser;
use tempfile::TempDir;

use tappal_access::TappalStatus;
use tappal_cli::{run, Args, CliError};
use tappal_routing::{Fixture, RoutingConfig, RoutingError};

const FIXTURE: &str = r#"
officers:
  - { id: O1, name: Ravi Kumar, role: tahsildar, department: Revenue }
  - { id: O2, name: Meena Reddy, role: rdo, department: Revenue }
  - { id: O3, name: Kiran Rao, role: vro, department: Revenue }
  - { id: O4, name: Lakshmi Devi, role: naib_tahsildar, department: Revenue }
tappals:
  - id: T1
    subject: Encroachment on canal bund
    department: Revenue
    priority: High
    created_at: 2026-03-02T09:30:00Z
    assigned_to: O1
"#;

fn write_fixture(dir: &TempDir) -> String {
    let path = dir.path().join("state.yaml");
    std::fs::write(&path, FIXTURE).unwrap();
    path.to_string_lossy().into_owned()
}

fn args(fixtures: &str, rest: &[&str]) -> Args {
    let mut argv = vec!["tappal", "--fixtures", fixtures];
    argv.extend_from_slice(rest);
    Args::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn test_access_reports_capabilities() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir);

    let output = run(
        &args(&path, &["access", "--officer", "O2", "--tappal", "T1"]),
        RoutingConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(output["access"], "granted");
    assert_eq!(output["grant"], "chain_superior");
    assert_eq!(output["capabilities"]["can_view"], true);

    let output = run(
        &args(&path, &["access", "--officer", "O3", "--tappal", "T1"]),
        RoutingConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(output["access"], "denied");
    assert!(output.get("tappal").is_none());
}

#[tokio::test]
async fn test_forward_with_save_persists_state() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir);

    let output = run(
        &args(
            &path,
            &[
                "--save",
                "forward",
                "--officer",
                "O1",
                "--tappal",
                "T1",
                "--to",
                "O4",
                "--reason",
                "reassigning for field verification",
            ],
        ),
        RoutingConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(output["tappal"]["assigned_to"], "O4");
    assert_eq!(output["movement"]["from"]["id"], "O1");

    let saved = Fixture::load(&path).unwrap();
    assert_eq!(saved.tappals[0].assigned_to, "O4");
    assert_eq!(saved.tappals[0].version, 1);
    assert_eq!(saved.movements.len(), 1);
    assert!(!saved.movements[0].digest.is_empty());

    // The saved chain verifies on the next run
    let output = run(
        &args(
            &path,
            &[
                "--save",
                "transition",
                "--officer",
                "O4",
                "--tappal",
                "T1",
                "--status",
                "completed",
                "--reason",
                "verification done",
            ],
        ),
        RoutingConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(output["tappal"]["status"], "Completed");

    let saved = Fixture::load(&path).unwrap();
    assert_eq!(saved.tappals[0].status, TappalStatus::Completed);
    assert_eq!(saved.status_changes.len(), 1);

    let history = run(
        &args(&path, &["history", "--tappal", "T1"]),
        RoutingConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(history["chain"]["intact"], true);
}

#[tokio::test]
async fn test_without_save_fixture_is_untouched() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir);

    run(
        &args(
            &path,
            &["comment", "--officer", "O1", "--tappal", "T1", "--body", "Site visit Monday"],
        ),
        RoutingConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), FIXTURE);
}

#[tokio::test]
async fn test_errors() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir);

    let err = run(
        &args(&path, &["access", "--officer", "O99", "--tappal", "T1"]),
        RoutingConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::UnknownOfficer(_)));

    let err = run(
        &args(
            &path,
            &[
                "transition", "--officer", "O1", "--tappal", "T1", "--status", "Archived",
                "--reason", "x",
            ],
        ),
        RoutingConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::UnknownStatus(_)));

    let err = run(
        &args(&path, &["targets", "--officer", "O1", "--tappal", "T404"]),
        RoutingConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::Routing(RoutingError::NotFound(_))));
}
