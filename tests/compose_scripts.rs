//! End-to-end script generation from a JSON instance store.

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};

use stagehand::{
    ChangeFlags, FixedSuffix, JsonInstanceStore, ScriptComposer, ScriptError, Stage,
};

const TARGET: &str = "cacb5448-46b0-4808-980d-5521775671c0";
const SOURCE: &str = "9d7e0a11-2c4b-4e0f-9a7d-0f3c7a1e2b44";
const STACK: &str = "4f1c9e2a-7b3d-4c5e-8f6a-1b2c3d4e5f60";

const EVERYTHING: ChangeFlags = ChangeFlags {
    artifacts: true,
    deployment: true,
    data: true,
    properties: true,
};

#[fixture]
fn store() -> JsonInstanceStore {
    let path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/instances.json");
    JsonInstanceStore::from_file(&path).unwrap_or_else(|err| panic!("fixture store: {err}"))
}

fn render(
    store: &JsonInstanceStore,
    flags: ChangeFlags,
    stage: Stage,
    uuid: &str,
) -> Result<String, ScriptError> {
    ScriptComposer::new(store, flags, "/var/lib/pipeline/build/artifacts")
        .with_suffixes(FixedSuffix(String::from("0.123456789")))
        .compose(stage, uuid)
        .map(stagehand::ScriptDocument::render)
}

#[rstest]
#[case(Stage::PrepareHost, "# Autogenerated script for the CD host preparation...")]
#[case(Stage::StartInstance, "# Autogenerated script for the instance start...")]
#[case(
    Stage::MonitorStartup,
    "# Autogenerated script for the instance startup monitoring..."
)]
fn scripts_open_with_interpreter_header_and_strict_mode(
    store: JsonInstanceStore,
    #[case] stage: Stage,
    #[case] header: &str,
) {
    let script = render(&store, EVERYTHING, stage, TARGET).expect("script");
    let mut lines = script.lines();
    assert_eq!(lines.next(), Some("#!/bin/bash"));
    assert_eq!(lines.next(), Some(header));
    assert_eq!(lines.next(), Some("set -xe"));
}

#[rstest]
fn full_host_preparation_orders_blocks(store: JsonInstanceStore) {
    let script = render(&store, EVERYTHING, Stage::PrepareHost, TARGET).expect("script");
    let host_dir = format!("/var/docker-volumes/{TARGET}");

    let markers = [
        format!("sudo mkdir -p {host_dir}\n"),
        format!("sudo mkdir -p {host_dir}/artifacts\n"),
        format!(
            "rsync -avz -e 'ssh -p 22' /var/lib/pipeline/build/artifacts/{TARGET}/ deploy@10.0.0.4:{host_dir}/artifacts\n"
        ),
        String::from("docker pull mekomsolutions/bahmni:cambodia-release-0.90\n"),
        format!("rsync -avz /var/docker-volumes/{SOURCE}/data/ {host_dir}/data\n"),
    ];
    let mut cursor = 0;
    for marker in &markers {
        let found = script
            .get(cursor..)
            .and_then(|rest| rest.find(marker.as_str()))
            .unwrap_or_else(|| panic!("missing or out of order: {marker}\n{script}"));
        cursor += found + marker.len();
    }
}

#[rstest]
fn unchanged_instance_only_creates_host_dir(store: JsonInstanceStore) {
    let script =
        render(&store, ChangeFlags::default(), Stage::PrepareHost, TARGET).expect("script");
    assert!(!script.contains("rsync"), "unexpected sync: {script}");
    assert!(!script.contains("docker pull"), "unexpected pull: {script}");
    assert_eq!(script.matches("ssh -T").count(), 1);
}

#[rstest]
fn docker_start_publishes_ports_in_container_port_order(store: JsonInstanceStore) {
    let flags = ChangeFlags {
        deployment: true,
        ..ChangeFlags::default()
    };
    let script = render(&store, flags, Stage::StartInstance, TARGET).expect("script");
    assert!(
        script.contains(concat!(
            "docker run -dit --privileged -v /sys/fs/cgroup:/sys/fs/cgroup:ro ",
            "--restart unless-stopped --publish 8180:80 --publish 8733:443 ",
            "--label type=dev --label group=tlc --name cambodia1 --hostname bahmni ",
            "--network network1 --network network2 ",
        )),
        "unexpected run line: {script}"
    );
    assert!(script.contains("# 'bahmniconnect' component:\n"));
    assert!(script.contains("# 'db_dumps' component:\n"));
    assert!(script.contains("echo Asia/Phnom_Penh > /etc/timezone"));
}

#[rstest]
fn compose_start_writes_environment_file(store: JsonInstanceStore) {
    let flags = ChangeFlags {
        deployment: true,
        ..ChangeFlags::default()
    };
    let script = render(&store, flags, Stage::StartInstance, STACK).expect("script");
    assert!(script.contains(concat!(
        "echo 'OPENMRS_CONFIG_PATH=/cfg/openmrs' > .env\n",
        "echo 'BAHMNI_CONFIG_PATH=/cfg/bahmni' >> .env\n",
        "echo 'OPENMRS_MODULES_PATH=/cfg/modules' >> .env\n",
        "echo 'BAHMNI_HOME=/home/bahmni' >> .env\n",
        "echo 'TIMEZONE=America/Port-au-Prince' >> .env\n",
        "echo 'BAHMNI_MART_CRON_TIME=0 2 * * *' >> .env\n",
    )));
    assert!(script.contains("git checkout 9f2e1d\n"));
}

#[rstest]
fn every_stage_is_reproducible(store: JsonInstanceStore) {
    for stage in Stage::ALL {
        for uuid in [TARGET, SOURCE, STACK] {
            let first = render(&store, EVERYTHING, stage, uuid).expect("first");
            let second = render(&store, EVERYTHING, stage, uuid).expect("second");
            assert_eq!(first, second, "{stage} for {uuid} differs between runs");
        }
    }
}

#[rstest]
#[case::remote_docker(TARGET)]
#[case::local_compose(STACK)]
fn every_stage_is_valid_bash(store: JsonInstanceStore, #[case] uuid: &str) {
    for stage in Stage::ALL {
        let script = render(&store, EVERYTHING, stage, uuid).expect("script");
        assert_cmd::Command::new("bash")
            .arg("-n")
            .write_stdin(script)
            .assert()
            .success();
    }
}

#[test]
fn missing_data_source_aborts_generation() {
    let path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/instances.json");
    let full = JsonInstanceStore::from_file(&path).expect("fixture store");
    let partial = JsonInstanceStore::from_definitions(
        full.iter()
            .filter(|def| def.uuid != SOURCE)
            .cloned()
            .collect(),
    );

    let err = render(&partial, EVERYTHING, Stage::PrepareHost, TARGET)
        .expect_err("source instance is missing");
    assert_eq!(
        err,
        ScriptError::MissingReference {
            uuid: String::from(SOURCE)
        }
    );
}
