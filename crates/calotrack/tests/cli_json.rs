use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const PRODUCTION_VARS: [&str; 4] = [
    "ALIEN_JDL_LPMINTERACTIONTYPE",
    "ALIEN_JDL_LPMPRODUCTIONTYPE",
    "ALIEN_JDL_LPMPRODUCTIONTAG",
    "ALIEN_JDL_LPMANCHORYEAR",
];

fn calotrack_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_calotrack"))
}

fn run_cli(home: &Path, args: &[&str]) -> Output {
    run_cli_with_env(home, args, &[])
}

fn run_cli_with_env(home: &Path, args: &[&str], vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(calotrack_bin());
    cmd.args(args)
        .env("CALOTRACK_HOME", home)
        .env("RUST_LOG", "error")
        .env_remove("CALOTRACK_DATA_KIND");
    for var in PRODUCTION_VARS {
        cmd.env_remove(var);
    }
    for (key, value) in vars {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to execute calotrack CLI")
}

fn run_cli_json(home: &Path, args: &[&str]) -> serde_json::Value {
    run_cli_json_with_env(home, args, &[])
}

fn run_cli_json_with_env(home: &Path, args: &[&str], vars: &[(&str, &str)]) -> serde_json::Value {
    let output = run_cli_with_env(home, args, vars);
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}",
            err,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn name_prints_artifact_name() {
    let home = TempDir::new().unwrap();
    let output = run_cli(
        home.path(),
        &[
            "name",
            "--calorimeter",
            "PHOS",
            "--collision",
            "PbPb",
            "--min-cen",
            "0",
            "--max-cen",
            "10",
            "--mixing",
            "false",
            "--trigger",
            "PHOS",
        ],
    );
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "CTC_PHOS_Trig_PHOS_Cen0_10"
    );
}

#[test]
fn calo_track_corr_json_reports_wiring() {
    let home = TempDir::new().unwrap();
    let json = run_cli_json(
        home.path(),
        &[
            "calo-track-corr",
            "--year",
            "2016",
            "--data-kind",
            "ESD",
            "--output-file",
            "mine.root",
            "--json",
        ],
    );

    let task = &json["task"]["task"];
    assert_eq!(task["name"], "CTC_EMCAL_Trig_EMC7_MixOn");
    assert_eq!(task["trigger"]["at"], "reader");
    assert_eq!(task["reader"]["track_selection"]["kind"], "esd");
    assert_eq!(task["reader"]["emcal_time_cut"]["window"]["min"], -20.0);

    let containers = json["manager"]["containers"].as_array().unwrap();
    let names: Vec<&str> = containers
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "cAUTO_INPUT",
            "CTC_EMCAL_Trig_EMC7_MixOn",
            "Param_CTC_EMCAL_Trig_EMC7_MixOn"
        ]
    );
    assert_eq!(containers[1]["file"], "mine.root");
    assert_eq!(containers[2]["file"], "AnalysisParameters.root");
}

#[test]
fn flags_file_is_overridden_by_cli() {
    let home = TempDir::new().unwrap();
    let flags_path = home.path().join("flags.toml");
    std::fs::write(
        &flags_path,
        "calorimeter = \"DCAL\"\nsimulation = true\nyear = 2017\ncuts = \"Smearing\"\n",
    )
    .unwrap();

    let json = run_cli_json(
        home.path(),
        &[
            "calo-track-corr",
            "--flags-file",
            flags_path.to_str().unwrap(),
            "--year",
            "2018",
            "--json",
        ],
    );
    let task = &json["task"]["task"];
    assert_eq!(task["flags"]["calorimeter"], "DCAL");
    assert_eq!(task["flags"]["year"], 2018);
    assert_eq!(task["trigger"]["at"], "accept_all");
    assert_eq!(task["reader"]["smearing"]["function"], "landau");
}

#[test]
fn missing_input_handler_fails_with_json_error() {
    let home = TempDir::new().unwrap();
    let output = run_cli(
        home.path(),
        &["calo-track-corr", "--no-input-handler", "--json"],
    );
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("requires an input event handler"));
}

#[test]
fn balance_eff_cont_json() {
    let home = TempDir::new().unwrap();
    let json = run_cli_json(
        home.path(),
        &["balance-eff-cont", "--use-pid", "false", "--mc-truth", "--json"],
    );
    let task = &json["task"]["task"];
    assert_eq!(task["analysis_type"], "MC");
    assert_eq!(task["wiring"]["outputs"][0]["name"], "listQA_10-80_10_ch");
}

#[test]
fn logs_go_under_calotrack_home() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["name"]);
    assert!(output.status.success());
    assert!(home.path().join("logs").join("calotrack.log").exists());
}

#[test]
fn name_matches_registered_task_under_production_override() {
    let home = TempDir::new().unwrap();
    let vars = [("ALIEN_JDL_LPMINTERACTIONTYPE", "PbPb")];
    let output = run_cli_with_env(
        home.path(),
        &["name", "--min-cen", "0", "--max-cen", "10"],
        &vars,
    );
    assert!(output.status.success());
    let printed = String::from_utf8_lossy(&output.stdout).trim().to_string();

    let json = run_cli_json_with_env(
        home.path(),
        &["calo-track-corr", "--min-cen", "0", "--max-cen", "10", "--json"],
        &vars,
    );
    assert_eq!(printed, "CTC_EMCAL_Trig_EMC7_Cen0_10_MixOn");
    assert_eq!(json["task"]["task"]["name"], printed.as_str());
}

#[test]
fn print_settings_can_be_switched_off() {
    let home = TempDir::new().unwrap();
    let flags_path = home.path().join("flags.toml");
    std::fs::write(&flags_path, "print_settings = true\n").unwrap();

    let json = run_cli_json(
        home.path(),
        &[
            "calo-track-corr",
            "--flags-file",
            flags_path.to_str().unwrap(),
            "--print-settings",
            "false",
            "--json",
        ],
    );
    assert_eq!(json["task"]["task"]["flags"]["print_settings"], false);
}
