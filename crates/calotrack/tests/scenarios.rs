use calotrack::compose::{add_task_calo_track_corr_base, Collaborators, TriggerRouting};
use calotrack::manager::{AnalysisManager, ManagerGraph};
use calotrack::production::{PRODUCTION_TAG_VAR, PRODUCTION_TYPE_VAR};
use calotrack::reader::{TimeWindow, TrackStatus};
use calotrack::track_cuts::JetTrackCutCatalog;
use calotrack::trigger::{TriggerMaskLookup, TriggerSelection, TriggerTable};
use calotrack::ComposeError;
use calotrack_protocol::{
    Calorimeter, CentralityRange, CollisionSystem, ContainerKind, DataKind, InputFlags, TriggerMask,
};
use std::cell::Cell;
use std::collections::HashMap;

fn collaborators(env: &HashMap<String, String>) -> Collaborators<'_> {
    Collaborators {
        triggers: &TriggerTable,
        track_cuts: &JetTrackCutCatalog,
        production: env,
    }
}

struct CountingLookup {
    calls: Cell<usize>,
}

impl TriggerMaskLookup for CountingLookup {
    fn lookup(&self, trigger: &str, year: i32) -> TriggerSelection {
        self.calls.set(self.calls.get() + 1);
        TriggerTable.lookup(trigger, year)
    }
}

#[test]
fn scenario_emcal_data_with_mixing() {
    let env: HashMap<String, String> = HashMap::new();
    let mut graph = ManagerGraph::new(DataKind::Aod);
    let flags = InputFlags {
        calorimeter: Calorimeter::Emcal,
        year: 2016,
        collision: CollisionSystem::Pp,
        mixing: true,
        ..InputFlags::default()
    };

    let registered = add_task_calo_track_corr_base(
        Some(&mut graph as &mut dyn AnalysisManager),
        &flags,
        &collaborators(&env),
    )
    .unwrap();
    let task = &registered.task;

    assert_eq!(task.name.as_str(), "CTC_EMCAL_Trig_EMC7_MixOn");
    assert_eq!(task.reader.emcal_time_cut.window, TimeWindow::new(-20.0, 15.0));
    assert!(task.reader.emcal_time_cut.enabled);
    assert_eq!(
        task.trigger,
        TriggerRouting::Reader {
            mask: TriggerMask::EMC7,
            mix_mask: TriggerMask::INT7,
            calo_trigger: "EMC7".to_string(),
        }
    );
    assert!(graph.input_handler().unwrap().need_field);
}

#[test]
fn scenario_phos_pbpb_without_mixing() {
    let env: HashMap<String, String> = HashMap::new();
    let mut graph = ManagerGraph::new(DataKind::Esd);
    let flags = InputFlags {
        calorimeter: Calorimeter::Phos,
        year: 2012,
        collision: CollisionSystem::PbPb,
        centrality: CentralityRange::new(0, 10),
        mixing: false,
        trigger: "PHOS".to_string(),
        ..InputFlags::default()
    };

    let registered = add_task_calo_track_corr_base(
        Some(&mut graph as &mut dyn AnalysisManager),
        &flags,
        &collaborators(&env),
    )
    .unwrap();
    let task = &registered.task;

    assert!(task.name.as_str().contains("_Cen0_10"));
    assert!(!task.name.as_str().contains("_MixOn"));
    assert_eq!(task.calibration.geometry.total, 3);
    assert_eq!(task.trigger.task_mask(), Some(TriggerMask::PHI7));
    assert_eq!(task.trigger.reader_mask(), None);
    assert_eq!(task.reader.centrality.as_ref().unwrap().range, CentralityRange::new(0, 10));
}

#[test]
fn scenario_dcal_simulation_with_smearing() {
    let env: HashMap<String, String> = HashMap::new();
    let lookup = CountingLookup { calls: Cell::new(0) };
    let collaborators = Collaborators {
        triggers: &lookup,
        track_cuts: &JetTrackCutCatalog,
        production: &env,
    };
    let mut graph = ManagerGraph::new(DataKind::Aod);
    let flags = InputFlags {
        calorimeter: Calorimeter::Dcal,
        simulation: true,
        year: 2017,
        cuts: "Smearing".to_string(),
        ..InputFlags::default()
    };

    let registered = add_task_calo_track_corr_base(
        Some(&mut graph as &mut dyn AnalysisManager),
        &flags,
        &collaborators,
    )
    .unwrap();

    assert!(registered.task.reader.smearing.is_some());
    assert_eq!(registered.task.trigger, TriggerRouting::AcceptAll);
    assert_eq!(lookup.calls.get(), 0);
}

#[test]
fn missing_manager_is_fatal() {
    let env: HashMap<String, String> = HashMap::new();
    let err = add_task_calo_track_corr_base(None, &InputFlags::default(), &collaborators(&env))
        .unwrap_err();
    assert!(matches!(err, ComposeError::NoManager));
}

#[test]
fn missing_input_handler_is_fatal() {
    let env: HashMap<String, String> = HashMap::new();
    let mut graph = ManagerGraph::without_input_handler();
    let err = add_task_calo_track_corr_base(
        Some(&mut graph as &mut dyn AnalysisManager),
        &InputFlags::default(),
        &collaborators(&env),
    )
    .unwrap_err();
    assert!(matches!(err, ComposeError::NoInputHandler));
    assert!(graph.tasks().is_empty());
}

#[test]
fn track_selection_follows_data_kind() {
    let env: HashMap<String, String> = HashMap::new();

    let mut esd = ManagerGraph::new(DataKind::Esd);
    let task = add_task_calo_track_corr_base(
        Some(&mut esd as &mut dyn AnalysisManager),
        &InputFlags::default(),
        &collaborators(&env),
    )
    .unwrap()
    .task;
    let selection = task.reader.track_selection.esd().unwrap();
    assert_eq!(selection.primary.id, 10001008);
    assert_eq!(selection.complementary.id, 10011008);
    assert!(task.reader.track_selection.aod().is_none());

    let mut aod = ManagerGraph::new(DataKind::Aod);
    let task = add_task_calo_track_corr_base(
        Some(&mut aod as &mut dyn AnalysisManager),
        &InputFlags::default(),
        &collaborators(&env),
    )
    .unwrap()
    .task;
    let selection = task.reader.track_selection.aod().unwrap();
    assert!(selection.hybrid && selection.shared_cluster);
    assert_eq!(selection.status, TrackStatus::ItsRefit);
    assert!(task.reader.track_selection.esd().is_none());
}

#[test]
fn wiring_connects_input_and_two_outputs() {
    let env: HashMap<String, String> = HashMap::new();
    let mut graph = ManagerGraph::new(DataKind::Aod).with_common_file("Common.root");
    let registered = add_task_calo_track_corr_base(
        Some(&mut graph as &mut dyn AnalysisManager),
        &InputFlags::default(),
        &collaborators(&env),
    )
    .unwrap();

    let record = graph.task(registered.id).unwrap();
    assert_eq!(record.inputs.get(&0), Some(&graph.common_input_container()));

    let results = graph.container(record.outputs[&1]).unwrap();
    assert_eq!(results.name, "CTC_EMCAL_Trig_EMC7_MixOn");
    assert_eq!(results.kind, ContainerKind::Output);
    assert_eq!(results.file.as_deref(), Some("Common.root"));

    let params = graph.container(record.outputs[&2]).unwrap();
    assert_eq!(params.name, "Param_CTC_EMCAL_Trig_EMC7_MixOn");
    assert_eq!(params.kind, ContainerKind::Param);
    assert_eq!(params.file.as_deref(), Some("AnalysisParameters.root"));
}

#[test]
fn aliasing_is_recorded_not_prevented() {
    let env: HashMap<String, String> = HashMap::new();
    let mut graph = ManagerGraph::new(DataKind::Aod);
    let data = InputFlags {
        year: 2016,
        ..InputFlags::default()
    };
    let simulation = InputFlags {
        simulation: true,
        ..data.clone()
    };

    for flags in [&data, &data, &simulation] {
        add_task_calo_track_corr_base(
            Some(&mut graph as &mut dyn AnalysisManager),
            flags,
            &collaborators(&env),
        )
        .unwrap();
    }

    assert_eq!(graph.tasks().len(), 3);
    // results and parameter list each alias twice
    let aliases = graph.aliases();
    assert_eq!(aliases.len(), 4);
    assert_eq!(aliases.iter().filter(|a| a.identical).count(), 2);
    assert_eq!(aliases.iter().filter(|a| !a.identical).count(), 2);
}

#[test]
fn production_variables_override_flags() {
    let env: HashMap<String, String> = [
        (PRODUCTION_TYPE_VAR.to_string(), "RAW".to_string()),
        (PRODUCTION_TAG_VAR.to_string(), "LHC16k".to_string()),
    ]
    .into_iter()
    .collect();
    let mut graph = ManagerGraph::new(DataKind::Aod);
    let task = add_task_calo_track_corr_base(
        Some(&mut graph as &mut dyn AnalysisManager),
        &InputFlags::default(),
        &collaborators(&env),
    )
    .unwrap()
    .task;

    assert_eq!(task.flags.year, 2016);
    assert_eq!(task.period.as_deref(), Some("LHC16k"));
    assert_eq!(task.calibration.geometry.total, 20);
}

#[test]
fn descriptor_serializes_to_json() {
    let env: HashMap<String, String> = HashMap::new();
    let mut graph = ManagerGraph::new(DataKind::Aod);
    add_task_calo_track_corr_base(
        Some(&mut graph as &mut dyn AnalysisManager),
        &InputFlags::default(),
        &collaborators(&env),
    )
    .unwrap();

    let json = serde_json::to_value(&graph).unwrap();
    let settings = &json["tasks"][0]["settings"];
    assert_eq!(settings["name"], "CTC_EMCAL_Trig_EMC7_MixOn");
    assert_eq!(settings["trigger"]["at"], "reader");
    assert_eq!(settings["reader"]["track_selection"]["kind"], "aod");
}
