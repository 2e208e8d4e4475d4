use calotrack::balance::{
    add_task_balance_eff_cont, AnalysisType, BalanceEffContOptions, ParticleSpecies,
};
use calotrack::manager::{AnalysisManager, ManagerGraph};
use calotrack::ComposeError;
use calotrack_protocol::{ContainerKind, DataKind, TriggerMask};

#[test]
fn default_task_wiring() {
    let mut graph = ManagerGraph::new(DataKind::Aod);
    let registered = add_task_balance_eff_cont(
        Some(&mut graph as &mut dyn AnalysisManager),
        &BalanceEffContOptions::default(),
    )
    .unwrap();
    let task = &registered.task;

    assert_eq!(task.name, "TaskEffContBF");
    assert_eq!(task.analysis_type, AnalysisType::Aod);
    assert_eq!(task.selection_mask, TriggerMask::INT7);
    assert_eq!(task.aod_filter_bit, 96);
    assert_eq!(task.vertex_diamond.z, 10.0);
    assert_eq!(task.rejected_generator, "Hijing");
    assert_eq!((task.eta.bins, task.delta_eta.bins, task.pt.bins), (100, 64, 100));
    assert_eq!(task.centrality.as_ref().unwrap().estimator, "V0M");

    let record = graph.task(registered.id).unwrap();
    assert_eq!(record.inputs.get(&0), Some(&graph.common_input_container()));
    let file = "AnalysisResults.root:PWGCFEbyE.outputBalanceFunctionEffContAnalysis";

    let qa = graph.container(record.outputs[&1]).unwrap();
    assert_eq!(qa.name, "listQA_10-80_10_pi");
    assert_eq!(qa.kind, ContainerKind::Output);
    assert_eq!(qa.file.as_deref(), Some(file));

    let eff = graph.container(record.outputs[&2]).unwrap();
    assert_eq!(eff.name, "listEffContBF_10-80_10_pi");
    assert_eq!(eff.file.as_deref(), Some(file));
}

#[test]
fn mc_truth_overrides_analysis_type() {
    let mut graph = ManagerGraph::new(DataKind::Esd).with_mc_truth(true);
    let registered = add_task_balance_eff_cont(
        Some(&mut graph as &mut dyn AnalysisManager),
        &BalanceEffContOptions::default(),
    )
    .unwrap();
    assert_eq!(registered.task.analysis_type, AnalysisType::Mc);

    let mut esd = ManagerGraph::new(DataKind::Esd);
    let registered = add_task_balance_eff_cont(
        Some(&mut esd as &mut dyn AnalysisManager),
        &BalanceEffContOptions::default(),
    )
    .unwrap();
    assert_eq!(registered.task.analysis_type, AnalysisType::Esd);
}

#[test]
fn pid_settings_follow_options() {
    let options = BalanceEffContOptions {
        particle: ParticleSpecies::Kaon,
        bayes_threshold: 0.5,
        centrality_min: 0.0,
        centrality_max: 5.0,
        vertex_z: 7.0,
        file_name_base: "BF".to_string(),
        ..BalanceEffContOptions::default()
    };
    let mut graph = ManagerGraph::new(DataKind::Aod);
    let registered =
        add_task_balance_eff_cont(Some(&mut graph as &mut dyn AnalysisManager), &options).unwrap();

    let pid = registered.task.pid.unwrap();
    assert_eq!(pid.particle, ParticleSpecies::Kaon);
    assert_eq!(pid.bayes_threshold, 0.5);
    assert!(pid.nsigma_combination);
    assert_eq!(registered.task.wiring.outputs[0].name, "listQA_0-5_7_K");
    assert_eq!(
        registered.task.wiring.outputs[1].file,
        "BF.root:PWGCFEbyE.outputBalanceFunctionEffContAnalysis"
    );
}

#[test]
fn missing_collaborators_are_fatal() {
    let err = add_task_balance_eff_cont(None, &BalanceEffContOptions::default()).unwrap_err();
    assert!(matches!(err, ComposeError::NoManager));

    let mut graph = ManagerGraph::without_input_handler();
    let err = add_task_balance_eff_cont(
        Some(&mut graph as &mut dyn AnalysisManager),
        &BalanceEffContOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ComposeError::NoInputHandler));
}
