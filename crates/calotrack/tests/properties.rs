//! Property tests for the resolvers and the composer.

use calotrack::calo_utils::{geometry_rows, resolve_calibration, super_module_geometry};
use calotrack::compose::{compose, OutputFiles, TriggerRouting};
use calotrack::reader::resolve_reader;
use calotrack::track_cuts::JetTrackCutCatalog;
use calotrack::trigger::TriggerTable;
use calotrack_protocol::*;
use proptest::prelude::*;

fn calorimeter() -> impl Strategy<Value = Calorimeter> {
    prop_oneof![
        Just(Calorimeter::Emcal),
        Just(Calorimeter::Dcal),
        Just(Calorimeter::Phos),
        Just(Calorimeter::Other("FOCAL".to_string())),
    ]
}

fn collision() -> impl Strategy<Value = CollisionSystem> {
    prop_oneof![
        Just(CollisionSystem::Pp),
        Just(CollisionSystem::PbPb),
        Just(CollisionSystem::PA),
    ]
}

fn trigger() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("EMC7".to_string()),
        Just("INT7".to_string()),
        Just("EMCAL_L1".to_string()),
        Just("DCAL_L2".to_string()),
        Just("PHOS".to_string()),
        Just("AnyINT".to_string()),
        "[A-Z]{3,6}",
    ]
}

fn data_kind() -> impl Strategy<Value = DataKind> {
    prop_oneof![Just(DataKind::Esd), Just(DataKind::Aod)]
}

prop_compose! {
    fn flags()(
        calorimeter in calorimeter(),
        collision in collision(),
        trigger in trigger(),
        simulation in any::<bool>(),
        year in 2009i32..2020,
        reject_emc_trigger in 0i32..3,
        cuts in prop_oneof![
            Just(String::new()),
            Just("Smearing".to_string()),
            Just("SPDPileUp".to_string())
        ],
        calibrate in any::<bool>(),
        non_linearity in any::<bool>(),
        mixing in any::<bool>(),
        min in -1i32..50,
        max in -1i32..100,
    ) -> InputFlags {
        InputFlags {
            calorimeter,
            collision,
            trigger,
            simulation,
            year,
            reject_emc_trigger,
            cuts,
            calibrate,
            non_linearity,
            mixing,
            centrality: CentralityRange::new(min, max),
            ..InputFlags::default()
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn resolution_is_deterministic(flags in flags(), kind in data_kind()) {
        let first = resolve_reader(&flags, kind, &JetTrackCutCatalog);
        let second = resolve_reader(&flags.clone(), kind, &JetTrackCutCatalog);
        prop_assert_eq!(first, second);
        prop_assert_eq!(resolve_calibration(&flags), resolve_calibration(&flags.clone()));
    }

    #[test]
    fn exactly_one_track_selection(flags in flags(), kind in data_kind()) {
        let reader = resolve_reader(&flags, kind, &JetTrackCutCatalog);
        let selection = &reader.track_selection;
        prop_assert!(selection.esd().is_some() != selection.aod().is_some());
        prop_assert_eq!(selection.esd().is_some(), kind == DataKind::Esd);
    }

    #[test]
    fn fiducial_windows_are_not_degenerate(flags in flags(), kind in data_kind()) {
        let reader = resolve_reader(&flags, kind, &JetTrackCutCatalog);
        prop_assert!(!reader.fiducial.tracks.is_degenerate());
        prop_assert!(!reader.fiducial.phos.is_degenerate());
        if let Some(window) = reader.fiducial.emcal {
            prop_assert!(!window.is_degenerate());
        }
    }

    #[test]
    fn calibration_switches_never_split(flags in flags()) {
        let calibration = resolve_calibration(&flags);
        prop_assert_eq!(calibration.recalibration, calibration.run_dependent_correction());
        prop_assert_eq!(calibration.recalibration, flags.calibrate);
        prop_assert!(calibration.geometry.is_consistent());
    }

    #[test]
    fn trigger_filtering_applied_once(flags in flags()) {
        let reader = resolve_reader(&flags, DataKind::Aod, &JetTrackCutCatalog);
        let calibration = resolve_calibration(&flags);
        let files = OutputFiles::resolve(&flags, "AnalysisResults.root");
        let task = compose(
            &flags,
            reader,
            calibration,
            derive_artifact_name(&flags),
            &TriggerTable,
            &files,
        );
        if flags.simulation {
            prop_assert_eq!(task.trigger, TriggerRouting::AcceptAll);
        } else {
            let at_task = task.trigger.task_mask().is_some();
            let at_reader = task.trigger.reader_mask().is_some();
            prop_assert!(at_task != at_reader);
            prop_assert_eq!(at_reader, flags.mixing);
        }
    }
}

#[test]
fn super_module_ranges_hold_for_every_row() {
    for (bucket, calorimeter, geometry) in geometry_rows() {
        assert!(
            geometry.first <= geometry.last && geometry.last < geometry.total,
            "{:?} {} -> {:?}",
            bucket,
            calorimeter,
            geometry
        );
    }
}

#[test]
fn super_module_ranges_hold_for_every_year() {
    let calorimeters = [
        Calorimeter::Emcal,
        Calorimeter::Dcal,
        Calorimeter::Phos,
        Calorimeter::Other("FOCAL".to_string()),
    ];
    for year in 2009..=2025 {
        for calorimeter in &calorimeters {
            let geometry = super_module_geometry(calorimeter, year);
            assert!(geometry.is_consistent(), "{} {} -> {:?}", calorimeter, year, geometry);
        }
        let phos = super_module_geometry(&Calorimeter::Phos, year);
        let emcal = super_module_geometry(&Calorimeter::Emcal, year);
        assert!(!phos.overlaps(&emcal));
    }
}
