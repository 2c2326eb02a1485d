use std::path::PathBuf;
use std::sync::Arc;

use proptest::prelude::*;
use trajrun::analysis::{AnalysisBitmask, clean_selection, output_file_name};
use trajrun::config::ConfigFile;
use trajrun::errors::ValidationError;
use trajrun::exec::DiagnosticTail;
use trajrun::job::JobSpecBuilder;
use trajrun::workflow::WorkflowKind;
use trajrun_test_utils::builders::{JobRequestBuilder, mock_project};

const ANALYSIS_KINDS: [&str; 7] = [
    "rmsd",
    "rmsf",
    "rgyr",
    "sasa",
    "distance",
    "rdf",
    "contact_surface",
];

fn selection() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,20}".prop_filter("needs a visible character", |s| !s.trim().is_empty())
}

proptest! {
    #[test]
    fn cleaned_selections_have_no_whitespace(sel in "[ a-z\t]{0,30}", spaces in "_?") {
        let cleaned = clean_selection(&sel, &spaces);
        prop_assert!(!cleaned.contains(char::is_whitespace));
        let whitespace = sel.chars().filter(|c| c.is_whitespace()).count();
        prop_assert_eq!(cleaned.len(), sel.len() - whitespace + whitespace * spaces.len());
    }

    #[test]
    fn file_names_are_prefix_selections_suffix_ext(
        prefix in "[A-Za-z]{1,8}",
        a in selection(),
        b in selection(),
    ) {
        let name = output_file_name(&prefix, &[&a, &b], "_", "_g", "png");
        let expected = format!(
            "{prefix}_{}_{}_g.png",
            clean_selection(&a, "_"),
            clean_selection(&b, "_")
        );
        prop_assert_eq!(name, expected);
    }

    #[test]
    fn bitmask_is_union_of_requested_bits(mask in 1u32..128) {
        let chosen: Vec<&str> = ANALYSIS_KINDS
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, id)| *id)
            .collect();

        let root = PathBuf::from("/project");
        let fs = mock_project(&root);
        let builder = JobSpecBuilder::new(&ConfigFile::default(), Arc::new(fs));
        let mut request = JobRequestBuilder::new(WorkflowKind::Analysis, &root)
            .topology("system.prmtop")
            .trajectory("traj.nc")
            .sel(1, "A")
            .sel(2, "B");
        for id in &chosen {
            request = request.kind(id);
        }

        let sasa_and_surface = chosen.contains(&"sasa") && chosen.contains(&"contact_surface");
        match builder.build(&request.build()) {
            Ok(spec) => {
                prop_assert!(!sasa_and_surface);
                prop_assert_eq!(spec.analysis_bitmask().bits(), mask);
                prop_assert_eq!(&spec.positional_args()[10], &mask.to_string());
                let bits: Vec<u32> = spec.analysis_bitmask().iter().collect();
                prop_assert_eq!(bits.iter().sum::<u32>(), mask);
            }
            Err(e) => {
                prop_assert!(sasa_and_surface);
                let is_conflict = matches!(e, ValidationError::ConflictingKinds { .. });
                prop_assert!(is_conflict);
            }
        }
    }

    #[test]
    fn bitmask_iter_round_trips(bits in any::<u32>()) {
        let mask = AnalysisBitmask::from_bits(bits);
        prop_assert_eq!(mask.iter().collect::<AnalysisBitmask>(), mask);
        prop_assert!(mask.iter().all(|bit| bit.is_power_of_two() && mask.contains(bit)));
    }

    #[test]
    fn diagnostic_tail_keeps_last_lines(count in 0usize..50, capacity in 1usize..15) {
        let tail = DiagnosticTail::new(capacity);
        for i in 0..count {
            tail.push(i.to_string());
        }
        let expected: Vec<String> = (count.saturating_sub(capacity)..count)
            .map(|i| i.to_string())
            .collect();
        prop_assert_eq!(tail.snapshot(), expected);
    }
}
