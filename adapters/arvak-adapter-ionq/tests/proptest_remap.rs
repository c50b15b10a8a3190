//! Property-based tests for histogram remapping.

use arvak_adapter_ionq::remap_counts;
use proptest::prelude::*;
use serde_json::json;

proptest! {
    /// A histogram with a single outcome yields exactly `shots` counts.
    #[test]
    fn single_outcome_counts_equal_shots(
        num_qubits in 1_usize..=8,
        outcome_seed in any::<u64>(),
        shots in 1_u64..=10_000,
    ) {
        let outcome = outcome_seed % (1_u64 << num_qubits);
        let doc = json!({
            "qubits": num_qubits,
            "data": {"histogram": {outcome.to_string(): 1.0}},
            "metadata": {"shots": shots.to_string()},
        });

        let counts = remap_counts(Some(&doc)).unwrap();
        prop_assert_eq!(counts.len(), 1);
        prop_assert_eq!(counts.total_shots(), shots);

        // Identity map: the bitstring is the outcome in binary, qubit 0 rightmost.
        let expected = format!("{:0width$b}", outcome, width = num_qubits);
        prop_assert_eq!(counts.get(&expected), shots);
    }

    /// Every bitstring has one character per memory slot.
    #[test]
    fn bitstrings_have_register_width(
        width in 1_usize..=6,
        outcomes in prop::collection::btree_set(0_u64..64, 1..8),
    ) {
        let weight = 1.0 / outcomes.len() as f64;
        let histogram: serde_json::Map<String, serde_json::Value> = outcomes
            .iter()
            .map(|o| (o.to_string(), json!(weight)))
            .collect();
        let doc = json!({
            "qubits": 6,
            "data": {"histogram": histogram},
            "metadata": {"shots": 1000, "header": {"memory_slots": width}},
        });

        let counts = remap_counts(Some(&doc)).unwrap();
        for (bits, _) in counts.iter() {
            prop_assert_eq!(bits.len(), width);
        }
    }
}
