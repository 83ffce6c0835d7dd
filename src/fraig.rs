//! Structural hashing and SAT-backed reduction of candidate equivalences

mod sat;

use std::collections::hash_map::Entry;
use std::io::Write;

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::network::{Circuit, Edge};
pub use sat::{SatResult, SatSolver};

/// Merge And gates sharing the same ordered pair of fanin edges
///
/// The key is the two signed edges exactly as stored, inversion included;
/// operand order is not canonicalized. Later gates in the topological order
/// merge into the first one seen.
pub fn strash(circuit: &mut Circuit) {
    let mut table: FxHashMap<(u32, u32), u32> = FxHashMap::default();
    for id in circuit.dfs() {
        if !circuit.gate(id).is_and() {
            continue;
        }
        let key = (
            circuit.gate(id).fanin()[0].raw(),
            circuit.gate(id).fanin()[1].raw(),
        );
        match table.entry(key) {
            Entry::Occupied(slot) => {
                let to = Edge::new(*slot.get(), false);
                println!(
                    "Strashing: {} merging {}{}...",
                    to.gate(),
                    if to.is_inverted() { "!" } else { "" },
                    id
                );
                circuit.merge(id, to);
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
    }
}

/// Prove or refute the FEC candidates and merge the proven ones
///
/// Every live gate up to the maximum variable index gets a SAT variable and
/// every And contributes its Tseitin clauses; Undef gates stay free, so an
/// equivalence depending on their behavior can never be proven. Classes are
/// processed smallest first. Each pair is queried through a fresh XOR
/// output assumed true; UNSAT means the pair is equivalent. A solver
/// failure leaves the pair unresolved. The partition is empty afterwards.
pub fn fraig(circuit: &mut Circuit) {
    if circuit.fecs().is_empty() {
        return;
    }

    let mut solver = SatSolver::new();
    for id in 0..=circuit.max_var() {
        if circuit.exists(id) {
            circuit.gate_mut(id).var = solver.new_var();
        }
    }
    for id in circuit.ands().to_vec() {
        let g = circuit.gate(id);
        let (e0, e1) = (g.fanin()[0], g.fanin()[1]);
        solver.add_and_clauses(
            g.var,
            circuit.gate(e0.gate()).var,
            e0.is_inverted(),
            circuit.gate(e1.gate()).var,
            e1.is_inverted(),
        );
    }

    // Rewrite passes run after the simulation can leave stale members
    let taken = circuit.take_fecs();
    let fecs: Vec<Vec<Edge>> = taken
        .into_iter()
        .map(|class| {
            class
                .into_iter()
                .filter(|e| circuit.exists(e.gate()))
                .collect::<Vec<Edge>>()
        })
        .filter(|class| class.len() > 1)
        .sorted_by_key(|class| class.len())
        .collect();

    for mut class in fecs {
        let mut j = 0;
        while j < class.len() {
            let ej = class[j];
            let mut proven = Vec::new();
            for k in (j + 1)..class.len() {
                let ek = class[k];
                let x = solver.new_var();
                solver.add_xor_clauses(
                    x,
                    circuit.gate(ej.gate()).var,
                    ej.is_inverted(),
                    circuit.gate(ek.gate()).var,
                    ek.is_inverted(),
                );
                solver.clear_assumptions();
                solver.assume(x, true);
                let unsat = solver.solve() == SatResult::Unsat;
                print!(
                    "\rProving {} = {}...{}",
                    ej.gate(),
                    ek.gate(),
                    if unsat { "UNSAT\n" } else { "SAT" }
                );
                std::io::stdout().flush().ok();
                if unsat {
                    proven.push(ek);
                }
            }
            if proven.is_empty() {
                j += 1;
            } else {
                for &ek in &proven {
                    let inv = ej.is_inverted() ^ ek.is_inverted();
                    println!(
                        "Fraig: {} merging {}{}...",
                        ej.gate(),
                        if inv { "!" } else { "" },
                        ek.gate()
                    );
                    circuit.merge(ek.gate(), Edge::new(ej.gate(), inv));
                }
                class.retain(|e| *e != ej && !proven.contains(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_aiger;
    use crate::sim::{file_sim, random_sim};

    #[test]
    fn test_strash_merges_identical_pairs() {
        // Gates 3 and 4 both read (1, +)(2, +)
        let text = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 2 4\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        strash(&mut c);
        assert!(c.exists(3));
        assert!(!c.exists(4));
        // The survivor drives both outputs
        assert_eq!(c.gate(5).fanin(), &[Edge::new(3, false)]);
        assert_eq!(c.gate(6).fanin(), &[Edge::new(3, false)]);
        assert_eq!(c.gate(3).fanout().len(), 2);
        c.check();
    }

    #[test]
    fn test_strash_respects_operand_order() {
        // Gate 4 reads the same edges swapped; the ordered key differs
        let text = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 4 2\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        strash(&mut c);
        assert!(c.exists(3) && c.exists(4));
    }

    #[test]
    fn test_strash_respects_inversions() {
        let text = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 2 5\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        strash(&mut c);
        assert!(c.exists(3) && c.exists(4));
    }

    #[test]
    fn test_fraig_without_candidates() {
        let text = "aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        assert!(c.fecs().is_empty());
        fraig(&mut c);
        assert!(c.exists(3));
    }

    #[test]
    fn test_fraig_merges_proven_equivalence() {
        // Gates 3 and 4 compute the same function with swapped operands,
        // which structural hashing alone cannot merge
        let text = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 4 2\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        random_sim(&mut c, 1, None);
        let class = c
            .fecs()
            .iter()
            .find(|cl| cl.iter().any(|e| e.gate() == 3))
            .expect("simulation must group the twin gates");
        assert!(class.iter().any(|e| e.gate() == 4));

        fraig(&mut c);
        assert!(c.exists(3));
        assert!(!c.exists(4));
        assert_eq!(c.gate(5).fanin(), &[Edge::new(3, false)]);
        assert_eq!(c.gate(6).fanin(), &[Edge::new(3, false)]);
        assert!(c.fecs().is_empty());
        c.check();

        // The reduced circuit still computes the original outputs
        file_sim(&mut c, "00\n01\n10\n11\n".as_bytes(), None);
        assert_eq!(c.gate(5).state() & 0xF, 0b0001);
        assert_eq!(c.gate(6).state() & 0xF, 0b0001);
    }

    #[test]
    fn test_fraig_inverse_equivalence() {
        // Gate 3 = 1 & 1 follows input 1; gate 4 = !1 & !1 is its inverse.
        // Both end up in one class with input 1, with gate 4 in opposite
        // polarity, and merge into the input with composed inversions.
        let text = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 2\n8 3 3\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        random_sim(&mut c, 1, None);
        fraig(&mut c);
        assert!(!c.exists(3));
        assert!(!c.exists(4));
        assert_eq!(c.gate(5).fanin(), &[Edge::new(1, false)]);
        assert_eq!(c.gate(6).fanin(), &[Edge::new(1, true)]);
        assert!(c.fecs().is_empty());
        c.check();
    }

    #[test]
    fn test_fraig_keeps_inequivalent_gates() {
        // 1 & 2 and !1 & !2 agree on no phase; both gates survive
        let text = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 3 5\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        random_sim(&mut c, 1, None);
        fraig(&mut c);
        assert!(c.exists(3) && c.exists(4));
        assert!(c.fecs().is_empty());
        c.check();
    }

    #[test]
    fn test_fraig_after_file_sim() {
        // Scenario: two lanes prove nothing to merge; the And survives
        let text = "aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        let patterns = "00\n01\n10\n11\n";
        file_sim(&mut c, patterns.as_bytes(), None);
        fraig(&mut c);
        assert!(c.exists(3));
        assert!(c.fecs().is_empty());
        assert_eq!(c.gate(4).state() & 0xF, 0b0001);
    }
}
