//! Refinement of functionally-equivalent candidate classes

use std::collections::hash_map::Entry;

use fxhash::FxHashMap;

use crate::network::{Circuit, Edge};

/// Start over with a single class: constant, inputs and Ands
///
/// Outputs never participate; they have no fanouts to rewire on a merge.
pub(crate) fn init_groups(circuit: &mut Circuit) {
    let mut class = vec![Edge::zero()];
    for &id in circuit.inputs() {
        class.push(Edge::new(id, false));
    }
    for &id in circuit.ands() {
        class.push(Edge::new(id, false));
    }
    circuit.set_fecs(vec![class]);
}

/// Split every class by the simulated signature of its members
///
/// The signature of an edge is its gate state over the low `mask_len`
/// lanes, complemented according to the edge polarity. On the first round
/// of a simulation the polarity is chosen so the top lane reads 0, which
/// lets inverse-equivalent gates share a class; later rounds must keep the
/// recorded polarity or classes would split against their representative.
/// Only groups of two or more survive.
pub(crate) fn refine(circuit: &mut Circuit, mask_len: usize, again: bool) {
    let m = super::mask(mask_len);
    let mut new_fecs = Vec::new();
    for class in circuit.take_fecs() {
        let mut table: FxHashMap<u64, usize> = FxHashMap::default();
        let mut groups: Vec<Vec<Edge>> = Vec::new();
        for e in class {
            let v = circuit.gate(e.gate()).state() & m;
            let inv = if again { e.is_inverted() } else { v > (m >> 1) };
            let key = if inv { !v & m } else { v };
            match table.entry(key) {
                Entry::Occupied(slot) => groups[*slot.get()].push(e.with_inversion(inv)),
                Entry::Vacant(slot) => {
                    slot.insert(groups.len());
                    groups.push(vec![e.with_inversion(inv)]);
                }
            }
        }
        for g in groups {
            if g.len() > 1 {
                new_fecs.push(g);
            }
        }
    }
    circuit.set_fecs(new_fecs);
}
