//! Local optimization of And-Inverter Graphs

use crate::network::{Circuit, Edge, GateKind};

/// Remove every gate that no output transitively depends on
///
/// Unused gates are disconnected first, which can empty the fanout of their
/// own fanins and grow the frontier. Only And and Undef gates are deleted;
/// inputs stay even when dangling.
pub fn sweep(circuit: &mut Circuit) {
    let mut notused = circuit.not_used_ids();

    // Drain the frontier of gates without fanouts
    let mut i = 0;
    while i < notused.len() {
        let id = notused[i];
        let fanins: Vec<Edge> = circuit.gate(id).fanin().to_vec();
        for e in fanins {
            circuit.disconnect_fanin(id, e);
            let peer = circuit.gate(e.gate());
            if peer.fanout().is_empty() && !peer.is_const() {
                notused.push(e.gate());
            }
        }
        i += 1;
    }

    notused.sort_unstable();
    for id in notused {
        let kind = circuit.gate(id).kind();
        if matches!(kind, GateKind::And | GateKind::Undef) {
            println!("Sweeping: {}({}) removed...", kind.type_str(), id);
            circuit.remove(id);
        }
    }
}

/// Apply the four local rewrites to every And gate in topological order
///
/// 1. `x & 0`  becomes 0
/// 2. `x & 1`  becomes x
/// 3. `x & !x` becomes 0
/// 4. `x & x`  becomes x
pub fn optimize(circuit: &mut Circuit) {
    let dfs = circuit.dfs();
    for id in dfs {
        // Gates can disappear while the snapshot is being walked
        if !circuit.exists(id) || !circuit.gate(id).is_and() {
            continue;
        }
        let e0 = circuit.gate(id).fanin()[0];
        let e1 = circuit.gate(id).fanin()[1];
        let replacement = if e0.is_const() || e1.is_const() {
            let (c, other) = if e0.is_const() { (e0, e1) } else { (e1, e0) };
            if !c.is_inverted() {
                // Constant zero absorbs the And
                Some(c)
            } else {
                // Constant one is the identity
                Some(other)
            }
        } else if e0.gate() == e1.gate() {
            if e0.is_inverted() != e1.is_inverted() {
                Some(Edge::zero())
            } else {
                Some(e0)
            }
        } else {
            None
        };
        if let Some(to) = replacement {
            simplify_msg(to, id);
            circuit.merge(id, to);
        }
    }
}

fn simplify_msg(to: Edge, from: u32) {
    println!(
        "Simplifying: {} merging {}{}...",
        to.gate(),
        if to.is_inverted() { "!" } else { "" },
        from
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_aiger;
    use crate::sim::file_sim;

    #[test]
    fn test_sweep_removes_unreachable() {
        // Gate 5 = 3 & 4 is not on any path to the output
        let text = "aag 5 2 0 1 3\n2\n4\n6\n6 2 4\n8 2 5\n10 6 8\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        sweep(&mut c);
        assert!(c.exists(3));
        assert!(!c.exists(4));
        assert!(!c.exists(5));
        assert!(c.exists(1) && c.exists(2));
        c.check();
    }

    #[test]
    fn test_sweep_keeps_dangling_inputs() {
        let text = "aag 3 2 0 1 1\n2\n4\n6\n6 2 2\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        sweep(&mut c);
        assert!(c.exists(1) && c.exists(2));
        assert_eq!(c.nb_ands(), 1);
    }

    #[test]
    fn test_optimize_identical_fanin() {
        // 3 = 1 & 1; the output then reads input 1 directly
        let text = "aag 3 2 0 1 1\n2\n4\n6\n6 2 2\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        optimize(&mut c);
        assert!(!c.exists(3));
        assert_eq!(c.gate(4).fanin(), &[Edge::new(1, false)]);
        c.check();
    }

    #[test]
    fn test_optimize_inverted_fanin() {
        // 2 = 1 & !1 collapses to the constant; the output read !2 and now
        // reads constant one
        let text = "aag 2 1 0 1 1\n2\n5\n4 2 3\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        optimize(&mut c);
        assert!(!c.exists(2));
        assert_eq!(c.gate(3).fanin(), &[Edge::one()]);
        file_sim(&mut c, "0\n1\n".as_bytes(), None);
        assert_eq!(c.gate(3).state() & 0b11, 0b11);
        c.check();
    }

    #[test]
    fn test_optimize_const_absorb() {
        // 2 = 1 & 0 collapses to the constant
        let text = "aag 2 1 0 1 1\n2\n4\n4 2 0\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        optimize(&mut c);
        assert!(!c.exists(2));
        assert_eq!(c.gate(3).fanin(), &[Edge::zero()]);
        c.check();
    }

    #[test]
    fn test_optimize_const_identity() {
        // 2 = 1 & 1(const) keeps the input side
        let text = "aag 2 1 0 1 1\n2\n4\n4 2 1\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        optimize(&mut c);
        assert!(!c.exists(2));
        assert_eq!(c.gate(3).fanin(), &[Edge::new(1, false)]);
        c.check();
    }

    #[test]
    fn test_optimize_preserves_outputs() {
        // 3 = 1 & 1 and 5 = 3 & 4 simplify away; outputs must not move
        let text = "aag 5 2 0 2 3\n2\n4\n10\n9\n6 2 2\n8 6 4\n10 8 1\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        let patterns = "00\n01\n10\n11\n";
        file_sim(&mut c, patterns.as_bytes(), None);
        let before: Vec<u64> = c.outputs().iter().map(|&o| c.gate(o).state() & 0xF).collect();
        optimize(&mut c);
        file_sim(&mut c, patterns.as_bytes(), None);
        let after: Vec<u64> = c.outputs().iter().map(|&o| c.gate(o).state() & 0xF).collect();
        assert_eq!(before, after);
        c.check();
    }

    #[test]
    fn test_optimize_cascades() {
        // 3 = 1 & !1 feeds 4 = 3 & 2; both collapse in one pass
        let text = "aag 4 2 0 1 2\n2\n4\n8\n6 2 3\n8 6 4\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        optimize(&mut c);
        assert!(!c.exists(3) && !c.exists(4));
        assert_eq!(c.gate(5).fanin(), &[Edge::zero()]);
        c.check();
    }
}
