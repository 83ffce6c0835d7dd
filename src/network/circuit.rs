use core::fmt;

use crate::network::edge::Edge;
use crate::network::gate::{Gate, GateKind};

/// Circuit manager owning all gates of an And-Inverter Graph
///
/// Gates live in a dense arena indexed by id. All cross-references between
/// gates are signed edges into the arena, so removal must disconnect first.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    gates: Vec<Option<Gate>>,
    inputs: Vec<u32>,
    outputs: Vec<u32>,
    ands: Vec<u32>,
    max_var: u32,
    comment: String,
    epoch: u32,
    fecs: Vec<Vec<Edge>>,
}

impl Circuit {
    /// Create an empty circuit holding only the constant-zero gate
    pub fn new() -> Self {
        let mut c = Circuit::default();
        c.gates.push(Some(Gate::new(GateKind::Const0, 0, 0)));
        c
    }

    /// Create a circuit presized for a maximum variable index and output count
    pub fn with_capacity(max_var: u32, nb_outputs: u32) -> Self {
        let mut c = Circuit::new();
        c.max_var = max_var;
        c.gates
            .resize(max_var as usize + nb_outputs as usize + 1, None);
        c
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of And gates
    pub fn nb_ands(&self) -> usize {
        self.ands.len()
    }

    /// Return the maximum variable index of the AIGER header
    pub fn max_var(&self) -> u32 {
        self.max_var
    }

    /// Ids of the primary inputs, in definition order
    pub fn inputs(&self) -> &[u32] {
        &self.inputs
    }

    /// Ids of the primary outputs, in definition order
    pub fn outputs(&self) -> &[u32] {
        &self.outputs
    }

    /// Ids of the And gates, in definition order
    pub fn ands(&self) -> &[u32] {
        &self.ands
    }

    /// Returns true if a gate currently lives at this id
    pub fn exists(&self, id: u32) -> bool {
        matches!(self.gates.get(id as usize), Some(Some(_)))
    }

    /// Get the gate at an id, if any
    pub fn get(&self, id: u32) -> Option<&Gate> {
        self.gates.get(id as usize).and_then(|g| g.as_ref())
    }

    /// Get the gate at an id; panics on a removed slot
    pub fn gate(&self, id: u32) -> &Gate {
        self.gates[id as usize].as_ref().unwrap()
    }

    pub(crate) fn gate_mut(&mut self, id: u32) -> &mut Gate {
        self.gates[id as usize].as_mut().unwrap()
    }

    /// Insert a new disconnected gate at the given id
    pub fn insert(&mut self, kind: GateKind, id: u32, line: u32) {
        if self.gates.len() <= id as usize {
            self.gates.resize(id as usize + 1, None);
        }
        assert!(
            self.gates[id as usize].is_none(),
            "gate {id} is already defined"
        );
        self.gates[id as usize] = Some(Gate::new(kind, id, line));
        match kind {
            GateKind::Input => self.inputs.push(id),
            GateKind::Output => self.outputs.push(id),
            GateKind::And => self.ands.push(id),
            GateKind::Const0 | GateKind::Undef => (),
        }
    }

    /// Remove the gate at an id; only And and Undef gates can be removed
    pub fn remove(&mut self, id: u32) -> bool {
        match self.gate(id).kind() {
            GateKind::And => {
                let pos = self.ands.iter().position(|&a| a == id).unwrap();
                self.ands.remove(pos);
                self.gates[id as usize] = None;
                true
            }
            GateKind::Undef => {
                self.gates[id as usize] = None;
                true
            }
            GateKind::Const0 | GateKind::Input | GateKind::Output => false,
        }
    }

    /// Set the AIGER symbol of a gate
    pub fn set_symbol(&mut self, id: u32, symbol: String) {
        self.gate_mut(id).symbol = Some(symbol);
    }

    /// The comment block of the AIGER file
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Replace the comment block
    pub fn set_comment(&mut self, comment: String) {
        self.comment = comment;
    }

    /// Append an incoming edge; duplicates are allowed
    pub fn add_fanin(&mut self, id: u32, e: Edge) {
        self.gate_mut(id).fanin.push(e);
    }

    /// Append an outgoing edge; duplicates are allowed
    pub fn add_fanout(&mut self, id: u32, e: Edge) {
        self.gate_mut(id).fanout.push(e);
    }

    /// Connect a fanin edge and its reciprocal fanout edge
    pub fn connect(&mut self, id: u32, e: Edge) {
        self.add_fanin(id, e);
        self.add_fanout(e.gate(), Edge::new(id, e.is_inverted()));
    }

    /// Remove one matching fanin edge and its reciprocal on the peer
    pub fn disconnect_fanin(&mut self, id: u32, e: Edge) {
        let g = self.gate_mut(id);
        let pos = g.fanin.iter().position(|f| *f == e).unwrap();
        g.fanin.remove(pos);
        self.remove_fanout(e.gate(), Edge::new(id, e.is_inverted()));
    }

    /// Remove every fanin edge of a gate, with the reciprocals
    pub fn disconnect_all_fanins(&mut self, id: u32) {
        let fanins = std::mem::take(&mut self.gate_mut(id).fanin);
        for e in fanins {
            self.remove_fanout(e.gate(), Edge::new(id, e.is_inverted()));
        }
    }

    /// Remove one matching fanout edge and its reciprocal on the consumer
    pub fn disconnect_fanout(&mut self, id: u32, e: Edge) {
        let g = self.gate_mut(id);
        let pos = g.fanout.iter().position(|f| *f == e).unwrap();
        g.fanout.remove(pos);
        let rec = Edge::new(id, e.is_inverted());
        let consumer = self.gate_mut(e.gate());
        let pos = consumer.fanin.iter().position(|f| *f == rec).unwrap();
        consumer.fanin.remove(pos);
    }

    /// Remove every fanout edge of a gate, with the reciprocals
    pub fn disconnect_all_fanouts(&mut self, id: u32) {
        let fanouts = std::mem::take(&mut self.gate_mut(id).fanout);
        for e in fanouts {
            let rec = Edge::new(id, e.is_inverted());
            let consumer = self.gate_mut(e.gate());
            let pos = consumer.fanin.iter().position(|f| *f == rec).unwrap();
            consumer.fanin.remove(pos);
        }
    }

    fn remove_fanout(&mut self, id: u32, e: Edge) {
        let g = self.gate_mut(id);
        let pos = g.fanout.iter().position(|f| *f == e).unwrap();
        g.fanout.remove(pos);
    }

    /// Replace every use of a gate by another edge, then remove it
    ///
    /// Consumers keep their fanin slots in place: only the edge stored in
    /// the slot changes, so And operand positions survive the merge.
    pub fn merge(&mut self, from: u32, to: Edge) {
        let fanouts = std::mem::take(&mut self.gate_mut(from).fanout);
        for fo in fanouts {
            let consumer = fo.gate();
            let inv = to.is_inverted() ^ fo.is_inverted();
            self.gate_mut(to.gate())
                .fanout
                .push(Edge::new(consumer, inv));
            let old = Edge::new(from, fo.is_inverted());
            let new = Edge::new(to.gate(), inv);
            let g = self.gate_mut(consumer);
            let slot = g.fanin.iter().position(|f| *f == old).unwrap();
            g.fanin[slot] = new;
        }
        self.disconnect_all_fanins(from);
        self.remove(from);
    }

    /// Start a new traversal epoch
    ///
    /// On epoch overflow every marker is reset so stale marks cannot alias.
    pub fn raise_marker(&mut self) {
        if self.epoch == u32::MAX {
            for g in self.gates.iter_mut().flatten() {
                g.marker = 0;
            }
            self.epoch = 1;
        } else {
            self.epoch += 1;
        }
    }

    fn is_marked(&self, id: u32) -> bool {
        self.gate(id).marker == self.epoch
    }

    fn mark(&mut self, id: u32) {
        let epoch = self.epoch;
        self.gate_mut(id).marker = epoch;
    }

    /// Append the gates reachable from a root in post-order
    ///
    /// Undef gates are marked but never appended; everything else reachable
    /// through fanins lands in the list exactly once, fanins first.
    pub fn dfs_from(&mut self, root: u32, out: &mut Vec<u32>) {
        if self.is_marked(root) {
            return;
        }
        self.mark(root);
        let mut stack: Vec<(u32, usize)> = vec![(root, 0)];
        while let Some((id, i)) = stack.pop() {
            if i < self.gate(id).fanin.len() {
                stack.push((id, i + 1));
                let child = self.gate(id).fanin[i].gate();
                if !self.is_marked(child) {
                    self.mark(child);
                    stack.push((child, 0));
                }
            } else if !self.gate(id).is_undef() {
                out.push(id);
            }
        }
    }

    /// Topologically ordered list of the gates reachable from the outputs
    pub fn dfs(&mut self) -> Vec<u32> {
        self.raise_marker();
        let mut out = Vec::new();
        for o in self.outputs.clone() {
            self.dfs_from(o, &mut out);
        }
        out
    }

    /// Ids of And and Output gates with at least one Undef fanin
    pub fn floating_ids(&self) -> Vec<u32> {
        let mut ret = Vec::new();
        for g in self.gates.iter().flatten() {
            if !matches!(g.kind(), GateKind::And | GateKind::Output) {
                continue;
            }
            if g.fanin().iter().any(|e| self.gate(e.gate()).is_undef()) {
                ret.push(g.id());
            }
        }
        ret
    }

    /// Ids of non-output gates without any fanout, constant excluded
    pub fn not_used_ids(&self) -> Vec<u32> {
        let mut ret = Vec::new();
        for g in self.gates.iter().flatten() {
            if matches!(g.kind(), GateKind::Output | GateKind::Const0) {
                continue;
            }
            if g.fanout().is_empty() {
                ret.push(g.id());
            }
        }
        ret
    }

    /// The current partition of functionally-equivalent candidates
    pub fn fecs(&self) -> &[Vec<Edge>] {
        &self.fecs
    }

    /// Replace the FEC partition
    pub fn set_fecs(&mut self, fecs: Vec<Vec<Edge>>) {
        self.fecs = fecs;
    }

    /// Take the FEC partition out, leaving it empty
    pub fn take_fecs(&mut self) -> Vec<Vec<Edge>> {
        std::mem::take(&mut self.fecs)
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        assert!(self.exists(0) && self.gate(0).is_const());
        for g in self.gates.iter().flatten() {
            match g.kind() {
                GateKind::And => assert_eq!(g.fanin().len(), 2, "And {} arity", g.id()),
                GateKind::Output => assert_eq!(g.fanin().len(), 1, "Output {} arity", g.id()),
                _ => assert!(g.fanin().is_empty(), "gate {} has fanins", g.id()),
            }
            for e in g.fanin() {
                let peer = self.gate(e.gate());
                let nb_in = g.fanin().iter().filter(|f| *f == e).count();
                let rec = Edge::new(g.id(), e.is_inverted());
                let nb_out = peer.fanout().iter().filter(|f| **f == rec).count();
                assert_eq!(nb_in, nb_out, "fanin/fanout mismatch at {}", g.id());
            }
            for e in g.fanout() {
                let peer = self.gate(e.gate());
                let rec = Edge::new(g.id(), e.is_inverted());
                assert!(
                    peer.fanin().contains(&rec),
                    "fanout of {} not mirrored at {}",
                    g.id(),
                    e.gate()
                );
            }
        }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit with {} inputs, {} outputs, {} ands:",
            self.nb_inputs(),
            self.nb_outputs(),
            self.nb_ands()
        )?;
        for &id in &self.ands {
            let g = self.gate(id);
            writeln!(f, "\t{} = {} & {}", id, g.fanin()[0], g.fanin()[1])?;
        }
        for (i, &id) in self.outputs.iter().enumerate() {
            writeln!(f, "\to{} = {}", i, self.gate(id).fanin()[0])?;
        }
        Ok(())
    }
}
