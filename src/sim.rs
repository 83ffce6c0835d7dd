//! 64-wide parallel simulation driving FEC candidate discovery

mod fec;

use std::io::{BufRead, Write};

use rand::{Rng, SeedableRng};

use crate::network::{Circuit, Edge, GateKind};

/// All-ones word over the low `length` lanes
fn mask(length: usize) -> u64 {
    !0u64 >> (64 - length)
}

/// Value of an edge in the current state, inversion applied
fn value(circuit: &Circuit, e: Edge) -> u64 {
    let s = circuit.gate(e.gate()).state();
    if e.is_inverted() {
        !s
    } else {
        s
    }
}

/// Load one 64-lane word per primary input
fn feed_signal(circuit: &mut Circuit, tx: &[u64]) {
    let inputs = circuit.inputs().to_vec();
    for (i, id) in inputs.into_iter().enumerate() {
        circuit.gate_mut(id).state = tx[i];
    }
}

/// Recompute every reachable gate in topological order; return output words
fn get_signal(circuit: &mut Circuit) -> Vec<u64> {
    for id in circuit.dfs() {
        let g = circuit.gate(id);
        let val = match g.kind() {
            GateKind::And => value(circuit, g.fanin()[0]) & value(circuit, g.fanin()[1]),
            GateKind::Output => value(circuit, g.fanin()[0]),
            GateKind::Const0 => 0,
            GateKind::Input | GateKind::Undef => continue,
        };
        circuit.gate_mut(id).state = val;
    }
    circuit
        .outputs()
        .iter()
        .map(|&o| circuit.gate(o).state())
        .collect()
}

/// One simulation cycle: feed, evaluate, refine, optionally log
fn simulate_once(
    circuit: &mut Circuit,
    tx: &[u64],
    mask_len: usize,
    again: bool,
    log: Option<&mut dyn Write>,
) {
    feed_signal(circuit, tx);
    let rx = get_signal(circuit);
    fec::refine(circuit, mask_len, again);
    if let Some(os) = log {
        encode_pattern(tx, &rx, mask_len, os);
    }
}

/// Write one log line per simulated lane: input bits, a space, output bits
fn encode_pattern(tx: &[u64], rx: &[u64], mask_len: usize, os: &mut dyn Write) {
    let mut bit = 1u64 << (mask_len - 1);
    for _ in 0..mask_len {
        for w in tx {
            write!(os, "{}", (w & bit != 0) as u8).unwrap();
        }
        write!(os, " ").unwrap();
        for w in rx {
            write!(os, "{}", (w & bit != 0) as u8).unwrap();
        }
        writeln!(os).unwrap();
        bit >>= 1;
    }
}

fn sort_fecs(circuit: &mut Circuit) {
    let mut fecs = circuit.take_fecs();
    fecs.sort_by_key(|class| class[0].gate());
    circuit.set_fecs(fecs);
}

/// Simulate random 64-lane batches until the partition stops shrinking
pub fn random_sim(circuit: &mut Circuit, seed: u64, mut log: Option<&mut dyn Write>) {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
    let mut tx = vec![0u64; circuit.nb_inputs()];
    let mut count = 0usize;

    fec::init_groups(circuit);
    loop {
        let prev = circuit.fecs().len();
        for t in tx.iter_mut() {
            *t = rng.gen();
        }
        count += 64;
        simulate_once(circuit, &tx, 64, count != 64, log.as_deref_mut());

        print!("\rTotal #FEC Group = {}", circuit.fecs().len());
        std::io::stdout().flush().ok();

        if prev == circuit.fecs().len() || circuit.fecs().is_empty() {
            break;
        }
    }
    sort_fecs(circuit);
    println!("\r{} patterns simulated.", count);
}

/// Simulate the patterns of a file, 64 lanes per batch
pub fn file_sim<R: BufRead>(circuit: &mut Circuit, patterns: R, mut log: Option<&mut dyn Write>) {
    let (count, batches) = parse_patterns(circuit.nb_inputs(), patterns);

    if count > 0 {
        fec::init_groups(circuit);
        for (i, tx) in batches.iter().enumerate() {
            let mask_len = std::cmp::min(64, count - i * 64);
            simulate_once(circuit, tx, mask_len, i != 0, log.as_deref_mut());

            print!("\rTotal #FEC Group = {}", circuit.fecs().len());
            std::io::stdout().flush().ok();
        }
    }
    sort_fecs(circuit);
    println!("\r{} patterns simulated.", count);
}

/// Pack pattern lines into 64-lane batches
///
/// The first line of a batch lands in its highest lane. A malformed line
/// aborts the parse with a diagnostic; complete batches read before it are
/// kept and counted, the partial one is dropped.
fn parse_patterns<R: BufRead>(nb_inputs: usize, r: R) -> (usize, Vec<Vec<u64>>) {
    let mut batches = Vec::new();
    let mut ptn = vec![0u64; nb_inputs];
    let mut count = 0usize;

    for line in r.lines() {
        let Ok(line) = line else {
            break;
        };
        let s: String = line.chars().filter(|ch| !ch.is_whitespace()).collect();
        if s.is_empty() {
            continue;
        }
        if s.len() != nb_inputs {
            println!(
                "\nError: Pattern({}) length({}) does not match the number of inputs({}) in a circuit!!",
                s,
                s.len(),
                nb_inputs
            );
            return (batches.len() * 64, batches);
        }
        for (i, ch) in s.chars().enumerate() {
            match ch {
                '0' => ptn[i] <<= 1,
                '1' => ptn[i] = (ptn[i] << 1) | 1,
                _ => {
                    println!(
                        "\nError: Pattern({}) contains a non-0/1 character('{}').",
                        s, ch
                    );
                    return (batches.len() * 64, batches);
                }
            }
        }
        count += 1;
        if count % 64 == 0 {
            batches.push(std::mem::replace(&mut ptn, vec![0u64; nb_inputs]));
        }
    }
    if count % 64 != 0 {
        batches.push(ptn);
    }
    (count, batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_aiger;

    #[test]
    fn test_file_sim_and_gate() {
        let text = "aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        let patterns = "00\n01\n10\n11\n";
        file_sim(&mut c, patterns.as_bytes(), None);
        // First line is the highest of the four lanes
        assert_eq!(c.gate(1).state() & 0xF, 0b0011);
        assert_eq!(c.gate(2).state() & 0xF, 0b0101);
        assert_eq!(c.gate(3).state() & 0xF, 0b0001);
        assert_eq!(c.gate(4).state() & 0xF, 0b0001);
        // Every signature is distinct, so no candidate survives
        assert!(c.fecs().is_empty());
    }

    #[test]
    fn test_file_sim_groups_twins() {
        let text = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 4 2\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        file_sim(&mut c, "00\n01\n10\n11\n".as_bytes(), None);
        assert_eq!(c.fecs().len(), 1);
        let class = &c.fecs()[0];
        assert_eq!(class.len(), 2);
        assert_eq!(class[0].gate(), 3);
        assert_eq!(class[1].gate(), 4);
    }

    #[test]
    fn test_random_sim_deterministic() {
        let text = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 4 2\n";
        let mut a = read_aiger(text.as_bytes()).unwrap();
        let mut b = read_aiger(text.as_bytes()).unwrap();
        random_sim(&mut a, 7, None);
        random_sim(&mut b, 7, None);
        assert_eq!(a.gate(5).state(), b.gate(5).state());
        assert_eq!(a.fecs(), b.fecs());
    }

    #[test]
    fn test_parse_patterns_batches() {
        let text = "01\n10\n11\n";
        let (count, batches) = parse_patterns(2, text.as_bytes());
        assert_eq!(count, 3);
        assert_eq!(batches, vec![vec![0b011, 0b101]]);
    }

    #[test]
    fn test_parse_patterns_full_batch() {
        let lines = "01\n".repeat(64);
        let (count, batches) = parse_patterns(2, lines.as_bytes());
        assert_eq!(count, 64);
        // No empty trailing batch
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![0, !0u64]);
    }

    #[test]
    fn test_parse_patterns_bad_length() {
        let (count, batches) = parse_patterns(2, "011\n".as_bytes());
        assert_eq!(count, 0);
        assert!(batches.is_empty());
    }

    #[test]
    fn test_parse_patterns_bad_char() {
        let (count, batches) = parse_patterns(2, "01\n0x\n".as_bytes());
        // The partial batch containing the bad line is dropped
        assert_eq!(count, 0);
        assert!(batches.is_empty());
    }

    #[test]
    fn test_parse_patterns_error_keeps_complete_batches() {
        let mut lines = "10\n".repeat(64);
        lines.push_str("111\n");
        let (count, batches) = parse_patterns(2, lines.as_bytes());
        assert_eq!(count, 64);
        assert_eq!(batches.len(), 1);
    }

    #[test]
    fn test_sim_log() {
        let text = "aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n";
        let mut c = read_aiger(text.as_bytes()).unwrap();
        let mut log = Vec::new();
        file_sim(&mut c, "00\n01\n10\n11\n".as_bytes(), Some(&mut log));
        let logged = String::from_utf8(log).unwrap();
        assert_eq!(logged, "00 0\n01 0\n10 0\n11 1\n");
    }
}
