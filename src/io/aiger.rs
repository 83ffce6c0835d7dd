//! IO for ASCII AIGER (.aag) files

use std::io::{BufRead, BufReader, Read, Write};

use crate::network::{Circuit, Edge, GateKind};

fn parse_num(tok: &str, line: usize) -> Result<u32, String> {
    tok.parse::<u32>()
        .map_err(|_| format!("Invalid number \"{tok}\" on line {line}"))
}

/// Check a fanin literal against the maximum variable index
fn check_literal(lit: u32, max_var: u32, line: usize) -> Result<(), String> {
    if lit / 2 > max_var {
        Err(format!("Literal {lit} on line {line} is out of range"))
    } else {
        Ok(())
    }
}

/// Read a combinatorial circuit in ASCII AIGER format
///
/// Latches are recognized but not supported: a non-zero L count is an
/// error. Fanin literals without a defining statement become Undef gates.
/// The symbol table and the comment section are preserved.
pub fn read_aiger<R: Read>(r: R) -> Result<Circuit, String> {
    let mut lines = Vec::new();
    for l in BufReader::new(r).lines() {
        match l {
            Ok(s) => lines.push(s),
            Err(_) => return Err("Error during file IO".to_string()),
        }
    }
    let mut cursor = 0;
    let mut next_line = || {
        let ret = lines.get(cursor).cloned();
        cursor += 1;
        ret
    };

    // Header: aag M I L O A
    let header = next_line().ok_or("Missing AIGER header".to_string())?;
    let tokens: Vec<&str> = header.split_whitespace().collect();
    if tokens.len() != 6 || tokens[0] != "aag" {
        return Err(format!("Invalid AIGER header \"{header}\""));
    }
    let max_var = parse_num(tokens[1], 1)?;
    let nb_inputs = parse_num(tokens[2], 1)?;
    let nb_latches = parse_num(tokens[3], 1)?;
    let nb_outputs = parse_num(tokens[4], 1)?;
    let nb_ands = parse_num(tokens[5], 1)?;
    if nb_latches != 0 {
        return Err("Latches are not supported".to_string());
    }
    if nb_inputs as u64 + nb_ands as u64 > max_var as u64 {
        return Err(format!(
            "Maximum variable index {max_var} cannot hold {nb_inputs} inputs and {nb_ands} ands"
        ));
    }

    let mut circuit = Circuit::with_capacity(max_var, nb_outputs);
    let mut lineno = 1;

    // Input definitions
    for _ in 0..nb_inputs {
        lineno += 1;
        let l = next_line().ok_or(format!("Missing input on line {lineno}"))?;
        let lit = parse_num(l.trim(), lineno)?;
        if lit % 2 != 0 {
            return Err(format!("Inverted input literal {lit} on line {lineno}"));
        }
        if lit / 2 == 0 {
            return Err(format!("Input literal {lit} on line {lineno} redefines the constant"));
        }
        check_literal(lit, max_var, lineno)?;
        if circuit.exists(lit / 2) {
            return Err(format!("Variable {} is defined twice", lit / 2));
        }
        circuit.insert(GateKind::Input, lit / 2, lineno as u32);
    }

    // Output definitions; gates are placed beyond the variable range
    let mut output_edges = Vec::new();
    for i in 0..nb_outputs {
        lineno += 1;
        let l = next_line().ok_or(format!("Missing output on line {lineno}"))?;
        let lit = parse_num(l.trim(), lineno)?;
        check_literal(lit, max_var, lineno)?;
        let id = max_var + 1 + i;
        circuit.insert(GateKind::Output, id, lineno as u32);
        output_edges.push((id, lit));
    }

    // And definitions; connections are resolved afterwards
    let mut and_edges = Vec::new();
    for _ in 0..nb_ands {
        lineno += 1;
        let l = next_line().ok_or(format!("Missing and gate on line {lineno}"))?;
        let tokens: Vec<&str> = l.split_whitespace().collect();
        if tokens.len() != 3 {
            return Err(format!("Invalid and gate on line {lineno}"));
        }
        let lhs = parse_num(tokens[0], lineno)?;
        let rhs0 = parse_num(tokens[1], lineno)?;
        let rhs1 = parse_num(tokens[2], lineno)?;
        if lhs % 2 != 0 {
            return Err(format!("Inverted and literal {lhs} on line {lineno}"));
        }
        if lhs / 2 == 0 {
            return Err(format!("And literal {lhs} on line {lineno} redefines the constant"));
        }
        check_literal(lhs, max_var, lineno)?;
        check_literal(rhs0, max_var, lineno)?;
        check_literal(rhs1, max_var, lineno)?;
        if circuit.exists(lhs / 2) {
            return Err(format!("Variable {} is defined twice", lhs / 2));
        }
        circuit.insert(GateKind::And, lhs / 2, lineno as u32);
        and_edges.push((lhs / 2, rhs0, rhs1));
    }

    // Symbol table, then the verbatim comment section
    let mut comment = Vec::new();
    let mut in_comment = false;
    while let Some(l) = next_line() {
        lineno += 1;
        if in_comment {
            comment.push(l);
            continue;
        }
        if l == "c" {
            in_comment = true;
            continue;
        }
        let (kind, rest) = match l.chars().next() {
            Some('i') => (GateKind::Input, &l[1..]),
            Some('o') => (GateKind::Output, &l[1..]),
            _ => return Err(format!("Invalid symbol entry on line {lineno}")),
        };
        let (idx, name) = rest
            .split_once(' ')
            .ok_or(format!("Invalid symbol entry on line {lineno}"))?;
        let idx = parse_num(idx, lineno)? as usize;
        let id = if kind == GateKind::Input {
            *circuit
                .inputs()
                .get(idx)
                .ok_or(format!("Symbol index {idx} on line {lineno} is out of range"))?
        } else {
            *circuit
                .outputs()
                .get(idx)
                .ok_or(format!("Symbol index {idx} on line {lineno} is out of range"))?
        };
        circuit.set_symbol(id, name.to_string());
    }
    circuit.set_comment(comment.join("\n"));

    // Resolve the connections; dangling references become Undef gates
    for (id, rhs0, rhs1) in and_edges {
        for rhs in [rhs0, rhs1] {
            if !circuit.exists(rhs / 2) {
                circuit.insert(GateKind::Undef, rhs / 2, 0);
            }
            circuit.connect(id, Edge::from_literal(rhs));
        }
    }
    for (id, lit) in output_edges {
        if !circuit.exists(lit / 2) {
            circuit.insert(GateKind::Undef, lit / 2, 0);
        }
        circuit.connect(id, Edge::from_literal(lit));
    }

    Ok(circuit)
}

/// Write a circuit in ASCII AIGER format
///
/// And gates are emitted in topological order and the A count reflects the
/// gates reachable from the outputs, so swept or merged gates never
/// reappear. The header M is kept as read.
pub fn write_aiger<W: Write>(w: &mut W, circuit: &mut Circuit) -> std::io::Result<()> {
    let ands: Vec<u32> = circuit
        .dfs()
        .into_iter()
        .filter(|&id| circuit.gate(id).is_and())
        .collect();

    writeln!(
        w,
        "aag {} {} 0 {} {}",
        circuit.max_var(),
        circuit.nb_inputs(),
        circuit.nb_outputs(),
        ands.len()
    )?;
    for &id in circuit.inputs() {
        writeln!(w, "{}", 2 * id)?;
    }
    for &id in circuit.outputs() {
        writeln!(w, "{}", circuit.gate(id).fanin()[0].literal())?;
    }
    for &id in &ands {
        let g = circuit.gate(id);
        writeln!(
            w,
            "{} {} {}",
            2 * id,
            g.fanin()[0].literal(),
            g.fanin()[1].literal()
        )?;
    }
    for (i, &id) in circuit.inputs().iter().enumerate() {
        if let Some(name) = circuit.gate(id).symbol() {
            writeln!(w, "i{} {}", i, name)?;
        }
    }
    for (i, &id) in circuit.outputs().iter().enumerate() {
        if let Some(name) = circuit.gate(id).symbol() {
            writeln!(w, "o{} {}", i, name)?;
        }
    }
    if !circuit.comment().is_empty() {
        writeln!(w, "c")?;
        writeln!(w, "{}", circuit.comment())?;
    }
    Ok(())
}
