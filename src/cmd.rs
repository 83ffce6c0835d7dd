//! Command line interface

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::fraig::fraig;
use crate::io::{read_network_file, write_network_file};
use crate::sim::{file_sim, random_sim};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a circuit
    ///
    /// Will print the number of inputs, outputs and gates, and list the
    /// floating and unused gates.
    #[clap()]
    Show(ShowArgs),

    /// Remove the gates no output depends on
    #[clap()]
    Sweep(PassArgs),

    /// Apply local rewrites to constant or duplicated fanins
    #[clap(alias = "opt")]
    Optimize(PassArgs),

    /// Merge gates with structurally identical fanins
    #[clap()]
    Strash(PassArgs),

    /// Simulate a circuit and collect equivalence candidates
    ///
    /// Random patterns are generated until the candidate classes stop
    /// shrinking, or patterns are read from a file with one line of 0/1
    /// characters per input vector:
    ///    0110
    ///    1011
    #[clap(alias = "sim")]
    Simulate(SimulateArgs),

    /// Prove equivalence candidates and merge the proven ones
    ///
    /// Runs random simulation to gather candidates, then dispatches one
    /// SAT query per candidate pair and merges each proven equivalence.
    #[clap()]
    Fraig(FraigArgs),
}

/// Command arguments for circuit informations
#[derive(Args)]
pub struct ShowArgs {
    /// Circuit to show
    file: PathBuf,
}

impl ShowArgs {
    pub fn run(&self) {
        let circuit = read_network_file(&self.file);
        print!("{}", circuit);
        let floating = circuit.floating_ids();
        if !floating.is_empty() {
            println!("Floating gates: {:?}", floating);
        }
        let notused = circuit.not_used_ids();
        if !notused.is_empty() {
            println!("Unused gates: {:?}", notused);
        }
    }
}

/// Command arguments for the rewrite passes
#[derive(Args)]
pub struct PassArgs {
    /// Circuit to transform
    file: PathBuf,

    /// Output file for the transformed circuit
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl PassArgs {
    pub fn run(&self, pass: fn(&mut crate::Circuit)) {
        let mut circuit = read_network_file(&self.file);
        pass(&mut circuit);
        write_network_file(&self.output, &mut circuit);
    }
}

/// Command arguments for simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Circuit to simulate
    network: PathBuf,

    /// Input patterns file; random patterns are used when absent
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Log file receiving one input/output line per simulated pattern
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Seed for random pattern generation
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl SimulateArgs {
    pub fn run(&self) {
        let mut circuit = read_network_file(&self.network);
        let mut log = self
            .output
            .as_ref()
            .map(|p| BufWriter::new(File::create(p).unwrap()));
        let log_ref = log.as_mut().map(|w| w as &mut dyn Write);
        match &self.input {
            Some(p) => {
                let f = BufReader::new(File::open(p).unwrap());
                file_sim(&mut circuit, f, log_ref);
            }
            None => random_sim(&mut circuit, self.seed, log_ref),
        }
    }
}

/// Command arguments for fraiging
#[derive(Args)]
pub struct FraigArgs {
    /// Circuit to reduce
    file: PathBuf,

    /// Output file for the reduced circuit
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Seed for the candidate-gathering simulation
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl FraigArgs {
    pub fn run(&self) {
        let mut circuit = read_network_file(&self.file);
        random_sim(&mut circuit, self.seed, None);
        fraig(&mut circuit);
        write_network_file(&self.output, &mut circuit);
    }
}
