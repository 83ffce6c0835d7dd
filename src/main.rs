//! Binary for fraig

#![warn(missing_docs)]

mod cmd;

pub mod fraig;
pub mod io;
pub mod network;
pub mod optim;
pub mod sim;

use clap::Parser;
pub use network::{Circuit, Edge, Gate, GateKind};

#[doc(hidden)]
fn main() {
    let cli = cmd::Cli::parse();

    match cli.command {
        cmd::Commands::Show(a) => a.run(),
        cmd::Commands::Sweep(a) => a.run(optim::sweep),
        cmd::Commands::Optimize(a) => a.run(optim::optimize),
        cmd::Commands::Strash(a) => a.run(fraig::strash),
        cmd::Commands::Simulate(a) => a.run(),
        cmd::Commands::Fraig(a) => a.run(),
    }
}
