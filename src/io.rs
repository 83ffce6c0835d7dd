//! Read and write circuits to files

mod aiger;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub use aiger::read_aiger;
pub use aiger::write_aiger;

use crate::network::Circuit;

/// Parse a circuit from a file
///
/// Following extensions are supported: .aag
pub fn read_network_file(path: &Path) -> Circuit {
    match path.extension() {
        None => panic!("No extension given"),
        Some(s) => {
            if s == "aag" {
                let f = File::open(path).unwrap();
                match read_aiger(f) {
                    Ok(c) => c,
                    Err(e) => {
                        println!("{e}");
                        std::process::exit(1);
                    }
                }
            } else {
                panic!("Unknown extension {}", s.to_string_lossy());
            }
        }
    }
}

/// Write a circuit to a file
///
/// Following extensions are supported: .aag
pub fn write_network_file(path: &Path, circuit: &mut Circuit) {
    match path.extension() {
        None => panic!("No extension given"),
        Some(s) => {
            if s == "aag" {
                let mut f = BufWriter::new(File::create(path).unwrap());
                write_aiger(&mut f, circuit).unwrap();
            } else {
                panic!("Unknown extension {}", s.to_string_lossy());
            }
        }
    }
}
