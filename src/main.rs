use anyhow::Context;
use brainswitchery::{Checkpoint, Error};
use structopt::StructOpt;

mod cli;

/// Prints each step of the conversion to stdout
fn print_progress(checkpoint: Checkpoint) {
    match checkpoint {
        Checkpoint::LoadStart => println!("Opening input binary..."),
        Checkpoint::LoadDone { size } => println!("Reading binary... FileSize: {} OK", size),
        Checkpoint::WriteStart => println!("Opening output binary..."),
        Checkpoint::WriteDone { size } => println!("Writing output... {} bytes OK", size),
    }
}

fn main() -> Result<(), anyhow::Error> {
    // Create a logger with a timestamp that logs everything at the level given in RUST_LOG
    pretty_env_logger::init_timed();

    // Parse the command-line arguments
    let opts = cli::Opts::from_args();
    let job = opts.to_job().context("Invalid configuration")?;

    job.run(&mut print_progress).map_err(|err| {
        let step = match err {
            Error::InputOpenError(..) => "Failed to read input binary",
            Error::OutputOpenError(..) | Error::IoError(_) => "Failed to write output",
            _ => "Invalid configuration",
        };

        anyhow::Error::new(err).context(step)
    })?;

    Ok(())
}
