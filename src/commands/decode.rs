//! `socialctl decode`: short code to media id, offline.

use socialctl_core::shortcode::{decode, extract_shortcode};
use tracing::warn;

use crate::app::exit_handler::{ProcessExit, determine_exit_outcome};

/// Prints `<code>\t<media id>` per target; failures go to stderr.
pub fn run_decode_command(targets: &[String]) -> ProcessExit {
    let mut decoded = 0usize;
    let mut failed = 0usize;

    for target in targets {
        match decode_line(target) {
            Ok(line) => {
                println!("{line}");
                decoded += 1;
            }
            Err(message) => {
                warn!(target = %target, "decode failed");
                eprintln!("error: {message}");
                failed += 1;
            }
        }
    }

    determine_exit_outcome(decoded, failed)
}

fn decode_line(target: &str) -> Result<String, String> {
    let code = extract_shortcode(target).map_err(|error| error.to_string())?;
    let media_id = decode(&code).map_err(|error| error.to_string())?;
    Ok(format!("{code}\t{media_id}"))
}
