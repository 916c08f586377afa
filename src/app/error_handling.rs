//! Error handling utilities

use tracing::error;

/// Report a fatal error and exit with its status code
///
/// `BrainError`s print their user message, plus the full chain when
/// `verbose >= 1`. Anything else prints its anyhow chain in verbose mode.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    use crate::error::BrainError;

    error!("Fatal error: {:#}", error);

    let exit_code = if let Some(brain_err) = error.downcast_ref::<BrainError>() {
        eprintln!("{}", brain_err.user_message());
        if verbose >= 1 {
            eprintln!("\nContext Chain:\n{}", brain_err.developer_message());
        }
        brain_err.exit_code()
    } else {
        eprintln!("Error: {error}");
        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }
        1
    };

    std::process::exit(exit_code)
}
