use env_logger::{Builder, Env, Target};

use crate::stderr_buffer::BufferedStderr;

/// Install the global logger.
///
/// `RUST_LOG` wins when set; otherwise warnings and above are shown, or
/// everything from this crate down to debug with `verbose`. Output goes
/// through the stderr buffer so it cannot tear the dashboard.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "muni_compass=debug,warn" } else { "warn" };

    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .target(Target::Pipe(Box::new(BufferedStderr)))
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)
}
