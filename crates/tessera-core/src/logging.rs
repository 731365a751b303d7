//! Logging setup built on `tracing-subscriber`.

/// Default filter: everything from Tessera, only important output from the
/// wgpu stack.
pub const DEFAULT_FILTER: &str = "trace,wgpu_core=info,wgpu_hal=info,naga=info";

/// Install a formatting subscriber with [`DEFAULT_FILTER`].
///
/// A `RUST_LOG` style environment variable is not consulted; use
/// [`init_with_filter`] to pass custom directives.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install a formatting subscriber with the given filter directives.
///
/// Calling this twice is harmless: the second installation is ignored.
pub fn init_with_filter(filter: &str) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();

    if result.is_err() {
        tracing::debug!("Global subscriber already installed, keeping the existing one");
    }
}
