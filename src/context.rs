use lectern_core::{Archive, LecternConfig, Relay};

/// Everything a request handler needs, built once per invocation from the
/// loaded configuration.
pub struct Context {
    pub archive: Archive,
    streaming: Relay,
    test: Relay,
}

impl Context {
    pub fn new(config: &LecternConfig) -> Self {
        Context {
            archive: Archive::new(&config.archive_dir),
            streaming: Relay::new(&config.streaming_command),
            test: Relay::new(&config.test_command),
        }
    }

    /// Relay for an upload; test uploads go to the test command.
    pub fn relay(&self, test_only: bool) -> &Relay {
        if test_only { &self.test } else { &self.streaming }
    }
}
