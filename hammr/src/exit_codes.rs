#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The run completed (also after Ctrl-C); failed requests do not change the code.
    Success = 0,

    /// Invalid CLI/config input (bad flags, unknown handler, missing or malformed config file).
    InvalidInput = 30,

    /// Runtime error (handler init failed, lost worker reports, output IO errors).
    RuntimeError = 40,

    /// A second Ctrl-C while the run was still shutting down; no report was written.
    Interrupted = 130,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
