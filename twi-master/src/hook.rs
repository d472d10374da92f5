//! Error observation
//!
//! The bus reports each recorded failure synchronously through an
//! [`ErrorHook`] before the failing primitive returns.

use crate::error::ErrorKind;

/// Observer for bus failures
pub trait ErrorHook {
    /// Called once for every failure the bus records
    fn on_error(&mut self, kind: ErrorKind);
}

impl<F: FnMut(ErrorKind)> ErrorHook for F {
    fn on_error(&mut self, kind: ErrorKind) {
        self(kind)
    }
}

/// Hook that ignores failures
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl ErrorHook for NoHook {
    fn on_error(&mut self, _kind: ErrorKind) {}
}
