//! Shared test-only `Coroutine` stub, used across this crate's unit
//! tests so each module doesn't redefine one.

use timerloop_core::{Coroutine, CoroutineRef, FinishReason};

#[derive(Default)]
pub struct StubCoroutine {
    pub started: bool,
    pub resumed: u32,
    pub finished_as: Option<FinishReason>,
}

impl Coroutine for StubCoroutine {
    fn start(&mut self) {
        self.started = true;
    }

    fn resume(&mut self) {
        self.resumed += 1;
    }

    fn on_finish(&mut self, reason: FinishReason) -> Option<CoroutineRef> {
        self.finished_as = Some(reason);
        None
    }

    fn parent(&self) -> Option<CoroutineRef> {
        None
    }
}
