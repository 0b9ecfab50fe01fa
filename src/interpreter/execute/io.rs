//! I/O unit: `INP` and `OUT` through the host's [`NumberIo`].

use crate::interpreter::state::ProcessorState;
use crate::interpreter::traits::{ExecuteResult, Flags, NumberIo};

/// I/O execution unit.
pub struct IoUnit;

impl IoUnit {
    /// `INP`: read a number into A. Z and N follow A, O is cleared.
    pub fn input<IO: NumberIo>(state: &mut ProcessorState, io: &mut IO) -> ExecuteResult {
        let value = io.read_number();
        state.a = value;
        state.flags = Flags::from_value(value);
        ExecuteResult::Continue
    }

    /// `OUT`: write A.
    pub fn output<IO: NumberIo>(state: &ProcessorState, io: &mut IO) -> ExecuteResult {
        io.write_number(state.a);
        ExecuteResult::Continue
    }
}
