//! Scalar ALU.
//!
//! Computes `A = A op B` with 32-bit wrapping arithmetic. The overflow flag
//! comes from a shadow computation in `f64`: O is set when the shadow result
//! differs from the wrapped integer result. This also sets O for a `DIV`
//! that leaves a remainder, and for large products it inherits the rounding
//! of `f64`.

use super::ArithOp;
use crate::error::{Result, VmError};
use crate::interpreter::state::ProcessorState;
use crate::interpreter::traits::{ExecuteResult, Flags};

/// Scalar ALU execution unit.
pub struct ScalarAlu;

impl ScalarAlu {
    /// Execute an arithmetic operation on A and B, storing into A.
    ///
    /// `DIV` with B = 0 fails before anything is modified.
    pub fn execute(op: ArithOp, state: &mut ProcessorState) -> Result<ExecuteResult> {
        let (a, b) = (state.a, state.b);
        let (fa, fb) = (f64::from(a), f64::from(b));

        let (result, shadow) = match op {
            ArithOp::Add => (a.wrapping_add(b), fa + fb),
            ArithOp::Sub => (a.wrapping_sub(b), fa - fb),
            ArithOp::Mul => (a.wrapping_mul(b), fa * fb),
            ArithOp::Div => {
                if b == 0 {
                    return Err(VmError::DivideByZero { pc: state.pc });
                }
                (a.wrapping_div(b), fa / fb)
            }
        };

        let overflow = shadow != f64::from(result);
        log::trace!("{:?} {} {} -> {} (overflow {})", op, a, b, result, overflow);

        state.a = result;
        state.flags = Flags::from_arith(result, overflow);
        Ok(ExecuteResult::Continue)
    }
}
