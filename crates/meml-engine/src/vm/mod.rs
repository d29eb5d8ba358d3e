//! Evaluation: runtime values, variant elimination, host primitives and the
//! tree-walking interpreter shared by compile time and run time.

pub mod elim;
pub mod error;
pub mod globals;
pub mod host;
pub mod interpreter;
pub mod value;

pub use elim::{eliminate, Deferred, Effect, ElimError, Suspended};
pub use error::VmError;
pub use globals::{GlobalSlot, Globals, MethodTable};
pub use host::{HostContext, HostError, HostPrimitives, HostValue, StandardHost, Transcript};
pub use interpreter::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
pub use value::{Builtin, Closure, Env, Value, VariantValue};
