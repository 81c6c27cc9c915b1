//! Convenience re-exports for downstream crates.

pub use crate::ast::Ast;
pub use crate::config::Config;
pub use crate::context::{Context, GasMeter, StackFrame};
pub use crate::error::{Result, WovError};
pub use crate::ids::{CapabilityId, EntityId, IdSequence, SessionId, TaskId, VerbId};
pub use crate::lambda::Lambda;
pub use crate::model::{Capability, Entity, ScheduledTask, Session, Verb};
pub use crate::value::{Number, Value};
pub use crate::world::{CapabilityMatch, World};
