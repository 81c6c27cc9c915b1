//! The interpreter's execution context: everything in scope for one verb
//! invocation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::ids::EntityId;
use crate::value::Value;
use crate::world::World;

/// Shared, cheaply-cloned gas counter. Shared by reference (not copied) into
/// every nested `call`/`sudo` context so that recursive verb calls draw from
/// one budget rather than resetting it per frame.
#[derive(Debug)]
pub struct GasMeter {
    remaining: AtomicI64,
}

impl GasMeter {
    #[must_use]
    pub fn new(limit: u64) -> Self {
        Self { remaining: AtomicI64::new(limit as i64) }
    }

    /// Spend one unit of gas, returning `false` once the budget is
    /// exhausted. Each AST node evaluated costs exactly one unit.
    pub fn spend(&self) -> bool {
        self.remaining.fetch_sub(1, Ordering::Relaxed) > 0
    }

    #[must_use]
    pub fn remaining(&self) -> i64 {
        self.remaining.load(Ordering::Relaxed)
    }
}

/// One `call`/`sudo` stack frame, for error stack traces and recursion
/// bookkeeping.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub entity_id: EntityId,
    pub verb: String,
}

impl std::fmt::Display for StackFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.entity_id, self.verb)
    }
}

/// The interpreter's per-invocation execution context.
///
/// A fresh `Context` is built for every top-level verb dispatch and for
/// every nested `call`/`sudo`; `gas` and `world` are shared (`Arc`) across
/// the whole call tree, everything else is local to the frame.
pub struct Context {
    /// The entity `call`/`sudo` attributes this invocation to. A plain
    /// `call` leaves it unchanged; `sudo` sets it to the impersonated
    /// entity (full impersonation — `caller == this` inside the
    /// impersonated verb).
    pub caller: EntityId,
    /// The entity the currently-running verb is attached to.
    pub this: EntityId,
    pub args: Vec<Value>,
    /// Lexically-scoped local variables (`let`/`var`/`set`). Not shared with
    /// the calling frame; lambdas copy the enclosing scope at creation time.
    pub vars: HashMap<String, Value>,
    pub gas: Arc<GasMeter>,
    /// Non-fatal diagnostics surfaced to the caller alongside the return
    /// value, e.g. from a failed `get_p` override during `resolve_props`.
    pub warnings: Vec<String>,
    /// Innermost-last; rendered innermost-first in `WovError::ScriptError`.
    pub stack: Vec<StackFrame>,
    pub world: Arc<dyn World>,
    /// The well-known automation account id (`Config::bot_id`).
    pub bot_id: EntityId,
    /// Set by `sudo` to the entity that invoked `sudo` (before
    /// impersonation overwrites `caller`/`this`), and inherited by anything
    /// nested inside it. `send` rewrites itself into a `forward`
    /// notification addressed back to the Bot whenever this is
    /// `Some(bot_id)` — the Bot has no live session of its own, so a
    /// message emitted while it is impersonating someone else has nowhere
    /// to land except its own controller.
    pub sudo_origin: Option<EntityId>,
}

impl Context {
    #[must_use]
    pub fn root(
        caller: EntityId,
        this: EntityId,
        verb: impl Into<String>,
        args: Vec<Value>,
        gas: Arc<GasMeter>,
        world: Arc<dyn World>,
        bot_id: EntityId,
    ) -> Self {
        Self {
            caller,
            this,
            args,
            vars: HashMap::new(),
            gas,
            warnings: Vec::new(),
            stack: vec![StackFrame { entity_id: this, verb: verb.into() }],
            world,
            bot_id,
            sudo_origin: None,
        }
    }

    /// Build the context for a nested `call`/`sudo` invocation: fresh local
    /// scope, shared gas, extended stack.
    #[must_use]
    pub fn nested(&self, caller: EntityId, this: EntityId, verb: impl Into<String>, args: Vec<Value>) -> Self {
        let mut stack = self.stack.clone();
        stack.push(StackFrame { entity_id: this, verb: verb.into() });
        Self {
            caller,
            this,
            args,
            vars: HashMap::new(),
            gas: Arc::clone(&self.gas),
            warnings: Vec::new(),
            stack,
            world: Arc::clone(&self.world),
            bot_id: self.bot_id,
            sudo_origin: self.sudo_origin,
        }
    }

    /// Build the context a lambda body runs in: the same identity, gas,
    /// world, and stack as the enclosing frame, but `vars` replaced with
    /// the lambda's captured scope merged with its parameter bindings.
    #[must_use]
    pub fn for_lambda(&self, vars: HashMap<String, Value>) -> Self {
        Self {
            caller: self.caller,
            this: self.this,
            args: Vec::new(),
            vars,
            gas: Arc::clone(&self.gas),
            warnings: Vec::new(),
            stack: self.stack.clone(),
            world: Arc::clone(&self.world),
            bot_id: self.bot_id,
            sudo_origin: self.sudo_origin,
        }
    }

    #[must_use]
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }
}
