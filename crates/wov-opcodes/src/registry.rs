//! The opcode registry: a flat name-keyed map populated once at startup,
//! looked up by name on every `Call` node.

use std::collections::HashMap;
use std::sync::Arc;

use crate::meta::OpcodeMeta;
use crate::opcode::Opcode;

#[derive(Default)]
pub struct OpcodeRegistry {
    opcodes: HashMap<&'static str, Arc<dyn Opcode>>,
}

impl OpcodeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, opcode: impl Opcode + 'static) {
        self.opcodes.insert(opcode.name(), Arc::new(opcode));
    }

    /// Register an already-`Arc`-wrapped opcode, as contributed by
    /// `wov-plugins` (whose opcodes are shared behind `Arc<dyn Opcode>`
    /// from the moment a plugin declares them).
    pub fn register_arc(&mut self, opcode: Arc<dyn Opcode>) {
        self.opcodes.insert(opcode.name(), opcode);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Opcode>> {
        self.opcodes.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.opcodes.contains_key(name)
    }

    /// Metadata for every registered opcode, for the gateway's
    /// `get_opcodes` RPC method.
    #[must_use]
    pub fn all_metadata(&self) -> Vec<OpcodeMeta> {
        let mut meta: Vec<_> = self.opcodes.values().map(|op| op.metadata()).collect();
        meta.sort_by_key(|m| m.name);
        meta
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }
}
