//! The tree-walking interpreter: gas-metered recursive evaluation of an
//! entity's verb AST, dispatching every `Call` node through the standard
//! opcode registry.

#![deny(unsafe_code)]

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::lambda::Lambda;
use wov_core::value::Value;
use wov_opcodes::{call_lambda, eval_all, Evaluator, OpcodeRegistry};

/// Evaluates AST nodes against a fixed opcode registry. Cheap to clone
/// (holds only a reference-counted registry), so one instance is shared by
/// the whole server.
pub struct Interpreter {
    registry: OpcodeRegistry,
}

impl Interpreter {
    #[must_use]
    pub fn new(registry: OpcodeRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &OpcodeRegistry {
        &self.registry
    }
}

#[async_trait]
impl Evaluator for Interpreter {
    /// Evaluate one AST node. Every node, literal or call, costs one unit
    /// of gas; a verb that runs out mid-evaluation fails with
    /// [`WovError::GasExhausted`] rather than running to completion on
    /// borrowed time.
    async fn eval(&self, ctx: &mut Context, node: &Ast) -> Result<Value> {
        if !ctx.gas.spend() {
            return Err(WovError::GasExhausted);
        }

        match node {
            Ast::Literal { value } => Ok(value.clone()),
            Ast::Call { op, args } => {
                if let Some(opcode) = self.registry.get(op) {
                    return opcode.execute(ctx, args, self).await;
                }
                // Not a builtin opcode: check whether it names a local
                // variable holding a closure (`let f = lambda(...); f(1)`).
                if let Some(value) = ctx.get_var(op).cloned() {
                    if let Some(lambda) = Lambda::from_value(&value) {
                        let evaluated_args = eval_all(ctx, args, self).await?;
                        return call_lambda(ctx, &lambda, evaluated_args, self).await;
                    }
                }
                Err(WovError::MethodNotFound(op.clone()))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use wov_core::context::GasMeter;
    use wov_core::ids::EntityId;
    use wov_core::world::{CapabilityMatch, World};

    use super::*;

    struct NoopWorld;

    #[async_trait]
    impl World for NoopWorld {
        async fn get_entity(&self, id: EntityId) -> Result<wov_core::model::Entity> {
            Ok(wov_core::model::Entity::new(id, "noop", None))
        }
        async fn create_entity(&self, name: &str, owner_id: Option<EntityId>) -> Result<wov_core::model::Entity> {
            Ok(wov_core::model::Entity::new(EntityId(1), name, owner_id))
        }
        async fn destroy_entity(&self, _id: EntityId) -> Result<()> {
            Ok(())
        }
        async fn set_entity_prop(&self, _id: EntityId, _key: &str, _value: Value) -> Result<()> {
            Ok(())
        }
        async fn get_prototype(&self, _id: EntityId) -> Result<Option<EntityId>> {
            Ok(None)
        }
        async fn set_prototype(&self, _id: EntityId, _prototype_id: Option<EntityId>) -> Result<()> {
            Ok(())
        }
        async fn resolve_props(&self, _id: EntityId) -> Result<(std::collections::BTreeMap<String, Value>, Vec<String>)> {
            Ok((std::collections::BTreeMap::new(), Vec::new()))
        }
        async fn list_verbs(&self, _entity_id: EntityId) -> Result<Vec<wov_core::model::Verb>> {
            Ok(Vec::new())
        }
        async fn get_verb(&self, _entity_id: EntityId, _name: &str) -> Result<Option<wov_core::model::Verb>> {
            Ok(None)
        }
        async fn resolve_verb(&self, _entity_id: EntityId, _name: &str) -> Result<Option<(EntityId, wov_core::model::Verb)>> {
            Ok(None)
        }
        async fn set_verb(&self, entity_id: EntityId, _name: &str, _source: Ast) -> Result<wov_core::ids::VerbId> {
            let _ = entity_id;
            Ok(wov_core::ids::VerbId(1))
        }
        async fn mint_capability(
            &self,
            _authority: wov_core::ids::CapabilityId,
            _caller: EntityId,
            _cap_type: &str,
            _params: std::collections::BTreeMap<String, Value>,
        ) -> Result<wov_core::model::Capability> {
            unreachable!("not exercised by these tests")
        }
        async fn delegate_capability(
            &self,
            _parent: wov_core::ids::CapabilityId,
            _caller: EntityId,
            _restrictions: std::collections::BTreeMap<String, Value>,
        ) -> Result<wov_core::model::Capability> {
            unreachable!("not exercised by these tests")
        }
        async fn give_capability(&self, _cap: wov_core::ids::CapabilityId, _caller: EntityId, _target: EntityId) -> Result<()> {
            unreachable!("not exercised by these tests")
        }
        async fn grant_entity_control(&self, _owner: EntityId, _target: EntityId) -> Result<wov_core::model::Capability> {
            unreachable!("not exercised by these tests")
        }
        async fn check_capability(
            &self,
            _cap: wov_core::ids::CapabilityId,
            _caller: EntityId,
            _expected_type: &str,
            _predicate: CapabilityMatch,
        ) -> Result<wov_core::model::Capability> {
            unreachable!("not exercised by these tests")
        }
        async fn find_capability(
            &self,
            _owner: EntityId,
            _cap_type: &str,
            _filter: Option<&std::collections::BTreeMap<String, Value>>,
        ) -> Result<Option<wov_core::model::Capability>> {
            Ok(None)
        }
        async fn schedule_task(
            &self,
            _entity_id: EntityId,
            _verb: &str,
            _args: Vec<Value>,
            _execute_at: chrono::DateTime<chrono::Utc>,
        ) -> Result<wov_core::ids::TaskId> {
            unreachable!("not exercised by these tests")
        }
        fn publish(&self, _target: EntityId, _method: &str, _params: serde_json::Value) {}
        async fn fs_read(&self, _path: &str) -> Result<String> {
            unreachable!("not exercised by these tests")
        }
        async fn fs_write(&self, _path: &str, _content: &str) -> Result<()> {
            unreachable!("not exercised by these tests")
        }
        async fn fs_list(&self, _path: &str) -> Result<Vec<String>> {
            unreachable!("not exercised by these tests")
        }
        async fn http_get(&self, _url: &str) -> Result<Value> {
            unreachable!("not exercised by these tests")
        }
        async fn http_post(&self, _url: &str, _body: Value) -> Result<Value> {
            unreachable!("not exercised by these tests")
        }
    }

    fn root_context() -> Context {
        Context::root(EntityId(1), EntityId(1), "test", Vec::new(), Arc::new(GasMeter::new(10_000)), Arc::new(NoopWorld), EntityId(2))
    }

    #[tokio::test]
    async fn arithmetic_evaluates_left_to_right() {
        let interpreter = Interpreter::new(wov_opcodes::standard_registry());
        let mut ctx = root_context();
        let ast = Ast::call("+", vec![Ast::literal(Value::int(1)), Ast::literal(Value::int(2)), Ast::literal(Value::int(3))]);
        let result = interpreter.eval(&mut ctx, &ast).await.unwrap();
        assert_eq!(result, Value::int(6));
    }

    #[tokio::test]
    async fn if_short_circuits_the_untaken_branch() {
        let interpreter = Interpreter::new(wov_opcodes::standard_registry());
        let mut ctx = root_context();
        // The else branch would throw if evaluated; since cond is true it
        // must never run.
        let ast = Ast::call(
            "if",
            vec![Ast::literal(Value::Bool(true)), Ast::literal(Value::int(1)), Ast::call("throw", vec![Ast::literal(Value::str("boom"))])],
        );
        let result = interpreter.eval(&mut ctx, &ast).await.unwrap();
        assert_eq!(result, Value::int(1));
    }

    #[tokio::test]
    async fn gas_exhaustion_halts_evaluation() {
        let interpreter = Interpreter::new(wov_opcodes::standard_registry());
        let mut ctx = root_context();
        ctx.gas = Arc::new(GasMeter::new(1));
        let ast = Ast::call("+", vec![Ast::literal(Value::int(1)), Ast::literal(Value::int(2))]);
        let err = interpreter.eval(&mut ctx, &ast).await.unwrap_err();
        assert!(matches!(err, WovError::GasExhausted));
    }

    #[tokio::test]
    async fn let_then_var_round_trips_a_local() {
        let interpreter = Interpreter::new(wov_opcodes::standard_registry());
        let mut ctx = root_context();
        let ast = Ast::call(
            "seq",
            vec![
                Ast::call("let", vec![Ast::literal(Value::str("x")), Ast::literal(Value::int(42))]),
                Ast::call("var", vec![Ast::literal(Value::str("x"))]),
            ],
        );
        let result = interpreter.eval(&mut ctx, &ast).await.unwrap();
        assert_eq!(result, Value::int(42));
    }

    #[tokio::test]
    async fn lambda_closes_over_enclosing_scope() {
        let interpreter = Interpreter::new(wov_opcodes::standard_registry());
        let mut ctx = root_context();
        // let y = 10; let f = lambda([x], x + y); f(5)
        let ast = Ast::call(
            "seq",
            vec![
                Ast::call("let", vec![Ast::literal(Value::str("y")), Ast::literal(Value::int(10))]),
                Ast::call(
                    "let",
                    vec![
                        Ast::literal(Value::str("f")),
                        Ast::call(
                            "lambda",
                            vec![
                                Ast::literal(Value::List(vec![Value::str("x")])),
                                Ast::call("+", vec![Ast::call("var", vec![Ast::literal(Value::str("x"))]), Ast::call("var", vec![Ast::literal(Value::str("y"))])]),
                            ],
                        ),
                    ],
                ),
                Ast::call("f", vec![Ast::literal(Value::int(5))]),
            ],
        );
        let result = interpreter.eval(&mut ctx, &ast).await.unwrap();
        assert_eq!(result, Value::int(15));
    }
}
