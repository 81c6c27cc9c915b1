//! The top-level verb dispatch entry point: resolve, run, and translate any
//! escaped `throw` into a `ScriptError` with a stack trace — the same
//! boundary behavior `wov-opcodes::ops::verb::invoke` applies to nested
//! `call`/`sudo`, applied once more at the outermost frame.

use std::sync::Arc;

use wov_core::context::{Context, GasMeter};
use wov_core::error::{Result, WovError};
use wov_core::ids::EntityId;
use wov_core::value::Value;
use wov_core::world::World;
use wov_core::Config;
use wov_interpreter::Interpreter;
use wov_opcodes::Evaluator;

/// Runs verbs against a [`World`] and a fixed [`Interpreter`]. One instance
/// per server, shared by `wov-gateway` and `wov-scheduler` alike.
pub struct Dispatcher {
    world: Arc<dyn World>,
    interpreter: Arc<Interpreter>,
    config: Config,
}

impl Dispatcher {
    #[must_use]
    pub fn new(world: Arc<dyn World>, interpreter: Arc<Interpreter>, config: Config) -> Self {
        Self { world, interpreter, config }
    }

    #[must_use]
    pub fn world(&self) -> &Arc<dyn World> {
        &self.world
    }

    /// Resolve `verb_name` on `this` (walking its prototype chain), run it
    /// under a fresh root context with `caller` as the originating entity,
    /// and return its result alongside any warnings accumulated along the
    /// way.
    pub async fn execute(&self, caller: EntityId, this: EntityId, verb_name: &str, args: Vec<Value>) -> Result<(Value, Vec<String>)> {
        let resolved = self
            .world
            .resolve_verb(this, verb_name)
            .await?
            .ok_or_else(|| WovError::VerbNotFound { entity: this.to_string(), verb: verb_name.to_string() })?;
        let (_, verb) = resolved;

        let gas = Arc::new(GasMeter::new(self.config.gas_limit));
        let mut ctx = Context::root(caller, this, verb_name, args, gas, Arc::clone(&self.world), self.config.bot_id);

        match self.interpreter.eval(&mut ctx, &verb.source).await {
            Ok(value) => Ok((value, ctx.warnings)),
            Err(WovError::Return(value)) => Ok((value, ctx.warnings)),
            Err(WovError::Thrown(value)) => {
                let mut stack: Vec<String> = ctx.stack.iter().rev().map(ToString::to_string).collect();
                stack.push(value.to_string());
                Err(WovError::ScriptError { message: value.to_string(), stack })
            },
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use wov_capabilities::CapabilityKernel;
    use wov_core::ast::Ast;
    use wov_core::value::Value;
    use wov_events::EventBus;
    use wov_repository::Repository;

    use super::*;
    use crate::world_impl::WorldImpl;

    async fn harness() -> (Arc<Repository>, Dispatcher, Arc<CapabilityKernel>) {
        let (repo, dispatcher, capabilities, _events) = harness_with_events().await;
        (repo, dispatcher, capabilities)
    }

    async fn harness_with_events() -> (Arc<Repository>, Dispatcher, Arc<CapabilityKernel>, EventBus) {
        let repo = Arc::new(Repository::connect_memory().await.unwrap());
        let capabilities = Arc::new(CapabilityKernel::new(repo.clone()));
        let events = EventBus::new();
        let fs_root = std::env::temp_dir().join("wov-dispatch-tests");

        let config = Config::from_env();
        let world_impl = Arc::new(WorldImpl::new(repo.clone(), capabilities.clone(), events.clone(), fs_root, config.bot_id).await.unwrap());
        let world: Arc<dyn World> = world_impl.clone();
        let interpreter = Arc::new(Interpreter::new(wov_opcodes::standard_registry()));
        world_impl.wire(world.clone(), interpreter.clone());

        let dispatcher = Dispatcher::new(world, interpreter, config);
        (repo, dispatcher, capabilities, events)
    }

    #[tokio::test]
    async fn executes_a_trivial_verb_and_returns_its_value() {
        let (repo, dispatcher, _caps) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let rock = repo.create_entity(&seq, "Rock", None).await.unwrap();
        repo.update_verb(&seq, rock.id, "describe", Ast::literal(Value::str("a rock"))).await.unwrap();

        let (result, warnings) = dispatcher.execute(rock.id, rock.id, "describe", vec![]).await.unwrap();
        assert_eq!(result, Value::str("a rock"));
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn verb_not_found_is_reported_as_such() {
        let (repo, dispatcher, _caps) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let rock = repo.create_entity(&seq, "Rock", None).await.unwrap();

        let err = dispatcher.execute(rock.id, rock.id, "nonexistent", vec![]).await.unwrap_err();
        assert!(matches!(err, WovError::VerbNotFound { .. }));
    }

    #[tokio::test]
    async fn uncaught_throw_becomes_a_script_error_with_a_stack() {
        let (repo, dispatcher, _caps) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let rock = repo.create_entity(&seq, "Rock", None).await.unwrap();
        let ast = Ast::call("throw", vec![Ast::literal(Value::str("boom"))]);
        repo.update_verb(&seq, rock.id, "explode", ast).await.unwrap();

        let err = dispatcher.execute(rock.id, rock.id, "explode", vec![]).await.unwrap_err();
        match err {
            WovError::ScriptError { message, stack } => {
                assert_eq!(message, "boom");
                assert!(!stack.is_empty());
            },
            other => panic!("expected ScriptError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verb_dispatch_respects_the_gas_budget() {
        let (repo, _dispatcher, caps) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let rock = repo.create_entity(&seq, "Rock", None).await.unwrap();
        // An infinite loop must be halted by gas, not run forever.
        let ast = Ast::call("while", vec![Ast::literal(Value::Bool(true)), Ast::literal(Value::int(1))]);
        repo.update_verb(&seq, rock.id, "spin", ast).await.unwrap();

        let events = EventBus::new();
        let fs_root = std::env::temp_dir().join("wov-dispatch-tests-gas");
        let mut config = Config::from_env();
        config.gas_limit = 50;
        let world_impl = Arc::new(WorldImpl::new(repo.clone(), caps.clone(), events, fs_root, config.bot_id).await.unwrap());
        let world: Arc<dyn World> = world_impl.clone();
        let interpreter = Arc::new(Interpreter::new(wov_opcodes::standard_registry()));
        world_impl.wire(world.clone(), interpreter.clone());
        let dispatcher = Dispatcher::new(world, interpreter, config);

        let err = dispatcher.execute(rock.id, rock.id, "spin", vec![]).await.unwrap_err();
        assert!(matches!(err, WovError::GasExhausted));
    }

    #[tokio::test]
    async fn gated_create_requires_sys_create_capability() {
        let (repo, dispatcher, caps) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let alice = repo.create_entity(&seq, "Alice", None).await.unwrap();
        let authority = repo.create_capability(alice.id, "sys.mint", BTreeMap::from([("namespace".into(), Value::str("*"))])).await.unwrap();
        let minted = caps.mint(authority.id, alice.id, "sys.create", BTreeMap::new()).await.unwrap();

        let data = Value::Object(BTreeMap::from([("name".to_string(), Value::str("Widget"))]));
        let ast = Ast::call("create", vec![Ast::literal(Value::str(minted.id.to_string())), Ast::literal(data)]);
        repo.update_verb(&seq, alice.id, "make_widget", ast).await.unwrap();

        let (result, _) = dispatcher.execute(alice.id, alice.id, "make_widget", vec![]).await.unwrap();
        let Value::Object(created) = result else { panic!("expected an entity object") };
        assert_eq!(created.get("name"), Some(&Value::str("Widget")));
        let new_id = created.get("id").and_then(Value::as_i64).map(wov_core::EntityId).unwrap();
        assert!(caps.has_capability(alice.id, "entity.control", Some(&BTreeMap::from([("target_id".to_string(), Value::int(new_id.0))]))).await.unwrap());
    }

    #[tokio::test]
    async fn create_without_capability_is_denied() {
        let (repo, dispatcher, _caps) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let alice = repo.create_entity(&seq, "Alice", None).await.unwrap();
        let fake_cap = wov_core::CapabilityId::new();
        let data = Value::Object(BTreeMap::from([("name".to_string(), Value::str("Widget"))]));
        let ast = Ast::call("create", vec![Ast::literal(Value::str(fake_cap.to_string())), Ast::literal(data)]);
        repo.update_verb(&seq, alice.id, "make_widget", ast).await.unwrap();

        let err = dispatcher.execute(alice.id, alice.id, "make_widget", vec![]).await.unwrap_err();
        assert!(matches!(err, WovError::CapabilityDenied { .. }));
    }

    #[tokio::test]
    async fn prototype_dispatch_finds_a_verb_defined_on_the_prototype() {
        let (repo, dispatcher, _caps) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let proto = repo.create_entity(&seq, "ItemProto", None).await.unwrap();
        repo.update_verb(&seq, proto.id, "describe", Ast::literal(Value::str("a generic item"))).await.unwrap();
        let child = repo.create_entity(&seq, "Sword", None).await.unwrap();
        repo.set_prototype_id(child.id, Some(proto.id)).await.unwrap();

        let (result, _) = dispatcher.execute(child.id, child.id, "describe", vec![]).await.unwrap();
        assert_eq!(result, Value::str("a generic item"));
    }

    #[tokio::test]
    async fn resolve_props_merges_get_p_override_with_base_props() {
        let (repo, dispatcher, _caps) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let rock = repo.create_entity(&seq, "Rock", None).await.unwrap();
        let mut entity = repo.get_entity(rock.id).await.unwrap().unwrap();
        entity.props.insert("weight".to_string(), Value::int(5));
        repo.update_entities(&[entity]).await.unwrap();

        let ast = Ast::call("obj.new", vec![Ast::literal(Value::str("color")), Ast::literal(Value::str("grey"))]);
        repo.update_verb(&seq, rock.id, "get_p", ast).await.unwrap();

        let props = dispatcher.world().resolve_props(rock.id).await.unwrap();
        assert_eq!(props.0.get("weight"), Some(&Value::int(5)));
        assert_eq!(props.0.get("color"), Some(&Value::str("grey")));
        assert!(props.1.is_empty());
    }

    #[tokio::test]
    async fn send_message_shapes_a_bare_string_into_text_and_type() {
        let (repo, dispatcher, _caps, events) = harness_with_events().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let proto = repo.create_entity(&seq, "GreeterProto", None).await.unwrap();
        let ast = Ast::call("send", vec![Ast::literal(Value::str("message")), Ast::literal(Value::str("hi"))]);
        repo.update_verb(&seq, proto.id, "greet", ast).await.unwrap();
        let child = repo.create_entity(&seq, "Greeter", None).await.unwrap();
        repo.set_prototype_id(child.id, Some(proto.id)).await.unwrap();

        let mut receiver = events.subscribe();
        dispatcher.execute(child.id, child.id, "greet", vec![]).await.unwrap();

        let notification = receiver.recv_for(child.id).await.unwrap();
        assert_eq!(notification.method, "message");
        assert_eq!(notification.params, serde_json::json!({"text": "hi", "type": "info"}));
    }

    #[tokio::test]
    async fn schedule_uses_this_as_the_entity_and_delay_ms_as_relative() {
        let (repo, dispatcher, _caps, _events) = harness_with_events().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let clock = repo.create_entity(&seq, "Clock", None).await.unwrap();
        let ast = Ast::call("schedule", vec![Ast::literal(Value::str("tick")), Ast::literal(Value::List(vec![])), Ast::literal(Value::int(50))]);
        repo.update_verb(&seq, clock.id, "arm", ast).await.unwrap();

        let before = chrono::Utc::now();
        dispatcher.execute(clock.id, clock.id, "arm", vec![]).await.unwrap();
        let after = chrono::Utc::now();

        let due = repo.take_due_tasks(after + chrono::Duration::milliseconds(51)).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].entity_id, clock.id);
        assert_eq!(due[0].verb, "tick");
        assert!(due[0].execute_at >= before + chrono::Duration::milliseconds(50));
        assert!(due[0].execute_at <= after + chrono::Duration::milliseconds(50));
    }

    #[tokio::test]
    async fn sudo_impersonation_forwards_sends_back_to_the_originating_bot() {
        let repo = Arc::new(Repository::connect_memory().await.unwrap());
        let capabilities = Arc::new(CapabilityKernel::new(repo.clone()));
        let events = EventBus::new();
        let fs_root = std::env::temp_dir().join("wov-dispatch-tests-sudo");
        let seq = wov_core::IdSequence::starting_after(0);

        let bot = repo.create_entity(&seq, "Bot", None).await.unwrap();
        let target = repo.create_entity(&seq, "Target", None).await.unwrap();
        let ast = Ast::call("send", vec![Ast::literal(Value::str("message")), Ast::literal(Value::str("Hello!"))]);
        repo.update_verb(&seq, target.id, "say_hello", ast).await.unwrap();

        let mut config = Config::from_env();
        config.bot_id = bot.id;
        let world_impl = Arc::new(WorldImpl::new(repo.clone(), capabilities.clone(), events.clone(), fs_root, config.bot_id).await.unwrap());
        let world: Arc<dyn World> = world_impl.clone();
        let interpreter = Arc::new(Interpreter::new(wov_opcodes::standard_registry()));
        world_impl.wire(world.clone(), interpreter.clone());
        let dispatcher = Dispatcher::new(world, interpreter, config);

        let authority = repo.create_capability(bot.id, "sys.mint", BTreeMap::from([("namespace".into(), Value::str("*"))])).await.unwrap();
        let sudo_cap = capabilities.mint(authority.id, bot.id, "sys.sudo", BTreeMap::new()).await.unwrap();
        let ast = Ast::call(
            "sudo",
            vec![
                Ast::literal(Value::str(sudo_cap.id.to_string())),
                Ast::literal(Value::int(target.id.0)),
                Ast::literal(Value::str("say_hello")),
                Ast::literal(Value::List(vec![])),
            ],
        );
        repo.update_verb(&seq, bot.id, "impersonate", ast).await.unwrap();

        let mut receiver = events.subscribe();
        dispatcher.execute(bot.id, bot.id, "impersonate", vec![]).await.unwrap();

        let notification = receiver.recv_for(bot.id).await.unwrap();
        assert_eq!(notification.method, "forward");
        assert_eq!(
            notification.params,
            serde_json::json!({"target": target.id.0, "type": "message", "payload": {"text": "Hello!", "type": "info"}})
        );
    }
}
