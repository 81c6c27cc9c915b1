//! The standard opcode library: every builtin the interpreter dispatches
//! `Ast::Call` nodes to by name.

#![deny(unsafe_code)]

pub mod meta;
pub mod opcode;
pub mod ops;
pub mod registry;

pub use meta::{Category, Evaluation, OpcodeMeta};
pub use opcode::{call_lambda, eval_all, Evaluator, Opcode};
pub use registry::OpcodeRegistry;

/// Build the registry with every standard opcode registered.
#[must_use]
pub fn standard_registry() -> OpcodeRegistry {
    let mut registry = OpcodeRegistry::new();

    registry.register(ops::control::Seq);
    registry.register(ops::control::If);
    registry.register(ops::control::While);
    registry.register(ops::control::For);
    registry.register(ops::control::Try);
    registry.register(ops::control::Throw);
    registry.register(ops::control::Return);
    registry.register(ops::control::MakeLambda);

    registry.register(ops::vars::Let);
    registry.register(ops::vars::Var);
    registry.register(ops::vars::Set);

    registry.register(ops::compare::Eq);
    registry.register(ops::compare::Ne);
    registry.register(ops::compare::Lt);
    registry.register(ops::compare::Gt);
    registry.register(ops::compare::Le);
    registry.register(ops::compare::Ge);

    registry.register(ops::math::Add);
    registry.register(ops::math::Sub);
    registry.register(ops::math::Mul);
    registry.register(ops::math::Div);
    registry.register(ops::math::Mod);
    registry.register(ops::math::Pow);
    registry.register(ops::math::Random);

    registry.register(ops::logic::And);
    registry.register(ops::logic::Or);
    registry.register(ops::logic::Not);

    registry.register(ops::data::JsonStringify);
    registry.register(ops::data::JsonParse);
    registry.register(ops::data::TypeOf);

    registry.register(ops::list::ListNew);
    registry.register(ops::list::ListPush);
    registry.register(ops::list::ListMap);
    registry.register(ops::list::ListFilter);
    registry.register(ops::list::ListFind);
    registry.register(ops::list::ListLen);
    registry.register(ops::list::ListEmpty);
    registry.register(ops::list::ListGet);
    registry.register(ops::list::ListSlice);
    registry.register(ops::list::ListConcat);

    registry.register(ops::object::ObjNew);
    registry.register(ops::object::ObjGet);
    registry.register(ops::object::ObjSet);
    registry.register(ops::object::ObjHas);
    registry.register(ops::object::ObjDel);
    registry.register(ops::object::ObjKeys);

    registry.register(ops::string::StrJoin);
    registry.register(ops::string::StrLower);
    registry.register(ops::string::StrUpper);
    registry.register(ops::string::StrIncludes);
    registry.register(ops::string::StrConcat);

    registry.register(ops::time::TimeNow);
    registry.register(ops::time::TimeToTimestamp);
    registry.register(ops::time::TimeFormat);

    registry.register(ops::runtime::Caller);
    registry.register(ops::runtime::This);
    registry.register(ops::runtime::Arg);
    registry.register(ops::runtime::Args);
    registry.register(ops::runtime::Warn);
    registry.register(ops::runtime::Log);

    registry.register(ops::entity::Create);
    registry.register(ops::entity::Destroy);
    registry.register(ops::entity::GetEntity);
    registry.register(ops::entity::SetEntity);
    registry.register(ops::entity::GetPrototype);
    registry.register(ops::entity::SetPrototype);
    registry.register(ops::entity::Verbs);
    registry.register(ops::entity::GetVerb);
    registry.register(ops::entity::ResolveProps);

    registry.register(ops::verb::Call);
    registry.register(ops::verb::Sudo);
    registry.register(ops::verb::Schedule);
    registry.register(ops::verb::Send);

    registry.register(ops::capability::GetCapability);
    registry.register(ops::capability::Mint);
    registry.register(ops::capability::Delegate);
    registry.register(ops::capability::GiveCapability);
    registry.register(ops::capability::HasCapability);

    registry.register(ops::fs::FsRead);
    registry.register(ops::fs::FsWrite);
    registry.register(ops::fs::FsList);

    registry.register(ops::net::NetHttpGet);
    registry.register(ops::net::NetHttpPost);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_every_documented_opcode() {
        let registry = standard_registry();
        for name in [
            "seq", "if", "while", "for", "try", "throw", "return", "lambda", "let", "var", "set", "==", "!=", "<", ">", "<=", ">=", "+", "-",
            "*", "/", "%", "^", "random", "and", "or", "not", "json.stringify", "json.parse", "typeof", "list.new", "list.push", "list.map",
            "list.filter", "list.find", "list.len", "list.empty", "list.get", "list.slice", "list.concat", "obj.new", "obj.get", "obj.set",
            "obj.has", "obj.del", "obj.keys", "str.join", "str.lower", "str.upper", "str.includes", "str.concat", "time.now",
            "time.to_timestamp", "time.format", "caller", "this", "arg", "args", "warn", "log", "create", "destroy", "entity", "set_entity",
            "get_prototype", "set_prototype", "verbs", "get_verb", "resolve_props", "call", "sudo", "schedule", "send", "get_capability",
            "mint", "delegate", "give_capability", "has_capability", "fs.read", "fs.write", "fs.list", "net.http.get", "net.http.post",
        ] {
            assert!(registry.contains(name), "missing opcode: {name}");
        }
    }
}
