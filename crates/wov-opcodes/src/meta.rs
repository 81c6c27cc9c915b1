//! Opcode metadata, surfaced verbatim by the gateway's `get_opcodes` RPC
//! method.

/// Which family an opcode belongs to, for `get_opcodes` grouping and for
/// documentation only — dispatch never branches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Control,
    Vars,
    Compare,
    Math,
    Logic,
    Data,
    List,
    Object,
    String,
    Time,
    Runtime,
    Entity,
    Verb,
    Capability,
    Fs,
    Net,
}

/// Whether an opcode receives its argument AST nodes already evaluated, or
/// raw, so it can choose which to evaluate and how many times.
///
/// Every opcode's `execute` receives raw `&[Ast]` regardless — this field is
/// documentation for `get_opcodes` consumers and for reviewers, not a
/// dispatch switch. `Lazy` opcodes are the ones that must not use the
/// `eval_all` eager-evaluation helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    Eager,
    Lazy,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct OpcodeMeta {
    pub name: &'static str,
    pub category: Category,
    pub evaluation: Evaluation,
    pub description: &'static str,
}
