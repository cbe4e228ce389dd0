/// Decide-then-evolve in one step, without persistence.
///
/// Calls `handle` and applies each produced event in order. If `handle`
/// rejects the command the aggregate is left untouched. Used by domain tests
/// and anywhere a command must be evaluated against an in-memory aggregate;
/// the durable path is the infra `CommandDispatcher`.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: sitecart_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
