//! `log`, `raise`, `yield` and `return`.
use crate::ast::{Effect, EffectKind};
use crate::context::JelContext;
use crate::error::{EarlyExit, Eval, Interrupt, JelError};
use jel_json::Value;
use log::Level;

pub(super) fn apply(effect: &Effect, ctx: &mut JelContext) -> Eval<Value> {
    let value = effect.inner.apply(ctx)?;
    match effect.kind {
        EffectKind::Log { discard } => {
            ctx.log(Level::Info, &value.to_display_string());
            Ok(if discard { Value::Null } else { value })
        }
        EffectKind::Raise => Err(JelError::evaluation(value.to_display_string())
            .with_span(effect.inner.span())
            .in_file(ctx.current_file())
            .into()),
        EffectKind::Exit(kind) => Err(Interrupt::Exit(EarlyExit {
            kind,
            value,
            span: effect.sequence.span,
        })),
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{InMemoryLoader, JelContext, RecordingSink};
    use crate::engine::tests::eval_with;
    use log::Level;
    use std::path::Path;
    use std::rc::Rc;

    #[test]
    fn test_log_goes_to_the_sink_at_info() {
        let sink = Rc::new(RecordingSink::new());
        let mut ctx = JelContext::new().with_sink(sink.clone());
        eval_with("items: [1, 2]\nlog: $items", &mut ctx).unwrap();
        assert_eq!(sink.records(), vec![(Level::Info, "[1,2]".to_string())]);
    }

    #[test]
    fn test_raise_in_an_import_names_the_file() {
        let loader = InMemoryLoader::new().with_file("bad.jel", "raise: broken");
        let mut ctx = JelContext::new().with_loader(Rc::new(loader));
        let error = eval_with("import x: \"bad.jel\"", &mut ctx).unwrap_err();
        let cause = error.cause.as_deref().expect("the raise is the cause");
        assert_eq!(cause.message, "broken");
        assert_eq!(cause.file.as_deref(), Some(Path::new("bad.jel")));
    }
}
