//! The ambient "current span" slot: a thread-local stack manipulated by
//! `Tracer::with_span`. Modeled as an external collaborator per the core's
//! design notes — this is one concrete realization (thread-local stack);
//! an async runtime would instead use a task-local.

use std::cell::RefCell;

use crate::span::Span;

thread_local! {
    static CURRENT: RefCell<Vec<Span>> = const { RefCell::new(Vec::new()) };
}

/// Returns the span on top of the ambient stack, if any.
pub fn current_span() -> Option<Span> {
    CURRENT.with(|stack| stack.borrow().last().cloned())
}

/// Pushes `span` onto the ambient stack. Releasing the returned `Scope`
/// (explicitly via `close()`, or implicitly via `Drop`) restores the prior
/// value — scoped acquisition with guaranteed release on all exit paths,
/// including unwinding.
#[must_use = "dropping the Scope immediately restores the previous current span"]
pub fn push_current(span: Span) -> Scope {
    CURRENT.with(|stack| stack.borrow_mut().push(span));
    Scope { closed: false }
}

pub struct Scope {
    closed: bool,
}

impl Scope {
    pub fn close(mut self) {
        self.pop();
        self.closed = true;
    }

    fn pop(&mut self) {
        if !self.closed {
            CURRENT.with(|stack| {
                stack.borrow_mut().pop();
            });
            self.closed = true;
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SpanContext;

    #[test]
    fn scope_restores_prior_value_on_drop() {
        assert!(current_span().is_none());
        let outer = Span::NoOp(SpanContext::empty());
        let _outer_scope = push_current(outer);
        assert!(current_span().is_some());
        {
            let inner = Span::NoOp(SpanContext::empty());
            let _inner_scope = push_current(inner);
            assert!(current_span().is_some());
        }
        assert!(current_span().is_some());
        drop(_outer_scope);
        assert!(current_span().is_none());
    }
}
