//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block
///
/// The block evaluates to `Option<Action>`; `Some` is fed back into the store.
///
/// # Example
///
/// ```rust,ignore
/// use todosync_core::async_effect;
///
/// async_effect! {
///     let todolists = api.get_todolists().await.ok()?;
///     Some(Action::TodolistsFetched { todolists })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

#[cfg(test)]
#[allow(clippy::panic)] // Test code can panic
mod tests {
    use crate::effect::Effect;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Loaded { value: i32 },
    }

    #[tokio::test]
    async fn async_effect_wraps_block() {
        let effect = async_effect! {
            Some(TestAction::Loaded { value: 42 })
        };

        let Effect::Future(fut) = effect else {
            panic!("async_effect! must build Effect::Future");
        };
        assert_eq!(fut.await, Some(TestAction::Loaded { value: 42 }));
    }
}
