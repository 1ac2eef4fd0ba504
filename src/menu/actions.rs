use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("No such action '{0}'")]
    NoSuchAction(String),

    #[error("Menu has no button at index {0}")]
    NoSuchButton(usize),
}

/// Names that may be invoked on a target, each bound to an argument-less function.
pub struct ActionTable<C> {
    actions: BTreeMap<&'static str, fn(&mut C)>,
}

impl<C> Default for ActionTable<C> {
    fn default() -> Self {
        Self { actions: BTreeMap::new() }
    }
}

impl<C> std::fmt::Debug for ActionTable<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.actions.keys()).finish()
    }
}

impl<C> ActionTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations under the same name replace earlier ones.
    pub fn register(&mut self, name: &'static str, action: fn(&mut C)) -> &mut Self {
        self.actions.insert(name, action);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Result<fn(&mut C), DispatchError> {
        self.actions
            .get(name)
            .copied()
            .ok_or_else(|| DispatchError::NoSuchAction(name.to_string()))
    }

    pub fn invoke(&self, target: &mut C, name: &str) -> Result<(), DispatchError> {
        let action = self.resolve(name)?;
        action(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter(u32);

    fn bump(counter: &mut Counter) {
        counter.0 += 1;
    }

    #[test]
    fn test_invoke_registered() {
        let mut table = ActionTable::<Counter>::new();
        table.register("Bump", bump);
        let mut counter = Counter::default();
        table.invoke(&mut counter, "Bump").unwrap();
        assert_eq!(counter.0, 1);
    }

    #[test]
    fn test_invoke_unknown_leaves_target_alone() {
        let mut table = ActionTable::<Counter>::new();
        table.register("Bump", bump);
        let mut counter = Counter::default();
        assert_eq!(
            table.invoke(&mut counter, "bump"),
            Err(DispatchError::NoSuchAction("bump".to_string()))
        );
        assert_eq!(counter.0, 0);
    }
}
