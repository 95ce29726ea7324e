//! Actions by name. An action takes JSON parameters and answers with a
//! description of what happened.

use {
    crate::Error,
    futures::{FutureExt, future::BoxFuture},
    std::{collections::BTreeMap, future::Future, sync::Arc},
};

type Handler =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<String, Error>> + Send + Sync>;

#[derive(Clone)]
pub struct Action {
    pub name: &'static str,
    pub description: &'static str,
    handler: Handler,
}

impl Action {
    pub fn new<F, Fut>(name: &'static str, description: &'static str, handler: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, Error>> + Send + 'static,
    {
        Self {
            name,
            description,
            handler: Arc::new(move |input| handler(input).boxed()),
        }
    }

    pub async fn invoke(&self, input: serde_json::Value) -> Result<String, Error> {
        (self.handler)(input).await
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    actions: BTreeMap<&'static str, Action>,
}

impl Registry {
    /// Registers an action, replacing any action of the same name.
    pub fn register(&mut self, action: Action) {
        self.actions.insert(action.name, action);
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// All registered actions, ordered by name.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub async fn invoke(&self, name: &str, input: serde_json::Value) -> Result<String, Error> {
        let action = self
            .get(name)
            .ok_or_else(|| Error::UnknownAction(name.to_owned()))?;
        tracing::debug!(action = name, "invoking action");
        action.invoke(input).await
    }
}
