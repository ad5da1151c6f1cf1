//! In-memory page used by the core tests.
//!
//! Host objects live in a path-keyed tree: `"hostApp.workflows"` is the
//! `workflows` member of the `hostApp` global. Paths starting with `@` are
//! component instances and never show up as globals. Plain JSON data under
//! an object is reachable with [`PageWorld::property`] too.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flowpilot_protocols::{
    ElementSnapshot, MutationBatch, MutationStream, ObjectRef, PageDom, PageError, PageWorld,
};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;

/// What a fake host method does when invoked.
#[derive(Debug, Clone)]
pub(crate) enum Method {
    Returns(Value),
    Fails(String),
    Hangs,
}

/// One recorded host invocation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub object: String,
    pub method: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Default)]
struct FakeObject {
    data: Map<String, Value>,
    methods: HashMap<String, Method>,
}

#[derive(Default)]
struct State {
    url: String,
    title: String,
    text: String,
    elements: HashMap<String, Vec<ElementSnapshot>>,
    objects: HashMap<String, FakeObject>,
    globals: Vec<String>,
    functions: Vec<String>,
    components: Vec<String>,
    element_components: HashMap<String, String>,
    storage: Vec<(String, String)>,
    fetches: HashMap<String, Result<Value, String>>,
    calls: Vec<Call>,
    assignments: Vec<(String, String, Value)>,
    queries: Vec<String>,
    mutation_tx: Option<mpsc::UnboundedSender<MutationBatch>>,
    hang_world: bool,
    releases: usize,
}

enum Resolved {
    Object,
    Data(Value),
}

#[derive(Default)]
pub(crate) struct FakePage {
    state: Mutex<State>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn with_url(self, url: &str) -> Self {
        self.state.lock().url = url.to_string();
        self
    }

    pub fn with_title(self, title: &str) -> Self {
        self.state.lock().title = title.to_string();
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.state.lock().text = text.to_string();
        self
    }

    /// Elements returned for exactly this selector string.
    pub fn with_elements(self, selector: &str, elements: Vec<ElementSnapshot>) -> Self {
        self.state
            .lock()
            .elements
            .insert(selector.to_string(), elements);
        self
    }

    /// Register an object (and its ancestors) carrying `data`.
    pub fn with_object(self, path: &str, data: Value) -> Self {
        {
            let mut state = self.state.lock();
            register(&mut state, path);
            if let (Some(object), Value::Object(map)) = (state.objects.get_mut(path), data) {
                object.data.extend(map);
            }
        }
        self
    }

    pub fn with_method(self, path: &str, method: &str, behavior: Method) -> Self {
        {
            let mut state = self.state.lock();
            register(&mut state, path);
            if let Some(object) = state.objects.get_mut(path) {
                object.methods.insert(method.to_string(), behavior);
            }
        }
        self
    }

    /// Define a global that is a plain function.
    pub fn with_function(self, name: &str) -> Self {
        let page = self.with_object(name, json!({}));
        page.state.lock().functions.push(name.to_string());
        page
    }

    /// Append a component instance in document order. `path` must start with `@`.
    pub fn with_component(self, path: &str, data: Value) -> Self {
        let page = self.with_object(path, data);
        page.state.lock().components.push(path.to_string());
        page
    }

    /// Attach component `path` to the first element matching `selector`.
    pub fn with_element_component(self, selector: &str, path: &str) -> Self {
        let page = self.with_object(path, json!({}));
        page.state
            .lock()
            .element_components
            .insert(selector.to_string(), path.to_string());
        page
    }

    pub fn with_storage(self, key: &str, value: &str) -> Self {
        self.state
            .lock()
            .storage
            .push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_fetch(self, path: &str, response: Result<Value, String>) -> Self {
        self.state.lock().fetches.insert(path.to_string(), response);
        self
    }

    /// Every host-context call never completes.
    pub fn hanging(self) -> Self {
        self.state.lock().hang_world = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }

    pub fn assignments(&self) -> Vec<(String, String, Value)> {
        self.state.lock().assignments.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().queries.clone()
    }

    /// How many times the handle group was released.
    pub fn releases(&self) -> usize {
        self.state.lock().releases
    }

    /// Deliver a mutation batch to the installed watcher.
    pub fn push_mutations(&self, batch: MutationBatch) -> bool {
        match &self.state.lock().mutation_tx {
            Some(tx) => tx.send(batch).is_ok(),
            None => false,
        }
    }

    fn resolve(state: &State, path: &str) -> Option<Resolved> {
        if state.objects.contains_key(path) {
            return Some(Resolved::Object);
        }
        let (parent, key) = path.rsplit_once('.')?;
        let parent_value = match Self::resolve(state, parent)? {
            Resolved::Object => Value::Object(state.objects.get(parent)?.data.clone()),
            Resolved::Data(value) => value,
        };
        let child = parent_value.get(key)?;
        if child.is_object() || child.is_array() {
            Some(Resolved::Data(child.clone()))
        } else {
            None
        }
    }

    async fn world_gate(&self) {
        let hang = self.state.lock().hang_world;
        if hang {
            std::future::pending::<()>().await;
        }
    }
}

fn register(state: &mut State, path: &str) {
    let mut prefix = String::new();
    for (i, segment) in path.split('.').enumerate() {
        if i > 0 {
            prefix.push('.');
        }
        prefix.push_str(segment);
        if !state.objects.contains_key(&prefix) {
            state.objects.insert(prefix.clone(), FakeObject::default());
            if i == 0 && !prefix.starts_with('@') {
                state.globals.push(prefix.clone());
            }
        }
    }
}

#[async_trait]
impl PageDom for FakePage {
    async fn url(&self) -> Result<String, PageError> {
        Ok(self.state.lock().url.clone())
    }

    async fn title(&self) -> Result<String, PageError> {
        Ok(self.state.lock().title.clone())
    }

    async fn page_text(&self) -> Result<String, PageError> {
        Ok(self.state.lock().text.clone())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, PageError> {
        let mut state = self.state.lock();
        state.queries.push(selector.to_string());
        Ok(state.elements.get(selector).cloned().unwrap_or_default())
    }

    async fn watch_mutations(&self) -> Result<MutationStream, PageError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().mutation_tx = Some(tx);
        Ok(rx)
    }
}

#[async_trait]
impl PageWorld for FakePage {
    async fn global(&self, name: &str) -> Result<Option<ObjectRef>, PageError> {
        self.world_gate().await;
        let state = self.state.lock();
        if name.starts_with('@') {
            return Ok(None);
        }
        Ok(Self::resolve(&state, name).map(|_| ObjectRef::new(name)))
    }

    async fn global_names(&self) -> Result<Vec<String>, PageError> {
        self.world_gate().await;
        Ok(self.state.lock().globals.clone())
    }

    async fn property(
        &self,
        object: &ObjectRef,
        key: &str,
    ) -> Result<Option<ObjectRef>, PageError> {
        self.world_gate().await;
        let path = format!("{}.{}", object, key);
        let state = self.state.lock();
        Ok(Self::resolve(&state, &path).map(|_| ObjectRef::new(path)))
    }

    async fn is_callable(&self, object: &ObjectRef, method: &str) -> Result<bool, PageError> {
        self.world_gate().await;
        let state = self.state.lock();
        Ok(state
            .objects
            .get(object.as_str())
            .is_some_and(|o| o.methods.contains_key(method)))
    }

    async fn is_function(&self, object: &ObjectRef) -> Result<bool, PageError> {
        self.world_gate().await;
        let state = self.state.lock();
        Ok(state.functions.iter().any(|name| name == object.as_str()))
    }

    async fn invoke(
        &self,
        object: &ObjectRef,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, PageError> {
        self.world_gate().await;
        let behavior = {
            let mut state = self.state.lock();
            state.calls.push(Call {
                object: object.to_string(),
                method: method.to_string(),
                args,
            });
            state
                .objects
                .get(object.as_str())
                .and_then(|o| o.methods.get(method).cloned())
        };
        match behavior {
            Some(Method::Returns(value)) => Ok(value),
            Some(Method::Fails(message)) => Err(PageError::Script(message)),
            Some(Method::Hangs) => std::future::pending().await,
            None => Err(PageError::Script(format!(
                "{}.{} is not a function",
                object, method
            ))),
        }
    }

    async fn assign(&self, object: &ObjectRef, key: &str, value: Value) -> Result<(), PageError> {
        self.world_gate().await;
        let mut state = self.state.lock();
        state
            .assignments
            .push((object.to_string(), key.to_string(), value.clone()));
        match state.objects.get_mut(object.as_str()) {
            Some(target) => {
                target.data.insert(key.to_string(), value);
                Ok(())
            }
            None => Err(PageError::NotFound(object.to_string())),
        }
    }

    async fn snapshot(&self, object: &ObjectRef) -> Result<Option<Value>, PageError> {
        self.world_gate().await;
        let state = self.state.lock();
        Ok(match Self::resolve(&state, object.as_str()) {
            Some(Resolved::Object) => state
                .objects
                .get(object.as_str())
                .map(|o| Value::Object(o.data.clone())),
            Some(Resolved::Data(value)) => Some(value),
            None => None,
        })
    }

    async fn element_component(&self, selector: &str) -> Result<Option<ObjectRef>, PageError> {
        self.world_gate().await;
        Ok(self
            .state
            .lock()
            .element_components
            .get(selector)
            .map(ObjectRef::new))
    }

    async fn first_component(
        &self,
        with_property: Option<&str>,
    ) -> Result<Option<ObjectRef>, PageError> {
        self.world_gate().await;
        let state = self.state.lock();
        let found = state.components.iter().find(|path| match with_property {
            Some(key) => Self::resolve(&state, &format!("{}.{}", path, key)).is_some(),
            None => true,
        });
        Ok(found.map(ObjectRef::new))
    }

    async fn storage_entries(&self) -> Result<Vec<(String, String)>, PageError> {
        self.world_gate().await;
        Ok(self.state.lock().storage.clone())
    }

    async fn fetch_json(&self, path: &str) -> Result<Value, PageError> {
        self.world_gate().await;
        match self.state.lock().fetches.get(path) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(PageError::Transport(message.clone())),
            None => Err(PageError::Transport(format!("404 {}", path))),
        }
    }

    async fn release(&self) -> Result<(), PageError> {
        self.state.lock().releases += 1;
        Ok(())
    }
}
