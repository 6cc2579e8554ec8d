use serde::Serialize;
use serde_json::Value;
use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Reads a string out of a record: either a named field of its serialized
/// form (dotted paths reach into nested objects) or a custom function.
pub enum Accessor<T> {
    Field(String),
    Custom(Arc<dyn Fn(&T) -> String + Send + Sync>),
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        match self {
            Accessor::Field(name) => Accessor::Field(name.clone()),
            Accessor::Custom(f) => Accessor::Custom(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Accessor::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<T: Serialize> Accessor<T> {
    pub fn field(name: impl Into<String>) -> Self {
        Accessor::Field(name.into())
    }

    pub fn custom(f: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        Accessor::Custom(Arc::new(f))
    }

    pub fn get(&self, item: &T) -> String {
        self.read(&Record::new(item))
    }

    pub(crate) fn read(&self, record: &Record<'_, T>) -> String {
        match self {
            Accessor::Field(name) => record
                .json()
                .and_then(|json| lookup(json, name))
                .map(render)
                .unwrap_or_default(),
            Accessor::Custom(f) => f(record.item),
        }
    }
}

/// An item plus its lazily serialized form, so several field reads on the
/// same row serialize it once.
pub(crate) struct Record<'a, T> {
    pub(crate) item: &'a T,
    json: OnceCell<Option<Value>>,
}

impl<'a, T: Serialize> Record<'a, T> {
    pub(crate) fn new(item: &'a T) -> Self {
        Self {
            item,
            json: OnceCell::new(),
        }
    }

    fn json(&self) -> Option<&Value> {
        self.json
            .get_or_init(|| serde_json::to_value(self.item).ok())
            .as_ref()
    }
}

fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Table column: a title and how to produce the cell text.
#[derive(Debug)]
pub struct Column<T> {
    pub title: String,
    pub value: Accessor<T>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            title: self.title.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T: Serialize> Column<T> {
    pub fn field(title: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: Accessor::field(field),
        }
    }

    pub fn custom(
        title: impl Into<String>,
        render: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            value: Accessor::custom(render),
        }
    }
}
