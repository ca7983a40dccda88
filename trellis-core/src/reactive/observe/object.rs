//! Observed objects.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{depend_array, Observed, Observer};
use crate::reactive::context::ReactiveContext;
use crate::reactive::dep::Dep;

struct Property {
    dep: Dep,
    value: Observed,
}

struct ObjectInner {
    observer: Observer,
    properties: RefCell<IndexMap<String, Property>>,
}

/// An observed object: string keys, each with its own Dep.
#[derive(Clone)]
pub struct ReactiveObject {
    inner: Rc<ObjectInner>,
}

impl ReactiveObject {
    /// Create an empty observed object.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                observer: Observer::new(),
                properties: RefCell::new(IndexMap::new()),
            }),
        }
    }

    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        let properties = map
            .into_iter()
            .map(|(key, value)| {
                let property = Property {
                    dep: Dep::new(),
                    value: Observed::from(value),
                };
                (key, property)
            })
            .collect();

        Self {
            inner: Rc::new(ObjectInner {
                observer: Observer::new(),
                properties: RefCell::new(properties),
            }),
        }
    }

    /// The object's observer.
    pub fn observer(&self) -> &Observer {
        &self.inner.observer
    }

    /// Read a property.
    ///
    /// Inside a collecting computation this registers the property's Dep,
    /// the container Dep of the stored value if it has one, and, for arrays,
    /// the container Dep of every nested array element.
    pub fn get(&self, key: &str) -> Option<Observed> {
        let (dep, value) = {
            let properties = self.inner.properties.borrow();
            let property = properties.get(key)?;
            (property.dep.clone(), property.value.clone())
        };

        if ReactiveContext::is_active() {
            dep.depend();
            if let Some(observer) = value.observer() {
                observer.dep().depend();
                if let Observed::Array(array) = &value {
                    depend_array(array);
                }
            }
        }

        Some(value)
    }

    /// Write a property.
    ///
    /// Writing the identical value is a no-op. Otherwise the value is
    /// observed, stored, and the property's Dep notified. Writing a key the
    /// object does not have yet defines a reactive property and notifies
    /// the container Dep instead.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Observed>) {
        let key = key.into();
        let value = super::observe(value);

        let notify = {
            let mut properties = self.inner.properties.borrow_mut();
            match properties.get_mut(&key) {
                Some(property) => {
                    if property.value.same(&value) {
                        return;
                    }
                    property.value = value;
                    property.dep.clone()
                }
                None => {
                    properties.insert(key, Property { dep: Dep::new(), value });
                    self.inner.observer.dep().clone()
                }
            }
        };

        notify.notify();
    }

    /// Remove a property, notifying the container Dep if it existed.
    pub fn remove(&self, key: &str) -> Option<Observed> {
        let removed = self
            .inner
            .properties
            .borrow_mut()
            .shift_remove(key)
            .map(|property| property.value);

        if removed.is_some() {
            self.inner.observer.dep().notify();
        }
        removed
    }

    /// Whether `key` is defined. Tracks the container Dep.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.observer.dep().depend();
        self.inner.properties.borrow().contains_key(key)
    }

    /// The object's keys in insertion order. Tracks the container Dep.
    pub fn keys(&self) -> Vec<String> {
        self.inner.observer.dep().depend();
        self.inner.properties.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.observer.dep().depend();
        self.inner.properties.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The Dep guarding `key`, if the key exists.
    pub fn property_dep(&self, key: &str) -> Option<Dep> {
        self.inner
            .properties
            .borrow()
            .get(key)
            .map(|property| property.dep.clone())
    }

    /// Deep, untracked snapshot as plain data.
    pub fn to_value(&self) -> Value {
        let properties = self.inner.properties.borrow();
        let map = properties
            .iter()
            .map(|(key, property)| (key.clone(), property.value.to_value()))
            .collect::<Map<String, Value>>();
        Value::Object(map)
    }

    /// Whether both handles refer to the same object.
    pub fn ptr_eq(&self, other: &ReactiveObject) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for ReactiveObject {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveObject")
            .field("observer", &self.inner.observer)
            .field("value", &self.to_value())
            .finish()
    }
}
