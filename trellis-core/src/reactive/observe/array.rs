//! Observed arrays.
//!
//! Indices have no Dep of their own. Every read tracks the array's container
//! Dep and every mutating operation notifies it exactly once, after the
//! change is applied.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::{observe, Observed, Observer};

struct ArrayInner {
    observer: Observer,
    items: RefCell<Vec<Observed>>,
}

/// An observed array.
#[derive(Clone)]
pub struct ReactiveArray {
    inner: Rc<ArrayInner>,
}

impl ReactiveArray {
    /// Create an empty observed array.
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub(crate) fn from_values(values: Vec<Value>) -> Self {
        Self::with_items(values.into_iter().map(Observed::from).collect())
    }

    fn with_items(items: Vec<Observed>) -> Self {
        Self {
            inner: Rc::new(ArrayInner {
                observer: Observer::new(),
                items: RefCell::new(items),
            }),
        }
    }

    /// The array's observer.
    pub fn observer(&self) -> &Observer {
        &self.inner.observer
    }

    fn track(&self) {
        self.inner.observer.dep().depend();
    }

    fn changed(&self, operation: &'static str, inserted: usize) {
        tracing::trace!(
            dep = self.inner.observer.dep().id().raw(),
            operation,
            inserted,
            "array mutated"
        );
        self.inner.observer.dep().notify();
    }

    /// Read the element at `index`.
    pub fn get(&self, index: usize) -> Option<Observed> {
        self.track();
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.track();
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All elements, in order.
    pub fn to_vec(&self) -> Vec<Observed> {
        self.track();
        self.inner.items.borrow().clone()
    }

    pub(crate) fn items_untracked(&self) -> Vec<Observed> {
        self.inner.items.borrow().clone()
    }

    /// Append one element. Returns the new length.
    pub fn push(&self, value: impl Into<Observed>) -> usize {
        let len = {
            let mut items = self.inner.items.borrow_mut();
            items.push(observe(value));
            items.len()
        };
        self.changed("push", 1);
        len
    }

    /// Append several elements with a single notification.
    pub fn extend<I>(&self, values: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Observed>,
    {
        let (len, inserted) = {
            let mut items = self.inner.items.borrow_mut();
            let before = items.len();
            items.extend(values.into_iter().map(observe));
            (items.len(), items.len() - before)
        };
        self.changed("extend", inserted);
        len
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<Observed> {
        let popped = self.inner.items.borrow_mut().pop();
        self.changed("pop", 0);
        popped
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Option<Observed> {
        let shifted = {
            let mut items = self.inner.items.borrow_mut();
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        };
        self.changed("shift", 0);
        shifted
    }

    /// Prepend one element. Returns the new length.
    pub fn unshift(&self, value: impl Into<Observed>) -> usize {
        let len = {
            let mut items = self.inner.items.borrow_mut();
            items.insert(0, observe(value));
            items.len()
        };
        self.changed("unshift", 1);
        len
    }

    /// Remove `delete_count` elements starting at `start` and insert
    /// `insert` in their place. Out of range arguments are clamped.
    /// Returns the removed elements.
    pub fn splice<V>(&self, start: usize, delete_count: usize, insert: Vec<V>) -> Vec<Observed>
    where
        V: Into<Observed>,
    {
        let inserted = insert.len();
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            let start = start.min(items.len());
            let end = start.saturating_add(delete_count).min(items.len());
            items
                .splice(start..end, insert.into_iter().map(observe))
                .collect()
        };
        self.changed("splice", inserted);
        removed
    }

    /// Sort in place with `compare`.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&Observed, &Observed) -> Ordering,
    {
        self.inner.items.borrow_mut().sort_by(compare);
        self.changed("sort", 0);
    }

    /// Reverse in place.
    pub fn reverse(&self) {
        self.inner.items.borrow_mut().reverse();
        self.changed("reverse", 0);
    }

    /// Replace the element at `index`, or append when `index` is the
    /// current length or beyond.
    pub fn set(&self, index: usize, value: impl Into<Observed>) {
        let value = observe(value);
        let len = self.inner.items.borrow().len();
        if index < len {
            self.splice(index, 1, vec![value]);
        } else {
            self.push(value);
        }
    }

    /// Deep, untracked snapshot as plain data.
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.inner
                .items
                .borrow()
                .iter()
                .map(Observed::to_value)
                .collect(),
        )
    }

    /// Whether both handles refer to the same array.
    pub fn ptr_eq(&self, other: &ReactiveArray) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for ReactiveArray {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReactiveArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveArray")
            .field("observer", &self.inner.observer)
            .field("value", &self.to_value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{scheduler, Dep, Subscriber, Watcher, WatcherId};
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Weak;

    fn array(value: Value) -> ReactiveArray {
        observe(value).as_array().unwrap().clone()
    }

    /// Counts `update()` calls from the deps it is subscribed to.
    struct Notifications {
        id: WatcherId,
        updates: Cell<usize>,
    }

    impl Notifications {
        fn on(list: &ReactiveArray) -> Rc<Self> {
            let counter = Rc::new(Self {
                id: WatcherId::new(),
                updates: Cell::new(0),
            });
            let weak: Weak<dyn Subscriber> = Rc::downgrade(&counter) as Weak<Notifications>;
            list.observer().dep().add_subscriber(counter.id, weak);
            counter
        }

        fn take(&self) -> usize {
            self.updates.replace(0)
        }
    }

    impl Subscriber for Notifications {
        fn id(&self) -> WatcherId {
            self.id
        }

        fn add_dep(&self, _dep: &Dep) {}

        fn update(&self) {
            self.updates.set(self.updates.get() + 1);
        }

        fn run(&self) {}
    }

    /// A render watcher reading `len()`, plus a counter of its runs.
    fn track_len(list: &ReactiveArray) -> (Watcher, Rc<Cell<usize>>) {
        let runs = Rc::new(Cell::new(0));
        let seen = runs.clone();
        let source = list.clone();
        let watcher = Watcher::new(move || {
            source.len();
            seen.set(seen.get() + 1);
        });
        (watcher, runs)
    }

    #[test]
    fn push_notifies_once_and_observes_the_element() {
        let list = array(json!([1, 2, 3]));
        let (watcher, _runs) = track_len(&list);

        assert_eq!(list.push(json!({ "id": 4 })), 4);
        assert_eq!(scheduler::pending_watchers(), 1);

        let pushed = list.get(3).unwrap();
        assert!(pushed.observer().is_some());
        assert_eq!(
            pushed.as_object().unwrap().get("id").unwrap().as_i64(),
            Some(4)
        );

        scheduler::tick();
        assert_eq!(watcher.run_count(), 2);
    }

    #[test]
    fn splice_replaces_a_range() {
        let list = array(json!([1, 2, 3, 4]));
        let (_watcher, runs) = track_len(&list);

        let removed = list.splice(1, 2, vec![json!({ "x": 1 }), json!(9)]);
        assert_eq!(
            removed.iter().map(Observed::to_value).collect::<Vec<_>>(),
            vec![json!(2), json!(3)]
        );
        assert_eq!(list.to_value(), json!([1, { "x": 1 }, 9, 4]));
        assert!(list.get(1).unwrap().observer().is_some());

        scheduler::tick();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn splice_clamps_out_of_range_arguments() {
        let list = array(json!([1, 2]));
        let removed = list.splice(5, 10, vec![3]);
        assert!(removed.is_empty());
        assert_eq!(list.to_value(), json!([1, 2, 3]));

        let removed = list.splice(1, usize::MAX, Vec::<Observed>::new());
        assert_eq!(removed.len(), 2);
        assert_eq!(list.to_value(), json!([1]));
    }

    #[test]
    fn unshift_and_shift() {
        let list = array(json!(["b"]));
        let (_watcher, runs) = track_len(&list);

        assert_eq!(list.unshift("a"), 2);
        assert_eq!(list.to_value(), json!(["a", "b"]));
        assert_eq!(list.shift().unwrap().as_str(), Some("a"));
        assert_eq!(list.pop().unwrap().as_str(), Some("b"));
        assert!(list.shift().is_none());

        // Four notifications, one batched re-run.
        assert_eq!(scheduler::pending_watchers(), 1);
        scheduler::tick();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn sort_and_reverse_reorder_in_place() {
        let list = array(json!([3, 1, 2]));
        list.sort_by(|a, b| a.as_i64().cmp(&b.as_i64()));
        assert_eq!(list.to_value(), json!([1, 2, 3]));
        list.reverse();
        assert_eq!(list.to_value(), json!([3, 2, 1]));
    }

    #[test]
    fn set_by_index_replaces_or_appends() {
        let list = array(json!([1, 2]));
        list.set(0, 10);
        list.set(7, 30);
        assert_eq!(list.to_value(), json!([10, 2, 30]));
    }

    #[test]
    fn extend_notifies_once() {
        let list = ReactiveArray::new();
        let dep = list.observer().dep().clone();
        let (watcher, _runs) = track_len(&list);
        assert!(dep.has_subscriber(watcher.id()));

        assert_eq!(list.extend(vec![1, 2, 3]), 3);
        assert_eq!(scheduler::pending_watchers(), 1);
        assert_eq!(list.to_value(), json!([1, 2, 3]));
    }

    #[test]
    fn each_mutation_notifies_the_container_dep_once() {
        let list = array(json!([1, 2]));
        let counter = Notifications::on(&list);

        list.push(3);
        assert_eq!(counter.take(), 1);

        list.unshift(0);
        assert_eq!(counter.take(), 1);

        list.splice(1, 2, vec![json!({ "a": 1 }), json!({ "b": 2 }), json!(3)]);
        assert_eq!(counter.take(), 1);

        list.extend(vec![7, 8, 9]);
        assert_eq!(counter.take(), 1);

        list.pop();
        list.shift();
        list.reverse();
        list.sort_by(|a, b| a.as_i64().cmp(&b.as_i64()));
        assert_eq!(counter.take(), 4);
    }
}
