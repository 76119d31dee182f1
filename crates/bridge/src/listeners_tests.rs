// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use super::*;

#[test]
fn dispatch_runs_listeners_in_registration_order() {
    let list: ListenerList<u32> = ListenerList::new("test");
    let seen = Arc::new(Mutex::new(Vec::new()));
    for id in 0..3 {
        let seen = Arc::clone(&seen);
        list.add(move |value: &u32| seen.lock().unwrap().push((id, *value)));
    }

    assert_eq!(list.dispatch(&7), 0);
    assert_eq!(*seen.lock().unwrap(), vec![(0, 7), (1, 7), (2, 7)]);
}

#[test]
fn panicking_listener_does_not_stop_others() {
    let list: ListenerList<u32> = ListenerList::new("test");
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        list.add(move |v: &u32| seen.lock().unwrap().push(("first", *v)));
    }
    list.add(|_: &u32| panic!("listener bug"));
    {
        let seen = Arc::clone(&seen);
        list.add(move |v: &u32| seen.lock().unwrap().push(("third", *v)));
    }

    assert_eq!(list.dispatch(&1), 1);
    assert_eq!(list.dispatch(&2), 1);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![("first", 1), ("third", 1), ("first", 2), ("third", 2)]
    );
}

#[test]
fn listener_may_register_during_dispatch() {
    let list: Arc<ListenerList<u32>> = Arc::new(ListenerList::new("test"));
    let count = Arc::new(Mutex::new(0));
    {
        let inner = Arc::clone(&list);
        let count = Arc::clone(&count);
        list.add(move |_: &u32| {
            let count = Arc::clone(&count);
            inner.add(move |_: &u32| *count.lock().unwrap() += 1);
        });
    }

    list.dispatch(&0);
    assert_eq!(list.len(), 2);
    assert_eq!(*count.lock().unwrap(), 0);

    list.dispatch(&0);
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn empty_list_dispatch_is_noop() {
    let list: ListenerList<String> = ListenerList::new("test");
    assert!(list.is_empty());
    assert_eq!(list.dispatch(&"x".to_string()), 0);
}

#[test]
fn registry_categories_are_independent() {
    let registry = ListenerRegistry::new();
    registry.transcript.add(|_| {});
    registry.transcript.add(|_| {});
    registry.status.add(|_| {});

    assert_eq!(registry.transcript.len(), 2);
    assert_eq!(registry.status.len(), 1);
    assert!(registry.interrupt.is_empty());
}
