//! Property-based invariant tests for the listener registry.
//!
//! 1. The registry behaves as an insertion-ordered set under any sequence of
//!    subscribe/unsubscribe operations.
//! 2. One `notify()` calls each registered listener exactly once, in order.
//! 3. `set_loading` notifies exactly when the value changes.

use bindery_core::{Listener, ViewModelCore};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

const POOL: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    Subscribe(usize),
    Unsubscribe(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..POOL).prop_map(Op::Subscribe),
        (0..POOL).prop_map(Op::Unsubscribe),
    ]
}

fn tagged_listeners(log: &Rc<RefCell<Vec<usize>>>) -> Vec<Listener> {
    (0..POOL)
        .map(|tag| {
            let log = Rc::clone(log);
            Listener::new(move || log.borrow_mut().push(tag))
        })
        .collect()
}

proptest! {
    #[test]
    fn registry_is_an_ordered_set(ops in proptest::collection::vec(op_strategy(), 0..64)) {
        let core = ViewModelCore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = tagged_listeners(&log);
        let mut model: Vec<usize> = Vec::new();

        for op in &ops {
            match *op {
                Op::Subscribe(i) => {
                    let added = core.subscribe(&listeners[i]).unwrap();
                    prop_assert_eq!(added, !model.contains(&i));
                    if added {
                        model.push(i);
                    }
                }
                Op::Unsubscribe(i) => {
                    let removed = core.unsubscribe(&listeners[i]);
                    prop_assert_eq!(removed, model.contains(&i));
                    model.retain(|&m| m != i);
                }
            }
            prop_assert_eq!(core.listener_count(), model.len());
        }

        core.notify().unwrap();
        prop_assert_eq!(&*log.borrow(), &model);
    }

    #[test]
    fn set_loading_notifies_on_change_only(values in proptest::collection::vec(any::<bool>(), 0..32)) {
        let core = ViewModelCore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = tagged_listeners(&log);
        core.subscribe(&listeners[0]).unwrap();

        let mut current = false;
        let mut expected = 0usize;
        for v in values {
            core.set_loading(v).unwrap();
            if v != current {
                expected += 1;
                current = v;
            }
            prop_assert_eq!(core.is_loading(), current);
        }
        prop_assert_eq!(log.borrow().len(), expected);
        prop_assert_eq!(core.version(), expected as u64);
    }
}
