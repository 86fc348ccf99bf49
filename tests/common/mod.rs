#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use dwc::{Display, HeadlessProbe};

pub fn headless() -> (Display, HeadlessProbe) {
    let _ = env_logger::builder().is_test(true).try_init();
    Display::headless().unwrap()
}

/// Collects whatever a callback is given.
#[derive(Debug)]
pub struct Log<T>(Rc<RefCell<Vec<T>>>);

impl<T> Clone for Log<T> {
    fn clone(&self) -> Self {
        Log(self.0.clone())
    }
}

impl<T: Clone> Log<T> {
    pub fn new() -> Self {
        Log(Rc::new(RefCell::new(Vec::new())))
    }
    pub fn push(&self, value: T) {
        self.0.borrow_mut().push(value);
    }
    pub fn take(&self) -> Vec<T> {
        ::std::mem::replace(&mut *self.0.borrow_mut(), Vec::new())
    }
}
