use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap as SpurMap;
use lasso::Spur;

use crate::error::GlispError;
use crate::value::{intern, resolve, Value};

/// A glisp environment: a chain of frames with bindings.
#[derive(Clone)]
pub struct Env {
    pub bindings: Rc<RefCell<SpurMap<Spur, Value>>>,
    pub parent: Option<Rc<Env>>,
}

impl Env {
    pub fn new() -> Self {
        Env {
            bindings: Rc::new(RefCell::new(SpurMap::new())),
            parent: None,
        }
    }

    /// Child frame binding `names` positionally; names past the end of
    /// `values` are bound to Nil.
    pub fn extend(&self, names: &[Spur], values: Vec<Value>) -> Env {
        let mut frame = SpurMap::with_capacity(names.len());
        let mut values = values.into_iter();
        for name in names {
            frame.insert(*name, values.next().unwrap_or(Value::Nil));
        }
        Env {
            bindings: Rc::new(RefCell::new(frame)),
            parent: Some(Rc::new(self.clone())),
        }
    }

    pub fn get(&self, name: Spur) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(val) = frame.bindings.borrow().get(&name) {
                return Some(val.clone());
            }
            match &frame.parent {
                Some(parent) => frame = parent,
                None => return None,
            }
        }
    }

    pub fn get_str(&self, name: &str) -> Option<Value> {
        self.get(intern(name))
    }

    pub fn lookup(&self, name: Spur) -> Result<Value, GlispError> {
        self.get(name)
            .ok_or_else(|| GlispError::Unbound(resolve(name)))
    }

    /// Insert or overwrite in this frame only.
    pub fn bind(&self, name: Spur, val: Value) {
        self.bindings.borrow_mut().insert(name, val);
    }

    pub fn bind_str(&self, name: &str, val: Value) {
        self.bind(intern(name), val);
    }

    /// Every name visible from this frame, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut frame = Some(self);
        while let Some(env) = frame {
            for key in env.bindings.borrow().keys() {
                seen.insert(resolve(*key));
            }
            frame = env.parent.as_deref();
        }
        seen.into_iter().collect()
    }

    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut frame = self;
        while let Some(parent) = &frame.parent {
            depth += 1;
            frame = parent;
        }
        depth
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

// Frames routinely contain closures that capture the frame itself.
impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("depth", &self.depth())
            .field("bindings", &self.bindings.borrow().len())
            .finish()
    }
}
