//! Scoped variable table
//!
//! A stack of frames mapping names to optional values. Frames are pushed
//! per function call and popped on every exit path; blocks inside a
//! function share the function's frame. A name can be declared without a
//! value, which is distinct from not being declared at all.

use ahash::AHashMap;

/// One scope level
#[derive(Debug, Default)]
struct Frame {
    vars: AHashMap<String, Option<f64>>,
    /// Pending return value for the function executing in this frame.
    /// Kept out of the name map so user variables cannot collide with it.
    return_value: Option<f64>,
}

/// Stack of scope frames with shadowing lookup
///
/// A fresh (or reset) stack holds a single global frame seeded with the
/// constant `pi`. Nothing prevents a program from overwriting `pi`.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        let mut stack = Self { frames: Vec::new() };
        stack.reset();
        stack
    }

    /// Clear back to a single global frame and re-seed constants
    pub fn reset(&mut self) {
        self.frames.clear();
        self.frames.push(Frame::default());
        self.local("pi", std::f64::consts::PI);
    }

    /// Push a new empty frame
    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Discard the top frame
    ///
    /// Tolerates popping the last frame; callers are expected to pop
    /// exactly what they pushed.
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Insert `name` into the top frame with no value, shadowing any
    /// lower-frame variable of the same name
    pub fn declare(&mut self, name: &str) {
        if let Some(top) = self.frames.last_mut() {
            top.vars.insert(name.to_string(), None);
        }
    }

    /// Insert `name` into the top frame with `value`, shadowing lower frames
    pub fn local(&mut self, name: &str, value: f64) {
        if let Some(top) = self.frames.last_mut() {
            top.vars.insert(name.to_string(), Some(value));
        }
    }

    /// Remove `name` from the top frame only, possibly un-shadowing a
    /// lower-frame variable. No-op if absent from the top frame.
    pub fn delete(&mut self, name: &str) {
        if let Some(top) = self.frames.last_mut() {
            top.vars.remove(name);
        }
    }

    /// True if `name` is present (with or without a value) in any frame
    pub fn exists(&self, name: &str) -> bool {
        self.frames.iter().rev().any(|f| f.vars.contains_key(name))
    }

    /// Look up `name` in the nearest frame that contains it
    ///
    /// Returns `None` if no frame contains the name, `Some(None)` if it is
    /// declared but unset, and `Some(Some(v))` if it has a value.
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.vars.get(name).copied())
    }

    /// Overwrite `name` in the nearest frame that contains it
    ///
    /// If no frame contains the name, it is created in the top frame: an
    /// assignment to a never-declared name vivifies a new binding where
    /// the assignment executes, not in any lower frame.
    pub fn set(&mut self, name: &str, value: f64) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.vars.get_mut(name) {
                *slot = Some(value);
                return;
            }
        }
        self.local(name, value);
    }

    /// Record the pending return value of the currently executing function
    pub fn set_return(&mut self, value: f64) {
        if let Some(top) = self.frames.last_mut() {
            top.return_value = Some(value);
        }
    }

    /// Pending return value of the top frame only
    ///
    /// Never searches lower frames: a function must not see its caller's
    /// return value.
    pub fn return_value(&self) -> Option<f64> {
        self.frames.last().and_then(|f| f.return_value)
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeds_pi() {
        let scopes = ScopeStack::new();
        assert_eq!(scopes.get("pi"), Some(Some(std::f64::consts::PI)));
    }

    #[test]
    fn test_declare_without_value() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x");
        assert!(scopes.exists("x"));
        assert_eq!(scopes.get("x"), Some(None));
    }

    #[test]
    fn test_declared_name_invisible_after_pop() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.declare("x");
        assert!(scopes.exists("x"));
        scopes.pop();
        assert!(!scopes.exists("x"));
        assert_eq!(scopes.get("x"), None);
    }

    #[test]
    fn test_shadowing() {
        let mut scopes = ScopeStack::new();
        scopes.local("x", 5.0);
        scopes.push();
        scopes.local("x", 1.0);
        assert_eq!(scopes.get("x"), Some(Some(1.0)));
        scopes.pop();
        assert_eq!(scopes.get("x"), Some(Some(5.0)));
    }

    #[test]
    fn test_set_updates_nearest_containing_frame() {
        let mut scopes = ScopeStack::new();
        scopes.local("x", 5.0);
        scopes.push();
        scopes.set("x", 9.0);
        scopes.pop();
        assert_eq!(scopes.get("x"), Some(Some(9.0)));
    }

    #[test]
    fn test_set_vivifies_in_top_frame_only() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.set("y", 3.0);
        assert_eq!(scopes.get("y"), Some(Some(3.0)));
        scopes.pop();
        // The binding lived in the popped frame, not the global one
        assert_eq!(scopes.get("y"), None);
    }

    #[test]
    fn test_delete_unshadows() {
        let mut scopes = ScopeStack::new();
        scopes.local("x", 5.0);
        scopes.push();
        scopes.local("x", 1.0);
        scopes.delete("x");
        assert_eq!(scopes.get("x"), Some(Some(5.0)));
    }

    #[test]
    fn test_delete_ignores_lower_frames() {
        let mut scopes = ScopeStack::new();
        scopes.local("x", 5.0);
        scopes.push();
        scopes.delete("x");
        assert_eq!(scopes.get("x"), Some(Some(5.0)));
    }

    #[test]
    fn test_return_slot_is_per_frame() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.set_return(7.0);
        scopes.push();
        // The callee does not see its caller's pending return value
        assert_eq!(scopes.return_value(), None);
        scopes.pop();
        assert_eq!(scopes.return_value(), Some(7.0));
    }

    #[test]
    fn test_pop_to_empty_does_not_panic() {
        let mut scopes = ScopeStack::new();
        scopes.pop();
        scopes.pop();
        assert!(!scopes.exists("pi"));
    }

    #[test]
    fn test_reset_restores_global_frame() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.local("x", 1.0);
        scopes.reset();
        assert!(!scopes.exists("x"));
        assert_eq!(scopes.get("pi"), Some(Some(std::f64::consts::PI)));
    }
}
