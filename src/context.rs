//! Per-translation state.
//!
//! A [`Context`] is cheap to clone and is extended by value on every
//! descent. The [`Session`] it points at is shared by every context of one
//! conversion call and carries the only mutable state: the feature flags.
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{Error, ErrorMeta, PathSegment, Result};
use crate::options::{Options, Policy};

/// Runtime helpers the generated declarations turned out to need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Flag {
    UseAnnotate,
}

pub struct Session<'a> {
    pub options: &'a Options,
    source: Option<Arc<str>>,
    flags: RefCell<BTreeSet<Flag>>,
}

impl<'a> Session<'a> {
    pub fn new(options: &'a Options) -> Self {
        Session { options, source: None, flags: RefCell::default() }
    }

    pub fn with_source(mut self, source: Option<Arc<str>>) -> Self {
        self.source = source;
        self
    }

    pub fn set(&self, flag: Flag) {
        self.flags.borrow_mut().insert(flag);
    }

    pub fn has(&self, flag: Flag) -> bool {
        self.flags.borrow().contains(&flag)
    }

    pub fn meta(&self, path: &[PathSegment]) -> ErrorMeta {
        ErrorMeta {
            path: path.to_vec(),
            filename: self.options.source_filename.clone(),
            source: self.source.clone(),
        }
    }

    pub fn warn(&self, message: &str, path: &[PathSegment]) {
        self.options.emit_warning(message, &self.meta(path));
    }
}

#[derive(Clone)]
pub struct Context<'a> {
    session: &'a Session<'a>,
    path: Vec<PathSegment>,
    top_level: &'a str,
}

impl<'a> Context<'a> {
    /// Root context for the named type `top_level`; its path starts at that name.
    pub fn new(session: &'a Session<'a>, top_level: &'a str) -> Self {
        Context { session, path: vec![PathSegment::Key(top_level.to_string())], top_level }
    }

    pub fn walk(&self, step: impl Into<PathSegment>) -> Self {
        let mut next = self.clone();
        next.path.push(step.into());
        next
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn top_level(&self) -> &str {
        self.top_level
    }

    pub fn use_unknown(&self) -> bool {
        self.session.options.use_unknown
    }

    pub fn meta(&self) -> ErrorMeta {
        self.session.meta(&self.path)
    }

    pub fn set(&self, flag: Flag) {
        self.session.set(flag);
    }

    pub fn warn(&self, message: &str) {
        self.session.warn(message, &self.path);
    }

    /// Apply the unsupported-construct policy. `Ok` means "carry on, best effort".
    pub fn handle_unsupported(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        match self.session.options.unsupported {
            Policy::Ignore => Ok(()),
            Policy::Warn => {
                self.warn(&message);
                Ok(())
            }
            Policy::Error => Err(Error::Unsupported { message, meta: self.meta() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn walk_extends_path_without_touching_parent() {
        let options = Options::default();
        let session = Session::new(&options);
        let root = Context::new(&session, "User");
        let child = root.walk("properties").walk("tags").walk(0usize);
        assert_eq!(root.path().len(), 1);
        assert_eq!(child.meta().display_path(), "[User, properties, tags, 0]");
        assert_eq!(child.top_level(), "User");
    }

    #[test]
    fn flags_are_shared_across_contexts() {
        let options = Options::default();
        let session = Session::new(&options);
        Context::new(&session, "A").walk("x").set(Flag::UseAnnotate);
        assert!(session.has(Flag::UseAnnotate));
    }

    #[test]
    fn unsupported_policy() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut options = Options::default()
            .with_warn(move |msg, meta| sink.lock().unwrap().push(format!("{msg} {}", meta.display_path())));

        {
            let session = Session::new(&options);
            Context::new(&session, "A").handle_unsupported("nope").unwrap();
        }
        assert_eq!(seen.lock().unwrap().as_slice(), ["nope [A]"]);

        options.unsupported = Policy::Ignore;
        {
            let session = Session::new(&options);
            Context::new(&session, "A").handle_unsupported("quiet").unwrap();
        }
        assert_eq!(seen.lock().unwrap().len(), 1);

        options.unsupported = Policy::Error;
        let session = Session::new(&options);
        let err = Context::new(&session, "A").walk("items").handle_unsupported("fatal").unwrap_err();
        assert!(matches!(err, Error::Unsupported { ref meta, .. } if meta.path.len() == 2));
    }
}
