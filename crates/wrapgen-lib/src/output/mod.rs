//! Output modules: each consumes the analyzed model plus the partitioned
//! binding files and writes one artifact family.

mod bidirectional;
mod bindings;
mod js_stub;


use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::model::Analyzer;
use crate::partition::BindingFile;

pub use bidirectional::BidirectionalOutputModule;
pub use bindings::BindingsOutputModule;
pub use js_stub::JavascriptStubOutputModule;

/// Where generated files land: the working directory in production, an
/// in-memory map under test.
pub trait OutputTarget {
    fn write_file(&self, name: &str, contents: &str) -> crate::Result<()>;
}

/// Writes files into a directory.
pub struct DirectoryTarget {
    root: PathBuf,
}

impl DirectoryTarget {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The current working directory, where the tool writes by default.
    pub fn current_dir() -> Self {
        Self { root: PathBuf::from(".") }
    }
}

impl OutputTarget for DirectoryTarget {
    fn write_file(&self, name: &str, contents: &str) -> crate::Result<()> {
        std::fs::write(self.root.join(name), contents)?;
        Ok(())
    }
}

/// Captures output in memory for inspection after a run.
#[derive(Default)]
pub struct MemoryTarget {
    files: RefCell<IndexMap<String, String>>,
}

impl MemoryTarget {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn file(&self, name: &str) -> Option<String> {
        self.files.borrow().get(name).cloned()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }
}

impl OutputTarget for MemoryTarget {
    fn write_file(&self, name: &str, contents: &str) -> crate::Result<()> {
        self.files
            .borrow_mut()
            .insert(name.to_string(), contents.to_string());
        Ok(())
    }
}

/// One artifact family.
pub trait OutputModule {
    fn name(&self) -> &'static str;

    fn process(&mut self, analyzer: &Analyzer<'_>, files: &[BindingFile]) -> crate::Result<()>;
}

/// The three default output modules against one target.
pub fn default_output_modules(target: Rc<dyn OutputTarget>) -> Vec<Box<dyn OutputModule>> {
    vec![
        Box::new(JavascriptStubOutputModule::new(Rc::clone(&target))),
        Box::new(BindingsOutputModule::new(Rc::clone(&target))),
        Box::new(BidirectionalOutputModule::new(target)),
    ]
}
