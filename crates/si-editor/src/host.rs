//! Host capabilities the inspector calls out to.
//!
//! A browser host would alert, trigger a download and open a file picker;
//! the native and headless versions here write to the filesystem, the log
//! or shared in-memory buffers.

use crate::shortcuts::{KeyBinder, Keymap};
use crate::tree::{TreeState, TreeWidget};
use si_core::{JsonSerializer, SceneSerializer};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// User-facing messages.
pub trait Notifier {
    fn alert(&mut self, message: &str);
}

/// File download side effect for exports.
pub trait Downloader {
    fn download(&mut self, filename: &str, mime: &str, contents: &str) -> io::Result<()>;
}

/// Lets the user choose a file to import.
pub trait FilePicker {
    fn pick_file(&mut self) -> Option<PathBuf>;
}

/// Writes alerts to the log at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&mut self, message: &str) {
        log::warn!("{message}");
    }
}

/// Collects alerts; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    messages: Rc<RefCell<Vec<String>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.borrow_mut())
    }
}

impl Notifier for MemoryNotifier {
    fn alert(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// Saves downloads into a directory.
#[derive(Debug, Clone)]
pub struct FsDownloader {
    dir: PathBuf,
}

impl FsDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Downloader for FsDownloader {
    fn download(&mut self, filename: &str, mime: &str, contents: &str) -> io::Result<()> {
        let path = self.dir.join(filename);
        fs::write(&path, contents)?;
        log::info!("downloaded {} ({mime}, {} bytes)", path.display(), contents.len());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub mime: String,
    pub contents: String,
}

/// Keeps downloads in memory; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryDownloader {
    downloads: Rc<RefCell<Vec<Download>>>,
}

impl MemoryDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downloads(&self) -> Vec<Download> {
        self.downloads.borrow().clone()
    }

    pub fn last(&self) -> Option<Download> {
        self.downloads.borrow().last().cloned()
    }
}

impl Downloader for MemoryDownloader {
    fn download(&mut self, filename: &str, mime: &str, contents: &str) -> io::Result<()> {
        self.downloads.borrow_mut().push(Download {
            filename: filename.to_string(),
            mime: mime.to_string(),
            contents: contents.to_string(),
        });
        Ok(())
    }
}

/// Hands out a queue of preset paths, one per pick.
#[derive(Debug, Default, Clone)]
pub struct QueuedFilePicker {
    queue: Rc<RefCell<Vec<PathBuf>>>,
}

impl QueuedFilePicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: impl Into<PathBuf>) {
        self.queue.borrow_mut().push(path.into());
    }
}

impl FilePicker for QueuedFilePicker {
    fn pick_file(&mut self) -> Option<PathBuf> {
        let mut queue = self.queue.borrow_mut();
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

/// Everything the inspector needs from its host, bundled for `create`.
pub struct Services<T: TreeWidget = TreeState> {
    pub tree: T,
    pub serializer: Option<Box<dyn SceneSerializer>>,
    pub notifier: Box<dyn Notifier>,
    pub downloader: Box<dyn Downloader>,
    pub picker: Option<Box<dyn FilePicker>>,
    pub keys: Box<dyn KeyBinder>,
}

impl Services<TreeState> {
    /// Headless defaults: JSON serializer, log alerts, downloads into the
    /// current directory, no file picker.
    pub fn headless() -> Self {
        Self {
            tree: TreeState::new(),
            serializer: Some(Box::new(JsonSerializer::new())),
            notifier: Box::new(LogNotifier),
            downloader: Box::new(FsDownloader::new(".")),
            picker: None,
            keys: Box::new(Keymap::new()),
        }
    }
}

impl<T: TreeWidget> Services<T> {
    pub fn without_serializer(mut self) -> Self {
        self.serializer = None;
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_downloader(mut self, downloader: impl Downloader + 'static) -> Self {
        self.downloader = Box::new(downloader);
        self
    }

    pub fn with_picker(mut self, picker: impl FilePicker + 'static) -> Self {
        self.picker = Some(Box::new(picker));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_buffers_are_shared_between_clones() {
        let notifier = MemoryNotifier::new();
        let mut boxed: Box<dyn Notifier> = Box::new(notifier.clone());
        boxed.alert("hello");
        assert_eq!(notifier.messages(), vec!["hello".to_string()]);
        assert_eq!(notifier.take().len(), 1);
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn fs_downloader_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = FsDownloader::new(dir.path());
        d.download("export-objects.json", "application/json", "{}")
            .unwrap();
        let text = fs::read_to_string(dir.path().join("export-objects.json")).unwrap();
        assert_eq!(text, "{}");
    }

    #[test]
    fn queued_picker_pops_in_order() {
        let picker = QueuedFilePicker::new();
        picker.push("a.json");
        picker.push("b.txt");
        let mut p = picker.clone();
        assert_eq!(p.pick_file(), Some(PathBuf::from("a.json")));
        assert_eq!(p.pick_file(), Some(PathBuf::from("b.txt")));
        assert_eq!(p.pick_file(), None);
    }
}
