pub mod clipboard;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod input;
pub mod inspector;
pub mod mirror;
pub mod pause;
pub mod reparent;
pub mod scheduler;
pub mod selection;
pub mod shortcuts;
pub mod transform;
pub mod tree;

pub use clipboard::Clipboard;
pub use config::InspectorOptions;
pub use error::InspectorError;
pub use events::{EventBus, InspectorEvent, SubscriptionId};
pub use host::{
    Download, Downloader, FilePicker, FsDownloader, LogNotifier, MemoryDownloader,
    MemoryNotifier, Notifier, QueuedFilePicker, Services,
};
pub use input::{InputEvent, InputState, Key, Modifiers, ModeFlags, PointerButton, ScaleAxis};
pub use inspector::{Inspector, RenderHandle};
pub use mirror::{MirrorKind, MirrorNode, SceneGraphMirror};
pub use pause::{PauseController, PlayState};
pub use selection::{SelectionEntry, SelectionModel};
pub use shortcuts::{KeyBinder, KeyCombo, Keymap, ShortcutAction};
pub use transform::{CursorHint, TransformController};
pub use tree::{TreeNodeInfo, TreeState, TreeWidget};
