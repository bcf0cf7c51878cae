//! The inspector instance.
//!
//! `Inspector` owns all interaction state (mirror, selection, clipboard,
//! timers, pause state) and the host capabilities it was created with. The
//! engine is passed into every call that touches the world. The host calls
//! `pre_tick` before each simulation step and `post_render` after drawing,
//! and forwards input through `handle_input`.

use crate::clipboard::{
    Clipboard, EXPORT_MIME, build_export, export_filename, import_group, is_supported_file,
};
use crate::config::InspectorOptions;
use crate::error::InspectorError;
use crate::events::{EventBus, InspectorEvent, SubscriptionId};
use crate::host::{Downloader, FilePicker, Notifier, Services};
use crate::input::{InputEvent, InputState, ModeFlags, PointerButton};
use crate::mirror::{MirrorKind, SceneGraphMirror};
use crate::pause::{PAUSE_STATE_KEY, PauseController};
use crate::reparent::apply_tree_move;
use crate::scheduler::{Scheduler, Task};
use crate::selection::SelectionModel;
use crate::shortcuts::{
    DEFAULT_BINDINGS, KeyBinder, KeyCombo, SERIALIZER_BINDINGS, ShortcutAction, parse_bindings,
};
use crate::transform::{CursorHint, TransformController, begin_translate};
use crate::tree::{TreeState, TreeWidget};
use kurbo::{Point, Rect, Vec2};
use si_core::{Engine, NodeKey, ObjectId, ObjectKind, SceneSerializer, World};
use si_render::{OverlayCanvas, OverlayTheme, hit_test, hit_test_region, paint_overlay};
use std::fs;
use std::path::Path;

pub const TOOL_ROOT_LABEL: &str = "Root";
pub const NEW_COMPOSITE_LABEL: &str = "Composite";

pub const HELP_TEXT: &str = "\
Scene Inspector

[right click] select object
[right click + drag] region select
[shift + right click] add to selection
[right click + hold] move selection
[shift + r] + drag or arrows: rotate selection
[shift + s] + drag or arrows: scale selection (hold d for X only, f for Y only)
[shift + space] pause or play
[shift + q] make selected bodies static
[del] or [backspace] delete selection
[ctrl + c] copy bodies, [ctrl + v] paste
[shift + o] export selection, [shift + i] import
[shift + y] toggle auto-hide, [shift + e] toggle auto-rewind
[shift + j] this help";

/// What the inspector needs from the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderHandle {
    /// Visible world-space area; overlays outside it are culled.
    pub viewport: Rect,
}

impl RenderHandle {
    pub fn new(viewport: Rect) -> Self {
        Self { viewport }
    }
}

pub struct Inspector<T: TreeWidget = TreeState> {
    options: InspectorOptions,
    render: Option<RenderHandle>,
    theme: OverlayTheme,
    world_id: u32,
    tool_root: u32,

    tree: T,
    serializer: Option<Box<dyn SceneSerializer>>,
    notifier: Box<dyn Notifier>,
    downloader: Box<dyn Downloader>,
    picker: Option<Box<dyn FilePicker>>,
    keys: Box<dyn KeyBinder>,
    registered: Vec<KeyCombo>,

    mirror: SceneGraphMirror,
    selection: SelectionModel,
    clipboard: Clipboard,
    transform: TransformController,
    pause: PauseController,
    input: InputState,
    scheduler: Scheduler,
    events: EventBus,
    cursor: CursorHint,
}

impl<T: TreeWidget> Inspector<T> {
    /// Attach an inspector to `engine`.
    ///
    /// The world composite is placed under a new tool root composite so
    /// imported and added groups can sit beside it. Key bindings are
    /// registered with the host's binder; export, import, copy and paste
    /// only when a serializer is configured.
    pub fn create(
        engine: &mut Engine,
        render: Option<RenderHandle>,
        options: InspectorOptions,
        services: Services<T>,
    ) -> Result<Self, InspectorError> {
        let Services {
            tree,
            serializer,
            notifier,
            downloader,
            picker,
            mut keys,
        } = services;

        let world = &mut engine.world;
        let world_id = world.root();
        let tool_root = world.create_composite(TOOL_ROOT_LABEL);
        if let Err(e) = world.add_composite(tool_root, world_id, false) {
            world.remove(ObjectId::composite(tool_root))?;
            return Err(e.into());
        }
        world.set_modified();

        let mut registered = Vec::new();
        let mut tables = vec![DEFAULT_BINDINGS];
        if serializer.is_some() {
            tables.push(SERIALIZER_BINDINGS);
        }
        for table in tables {
            for (combo, action) in parse_bindings(table) {
                keys.bind(combo, action);
                registered.push(combo);
            }
        }

        log::info!(
            "inspector created: world composite_{world_id} under tool root composite_{tool_root}, {} key bindings",
            registered.len()
        );

        Ok(Self {
            mirror: SceneGraphMirror::new(options.auto_expand),
            options,
            render,
            theme: OverlayTheme::default(),
            world_id,
            tool_root,
            tree,
            serializer,
            notifier,
            downloader,
            picker,
            keys,
            registered,
            selection: SelectionModel::new(),
            clipboard: Clipboard::new(),
            transform: TransformController::new(),
            pause: PauseController::new(),
            input: InputState::new(),
            scheduler: Scheduler::new(),
            events: EventBus::new(),
            cursor: CursorHint::Default,
        })
    }

    /// Detach from `engine` and hand the host capabilities back.
    ///
    /// Unregisters exactly the bindings `create` registered, drops pending
    /// timers and subscriptions, detaches the world composite from whatever
    /// owns it and removes the tool root with anything else under it.
    pub fn destroy(mut self, engine: &mut Engine) -> Services<T> {
        for combo in self.registered.drain(..) {
            self.keys.unbind(&combo);
        }
        self.scheduler.clear();
        self.events.clear();
        self.input.reset();

        let world = &mut engine.world;
        let world_obj = ObjectId::composite(self.world_id);
        if world.owner_of(world_obj).is_some()
            && let Err(e) = world.detach(world_obj)
        {
            log::warn!("destroy: could not detach world: {e}");
        }
        if let Err(e) = world.remove(ObjectId::composite(self.tool_root)) {
            log::warn!("destroy: could not remove tool root: {e}");
        }
        log::info!("inspector destroyed");

        Services {
            tree: self.tree,
            serializer: self.serializer,
            notifier: self.notifier,
            downloader: self.downloader,
            picker: self.picker,
            keys: self.keys,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn options(&self) -> &InspectorOptions {
        &self.options
    }

    pub fn world_id(&self) -> u32 {
        self.world_id
    }

    pub fn tool_root(&self) -> u32 {
        self.tool_root
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn mirror(&self) -> &SceneGraphMirror {
        &self.mirror
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Cursor hint computed by the last `pre_tick`.
    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn registered_combos(&self) -> &[KeyCombo] {
        &self.registered
    }

    pub fn set_theme(&mut self, theme: OverlayTheme) {
        self.theme = theme;
    }

    /// Current pointer in world space. Stays at the origin without a render
    /// handle.
    pub fn pointer(&self) -> Point {
        if self.render.is_none() {
            return Point::ZERO;
        }
        let (dx, dy) = self.options.pointer_offset;
        self.input.pointer + Vec2::new(dx, dy)
    }

    // ─── Events ──────────────────────────────────────────────────────────

    pub fn subscribe(
        &mut self,
        event: InspectorEvent,
        handler: impl FnMut(InspectorEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(event, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ─── Host hooks ──────────────────────────────────────────────────────

    /// Run before each simulation step, with the host clock in ms.
    ///
    /// Order: due timers, mirror rebuild if the world changed, selection
    /// re-applied to the tree, region update, transform modes.
    pub fn pre_tick(&mut self, engine: &mut Engine, now_ms: u64) -> CursorHint {
        for task in self.scheduler.advance_to(now_ms) {
            self.run_task(engine, task);
        }

        let world = &mut engine.world;
        if self.mirror.sync(world, self.tool_root, &mut self.tree) {
            self.selection.purge(world, &mut self.tree);
            self.clipboard.purge(world);
            self.selection.reapply(&mut self.tree);
        }

        let pointer = self.pointer();
        if self.selection.is_region_active() {
            self.selection.update_region(pointer);
        }

        let modes = ModeFlags::from_input(&self.input);
        self.cursor = self.transform.tick(
            world,
            &self.selection,
            modes,
            pointer,
            self.input.key_axis(),
        );
        self.cursor
    }

    /// Paint selection and region overlays. Does nothing without a render
    /// handle.
    pub fn post_render(&self, world: &World, canvas: &mut dyn OverlayCanvas) {
        let Some(render) = self.render else {
            return;
        };
        paint_overlay(
            canvas,
            world,
            &self.selection.objects(),
            self.selection.region(),
            render.viewport,
            &self.theme,
        );
    }

    pub fn handle_input(&mut self, engine: &mut Engine, event: &InputEvent) {
        match event {
            InputEvent::KeyDown { key } => {
                self.input.apply(event);
                if key.is_modifier() {
                    return;
                }
                let combo = KeyCombo::new(self.input.modifiers(), *key);
                if let Some(action) = self.keys.resolve(&combo) {
                    log::debug!("shortcut {combo}: {action:?}");
                    self.run_action(engine, action);
                }
            }
            InputEvent::KeyUp { .. } => self.input.apply(event),
            _ if self.render.is_none() => {}
            InputEvent::PointerDown { button, .. } => {
                self.input.apply(event);
                if *button == PointerButton::Secondary {
                    self.on_pointer_down(&engine.world);
                }
            }
            InputEvent::PointerMove { .. } => self.input.apply(event),
            InputEvent::PointerUp { button, .. } => {
                self.input.apply(event);
                self.on_pointer_up(&engine.world, *button);
            }
        }
    }

    fn on_pointer_down(&mut self, world: &World) {
        let pointer = self.pointer();
        let union = self.input.modifiers().is_union_select();

        match hit_test(world, self.world_id, pointer) {
            Some(object) => {
                if union {
                    self.selection.add(object, world, &mut self.tree);
                } else {
                    self.selection.replace(&[object], world, &mut self.tree);
                }
                self.selection.cancel_region();
            }
            None => {
                if !union {
                    self.tree.deselect_all();
                    self.selection.clear(world, &mut self.tree);
                }
                self.selection.begin_region(pointer);
                self.events.publish(InspectorEvent::SelectStart);
            }
        }

        if !self.selection.is_empty() {
            begin_translate(world, &mut self.selection, pointer);
        }
    }

    fn on_pointer_up(&mut self, world: &World, button: PointerButton) {
        if button == PointerButton::Secondary {
            self.selection.clear_offsets();
        }
        let pointer = self.pointer();
        self.selection.update_region(pointer);
        let Some(region) = self.selection.end_region() else {
            return;
        };
        let hits = hit_test_region(world, self.world_id, region);
        if self.input.modifiers().is_union_select() {
            for object in hits {
                self.selection.add(object, world, &mut self.tree);
            }
        } else {
            self.selection.replace(&hits, world, &mut self.tree);
        }
        self.events.publish(InspectorEvent::SelectEnd);
    }

    // ─── Actions ─────────────────────────────────────────────────────────

    /// Run a shortcut action, reporting failures through the notifier.
    pub fn run_action(&mut self, engine: &mut Engine, action: ShortcutAction) {
        let result = match action {
            ShortcutAction::TogglePause => self.toggle_pause(engine),
            ShortcutAction::Export => self.export(engine).map(drop),
            ShortcutAction::Import => self.open_import(),
            ShortcutAction::Copy => {
                self.copy();
                Ok(())
            }
            ShortcutAction::Paste => self.paste(engine).map(drop),
            ShortcutAction::Delete => self.delete_selected(engine).map(drop),
            ShortcutAction::SetStatic => {
                self.set_static_selected(&mut engine.world);
                Ok(())
            }
            ShortcutAction::ShowHelp => {
                self.show_help();
                Ok(())
            }
            ShortcutAction::ToggleAutoHide => {
                self.toggle_auto_hide();
                Ok(())
            }
            ShortcutAction::ToggleAutoRewind => {
                self.toggle_auto_rewind();
                Ok(())
            }
        };
        if let Err(e) = result {
            self.report(e);
        }
    }

    fn report(&mut self, error: InspectorError) {
        log::warn!("{error}");
        if error.is_user_facing() {
            self.notifier.alert(&error.to_string());
        }
    }

    pub fn set_paused(&mut self, engine: &mut Engine, paused: bool) -> Result<(), InspectorError> {
        let event = self.pause.set_paused(
            paused,
            engine,
            self.serializer.as_deref_mut(),
            self.options.auto_rewind,
            &mut self.selection,
            &mut self.tree,
        )?;
        self.events.publish(event);
        Ok(())
    }

    pub fn toggle_pause(&mut self, engine: &mut Engine) -> Result<(), InspectorError> {
        let paused = !self.pause.is_paused();
        self.set_paused(engine, paused)
    }

    /// Replace the clipboard with the selected bodies.
    pub fn copy(&mut self) -> usize {
        self.clipboard.copy(&self.selection)
    }

    /// Paste clipboard clones next to their sources. The clones are
    /// selected once the paste settle delay has passed.
    pub fn paste(&mut self, engine: &mut Engine) -> Result<Vec<ObjectId>, InspectorError> {
        let serializer = self
            .serializer
            .as_deref()
            .ok_or(InspectorError::NoSerializer)?;
        let mirror = &self.mirror;
        let clones = self
            .clipboard
            .paste(&mut engine.world, serializer, |world, object| {
                mirror.owner_of(object).or_else(|| world.owner_of(object))
            })?;
        if !clones.is_empty() {
            self.scheduler
                .enqueue(Task::PasteSettle(clones.clone()), self.options.paste_settle_ms);
        }
        Ok(clones)
    }

    /// Serialize the selection and download it. Returns the filename.
    pub fn export(&mut self, engine: &Engine) -> Result<String, InspectorError> {
        let serializer = self
            .serializer
            .as_deref()
            .ok_or(InspectorError::NoSerializer)?;
        if self.selection.is_empty() {
            return Err(InspectorError::EmptySelection);
        }
        let objects = self.selection.objects();
        let group = build_export(&engine.world, &objects);
        let filename = export_filename(&engine.world, &objects);
        let text = serializer.serialize(&group, self.options.export_indent)?;
        self.downloader.download(&filename, EXPORT_MIME, &text)?;
        log::info!("exported {} objects as {filename}", objects.len());
        self.events.publish(InspectorEvent::Export);
        Ok(filename)
    }

    /// Ask the file picker for a file and import it.
    pub fn open_import(&mut self) -> Result<(), InspectorError> {
        if self.serializer.is_none() {
            return Err(InspectorError::NoSerializer);
        }
        let Some(picker) = self.picker.as_mut() else {
            log::debug!("import: no file picker configured");
            return Ok(());
        };
        match picker.pick_file() {
            Some(path) => self.import_file(&path),
            None => Ok(()),
        }
    }

    /// Read `path` and queue it for import on the next tick.
    pub fn import_file(&mut self, path: &Path) -> Result<(), InspectorError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_supported_file(&name) {
            return Err(InspectorError::UnsupportedFile(name));
        }
        let text = fs::read_to_string(path)?;
        self.import_text(&name, text)
    }

    /// Queue already-read file contents for import on the next tick.
    pub fn import_text(&mut self, name: &str, text: String) -> Result<(), InspectorError> {
        if self.serializer.is_none() {
            return Err(InspectorError::NoSerializer);
        }
        if !is_supported_file(name) {
            return Err(InspectorError::UnsupportedFile(name.to_string()));
        }
        self.scheduler.enqueue(
            Task::Import {
                name: name.to_string(),
                text,
            },
            0,
        );
        Ok(())
    }

    fn apply_import(
        &mut self,
        engine: &mut Engine,
        name: &str,
        text: &str,
    ) -> Result<u32, InspectorError> {
        let serializer = self
            .serializer
            .as_deref()
            .ok_or(InspectorError::NoSerializer)?;
        let id = import_group(&mut engine.world, serializer, self.tool_root, name, text)?;
        self.mirror
            .rebuild(&engine.world, self.tool_root, &mut self.tree);
        self.selection.reapply(&mut self.tree);
        log::info!("imported {name}");
        self.events.publish(InspectorEvent::Import);
        Ok(id)
    }

    /// Delete the selected objects and any composites selected in the tree.
    /// The world and the tool root are never deleted. Returns how many
    /// objects were removed.
    pub fn delete_selected(&mut self, engine: &mut Engine) -> Result<usize, InspectorError> {
        let world = &mut engine.world;
        let mut targets = self.selection.objects();
        for key in self.tree.selected() {
            if let Some(object) = key.object()
                && object.kind == ObjectKind::Composite
                && !targets.contains(&object)
            {
                targets.push(object);
            }
        }

        let protected = [
            ObjectId::composite(self.world_id),
            ObjectId::composite(self.tool_root),
        ];
        let mut removed = 0;
        let world_obj = ObjectId::composite(self.world_id);
        for object in targets {
            // Already gone with a deleted ancestor.
            if protected.contains(&object) || !world.is_live(object) {
                continue;
            }
            if object.kind == ObjectKind::Composite && world.is_ancestor(object.id, world_obj) {
                log::warn!("delete: {object} holds the world composite, skipped");
                continue;
            }
            world.remove(object)?;
            removed += 1;
        }

        self.selection.clear(world, &mut self.tree);
        self.clipboard.purge(world);
        log::info!("deleted {removed} objects");
        Ok(removed)
    }

    /// Make the selected bodies static. Returns how many changed.
    pub fn set_static_selected(&self, world: &mut World) -> usize {
        let mut changed = 0;
        for object in self.selection.objects() {
            if object.kind != ObjectKind::Body {
                continue;
            }
            if let Some(body) = world.body_mut(object.id)
                && !body.is_static
            {
                body.set_static(true);
                changed += 1;
            }
        }
        changed
    }

    /// Add an empty composite at the top of the tool root.
    pub fn add_composite(&mut self, engine: &mut Engine) -> Result<u32, InspectorError> {
        let world = &mut engine.world;
        let id = world.create_composite(NEW_COMPOSITE_LABEL);
        world.add_composite(self.tool_root, id, true)?;
        world.set_modified();
        Ok(id)
    }

    pub fn toggle_auto_hide(&mut self) -> bool {
        self.options.auto_hide = !self.options.auto_hide;
        log::info!("auto-hide {}", on_off(self.options.auto_hide));
        self.options.auto_hide
    }

    /// Turning auto-rewind off discards the saved snapshot.
    pub fn toggle_auto_rewind(&mut self) -> bool {
        self.options.auto_rewind = !self.options.auto_rewind;
        if !self.options.auto_rewind
            && let Some(serializer) = self.serializer.as_deref_mut()
        {
            serializer.remove_state(PAUSE_STATE_KEY);
        }
        log::info!("auto-rewind {}", on_off(self.options.auto_rewind));
        self.options.auto_rewind
    }

    pub fn show_help(&mut self) {
        self.notifier.alert(HELP_TEXT);
    }

    // ─── Tree interaction ────────────────────────────────────────────────

    /// The user changed the tree selection. Read back after the tree
    /// debounce delay.
    pub fn on_tree_selection_changed(&mut self) {
        self.scheduler
            .schedule(Task::TreeSelection, self.options.tree_debounce_ms);
    }

    /// Select the children of every selected composite or category node.
    pub fn on_tree_double_click(&mut self) {
        let mut changed = false;
        for key in self.tree.selected() {
            let Some(info) = self.tree.node(key) else {
                continue;
            };
            if info.kind == MirrorKind::Composite || info.kind.is_category() {
                for child in self.tree.children(key) {
                    changed |= self.tree.select(child);
                }
            }
        }
        if changed {
            self.on_tree_selection_changed();
        }
    }

    /// Drag-and-drop of `node` onto `new_parent`. Returns whether the world
    /// changed.
    ///
    /// The world composite stays directly under the tool root. When the
    /// world rejects a move the tree is rebuilt on the next tick.
    pub fn on_tree_drop(
        &mut self,
        engine: &mut Engine,
        node: NodeKey,
        new_parent: NodeKey,
    ) -> Result<bool, InspectorError> {
        if node == ObjectId::composite(self.world_id).key() {
            return Err(InspectorError::InvalidMove(
                "The world composite cannot be moved".to_string(),
            ));
        }
        self.tree
            .move_node(node, new_parent)
            .map_err(InspectorError::InvalidMove)?;
        let result = apply_tree_move(&mut engine.world, &self.tree, node, new_parent);
        if result.is_err() {
            engine.world.set_modified();
        }
        result
    }

    /// Filter the tree after the search debounce delay.
    pub fn search(&mut self, query: &str) {
        self.scheduler.schedule(
            Task::Search(query.to_string()),
            self.options.search_debounce_ms,
        );
    }

    // ─── Deferred work ───────────────────────────────────────────────────

    fn run_task(&mut self, engine: &mut Engine, task: Task) {
        match task {
            Task::TreeSelection => {
                let world = &engine.world;
                let objects: Vec<ObjectId> = self
                    .tree
                    .selected()
                    .into_iter()
                    .filter_map(|key| key.object())
                    .filter(|object| world.find_in(self.tool_root, *object))
                    .collect();
                self.selection.replace(&objects, world, &mut self.tree);
            }
            Task::PasteSettle(clones) => {
                let world = &engine.world;
                let live: Vec<ObjectId> =
                    clones.into_iter().filter(|c| world.is_live(*c)).collect();
                self.selection.replace(&live, world, &mut self.tree);
            }
            Task::Import { name, text } => {
                if let Err(e) = self.apply_import(engine, &name, &text) {
                    self.report(e);
                }
            }
            Task::Search(query) => {
                let matches = self.tree.search(&query);
                log::debug!("search {query:?}: {matches} matches");
            }
        }
    }
}

impl Inspector<TreeState> {
    /// Inspector with headless services and default options.
    pub fn headless(engine: &mut Engine) -> Result<Self, InspectorError> {
        Self::create(
            engine,
            None,
            InspectorOptions::default(),
            Services::headless(),
        )
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
