// src/presenter/mod.rs
pub mod clipboard;
pub mod render;
pub mod source;

use std::sync::{ Arc, Weak };
use log::{ debug, error, info, warn };
use parking_lot::{ Mutex, RwLock };
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use crate::config::DashboardConfig;
use crate::models::server::ServerStatus;
use self::clipboard::{ Clipboard, ClipboardError, ClipboardStrategies };
use self::source::StatusSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Mounted,
    Polling,
    Unmounted,
}

/// Everything a renderer needs. Cloned out of the presenter on demand.
#[derive(Debug, Clone)]
pub struct PresenterState {
    pub phase: Phase,
    pub snapshot: Vec<ServerStatus>,
    /// Id of the server whose address was copied last, while the flag lasts.
    pub copied: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Info => info!("{}: {}", notice.title, notice.description),
            NoticeKind::Error => error!("{}: {}", notice.title, notice.description),
        }
    }
}

/// Shown until the first poll lands.
pub fn placeholder_snapshot() -> Vec<ServerStatus> {
    vec![ServerStatus {
        id: "minecraft-1".to_string(),
        name: "Loading...".to_string(),
        image: "/minecraft-server-landscape.png".to_string(),
        ip: "Loading...".to_string(),
        online: true,
        players: 0,
        max_players: 0,
        player_list: Vec::new(),
        motd: Vec::new(),
        icon: None,
        version: None,
        uptime: None,
    }]
}

/// Owns the displayed snapshot and keeps it fresh by polling a
/// [`StatusSource`]. Once unmounted, nothing writes to the state again.
pub struct Presenter {
    source: Arc<dyn StatusSource>,
    clipboards: ClipboardStrategies,
    notifier: Arc<dyn Notifier>,
    config: DashboardConfig,
    state: RwLock<PresenterState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    revision: watch::Sender<u64>,
}

impl Presenter {
    pub fn new(
        source: Arc<dyn StatusSource>,
        clipboards: ClipboardStrategies,
        notifier: Arc<dyn Notifier>,
        config: DashboardConfig
    ) -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            source,
            clipboards,
            notifier,
            config,
            state: RwLock::new(PresenterState {
                phase: Phase::Uninitialized,
                snapshot: placeholder_snapshot(),
                copied: None,
            }),
            tasks: Mutex::new(Vec::new()),
            revision,
        })
    }

    pub fn view(&self) -> PresenterState {
        self.state.read().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.read().phase
    }

    /// Revision counter bumped on every applied change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Starts polling: one fetch right away, then one per interval. Only the
    /// first call has any effect.
    pub fn mount(self: &Arc<Self>) {
        {
            let mut state = self.state.write();
            if state.phase != Phase::Uninitialized {
                debug!("Ignoring mount in phase {:?}", state.phase);
                return;
            }
            state.phase = Phase::Mounted;
        }
        self.bump();

        let weak = Arc::downgrade(self);
        let period = self.config.poll_interval();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(presenter) = weak.upgrade() else {
                    break;
                };
                presenter.enter_polling();
                presenter.refresh().await;
            }
        });
        self.track(handle);
        info!("Polling status every {:?}", period);
    }

    /// Stops all timers. In-flight fetches may still resolve but are dropped.
    pub fn unmount(&self) {
        {
            let mut state = self.state.write();
            if state.phase == Phase::Unmounted {
                return;
            }
            state.phase = Phase::Unmounted;
        }
        for handle in self.tasks.lock().drain(..) {
            handle.abort();
        }
        self.bump();
        info!("Presenter unmounted");
    }

    /// One round trip to the source. Replaces the whole snapshot on success;
    /// on failure the previous snapshot stays. Returns whether it was replaced.
    pub async fn refresh(&self) -> bool {
        if self.phase() == Phase::Unmounted {
            return false;
        }

        match self.source.fetch().await {
            Ok(servers) => {
                debug!("Received snapshot with {} servers", servers.len());
                self.update(|state| state.snapshot = servers)
            }
            Err(e) => {
                warn!("Failed to fetch server status: {}", e);
                false
            }
        }
    }

    /// Copies a server address and flags `id` as just copied for a while.
    pub async fn copy_address(self: &Arc<Self>, display_address: &str, id: &str) -> bool {
        if self.phase() == Phase::Unmounted {
            return false;
        }

        let target = self.config.copy_address.as_deref().unwrap_or(display_address);
        match self.write_clipboard(target).await {
            Ok(()) => {
                let id = id.to_string();
                self.update(|state| state.copied = Some(id.clone()));
                self.notifier.notify(Notice {
                    kind: NoticeKind::Info,
                    title: "Address copied".to_string(),
                    description: format!("{} was copied to the clipboard", target),
                });
                self.schedule_copied_clear(id);
                true
            }
            Err(e) => {
                error!("Error copying address {}: {}", target, e);
                self.notifier.notify(Notice {
                    kind: NoticeKind::Error,
                    title: "Error".to_string(),
                    description: "Could not copy the address. Try copying it manually.".to_string(),
                });
                false
            }
        }
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), ClipboardError> {
        let primary = &self.clipboards.primary;
        let primary_error = if primary.is_available() {
            match primary.write_text(text).await {
                Ok(()) => {
                    return Ok(());
                }
                Err(e) => e,
            }
        } else {
            ClipboardError::Unavailable
        };
        debug!("Clipboard {} failed: {}", primary.name(), primary_error);

        let fallback = &self.clipboards.fallback;
        if !fallback.is_available() {
            return Err(primary_error);
        }
        fallback.write_text(text).await
    }

    fn schedule_copied_clear(self: &Arc<Self>, id: String) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let duration = self.config.copied_flag_duration();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(presenter) = weak.upgrade() {
                presenter.update(|state| {
                    if state.copied.as_deref() == Some(id.as_str()) {
                        state.copied = None;
                    }
                });
            }
        });
        self.track(handle);
    }

    fn enter_polling(&self) {
        let changed = self.update(|state| {
            if state.phase == Phase::Mounted {
                state.phase = Phase::Polling;
            }
        });
        if changed {
            debug!("Presenter polling");
        }
    }

    // Applies `change` unless unmounted. Returns whether it was applied.
    fn update(&self, change: impl FnOnce(&mut PresenterState)) -> bool {
        {
            let mut state = self.state.write();
            if state.phase == Phase::Unmounted {
                debug!("Dropping state update after unmount");
                return false;
            }
            change(&mut state);
        }
        self.bump();
        true
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        if self.phase() == Phase::Unmounted {
            handle.abort();
            return;
        }
        tasks.push(handle);
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::time::Duration;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use crate::presenter::clipboard::MockClipboard;
    use crate::presenter::source::{ MockStatusSource, SourceError };

    fn status(id: &str, players: u64) -> ServerStatus {
        ServerStatus {
            id: id.to_string(),
            name: id.to_uppercase(),
            image: String::new(),
            ip: format!("{}.example.net:25565", id),
            online: true,
            players,
            max_players: 20,
            player_list: Vec::new(),
            motd: Vec::new(),
            icon: None,
            version: None,
            uptime: Some("Online".to_string()),
        }
    }

    /// Replays scripted answers, then repeats the last one.
    struct ScriptedSource {
        answers: Mutex<VecDeque<Result<Vec<ServerStatus>, SourceError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(answers: Vec<Result<Vec<ServerStatus>, SourceError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&self) -> Result<Vec<ServerStatus>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut answers = self.answers.lock();
            if answers.len() > 1 {
                answers.pop_front().unwrap()
            } else {
                answers.front().cloned().unwrap()
            }
        }
    }

    /// Holds every fetch open until released.
    struct GatedSource {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl StatusSource for GatedSource {
        async fn fetch(&self) -> Result<Vec<ServerStatus>, SourceError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(vec![status("late", 9)])
        }
    }

    fn clipboard(available: bool, result: Option<Result<(), ClipboardError>>) -> Box<MockClipboard> {
        let mut clipboard = MockClipboard::new();
        clipboard.expect_name().return_const("mock");
        clipboard.expect_is_available().return_const(available);
        match result {
            Some(result) => {
                clipboard.expect_write_text().times(1).returning(move |_| result.clone());
            }
            None => {
                clipboard.expect_write_text().never();
            }
        }
        Box::new(clipboard)
    }

    fn idle_clipboards() -> ClipboardStrategies {
        ClipboardStrategies {
            primary: clipboard(false, None),
            fallback: clipboard(false, None),
        }
    }

    fn quiet_notifier() -> Arc<MockNotifier> {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().return_const(());
        Arc::new(notifier)
    }

    fn notifier_expecting(kind: NoticeKind) -> Arc<MockNotifier> {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |notice| notice.kind == kind)
            .times(1)
            .return_const(());
        Arc::new(notifier)
    }

    fn presenter_with(source: Arc<dyn StatusSource>, clipboards: ClipboardStrategies, notifier: Arc<dyn Notifier>) -> Arc<Presenter> {
        Presenter::new(source, clipboards, notifier, DashboardConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn mount_fetches_immediately_then_every_interval() {
        let source = ScriptedSource::new(vec![Ok(vec![status("a", 1)]), Ok(vec![status("a", 2)])]);
        let presenter = presenter_with(source.clone(), idle_clipboards(), quiet_notifier());

        assert_eq!(presenter.phase(), Phase::Uninitialized);
        assert_eq!(presenter.view().snapshot, placeholder_snapshot());

        presenter.mount();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(presenter.phase(), Phase::Polling);
        assert_eq!(presenter.view().snapshot, vec![status("a", 1)]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(presenter.view().snapshot, vec![status("a", 2)]);

        presenter.unmount();
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(presenter.phase(), Phase::Unmounted);
    }

    #[tokio::test(start_paused = true)]
    async fn second_mount_is_ignored() {
        let source = ScriptedSource::new(vec![Ok(vec![status("a", 1)])]);
        let presenter = presenter_with(source.clone(), idle_clipboards(), quiet_notifier());

        presenter.mount();
        presenter.mount();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls(), 1);

        presenter.unmount();
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let source = ScriptedSource::new(vec![
            Ok(vec![status("a", 3), status("b", 0)]),
            Err(SourceError::Transport("connection refused".to_string())),
        ]);
        let presenter = presenter_with(source, idle_clipboards(), quiet_notifier());

        assert!(presenter.refresh().await);
        let before = presenter.view().snapshot;

        assert!(!presenter.refresh().await);
        assert_eq!(presenter.view().snapshot, before);
    }

    #[tokio::test]
    async fn refresh_replaces_whole_snapshot() {
        let source = ScriptedSource::new(vec![
            Ok(vec![status("a", 3), status("b", 0)]),
            Ok(vec![status("c", 7)]),
        ]);
        let presenter = presenter_with(source, idle_clipboards(), quiet_notifier());

        presenter.refresh().await;
        presenter.refresh().await;
        assert_eq!(presenter.view().snapshot, vec![status("c", 7)]);
    }

    #[tokio::test]
    async fn refresh_after_unmount_does_not_fetch() {
        let mut source = MockStatusSource::new();
        source.expect_fetch().never();
        let presenter = presenter_with(Arc::new(source), idle_clipboards(), quiet_notifier());

        presenter.unmount();
        assert!(!presenter.refresh().await);
    }

    #[tokio::test]
    async fn fetch_resolving_after_unmount_is_discarded() {
        let source = Arc::new(GatedSource { started: Notify::new(), release: Notify::new() });
        let presenter = presenter_with(source.clone(), idle_clipboards(), quiet_notifier());

        let pending = {
            let presenter = presenter.clone();
            tokio::spawn(async move { presenter.refresh().await })
        };
        source.started.notified().await;

        presenter.unmount();
        let revision = *presenter.subscribe().borrow();
        source.release.notify_one();

        assert!(!pending.await.unwrap());
        assert_eq!(presenter.view().snapshot, placeholder_snapshot());
        assert_eq!(*presenter.subscribe().borrow(), revision);
    }

    #[tokio::test(start_paused = true)]
    async fn copy_sets_flag_and_clears_it_after_two_seconds() {
        let clipboards = ClipboardStrategies {
            primary: clipboard(true, Some(Ok(()))),
            fallback: clipboard(true, None),
        };
        let presenter = presenter_with(
            ScriptedSource::new(vec![Ok(Vec::new())]),
            clipboards,
            notifier_expecting(NoticeKind::Info)
        );

        assert!(presenter.copy_address("a.example.net:25565", "a").await);
        assert_eq!(presenter.view().copied.as_deref(), Some("a"));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(presenter.view().copied.as_deref(), Some("a"));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(presenter.view().copied, None);
    }

    #[tokio::test]
    async fn copy_falls_back_when_primary_fails() {
        let clipboards = ClipboardStrategies {
            primary: clipboard(true, Some(Err(ClipboardError::Failed("xclip exited with 1".to_string())))),
            fallback: clipboard(true, Some(Ok(()))),
        };
        let presenter = presenter_with(
            ScriptedSource::new(vec![Ok(Vec::new())]),
            clipboards,
            notifier_expecting(NoticeKind::Info)
        );

        assert!(presenter.copy_address("a.example.net:25565", "a").await);
        assert_eq!(presenter.view().copied.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn copy_falls_back_when_primary_is_missing() {
        let clipboards = ClipboardStrategies {
            primary: clipboard(false, None),
            fallback: clipboard(true, Some(Ok(()))),
        };
        let presenter = presenter_with(
            ScriptedSource::new(vec![Ok(Vec::new())]),
            clipboards,
            notifier_expecting(NoticeKind::Info)
        );

        assert!(presenter.copy_address("a.example.net:25565", "a").await);
    }

    #[tokio::test]
    async fn copy_leaves_flag_unset_when_both_paths_fail() {
        let clipboards = ClipboardStrategies {
            primary: clipboard(true, Some(Err(ClipboardError::Failed("denied".to_string())))),
            fallback: clipboard(true, Some(Err(ClipboardError::Failed("not a tty".to_string())))),
        };
        let presenter = presenter_with(
            ScriptedSource::new(vec![Ok(Vec::new())]),
            clipboards,
            notifier_expecting(NoticeKind::Error)
        );

        assert!(!presenter.copy_address("a.example.net:25565", "a").await);
        assert_eq!(presenter.view().copied, None);
    }

    #[tokio::test]
    async fn copy_fails_without_any_clipboard() {
        let presenter = presenter_with(
            ScriptedSource::new(vec![Ok(Vec::new())]),
            idle_clipboards(),
            notifier_expecting(NoticeKind::Error)
        );

        assert!(!presenter.copy_address("a.example.net:25565", "a").await);
        assert_eq!(presenter.view().copied, None);
    }

    #[tokio::test]
    async fn fixed_copy_address_overrides_displayed_one() {
        let mut primary = MockClipboard::new();
        primary.expect_name().return_const("mock");
        primary.expect_is_available().return_const(true);
        primary
            .expect_write_text()
            .withf(|text| text == "mc2.pipatzo.com")
            .times(1)
            .returning(|_| Ok(()));

        let config = DashboardConfig {
            copy_address: Some("mc2.pipatzo.com".to_string()),
            ..DashboardConfig::default()
        };
        let presenter = Presenter::new(
            ScriptedSource::new(vec![Ok(Vec::new())]),
            ClipboardStrategies { primary: Box::new(primary), fallback: clipboard(true, None) },
            quiet_notifier(),
            config
        );

        assert!(presenter.copy_address("198.51.100.4:25565", "a").await);
    }
}
