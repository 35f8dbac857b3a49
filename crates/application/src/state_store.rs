//! State store facade.
//!
//! Typed access to everything remembered between sessions: known
//! repositories and their view preferences, the global view state, ignored
//! repositories, the last active repository, the last known git executable,
//! the avatar cache and code review progress.
//!
//! Every operation reads a fresh snapshot from its scope, mutates it and
//! writes the whole value back. There is no locking between operations, so
//! two interleaved read-modify-write cycles on the same key resolve as last
//! writer wins.

use std::collections::BTreeMap;
use std::error::Error as _;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use repograph_domain::{
    Avatar, AvatarCache, CodeReview, CodeReviews, GitRepoSet, GlobalViewState, RepoCodeReviews,
    RepoState,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{StateError, StateResult};
use crate::ports::{Clock, FileSystem, FileSystemError, KeyValueStore, StoreError};

const AVATAR_STORAGE_FOLDER: &str = "/avatars";

const AVATAR_CACHE: &str = "avatarCache";
const CODE_REVIEWS: &str = "codeReviews";
const GLOBAL_VIEW_STATE: &str = "globalViewState";
const IGNORED_REPOS: &str = "ignoredRepos";
const LAST_ACTIVE_REPO: &str = "lastActiveRepo";
const LAST_KNOWN_GIT_PATH: &str = "lastKnownGitPath";
const REPO_STATES: &str = "repoStates";

#[derive(Debug, Clone, Copy)]
enum Scope {
    Global,
    Workspace,
}

impl Scope {
    const fn name(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Workspace => "workspace",
        }
    }

    fn save_error(self, error: StoreError) -> StateError {
        match self {
            Self::Global => StateError::GlobalSave(error),
            Self::Workspace => StateError::WorkspaceSave(error),
        }
    }
}

/// A freshly started code review together with the outcome of saving it.
#[derive(Debug)]
pub struct StartedCodeReview {
    /// The review as it was stored.
    pub code_review: CodeReview,
    /// Whether the review reached the workspace scope.
    pub saved: StateResult<()>,
}

/// Facade over the global and workspace scopes and the avatar directory.
pub struct StateStore<F, C> {
    global: Arc<dyn KeyValueStore>,
    workspace: Arc<dyn KeyValueStore>,
    fs: F,
    clock: C,
    global_storage_path: String,
    avatar_storage_path: String,
    avatar_storage_available: AtomicBool,
    git_path_listener: Mutex<Option<JoinHandle<()>>>,
}

impl<F: FileSystem, C: Clock> StateStore<F, C> {
    /// Creates a new state store.
    ///
    /// `global_storage_path` must already be normalized; the avatar directory
    /// is derived from it by appending `/avatars` (a trailing slash is dropped
    /// first, so `/` yields `/avatars`). Avatar storage is reported
    /// unavailable until [`Self::prepare_avatar_storage`] has confirmed the
    /// directory.
    #[must_use]
    pub fn new(
        global_storage_path: &str,
        global: Arc<dyn KeyValueStore>,
        workspace: Arc<dyn KeyValueStore>,
        fs: F,
        clock: C,
    ) -> Self {
        Self {
            global,
            workspace,
            fs,
            clock,
            global_storage_path: global_storage_path.to_string(),
            avatar_storage_path: format!(
                "{}{AVATAR_STORAGE_FOLDER}",
                global_storage_path.trim_end_matches('/')
            ),
            avatar_storage_available: AtomicBool::new(false),
            git_path_listener: Mutex::new(None),
        }
    }

    /// Makes sure the avatar directory exists.
    ///
    /// Creates the global storage directory and then the avatar directory if
    /// needed. Failures are ignored; avatar storage simply stays unavailable.
    pub async fn prepare_avatar_storage(&self) {
        let avatar_dir = Path::new(&self.avatar_storage_path);
        if self.fs.exists(avatar_dir).await {
            self.avatar_storage_available.store(true, Ordering::Release);
            return;
        }

        if let Err(error) = self.fs.create_dir(Path::new(&self.global_storage_path)).await {
            tracing::debug!(
                path = %self.global_storage_path,
                %error,
                "Global storage directory not created"
            );
        }

        match self.fs.create_dir(avatar_dir).await {
            Ok(()) | Err(FileSystemError::AlreadyExists(_)) => {
                self.avatar_storage_available.store(true, Ordering::Release);
            }
            Err(error) => {
                tracing::debug!(
                    path = %self.avatar_storage_path,
                    %error,
                    "Avatar storage unavailable"
                );
            }
        }
    }

    /// Records every git executable path published on `changes`.
    ///
    /// Only values published after the call are recorded. Replaces any
    /// previous subscription.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn listen_for_git_path_changes(&self, mut changes: watch::Receiver<String>) {
        let global = Arc::clone(&self.global);
        let handle = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let path = changes.borrow_and_update().clone();
                let result =
                    write_scope(global.as_ref(), Scope::Global, LAST_KNOWN_GIT_PATH, &path).await;
                log_unsaved(LAST_KNOWN_GIT_PATH, result);
            }
        });

        if let Some(previous) = self.git_path_listener.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stops listening for git path changes.
    pub fn dispose(&self) {
        if let Some(listener) = self.git_path_listener.lock().take() {
            listener.abort();
        }
    }

    /// Returns every known repository with its view preferences.
    ///
    /// Fields missing from a persisted record are filled with their defaults.
    #[must_use]
    pub fn get_repos(&self) -> GitRepoSet {
        match self.workspace.get(REPO_STATES) {
            Some(Value::Object(entries)) => entries
                .into_iter()
                .map(|(repo, record)| {
                    let state = RepoState::from_persisted(record).unwrap_or_else(|| {
                        tracing::warn!(repo = %repo, "Discarding undecodable repository state");
                        RepoState::default()
                    });
                    (repo, state)
                })
                .collect(),
            Some(Value::Null) | None => GitRepoSet::new(),
            Some(_) => {
                tracing::warn!(key = REPO_STATES, "Discarding undecodable persisted value");
                GitRepoSet::new()
            }
        }
    }

    /// Replaces the set of known repositories.
    ///
    /// # Errors
    /// Returns `StateError::WorkspaceSave` if the workspace scope rejected the write.
    pub async fn save_repos(&self, repos: &GitRepoSet) -> StateResult<()> {
        self.write(Scope::Workspace, REPO_STATES, repos).await
    }

    /// Moves workspace state that refers to `old_repo` over to `new_repo`.
    ///
    /// Repoints the last active repository and moves any code reviews. The
    /// repository's own view preferences are left to the caller.
    pub async fn transfer_repo(&self, old_repo: &str, new_repo: &str) {
        if self.get_last_active_repo().as_deref() == Some(old_repo) {
            self.set_last_active_repo(Some(new_repo)).await;
        }

        let mut reviews = self.get_code_reviews();
        if reviews.transfer(old_repo, new_repo) {
            log_unsaved(CODE_REVIEWS, self.save_code_reviews(&reviews).await);
        }
    }

    /// Returns the global view state, with defaults for missing fields.
    #[must_use]
    pub fn get_global_view_state(&self) -> GlobalViewState {
        match self.global.get(GLOBAL_VIEW_STATE) {
            Some(record) => GlobalViewState::from_persisted(record).unwrap_or_else(|| {
                tracing::warn!(key = GLOBAL_VIEW_STATE, "Discarding undecodable persisted value");
                GlobalViewState::default()
            }),
            None => GlobalViewState::default(),
        }
    }

    /// Replaces the global view state.
    ///
    /// # Errors
    /// Returns `StateError::GlobalSave` if the global scope rejected the write.
    pub async fn set_global_view_state(&self, state: &GlobalViewState) -> StateResult<()> {
        self.write(Scope::Global, GLOBAL_VIEW_STATE, state).await
    }

    /// Returns the repositories the user chose to ignore.
    #[must_use]
    pub fn get_ignored_repos(&self) -> Vec<String> {
        read(self.workspace.as_ref(), IGNORED_REPOS)
    }

    /// Replaces the ignored repositories.
    ///
    /// # Errors
    /// Returns `StateError::WorkspaceSave` if the workspace scope rejected the write.
    pub async fn set_ignored_repos(&self, repos: &[String]) -> StateResult<()> {
        self.write(Scope::Workspace, IGNORED_REPOS, repos).await
    }

    /// Returns the repository that was shown last.
    #[must_use]
    pub fn get_last_active_repo(&self) -> Option<String> {
        read(self.workspace.as_ref(), LAST_ACTIVE_REPO)
    }

    /// Remembers the repository that is shown. A failed save is only logged.
    pub async fn set_last_active_repo(&self, repo: Option<&str>) {
        log_unsaved(LAST_ACTIVE_REPO, self.write(Scope::Workspace, LAST_ACTIVE_REPO, &repo).await);
    }

    /// Returns the most recently reported git executable path.
    #[must_use]
    pub fn get_last_known_git_path(&self) -> Option<String> {
        read(self.global.as_ref(), LAST_KNOWN_GIT_PATH)
    }

    /// Remembers the git executable path. A failed save is only logged.
    pub async fn set_last_known_git_path(&self, path: &str) {
        log_unsaved(LAST_KNOWN_GIT_PATH, self.write(Scope::Global, LAST_KNOWN_GIT_PATH, &path).await);
    }

    /// Returns true once the avatar directory is known to exist.
    #[must_use]
    pub fn is_avatar_storage_available(&self) -> bool {
        self.avatar_storage_available.load(Ordering::Acquire)
    }

    /// Returns the directory avatar images are stored in.
    #[must_use]
    pub fn get_avatar_storage_path(&self) -> &str {
        &self.avatar_storage_path
    }

    /// Returns every cached avatar keyed by email address.
    ///
    /// Undecodable entries are skipped.
    #[must_use]
    pub fn get_avatar_cache(&self) -> AvatarCache {
        read_entries(self.global.as_ref(), AVATAR_CACHE)
    }

    /// Caches the avatar of `email`. A failed save is only logged.
    pub async fn save_avatar(&self, email: &str, avatar: Avatar) {
        let mut avatars = self.get_avatar_cache();
        avatars.insert(email.to_string(), avatar);
        log_unsaved(AVATAR_CACHE, self.write(Scope::Global, AVATAR_CACHE, &avatars).await);
    }

    /// Forgets the avatar of `email`. A failed save is only logged.
    pub async fn remove_avatar_from_cache(&self, email: &str) {
        let mut avatars = self.get_avatar_cache();
        avatars.remove(email);
        log_unsaved(AVATAR_CACHE, self.write(Scope::Global, AVATAR_CACHE, &avatars).await);
    }

    /// Empties the avatar cache and deletes every file in the avatar directory.
    ///
    /// Files are only deleted once the empty cache has been saved. Each
    /// deletion is attempted independently and failures are ignored.
    ///
    /// # Errors
    /// Returns `StateError::GlobalSave` if the global scope rejected the write.
    pub async fn clear_avatar_cache(&self) -> StateResult<()> {
        self.write(Scope::Global, AVATAR_CACHE, &AvatarCache::new()).await?;

        let files = match self.fs.read_dir(Path::new(&self.avatar_storage_path)).await {
            Ok(files) => files,
            Err(error) => {
                tracing::debug!(path = %self.avatar_storage_path, %error, "Avatar directory not readable");
                return Ok(());
            }
        };

        for file in files {
            if let Err(error) = self.fs.remove_file(&file).await {
                tracing::debug!(path = %file.display(), %error, "Avatar file not removed");
            }
        }
        Ok(())
    }

    /// Returns every tracked code review.
    ///
    /// Undecodable reviews are skipped, as are repositories left without any.
    #[must_use]
    pub fn get_code_reviews(&self) -> CodeReviews {
        let repos: BTreeMap<String, Value> = read_entries(self.workspace.as_ref(), CODE_REVIEWS);
        repos
            .into_iter()
            .filter_map(|(repo, reviews)| {
                let reviews: RepoCodeReviews = match reviews {
                    Value::Object(entries) => decode_entries(CODE_REVIEWS, entries),
                    _ => {
                        tracing::warn!(key = CODE_REVIEWS, repo = %repo, "Skipping undecodable persisted entry");
                        RepoCodeReviews::new()
                    }
                };
                (!reviews.is_empty()).then_some((repo, reviews))
            })
            .collect::<BTreeMap<_, _>>()
            .into()
    }

    /// Starts (or restarts) the review `id` of `repo`.
    pub async fn start_code_review(
        &self,
        repo: &str,
        id: &str,
        files: Vec<String>,
        last_viewed_file: Option<String>,
    ) -> StartedCodeReview {
        let mut reviews = self.get_code_reviews();
        let code_review = reviews.start(repo, id, files, last_viewed_file, self.clock.now());
        let saved = self.save_code_reviews(&reviews).await;
        StartedCodeReview { code_review, saved }
    }

    /// Returns the review `id` of `repo`, marking it as active.
    ///
    /// The refreshed activity time is saved before returning.
    pub async fn get_code_review(&self, repo: &str, id: &str) -> Option<CodeReview> {
        let mut reviews = self.get_code_reviews();
        let code_review = reviews.touch(repo, id, self.clock.now())?;
        log_unsaved(CODE_REVIEWS, self.save_code_reviews(&reviews).await);
        Some(code_review)
    }

    /// Records that `file` of review `id` has been viewed.
    ///
    /// The review ends once no file remains. Unknown reviews are ignored.
    pub async fn update_code_review_file_reviewed(&self, repo: &str, id: &str, file: &str) {
        let mut reviews = self.get_code_reviews();
        if reviews.mark_file_reviewed(repo, id, file, self.clock.now()) {
            log_unsaved(CODE_REVIEWS, self.save_code_reviews(&reviews).await);
        }
    }

    /// Ends the review `id` of `repo`. Ending an unknown review is not an error.
    ///
    /// # Errors
    /// Returns `StateError::WorkspaceSave` if the workspace scope rejected the write.
    pub async fn end_code_review(&self, repo: &str, id: &str) -> StateResult<()> {
        let mut reviews = self.get_code_reviews();
        reviews.end(repo, id);
        self.save_code_reviews(&reviews).await
    }

    /// Drops every review that has been inactive for more than 90 days.
    ///
    /// Saves only if something expired.
    pub async fn expire_old_code_reviews(&self) {
        let mut reviews = self.get_code_reviews();
        let expired = reviews.expire(self.clock.now());
        if expired > 0 {
            tracing::info!(expired, "Expired inactive code reviews");
            log_unsaved(CODE_REVIEWS, self.save_code_reviews(&reviews).await);
        }
    }

    /// Ends every review of the workspace.
    ///
    /// # Errors
    /// Returns `StateError::WorkspaceSave` if the workspace scope rejected the write.
    pub async fn end_all_workspace_code_reviews(&self) -> StateResult<()> {
        self.save_code_reviews(&CodeReviews::new()).await
    }

    async fn save_code_reviews(&self, reviews: &CodeReviews) -> StateResult<()> {
        self.write(Scope::Workspace, CODE_REVIEWS, reviews).await
    }

    async fn write<T: Serialize + ?Sized>(
        &self,
        scope: Scope,
        key: &str,
        value: &T,
    ) -> StateResult<()> {
        let store = match scope {
            Scope::Global => self.global.as_ref(),
            Scope::Workspace => self.workspace.as_ref(),
        };
        write_scope(store, scope, key, value).await
    }
}

impl<F: FileSystem + 'static, C: Clock + 'static> StateStore<F, C> {
    /// Runs [`Self::prepare_avatar_storage`] in the background.
    ///
    /// Callers poll [`Self::is_avatar_storage_available`] to learn the outcome.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn_avatar_storage_preparation(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.prepare_avatar_storage().await })
    }
}

impl<F, C> Drop for StateStore<F, C> {
    fn drop(&mut self) {
        if let Some(listener) = self.git_path_listener.get_mut().take() {
            listener.abort();
        }
    }
}

/// Reads `key`, substituting the default when absent or undecodable.
fn read<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    let Some(value) = store.get(key) else {
        return T::default();
    };
    serde_json::from_value(value).unwrap_or_else(|error| {
        tracing::warn!(key, %error, "Discarding undecodable persisted value");
        T::default()
    })
}

/// Reads the map stored under `key` one entry at a time.
///
/// Entries that fail to decode are dropped; the rest are kept.
fn read_entries<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> BTreeMap<String, T> {
    match store.get(key) {
        Some(Value::Object(entries)) => decode_entries(key, entries),
        Some(Value::Null) | None => BTreeMap::new(),
        Some(_) => {
            tracing::warn!(key, "Discarding undecodable persisted value");
            BTreeMap::new()
        }
    }
}

fn decode_entries<T: DeserializeOwned>(key: &str, entries: Map<String, Value>) -> BTreeMap<String, T> {
    entries
        .into_iter()
        .filter_map(|(name, value)| match serde_json::from_value(value) {
            Ok(decoded) => Some((name, decoded)),
            Err(error) => {
                tracing::warn!(key, entry = %name, %error, "Skipping undecodable persisted entry");
                None
            }
        })
        .collect()
}

async fn write_scope<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    scope: Scope,
    key: &str,
    value: &T,
) -> StateResult<()> {
    let value = serde_json::to_value(value)
        .map_err(|error| scope.save_error(StoreError::Serialization(error.to_string())))?;
    store.update(key, value).await.map_err(|error| {
        tracing::debug!(scope = scope.name(), key, %error, "Scope rejected write");
        scope.save_error(error)
    })
}

fn log_unsaved(key: &str, result: StateResult<()>) {
    if let Err(error) = result {
        let cause = error.source().map(ToString::to_string);
        tracing::warn!(key, %error, cause = ?cause, "State change not persisted");
    }
}
