//! Shared doubles for the integration suites: an in-memory container
//! runtime and a notifier that records every message.

#![allow(dead_code)]

use async_trait::async_trait;
use epoxi::container::{ContainerConfig, ContainerError, ContainerRuntime, StatsSample};
use epoxi::fleet::{Fleet, FleetOptions};
use epoxi::notify::{self, Channel, Messages, Notices, Notifier};
use epoxi::orchestration::{ContainerSettings, RotationPipeline, ServerLifecycle, Timing};
use epoxi::schema::{JavaRuntime, Modpack, Server};
use epoxi::store::{MemoryStore, Store};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub config: ContainerConfig,
    pub running: bool,
}

#[derive(Default)]
struct FakeState {
    volumes: BTreeSet<String>,
    containers: BTreeMap<String, FakeContainer>,
    stats: BTreeMap<String, StatsSample>,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    crash_on_start: HashSet<String>,
    ignore_console_stop: bool,
}

/// Container runtime double.
///
/// Every call is logged as `"<op> <target>"` (console writes as
/// `"stdin <target> <text>"`). A console `stop` shuts the container down
/// unless [`FakeRuntime::ignore_console_stop`] was called.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A runtime already running `container`.
    pub fn with_running(container: &str) -> Arc<Self> {
        let runtime = Self::new();
        runtime.add_running_container(container);
        runtime
    }

    pub fn add_running_container(&self, name: &str) {
        let config = ContainerConfig::builder()
            .image("eclipse-temurin:21-jre-alpine")
            .build()
            .unwrap();
        self.state.lock().unwrap().containers.insert(
            name.to_string(),
            FakeContainer {
                config,
                running: true,
            },
        );
    }

    /// Make every call of `op` fail.
    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    /// `container` exits right after it starts.
    pub fn crash_on_start(&self, container: &str) {
        self.state
            .lock()
            .unwrap()
            .crash_on_start
            .insert(container.to_string());
    }

    pub fn ignore_console_stop(&self) {
        self.state.lock().unwrap().ignore_console_stop = true;
    }

    pub fn set_stats(&self, container: &str, sample: StatsSample) {
        self.state
            .lock()
            .unwrap()
            .stats
            .insert(container.to_string(), sample);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Index of the first call equal to `call`.
    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    pub fn called(&self, call: &str) -> bool {
        self.position(call).is_some()
    }

    pub fn has_volume(&self, name: &str) -> bool {
        self.state.lock().unwrap().volumes.contains(name)
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state.lock().unwrap().containers.get(name).cloned()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .containers
            .keys()
            .cloned()
            .collect()
    }

    /// Names of every container ever created, in creation order.
    pub fn created(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("create_container ").map(str::to_string))
            .collect()
    }

    fn begin(
        &self,
        op: &'static str,
        target: &str,
    ) -> Result<MutexGuard<'_, FakeState>, ContainerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{} {}", op, target));
        if state.failing.contains(op) {
            return Err(ContainerError::Other(format!("injected {} failure", op)));
        }
        Ok(state)
    }
}

/// Container calls accept either the name or the `id-<name>` engine ID
/// handed out by `create_container`.
fn resolve(target: &str) -> &str {
    target.strip_prefix("id-").unwrap_or(target)
}

fn not_found(name: &str) -> ContainerError {
    ContainerError::NotFound(name.to_string())
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn create_volume(&self, name: &str) -> epoxi::container::Result<()> {
        let mut state = self.begin("create_volume", name)?;
        state.volumes.insert(name.to_string());
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> epoxi::container::Result<()> {
        let mut state = self.begin("remove_volume", name)?;
        if state.volumes.remove(name) {
            Ok(())
        } else {
            Err(not_found(name))
        }
    }

    async fn create_container(
        &self,
        name: &str,
        config: &ContainerConfig,
    ) -> epoxi::container::Result<String> {
        let mut state = self.begin("create_container", name)?;
        if state.containers.contains_key(name) {
            return Err(ContainerError::Other(format!("{} already exists", name)));
        }
        state.containers.insert(
            name.to_string(),
            FakeContainer {
                config: config.clone(),
                running: false,
            },
        );
        Ok(format!("id-{}", name))
    }

    async fn start_container(&self, name: &str) -> epoxi::container::Result<()> {
        let name = resolve(name);
        let mut state = self.begin("start", name)?;
        let crashes = state.crash_on_start.contains(name);
        let container = state.containers.get_mut(name).ok_or_else(|| not_found(name))?;
        container.running = !crashes;
        Ok(())
    }

    async fn stop_container(&self, name: &str) -> epoxi::container::Result<()> {
        let name = resolve(name);
        let mut state = self.begin("stop", name)?;
        let container = state.containers.get_mut(name).ok_or_else(|| not_found(name))?;
        container.running = false;
        Ok(())
    }

    async fn remove_container(&self, name: &str) -> epoxi::container::Result<()> {
        let name = resolve(name);
        let mut state = self.begin("remove", name)?;
        state
            .containers
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    async fn send_stdin(&self, name: &str, text: &str) -> epoxi::container::Result<()> {
        let name = resolve(name);
        let mut state = self.begin("stdin", &format!("{} {}", name, text))?;
        let ignore_stop = state.ignore_console_stop;
        let container = state.containers.get_mut(name).ok_or_else(|| not_found(name))?;
        if !container.running {
            return Err(ContainerError::ConsoleError(format!("{} is not running", name)));
        }
        if text == "stop" && !ignore_stop {
            container.running = false;
        }
        Ok(())
    }

    async fn is_running(&self, name: &str) -> epoxi::container::Result<bool> {
        let name = resolve(name);
        let state = self.begin("inspect", name)?;
        state
            .containers
            .get(name)
            .map(|c| c.running)
            .ok_or_else(|| not_found(name))
    }

    async fn read_stats(&self, name: &str) -> epoxi::container::Result<StatsSample> {
        let name = resolve(name);
        let state = self.begin("stats", name)?;
        if !state.containers.contains_key(name) {
            return Err(not_found(name));
        }
        state
            .stats
            .get(name)
            .copied()
            .ok_or_else(|| ContainerError::StatsUnavailable(name.to_string()))
    }
}

/// Notifier double keeping every message.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Channel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(Channel, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn on(&self, channel: Channel) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, message)| message)
            .collect()
    }

    /// Number of messages on `channel` exactly equal to `message`.
    pub fn count(&self, channel: Channel, message: &str) -> usize {
        self.on(channel).iter().filter(|m| *m == message).count()
    }

    pub fn count_containing(&self, channel: Channel, text: &str) -> usize {
        self.on(channel).iter().filter(|m| m.contains(text)).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, channel: Channel, message: &str) -> notify::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((channel, message.to_string()));
        Ok(())
    }
}

/// Short, easy to match message texts.
pub fn messages() -> Messages {
    Messages {
        scheduled: "scheduled {server}".to_string(),
        starting: "starting {server}".to_string(),
        complete: "complete {server}".to_string(),
        failed: "failed {server}".to_string(),
        fatal_admin: "fatal {server}: {reason}".to_string(),
        ingame_rotation: "rotating now".to_string(),
        ingame_schedule: "rotation scheduled".to_string(),
    }
}

pub fn notices(notifier: &Arc<RecordingNotifier>) -> Notices {
    Notices::new(notifier.clone(), messages())
}

pub fn server() -> Server {
    Server {
        id: "01".to_string(),
        name: "Main".to_string(),
        current_season: "01.004.00".to_string(),
        proxy_hostname: String::new(),
        startup_script: "start.sh".to_string(),
        java_runtime: JavaRuntime::Java21,
    }
}

pub fn modpack() -> Modpack {
    Modpack {
        id: "vanilla".to_string(),
        startup_script: "run.sh".to_string(),
        java_runtime: JavaRuntime::Java17,
    }
}

/// Store holding [`server`] and [`modpack`].
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_server(server()).await.unwrap();
    store.insert_modpack(modpack()).await.unwrap();
    store
}

pub fn pipeline(
    runtime: &Arc<FakeRuntime>,
    store: &Arc<MemoryStore>,
    notifier: &Arc<RecordingNotifier>,
) -> RotationPipeline {
    RotationPipeline::new(
        runtime.clone(),
        store.clone(),
        notices(notifier),
        Timing::default(),
        ContainerSettings::default(),
    )
}

pub fn lifecycle(runtime: &Arc<FakeRuntime>, notifier: &Arc<RecordingNotifier>) -> ServerLifecycle {
    ServerLifecycle::new(
        runtime.clone(),
        notices(notifier),
        Timing::default(),
        ContainerSettings::default(),
    )
}

/// Fleet over the doubles, with default timing and the short messages.
pub fn fleet(
    runtime: &Arc<FakeRuntime>,
    store: &Arc<MemoryStore>,
    notifier: &Arc<RecordingNotifier>,
    proxy_hosts_file: Option<PathBuf>,
) -> Fleet {
    Fleet::new(
        runtime.clone(),
        store.clone(),
        notifier.clone(),
        FleetOptions {
            messages: messages(),
            proxy_hosts_file,
            ..FleetOptions::default()
        },
    )
}
