//! In-crate fakes shared by the unit tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::context::AddonContext;
use crate::error::{Error, Result};
use crate::guide::Clock;
use crate::host::{Host, Notification};
use crate::http::HttpFetch;
use crate::refresh::Delay;

pub const ADDON: &str = "plugin.video.annatel-plus";
pub const BACKEND: &str = "pvr.iptvsimple";

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Enabled(String, bool),
    SettingSet(String, String, String),
    Notified(String),
    DialogOk(String),
    DialogYesNo(String),
    SettingsOpened(String),
}

#[derive(Default)]
struct FakeHostState {
    available: HashSet<String>,
    settings: HashMap<(String, String), String>,
    events: Vec<HostEvent>,
    notifications: Vec<Notification>,
    yes_no_answer: bool,
    /// Settings the "user" enters when the settings screen opens
    edits_on_open: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeHost {
    state: Mutex<FakeHostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        let host = Self::default();
        host.install(BACKEND);
        host
    }

    pub fn with_credentials(username: &str, password: &str) -> Self {
        let host = Self::new();
        host.put(ADDON, "username", username);
        host.put(ADDON, "password", password);
        host
    }

    pub fn install(&self, addon_id: &str) {
        self.state.lock().unwrap().available.insert(addon_id.to_string());
    }

    pub fn uninstall(&self, addon_id: &str) {
        self.state.lock().unwrap().available.remove(addon_id);
    }

    /// Seed a setting without recording an event
    pub fn put(&self, addon_id: &str, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .settings
            .insert((addon_id.to_string(), key.to_string()), value.to_string());
    }

    pub fn get(&self, addon_id: &str, key: &str) -> Option<String> {
        self.setting(addon_id, key)
    }

    pub fn answer_yes_no(&self, answer: bool) {
        self.state.lock().unwrap().yes_no_answer = answer;
    }

    pub fn edit_on_open_settings(&self, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .edits_on_open
            .push((key.to_string(), value.to_string()));
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn notification_texts(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .map(|n| n.text.clone())
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().unwrap().notifications.clone()
    }

    pub fn clear_events(&self) {
        let mut state = self.state.lock().unwrap();
        state.events.clear();
        state.notifications.clear();
    }
}

impl Host for FakeHost {
    fn is_addon_available(&self, addon_id: &str) -> bool {
        self.state.lock().unwrap().available.contains(addon_id)
    }

    fn set_addon_enabled(&self, addon_id: &str, enabled: bool) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(HostEvent::Enabled(addon_id.to_string(), enabled));
        Ok(())
    }

    fn setting(&self, addon_id: &str, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .settings
            .get(&(addon_id.to_string(), key.to_string()))
            .cloned()
    }

    fn set_setting(&self, addon_id: &str, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .settings
            .insert((addon_id.to_string(), key.to_string()), value.to_string());
        state.events.push(HostEvent::SettingSet(
            addon_id.to_string(),
            key.to_string(),
            value.to_string(),
        ));
        Ok(())
    }

    fn open_settings(&self, addon_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.events.push(HostEvent::SettingsOpened(addon_id.to_string()));
        let edits = std::mem::take(&mut state.edits_on_open);
        for (key, value) in edits {
            state.settings.insert((addon_id.to_string(), key), value);
        }
    }

    fn notify(&self, notification: &Notification) {
        let mut state = self.state.lock().unwrap();
        state.events.push(HostEvent::Notified(notification.text.clone()));
        state.notifications.push(notification.clone());
    }

    fn dialog_ok(&self, _heading: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .events
            .push(HostEvent::DialogOk(message.to_string()));
    }

    fn dialog_yes_no(&self, _heading: &str, message: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        state.events.push(HostEvent::DialogYesNo(message.to_string()));
        state.yes_no_answer
    }
}

#[derive(Debug, Clone)]
pub enum Canned {
    Body(Vec<u8>),
    NetworkError(String),
}

/// Replays canned responses in order; the last one repeats
#[derive(Clone, Default)]
pub struct FakeFetcher {
    responses: Arc<Mutex<VecDeque<Canned>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(body: impl Into<Vec<u8>>) -> Self {
        let fetcher = Self::new();
        fetcher.push(Canned::Body(body.into()));
        fetcher
    }

    pub fn failing(message: &str) -> Self {
        let fetcher = Self::new();
        fetcher.push(Canned::NetworkError(message.to_string()));
        fetcher
    }

    pub fn push(&self, canned: Canned) {
        self.responses.lock().unwrap().push_back(canned);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl HttpFetch for FakeFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        let canned = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        match canned {
            Some(Canned::Body(body)) => Ok(body),
            Some(Canned::NetworkError(msg)) => Err(Error::Network(msg)),
            None => Err(Error::Network("no canned response".to_string())),
        }
    }
}

/// Clock pinned to a settable instant
#[derive(Clone)]
pub struct FixedClock(Arc<Mutex<DateTime<Utc>>>);

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Records requested waits and stops the loop after `budget` of them
#[derive(Clone)]
pub struct CountingDelay {
    waits: Arc<Mutex<Vec<Duration>>>,
    budget: usize,
}

impl CountingDelay {
    pub fn new(budget: usize) -> Self {
        Self {
            waits: Arc::new(Mutex::new(Vec::new())),
            budget,
        }
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Delay for CountingDelay {
    fn wait(&self, duration: Duration) -> bool {
        let mut waits = self.waits.lock().unwrap();
        waits.push(duration);
        waits.len() < self.budget
    }
}

pub const TWO_CHANNELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<channels>
  <channel>
    <name>TF1</name>
    <logo>http://x/tf1.png</logo>
    <url>http://stream/tf1</url>
  </channel>
  <channel>
    <name>M6 Ete</name>
    <logo>http://x/m6.png</logo>
    <url>http://stream/m6</url>
  </channel>
</channels>"#;

pub const PREMIUM_REQUIRED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<channels>
  <channel>
    <name>Vous devez etre un utilisateur premium pour utiliser ce service</name>
    <logo></logo>
    <url>http://www.annatel.tv</url>
  </channel>
</channels>"#;

pub struct TestEnv {
    pub _dir: tempfile::TempDir,
    pub host: Arc<FakeHost>,
    pub ctx: AddonContext,
}

impl TestEnv {
    pub fn new(host: FakeHost) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(host);
        let config = AppConfig {
            profile_dir: Some(dir.path().join("profile")),
            epg_url: "http://epg.test/guide.xml.gz".to_string(),
            ..AppConfig::default()
        };
        let shared: Arc<dyn Host> = host.clone();
        let ctx = AddonContext::new(shared, config).unwrap();
        Self { _dir: dir, host, ctx }
    }
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
