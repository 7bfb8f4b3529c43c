//! Common utilities for integration tests.
//!
//! Provides a fake Telegram Bot API served by axum, fake host programs placed on
//! `PATH`, and helpers to spawn the bot binary against them.

use std::{
    env, fs,
    os::unix::fs::PermissionsExt as _,
    path::{Path, PathBuf},
    process::{self, Child, Command, Stdio},
    sync::{
        Arc, Mutex,
        atomic::{AtomicI64, Ordering},
    },
    time::{Duration, Instant},
};

use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Value, json};

pub const TOKEN: &str = "TEST_TOKEN";
pub const CHAT_ID: i64 = 42;

/// Guard that kills and waits on a child process when dropped.
pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        drop(self.0.kill());
        drop(self.0.wait());
    }
}

/// In-memory stand-in for `api.telegram.org`.
#[derive(Default)]
pub struct FakeBotApi {
    pending: Mutex<Vec<Value>>,
    sent: Mutex<Vec<Value>>,
    next_update_id: AtomicI64,
}

impl FakeBotApi {
    /// Queues a private text message from `username`.
    pub fn push_text(&self, username: Option<&str>, text: &str) {
        let update_id = self.next_update_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut from = json!({"id": 7, "is_bot": false, "first_name": "Test"});
        if let Some(username) = username {
            from["username"] = json!(username);
        }
        self.pending.lock().unwrap().push(json!({
            "update_id": update_id,
            "message": {
                "message_id": update_id,
                "from": from,
                "chat": {"id": CHAT_ID, "type": "private"},
                "date": 1_700_000_000,
                "text": text,
            }
        }));
    }

    /// Bodies of all `sendMessage` calls so far.
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|body| body["text"].as_str().unwrap_or_default().to_owned())
            .collect()
    }
}

async fn get_me() -> Json<Value> {
    Json(json!({
        "ok": true,
        "result": {"id": 1, "is_bot": true, "first_name": "RPi", "username": "rpi_bot"}
    }))
}

async fn get_updates(State(api): State<Arc<FakeBotApi>>, Json(body): Json<Value>) -> Json<Value> {
    let offset = body["offset"].as_i64().unwrap_or(0);
    for _ in 0..10 {
        let updates: Vec<Value> = api
            .pending
            .lock()
            .unwrap()
            .iter()
            .filter(|update| update["update_id"].as_i64().unwrap_or(0) >= offset)
            .cloned()
            .collect();
        if !updates.is_empty() {
            return Json(json!({"ok": true, "result": updates}));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Json(json!({"ok": true, "result": []}))
}

async fn send_message(State(api): State<Arc<FakeBotApi>>, Json(body): Json<Value>) -> Json<Value> {
    let mut sent = api.sent.lock().unwrap();
    sent.push(body);
    Json(json!({
        "ok": true,
        "result": {"message_id": 1000 + sent.len(), "chat": {"id": CHAT_ID, "type": "private"}, "date": 0}
    }))
}

/// Serves a [`FakeBotApi`] on a random local port and returns it with its base URL.
pub async fn spawn_fake_bot_api() -> (Arc<FakeBotApi>, String) {
    let api = Arc::new(FakeBotApi::default());
    let app = Router::new()
        .route(&format!("/bot{TOKEN}/getMe"), post(get_me))
        .route(&format!("/bot{TOKEN}/getUpdates"), post(get_updates))
        .route(&format!("/bot{TOKEN}/sendMessage"), post(send_message))
        .with_state(Arc::clone(&api));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind fake Bot API");
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (api, url)
}

/// Per-test scratch directory with fake `docker`, `shutdown` and `reboot` programs.
pub struct Sandbox {
    pub root: PathBuf,
}

impl Sandbox {
    pub fn new(name: &str) -> Self {
        let root = env::temp_dir().join(format!("tele_rpi_bot_it_{name}_{}", process::id()));
        drop(fs::remove_dir_all(&root));
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("immich")).unwrap();

        let marker_dir = root.display();
        write_script(
            &root.join("bin/docker"),
            &format!(
                r#"echo "$PWD $*" >> "{marker_dir}/docker.calls"
case "$2" in
  ps) printf 'NAME\tSTATUS\nimmich_server\tUp 5 minutes\n' ;;
  up) echo "Container immich_server Started" >&2 ;;
  down) echo "no such service" >&2; exit 1 ;;
esac"#
            ),
        );
        write_script(
            &root.join("bin/shutdown"),
            &format!(r#"echo "$*" > "{marker_dir}/shutdown.called""#),
        );
        write_script(
            &root.join("bin/reboot"),
            &format!(r#"touch "{marker_dir}/reboot.called""#),
        );
        Self { root }
    }

    pub fn marker(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Spawns `tele_rpi_bot run` against `api_url` with `extra_args` appended.
    pub fn spawn_bot(&self, api_url: &str, extra_args: &[&str]) -> Child {
        let path = format!(
            "{}:{}",
            self.root.join("bin").display(),
            env::var("PATH").unwrap_or_default()
        );
        Command::new(env!("CARGO_BIN_EXE_tele_rpi_bot"))
            .arg("run")
            .args(["--api-url", api_url])
            .args(["--valid-users", "alice"])
            .arg("--immich-dir")
            .arg(self.root.join("immich"))
            .arg("--log-file")
            .arg(self.root.join("bot.log"))
            .args(["--poll-timeout", "1", "--no-sudo"])
            .args(extra_args)
            .env("PATH", path)
            .env_remove("BOT_TELEGRAM_TOKEN")
            .env_remove("BOT_VALID_USERS")
            .env_remove("IMMICH_DIR_PATH")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to start tele_rpi_bot")
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        drop(fs::remove_dir_all(&self.root));
    }
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Waits until at least `count` messages were sent and returns their texts.
pub async fn wait_for_sent(api: &FakeBotApi, count: usize) -> Vec<String> {
    let start = Instant::now();
    loop {
        let sent = api.sent_texts();
        if sent.len() >= count {
            return sent;
        }
        assert!(
            start.elapsed() < Duration::from_secs(20),
            "expected {count} messages, got {sent:?}"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Waits until `path` exists.
pub async fn wait_for_file(path: &Path) {
    let start = Instant::now();
    while !path.exists() {
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "{} was not created",
            path.display()
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Waits for `child` to exit and returns whether it succeeded.
pub async fn wait_for_exit(child: &mut Child) -> bool {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status.success();
        }
        assert!(
            start.elapsed() < Duration::from_secs(15),
            "bot did not exit"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
