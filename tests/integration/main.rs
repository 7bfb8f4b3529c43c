//! Uses the single integration test approach.
//!
//! Each test runs the real binary against a fake Bot API, with fake host
//! programs on `PATH` so nothing touches the machine running the tests.
#![cfg(unix)]
#![expect(
    clippy::indexing_slicing,
    clippy::unwrap_used,
    reason = "Panicking is how tests fail"
)]

mod common;

use std::{fs, process::Command};

use common::{
    KillOnDrop, Sandbox, TOKEN, spawn_fake_bot_api, wait_for_exit, wait_for_file, wait_for_sent,
};

#[tokio::test]
async fn help_and_free_text_are_answered_in_order() {
    let sandbox = Sandbox::new("help");
    let (api, url) = spawn_fake_bot_api().await;
    let _bot = KillOnDrop(sandbox.spawn_bot(&url, &["--token", TOKEN]));

    api.push_text(Some("mallory"), "/help");
    api.push_text(Some("mallory"), "hello there");
    api.push_text(None, "/unknown");

    let sent = wait_for_sent(&api, 3).await;
    assert!(sent[0].starts_with("Commands:\n"), "unexpected help: {}", sent[0]);
    assert!(sent[0].contains("/immich_status"), "help lists commands");
    assert_eq!(sent[1], "hello there");
    assert_eq!(sent[2], "/unknown");
}

#[tokio::test]
async fn start_opens_a_reply_prompt() {
    let sandbox = Sandbox::new("start");
    let (api, url) = spawn_fake_bot_api().await;
    let _bot = KillOnDrop(sandbox.spawn_bot(&url, &["--token", TOKEN]));

    api.push_text(Some("bob"), "/start@rpi_bot");

    let sent = wait_for_sent(&api, 1).await;
    assert!(sent[0].starts_with("Hi bob!\nWelcome to Telegram RPi Bot!\n"), "{}", sent[0]);
    assert_eq!(
        api.sent()[0]["reply_markup"],
        serde_json::json!({"force_reply": true, "selective": true})
    );
}

#[tokio::test]
async fn status_runs_in_the_immich_directory() {
    let sandbox = Sandbox::new("status");
    let (api, url) = spawn_fake_bot_api().await;
    let _bot = KillOnDrop(sandbox.spawn_bot(&url, &["--token", TOKEN]));

    api.push_text(Some("alice"), "/immich_status");

    let sent = wait_for_sent(&api, 1).await;
    assert_eq!(sent[0], "NAME\tSTATUS\nimmich_server\tUp 5 minutes\n");
    let calls = fs::read_to_string(sandbox.marker("docker.calls")).unwrap();
    assert!(
        calls.ends_with("/immich compose ps --format table {{.Name}}\t{{.Status}}\n"),
        "unexpected docker call: {calls}"
    );
}

#[tokio::test]
async fn stack_commands_report_outcome() {
    let sandbox = Sandbox::new("stack");
    let (api, url) = spawn_fake_bot_api().await;
    let _bot = KillOnDrop(sandbox.spawn_bot(&url, &["--token", TOKEN]));

    api.push_text(Some("alice"), "/immich_up");
    api.push_text(Some("alice"), "/immich_down");

    let sent = wait_for_sent(&api, 2).await;
    assert_eq!(sent[0], "Successfully started Immich services.");
    assert_eq!(sent[1], "Error: no such service\n");
}

#[tokio::test]
async fn unauthorized_shutdown_is_refused() {
    let sandbox = Sandbox::new("denied");
    let (api, url) = spawn_fake_bot_api().await;
    let _bot = KillOnDrop(sandbox.spawn_bot(&url, &["--token", TOKEN]));

    api.push_text(Some("mallory"), "/shutdown");
    api.push_text(Some("mallory"), "/immich_down");

    let sent = wait_for_sent(&api, 2).await;
    assert_eq!(sent, [
        "You are not authorized to perform this action.",
        "You are not authorized to perform this action.",
    ]);
    assert!(!sandbox.marker("shutdown.called").exists(), "shutdown must not run");
    assert!(!sandbox.marker("docker.calls").exists(), "docker must not run");
}

#[tokio::test]
async fn shutdown_runs_after_acknowledgement() {
    let sandbox = Sandbox::new("shutdown");
    let (api, url) = spawn_fake_bot_api().await;
    let _bot = KillOnDrop(sandbox.spawn_bot(&url, &["--token", TOKEN]));

    api.push_text(Some("alice"), "/shutdown");

    let sent = wait_for_sent(&api, 1).await;
    assert_eq!(sent[0], "Shutting down Raspberry Pi...");
    let marker = sandbox.marker("shutdown.called");
    wait_for_file(&marker).await;
    assert_eq!(fs::read_to_string(&marker).unwrap(), "-h now\n");
}

#[tokio::test]
async fn sigterm_stops_the_bot_cleanly() {
    let sandbox = Sandbox::new("sigterm");
    let (api, url) = spawn_fake_bot_api().await;
    let mut bot = KillOnDrop(sandbox.spawn_bot(&url, &["--token", TOKEN]));

    api.push_text(None, "ping");
    wait_for_sent(&api, 1).await;

    let status = Command::new("kill")
        .args(["-TERM", &bot.0.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success(), "kill failed");
    assert!(wait_for_exit(&mut bot.0).await, "bot should exit successfully");

    let log = fs::read_to_string(sandbox.marker("bot.log")).unwrap();
    assert!(log.contains("Bot stopped"), "log file misses shutdown: {log}");
}

#[tokio::test]
async fn rejected_token_fails_startup() {
    let sandbox = Sandbox::new("bad_token");
    let (_api, url) = spawn_fake_bot_api().await;
    let mut bot = KillOnDrop(sandbox.spawn_bot(&url, &["--token", "WRONG"]));

    assert!(!wait_for_exit(&mut bot.0).await, "startup should fail");
}

#[tokio::test]
async fn missing_token_fails_startup() {
    let sandbox = Sandbox::new("no_token");
    let (_api, url) = spawn_fake_bot_api().await;
    let mut bot = KillOnDrop(sandbox.spawn_bot(&url, &[]));

    assert!(!wait_for_exit(&mut bot.0).await, "startup should fail");
}
