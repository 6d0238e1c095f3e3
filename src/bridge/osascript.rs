//! macOS bridge driving System Events through `osascript`
//!
//! Each call runs one JavaScript-for-Automation snippet with its parameters
//! passed as `argv`, so no user text is ever spliced into script source.

use super::{BridgeError, Interaction, UiBridge};
use crate::{RuleDuration, RuleScope};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

/// Locates the alert window: the first window of the process that has an
/// "Allow" button.
const FIND_ALERT: &str = r#"
function findAlert(procName) {
  const se = Application("System Events");
  const procs = se.processes.whose({ name: procName });
  if (procs.length === 0) return null;
  const wins = procs[0].windows();
  for (const w of wins) {
    try {
      if (w.buttons.whose({ name: "Allow" }).length > 0) return w;
    } catch (e) {}
  }
  return null;
}
"#;

const PRESENT: &str = r#"
function run(argv) {
  return findAlert(argv[0]) === null ? "false" : "true";
}
"#;

const SCRAPE: &str = r#"
function run(argv) {
  const w = findAlert(argv[0]);
  if (w === null) return "[]";
  const out = [];
  const push = (v) => {
    if (v === null || v === undefined) return;
    const s = String(v).trim();
    if (s.length > 0 && s !== "missing value") out.push(s);
  };
  try { push(w.name()); } catch (e) {}
  let els = [];
  try { els = w.entireContents(); } catch (e) {}
  for (const el of els) {
    try { push(el.value()); } catch (e) {}
    try { push(el.name()); } catch (e) {}
    try { push(el.description()); } catch (e) {}
  }
  return JSON.stringify(out);
}
"#;

const EXPAND: &str = r#"
function run(argv) {
  const w = findAlert(argv[0]);
  if (w === null) return "missing";
  try {
    const tri = w.disclosureTriangles();
    if (tri.length > 0) { tri[0].click(); return "ok"; }
  } catch (e) {}
  for (const b of w.buttons()) {
    try {
      const n = String(b.name() || b.description() || "").toLowerCase();
      if (n.includes("option") || n.includes("detail")) { b.click(); return "ok"; }
    } catch (e) {}
  }
  return "missing";
}
"#;

/// argv: process, "menu-only" | "menu-or-radio", candidate titles...
/// Titles match exactly (case-insensitive): scope and duration pop-ups share
/// words such as "process".
const CHOOSE: &str = r#"
function run(argv) {
  const w = findAlert(argv[0]);
  if (w === null) return "missing";
  const allowRadio = argv[1] === "menu-or-radio";
  const wanted = argv.slice(2).map((t) => t.toLowerCase());
  const hit = (name) => {
    const n = String(name || "").trim().toLowerCase();
    return wanted.some((t) => n === t);
  };
  const se = Application("System Events");
  for (const pop of w.popUpButtons()) {
    try {
      pop.click();
      delay(0.2);
      const items = pop.menus[0].menuItems();
      for (const item of items) {
        if (hit(item.name())) { item.click(); return "ok"; }
      }
      se.keyCode(53);
    } catch (e) {}
  }
  if (allowRadio) {
    for (const r of w.radioButtons()) {
      try {
        if (hit(r.name()) || hit(r.description())) { r.click(); return "ok"; }
      } catch (e) {}
    }
  }
  return "missing";
}
"#;

const CLICK: &str = r#"
function run(argv) {
  const w = findAlert(argv[0]);
  if (w === null) return "missing";
  const btns = w.buttons.whose({ name: argv[1] });
  if (btns.length === 0) return "missing";
  btns[0].click();
  return "ok";
}
"#;

/// Bridge backed by the `osascript` binary
pub struct OsascriptBridge {
    process_name: String,
    timeout: Duration,
}

impl OsascriptBridge {
    pub fn new(process_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            process_name: process_name.into(),
            timeout,
        }
    }

    /// Is `osascript` on this machine at all?
    pub fn is_available() -> bool {
        std::path::Path::new("/usr/bin/osascript").exists()
    }

    async fn run_script(&self, body: &str, args: &[&str]) -> Result<String, BridgeError> {
        let script = format!("{}\n{}", FIND_ALERT, body);
        let mut cmd = Command::new("osascript");
        cmd.args(["-l", "JavaScript", "-e", &script])
            .arg(&self.process_name)
            .args(args)
            .kill_on_drop(true);

        trace!("osascript {:?}", args);
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| BridgeError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BridgeError::Script(stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run_step(&self, body: &str, args: &[&str], what: &str) -> Result<(), BridgeError> {
        match self.run_script(body, args).await?.as_str() {
            "ok" => Ok(()),
            "missing" => Err(BridgeError::ControlNotFound(what.to_string())),
            other => Err(BridgeError::Output(other.to_string())),
        }
    }
}

fn scope_titles(scope: RuleScope) -> &'static [&'static str] {
    match scope {
        RuleScope::Process => &["process", "any"],
        RuleScope::Endpoint => &["remote endpoint", "endpoint", "this endpoint"],
    }
}

fn duration_titles(duration: RuleDuration) -> &'static [&'static str] {
    match duration {
        RuleDuration::Always => &["always", "forever"],
        RuleDuration::ProcessLifetime => &["process lifetime", "until process exits", "once"],
    }
}

#[async_trait]
impl UiBridge for OsascriptBridge {
    fn name(&self) -> &'static str {
        "osascript"
    }

    async fn alert_present(&self) -> Result<bool, BridgeError> {
        match self.run_script(PRESENT, &[]).await?.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(BridgeError::Output(other.to_string())),
        }
    }

    async fn scrape(&self) -> Result<Vec<String>, BridgeError> {
        let raw = self.run_script(SCRAPE, &[]).await?;
        let fragments: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| BridgeError::Output(e.to_string()))?;
        debug!("Scraped {} fragments", fragments.len());
        Ok(fragments)
    }

    async fn interact(&self, interaction: Interaction) -> Result<(), BridgeError> {
        let what = interaction.to_string();
        match interaction {
            Interaction::ExpandDetails => self.run_step(EXPAND, &[], &what).await,
            Interaction::ChooseScope(scope) => {
                let mut args = vec!["menu-only"];
                args.extend_from_slice(scope_titles(scope));
                self.run_step(CHOOSE, &args, &what).await
            }
            Interaction::ChooseDuration(duration) => {
                let mut args = vec!["menu-or-radio"];
                args.extend_from_slice(duration_titles(duration));
                self.run_step(CHOOSE, &args, &what).await
            }
            Interaction::ClickButton(verdict) => {
                self.run_step(CLICK, &[verdict.button_title()], &what).await
            }
        }
    }
}
