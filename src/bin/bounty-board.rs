use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use bounty_board::chain::{connect, BountyBoardContract};
use bounty_board::config::{ChainConfig, LifecycleConfig, PinataConfig};
use bounty_board::domain::{Address, StageEvent, DEFAULT_DEADLINE_TIME};
use bounty_board::flows::{CreateBountyFlow, SubmitProofFlow};
use bounty_board::infra::ContentStore;
use bounty_board::lifecycle::TransactionLifecycleController;
use bounty_board::packaging::ProofPackager;
use bounty_board::preferences::{FilePreferenceStore, PersistTabPreference};
use bounty_board::storage::{MemoryContentStore, PinataStore};
use bounty_board::telemetry::{init_telemetry, TelemetryConfig};
use bounty_board::{AttachedFile, BountyDraft, BountyError, BountyId, ProofSubmission};

const DEFAULT_PREFS_PATH: &str = ".bounty-board/preferences.json";

fn print_help() {
    eprintln!(
        "\
bounty-board

USAGE:
  bounty-board <command> [options]

COMMANDS:
  create-bounty                   Create a bounty, escrowing the reward
  submit-proof                    Upload proof artifacts and submit them on-chain
  package-proof                   Upload proof artifacts and print the metadata identifier
  help                            Show this message

create-bounty OPTIONS:
  --title <text>                  (required)
  --description <text>            (required)
  --requirements <text>           (required)
  --reward <amount>               (required) Reward in ETH, e.g. 0.5
  --date <YYYY-MM-DD>             (required) Deadline date, local time zone
  --time <HH:MM>                  (default: 23:59)

submit-proof / package-proof OPTIONS:
  --bounty-id <n>                 (required)
  --bounty-title <text>           (required) Used for the metadata title
  --comments <text>               (optional)
  --file <path>                   (repeatable)
  --link <url>                    (repeatable)

submit-proof OPTIONS:
  --prefs <path>                  (default: env BOUNTY_BOARD_PREFS or .bounty-board/preferences.json)

package-proof OPTIONS:
  --memory                        Use the in-memory store instead of Pinata
  --submitter <address>           (default: zero address)

ENV:
  BOUNTY_BOARD_RPC_URL / BOUNTY_BOARD_CONTRACT / BOUNTY_BOARD_PRIVATE_KEY / BOUNTY_BOARD_CHAIN_ID
  PINATA_JWT / PINATA_API_URL / PINATA_GATEWAY
  LOG_LEVEL / LOG_JSON
"
    );
}

fn next_value(args: &mut VecDeque<String>, flag: &str) -> anyhow::Result<String> {
    args.pop_front()
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" | "md" => "text/plain",
        "zip" => "application/zip",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

async fn read_attachment(path: &Path) -> anyhow::Result<AttachedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();
    Ok(AttachedFile::new(name, guess_mime(path), bytes))
}

fn stage_line(event: &StageEvent) -> String {
    match (&event.tx_hash, &event.message) {
        (_, Some(message)) => format!("[{}] {}", event.stage, message),
        (Some(hash), None) => format!("[{}] {}", event.stage, hash),
        (None, None) => format!("[{}]", event.stage),
    }
}

/// Feed stage changes to `sink` until the controller is dropped.
///
/// Buffered events are still delivered after the drop, so awaiting the
/// handle once the flow is gone flushes the final stage.
fn forward_stages(
    controller: &TransactionLifecycleController,
    mut sink: impl FnMut(String) + Send + 'static,
) -> JoinHandle<()> {
    let mut rx = controller.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => sink(stage_line(&event)),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Print stage changes as they happen
fn watch_stages(controller: &TransactionLifecycleController) -> JoinHandle<()> {
    forward_stages(controller, |line| eprintln!("{line}"))
}

/// Surface the classified message rather than the error chain
fn report(err: BountyError) -> anyhow::Error {
    anyhow::anyhow!("{} ({})", err.user_message(), err.kind())
}

struct ProofArgs {
    bounty_id: Option<BountyId>,
    bounty_title: Option<String>,
    comments: String,
    files: Vec<PathBuf>,
    links: Vec<String>,
}

impl ProofArgs {
    fn new() -> Self {
        Self {
            bounty_id: None,
            bounty_title: None,
            comments: String::new(),
            files: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Consume `arg` if it is a proof option
    fn accept(&mut self, arg: &str, args: &mut VecDeque<String>) -> anyhow::Result<bool> {
        match arg {
            "--bounty-id" => self.bounty_id = Some(next_value(args, arg)?.parse()?),
            "--bounty-title" => self.bounty_title = Some(next_value(args, arg)?),
            "--comments" => self.comments = next_value(args, arg)?,
            "--file" => self.files.push(PathBuf::from(next_value(args, arg)?)),
            "--link" => self.links.push(next_value(args, arg)?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    async fn into_submission(self) -> anyhow::Result<ProofSubmission> {
        let bounty_id = self
            .bounty_id
            .ok_or_else(|| anyhow::anyhow!("--bounty-id is required"))?;
        let bounty_title = self
            .bounty_title
            .ok_or_else(|| anyhow::anyhow!("--bounty-title is required"))?;

        let mut submission =
            ProofSubmission::new(bounty_id, bounty_title).with_comments(self.comments);
        for path in &self.files {
            submission = submission.with_file(read_attachment(path).await?);
        }
        for link in &self.links {
            submission = submission.with_link(link)?;
        }
        Ok(submission)
    }
}

fn pinata_store() -> anyhow::Result<Arc<dyn ContentStore>> {
    let config =
        PinataConfig::from_env().ok_or_else(|| anyhow::anyhow!("PINATA_JWT is required"))?;
    Ok(Arc::new(PinataStore::new(config)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry(&TelemetryConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    match command.as_str() {
        "create-bounty" => {
            let mut draft = BountyDraft::default();
            let mut date: Option<NaiveDate> = None;
            let mut time = DEFAULT_DEADLINE_TIME.to_string();

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--title" => draft.title = next_value(&mut args, &arg)?,
                    "--description" => draft.description = next_value(&mut args, &arg)?,
                    "--requirements" => draft.requirements = next_value(&mut args, &arg)?,
                    "--reward" => draft.reward = next_value(&mut args, &arg)?,
                    "--date" => {
                        let raw = next_value(&mut args, &arg)?;
                        date = Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?);
                    }
                    "--time" => time = next_value(&mut args, &arg)?,
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }
            draft.date = date;
            draft.time = time;

            let chain = ChainConfig::require_from_env()?;
            let signer = connect(&chain)?;
            let flow = CreateBountyFlow::with_config(
                BountyBoardContract::new(chain.contract_address),
                &LifecycleConfig::from_env(),
            );
            let printer = watch_stages(flow.controller());

            let result = flow.submit(&draft, Some(signer.as_ref())).await;
            drop(flow);
            let _ = printer.await;
            let receipt = result.map_err(report)?;
            println!("ok: bounty created in {}", receipt.tx_hash);
            Ok(())
        }
        "submit-proof" => {
            let mut proof = ProofArgs::new();
            let mut prefs: Option<PathBuf> = None;

            while let Some(arg) = args.pop_front() {
                if proof.accept(&arg, &mut args)? {
                    continue;
                }
                match arg.as_str() {
                    "--prefs" => prefs = Some(PathBuf::from(next_value(&mut args, &arg)?)),
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let submission = proof.into_submission().await?;
            let prefs = prefs
                .or_else(|| std::env::var("BOUNTY_BOARD_PREFS").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_PATH));

            let chain = ChainConfig::require_from_env()?;
            let signer = connect(&chain)?;
            let flow = SubmitProofFlow::with_config(
                BountyBoardContract::new(chain.contract_address),
                ProofPackager::new(pinata_store()?),
                &LifecycleConfig::from_env(),
            )
            .with_post_success(Arc::new(PersistTabPreference::new(Arc::new(
                FilePreferenceStore::new(prefs),
            ))));
            let printer = watch_stages(flow.controller());

            let result = flow.submit(&submission, Some(signer.as_ref())).await;
            drop(flow);
            let _ = printer.await;
            let submitted = result.map_err(report)?;
            println!(
                "ok: proof {} submitted in {}",
                submitted.cid, submitted.receipt.tx_hash
            );
            Ok(())
        }
        "package-proof" => {
            let mut proof = ProofArgs::new();
            let mut memory = false;
            let mut submitter = Address::ZERO;

            while let Some(arg) = args.pop_front() {
                if proof.accept(&arg, &mut args)? {
                    continue;
                }
                match arg.as_str() {
                    "--memory" => memory = true,
                    "--submitter" => submitter = next_value(&mut args, &arg)?.parse()?,
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let submission = proof.into_submission().await?;
            submission.validate()?;

            let store: Arc<dyn ContentStore> = if memory {
                Arc::new(MemoryContentStore::new())
            } else {
                pinata_store()?
            };
            let packaged = ProofPackager::new(store)
                .assemble(&submission, submitter)
                .await?;

            println!("{}", serde_json::to_string_pretty(&packaged.metadata)?);
            println!("ok: {}", packaged.cid);
            Ok(())
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}")
        }
    }
}
