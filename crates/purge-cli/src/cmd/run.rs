use crate::context::Context;
use crate::output::{print_json, print_report, print_table};
use crate::roster;
use anyhow::Context as _;
use clap::Args;
use discord_rest::DiscordPlatform;
use purge_core::io::atomic_write;
use purge_core::{
    list_roleless, ActionKind, CommunityId, Config, ConnectionManager, Credential, Executor,
    IdentifierSet, Roster, RunReport, RunRequest, Session,
};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Args)]
pub struct RunArgs {
    /// kick or ban (default: default_action from the config file)
    #[arg(long, short = 'a')]
    action: Option<ActionKind>,

    /// Spreadsheet (.xlsx/.xls/.ods) or CSV with a username/discord column,
    /// or a .txt with one name per line
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,

    /// Also target every member holding no roles
    #[arg(long)]
    roleless: bool,

    /// Write a Timestamp,Username,Status CSV of the run
    #[arg(long, value_name = "CSV")]
    export: Option<PathBuf>,

    /// Resolve targets and list them without removing anyone
    #[arg(long)]
    dry_run: bool,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &Context, args: RunArgs) -> anyhow::Result<()> {
    if args.file.is_none() && !args.roleless {
        anyhow::bail!("nothing to do: pass --file, --roleless, or both");
    }

    let config = ctx.valid_config()?;
    let credential = ctx.credential()?;
    let community = ctx.community(&config)?;
    let action = args.action.unwrap_or(config.default_action);
    let platform = ctx.platform(&config)?;

    let mut identifiers = IdentifierSet::new();
    if let Some(path) = &args.file {
        let from_file = roster::load(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        info!(path = %path.display(), count = from_file.len(), "identifiers loaded");
        identifiers.merge(from_file);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(
        ctx,
        args,
        Target {
            platform,
            config,
            credential,
            community,
            action,
        },
        identifiers,
    ))
}

/// Where and how a run acts.
struct Target {
    platform: DiscordPlatform,
    config: Config,
    credential: Credential,
    community: CommunityId,
    action: ActionKind,
}

async fn run_async(
    ctx: &Context,
    args: RunArgs,
    target: Target,
    mut identifiers: IdentifierSet,
) -> anyhow::Result<()> {
    if args.roleless {
        let roleless = fetch_roleless(&target).await?;
        info!(count = roleless.len(), "roleless members added");
        identifiers.merge(roleless);
    }

    if identifiers.is_empty() {
        println!("No members to process.");
        return Ok(());
    }

    if args.dry_run {
        return dry_run(ctx, &target, &identifiers).await;
    }

    let Target {
        platform,
        config,
        credential,
        community,
        action,
    } = target;
    let request = RunRequest {
        credential,
        community,
        action,
        identifiers,
    };
    let report = execute(ctx, platform, &config, request).await?;

    if let Some(path) = &args.export {
        let csv = report.to_csv()?;
        atomic_write(path, csv.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        if !ctx.json {
            println!("Report written to {}", path.display());
        }
    }

    if ctx.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    match &report.diagnostic {
        Some(diag) => anyhow::bail!("{diag}"),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

async fn execute(
    ctx: &Context,
    platform: DiscordPlatform,
    config: &Config,
    request: RunRequest,
) -> anyhow::Result<RunReport> {
    let handle = Executor::new(platform, config.executor()).spawn(request);

    let token = handle.cancellation_token();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; stopping after the current member");
            token.cancel();
        }
    });
    let observer = (!ctx.json).then(|| tokio::spawn(show_progress(handle.progress())));

    let report = handle.join().await;
    signal.abort();
    if let Some(observer) = observer {
        let _ = observer.await;
    }
    Ok(report?)
}

/// Print each outcome to stderr as the run publishes it. Ends when the run's
/// sender is dropped.
async fn show_progress(mut rx: watch::Receiver<RunReport>) {
    let mut shown = 0;
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        for entry in snapshot.entries.iter().skip(shown) {
            shown += 1;
            eprintln!("[{shown}/{}] {}", snapshot.total, entry.display());
        }
    }
}

// ---------------------------------------------------------------------------
// roleless / dry run
// ---------------------------------------------------------------------------

async fn fetch_roleless(target: &Target) -> anyhow::Result<IdentifierSet> {
    let mut conn =
        ConnectionManager::new(&target.platform, target.config.executor().connect_timeout);
    if !conn.connect(&target.credential, target.community).await {
        let reason = conn.last_error().unwrap_or("no usable session").to_string();
        conn.disconnect().await;
        anyhow::bail!("could not connect: {reason}");
    }
    let members = list_roleless(&conn).await;
    conn.disconnect().await;
    Ok(members)
}

async fn dry_run(ctx: &Context, target: &Target, identifiers: &IdentifierSet) -> anyhow::Result<()> {
    let mut conn =
        ConnectionManager::new(&target.platform, target.config.executor().connect_timeout);
    conn.connect(&target.credential, target.community).await;
    let loaded = match conn.session() {
        Some(session) => Some(
            Roster::load(session)
                .await
                .map(|roster| (roster, session.self_id())),
        ),
        None => None,
    };
    let reason = conn.last_error().unwrap_or("no usable session").to_string();
    conn.disconnect().await;
    let (roster, bot) = loaded
        .with_context(|| format!("could not connect: {reason}"))?
        .context("could not load member roster")?;

    let action = target.action;
    let rows: Vec<Vec<String>> = roster
        .preview(identifiers)
        .into_iter()
        .map(|(id, member)| {
            let (handle, verdict) = match member {
                Some(m) if m.id == bot => (m.handle(), "skip (bot itself)".to_string()),
                Some(m) => (m.handle(), format!("would {action}")),
                None => (String::new(), "not found".to_string()),
            };
            vec![id.to_string(), handle, verdict]
        })
        .collect();

    if ctx.json {
        let targets: Vec<_> = rows
            .iter()
            .map(|r| serde_json::json!({ "identifier": r[0], "member": r[1], "verdict": r[2] }))
            .collect();
        return print_json(&serde_json::json!({ "action": action, "targets": targets }));
    }

    print_table(&["IDENTIFIER", "MEMBER", "VERDICT"], rows);
    Ok(())
}
