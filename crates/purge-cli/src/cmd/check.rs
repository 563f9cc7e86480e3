use crate::context::Context;
use crate::output::print_json;
use anyhow::Context as _;
use purge_core::{ConnectionManager, Session};
use tracing::warn;

/// Offline token check, then one connect/disconnect round trip.
pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.valid_config()?;
    let credential = ctx.credential()?;
    let hinted = credential
        .bot_id_hint()
        .context("token failed the offline format check")?;
    let community = ctx.community(&config)?;
    let platform = ctx.platform(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let (bot_id, error) = rt.block_on(async {
        let mut conn = ConnectionManager::new(&platform, config.executor().connect_timeout);
        conn.connect(&credential, community).await;
        let bot_id = conn.session().map(|s| s.self_id());
        let error = conn.last_error().map(str::to_string);
        conn.disconnect().await;
        (bot_id, error)
    });

    if let Some(id) = bot_id {
        if id != hinted {
            warn!(token = %hinted, session = %id, "token id does not match the authenticated bot");
        }
    }

    if ctx.json {
        print_json(&serde_json::json!({
            "ready": bot_id.is_some(),
            "bot_id": bot_id,
            "guild_id": community,
            "error": error,
        }))?;
    } else if let Some(id) = bot_id {
        println!("Ready: bot {id} can reach guild {community}");
    }

    match (bot_id, error) {
        (Some(_), _) => Ok(()),
        (None, Some(e)) => anyhow::bail!("not ready: {e}"),
        (None, None) => anyhow::bail!("not ready"),
    }
}
