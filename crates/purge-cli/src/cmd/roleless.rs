use crate::context::Context;
use crate::output::print_json;
use purge_core::{list_roleless, ConnectionManager};

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.valid_config()?;
    let credential = ctx.credential()?;
    let community = ctx.community(&config)?;
    let platform = ctx.platform(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        let mut conn = ConnectionManager::new(&platform, config.executor().connect_timeout);
        let outcome = if conn.connect(&credential, community).await {
            Ok(list_roleless(&conn).await)
        } else {
            Err(conn.last_error().unwrap_or("no usable session").to_string())
        };
        conn.disconnect().await;
        outcome
    });
    let members = result.map_err(|e| anyhow::anyhow!("could not connect: {e}"))?;

    if ctx.json {
        let names: Vec<&str> = members.iter().map(|m| m.as_str()).collect();
        return print_json(&serde_json::json!({
            "guild_id": community,
            "count": names.len(),
            "members": names,
        }));
    }

    if members.is_empty() {
        println!("No roleless members.");
        return Ok(());
    }
    println!("Roleless members ({}):", members.len());
    for m in members.iter() {
        println!("  {m}");
    }
    Ok(())
}
