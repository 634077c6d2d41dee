//! 컨텍스트 명령어

use dct_client::SchemaVersion;

use crate::context::RepoContext;

pub fn set(
    account: Option<String>,
    profile: Option<String>,
    api_url: Option<String>,
    schema_version: Option<SchemaVersion>,
) -> anyhow::Result<()> {
    let mut ctx = RepoContext::load().unwrap_or_default();

    if let Some(a) = account {
        ctx.account = Some(a);
    }
    if let Some(p) = profile {
        ctx.profile = Some(p);
    }
    if let Some(u) = api_url {
        ctx.api_url = Some(u);
    }
    if let Some(v) = schema_version {
        ctx.schema_version = Some(v);
    }

    ctx.save()?;
    println!("Context updated.");
    show()
}

pub fn show() -> anyhow::Result<()> {
    let ctx = RepoContext::load()?;
    let version = ctx.schema_version.map(|v| v.as_str());

    println!("Current context (.dct/context.json):");
    println!("  account:        {}", ctx.account.as_deref().unwrap_or("(not set)"));
    println!("  profile:        {}", ctx.profile.as_deref().unwrap_or("(not set)"));
    println!("  api_url:        {}", ctx.api_url.as_deref().unwrap_or("(not set)"));
    println!("  schema_version: {}", version.unwrap_or("(not set)"));

    Ok(())
}

pub fn clear() -> anyhow::Result<()> {
    RepoContext::clear()?;
    println!("Context cleared.");
    Ok(())
}
