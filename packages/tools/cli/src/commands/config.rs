//! Config 명령어

use crate::config::CliConfig;
use crate::context::EffectiveContext;

pub fn set(
    mut config: CliConfig,
    database_url: Option<String>,
    max_lookups: Option<usize>,
    max_connections: Option<u32>,
) -> anyhow::Result<()> {
    if let Some(url) = database_url {
        config.database_url = Some(url);
    }
    if let Some(n) = max_lookups {
        config.max_concurrent_lookups = Some(n);
    }
    if let Some(n) = max_connections {
        config.max_connections = Some(n);
    }

    config.save()?;
    println!("Config updated ({}).", CliConfig::config_path()?.display());
    Ok(())
}

pub fn show(config: &CliConfig, ctx: &EffectiveContext) -> anyhow::Result<()> {
    println!("Stored config ({}):", CliConfig::config_path()?.display());
    println!(
        "  database_url:    {}",
        config.database_url.as_deref().map(mask_url).unwrap_or_else(|| "(not set)".to_string())
    );
    println!("  max_lookups:     {}", display_opt(config.max_concurrent_lookups));
    println!("  max_connections: {}", display_opt(config.max_connections));

    println!();
    println!("Effective:");
    match &ctx.database_url {
        Some((url, origin)) => println!("  database_url:    {} ({})", mask_url(url), origin.label()),
        None => println!("  database_url:    (not set)"),
    }
    let options = ctx.connect_options();
    println!(
        "  max_lookups:     {}",
        options
            .max_concurrent_lookups
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    println!("  max_connections: {}", options.max_connections);

    Ok(())
}

fn display_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "(not set)".to_string())
}

fn mask_url(url: &str) -> String {
    // 비밀번호 등 민감 정보 마스킹
    if let Some(at_pos) = url.rfind('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let rest = &url[at_pos..];
            return format!("{}****{}", proto, rest);
        }
    }
    url.to_string()
}
