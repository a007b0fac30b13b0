use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 22] = [
        "RUST_LOG",
        "SPG_HOST",
        "SPG_PORT",
        "SPG_DATABASE_URL",
        "SPG_CALLBACK_URL",
        "SPG_ORDER_REFERENCE_PREFIX",
        "SPG_CURRENCY",
        "SPG_PAYSTACK_BASE_URL",
        "SPG_WEBHOOK_SIGNATURE_HEADER",
        "SPG_FCM_URL",
        "SPG_SPLIT_MODE",
        "SPG_MERCHANT_SHARE_PERCENT",
        "SPG_PROCESSOR_RATE_BPS",
        "SPG_PROCESSOR_FIXED_FEE",
        "SPG_PROCESSOR_FEE_CAP",
        "SPG_FIXED_FEE_WAIVER_THRESHOLD",
        "SPG_PLATFORM_RATE_BPS",
        "SPG_PROVIDER_TIMEOUT_SECS",
        "SPG_PUSH_TIMEOUT_SECS",
        "SPG_USE_X_FORWARDED_FOR",
        "SPG_USE_FORWARDED",
        "SPG_PAYSTACK_IP_WHITELIST",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
